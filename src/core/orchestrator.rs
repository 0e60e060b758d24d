use crate::core::normalizer::{is_missing_identity, normalize};
use crate::domain::model::{FetchOutcome, ListingQuery, RunSummary, TitleStatus};
use crate::domain::ports::{ListingSource, ListingStore};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// 在兩個搜尋詞之間檢查的取消旗標
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// 依序處理每個搜尋詞：抓取、正規化、整批寫入。單一搜尋詞的失敗只會反映在摘要裡。
pub struct Orchestrator<S: ListingSource, St: ListingStore> {
    source: S,
    store: St,
    default_location: String,
    cancellation: CancellationFlag,
}

impl<S: ListingSource, St: ListingStore> Orchestrator<S, St> {
    pub fn new(source: S, store: St, default_location: impl Into<String>) -> Self {
        Self {
            source,
            store,
            default_location: default_location.into(),
            cancellation: CancellationFlag::new(),
        }
    }

    pub fn with_cancellation(mut self, cancellation: CancellationFlag) -> Self {
        self.cancellation = cancellation;
        self
    }

    pub fn store(&self) -> &St {
        &self.store
    }

    pub async fn run<T: AsRef<str>>(&self, titles: &[T], location: &str) -> RunSummary {
        let mut summary = RunSummary::default();
        tracing::info!("🚀 Starting job search for {} titles", titles.len());

        for title in titles {
            if self.cancellation.is_cancelled() {
                tracing::warn!("🛑 Run cancelled, {} titles processed", summary.titles.len());
                summary.cancelled = true;
                break;
            }

            let title = title.as_ref();
            let status = self.process_title(title, location).await;
            summary.record(title.trim(), status);
        }

        tracing::info!(
            "📊 Run finished: {} found, {} saved, {} failed, {} empty, {} not saved",
            summary.total,
            summary.saved_total(),
            summary.failed_titles().len(),
            summary.empty_titles().len(),
            summary.unsaved_titles().len()
        );

        summary
    }

    async fn process_title(&self, title: &str, location: &str) -> TitleStatus {
        let query = match ListingQuery::new(title, location, &self.default_location) {
            Ok(query) => query,
            Err(e) => {
                tracing::warn!("⚠️ Skipping search term '{}': {}", title, e);
                return TitleStatus::Skipped {
                    reason: e.to_string(),
                };
            }
        };

        let raw_listings = match self.source.fetch_for(&query).await {
            FetchOutcome::Success(raw_listings) => raw_listings,
            FetchOutcome::Failed { reason } => return TitleStatus::FetchFailed { reason },
        };

        if raw_listings.is_empty() {
            return TitleStatus::NoResults;
        }

        let batch: Vec<_> = raw_listings
            .iter()
            .map(|raw| {
                let listing = normalize(raw, query.title());
                if is_missing_identity(&listing) {
                    tracing::warn!(
                        "⚠️ Missing title and company for a '{}' listing: {}",
                        query.title(),
                        serde_json::to_string(raw).unwrap_or_default()
                    );
                }
                listing
            })
            .collect();

        match self.store.append(&batch) {
            Ok(count) => {
                tracing::info!("✅ Data for '{}' saved ({} listings)", query.title(), count);
                TitleStatus::Saved { count }
            }
            Err(e) => {
                tracing::error!(
                    "❌ Error saving '{}' listings: {} (💡 {})",
                    query.title(),
                    e,
                    e.recovery_suggestion()
                );
                TitleStatus::NotPersisted {
                    count: batch.len(),
                    reason: e.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite_store::SqliteStore;
    use crate::domain::model::{CanonicalListing, RawListing};
    use crate::utils::error::{JobPilotError, Result};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    fn raw_listing(title: &str) -> RawListing {
        match serde_json::json!({
            "title": title,
            "company": {"display_name": "Acme"},
            "location": {"display_name": "London"},
            "redirect_url": "https://example.com/apply"
        }) {
            serde_json::Value::Object(map) => RawListing(map),
            _ => unreachable!(),
        }
    }

    /// 依搜尋詞回傳預設結果，並記錄呼叫順序
    struct StubSource {
        outcomes: HashMap<String, FetchOutcome>,
        calls: Mutex<Vec<(String, String)>>,
    }

    impl StubSource {
        fn new(outcomes: Vec<(&str, FetchOutcome)>) -> Self {
            Self {
                outcomes: outcomes
                    .into_iter()
                    .map(|(title, outcome)| (title.to_string(), outcome))
                    .collect(),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<(String, String)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ListingSource for StubSource {
        async fn fetch_for(&self, query: &ListingQuery) -> FetchOutcome {
            self.calls
                .lock()
                .unwrap()
                .push((query.title().to_string(), query.location().to_string()));
            self.outcomes
                .get(query.title())
                .cloned()
                .unwrap_or(FetchOutcome::Success(vec![]))
        }
    }

    /// 對指定搜尋詞的批次回報寫入失敗，其餘交給內部 SQLite
    struct FlakyStore {
        inner: SqliteStore,
        reject_job_title: String,
    }

    impl ListingStore for FlakyStore {
        fn ensure_schema(&self) -> Result<()> {
            self.inner.ensure_schema()
        }

        fn append(&self, records: &[CanonicalListing]) -> Result<usize> {
            if records.iter().any(|r| r.job_title == self.reject_job_title) {
                return Err(JobPilotError::persistence("disk full"));
            }
            self.inner.append(records)
        }

        fn all(&self) -> Result<Vec<CanonicalListing>> {
            self.inner.all()
        }

        fn count(&self) -> Result<usize> {
            self.inner.count()
        }
    }

    #[tokio::test]
    async fn test_single_title_two_listings() {
        let source = StubSource::new(vec![(
            "Data Scientist",
            FetchOutcome::Success(vec![raw_listing("DS 1"), raw_listing("DS 2")]),
        )]);
        let orchestrator =
            Orchestrator::new(source, SqliteStore::open_in_memory().unwrap(), "London");

        let summary = orchestrator.run(&["Data Scientist"], "London").await;

        assert_eq!(summary.total, 2);
        assert_eq!(summary.per_title().get("Data Scientist"), Some(&2));
        assert_eq!(summary.per_title().len(), 1);
        assert!(summary.failed_titles().is_empty());

        let stored = orchestrator.store().all().unwrap();
        assert_eq!(stored.len(), 2);
        assert!(stored.iter().all(|l| l.job_title == "Data Scientist"));
    }

    #[tokio::test]
    async fn test_repeated_title_counts_add_up_to_total() {
        let source = StubSource::new(vec![(
            "A",
            FetchOutcome::Success(vec![raw_listing("A 1"), raw_listing("A 2")]),
        )]);
        let orchestrator =
            Orchestrator::new(source, SqliteStore::open_in_memory().unwrap(), "London");

        let summary = orchestrator.run(&["A", "A"], "London").await;

        assert_eq!(orchestrator.source.calls().len(), 2);
        assert_eq!(summary.total, 4);
        assert_eq!(summary.titles.len(), 2);
        assert_eq!(summary.per_title().get("A"), Some(&4));
        assert_eq!(
            summary.per_title().values().sum::<usize>(),
            summary.total
        );
        assert_eq!(orchestrator.store().count().unwrap(), 4);
    }

    #[tokio::test]
    async fn test_failed_title_does_not_block_others() {
        let source = StubSource::new(vec![
            (
                "X",
                FetchOutcome::Failed {
                    reason: "HTTP 503".to_string(),
                },
            ),
            ("Y", FetchOutcome::Success(vec![raw_listing("Y 1")])),
        ]);
        let orchestrator =
            Orchestrator::new(source, SqliteStore::open_in_memory().unwrap(), "London");

        let summary = orchestrator.run(&["X", "Y"], "Leeds").await;

        assert_eq!(summary.total, 1);
        assert_eq!(summary.failed_titles(), vec!["X"]);
        assert_eq!(orchestrator.store().count().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_titles_are_fetched_in_input_order() {
        let source = StubSource::new(vec![]);
        let orchestrator =
            Orchestrator::new(source, SqliteStore::open_in_memory().unwrap(), "London");

        orchestrator.run(&["C", "A", "B"], "").await;

        assert_eq!(
            orchestrator.source.calls(),
            vec![
                ("C".to_string(), "London".to_string()),
                ("A".to_string(), "London".to_string()),
                ("B".to_string(), "London".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn test_distinguishes_empty_failed_and_unsaved() {
        let source = StubSource::new(vec![
            ("Empty", FetchOutcome::Success(vec![])),
            (
                "Broken",
                FetchOutcome::Failed {
                    reason: "timeout".to_string(),
                },
            ),
            ("Unsaved", FetchOutcome::Success(vec![raw_listing("U 1")])),
            ("Saved", FetchOutcome::Success(vec![raw_listing("S 1")])),
        ]);
        let store = FlakyStore {
            inner: SqliteStore::open_in_memory().unwrap(),
            reject_job_title: "Unsaved".to_string(),
        };
        let orchestrator = Orchestrator::new(source, store, "London");

        let summary = orchestrator
            .run(&["Empty", "Broken", "Unsaved", "Saved"], "London")
            .await;

        assert_eq!(summary.total, 2);
        assert_eq!(summary.saved_total(), 1);
        assert_eq!(summary.empty_titles(), vec!["Empty"]);
        assert_eq!(summary.failed_titles(), vec!["Broken"]);
        assert_eq!(summary.unsaved_titles(), vec!["Unsaved"]);

        // earlier and later batches stay committed
        let stored = orchestrator.store().all().unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].job_title, "Saved");
    }

    #[tokio::test]
    async fn test_blank_title_is_skipped_without_fetching() {
        let source = StubSource::new(vec![]);
        let orchestrator =
            Orchestrator::new(source, SqliteStore::open_in_memory().unwrap(), "London");

        let summary = orchestrator.run(&["  ", "Analyst"], "London").await;

        assert_eq!(summary.failed_titles(), vec![""]);
        assert_eq!(orchestrator.source.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_run_stops_before_next_title() {
        let source = StubSource::new(vec![]);
        let cancellation = CancellationFlag::new();
        let orchestrator =
            Orchestrator::new(source, SqliteStore::open_in_memory().unwrap(), "London")
                .with_cancellation(cancellation.clone());

        cancellation.cancel();
        let summary = orchestrator.run(&["A", "B"], "London").await;

        assert!(summary.cancelled);
        assert!(summary.titles.is_empty());
        assert!(orchestrator.source.calls().is_empty());
    }
}
