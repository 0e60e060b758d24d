use crate::config::toml_config::ApiConfig;
use crate::core::retry::RetryPolicy;
use crate::domain::model::{FetchOutcome, ListingQuery, RawListing};
use crate::domain::ports::ListingSource;
use crate::utils::error::{JobPilotError, Result};
use crate::utils::validation::require_credential;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<serde_json::Value>,
}

/// Adzuna 職缺搜尋 API 的客戶端
pub struct AdzunaClient {
    client: Client,
    endpoint: String,
    app_id: String,
    api_key: String,
    results_per_page: u32,
    policy: RetryPolicy,
}

impl AdzunaClient {
    /// 憑證缺漏時直接失敗，不會發出任何請求
    pub fn new(api: &ApiConfig, client: Client, policy: RetryPolicy) -> Result<Self> {
        let app_id = require_credential("api.app_id", &api.app_id)
            .map_err(|_| JobPilotError::config("API credential 'app_id' (APP_ID) must be set"))?;
        let api_key = require_credential("api.api_key", &api.api_key)
            .map_err(|_| JobPilotError::config("API credential 'api_key' (API_KEY) must be set"))?;

        let endpoint = format!(
            "{}/{}/search/{}",
            api.base_url.trim_end_matches('/'),
            api.country,
            api.page
        );

        Ok(Self {
            client,
            endpoint,
            app_id: app_id.to_string(),
            api_key: api_key.to_string(),
            results_per_page: api.results_per_page,
            policy,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn attempt(&self, query: &ListingQuery) -> Result<Vec<RawListing>> {
        let results_per_page = self.results_per_page.to_string();
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("app_id", self.app_id.as_str()),
                ("app_key", self.api_key.as_str()),
                ("what", query.title()),
                ("where", query.location()),
                ("results_per_page", results_per_page.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("API response status: {}", status);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(JobPilotError::FetchFailed {
                search_term: query.title().to_string(),
                reason: format!("HTTP {}: {}", status.as_u16(), truncate(&body, 200)),
            });
        }

        let payload: SearchResponse = response.json().await?;

        Ok(payload
            .results
            .into_iter()
            .filter_map(|item| match item {
                serde_json::Value::Object(map) => Some(RawListing(map)),
                other => {
                    tracing::warn!("⚠️ Skipping non-object listing: {}", other);
                    None
                }
            })
            .collect())
    }
}

#[async_trait]
impl ListingSource for AdzunaClient {
    async fn fetch_for(&self, query: &ListingQuery) -> FetchOutcome {
        let max_attempts = self.policy.max_attempts();
        let mut last_error = String::new();

        for attempt in 0..max_attempts {
            tracing::debug!(
                "📡 Fetching '{}' in '{}' (attempt {}/{})",
                query.title(),
                query.location(),
                attempt + 1,
                max_attempts
            );

            match self.attempt(query).await {
                Ok(listings) => {
                    if listings.is_empty() {
                        tracing::info!("❌ No job data returned for '{}'", query.title());
                    } else {
                        tracing::info!(
                            "✅ Fetched {} listings for '{}'",
                            listings.len(),
                            query.title()
                        );
                    }
                    return FetchOutcome::Success(listings);
                }
                Err(e) => {
                    let delay = self.policy.delay_for(attempt);
                    tracing::warn!(
                        "⚠️ Error fetching '{}' (attempt {}/{}): {}; retrying after {:?}",
                        query.title(),
                        attempt + 1,
                        max_attempts,
                        e,
                        delay
                    );
                    last_error = e.to_string();
                    tokio::time::sleep(delay).await;
                }
            }
        }

        let failure = JobPilotError::FetchFailed {
            search_term: query.title().to_string(),
            reason: format!("gave up after {} attempts: {}", max_attempts, last_error),
        };
        tracing::error!("❌ {}", failure);

        FetchOutcome::Failed {
            reason: last_error,
        }
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
