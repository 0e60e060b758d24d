use crate::utils::error::Result;
use crate::utils::validation::validate_non_empty_string;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 單一搜尋詞的查詢，用完即丟
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingQuery {
    title: String,
    location: String,
}

impl ListingQuery {
    /// `location` 為空白時改用 `default_location`
    pub fn new(title: &str, location: &str, default_location: &str) -> Result<Self> {
        validate_non_empty_string("query.title", title)?;

        let location = if location.trim().is_empty() {
            default_location.trim()
        } else {
            location.trim()
        };

        Ok(Self {
            title: title.trim().to_string(),
            location: location.to_string(),
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn location(&self) -> &str {
        &self.location
    }
}

/// API 原始回傳的一筆職缺，欄位結構不受本系統控制
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawListing(pub serde_json::Map<String, serde_json::Value>);

impl RawListing {
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }
}

impl From<serde_json::Map<String, serde_json::Value>> for RawListing {
    fn from(map: serde_json::Map<String, serde_json::Value>) -> Self {
        Self(map)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalListing {
    pub job_title: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub posted_at: Option<String>,
    pub description: String,
    pub salary_min: Option<f64>,
    pub salary_max: Option<f64>,
    pub contract_type: Option<String>,
    pub contract_time: Option<String>,
    pub apply_link: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Success(Vec<RawListing>),
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum TitleStatus {
    Saved { count: usize },
    NoResults,
    FetchFailed { reason: String },
    NotPersisted { count: usize, reason: String },
    Skipped { reason: String },
}

impl TitleStatus {
    /// 找到的職缺數 (不論是否成功寫入)
    pub fn found(&self) -> usize {
        match self {
            Self::Saved { count } | Self::NotPersisted { count, .. } => *count,
            _ => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TitleReport {
    pub title: String,
    pub status: TitleStatus,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub total: usize,
    pub titles: Vec<TitleReport>,
    pub cancelled: bool,
}

impl RunSummary {
    pub fn record(&mut self, title: impl Into<String>, status: TitleStatus) {
        self.total += status.found();
        self.titles.push(TitleReport {
            title: title.into(),
            status,
        });
    }

    pub fn per_title(&self) -> BTreeMap<String, usize> {
        let mut per_title = BTreeMap::new();
        for report in &self.titles {
            *per_title.entry(report.title.clone()).or_default() += report.status.found();
        }
        per_title
    }

    pub fn saved_total(&self) -> usize {
        self.titles
            .iter()
            .map(|report| match report.status {
                TitleStatus::Saved { count } => count,
                _ => 0,
            })
            .sum()
    }

    pub fn failed_titles(&self) -> Vec<String> {
        self.titles_where(|status| {
            matches!(
                status,
                TitleStatus::FetchFailed { .. } | TitleStatus::Skipped { .. }
            )
        })
    }

    pub fn empty_titles(&self) -> Vec<String> {
        self.titles_where(|status| matches!(status, TitleStatus::NoResults))
    }

    pub fn unsaved_titles(&self) -> Vec<String> {
        self.titles_where(|status| matches!(status, TitleStatus::NotPersisted { .. }))
    }

    fn titles_where(&self, predicate: impl Fn(&TitleStatus) -> bool) -> Vec<String> {
        self.titles
            .iter()
            .filter(|report| predicate(&report.status))
            .map(|report| report.title.clone())
            .collect()
    }
}
