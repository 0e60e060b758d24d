use crate::domain::model::{CanonicalListing, FetchOutcome, ListingQuery};
use crate::utils::error::Result;
use async_trait::async_trait;

/// 職缺來源，失敗會折疊成 `FetchOutcome::Failed` 而不是錯誤
#[async_trait]
pub trait ListingSource: Send + Sync {
    async fn fetch_for(&self, query: &ListingQuery) -> FetchOutcome;
}

/// 只能附加的職缺儲存區
pub trait ListingStore: Send + Sync {
    /// 可重複呼叫；不存在時建立資料表
    fn ensure_schema(&self) -> Result<()>;

    /// 整批寫入，任何一筆失敗則整批回滾
    fn append(&self, records: &[CanonicalListing]) -> Result<usize>;

    /// 依寫入順序回傳所有紀錄
    fn all(&self) -> Result<Vec<CanonicalListing>>;

    fn count(&self) -> Result<usize>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftRequest {
    pub job_title: String,
    pub company: String,
    pub description: String,
    pub resume_text: String,
}

impl DraftRequest {
    pub fn from_listing(listing: &CanonicalListing, resume_text: impl Into<String>) -> Self {
        Self {
            job_title: listing.title.clone(),
            company: listing.company.clone(),
            description: listing.description.clone(),
            resume_text: resume_text.into(),
        }
    }
}

#[async_trait]
pub trait Drafter: Send + Sync {
    async fn draft(&self, request: &DraftRequest) -> Result<String>;
}
