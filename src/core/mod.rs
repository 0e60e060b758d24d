pub mod drafting;
pub mod export;
pub mod normalizer;
pub mod orchestrator;
pub mod retry;

pub use crate::domain::model::{CanonicalListing, FetchOutcome, ListingQuery, RawListing, RunSummary};
pub use crate::domain::ports::{Drafter, ListingSource, ListingStore};
pub use crate::utils::error::Result;
