pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::CliConfig;

pub use crate::adapters::{adzuna::AdzunaClient, chat_drafter::ChatDrafter, sqlite_store::SqliteStore};
pub use crate::config::{AppConfig, AppContext};
pub use crate::core::{
    drafting::TemplateDrafter,
    orchestrator::{CancellationFlag, Orchestrator},
    retry::RetryPolicy,
};
pub use crate::domain::model::{
    CanonicalListing, FetchOutcome, ListingQuery, RawListing, RunSummary, TitleReport, TitleStatus,
};
pub use crate::domain::ports::{DraftRequest, Drafter, ListingSource, ListingStore};
pub use crate::utils::error::{JobPilotError, Result};
