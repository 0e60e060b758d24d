use crate::adapters::adzuna::AdzunaClient;
use crate::adapters::chat_drafter::ChatDrafter;
use crate::adapters::sqlite_store::SqliteStore;
use crate::config::toml_config::AppConfig;
use crate::utils::error::Result;
use crate::utils::validation::Validate;
use reqwest::Client;
use std::time::Duration;

/// 啟動時建立一次的執行環境：設定與共用的 HTTP 連線
#[derive(Clone)]
pub struct AppContext {
    pub config: AppConfig,
    pub http: Client,
}

impl AppContext {
    pub fn init(config: AppConfig) -> Result<Self> {
        config.validate()?;

        let http = Client::builder()
            .connect_timeout(config.connect_timeout())
            .timeout(config.request_timeout())
            .user_agent(concat!("jobpilot/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { config, http })
    }

    pub fn listing_source(&self) -> Result<AdzunaClient> {
        AdzunaClient::new(&self.config.api, self.http.clone(), self.config.retry.policy())
    }

    pub fn open_store(&self) -> Result<SqliteStore> {
        SqliteStore::open(&self.config.storage.database_path)
    }

    /// 語言模型回應較慢，用獨立的逾時設定
    pub fn chat_drafter(&self) -> Result<ChatDrafter> {
        let client = Client::builder()
            .connect_timeout(self.config.connect_timeout())
            .timeout(Duration::from_secs(self.config.llm.timeout_seconds))
            .build()?;
        ChatDrafter::new(&self.config.llm, client)
    }
}
