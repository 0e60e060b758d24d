use crate::core::retry::RetryPolicy;
use crate::utils::error::{JobPilotError, Result};
use crate::utils::validation::{validate_path, validate_range, validate_url, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.adzuna.com/v1/api/jobs";
pub const DEFAULT_LLM_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_LLM_MODEL: &str = "llama3-8b-8192";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub llm: LlmConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub app_id: Option<String>,
    pub api_key: Option<String>,
    pub base_url: String,
    pub country: String,
    pub page: u32,
    pub results_per_page: u32,
    pub timeout_seconds: u64,
    pub connect_timeout_seconds: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            app_id: None,
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            country: "gb".to_string(),
            page: 1,
            results_per_page: 10,
            timeout_seconds: 30,
            connect_timeout_seconds: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub default_location: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_location: "London".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay_seconds: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_seconds: 1,
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::exponential(
            self.max_attempts,
            Duration::from_secs(self.base_delay_seconds),
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: "jobs.db".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub timeout_seconds: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_LLM_BASE_URL.to_string(),
            model: DEFAULT_LLM_MODEL.to_string(),
            timeout_seconds: 60,
        }
    }
}

impl AppConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(JobPilotError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| JobPilotError::ConfigurationError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        config.apply_overrides(lookup);
        config
    }

    /// 先載入 .env，再讀設定檔 (若有)，最後讓環境變數覆蓋
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Ok(env_path) = dotenvy::dotenv() {
            tracing::debug!("Loaded environment from {}", env_path.display());
        }

        let mut config = match path {
            Some(path) => {
                tracing::info!("📁 Loading configuration from: {}", path.display());
                Self::from_file(path)?
            }
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(app_id) = non_empty("APP_ID") {
            self.api.app_id = Some(app_id);
        }
        if let Some(api_key) = non_empty("API_KEY") {
            self.api.api_key = Some(api_key);
        }
        if let Some(location) = non_empty("DEFAULT_LOCATION") {
            self.search.default_location = location;
        }
        if let Some(path) = non_empty("JOBPILOT_DB") {
            self.storage.database_path = path;
        }
        if let Some(key) = non_empty("GROQ_API_KEY") {
            self.llm.api_key = Some(key);
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_seconds)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.api.connect_timeout_seconds)
    }

    /// 驗證配置的合理性；憑證是否存在留給 fetcher 建構時檢查
    pub fn validate_config(&self) -> Result<()> {
        validate_url("api.base_url", &self.api.base_url)?;
        validate_url("llm.base_url", &self.llm.base_url)?;
        validate_path("storage.database_path", &self.storage.database_path)?;
        validate_range("api.results_per_page", self.api.results_per_page, 1, 50)?;
        validate_range("api.page", self.api.page, 1, 1000)?;
        validate_range("retry.max_attempts", self.retry.max_attempts, 1, 10)?;
        validate_range("api.timeout_seconds", self.api.timeout_seconds, 1, 600)?;
        validate_range(
            "api.connect_timeout_seconds",
            self.api.connect_timeout_seconds,
            1,
            120,
        )?;

        if self.api.country.len() != 2 || !self.api.country.chars().all(|c| c.is_ascii_lowercase()) {
            return Err(JobPilotError::InvalidConfigValueError {
                field: "api.country".to_string(),
                value: self.api.country.clone(),
                reason: "Expected a two-letter lowercase country code such as 'gb'".to_string(),
            });
        }

        Ok(())
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

/// 替換環境變數 (例如 ${API_KEY})；找不到的變數保持原樣
fn substitute_env_vars(content: &str) -> String {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    let re = PLACEHOLDER.get_or_init(|| {
        Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("placeholder regex is valid")
    });

    re.replace_all(content, |caps: &regex::Captures| {
        let var_name = &caps[1];
        std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
    })
    .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_full_toml_config() {
        let toml_content = r#"
[api]
app_id = "abc"
api_key = "secret"
country = "us"
results_per_page = 20

[search]
default_location = "New York"

[retry]
max_attempts = 4
base_delay_seconds = 2

[storage]
database_path = "./data/jobs.db"
"#;

        let config = AppConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.api.app_id.as_deref(), Some("abc"));
        assert_eq!(config.api.country, "us");
        assert_eq!(config.api.results_per_page, 20);
        assert_eq!(config.api.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.search.default_location, "New York");
        assert_eq!(config.storage.database_path, "./data/jobs.db");
        assert_eq!(
            config.retry.policy().schedule(),
            vec![
                Duration::from_secs(2),
                Duration::from_secs(4),
                Duration::from_secs(8),
                Duration::from_secs(16)
            ]
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = AppConfig::from_toml_str("").unwrap();
        assert_eq!(config.search.default_location, "London");
        assert_eq!(config.api.results_per_page, 10);
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.connect_timeout(), Duration::from_secs(10));
        assert!(config.api.app_id.is_none());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("JOBPILOT_TEST_APP_ID", "from-env");

        let toml_content = r#"
[api]
app_id = "${JOBPILOT_TEST_APP_ID}"
api_key = "${JOBPILOT_TEST_UNSET_KEY}"
"#;

        let config = AppConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.api.app_id.as_deref(), Some("from-env"));
        // unresolved placeholders are kept verbatim
        assert_eq!(
            config.api.api_key.as_deref(),
            Some("${JOBPILOT_TEST_UNSET_KEY}")
        );

        std::env::remove_var("JOBPILOT_TEST_APP_ID");
    }

    #[test]
    fn test_from_lookup_reads_recognized_keys() {
        let env: HashMap<&str, &str> = [
            ("APP_ID", "id-1"),
            ("API_KEY", "key-1"),
            ("DEFAULT_LOCATION", "Manchester"),
            ("JOBPILOT_DB", "/tmp/jobs.db"),
        ]
        .into_iter()
        .collect();

        let config = AppConfig::from_lookup(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.api.app_id.as_deref(), Some("id-1"));
        assert_eq!(config.api.api_key.as_deref(), Some("key-1"));
        assert_eq!(config.search.default_location, "Manchester");
        assert_eq!(config.storage.database_path, "/tmp/jobs.db");
        assert!(config.llm.api_key.is_none());
    }

    #[test]
    fn test_blank_env_values_are_ignored() {
        let config = AppConfig::from_lookup(|key| match key {
            "DEFAULT_LOCATION" => Some("  ".to_string()),
            _ => None,
        });
        assert_eq!(config.search.default_location, "London");
    }

    #[test]
    fn test_config_validation() {
        let config = AppConfig::from_toml_str(
            r#"
[api]
base_url = "invalid-url"
"#,
        )
        .unwrap();
        assert!(config.validate().is_err());

        let config = AppConfig::from_toml_str(
            r#"
[api]
results_per_page = 0
"#,
        )
        .unwrap();
        assert!(config.validate().is_err());

        let config = AppConfig::from_toml_str(
            r#"
[api]
country = "GBR"
"#,
        )
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[search]\ndefault_location = \"Bristol\"\n")
            .unwrap();

        let config = AppConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.search.default_location, "Bristol");
    }

    #[test]
    fn test_invalid_toml_is_configuration_error() {
        let err = AppConfig::from_toml_str("[api\nbroken").unwrap_err();
        assert!(matches!(err, JobPilotError::ConfigurationError { .. }));
    }
}
