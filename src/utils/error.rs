use thiserror::Error;

#[derive(Error, Debug)]
pub enum JobPilotError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Fetch failed for '{search_term}': {reason}")]
    FetchFailed { search_term: String, reason: String },

    #[error("Persistence error: {message}")]
    PersistenceError { message: String },

    #[error("Storage unavailable: {message}")]
    StorageUnavailable { message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Cover letter drafting failed: {message}")]
    DraftError { message: String },
}

pub type Result<T> = std::result::Result<T, JobPilotError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Network,
    Storage,
    Data,
    Drafting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl JobPilotError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigurationError {
            message: message.into(),
        }
    }

    pub fn persistence(message: impl Into<String>) -> Self {
        Self::PersistenceError {
            message: message.into(),
        }
    }

    pub fn storage_unavailable(message: impl Into<String>) -> Self {
        Self::StorageUnavailable {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ConfigurationError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            Self::ApiError(_) | Self::FetchFailed { .. } => ErrorCategory::Network,
            Self::DatabaseError(_)
            | Self::IoError(_)
            | Self::PersistenceError { .. }
            | Self::StorageUnavailable { .. } => ErrorCategory::Storage,
            Self::CsvError(_) | Self::SerializationError(_) | Self::ValidationError { .. } => {
                ErrorCategory::Data
            }
            Self::DraftError { .. } => ErrorCategory::Drafting,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::ConfigurationError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::StorageUnavailable { .. } => ErrorSeverity::Critical,
            Self::PersistenceError { .. } | Self::DatabaseError(_) | Self::IoError(_) => {
                ErrorSeverity::High
            }
            Self::ApiError(_) | Self::FetchFailed { .. } | Self::DraftError { .. } => {
                ErrorSeverity::Medium
            }
            Self::CsvError(_) | Self::SerializationError(_) | Self::ValidationError { .. } => {
                ErrorSeverity::Low
            }
        }
    }

    /// 任何傳到 main 的錯誤都已中止指令，不能以 0 結束
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low | ErrorSeverity::High => 1,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::Critical => 3,
        }
    }

    /// 只有設定錯誤與儲存無法開啟會中止整個執行
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::ConfigurationError { .. }
                | Self::MissingConfigError { .. }
                | Self::InvalidConfigValueError { .. }
                | Self::StorageUnavailable { .. }
        )
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::ConfigurationError { .. } | Self::MissingConfigError { .. } => {
                "Set APP_ID and API_KEY in your environment, .env file or config TOML"
            }
            Self::InvalidConfigValueError { .. } => "Fix the reported value in your configuration",
            Self::ApiError(_) | Self::FetchFailed { .. } => {
                "Check network connectivity and your Adzuna quota, then retry"
            }
            Self::StorageUnavailable { .. } => {
                "Make sure the database path is writable and the directory exists"
            }
            Self::PersistenceError { .. } | Self::DatabaseError(_) => {
                "Re-run the search; nothing from the failed batch was written"
            }
            Self::IoError(_) => "Check file permissions and available disk space",
            Self::CsvError(_) | Self::SerializationError(_) => "Inspect the stored data for malformed rows",
            Self::ValidationError { .. } => "Check the values passed on the command line",
            Self::DraftError { .. } => "Check the language model API key or use the template drafter",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::ConfigurationError { message } => format!("Configuration problem: {}", message),
            Self::MissingConfigError { field } => format!("Missing required setting '{}'", field),
            Self::InvalidConfigValueError { field, reason, .. } => {
                format!("Setting '{}' is invalid: {}", field, reason)
            }
            Self::FetchFailed { search_term, .. } => {
                format!("Could not fetch listings for '{}'", search_term)
            }
            Self::StorageUnavailable { message } => format!("Cannot open the job database: {}", message),
            Self::PersistenceError { message } => format!("Listings were not saved: {}", message),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_config_and_storage_errors_are_fatal() {
        assert!(JobPilotError::config("missing app_id").is_fatal());
        assert!(JobPilotError::storage_unavailable("read-only").is_fatal());
        assert!(!JobPilotError::persistence("rollback").is_fatal());
        assert!(!JobPilotError::FetchFailed {
            search_term: "Data Scientist".to_string(),
            reason: "HTTP 500".to_string(),
        }
        .is_fatal());
    }

    #[test]
    fn test_severity_and_category() {
        let err = JobPilotError::persistence("constraint failed");
        assert_eq!(err.category(), ErrorCategory::Storage);
        assert_eq!(err.severity(), ErrorSeverity::High);

        let err = JobPilotError::MissingConfigError {
            field: "api.app_id".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(err.severity(), ErrorSeverity::Critical);
        assert!(err.user_friendly_message().contains("api.app_id"));
    }

    #[test]
    fn test_low_severity_errors_still_exit_non_zero() {
        let err = JobPilotError::ValidationError {
            message: "no stored listing at position 99 (3 stored)".to_string(),
        };
        assert_eq!(err.severity(), ErrorSeverity::Low);
        assert_eq!(err.exit_code(), 1);

        let err = JobPilotError::SerializationError(
            serde_json::from_str::<serde_json::Value>("{").unwrap_err(),
        );
        assert_ne!(err.exit_code(), 0);

        assert_eq!(JobPilotError::persistence("rollback").exit_code(), 1);
        assert_eq!(JobPilotError::config("missing app_id").exit_code(), 3);
        assert_eq!(
            JobPilotError::DraftError {
                message: "HTTP 500".to_string()
            }
            .exit_code(),
            2
        );
    }
}
