use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Feed request failed with status {status}")]
    FetchError { status: u16 },

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Render error: {message}")]
    RenderError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Data,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl CatalogError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            CatalogError::FetchError { .. } | CatalogError::HttpError(_) => ErrorCategory::Network,
            CatalogError::CsvError(_)
            | CatalogError::SerializationError(_)
            | CatalogError::RenderError { .. } => ErrorCategory::Data,
            CatalogError::ConfigError { .. }
            | CatalogError::InvalidConfigValueError { .. }
            | CatalogError::MissingConfigError { .. } => ErrorCategory::Configuration,
            CatalogError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            // 遠端資料來源可靠性不明，重跑可能就好了
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Data | ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// FetchError 與其他錯誤在畫面上不做區分
    pub fn is_load_failure(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Network | ErrorCategory::Data
        )
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            CatalogError::FetchError { status } => {
                format!("The spreadsheet feed answered with HTTP {}", status)
            }
            CatalogError::HttpError(_) => "Could not reach the spreadsheet feed".to_string(),
            CatalogError::InvalidConfigValueError { field, reason, .. } => {
                format!("Invalid setting '{}': {}", field, reason)
            }
            CatalogError::MissingConfigError { field } => {
                format!("Missing setting '{}'", field)
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Network => {
                "Check that the sheet is still published to the web and the URL is correct"
            }
            ErrorCategory::Data => "Check the header row and delimiter of the published sheet",
            ErrorCategory::Configuration => {
                "Fix the deployment file or command line flags and try again"
            }
            ErrorCategory::System => "Check file permissions and available disk space",
        }
    }
}

impl ErrorSeverity {
    /// 行程結束碼，任何錯誤都不會是 0
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;
