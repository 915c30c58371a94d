use std::time::Duration;

// Use the interfaces crate for the shared data model
pub use interfaces::defs::{
    ArticleRecord, ArticleText, ExperimentRecord, PredictionRequest, PricePoint, RetrievalRequest, TimeWindow,
};

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub max_redirects: usize,
    /// Minimum spacing between two requests to the same host.
    pub min_host_interval_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36".to_string(),
            timeout_seconds: 30,
            max_redirects: 5,
            min_host_interval_ms: 250,
        }
    }
}

impl FetchConfig {
    pub fn min_host_interval(&self) -> Duration {
        Duration::from_millis(self.min_host_interval_ms)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ForecastError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Source {source_name} is misconfigured: {reason}")]
    AdapterConfiguration { source_name: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("General error: {0}")]
    General(String),
}

impl ForecastError {
    pub fn adapter_configuration(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::AdapterConfiguration {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }

    /// Errors a source absorbs locally: one page, one query or one article
    /// is lost, the rest of the call goes on.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ForecastError::Http(_)
                | ForecastError::Status { .. }
                | ForecastError::Parse(_)
                | ForecastError::Serialization(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, ForecastError>;
