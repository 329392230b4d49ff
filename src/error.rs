use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out: {url}")]
    Timeout { url: String },

    #[error("Rate limited by upstream after {attempts} attempts: {url}")]
    RateLimited { url: String, attempts: u32 },

    #[error("Upstream returned HTTP {status}: {url}")]
    Status { status: u16, url: String },

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("No fresh or cached data: {0}")]
    Unavailable(String),
}

impl AppError {
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, AppError::RateLimited { .. })
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
