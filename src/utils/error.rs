use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("ASIN not found in URL")]
    AsinNotFound,

    #[error("Price not found")]
    PriceNotFound,

    #[error("Product not found: {asin}")]
    ProductNotFound { asin: String },

    #[error("Fetch failed for {url}: {message}")]
    Fetch { url: String, message: String },

    #[error("Upstream returned {status} for {url}")]
    UpstreamStatus { url: String, status: u16 },

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn fetch(url: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Fetch {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Upstream or store failures, as opposed to problems with the caller's input.
    pub fn is_infrastructure(&self) -> bool {
        matches!(
            self,
            AppError::Fetch { .. }
                | AppError::UpstreamStatus { .. }
                | AppError::Http(_)
                | AppError::Database(_)
                | AppError::Migration(_)
                | AppError::Io(_)
                | AppError::Internal(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
