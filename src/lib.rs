pub mod config;
pub mod extractor;
pub mod fetcher;
pub mod identity;
pub mod models;
pub mod product_manager;
pub mod resolver;
pub mod scheduler;
pub mod store;
pub mod telemetry;
pub mod utils;
pub mod web;

// Re-export commonly used types
pub use config::AppConfig;
pub use identity::{extract_identity, Asin};
pub use product_manager::{PriceHistoryView, ProductManager, TrackedPrice};
pub use resolver::{ResolutionOutcome, UrlResolver};
pub use utils::error::AppError;

pub type Result<T> = std::result::Result<T, AppError>;
