use async_trait::async_trait;

use crate::identity::Asin;
use crate::models::{ProductRecord, ProductSummary};
use crate::Result;

pub mod memory;
pub mod sqlite;

pub use memory::MemoryHistoryStore;
pub use sqlite::SqliteHistoryStore;

/// Persistence for tracked products and their price history.
///
/// Implementations must apply each `upsert_observation` atomically per ASIN:
/// concurrent observations of one product all land in the history, and the
/// stored title/image always come from a single writer.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Creates the record if needed, overwrites title/image, appends `price` stamped with the current time.
    async fn upsert_observation(
        &self,
        asin: &Asin,
        title: &str,
        image: &str,
        price: i64,
    ) -> Result<ProductRecord>;

    /// All tracked products in the order they were first seen.
    async fn list_products(&self) -> Result<Vec<ProductSummary>>;

    async fn find_product(&self, asin: &Asin) -> Result<Option<ProductRecord>>;
}
