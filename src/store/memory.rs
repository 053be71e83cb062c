use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::HistoryStore;
use crate::identity::Asin;
use crate::models::{PricePoint, ProductRecord, ProductSummary};
use crate::Result;

#[derive(Default)]
struct Records {
    order: Vec<Asin>,
    by_asin: HashMap<Asin, ProductRecord>,
}

/// Process-local store. The write lock is held for the whole upsert.
#[derive(Default)]
pub struct MemoryHistoryStore {
    records: RwLock<Records>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn upsert_observation(
        &self,
        asin: &Asin,
        title: &str,
        image: &str,
        price: i64,
    ) -> Result<ProductRecord> {
        let mut records = self.records.write().await;
        let Records { order, by_asin } = &mut *records;

        let record = by_asin.entry(asin.clone()).or_insert_with(|| {
            order.push(asin.clone());
            ProductRecord::new(asin.clone(), title.to_string(), image.to_string())
        });
        record.record_observation(title.to_string(), image.to_string(), PricePoint::now(price));

        Ok(record.clone())
    }

    async fn list_products(&self) -> Result<Vec<ProductSummary>> {
        let records = self.records.read().await;
        Ok(records
            .order
            .iter()
            .filter_map(|asin| records.by_asin.get(asin))
            .map(ProductRecord::summary)
            .collect())
    }

    async fn find_product(&self, asin: &Asin) -> Result<Option<ProductRecord>> {
        let records = self.records.read().await;
        Ok(records.by_asin.get(asin).cloned())
    }
}
