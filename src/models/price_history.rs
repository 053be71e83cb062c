use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One observed price. Serialized with the `date` key the history API has always used.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq, Eq)]
pub struct PricePoint {
    pub price: i64,
    #[serde(rename = "date")]
    pub observed_at: DateTime<Utc>,
}

impl PricePoint {
    pub fn now(price: i64) -> Self {
        Self {
            price,
            observed_at: Utc::now(),
        }
    }
}
