use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::identity::Asin;
use crate::models::PricePoint;

/// Everything stored about one tracked listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProductRecord {
    pub asin: Asin,
    pub title: String,
    pub image: String,
    pub price_history: Vec<PricePoint>,
}

/// Row of the tracked products list.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq, Eq)]
pub struct ProductSummary {
    pub asin: Asin,
    pub title: String,
    pub image: String,
}

impl ProductRecord {
    pub fn new(asin: Asin, title: String, image: String) -> Self {
        Self {
            asin,
            title,
            image,
            price_history: Vec::new(),
        }
    }

    /// Overwrites display metadata and appends the observation.
    pub fn record_observation(&mut self, title: String, image: String, point: PricePoint) {
        self.title = title;
        self.image = image;
        self.price_history.push(point);
    }

    pub fn latest_price(&self) -> Option<i64> {
        self.price_history.last().map(|point| point.price)
    }

    pub fn summary(&self) -> ProductSummary {
        ProductSummary {
            asin: self.asin.clone(),
            title: self.title.clone(),
            image: self.image.clone(),
        }
    }
}
