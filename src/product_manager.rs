use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::extractor::PageExtractor;
use crate::fetcher::{HttpFetcher, PageFetcher};
use crate::identity::{extract_identity, Asin};
use crate::models::{PricePoint, ProductSummary};
use crate::resolver::UrlResolver;
use crate::store::HistoryStore;
use crate::{AppError, Result};

/// Result of a successful tracking request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TrackedPrice {
    pub current_price: i64,
    pub price_history: Vec<PricePoint>,
    pub title: String,
    pub image: String,
    pub asin: Asin,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PriceHistoryView {
    pub price_history: Vec<PricePoint>,
    /// Price of the most recent observation, `None` while the history is empty.
    pub current_price: Option<i64>,
    pub title: String,
    pub image: String,
    pub asin: Asin,
}

/// Runs the resolve → identify → fetch → extract → store pipeline and serves the read paths.
pub struct ProductManager {
    resolver: UrlResolver,
    fetcher: Arc<dyn PageFetcher>,
    extractor: PageExtractor,
    store: Arc<dyn HistoryStore>,
}

impl ProductManager {
    pub fn new(
        resolver: UrlResolver,
        fetcher: Arc<dyn PageFetcher>,
        extractor: PageExtractor,
        store: Arc<dyn HistoryStore>,
    ) -> Self {
        Self {
            resolver,
            fetcher,
            extractor,
            store,
        }
    }

    /// Wires the HTTP resolver and fetcher from configuration around the given store.
    pub fn from_config(config: &AppConfig, store: Arc<dyn HistoryStore>) -> Result<Self> {
        Ok(Self::new(
            UrlResolver::new(&config.scraper)?,
            Arc::new(HttpFetcher::new(&config.scraper)?),
            PageExtractor::new(&config.extraction)?,
            store,
        ))
    }

    pub async fn track_price(&self, raw_url: &str) -> Result<TrackedPrice> {
        let start_time = Instant::now();
        let result = self.run_pipeline(raw_url.trim()).await;

        let outcome = match &result {
            Ok(_) => "success",
            Err(AppError::AsinNotFound) => "asin_not_found",
            Err(AppError::PriceNotFound) => "price_not_found",
            Err(_) => "error",
        };
        metrics::counter!("watcher_tracking_requests_total", "outcome" => outcome).increment(1);
        metrics::histogram!("watcher_tracking_duration_seconds")
            .record(start_time.elapsed().as_secs_f64());

        result
    }

    async fn run_pipeline(&self, raw_url: &str) -> Result<TrackedPrice> {
        let url = self.resolver.resolve(raw_url).await.into_url();

        let asin = extract_identity(&url).ok_or_else(|| {
            warn!(url = %url, "ASIN not found in URL");
            AppError::AsinNotFound
        })?;

        let html = self.fetcher.fetch(&url).await?;
        let page = self.extractor.extract(&html);

        let Some(price) = page.price else {
            warn!(asin = %asin, url = %url, "Price not found on page");
            return Err(AppError::PriceNotFound);
        };

        if page.title.is_empty() || page.image.is_empty() {
            debug!(asin = %asin, "Page is missing title or image, storing empty values");
        }

        let record = self
            .store
            .upsert_observation(&asin, &page.title, &page.image, price)
            .await?;

        info!(
            asin = %asin,
            price,
            observations = record.price_history.len(),
            "Tracked price"
        );

        Ok(TrackedPrice {
            current_price: price,
            price_history: record.price_history,
            title: record.title,
            image: record.image,
            asin,
        })
    }

    pub async fn list_products(&self) -> Result<Vec<ProductSummary>> {
        self.store.list_products().await
    }

    pub async fn get_history(&self, asin: &Asin) -> Result<PriceHistoryView> {
        let record = self
            .store
            .find_product(asin)
            .await?
            .ok_or_else(|| AppError::ProductNotFound {
                asin: asin.to_string(),
            })?;

        Ok(PriceHistoryView {
            current_price: record.latest_price(),
            price_history: record.price_history,
            title: record.title,
            image: record.image,
            asin: record.asin,
        })
    }
}
