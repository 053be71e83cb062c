use anyhow::Result;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::config::SchedulerConfig;
use crate::identity::Asin;
use crate::product_manager::ProductManager;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshSummary {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
}

pub fn product_url(template: &str, asin: &Asin) -> String {
    template.replace("{asin}", asin.as_str())
}

/// Re-tracks every known product, with at most `max_concurrent` requests in flight.
/// Individual failures are logged and counted, never propagated.
pub async fn refresh_all(
    product_manager: &ProductManager,
    url_template: &str,
    max_concurrent: usize,
) -> RefreshSummary {
    let products = match product_manager.list_products().await {
        Ok(products) => products,
        Err(e) => {
            tracing::error!(error = %e, "Failed to list products for refresh");
            return RefreshSummary::default();
        }
    };

    let results: Vec<bool> = stream::iter(products)
        .map(|product| async move {
            let url = product_url(url_template, &product.asin);
            match product_manager.track_price(&url).await {
                Ok(tracked) => {
                    tracing::debug!(asin = %tracked.asin, price = tracked.current_price, "Refreshed product");
                    true
                }
                Err(e) => {
                    tracing::warn!(asin = %product.asin, error = %e, "Refresh failed");
                    false
                }
            }
        })
        .buffer_unordered(max_concurrent.max(1))
        .collect()
        .await;

    let succeeded = results.iter().filter(|ok| **ok).count();
    RefreshSummary {
        attempted: results.len(),
        succeeded,
        failed: results.len() - succeeded,
    }
}

/// Cron-driven refresh of all tracked products.
pub struct RefreshScheduler {
    scheduler: JobScheduler,
    product_manager: Arc<ProductManager>,
    config: SchedulerConfig,
    max_concurrent: usize,
}

impl RefreshScheduler {
    pub async fn new(
        product_manager: Arc<ProductManager>,
        config: SchedulerConfig,
        max_concurrent: usize,
    ) -> Result<Self> {
        let scheduler = JobScheduler::new().await?;

        Ok(Self {
            scheduler,
            product_manager,
            config,
            max_concurrent,
        })
    }

    pub async fn start(&mut self) -> Result<()> {
        let product_manager = Arc::clone(&self.product_manager);
        let template = self.config.product_url_template.clone();
        let max_concurrent = self.max_concurrent;

        let job = Job::new_async(self.config.refresh_interval.as_str(), move |_uuid, _lock| {
            let product_manager = Arc::clone(&product_manager);
            let template = template.clone();

            Box::pin(async move {
                tracing::info!("Starting scheduled price refresh");
                let summary = refresh_all(&product_manager, &template, max_concurrent).await;
                tracing::info!(
                    attempted = summary.attempted,
                    succeeded = summary.succeeded,
                    failed = summary.failed,
                    "Scheduled price refresh finished"
                );
            })
        })?;

        self.scheduler.add(job).await?;
        self.scheduler.start().await?;
        tracing::info!(interval = %self.config.refresh_interval, "Refresh scheduler started");
        Ok(())
    }

    pub async fn shutdown(&mut self) -> Result<()> {
        self.scheduler.shutdown().await?;
        tracing::info!("Refresh scheduler shutdown");
        Ok(())
    }
}
