use async_trait::async_trait;
use reqwest::{redirect::Policy, Client, StatusCode};
use std::time::Duration;
use tokio_retry::strategy::FixedInterval;
use tokio_retry::RetryIf;
use tracing::{debug, warn};

use crate::config::ScraperConfig;
use crate::{AppError, Result};

/// Downloads product pages.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Returns the page body, or an error for network failures and non-2xx statuses.
    async fn fetch(&self, url: &str) -> Result<String>;
}

pub struct HttpFetcher {
    client: Client,
    retry_attempts: u32,
    retry_delay: Duration,
}

impl HttpFetcher {
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .redirect(Policy::limited(config.max_redirects))
            .timeout(Duration::from_secs(config.request_timeout))
            .build()?;

        Ok(Self {
            client,
            retry_attempts: config.retry_attempts.max(1),
            retry_delay: Duration::from_millis(config.retry_delay_ms),
        })
    }

    async fn fetch_once(&self, url: &str) -> Result<String> {
        debug!(url = %url, "Fetching page");
        let response = self.client.get(url).send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(AppError::UpstreamStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response.text().await?)
    }
}

fn is_transient(error: &AppError) -> bool {
    match error {
        AppError::Http(e) => e.is_timeout() || e.is_connect(),
        AppError::UpstreamStatus { status, .. } => {
            *status >= 500 || *status == StatusCode::TOO_MANY_REQUESTS.as_u16()
        }
        _ => false,
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        let strategy = FixedInterval::new(self.retry_delay).take(self.retry_attempts as usize - 1);

        let result = RetryIf::spawn(
            strategy,
            || self.fetch_once(url),
            |e: &AppError| {
                let retry = is_transient(e);
                if retry {
                    warn!(url = %url, error = %e, "Transient fetch failure, retrying");
                }
                retry
            },
        )
        .await;

        result.map_err(|e| match e {
            AppError::Http(inner) => AppError::fetch(url, inner.to_string()),
            other => other,
        })
    }
}
