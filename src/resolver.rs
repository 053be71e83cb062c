use reqwest::{redirect::Policy, Client};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::ScraperConfig;
use crate::{AppError, Result};

/// What happened when a submitted URL went through redirect resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionOutcome {
    /// Not a short link; no request was made.
    Unchanged(String),
    Resolved { original: String, resolved: String },
    /// Resolution failed and the submitted URL is used as-is.
    Fallback { original: String, reason: String },
}

impl ResolutionOutcome {
    /// The URL the rest of the pipeline continues with.
    pub fn url(&self) -> &str {
        match self {
            ResolutionOutcome::Unchanged(url) => url,
            ResolutionOutcome::Resolved { resolved, .. } => resolved,
            ResolutionOutcome::Fallback { original, .. } => original,
        }
    }

    pub fn into_url(self) -> String {
        match self {
            ResolutionOutcome::Unchanged(url) => url,
            ResolutionOutcome::Resolved { resolved, .. } => resolved,
            ResolutionOutcome::Fallback { original, .. } => original,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            ResolutionOutcome::Unchanged(_) => "unchanged",
            ResolutionOutcome::Resolved { .. } => "resolved",
            ResolutionOutcome::Fallback { .. } => "fallback",
        }
    }
}

/// Expands marketplace short links (`amzn.in/d/...`) into full product URLs.
#[derive(Clone)]
pub struct UrlResolver {
    client: Client,
    short_link_hosts: Vec<String>,
}

impl UrlResolver {
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .redirect(Policy::limited(config.max_redirects))
            .timeout(Duration::from_secs(config.request_timeout))
            .build()?;

        Ok(Self {
            client,
            short_link_hosts: config
                .short_link_hosts
                .iter()
                .map(|host| host.to_ascii_lowercase())
                .collect(),
        })
    }

    pub fn is_short_link(&self, url: &str) -> bool {
        let Ok(parsed) = Url::parse(url) else {
            return false;
        };
        let Some(host) = parsed.host_str() else {
            return false;
        };
        let host = host.to_ascii_lowercase();

        self.short_link_hosts.iter().any(|short| {
            host == *short
                || host
                    .strip_suffix(short.as_str())
                    .is_some_and(|prefix| prefix.ends_with('.'))
        })
    }

    /// Best effort: failures are logged and reported as [`ResolutionOutcome::Fallback`].
    pub async fn resolve(&self, url: &str) -> ResolutionOutcome {
        let outcome = if !self.is_short_link(url) {
            debug!(url = %url, "Not a short link, skipping resolution");
            ResolutionOutcome::Unchanged(url.to_string())
        } else {
            match self.follow_redirects(url).await {
                Ok(resolved) => {
                    info!(original = %url, resolved = %resolved, "Resolved short link");
                    ResolutionOutcome::Resolved {
                        original: url.to_string(),
                        resolved,
                    }
                }
                Err(e) => {
                    warn!(url = %url, error = %e, "Error resolving short URL, using it as submitted");
                    ResolutionOutcome::Fallback {
                        original: url.to_string(),
                        reason: e.to_string(),
                    }
                }
            }
        };

        metrics::counter!("watcher_redirect_resolutions_total", "outcome" => outcome.label()).increment(1);
        outcome
    }

    async fn follow_redirects(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?;
        let status = response.status();

        if !(status.is_success() || status.is_redirection()) {
            return Err(AppError::UpstreamStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response.url().to_string())
    }
}
