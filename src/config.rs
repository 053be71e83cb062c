use config::{Config, ConfigError, Environment, File};
use scraper::Selector;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub scraper: ScraperConfig,
    pub extraction: ExtractionConfig,
    pub scheduler: SchedulerConfig,
    pub logging: LoggingConfig,
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub request_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: u64,
    pub busy_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScraperConfig {
    pub user_agent: String,
    pub request_timeout: u64,
    pub max_redirects: usize,
    pub retry_attempts: u32,
    pub retry_delay_ms: u64,
    pub max_concurrent_checks: usize,
    pub short_link_hosts: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageRule {
    pub selector: String,
    pub attribute: String,
}

impl ImageRule {
    pub fn src(selector: &str) -> Self {
        Self {
            selector: selector.to_string(),
            attribute: "src".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    pub price_selector: String,
    pub title_selectors: Vec<String>,
    pub image_rules: Vec<ImageRule>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    pub enabled: bool,
    /// Six-field cron expression (seconds first).
    pub refresh_interval: String,
    pub product_url_template: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub directory: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 5000,
                request_timeout: 60,
            },
            database: DatabaseConfig {
                url: "sqlite://data/watcher.db".to_string(),
                max_connections: 5,
                min_connections: 1,
                acquire_timeout: 30,
                busy_timeout: 10,
            },
            scraper: ScraperConfig::default(),
            extraction: ExtractionConfig::default(),
            scheduler: SchedulerConfig {
                enabled: false,
                refresh_interval: "0 0 */6 * * *".to_string(),
                product_url_template: "https://www.amazon.in/dp/{asin}".to_string(),
            },
            logging: LoggingConfig {
                level: "asin_watcher=info,tower_http=info".to_string(),
                directory: None,
            },
            metrics: MetricsConfig {
                enabled: false,
                port: 9001,
            },
        }
    }
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36".to_string(),
            request_timeout: 30,
            max_redirects: 5,
            retry_attempts: 2,
            retry_delay_ms: 500,
            max_concurrent_checks: 4,
            short_link_hosts: vec!["amzn.in".to_string(), "amzn.to".to_string(), "a.co".to_string()],
        }
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            price_selector: "span.a-price-whole".to_string(),
            title_selectors: vec!["#productTitle".to_string(), "span#title".to_string()],
            image_rules: vec![
                ImageRule::src("#landingImage"),
                ImageRule::src("img#imgBlkFront"),
                ImageRule::src("img.a-dynamic-image"),
            ],
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(Path::new("config"))
    }

    /// Layers defaults, `<dir>/default`, `<dir>/<RUN_MODE>`, `<dir>/local`, then `WATCHER__*` variables.
    pub fn load(dir: &Path) -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());
        let defaults = Config::try_from(&AppConfig::default())?;

        let s = Config::builder()
            .add_source(defaults)
            .add_source(File::from(dir.join("default")).required(false))
            .add_source(File::from(dir.join(&run_mode)).required(false))
            .add_source(File::from(dir.join("local")).required(false))
            .add_source(
                Environment::with_prefix("WATCHER")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("scraper.short_link_hosts")
                    .with_list_parse_key("extraction.title_selectors")
                    .try_parsing(true),
            )
            .build()?;

        let config: AppConfig = s.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Message("Server port must be greater than 0".into()));
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::Message("Database max_connections must be greater than 0".into()));
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigError::Message("Database min_connections cannot exceed max_connections".into()));
        }

        if self.scraper.max_redirects == 0 {
            return Err(ConfigError::Message("Scraper max_redirects must be greater than 0".into()));
        }

        if self.scraper.retry_attempts == 0 {
            return Err(ConfigError::Message("Scraper retry_attempts must be at least 1".into()));
        }

        if self.scraper.max_concurrent_checks == 0 {
            return Err(ConfigError::Message("Scraper max_concurrent_checks must be greater than 0".into()));
        }

        self.validate_extraction()?;

        if !is_valid_cron(&self.scheduler.refresh_interval) {
            return Err(ConfigError::Message("Invalid cron expression in scheduler.refresh_interval".into()));
        }

        if !self.scheduler.product_url_template.contains("{asin}") {
            return Err(ConfigError::Message("scheduler.product_url_template must contain {asin}".into()));
        }

        if self.metrics.enabled && self.metrics.port == 0 {
            return Err(ConfigError::Message("Metrics port must be greater than 0".into()));
        }

        Ok(())
    }

    fn validate_extraction(&self) -> Result<(), ConfigError> {
        let extraction = &self.extraction;
        if extraction.price_selector.trim().is_empty() {
            return Err(ConfigError::Message("extraction.price_selector must not be empty".into()));
        }

        let selectors = std::iter::once(&extraction.price_selector)
            .chain(extraction.title_selectors.iter())
            .chain(extraction.image_rules.iter().map(|rule| &rule.selector));

        for selector in selectors {
            if Selector::parse(selector).is_err() {
                return Err(ConfigError::Message(format!("Invalid CSS selector '{}'", selector)));
            }
        }

        Ok(())
    }
}

// tokio-cron-scheduler expects six fields: sec min hour day month weekday
fn is_valid_cron(cron_expr: &str) -> bool {
    let parts: Vec<&str> = cron_expr.split_whitespace().collect();
    if parts.len() != 6 {
        return false;
    }

    parts.iter().all(|part| {
        part.chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '*' | '-' | ',' | '/' | '?'))
    })
}
