use config::ConfigError;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};

use crate::config::ExtractionConfig;
use crate::{AppError, Result};

/// Values read from one product page. Missing elements show up as `None`/empty strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageData {
    /// Whole currency units; fractional digits are not tracked.
    pub price: Option<i64>,
    pub title: String,
    pub image: String,
}

struct AttributeRule {
    selector: Selector,
    attribute: String,
}

/// Applies the configured selector rules to fetched product pages.
pub struct PageExtractor {
    price: Selector,
    titles: Vec<Selector>,
    images: Vec<AttributeRule>,
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| {
        AppError::Config(ConfigError::Message(format!(
            "Invalid CSS selector '{}': {:?}",
            selector, e
        )))
    })
}

impl PageExtractor {
    pub fn new(config: &ExtractionConfig) -> Result<Self> {
        let price = parse_selector(&config.price_selector)?;
        let titles = config
            .title_selectors
            .iter()
            .map(|s| parse_selector(s))
            .collect::<Result<Vec<_>>>()?;
        let images = config
            .image_rules
            .iter()
            .map(|rule| {
                Ok(AttributeRule {
                    selector: parse_selector(&rule.selector)?,
                    attribute: rule.attribute.clone(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { price, titles, images })
    }

    pub fn extract(&self, html: &str) -> PageData {
        let document = Html::parse_document(html);

        PageData {
            price: self.extract_price(&document),
            title: self.extract_title(&document),
            image: self.extract_image(&document),
        }
    }

    fn extract_price(&self, document: &Html) -> Option<i64> {
        let element = document.select(&self.price).next()?;
        parse_price(&element_text(element))
    }

    fn extract_title(&self, document: &Html) -> String {
        self.titles
            .iter()
            .filter_map(|selector| document.select(selector).next())
            .map(|element| element_text(element).trim().to_string())
            .find(|title| !title.is_empty())
            .unwrap_or_default()
    }

    fn extract_image(&self, document: &Html) -> String {
        self.images
            .iter()
            .filter_map(|rule| {
                document
                    .select(&rule.selector)
                    .next()
                    .and_then(|element| element.value().attr(&rule.attribute))
            })
            .map(str::trim)
            .find(|src| !src.is_empty())
            .map(str::to_string)
            .unwrap_or_default()
    }
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>()
}

/// Keeps only the ASCII digits of `text`: `"₹1,299."` becomes `1299`.
pub fn parse_price(text: &str) -> Option<i64> {
    let digits: String = text.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}
