use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

static ASIN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:dp|gp/product)/([A-Z0-9]{10})").expect("ASIN pattern is valid")
});

/// Amazon Standard Identification Number: the ten character key a listing is tracked under.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct Asin(String);

impl Asin {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Asin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Pull the ASIN out of a product URL (`/dp/<ASIN>` or `/gp/product/<ASIN>`).
pub fn extract_identity(url: &str) -> Option<Asin> {
    ASIN_PATTERN
        .captures(url)
        .and_then(|captures| captures.get(1))
        .map(|m| Asin(m.as_str().to_string()))
}

/// Parses a bare ASIN as supplied in a path segment or on the command line.
impl std::str::FromStr for Asin {
    type Err = crate::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.len() == 10 && s.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()) {
            Ok(Asin(s.to_string()))
        } else {
            Err(crate::AppError::Validation(format!("'{}' is not a valid ASIN", s)))
        }
    }
}
