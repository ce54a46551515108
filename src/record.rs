//! Catalog record types
//!
//! A [`Record`] is one item scraped from a catalog page. Prices are kept as
//! integer minor units so that no floating point rounding ever reaches the
//! output artifact.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors produced while interpreting scraped field text
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("empty price text")]
    EmptyPrice,

    #[error("price '{0}' is not a decimal amount")]
    InvalidPrice(String),

    #[error("price '{0}' has more than two fractional digits")]
    TooPrecise(String),
}

/// A monetary amount as scraped from the catalog
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Price {
    /// Amount in hundredths of the currency unit
    minor_units: u64,

    /// Currency symbol or code that prefixed the amount (may be empty)
    currency: String,
}

impl Price {
    /// Creates a price from minor units and a currency symbol
    pub fn new(minor_units: u64, currency: impl Into<String>) -> Self {
        Self {
            minor_units,
            currency: currency.into(),
        }
    }

    pub fn minor_units(&self) -> u64 {
        self.minor_units
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// Renders the amount without currency, e.g. `51.77`
    pub fn to_decimal_string(&self) -> String {
        format!("{}.{:02}", self.minor_units / 100, self.minor_units % 100)
    }
}

impl FromStr for Price {
    type Err = FieldError;

    /// Parses text such as `£51.77`, `$ 3.5`, `.99` or `12`
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let text = text.trim();
        if text.is_empty() {
            return Err(FieldError::EmptyPrice);
        }

        let amount_start = text
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .ok_or_else(|| FieldError::InvalidPrice(text.to_string()))?;
        let currency = text[..amount_start].trim();
        if currency.contains('-') {
            return Err(FieldError::InvalidPrice(text.to_string()));
        }

        let amount = text[amount_start..].trim().replace(',', "");
        let (whole, fraction) = match amount.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (amount.as_str(), ""),
        };

        // A bare fraction like `.99` has an implicit zero whole part
        if (whole.is_empty() && fraction.is_empty())
            || !whole.chars().all(|c| c.is_ascii_digit())
            || !fraction.chars().all(|c| c.is_ascii_digit())
        {
            return Err(FieldError::InvalidPrice(text.to_string()));
        }
        if fraction.len() > 2 {
            return Err(FieldError::TooPrecise(text.to_string()));
        }

        let whole: u64 = if whole.is_empty() {
            0
        } else {
            whole
                .parse()
                .map_err(|_| FieldError::InvalidPrice(text.to_string()))?
        };
        let cents: u64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<u64>().unwrap_or(0) * 10,
            _ => fraction.parse::<u64>().unwrap_or(0),
        };

        let minor_units = whole
            .checked_mul(100)
            .and_then(|v| v.checked_add(cents))
            .ok_or_else(|| FieldError::InvalidPrice(text.to_string()))?;

        Ok(Self::new(minor_units, currency))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.currency, self.to_decimal_string())
    }
}

/// Stock status of a catalog item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Availability {
    InStock,
    OutOfStock,
    Unknown,
}

impl Availability {
    /// Classifies free-form availability text such as `In stock (22 available)`
    pub fn from_text(text: &str) -> Self {
        const OUT_OF_STOCK: [&str; 5] = [
            "out of stock",
            "unavailable",
            "not available",
            "not in stock",
            "no longer available",
        ];

        let lowered = text.trim().to_lowercase();
        if OUT_OF_STOCK.iter().any(|marker| lowered.contains(marker)) {
            Self::OutOfStock
        } else if lowered.contains("in stock") || lowered.contains("available") {
            Self::InStock
        } else {
            Self::Unknown
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InStock => "in_stock",
            Self::OutOfStock => "out_of_stock",
            Self::Unknown => "unknown",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "in_stock" => Some(Self::InStock),
            "out_of_stock" => Some(Self::OutOfStock),
            "unknown" => Some(Self::Unknown),
            _ => None,
        }
    }
}

impl fmt::Display for Availability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One extracted catalog item
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Record {
    pub name: String,
    pub price: Price,
    pub availability: Availability,

    /// Catalog page the item was scraped from
    pub source_page: u32,
}

impl Record {
    /// Column names of the tabular output, in write order
    pub const COLUMNS: [&'static str; 4] = ["name", "price", "availability", "source_page"];

    /// Field values in [`Record::COLUMNS`] order
    pub fn to_row(&self) -> [String; 4] {
        [
            self.name.clone(),
            self.price.to_decimal_string(),
            self.availability.as_str().to_string(),
            self.source_page.to_string(),
        ]
    }
}
