use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::sync::LazyLock;
use tracing::debug;

use crate::application::parsers::{finish, parse_price};
use crate::domain::error::{BatchError, EntryParseError};
use crate::domain::ports::SourceParser;
use crate::domain::product::{ParseOutcome, PotencyAttributes, RawListing};
use crate::domain::value_objects::NOT_AVAILABLE_SENTINEL;

pub const DEFAULT_POTENCY_LABELS: [&str; 2] = ["THC", "CBD"];

/// Optional leading currency symbol, digits with comma grouping in threes,
/// optional fraction, optional trailing ISO code.
static PRICE_TEXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*\p{Sc}?\s*(-?(?:\d{1,3}(?:,\d{3})+|\d+)(?:\.\d+)?)\s*(?:[A-Za-z]{3})?\s*$")
        .expect("static price pattern")
});

// ─── Wire shape ──────────────────────────────────────────────────────────────
//
// Entries are decoded one by one so a single odd entry is dropped instead of
// failing the whole document.

#[derive(Deserialize)]
struct FeedDocument {
    products: Vec<Value>,
}

#[derive(Deserialize)]
struct FeedEntry {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    body_html: Option<String>,
    #[serde(default)]
    variants: Vec<FeedVariant>,
}

#[derive(Deserialize)]
struct FeedVariant {
    #[serde(default)]
    price: Option<Value>,
    #[serde(default)]
    available: Option<bool>,
}

// ─── Potency extraction ──────────────────────────────────────────────────────

/// Case-insensitive `<LABEL>[:\s]*<number>%` search, one pattern per label.
#[derive(Debug, Clone)]
pub struct PotencyExtractor {
    patterns: Vec<(String, Regex)>,
}

impl PotencyExtractor {
    pub fn new<S: AsRef<str>>(labels: &[S]) -> Result<Self, regex::Error> {
        let patterns = labels
            .iter()
            .map(|label| {
                let label = label.as_ref().trim();
                let re = Regex::new(&format!(
                    r"(?i){}[:\s]*(\d*\.?\d+)%",
                    regex::escape(label)
                ))?;
                Ok((label.to_ascii_lowercase(), re))
            })
            .collect::<Result<_, regex::Error>>()?;
        Ok(Self { patterns })
    }

    /// First match per label wins; labels never mentioned map to `"N/A"`.
    pub fn extract(&self, text: &str) -> PotencyAttributes {
        self.patterns
            .iter()
            .map(|(label, re)| {
                let value = re
                    .captures(text)
                    .and_then(|c| c.get(1))
                    .map(|m| format!("{}%", m.as_str()))
                    .unwrap_or_else(|| NOT_AVAILABLE_SENTINEL.to_string());
                (label.clone(), value)
            })
            .collect()
    }
}

// ─── Parser ──────────────────────────────────────────────────────────────────

/// Parses a JSON product feed (`{"products": [...]}`), consulting only the
/// first variant of each entry for price and availability.
#[derive(Debug, Clone)]
pub struct ProductFeedParser {
    potency: PotencyExtractor,
}

impl ProductFeedParser {
    pub fn new<S: AsRef<str>>(potency_labels: &[S]) -> Result<Self, regex::Error> {
        Ok(Self {
            potency: PotencyExtractor::new(potency_labels)?,
        })
    }

    pub fn with_default_labels() -> Result<Self, regex::Error> {
        Self::new(&DEFAULT_POTENCY_LABELS)
    }

    fn parse_entry(&self, entry: Value) -> Result<RawListing, EntryParseError> {
        let entry: FeedEntry = serde_json::from_value(entry)
            .map_err(|e| EntryParseError::MalformedEntry(e.to_string()))?;

        let title = entry.title.as_deref().unwrap_or_default().trim().to_string();
        if title.is_empty() {
            return Err(EntryParseError::EmptyName);
        }
        let variant = entry
            .variants
            .first()
            .ok_or_else(|| EntryParseError::NoVariants {
                title: title.clone(),
            })?;

        let price = match &variant.price {
            None | Some(Value::Null) => {
                return Err(EntryParseError::EmptyPrice { name: title });
            }
            Some(Value::String(s)) if s.trim().is_empty() => {
                return Err(EntryParseError::EmptyPrice { name: title });
            }
            Some(Value::String(s)) => {
                let Some(cleaned) = clean_price_text(s) else {
                    return Err(EntryParseError::InvalidPrice {
                        name: title,
                        raw: s.clone(),
                    });
                };
                parse_price(&title, &cleaned)?
            }
            Some(Value::Number(n)) => parse_price(&title, &n.to_string())?,
            Some(other) => {
                return Err(EntryParseError::InvalidPrice {
                    name: title,
                    raw: other.to_string(),
                })
            }
        };

        let potency = self
            .potency
            .extract(entry.body_html.as_deref().unwrap_or_default());

        Ok(RawListing {
            name: title,
            price,
            potency,
            available: Some(variant.available.unwrap_or(false)),
        })
    }
}

impl SourceParser for ProductFeedParser {
    fn parse(&self, raw: &[u8]) -> Result<ParseOutcome, BatchError> {
        let document: FeedDocument =
            serde_json::from_slice(raw).map_err(|e| BatchError::MalformedPayload {
                expected: "product feed JSON",
                detail: e.to_string(),
            })?;

        let mut listings = Vec::with_capacity(document.products.len());
        let mut rejected = Vec::new();
        for entry in document.products {
            match self.parse_entry(entry) {
                Ok(listing) => listings.push(listing),
                Err(e) => {
                    debug!(error = %e, "feed entry skipped");
                    rejected.push(e);
                }
            }
        }

        finish(listings, rejected)
    }

    fn kind(&self) -> &'static str {
        "product_feed"
    }
}

/// `"£1,234.50"` → `"1234.50"`. `None` for anything that is not a plain
/// point-decimal amount, e.g. decimal-comma `"1.234,50"`.
fn clean_price_text(raw: &str) -> Option<String> {
    let amount = PRICE_TEXT.captures(raw)?.get(1)?.as_str();
    Some(amount.replace(',', ""))
}
