use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::domain::error::EntryParseError;
use crate::domain::value_objects::{IdentityKey, NOT_AVAILABLE_SENTINEL};

/// Potency attributes keyed by lowercase label (`"thc"`, `"cbd"`), valued by
/// an already formatted percentage string (`"18.5%"`) or the `"N/A"` sentinel.
pub type PotencyAttributes = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Availability {
    Available,
    NotAvailable,
}

impl Availability {
    pub fn from_flag(available: bool) -> Self {
        if available {
            Availability::Available
        } else {
            Availability::NotAvailable
        }
    }

    /// Text written into the availability cell. Conditional styling rules
    /// match on this exact string.
    pub fn label(self) -> &'static str {
        match self {
            Availability::Available => "Available",
            Availability::NotAvailable => "Not Available",
        }
    }
}

/// Raw field tuple produced by a source parser, before canonicalization.
///
/// Option-list sources leave `potency` empty and `available` as `None`.
/// Ordering is derived so parsers can collect into a `BTreeSet` and get
/// order-independent, duplicate-free output.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct RawListing {
    pub name: String,
    pub price: Decimal,
    pub potency: PotencyAttributes,
    pub available: Option<bool>,
}

impl RawListing {
    pub fn priced(name: impl Into<String>, price: Decimal) -> Self {
        Self {
            name: name.into(),
            price,
            potency: PotencyAttributes::new(),
            available: None,
        }
    }
}

/// Result of parsing one batch: the surviving tuples plus every entry that
/// was dropped along the way.
#[derive(Debug, Clone, Default)]
pub struct ParseOutcome {
    pub listings: Vec<RawListing>,
    pub rejected: Vec<EntryParseError>,
}

/// Canonical unit of catalog data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Product {
    pub identity: IdentityKey,
    pub name: String,
    pub price: Decimal,
    pub potency: PotencyAttributes,
    pub availability: Option<Availability>,
}

impl Product {
    /// Potency value for `label`, or the sentinel when the source did not
    /// report it.
    pub fn potency(&self, label: &str) -> &str {
        self.potency
            .get(&label.to_ascii_lowercase())
            .map(String::as_str)
            .unwrap_or(NOT_AVAILABLE_SENTINEL)
    }
}
