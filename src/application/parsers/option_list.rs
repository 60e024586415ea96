use scraper::{Html, Selector};
use std::collections::BTreeSet;
use std::sync::LazyLock;
use tracing::debug;

use crate::application::parsers::{finish, parse_price};
use crate::domain::error::{BatchError, EntryParseError};
use crate::domain::ports::SourceParser;
use crate::domain::product::{ParseOutcome, RawListing};

/// Every `<option>` in the page, wherever its `<select>` lives.
static OPTION: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("option").expect("static selector"));

/// Parses markup whose `<option value="name|price">` entries list the catalog.
///
/// Output is a set: exact `(name, price)` duplicates collapse and the result
/// does not depend on option order in the page.
#[derive(Debug, Clone, Default)]
pub struct OptionListParser {
    /// Text the page must contain (case-insensitive) to be trusted.
    page_marker: Option<String>,
}

impl OptionListParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page_marker(marker: impl Into<String>) -> Self {
        Self {
            page_marker: Some(marker.into()),
        }
    }
}

impl SourceParser for OptionListParser {
    fn parse(&self, raw: &[u8]) -> Result<ParseOutcome, BatchError> {
        let markup = std::str::from_utf8(raw).map_err(|e| BatchError::MalformedPayload {
            expected: "UTF-8 markup",
            detail: e.to_string(),
        })?;

        if let Some(marker) = &self.page_marker {
            if !markup.to_lowercase().contains(&marker.to_lowercase()) {
                return Err(BatchError::StructureCheckFailed {
                    marker: marker.clone(),
                });
            }
        }

        let document = Html::parse_document(markup);
        let mut listings = BTreeSet::new();
        let mut rejected = Vec::new();

        for option in document.select(&OPTION) {
            // Only `name|price` values are catalog entries. Placeholders
            // ("Choose…") and unrelated selects (quantity, country) are not.
            let Some(value) = option.value().attr("value").filter(|v| v.contains('|')) else {
                continue;
            };
            match parse_option_value(value) {
                Ok(listing) => {
                    listings.insert(listing);
                }
                Err(e) => {
                    debug!(error = %e, "option skipped");
                    rejected.push(e);
                }
            }
        }

        finish(listings.into_iter().collect(), rejected)
    }

    fn kind(&self) -> &'static str {
        "option_list"
    }
}

/// Split `"<name>|<price>"` on the first `|`. Callers only pass values
/// that contain one.
fn parse_option_value(value: &str) -> Result<RawListing, EntryParseError> {
    let (name, price) = value.split_once('|').unwrap_or((value, ""));
    let name = name.trim();
    if name.is_empty() {
        return Err(EntryParseError::EmptyName);
    }
    let price = parse_price(name, price)?;
    Ok(RawListing::priced(name, price))
}
