//! Source parsers: raw upstream payload → [`RawListing`] tuples.
//!
//! Both parsers are pure. A malformed entry is dropped and recorded in
//! [`ParseOutcome::rejected`]; only a payload that cannot be trusted as a
//! whole is a [`BatchError`].

use rust_decimal::Decimal;
use std::str::FromStr;

use crate::domain::error::{BatchError, EntryParseError};
use crate::domain::product::{ParseOutcome, RawListing};

pub mod option_list;
pub mod product_feed;

pub use option_list::OptionListParser;
pub use product_feed::ProductFeedParser;

/// Close a batch: entries were present but none survived → the payload is
/// treated as malformed, never as an empty catalog.
pub(crate) fn finish(
    listings: Vec<RawListing>,
    rejected: Vec<EntryParseError>,
) -> Result<ParseOutcome, BatchError> {
    if listings.is_empty() && !rejected.is_empty() {
        return Err(BatchError::AllEntriesRejected {
            rejected: rejected.len(),
        });
    }
    Ok(ParseOutcome { listings, rejected })
}

/// Parse a trimmed price string into a non-negative decimal.
pub(crate) fn parse_price(name: &str, raw: &str) -> Result<Decimal, EntryParseError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(EntryParseError::EmptyPrice {
            name: name.to_string(),
        });
    }
    let price = Decimal::from_str(trimmed).map_err(|_| EntryParseError::InvalidPrice {
        name: name.to_string(),
        raw: raw.to_string(),
    })?;
    if price.is_sign_negative() && !price.is_zero() {
        return Err(EntryParseError::NegativePrice {
            name: name.to_string(),
            raw: raw.to_string(),
        });
    }
    Ok(price)
}
