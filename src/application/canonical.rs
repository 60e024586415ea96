use rust_decimal::{Decimal, RoundingStrategy};
use tracing::debug;

use crate::domain::error::EntryParseError;
use crate::domain::product::{Availability, Product, RawListing};
use crate::domain::value_objects::IdentityKey;

/// Decimal places every canonical price carries.
pub const PRICE_SCALE: u32 = 2;

/// Round half-to-even to two places and pin the scale, so `10` and `10.00`
/// persist identically.
pub fn round_price(price: Decimal) -> Decimal {
    let mut rounded = price.round_dp_with_strategy(PRICE_SCALE, RoundingStrategy::MidpointNearestEven);
    rounded.rescale(PRICE_SCALE);
    rounded
}

/// Raw listing → canonical [`Product`]. Pure.
pub fn canonicalize(listing: RawListing) -> Result<Product, EntryParseError> {
    let identity = IdentityKey::from_name(&listing.name).ok_or(EntryParseError::EmptyName)?;
    if listing.price.is_sign_negative() && !listing.price.is_zero() {
        return Err(EntryParseError::NegativePrice {
            name: identity.to_string(),
            raw: listing.price.to_string(),
        });
    }
    Ok(Product {
        name: identity.as_str().to_string(),
        identity,
        price: round_price(listing.price),
        potency: listing.potency,
        availability: listing.available.map(Availability::from_flag),
    })
}

/// Canonicalize a batch, keeping input order and collecting the drops.
pub fn canonicalize_all(listings: Vec<RawListing>) -> (Vec<Product>, Vec<EntryParseError>) {
    let mut products = Vec::with_capacity(listings.len());
    let mut rejected = Vec::new();
    for listing in listings {
        match canonicalize(listing) {
            Ok(p) => products.push(p),
            Err(e) => {
                debug!(error = %e, "listing dropped");
                rejected.push(e);
            }
        }
    }
    (products, rejected)
}
