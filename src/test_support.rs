//! Shared helpers for unit tests.

use rust_decimal::Decimal;
use std::str::FromStr;

use crate::domain::product::{Availability, Product};
use crate::domain::value_objects::IdentityKey;

pub fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

pub fn product(name: &str, price: &str) -> Product {
    Product {
        identity: IdentityKey::from_name(name).unwrap(),
        name: name.trim().to_string(),
        price: dec(price),
        potency: Default::default(),
        availability: None,
    }
}

pub fn stocked(name: &str, price: &str, available: bool) -> Product {
    Product {
        availability: Some(Availability::from_flag(available)),
        ..product(name, price)
    }
}
