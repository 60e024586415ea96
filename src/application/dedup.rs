use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::domain::product::{Availability, Product};
use crate::domain::value_objects::IdentityKey;

/// Collapse products sharing an identity key. The last one seen wins, so the
/// result is only as deterministic as the input order.
pub fn deduplicate(products: Vec<Product>) -> Vec<Product> {
    let mut by_key: BTreeMap<IdentityKey, Product> = BTreeMap::new();
    for product in products {
        by_key.insert(product.identity.clone(), product);
    }
    by_key.into_values().collect()
}

/// Presentation order.
///
/// Without an availability concept: by name (ordinal). With one: available
/// first, then by name, so unavailable items sink to the bottom.
pub fn sort_products(products: &mut [Product]) {
    let has_availability = products.iter().any(|p| p.availability.is_some());
    if has_availability {
        products.sort_by(|a, b| {
            availability_rank(a)
                .cmp(&availability_rank(b))
                .then_with(|| by_name(a, b))
        });
    } else {
        products.sort_by(by_name);
    }
}

pub fn dedup_and_sort(products: Vec<Product>) -> Vec<Product> {
    let mut products = deduplicate(products);
    sort_products(&mut products);
    products
}

fn by_name(a: &Product, b: &Product) -> Ordering {
    a.name.cmp(&b.name)
}

// Products lacking availability rank with the available ones.
fn availability_rank(p: &Product) -> u8 {
    match p.availability {
        Some(Availability::NotAvailable) => 1,
        Some(Availability::Available) | None => 0,
    }
}
