use std::collections::BTreeSet;

use crate::domain::{
    annotation::{AnnotatedRow, ChangeSummary, DiffOutcome, RowAnnotation},
    ports::Differ,
    product::Product,
    snapshot::Snapshot,
    value_objects::IdentityKey,
};

// ─── Snapshot Differ (implementation of the port) ───

/// Classifies each current product against the prior snapshot and builds the
/// replacement snapshot.
///
/// Row order is preserved exactly; prices are compared as exact decimals, so
/// callers must hand in already-rounded prices.
#[derive(Default)]
pub struct SnapshotDiffer;

impl SnapshotDiffer {
    pub fn new() -> Self {
        Self
    }
}

impl Differ for SnapshotDiffer {
    fn diff(&self, current: Vec<Product>, prior: &Snapshot) -> DiffOutcome {
        let next_snapshot = Snapshot::from_products(&current);

        let current_keys: BTreeSet<&IdentityKey> = current.iter().map(|p| &p.identity).collect();
        let removed: Vec<IdentityKey> = prior
            .keys()
            .filter(|k| !current_keys.contains(k))
            .cloned()
            .collect();

        let rows: Vec<AnnotatedRow> = current
            .into_iter()
            .map(|product| {
                let annotation = RowAnnotation::classify(prior.price_of(&product.identity), product.price);
                AnnotatedRow { product, annotation }
            })
            .collect();

        let summary = ChangeSummary::from_rows(&rows, removed);

        DiffOutcome {
            rows,
            next_snapshot,
            summary,
        }
    }
}
