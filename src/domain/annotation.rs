use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::product::Product;
use crate::domain::snapshot::Snapshot;
use crate::domain::value_objects::IdentityKey;

/// Classification of a product's price movement relative to the snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeKind {
    None,
    New,
    PriceIncreased,
    PriceDecreased,
}

impl ChangeKind {
    pub fn is_price_change(self) -> bool {
        matches!(self, ChangeKind::PriceIncreased | ChangeKind::PriceDecreased)
    }
}

/// Per-run annotation attached to a product. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RowAnnotation {
    pub previous_price: Option<Decimal>,
    pub change: ChangeKind,
}

impl RowAnnotation {
    /// Compare `current` against the price recorded in the prior snapshot.
    pub fn classify(previous_price: Option<Decimal>, current: Decimal) -> Self {
        let change = match previous_price {
            None => ChangeKind::New,
            Some(prev) if current == prev => ChangeKind::None,
            Some(prev) if current < prev => ChangeKind::PriceDecreased,
            Some(_) => ChangeKind::PriceIncreased,
        };
        Self {
            previous_price,
            change,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnnotatedRow {
    pub product: Product,
    pub annotation: RowAnnotation,
}

/// Counts per change kind for one run, plus the keys that disappeared.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChangeSummary {
    pub new: usize,
    pub unchanged: usize,
    pub increased: usize,
    pub decreased: usize,
    /// Keys present in the prior snapshot but absent from this run.
    pub removed: Vec<IdentityKey>,
}

impl ChangeSummary {
    pub fn from_rows(rows: &[AnnotatedRow], removed: Vec<IdentityKey>) -> Self {
        let mut summary = ChangeSummary {
            removed,
            ..Default::default()
        };
        for row in rows {
            match row.annotation.change {
                ChangeKind::None => summary.unchanged += 1,
                ChangeKind::New => summary.new += 1,
                ChangeKind::PriceIncreased => summary.increased += 1,
                ChangeKind::PriceDecreased => summary.decreased += 1,
            }
        }
        summary
    }

    pub fn total_changes(&self) -> usize {
        self.new + self.increased + self.decreased + self.removed.len()
    }
}

/// Output of the snapshot diff engine: annotated rows in input order, the
/// snapshot to persist if the run succeeds, and the per-kind counts.
#[derive(Debug, Clone, PartialEq)]
pub struct DiffOutcome {
    pub rows: Vec<AnnotatedRow>,
    pub next_snapshot: Snapshot,
    pub summary: ChangeSummary,
}
