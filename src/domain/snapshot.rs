use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::domain::error::{SnapshotReadError, SnapshotWriteError};
use crate::domain::ports::SnapshotStore;
use crate::domain::product::Product;
use crate::domain::value_objects::{IdentityKey, SourceName};

/// Prior run's `identityKey → price` map.
///
/// Read once at the start of a run, replaced wholesale at the end of a
/// successful one. Availability is deliberately not part of it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot(BTreeMap<IdentityKey, Decimal>);

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_products(products: &[Product]) -> Self {
        products
            .iter()
            .map(|p| (p.identity.clone(), p.price))
            .collect()
    }

    pub fn price_of(&self, key: &IdentityKey) -> Option<Decimal> {
        self.0.get(key).copied()
    }

    pub fn insert(&mut self, key: IdentityKey, price: Decimal) {
        self.0.insert(key, price);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&IdentityKey, &Decimal)> {
        self.0.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &IdentityKey> {
        self.0.keys()
    }
}

impl FromIterator<(IdentityKey, Decimal)> for Snapshot {
    fn from_iter<T: IntoIterator<Item = (IdentityKey, Decimal)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// In-memory implementation of [`SnapshotStore`].
///
/// Holds one snapshot per source. Useful for library consumers that persist
/// snapshots themselves, and for tests.
#[derive(Default)]
pub struct MapSnapshotStore(Mutex<BTreeMap<SourceName, Snapshot>>);

impl MapSnapshotStore {
    pub fn new(data: BTreeMap<SourceName, Snapshot>) -> Self {
        Self(Mutex::new(data))
    }

    /// Current committed snapshot for `source`, if any.
    pub fn get(&self, source: &SourceName) -> Option<Snapshot> {
        self.0.lock().ok()?.get(source).cloned()
    }
}

impl SnapshotStore for MapSnapshotStore {
    fn load(&self, source: &SourceName) -> Result<Snapshot, SnapshotReadError> {
        let guard = self
            .0
            .lock()
            .map_err(|_| SnapshotReadError::Corrupt("snapshot map lock poisoned".into()))?;
        guard.get(source).cloned().ok_or(SnapshotReadError::Missing)
    }

    fn commit(&self, source: &SourceName, snapshot: &Snapshot) -> Result<(), SnapshotWriteError> {
        let mut guard = self
            .0
            .lock()
            .map_err(|_| SnapshotWriteError("snapshot map lock poisoned".into()))?;
        guard.insert(source.clone(), snapshot.clone());
        Ok(())
    }
}
