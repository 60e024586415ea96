use sha2::{Digest, Sha256};

use crate::domain::snapshot::Snapshot;
use crate::domain::value_objects::Fingerprint;

/// Compute a SHA-256 fingerprint of a snapshot's content.
///
/// Algorithm:
/// 1. Each entry becomes `identityKey \t price`, the price normalised so
///    `12.5` and `12.50` hash the same.
/// 2. Lines come out of the snapshot already sorted by identity key, so the
///    fingerprint does not depend on insertion order.
/// 3. Lines are joined with `\n` and hashed with SHA-256.
///
/// An empty snapshot produces a well-defined fingerprint (hash of empty string).
pub fn fingerprint(snapshot: &Snapshot) -> Fingerprint {
    let content = snapshot
        .iter()
        .map(|(key, price)| format!("{}\t{}", key, price.normalize()))
        .collect::<Vec<_>>()
        .join("\n");
    let hash = Sha256::digest(content.as_bytes());
    Fingerprint(format!("{:x}", hash))
}
