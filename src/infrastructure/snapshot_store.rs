use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::domain::error::{SnapshotReadError, SnapshotWriteError};
use crate::domain::fingerprint::fingerprint;
use crate::domain::ports::SnapshotStore;
use crate::domain::snapshot::Snapshot;
use crate::domain::value_objects::{Fingerprint, SourceName};

/// On-disk form of a committed snapshot.
#[derive(Debug, Serialize, Deserialize)]
struct SnapshotEnvelope {
    source: String,
    taken_at: DateTime<Utc>,
    fingerprint: Fingerprint,
    prices: Snapshot,
}

/// One JSON file per source under `dir`, replaced atomically on commit.
#[derive(Debug, Clone)]
pub struct JsonSnapshotStore {
    dir: PathBuf,
}

impl JsonSnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, source: &SourceName) -> PathBuf {
        self.dir.join(format!("{}.snapshot.json", source.slug()))
    }
}

impl SnapshotStore for JsonSnapshotStore {
    fn load(&self, source: &SourceName) -> Result<Snapshot, SnapshotReadError> {
        let path = self.path_for(source);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(SnapshotReadError::Missing),
            Err(e) => return Err(e.into()),
        };
        let envelope: SnapshotEnvelope = serde_json::from_slice(&bytes)
            .map_err(|e| SnapshotReadError::Corrupt(format!("{}: {e}", path.display())))?;

        let computed = fingerprint(&envelope.prices);
        if computed != envelope.fingerprint {
            return Err(SnapshotReadError::FingerprintMismatch {
                stored: envelope.fingerprint.0,
                computed: computed.0,
            });
        }
        debug!(%source, products = envelope.prices.len(), taken_at = %envelope.taken_at, "snapshot loaded");
        Ok(envelope.prices)
    }

    fn commit(&self, source: &SourceName, snapshot: &Snapshot) -> Result<(), SnapshotWriteError> {
        let envelope = SnapshotEnvelope {
            source: source.0.clone(),
            taken_at: Utc::now(),
            fingerprint: fingerprint(snapshot),
            prices: snapshot.clone(),
        };
        let json = serde_json::to_vec_pretty(&envelope)
            .map_err(|e| SnapshotWriteError(e.to_string()))?;
        write_atomically(&self.path_for(source), &json)
            .map_err(|e| SnapshotWriteError(e.to_string()))?;
        debug!(%source, products = snapshot.len(), "snapshot committed");
        Ok(())
    }
}

/// Write next to the target, then rename over it: readers see the old file
/// or the new one, never a truncated mix.
fn write_atomically(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, contents)?;
    fs::rename(&tmp, path)
}
