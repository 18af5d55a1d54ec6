//! Durable snapshot store.
//!
//! ## Layout
//!
//! ```text
//! {data_dir}/
//!   {entity_key}.json   { timestamp, level, total_stats, money_earned,
//!                         refills, drugs, revives, net_worth }
//! ```
//!
//! One file per tracked entity; a save replaces the whole record. There is
//! no version field, so schema changes need an out-of-band migration.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::key::EntityKey;
use crate::model::MetricsSnapshot;

const RECORD_EXTENSION: &str = "json";

/// On-disk form of a snapshot. The key lives in the file name.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SnapshotRecord {
    timestamp: i64,
    level: u32,
    total_stats: i64,
    money_earned: i64,
    refills: i64,
    drugs: i64,
    revives: i64,
    net_worth: i64,
}

impl SnapshotRecord {
    fn from_snapshot(snapshot: &MetricsSnapshot) -> Self {
        Self {
            timestamp: snapshot.observed_at,
            level: snapshot.level,
            total_stats: snapshot.total_stats,
            money_earned: snapshot.money_earned,
            refills: snapshot.refills,
            drugs: snapshot.drugs_used,
            revives: snapshot.revives,
            net_worth: snapshot.net_worth,
        }
    }

    fn into_snapshot(self, entity_key: EntityKey) -> MetricsSnapshot {
        MetricsSnapshot {
            entity_key,
            observed_at: self.timestamp,
            level: self.level,
            total_stats: self.total_stats,
            money_earned: self.money_earned,
            refills: self.refills,
            drugs_used: self.drugs,
            revives: self.revives,
            net_worth: self.net_worth,
        }
    }
}

/// File-backed store holding the latest snapshot per entity key.
pub struct SnapshotStore {
    base_dir: PathBuf,
}

impl SnapshotStore {
    /// Open (creating if needed) a store rooted at `base_dir`.
    pub fn open(base_dir: PathBuf) -> Result<Self, StoreError> {
        std::fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    fn record_path(&self, key: &EntityKey) -> PathBuf {
        self.base_dir
            .join(format!("{}.{RECORD_EXTENSION}", key.as_str()))
    }

    /// Write `data` to `path` via a synced `.tmp` sibling and a rename, so
    /// readers see either the old record or the new one.
    fn atomic_write(&self, path: &Path, data: &[u8]) -> Result<(), StoreError> {
        let tmp = path.with_extension("tmp");
        {
            let mut file = File::create(&tmp)?;
            file.write_all(data)?;
            file.sync_all()?;
        }
        std::fs::rename(&tmp, path)?;
        // Persist the rename itself. Not supported on every platform.
        if let Ok(dir) = File::open(&self.base_dir)
            && let Err(e) = dir.sync_all()
        {
            tracing::debug!(dir = %self.base_dir.display(), "directory sync skipped: {e}");
        }
        Ok(())
    }

    /// Decode the record at `path`; `None` when the file does not exist.
    fn read_record(
        &self,
        key: &EntityKey,
        path: &Path,
    ) -> Result<Option<MetricsSnapshot>, StoreError> {
        let data = match std::fs::read_to_string(path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let record: SnapshotRecord =
            serde_json::from_str(&data).map_err(|e| StoreError::Corrupt {
                key: key.to_string(),
                reason: e.to_string(),
            })?;
        Ok(Some(record.into_snapshot(key.clone())))
    }

    /// Persisted snapshot for `key`, if any.
    pub fn load(&self, key: &EntityKey) -> Result<Option<MetricsSnapshot>, StoreError> {
        self.read_record(key, &self.record_path(key))
    }

    /// Create or fully replace the record for `snapshot.entity_key`.
    ///
    /// Durable when this returns. Refuses to replace a record observed
    /// later than `snapshot`.
    pub fn save(&self, snapshot: &MetricsSnapshot) -> Result<(), StoreError> {
        let key = &snapshot.entity_key;
        let path = self.record_path(key);

        // A corrupt record is overwritten rather than blocking progress.
        match self.read_record(key, &path) {
            Ok(Some(existing)) if existing.observed_at > snapshot.observed_at => {
                return Err(StoreError::StaleWrite {
                    key: key.to_string(),
                    stored_at: existing.observed_at,
                    attempted_at: snapshot.observed_at,
                });
            }
            Ok(_) => {}
            Err(StoreError::Corrupt { reason, .. }) => {
                tracing::warn!(key = %key, %reason, "replacing corrupt snapshot");
            }
            Err(e) => return Err(e),
        }

        let json = serde_json::to_string_pretty(&SnapshotRecord::from_snapshot(snapshot))?;
        self.atomic_write(&path, json.as_bytes())?;
        tracing::debug!(key = %key, observed_at = snapshot.observed_at, "snapshot saved");
        Ok(())
    }

    /// Remove the record for `key`. Returns whether one existed.
    pub fn delete(&self, key: &EntityKey) -> Result<bool, StoreError> {
        match std::fs::remove_file(self.record_path(key)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Every stored snapshot, sorted by key.
    ///
    /// Files that are not `<valid key>.json` are ignored; a record that
    /// fails to decode fails the whole listing.
    pub fn list_all(&self) -> Result<Vec<MetricsSnapshot>, StoreError> {
        let mut snapshots = Vec::new();

        let entries = match std::fs::read_dir(&self.base_dir) {
            Ok(e) => e,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(snapshots),
            Err(e) => return Err(e.into()),
        };

        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(RECORD_EXTENSION) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            // Only canonical stems; "Foo.json" would shadow "foo.json".
            let Ok(key) = EntityKey::parse(stem) else {
                continue;
            };
            if key.as_str() != stem {
                continue;
            }
            // Removed since the directory was read.
            if let Some(snapshot) = self.read_record(&key, &path)? {
                snapshots.push(snapshot);
            }
        }

        snapshots.sort_by(|a, b| a.entity_key.cmp(&b.entity_key));
        Ok(snapshots)
    }
}
