//! The facade the bot command layer calls.
//!
//! Ties the client, store and diff engine together:
//! fetch (cache-first) → lock key → load previous → diff → save → unlock.
//!
//! Snapshot keys are always derived from the fetched payload through the
//! configured [`KeyMode`], never from raw user input, so every spelling of
//! a player maps to one record.

use crate::client::TornClient;
use crate::diff::{self, DiffReport};
use crate::error::{FetchError, RankingError, TrackError};
use crate::key::{EntityKey, KeyMode};
use crate::locks::KeyLocks;
use crate::model::{MetricsSnapshot, PlayerStatus};
use crate::ranking::{self, ExportTable, MetricSelector, RankedEntry};
use crate::store::SnapshotStore;

/// Result of tracking one entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
    pub key: EntityKey,
    /// The snapshot that now replaces the previous one.
    pub snapshot: MetricsSnapshot,
    pub report: DiffReport,
}

/// Per-input outcome of [`Tracker::track`].
#[derive(Debug)]
pub struct TrackOutcome {
    pub input: String,
    pub result: Result<Progress, TrackError>,
}

pub struct Tracker {
    client: TornClient,
    store: SnapshotStore,
    key_mode: KeyMode,
    locks: KeyLocks,
}

impl Tracker {
    pub fn new(client: TornClient, store: SnapshotStore, key_mode: KeyMode) -> Self {
        Self {
            client,
            store,
            key_mode,
            locks: KeyLocks::new(),
        }
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    /// Track each input in order; one outcome per input.
    pub async fn track(&self, inputs: &[String]) -> Vec<TrackOutcome> {
        let mut outcomes = Vec::with_capacity(inputs.len());
        for input in inputs {
            let result = self.track_one(input).await;
            outcomes.push(TrackOutcome {
                input: input.clone(),
                result,
            });
        }
        outcomes
    }

    /// Fetch `input`, diff it against the stored snapshot and replace it.
    pub async fn track_one(&self, input: &str) -> Result<Progress, TrackError> {
        let entry = self.client.fetch_entry(input).await?;
        let payload = &entry.payload;
        let key = self.key_mode.key_for(payload)?;
        // A cached payload is stamped with when it was fetched, not now.
        let observed_at = entry.fetched_at.timestamp();

        let _guard = self.locks.lock(&key).await;
        let previous = self.store.load(&key)?;
        let report = diff::compute(previous.as_ref(), payload, observed_at);
        let snapshot = payload.to_snapshot(key.clone(), observed_at);
        self.store.save(&snapshot)?;

        match &report {
            DiffReport::FirstObservation => {
                tracing::info!(key = %key, "first observation stored");
            }
            DiffReport::Compared { deltas, age } => {
                tracing::info!(
                    key = %key,
                    total_stats = deltas.total_stats,
                    net_worth = deltas.net_worth,
                    age = %age,
                    "snapshot updated"
                );
            }
        }

        Ok(Progress {
            key,
            snapshot,
            report,
        })
    }

    /// Track every member of a faction.
    pub async fn track_faction(&self, faction_id: u64) -> Result<Vec<TrackOutcome>, FetchError> {
        let members = self.client.fetch_faction_members(faction_id).await?;
        tracing::info!(faction_id, members = members.len(), "tracking faction roster");
        let inputs: Vec<String> = members
            .into_iter()
            .map(|m| match self.key_mode {
                KeyMode::Name => m.name,
                KeyMode::UserId => m.player_id.to_string(),
            })
            .collect();
        Ok(self.track(&inputs).await)
    }

    /// Storage key for user input, derived the same way `track_one` derives
    /// it. Inputs that need the payload go through a (cached) lookup.
    async fn resolve_key(&self, input: &str) -> Result<EntityKey, TrackError> {
        if let Some(key) = self.key_mode.key_from_input(input)? {
            return Ok(key);
        }
        let payload = self.client.fetch(input).await?;
        Ok(self.key_mode.key_for(&payload)?)
    }

    /// Forget the stored snapshot for `input`. Returns whether one existed.
    pub async fn clear(&self, input: &str) -> Result<bool, TrackError> {
        let key = self.resolve_key(input).await?;
        let _guard = self.locks.lock(&key).await;
        let existed = self.store.delete(&key)?;
        tracing::info!(key = %key, existed, "snapshot cleared");
        Ok(existed)
    }

    /// Every stored snapshot as a table.
    pub fn export(&self) -> Result<ExportTable, RankingError> {
        ranking::export_all(&self.store, self.key_mode)
    }

    /// Top `n` stored players by `selector`.
    pub fn top(&self, n: usize, selector: MetricSelector) -> Result<Vec<RankedEntry>, RankingError> {
        ranking::top_n(&self.store, n, selector)
    }

    /// Top `n` stored players by total battle stats.
    pub fn top_growth(&self, n: usize) -> Result<Vec<RankedEntry>, RankingError> {
        self.top(n, MetricSelector::TotalStats)
    }

    pub async fn status(&self, input: &str) -> Result<PlayerStatus, FetchError> {
        self.client.fetch_status(input).await
    }
}
