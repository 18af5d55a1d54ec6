//! Ranking and tabular export over every stored snapshot.

use std::cmp::Reverse;

use serde::Serialize;

use crate::error::RankingError;
use crate::key::{EntityKey, KeyMode};
use crate::model::MetricsSnapshot;
use crate::store::SnapshotStore;

/// Snapshot field to rank by.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    strum_macros::Display,
    strum_macros::EnumString,
    strum_macros::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MetricSelector {
    Level,
    #[default]
    TotalStats,
    MoneyEarned,
    Refills,
    #[strum(to_string = "drugs", serialize = "drugs_used")]
    Drugs,
    Revives,
    NetWorth,
}

impl MetricSelector {
    pub fn value(self, snapshot: &MetricsSnapshot) -> i64 {
        match self {
            MetricSelector::Level => i64::from(snapshot.level),
            MetricSelector::TotalStats => snapshot.total_stats,
            MetricSelector::MoneyEarned => snapshot.money_earned,
            MetricSelector::Refills => snapshot.refills,
            MetricSelector::Drugs => snapshot.drugs_used,
            MetricSelector::Revives => snapshot.revives,
            MetricSelector::NetWorth => snapshot.net_worth,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedEntry {
    pub entity_key: EntityKey,
    pub value: i64,
}

/// Up to `n` entries sorted by `selector`, highest first. Ties keep the
/// store's listing order.
pub fn top_n(
    store: &SnapshotStore,
    n: usize,
    selector: MetricSelector,
) -> Result<Vec<RankedEntry>, RankingError> {
    let snapshots = store.list_all()?;
    if snapshots.is_empty() {
        return Err(RankingError::EmptyStore);
    }
    Ok(rank(&snapshots, n, selector))
}

fn rank(snapshots: &[MetricsSnapshot], n: usize, selector: MetricSelector) -> Vec<RankedEntry> {
    let mut entries: Vec<RankedEntry> = snapshots
        .iter()
        .map(|s| RankedEntry {
            entity_key: s.entity_key.clone(),
            value: selector.value(s),
        })
        .collect();
    // Stable sort: ties keep listing order.
    entries.sort_by_key(|e| Reverse(e.value));
    entries.truncate(n);
    entries
}

/// One exported row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportRow {
    pub entity_key: EntityKey,
    pub level: u32,
    pub total_stats: i64,
    pub money_earned: i64,
    pub refills: i64,
    pub drugs: i64,
    pub revives: i64,
    pub net_worth: i64,
}

impl From<&MetricsSnapshot> for ExportRow {
    fn from(s: &MetricsSnapshot) -> Self {
        Self {
            entity_key: s.entity_key.clone(),
            level: s.level,
            total_stats: s.total_stats,
            money_earned: s.money_earned,
            refills: s.refills,
            drugs: s.drugs_used,
            revives: s.revives,
            net_worth: s.net_worth,
        }
    }
}

/// Every stored snapshot as rows with a fixed column set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportTable {
    pub key_mode: KeyMode,
    pub rows: Vec<ExportRow>,
}

impl ExportTable {
    /// Column headers; the first one depends on the key mode.
    pub fn header(&self) -> [&'static str; 8] {
        [
            self.key_mode.column_name(),
            "level",
            "total_stats",
            "money_earned",
            "refills",
            "drugs",
            "revives",
            "net_worth",
        ]
    }

    /// Render as CSV. Keys are restricted to `[a-z0-9_-]`, so no field
    /// needs quoting.
    pub fn to_csv(&self) -> String {
        let mut out = self.header().join(",");
        out.push('\n');
        for r in &self.rows {
            out.push_str(&format!(
                "{},{},{},{},{},{},{},{}\n",
                r.entity_key,
                r.level,
                r.total_stats,
                r.money_earned,
                r.refills,
                r.drugs,
                r.revives,
                r.net_worth
            ));
        }
        out
    }
}

/// All snapshots as an [`ExportTable`]; `EmptyStore` when nothing is stored.
pub fn export_all(store: &SnapshotStore, key_mode: KeyMode) -> Result<ExportTable, RankingError> {
    let snapshots = store.list_all()?;
    if snapshots.is_empty() {
        return Err(RankingError::EmptyStore);
    }
    Ok(ExportTable {
        key_mode,
        rows: snapshots.iter().map(ExportRow::from).collect(),
    })
}
