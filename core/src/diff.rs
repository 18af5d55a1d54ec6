//! Growth computation between a stored snapshot and a fresh payload.
//!
//! Pure functions only; nothing here touches the store or the network.

use std::fmt;

use serde::Serialize;

use crate::model::{MetricsPayload, MetricsSnapshot};

const SECS_PER_HOUR: i64 = 3_600;
const SECS_PER_DAY: i64 = 86_400;

/// Field-wise change since the previous snapshot. Negative values mean the
/// metric went down and are kept as-is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Deltas {
    pub total_stats: i64,
    pub net_worth: i64,
    pub money_earned: i64,
    pub drugs_used: i64,
    pub refills: i64,
    pub revives: i64,
}

/// Time elapsed since the previous snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Age {
    pub elapsed_secs: i64,
}

impl Age {
    /// Elapsed time from `then` to `now` (unix seconds). A `then` in the
    /// future yields zero.
    pub fn between(then: i64, now: i64) -> Self {
        Self {
            elapsed_secs: now.saturating_sub(then).max(0),
        }
    }
}

impl fmt::Display for Age {
    /// `"{h}h ago"` under a day, `"{d}d ago"` from 24h on; both truncated.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.elapsed_secs < SECS_PER_DAY {
            write!(f, "{}h ago", self.elapsed_secs / SECS_PER_HOUR)
        } else {
            write!(f, "{}d ago", self.elapsed_secs / SECS_PER_DAY)
        }
    }
}

/// Outcome of comparing a fresh payload against the stored snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiffReport {
    /// No prior snapshot; nothing to compare against yet.
    FirstObservation,
    Compared { deltas: Deltas, age: Age },
}

impl DiffReport {
    pub fn deltas(&self) -> Option<&Deltas> {
        match self {
            DiffReport::FirstObservation => None,
            DiffReport::Compared { deltas, .. } => Some(deltas),
        }
    }

    pub fn is_first_observation(&self) -> bool {
        matches!(self, DiffReport::FirstObservation)
    }
}

/// Compare `current` against `previous` as of `now` (unix seconds).
pub fn compute(previous: Option<&MetricsSnapshot>, current: &MetricsPayload, now: i64) -> DiffReport {
    let Some(prev) = previous else {
        return DiffReport::FirstObservation;
    };

    let deltas = Deltas {
        total_stats: current.total_stats().saturating_sub(prev.total_stats),
        net_worth: current.net_worth.saturating_sub(prev.net_worth),
        money_earned: current.money_earned.saturating_sub(prev.money_earned),
        drugs_used: current.drugs_used.saturating_sub(prev.drugs_used),
        refills: current.refills.saturating_sub(prev.refills),
        revives: current.revives.saturating_sub(prev.revives),
    };

    DiffReport::Compared {
        deltas,
        age: Age::between(prev.observed_at, now),
    }
}
