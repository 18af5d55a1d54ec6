//! Domain and wire types.
//!
//! The Torn v1 API merges every requested selection into one top-level
//! object: basic info and battle stats are flat fields, personal stats and
//! net worth are nested groups. The `*Wire` structs mirror that shape and
//! are converted into flat domain types before leaving the client.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::key::EntityKey;

/// Decoded metrics for one player, as returned by a remote lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsPayload {
    pub player_id: u64,
    pub name: String,
    pub level: u32,
    pub strength: f64,
    pub defense: f64,
    pub speed: f64,
    pub dexterity: f64,
    pub money_earned: i64,
    pub refills: i64,
    pub drugs_used: i64,
    pub revives: i64,
    pub net_worth: i64,
}

impl MetricsPayload {
    /// Sum of the four battle stats, truncated to an integer.
    pub fn total_stats(&self) -> i64 {
        (self.strength + self.defense + self.speed + self.dexterity) as i64
    }

    /// Snapshot of this payload observed at `observed_at` (unix seconds).
    pub fn to_snapshot(&self, entity_key: EntityKey, observed_at: i64) -> MetricsSnapshot {
        MetricsSnapshot {
            entity_key,
            observed_at,
            level: self.level,
            total_stats: self.total_stats(),
            money_earned: self.money_earned,
            refills: self.refills,
            drugs_used: self.drugs_used,
            revives: self.revives,
            net_worth: self.net_worth,
        }
    }
}

/// Last-known metrics for one entity, as persisted by the snapshot store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub entity_key: EntityKey,
    /// Unix seconds.
    pub observed_at: i64,
    pub level: u32,
    pub total_stats: i64,
    pub money_earned: i64,
    pub refills: i64,
    pub drugs_used: i64,
    pub revives: i64,
    pub net_worth: i64,
}

/// Travel/hospital/jail state of a player.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStatus {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub details: String,
    #[serde(default)]
    pub state: String,
    /// Unix seconds the current state ends at, 0 when open-ended.
    #[serde(default)]
    pub until: i64,
}

/// One member of a faction roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FactionMember {
    pub player_id: u64,
    pub name: String,
    pub level: u32,
    pub days_in_faction: u32,
    pub status: PlayerStatus,
}

// ── Wire format ──────────────────────────────────────────────────────────

/// Embedded API error (`{"error": {"code": 6, "error": "Incorrect ID"}}`).
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiErrorWire {
    pub code: i64,
    #[serde(default)]
    pub error: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UserWire {
    pub player_id: u64,
    pub name: String,
    #[serde(default)]
    pub level: u32,
    #[serde(default)]
    pub strength: f64,
    #[serde(default)]
    pub defense: f64,
    #[serde(default)]
    pub speed: f64,
    #[serde(default)]
    pub dexterity: f64,
    #[serde(default)]
    pub personalstats: PersonalStatsWire,
    #[serde(default)]
    pub networth: NetworthWire,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct PersonalStatsWire {
    #[serde(default)]
    pub moneyearned: i64,
    #[serde(default)]
    pub refills: i64,
    #[serde(default)]
    pub drugsused: i64,
    #[serde(default)]
    pub revives: i64,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct NetworthWire {
    #[serde(default)]
    pub total: f64,
}

impl From<UserWire> for MetricsPayload {
    fn from(wire: UserWire) -> Self {
        Self {
            player_id: wire.player_id,
            name: wire.name,
            level: wire.level,
            strength: wire.strength,
            defense: wire.defense,
            speed: wire.speed,
            dexterity: wire.dexterity,
            money_earned: wire.personalstats.moneyearned,
            refills: wire.personalstats.refills,
            drugs_used: wire.personalstats.drugsused,
            revives: wire.personalstats.revives,
            net_worth: wire.networth.total as i64,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatusWire {
    #[serde(default)]
    pub status: PlayerStatus,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FactionWire {
    #[serde(default)]
    pub members: BTreeMap<String, FactionMemberWire>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FactionMemberWire {
    pub name: String,
    #[serde(default)]
    pub level: u32,
    #[serde(default)]
    pub days_in_faction: u32,
    #[serde(default)]
    pub status: PlayerStatus,
}

impl FactionWire {
    /// Flatten the id-keyed roster, sorted by player id. Entries whose key
    /// is not a numeric id are dropped.
    pub(crate) fn into_members(self) -> Vec<FactionMember> {
        let mut members: Vec<FactionMember> = self
            .members
            .into_iter()
            .filter_map(|(id, m)| {
                let player_id = id.parse::<u64>().ok()?;
                Some(FactionMember {
                    player_id,
                    name: m.name,
                    level: m.level,
                    days_in_faction: m.days_in_faction,
                    status: m.status,
                })
            })
            .collect();
        members.sort_by_key(|m| m.player_id);
        members
    }
}
