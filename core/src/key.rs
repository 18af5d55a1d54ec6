//! Entity key normalization.
//!
//! An [`EntityKey`] is the only handle the snapshot store accepts, so every
//! load/save/delete/list goes through the same normalization. The key is
//! also the snapshot's file stem, which is why the character set is
//! restricted.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::MetricsPayload;

/// Longest accepted key, in bytes.
const MAX_KEY_LEN: usize = 64;

/// Input that cannot be turned into an [`EntityKey`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid entity key {input:?}: {reason}")]
pub struct InvalidKey {
    pub input: String,
    pub reason: &'static str,
}

/// Normalized identifier for a tracked player.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntityKey(String);

impl EntityKey {
    /// Normalize `raw` (trim, ASCII lower-case) and validate it.
    pub fn parse(raw: &str) -> Result<Self, InvalidKey> {
        let normalized = raw.trim().to_ascii_lowercase();
        let invalid = |reason| InvalidKey {
            input: raw.to_string(),
            reason,
        };
        if normalized.is_empty() {
            return Err(invalid("empty"));
        }
        if normalized.len() > MAX_KEY_LEN {
            return Err(invalid("too long"));
        }
        if !normalized
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(invalid("only letters, digits, '_' and '-' are allowed"));
        }
        Ok(Self(normalized))
    }

    /// Key for a numeric player id.
    pub fn from_player_id(id: u64) -> Self {
        Self(id.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for EntityKey {
    type Error = InvalidKey;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<EntityKey> for String {
    fn from(key: EntityKey) -> Self {
        key.0
    }
}

/// Which identifier snapshots are keyed by.
///
/// Applies to every store boundary. Switching modes on an existing data
/// directory orphans the records written under the other mode.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum_macros::Display,
    strum_macros::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum KeyMode {
    /// Lower-cased player name.
    #[default]
    Name,
    /// Numeric player id.
    UserId,
}

impl KeyMode {
    /// Storage key for a fetched payload.
    pub fn key_for(self, payload: &MetricsPayload) -> Result<EntityKey, InvalidKey> {
        match self {
            KeyMode::Name => EntityKey::parse(&payload.name),
            KeyMode::UserId => Ok(EntityKey::from_player_id(payload.player_id)),
        }
    }

    /// Storage key derivable from user input without a remote lookup.
    ///
    /// Must agree with [`key_for`](Self::key_for) on the payload the input
    /// would fetch. Returns `Ok(None)` when it cannot: a name in `UserId`
    /// mode, or a numeric id in `Name` mode. The caller resolves those
    /// through a lookup.
    pub fn key_from_input(self, input: &str) -> Result<Option<EntityKey>, InvalidKey> {
        let key = EntityKey::parse(input)?;
        let player_id = key.as_str().parse::<u64>().ok();
        match (self, player_id) {
            (KeyMode::Name, None) => Ok(Some(key)),
            (KeyMode::UserId, Some(id)) => Ok(Some(EntityKey::from_player_id(id))),
            (KeyMode::Name, Some(_)) | (KeyMode::UserId, None) => Ok(None),
        }
    }

    /// Header of the key column in exports.
    pub fn column_name(self) -> &'static str {
        match self {
            KeyMode::Name => "name",
            KeyMode::UserId => "user_id",
        }
    }
}
