//! `statwatch-core`: snapshot-diff tracking engine for Torn player stats.
//!
//! Fetches player statistics from the Torn public API (with a short-lived
//! in-memory cache), persists one snapshot per tracked player as a JSON
//! file, and computes growth between the stored snapshot and a fresh fetch.
//!
//! ## Layers
//! - [`client::TornClient`]: remote lookups with a freshness cache
//! - [`store::SnapshotStore`]: one JSON record per entity key
//! - [`diff`]: pure delta computation and age rendering
//! - [`ranking`]: top-N ranking and tabular export
//! - [`tracker::Tracker`]: the facade the bot command layer calls

pub mod cache;
pub mod client;
pub mod clock;
pub mod config;
pub mod diff;
pub mod error;
pub mod key;
pub mod locks;
pub mod model;
pub mod ranking;
pub mod store;
pub mod tracker;

pub use client::TornClient;
pub use clock::{Clock, MockClock, SystemClock};
pub use config::{AppConfig, ConfigLoader};
pub use diff::{Age, Deltas, DiffReport};
pub use error::{FetchError, RankingError, StoreError, TrackError};
pub use key::{EntityKey, KeyMode};
pub use model::{FactionMember, MetricsPayload, MetricsSnapshot, PlayerStatus};
pub use ranking::{ExportRow, ExportTable, MetricSelector, RankedEntry};
pub use store::SnapshotStore;
pub use tracker::{Progress, TrackOutcome, Tracker};
