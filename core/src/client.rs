//! Torn API client.
//!
//! Read-only lookups against the Torn v1 API. Player metric lookups go
//! through a [`LookupCache`] so repeated requests inside the freshness
//! window cost no network call. Status and faction lookups are not cached.
//!
//! Failures never populate or disturb the cache and are never retried
//! here; the caller decides on retry policy from the [`FetchError`] kind.

use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use crate::cache::{CachedLookup, LookupCache};
use crate::clock::Clock;
use crate::config::AppConfig;
use crate::error::FetchError;
use crate::key::EntityKey;
use crate::model::{
    ApiErrorWire, FactionMember, FactionWire, MetricsPayload, PlayerStatus, StatusWire, UserWire,
};

/// Selections requested for a metrics lookup.
const METRICS_SELECTIONS: &str = "basic,battlestats,personalstats,networth";
const STATUS_SELECTIONS: &str = "profile";
const FACTION_SELECTIONS: &str = "basic";

/// Embedded error codes meaning the entity does not exist.
const NOT_FOUND_CODES: &[i64] = &[6, 7];
/// Embedded error codes that may clear up on their own (rate limits, IP
/// blocks, API disabled, daily limit, temporary and backend errors).
const TRANSIENT_CODES: &[i64] = &[5, 8, 9, 14, 15, 17];

/// Client for the Torn public API.
pub struct TornClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    cache: LookupCache<MetricsPayload>,
}

impl TornClient {
    /// Build a client with its own HTTP client bounded by `timeout`.
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        timeout: Duration,
        freshness: Duration,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(
            http,
            base_url,
            api_key,
            LookupCache::new(freshness, clock),
        ))
    }

    /// Build a client from the `[api]` and `[cache]` config sections.
    pub fn from_config(config: &AppConfig, clock: Arc<dyn Clock>) -> Result<Self, reqwest::Error> {
        Self::new(
            &config.api.base_url,
            config.api.key.clone(),
            config.api.timeout(),
            config.cache.freshness(),
            clock,
        )
    }

    /// Creates a client with a custom HTTP client and cache.
    pub fn with_client(
        http: reqwest::Client,
        base_url: &str,
        api_key: Option<String>,
        cache: LookupCache<MetricsPayload>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            cache,
        }
    }

    pub fn cache(&self) -> &LookupCache<MetricsPayload> {
        &self.cache
    }

    /// Normalized lookup key; also guarantees the input is safe to place
    /// in a URL path segment.
    fn lookup_key(input: &str) -> Result<EntityKey, FetchError> {
        EntityKey::parse(input).map_err(|_| FetchError::InvalidKey {
            input: input.to_string(),
        })
    }

    /// Player metrics, from the cache when fresh.
    pub async fn fetch(&self, input: &str) -> Result<MetricsPayload, FetchError> {
        self.fetch_entry(input).await.map(|entry| entry.payload)
    }

    /// Like [`fetch`](Self::fetch), but keeps the time the payload was
    /// actually fetched, which is older than now on a cache hit.
    pub async fn fetch_entry(
        &self,
        input: &str,
    ) -> Result<CachedLookup<MetricsPayload>, FetchError> {
        let key = Self::lookup_key(input)?;
        if let Some(entry) = self.cache.lookup(key.as_str()) {
            tracing::debug!(entity = %key, fetched_at = %entry.fetched_at, "stats cache hit");
            return Ok(entry);
        }

        let wire: UserWire = self
            .get(&format!("user/{key}"), METRICS_SELECTIONS, key.as_str())
            .await?;
        let entry = self.cache.insert(key.as_str(), MetricsPayload::from(wire));
        tracing::debug!(entity = %key, player_id = entry.payload.player_id, "stats fetched");
        Ok(entry)
    }

    /// Current status (okay, hospital, traveling, ...) of a player.
    pub async fn fetch_status(&self, input: &str) -> Result<PlayerStatus, FetchError> {
        let key = Self::lookup_key(input)?;
        let wire: StatusWire = self
            .get(&format!("user/{key}"), STATUS_SELECTIONS, key.as_str())
            .await?;
        Ok(wire.status)
    }

    /// Faction roster, sorted by player id.
    pub async fn fetch_faction_members(
        &self,
        faction_id: u64,
    ) -> Result<Vec<FactionMember>, FetchError> {
        let entity = format!("faction {faction_id}");
        let wire: FactionWire = self
            .get(&format!("faction/{faction_id}"), FACTION_SELECTIONS, &entity)
            .await?;
        Ok(wire.into_members())
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        selections: &str,
        entity: &str,
    ) -> Result<T, FetchError> {
        let result = self.get_inner(path, selections, entity).await;
        if let Err(ref e) = result {
            tracing::warn!(entity, retryable = e.is_retryable(), "Torn API lookup failed: {e}");
        }
        result
    }

    async fn get_inner<T: DeserializeOwned>(
        &self,
        path: &str,
        selections: &str,
        entity: &str,
    ) -> Result<T, FetchError> {
        let api_key = self.api_key.as_deref().ok_or(FetchError::MissingApiKey)?;
        let url = format!("{}/{path}", self.base_url);

        let response = self
            .http
            .get(&url)
            .query(&[("selections", selections), ("key", api_key)])
            .send()
            .await
            .map_err(|e| FetchError::Transient {
                entity: entity.to_string(),
                reason: if e.is_timeout() {
                    "request timed out".to_string()
                } else {
                    e.to_string()
                },
            })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound {
                entity: entity.to_string(),
            });
        }
        if !status.is_success() {
            return Err(FetchError::Transient {
                entity: entity.to_string(),
                reason: format!("HTTP {status}"),
            });
        }

        let body: serde_json::Value = response.json().await.map_err(|e| FetchError::Decode {
            entity: entity.to_string(),
            reason: e.to_string(),
        })?;

        if let Some(error) = body.get("error") {
            return Err(classify_api_error(entity, error));
        }

        serde_json::from_value(body).map_err(|e| FetchError::Decode {
            entity: entity.to_string(),
            reason: e.to_string(),
        })
    }
}

/// Map an embedded `{"error": {...}}` object onto the error taxonomy.
fn classify_api_error(entity: &str, error: &serde_json::Value) -> FetchError {
    let Ok(api) = serde_json::from_value::<ApiErrorWire>(error.clone()) else {
        return FetchError::Decode {
            entity: entity.to_string(),
            reason: format!("malformed error object: {error}"),
        };
    };
    if NOT_FOUND_CODES.contains(&api.code) {
        FetchError::NotFound {
            entity: entity.to_string(),
        }
    } else if TRANSIENT_CODES.contains(&api.code) {
        FetchError::Transient {
            entity: entity.to_string(),
            reason: format!("API error {}: {}", api.code, api.error),
        }
    } else {
        FetchError::Rejected {
            entity: entity.to_string(),
            code: api.code,
            message: api.error,
        }
    }
}
