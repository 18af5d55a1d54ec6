use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use serde_json::json;
use statwatch_core::Clock;
use statwatch_core::KeyMode;
use statwatch_core::MockClock;
use statwatch_core::SnapshotStore;
use statwatch_core::TornClient;
use statwatch_core::Tracker;
use tempfile::TempDir;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::ResponseTemplate;
use wiremock::matchers::method;
use wiremock::matchers::path;
use wiremock::matchers::query_param;

pub const API_KEY: &str = "test-key";
pub const START: i64 = 1_700_000_000;
pub const FRESHNESS: Duration = Duration::from_secs(60);

/// User lookup body in the Torn v1 shape: basic and battle stats flat,
/// personal stats and net worth nested.
pub fn user_body(player_id: u64, name: &str, strength: f64, net_worth: f64) -> Value {
    json!({
        "player_id": player_id,
        "name": name,
        "level": 42,
        "strength": strength,
        "defense": 1_000.0,
        "speed": 1_000.0,
        "dexterity": 1_000.0,
        "personalstats": {
            "moneyearned": 5_000_000,
            "refills": 120,
            "drugsused": 30,
            "revives": 7,
        },
        "networth": { "total": net_worth },
    })
}

pub fn error_body(code: i64, message: &str) -> Value {
    json!({ "error": { "code": code, "error": message } })
}

/// Mock for a metrics lookup of `lookup` (already normalized).
pub fn user_lookup(lookup: &str) -> wiremock::MockBuilder {
    Mock::given(method("GET"))
        .and(path(format!("/user/{lookup}")))
        .and(query_param("selections", "basic,battlestats,personalstats,networth"))
        .and(query_param("key", API_KEY))
}

pub fn ok_json(body: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(body)
}

pub fn client(server: &MockServer, clock: &MockClock) -> TornClient {
    client_with_key(server, clock, Some(API_KEY.to_string()))
}

pub fn client_with_key(server: &MockServer, clock: &MockClock, key: Option<String>) -> TornClient {
    let clock: Arc<dyn Clock> = Arc::new(clock.clone());
    TornClient::new(&server.uri(), key, Duration::from_secs(5), FRESHNESS, clock)
        .expect("build client")
}

pub struct Harness {
    pub server: MockServer,
    pub clock: MockClock,
    pub tracker: Tracker,
    _data_dir: TempDir,
}

impl Harness {
    pub async fn new(key_mode: KeyMode) -> Self {
        let server = MockServer::start().await;
        let clock = MockClock::at_unix(START);
        let data_dir = TempDir::new().expect("tempdir");
        let store = SnapshotStore::open(data_dir.path().to_path_buf()).expect("open store");
        let tracker = Tracker::new(client(&server, &clock), store, key_mode);
        Self {
            server,
            clock,
            tracker,
            _data_dir: data_dir,
        }
    }
}
