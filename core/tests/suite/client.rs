use chrono::Duration;
use pretty_assertions::assert_eq;
use statwatch_core::FetchError;
use statwatch_core::MockClock;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::ResponseTemplate;
use wiremock::matchers::method;
use wiremock::matchers::path;
use wiremock::matchers::query_param;

use crate::common::START;
use crate::common::client;
use crate::common::client_with_key;
use crate::common::error_body;
use crate::common::ok_json;
use crate::common::user_body;
use crate::common::user_lookup;

#[tokio::test]
async fn decodes_nested_selections() {
    let server = MockServer::start().await;
    let clock = MockClock::at_unix(START);
    user_lookup("duke")
        .respond_with(ok_json(user_body(4, "Duke", 2_500.9, 123_456_789.7)))
        .expect(1)
        .mount(&server)
        .await;

    let payload = client(&server, &clock).fetch("Duke").await.unwrap();

    assert_eq!(payload.player_id, 4);
    assert_eq!(payload.name, "Duke");
    assert_eq!(payload.total_stats(), 5_500);
    assert_eq!(payload.money_earned, 5_000_000);
    assert_eq!(payload.refills, 120);
    assert_eq!(payload.drugs_used, 30);
    assert_eq!(payload.revives, 7);
    assert_eq!(payload.net_worth, 123_456_789);
}

#[tokio::test]
async fn repeated_lookup_within_window_is_served_from_cache() {
    let server = MockServer::start().await;
    let clock = MockClock::at_unix(START);
    user_lookup("duke")
        .respond_with(ok_json(user_body(4, "Duke", 1.0, 1.0)))
        .expect(1)
        .mount(&server)
        .await;
    let client = client(&server, &clock);

    let first = client.fetch("duke").await.unwrap();
    clock.advance(Duration::seconds(59));
    let second = client.fetch(" DUKE ").await.unwrap();

    assert_eq!(first, second);
    assert_eq!(client.cache().len(), 1);
}

#[tokio::test]
async fn lookup_after_window_goes_back_to_network() {
    let server = MockServer::start().await;
    let clock = MockClock::at_unix(START);
    user_lookup("duke")
        .respond_with(ok_json(user_body(4, "Duke", 1.0, 1.0)))
        .expect(2)
        .mount(&server)
        .await;
    let client = client(&server, &clock);

    client.fetch("duke").await.unwrap();
    clock.advance(Duration::seconds(60));
    client.fetch("duke").await.unwrap();
}

#[tokio::test]
async fn failed_fetch_leaves_cache_untouched() {
    let server = MockServer::start().await;
    let clock = MockClock::at_unix(START);
    user_lookup("duke")
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    let client = client(&server, &clock);

    let err = client.fetch("duke").await.unwrap_err();

    assert!(err.is_retryable(), "got {err:?}");
    assert!(client.cache().is_empty());
}

#[tokio::test]
async fn failed_refresh_keeps_previous_entry_unserved() {
    let server = MockServer::start().await;
    let clock = MockClock::at_unix(START);
    user_lookup("duke")
        .respond_with(ok_json(user_body(4, "Duke", 1.0, 1.0)))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    user_lookup("duke")
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let client = client(&server, &clock);

    client.fetch("duke").await.unwrap();
    clock.advance(Duration::minutes(5));

    assert!(client.fetch("duke").await.is_err());
    // The expired entry is still there but never served.
    assert_eq!(client.cache().len(), 1);
    assert!(client.cache().get("duke").is_none());
}

#[tokio::test]
async fn http_404_is_not_found() {
    let server = MockServer::start().await;
    let clock = MockClock::at_unix(START);
    user_lookup("ghost")
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = client(&server, &clock).fetch("ghost").await.unwrap_err();
    assert!(err.is_not_found(), "got {err:?}");
}

#[tokio::test]
async fn embedded_errors_are_classified() {
    let server = MockServer::start().await;
    let clock = MockClock::at_unix(START);
    user_lookup("ghost")
        .respond_with(ok_json(error_body(6, "Incorrect ID")))
        .mount(&server)
        .await;
    user_lookup("busy")
        .respond_with(ok_json(error_body(5, "Too many requests")))
        .mount(&server)
        .await;
    user_lookup("locked")
        .respond_with(ok_json(error_body(2, "Incorrect key")))
        .mount(&server)
        .await;
    let client = client(&server, &clock);

    assert!(client.fetch("ghost").await.unwrap_err().is_not_found());
    assert!(client.fetch("busy").await.unwrap_err().is_retryable());
    assert!(matches!(
        client.fetch("locked").await.unwrap_err(),
        FetchError::Rejected { code: 2, .. }
    ));
    assert!(client.cache().is_empty());
}

#[tokio::test]
async fn malformed_body_is_a_decode_error() {
    let server = MockServer::start().await;
    let clock = MockClock::at_unix(START);
    user_lookup("duke")
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let err = client(&server, &clock).fetch("duke").await.unwrap_err();
    assert!(matches!(err, FetchError::Decode { .. }), "got {err:?}");
}

#[tokio::test]
async fn invalid_input_never_reaches_the_network() {
    let server = MockServer::start().await;
    let clock = MockClock::at_unix(START);
    let client = client(&server, &clock);

    for input in ["", "   ", "../etc", "duke?key=x"] {
        let err = client.fetch(input).await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidKey { .. }), "{input:?}: {err:?}");
    }
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn missing_api_key_fails_without_request() {
    let server = MockServer::start().await;
    let clock = MockClock::at_unix(START);
    let client = client_with_key(&server, &clock, None);

    let err = client.fetch("duke").await.unwrap_err();
    assert!(matches!(err, FetchError::MissingApiKey));
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn fetches_player_status() {
    let server = MockServer::start().await;
    let clock = MockClock::at_unix(START);
    Mock::given(method("GET"))
        .and(path("/user/duke"))
        .and(query_param("selections", "profile"))
        .respond_with(ok_json(serde_json::json!({
            "player_id": 4,
            "name": "Duke",
            "status": {
                "description": "In hospital for 12 mins",
                "details": "Hospitalized by someone",
                "state": "Hospital",
                "until": 1_700_000_720,
            },
        })))
        .expect(1)
        .mount(&server)
        .await;

    let status = client(&server, &clock).fetch_status("Duke").await.unwrap();
    assert_eq!(status.state, "Hospital");
    assert_eq!(status.until, 1_700_000_720);
}

#[tokio::test]
async fn fetches_faction_roster_sorted_by_id() {
    let server = MockServer::start().await;
    let clock = MockClock::at_unix(START);
    Mock::given(method("GET"))
        .and(path("/faction/9001"))
        .and(query_param("selections", "basic"))
        .respond_with(ok_json(serde_json::json!({
            "ID": 9001,
            "name": "Night Owls",
            "members": {
                "300": { "name": "Carol", "level": 12, "days_in_faction": 3 },
                "20": { "name": "Bob", "level": 50, "days_in_faction": 400 },
            },
        })))
        .mount(&server)
        .await;

    let members = client(&server, &clock)
        .fetch_faction_members(9001)
        .await
        .unwrap();

    let ids: Vec<u64> = members.iter().map(|m| m.player_id).collect();
    assert_eq!(ids, vec![20, 300]);
    assert_eq!(members[0].name, "Bob");
}
