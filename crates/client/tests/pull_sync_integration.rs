//! Integration tests for the pull phase of the sync engine.
//!
//! **Coverage:**
//! - Mixed first page: normal event, occurrence to skip, removal notice,
//!   degenerate record, each routed to the right callback, delta token
//!   persisted
//! - Incremental resume from a stored delta token
//! - Mid-feed failure: partial progress delivered, error propagated, stored
//!   token untouched
//! - Expired token (410 Gone) resets the stored token
//!
//! **Infrastructure:** WireMock standing in for the Graph feed endpoint.

#![allow(dead_code)]

#[path = "support.rs"]
mod support;

use std::sync::Arc;

use graphcal_client::{StaticTokenProvider, SyncEngine};
use graphcal_domain::GraphCalError;
use serde_json::json;
use support::{test_config, RecordingHandler};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn engine(server: &MockServer, handler: Arc<RecordingHandler>) -> SyncEngine {
    let mut config = test_config(&server.uri());
    config.skip_occurrences = true;
    SyncEngine::builder(config, Arc::new(StaticTokenProvider::new("test-token")))
        .handler(handler)
        .build()
        .unwrap()
}

#[tokio::test]
async fn mixed_page_routes_records_and_persists_delta_token() {
    let server = MockServer::start().await;
    let delta_link = format!("{}/me/calendarView/delta?$deltatoken=tok-next", server.uri());
    Mock::given(method("GET"))
        .and(path("/me/calendarView/delta"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [
                { "id": "ev-1", "type": "singleInstance", "subject": "planning" },
                { "id": "ev-2", "type": "occurrence", "seriesMasterId": "master-1" },
                { "id": "ev-3", "@removed": { "reason": "deleted" } },
                { "id": "ev-4", "start": "garbled" }
            ],
            "@odata.deltaLink": delta_link
        })))
        .expect(1)
        .mount(&server)
        .await;

    let handler = Arc::new(RecordingHandler::new());
    let report = engine(&server, handler.clone()).sync().await.unwrap();

    assert_eq!(report.events_saved, 2);
    assert_eq!(report.events_deleted, 1);
    assert_eq!(report.occurrences_skipped, 1);
    assert!(report.delta_token_persisted);

    assert_eq!(handler.saved_ids(), vec!["ev-1", "ev-4"]);
    assert_eq!(*handler.deleted.lock().unwrap(), vec!["ev-3"]);
    assert_eq!(
        *handler.persisted_tokens.lock().unwrap(),
        vec![format!("{}/me/calendarView/delta?$deltatoken=tok-next", server.uri())]
    );
}

#[tokio::test]
async fn stored_delta_token_resumes_incremental_sync() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/me/calendarView/delta"))
        .and(query_param("$deltatoken", "tok-old"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [ { "id": "ev-9", "subject": "changed" } ],
            "@odata.deltaLink": "delta?$deltatoken=tok-new"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let token = format!("{}/me/calendarView/delta?$deltatoken=tok-old", server.uri());
    let handler = Arc::new(RecordingHandler::with_stored_token(&token));
    let report = engine(&server, handler.clone()).sync().await.unwrap();

    assert_eq!(report.events_saved, 1);
    assert_eq!(
        *handler.persisted_tokens.lock().unwrap(),
        vec!["delta?$deltatoken=tok-new".to_string()]
    );
}

#[tokio::test]
async fn window_params_are_sent_when_no_token_is_stored() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/me/calendarView/delta"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [],
            "@odata.deltaLink": "delta?$deltatoken=tok"
        })))
        .mount(&server)
        .await;

    let handler = Arc::new(RecordingHandler::new());
    engine(&server, handler).sync().await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let query = requests[0].url.query().unwrap_or_default();
    assert!(query.contains("startDateTime"));
    assert!(query.contains("endDateTime"));
}

#[tokio::test]
async fn mid_feed_failure_delivers_partial_progress_then_propagates() {
    let server = MockServer::start().await;
    let next = format!("{}/page2", server.uri());
    Mock::given(method("GET"))
        .and(path("/me/calendarView/delta"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [ { "id": "ev-1", "subject": "kept" } ],
            "@odata.nextLink": next
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/page2"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "error": { "code": "internalServerError", "message": "boom" }
        })))
        .mount(&server)
        .await;

    let handler = Arc::new(RecordingHandler::new());
    let result = engine(&server, handler.clone()).sync().await;

    match result {
        Err(GraphCalError::Read(message)) => assert!(message.contains("boom")),
        other => panic!("expected read error, got {other:?}"),
    }
    // The item read before the failure already reached its callback.
    assert_eq!(handler.saved_ids(), vec!["ev-1"]);
    // An incomplete pass must not advance the stored token.
    assert!(handler.persisted_tokens.lock().unwrap().is_empty());
}

#[tokio::test]
async fn expired_delta_token_resets_stored_token_and_fails() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/me/calendarView/delta"))
        .respond_with(ResponseTemplate::new(410).set_body_json(json!({
            "error": { "code": "syncStateNotFound", "message": "resync required" }
        })))
        .mount(&server)
        .await;

    let handler = Arc::new(RecordingHandler::with_stored_token("tok-stale"));
    let result = engine(&server, handler.clone()).sync().await;

    assert!(matches!(result, Err(GraphCalError::Read(_))));
    assert_eq!(*handler.resets.lock().unwrap(), 1);
    assert!(handler.stored_token.lock().unwrap().is_none());
}
