//! Integration tests for the capture-to-study flow.

use chrono::{Duration, Utc};
use picoco::analysis::{LearningContent, extract};
use picoco::api::{ApiRequest, Method, handle};
use picoco::bookmarks::{
    BookmarkSet, Category, FlipState, dialogue_key, parse_vocabulary_key, vocabulary_key,
};
use picoco::config::RelayConfig;
use picoco::kv::{CURRENT_IMAGE_KEY, KeyValueStore, MemoryKv, UPLOADED_IMAGE_KEY};
use picoco::relay::{ManualClock, MemoryRelay};
use picoco::resolver::{HostOutcome, ImageSource, Resolution, Resolver};
use picoco::session_client::InProcessSessionApi;
use serde_json::{Value, json};
use std::sync::Arc;

const CACHE_THRESHOLD: usize = 5 * 1024 * 1024;

fn relay_with_clock() -> (MemoryRelay, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let relay = MemoryRelay::with_clock(&RelayConfig::default(), clock.clone());
    (relay, clock)
}

fn post(relay: &MemoryRelay, body: &Value) -> String {
    let request = ApiRequest::new(Method::Post, "/api/image", Some(body.to_string())).unwrap();
    let response = handle(&request, relay);
    assert_eq!(response.status, 200, "unexpected body: {:?}", response.body);
    let body = response.body.unwrap();
    body["sessionId"].as_str().unwrap().to_string()
}

fn get(relay: &MemoryRelay, session_id: &str) -> (u16, Value) {
    let target = format!("/api/image?sessionId={session_id}");
    let request = ApiRequest::new(Method::Get, &target, None).unwrap();
    let response = handle(&request, relay);
    (response.status, response.body.unwrap_or(Value::Null))
}

fn raw_base64() -> String {
    // JPEG magic prefix, long enough to count as raw base64.
    format!("/9j/{}", "A".repeat(200))
}

#[test]
fn capture_relay_resolve_study() {
    let (relay, _clock) = relay_with_clock();

    // Capture page posts the photo and navigates with the session id.
    let data_url = "data:image/jpeg;base64,QUJDRA==";
    let session_id = post(&relay, &json!({ "imageData": data_url }));

    // Learning page resolves it.
    let sessions = InProcessSessionApi::new(&relay);
    let volatile = MemoryKv::new();
    let durable = MemoryKv::new();
    let mut resolver = Resolver::new(&sessions, &volatile, &durable, CACHE_THRESHOLD);

    let Resolution::Resolved(resolved) = resolver.resolve(Some(&session_id)) else {
        panic!("expected the session image to resolve");
    };
    assert_eq!(resolved.source, ImageSource::Session);
    assert_eq!(resolved.image.image_data(), Some(data_url));
    assert_eq!(volatile.get(CURRENT_IMAGE_KEY).unwrap().as_deref(), Some(data_url));

    // The analysis reply becomes cards.
    let reply = json!({
        "success": true,
        "data": {
            "words": [{ "word": "lamp", "meaning": "램프" }, { "word": "desk" }],
            "examples": ["Turn on the lamp, please."],
            "dialogue": [
                { "speaker": "A", "text": "Is this your desk?" },
                { "speaker": "B", "text": "Yes, it is." }
            ]
        }
    });
    let content = extract(&reply);
    assert_eq!(content.vocabulary.len(), 2);
    assert_eq!(content.vocabulary[1].meaning, "Meaning 2");
    assert_eq!(content.phrases[0].phrase, "Turn on the lamp, please.");
    assert_eq!(content.dialogue.len(), 2);

    // Study: flip and star a few cards.
    let mut flips = FlipState::new();
    let lamp_key = vocabulary_key(&content.vocabulary[0]);
    assert!(flips.toggle_word(&lamp_key));

    let mut words = BookmarkSet::load(&durable, Category::Vocabulary);
    assert!(words.toggle(&lamp_key).unwrap());
    let mut lines = BookmarkSet::load(&durable, Category::Dialogue);
    assert!(lines.toggle(&dialogue_key(&content.dialogue[1])).unwrap());

    let reloaded = BookmarkSet::load(&durable, Category::Vocabulary);
    assert_eq!(reloaded.keys().len(), 1);
    assert_eq!(parse_vocabulary_key(&reloaded.keys()[0]), content.vocabulary[0]);
}

#[test]
fn session_expires_after_ttl_without_renewal() {
    let (relay, clock) = relay_with_clock();
    let session_id = post(&relay, &json!({ "imageData": "data:image/png;base64,QUJD" }));

    clock.advance(Duration::seconds(200));
    assert_eq!(get(&relay, &session_id).0, 200);

    // The read above must not have extended the lifetime.
    clock.advance(Duration::seconds(101));
    let (status, body) = get(&relay, &session_id);
    assert_eq!(status, 404);
    assert_eq!(body["error"], "Image not found or expired");
}

#[test]
fn raw_base64_returned_as_data_url() {
    let (relay, _clock) = relay_with_clock();
    let raw = raw_base64();
    let session_id = post(&relay, &json!({ "imageData": raw }));

    let (status, body) = get(&relay, &session_id);
    assert_eq!(status, 200);
    assert_eq!(
        body["imageData"].as_str(),
        Some(format!("data:image/jpeg;base64,{raw}").as_str())
    );
    assert!(body.get("imageUrl").is_none_or(Value::is_null));
}

#[test]
fn url_payload_returned_as_url() {
    let (relay, _clock) = relay_with_clock();
    let session_id = post(&relay, &json!({ "imageUrl": "https://cdn.example.com/desk.jpg" }));

    let (_, body) = get(&relay, &session_id);
    assert_eq!(body["imageUrl"], "https://cdn.example.com/desk.jpg");
    assert_eq!(body["success"], true);
}

#[test]
fn expired_session_falls_back_to_durable_cache() {
    let (relay, clock) = relay_with_clock();
    let session_id = post(&relay, &json!({ "imageData": "data:image/png;base64,QUJD" }));
    clock.advance(Duration::seconds(301));

    let sessions = InProcessSessionApi::new(&relay);
    let volatile = MemoryKv::new();
    let durable = MemoryKv::new();
    durable
        .set(UPLOADED_IMAGE_KEY, "https://cdn.example.com/earlier.jpg")
        .unwrap();

    let mut resolver = Resolver::new(&sessions, &volatile, &durable, CACHE_THRESHOLD);
    let Resolution::Resolved(resolved) = resolver.resolve(Some(&session_id)) else {
        panic!("expected the durable fallback");
    };
    assert_eq!(resolved.source, ImageSource::DurableCache);
    assert_eq!(resolved.image.image_url(), Some("https://cdn.example.com/earlier.jpg"));
}

#[test]
fn host_message_fills_empty_page_once() {
    let (relay, _clock) = relay_with_clock();
    let sessions = InProcessSessionApi::new(&relay);
    let volatile = MemoryKv::new();
    let durable = MemoryKv::new();
    let mut resolver = Resolver::new(&sessions, &volatile, &durable, CACHE_THRESHOLD);

    assert!(matches!(resolver.resolve(None), Resolution::AwaitingHost));

    let HostOutcome::Loaded(first) = resolver.on_host_message(&json!({ "base64": raw_base64() }))
    else {
        panic!("expected the host image to load");
    };
    assert_eq!(first.source, ImageSource::HostMessage);

    // A remote URL is relayed through the session API.
    let mut fresh = Resolver::new(&sessions, &volatile, &durable, CACHE_THRESHOLD);
    let HostOutcome::Loaded(relayed) =
        fresh.on_host_message(&json!("https://cdn.example.com/from-host.jpg"))
    else {
        panic!("expected the relayed image to load");
    };
    assert_eq!(relayed.source, ImageSource::Session);
    assert!(relayed.session_id.is_some());

    // Later messages are ignored.
    assert!(matches!(
        resolver.on_host_message(&json!("data:image/png;base64,QUJD")),
        HostOutcome::Ignored
    ));
    assert_eq!(resolver.current().map(|r| r.image.clone()), Some(first.image));
}

#[test]
fn malformed_api_traffic() {
    let (relay, _clock) = relay_with_clock();

    let bad_json = ApiRequest::new(Method::Post, "/api/image", Some("{".to_string())).unwrap();
    assert_eq!(handle(&bad_json, &relay).status, 500);

    let empty = ApiRequest::new(Method::Post, "/api/image", Some("{}".to_string())).unwrap();
    let response = handle(&empty, &relay);
    assert_eq!(response.status, 400);
    assert_eq!(response.header("Access-Control-Allow-Origin"), Some("*"));

    let no_id = ApiRequest::new(Method::Get, "/api/image", None).unwrap();
    assert_eq!(handle(&no_id, &relay).status, 400);

    let delete = ApiRequest::new(Method::Other, "/api/image", None).unwrap();
    assert_eq!(handle(&delete, &relay).status, 405);

    let preflight = ApiRequest::new(Method::Options, "/api/image", None).unwrap();
    let response = handle(&preflight, &relay);
    assert_eq!(response.status, 200);
    assert!(response.body.is_none());
}

#[test]
fn unrecognized_analysis_reply_is_empty() {
    assert_eq!(extract(&json!({ "status": "ok" })), LearningContent::default());
}
