use lumina_core::backend::{Backend, EventTopic};
use lumina_core::config::{Config, ConfigStore};
use lumina_core::contract::{HostEvent, HostRequest};
use lumina_core::model::ActionType;
use lumina_core::navigation::KeyInput;
use lumina_core::session::{RequestToken, StreamId};
use lumina_core::transport::{decode_event, encode_request, ErrorCode, JsonLineBackend};
use serde_json::{json, Value};

fn written_lines(backend: &JsonLineBackend<Vec<u8>>) -> Vec<Value> {
    String::from_utf8(backend.writer().clone())
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[test]
fn decodes_key_down_with_modifiers() {
    let event = decode_event(r#"{"event":"key_down","key":",","ctrl":true}"#).unwrap();
    assert_eq!(event, HostEvent::KeyDown(KeyInput::new(",").with_ctrl()));
}

#[test]
fn decodes_search_reply() {
    let event = decode_event(
        r#"{"event":"search_reply","token":4,"results":[
            {"id":"calc","title":"= 4","description":"2+2","action_type":"copy_to_clipboard","action_data":"4","score":1.0}
        ]}"#,
    )
    .unwrap();

    let HostEvent::SearchReply { token, results } = event else {
        panic!("expected search reply, got {event:?}");
    };
    assert_eq!(token, RequestToken::from(4));
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].action_type, ActionType::CopyToClipboard);
    assert_eq!(results[0].icon, None);
}

#[test]
fn chunk_stream_tag_is_optional() {
    assert_eq!(
        decode_event(r#"{"event":"ai_response_chunk","text":"Hel"}"#).unwrap(),
        HostEvent::AiResponseChunk {
            stream: None,
            text: "Hel".into()
        }
    );
    assert_eq!(
        decode_event(r#"{"event":"ai_response_chunk","stream":2,"text":"lo"}"#).unwrap(),
        HostEvent::AiResponseChunk {
            stream: Some(StreamId::from(2)),
            text: "lo".into()
        }
    );
}

#[test]
fn missing_field_is_invalid_event() {
    let error = decode_event(r#"{"event":"query_changed"}"#).unwrap_err();
    assert_eq!(error.code, ErrorCode::InvalidEvent);
}

#[test]
fn garbage_is_invalid_json() {
    let error = decode_event("not json").unwrap_err();
    assert_eq!(error.code, ErrorCode::InvalidJson);
}

#[test]
fn encodes_requests_with_request_tag() {
    let encoded = encode_request(&HostRequest::Search {
        token: RequestToken::from(7),
        query: "notes".into(),
    })
    .unwrap();
    let value: Value = serde_json::from_str(&encoded).unwrap();

    assert_eq!(value, json!({"request": "search", "token": 7, "query": "notes"}));
}

#[test]
fn backend_writes_one_line_per_call() {
    let dir = tempfile::tempdir().unwrap();
    let mut backend = JsonLineBackend::new(Vec::new(), ConfigStore::new(dir.path().join("config.json")));

    let id = backend.subscribe(EventTopic::AiResponseChunk).unwrap();
    backend.ai_request(StreamId::from(1), "explain borrowck").unwrap();
    backend.set_window_visible(false).unwrap();
    backend.resize_window(true).unwrap();
    assert!(backend.is_subscribed(EventTopic::AiResponseChunk));
    backend.unsubscribe(id).unwrap();
    assert!(!backend.is_subscribed(EventTopic::AiResponseChunk));

    assert_eq!(
        written_lines(&backend),
        [
            json!({"request": "subscribe", "topic": "ai_response_chunk"}),
            json!({"request": "ai_request", "stream": 1, "prompt": "explain borrowck"}),
            json!({"request": "hide_window"}),
            json!({"request": "resize_window", "compact": true}),
            json!({"request": "unsubscribe", "topic": "ai_response_chunk"}),
        ]
    );
}

#[test]
fn unknown_subscription_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut backend = JsonLineBackend::new(Vec::new(), ConfigStore::new(dir.path().join("config.json")));

    assert!(backend
        .unsubscribe(lumina_core::backend::SubscriptionId(99))
        .is_err());
    assert!(written_lines(&backend).is_empty());
}

#[test]
fn backend_config_goes_through_store() {
    let dir = tempfile::tempdir().unwrap();
    let mut backend = JsonLineBackend::new(Vec::new(), ConfigStore::new(dir.path().join("config.json")));
    let config = Config {
        openrouter_api_key: Some("sk-or-1".into()),
        ..Config::default()
    };

    backend.save_config(&config).unwrap();

    assert_eq!(backend.get_config().unwrap(), config);
    assert!(backend.store().path().exists());
    assert!(written_lines(&backend).is_empty());
}
