use lumina_core::action_executor::{ExecutedAction, MockActionExecutor};
use lumina_core::config::{ConfigStore, ControllerOptions};
use lumina_core::controller::SessionController;
use lumina_core::runtime::serve;
use lumina_core::transport::JsonLineBackend;
use serde_json::{json, Value};

fn immediate_options() -> ControllerOptions {
    ControllerOptions {
        debounce_ms: 0,
        min_loading_ms: 0,
        ..ControllerOptions::default()
    }
}

fn run_lines(lines: &[&str]) -> SessionController<JsonLineBackend<Vec<u8>>, MockActionExecutor> {
    let dir = tempfile::tempdir().unwrap();
    let backend = JsonLineBackend::new(Vec::new(), ConfigStore::new(dir.path().join("config.json")));
    let mut controller =
        SessionController::new(immediate_options(), backend, MockActionExecutor::default()).unwrap();

    let (tx, rx) = crossbeam_channel::unbounded();
    for line in lines {
        tx.send(line.to_string()).unwrap();
    }
    drop(tx);

    serve(&mut controller, &rx).unwrap();
    controller
}

fn requests(
    controller: &SessionController<JsonLineBackend<Vec<u8>>, MockActionExecutor>,
) -> Vec<Value> {
    String::from_utf8(controller.backend().writer().clone())
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[test]
fn search_then_commit_round_trip() {
    let controller = run_lines(&[
        r#"{"event":"query_changed","query":"notes"}"#,
        r#"{"event":"search_reply","token":1,"results":[
            {"id":"n","title":"notes.txt","description":"","action_type":"open_file","action_data":"/tmp/notes.txt","score":0.9}
        ]}"#,
        r#"{"event":"key_down","key":"Enter"}"#,
        r#"{"event":"shutdown"}"#,
    ]);
    let out = requests(&controller);

    assert!(out.contains(&json!({"request": "search", "token": 1, "query": "notes"})));
    assert!(out
        .iter()
        .any(|request| request["request"] == "render" && request["state"] == "results"));
    assert_eq!(
        controller.executor().executed(),
        [ExecutedAction::Open("/tmp/notes.txt".into())]
    );

    let last = out.last().unwrap();
    assert_eq!(last["request"], "unsubscribe");
    assert!(!controller.is_running());
}

#[test]
fn subscribes_before_first_render() {
    let controller = run_lines(&[]);
    let out = requests(&controller);

    let kinds: Vec<&str> = out
        .iter()
        .map(|request| request["request"].as_str().unwrap())
        .collect();
    assert_eq!(
        kinds,
        [
            "subscribe",
            "subscribe",
            "subscribe",
            "resize_window",
            "render",
            "unsubscribe",
            "unsubscribe",
            "unsubscribe",
        ]
    );
    assert_eq!(out[4]["state"], "idle");
}

#[test]
fn invalid_lines_are_reported_and_skipped() {
    let controller = run_lines(&[
        "{ not json",
        r#"{"event":"warp_drive"}"#,
        "",
        r#"{"event":"query_changed","query":"a"}"#,
    ]);
    let out = requests(&controller);

    let errors: Vec<&Value> = out
        .iter()
        .filter(|request| request["request"] == "error")
        .collect();
    assert_eq!(errors.len(), 2);
    assert_eq!(errors[0]["code"], "invalid_json");
    assert_eq!(errors[1]["code"], "invalid_event");
    assert!(out.contains(&json!({"request": "search", "token": 1, "query": "a"})));
}

#[test]
fn unchanged_view_is_not_rendered_twice() {
    let controller = run_lines(&[
        r#"{"event":"key_down","key":"ArrowDown"}"#,
        r#"{"event":"key_down","key":"ArrowUp"}"#,
    ]);
    let renders = requests(&controller)
        .iter()
        .filter(|request| request["request"] == "render")
        .count();

    assert_eq!(renders, 1);
}
