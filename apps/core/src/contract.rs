use serde::{Deserialize, Serialize};

use crate::backend::EventTopic;
use crate::config::Config;
use crate::model::SearchResult;
use crate::navigation::KeyInput;
use crate::session::{RequestToken, StateKind, StreamId};
use crate::transport::ErrorCode;

/// Everything the controller reacts to: input from the surface, replies to
/// earlier requests and pushed stream events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum HostEvent {
    QueryChanged {
        query: String,
    },
    KeyDown(KeyInput),
    SearchReply {
        token: RequestToken,
        results: Vec<SearchResult>,
    },
    SearchFailed {
        token: RequestToken,
        message: String,
    },
    AiResponseChunk {
        #[serde(default)]
        stream: Option<StreamId>,
        text: String,
    },
    AiResponseComplete {
        #[serde(default)]
        stream: Option<StreamId>,
    },
    AiResponseError {
        #[serde(default)]
        stream: Option<StreamId>,
        message: String,
    },
    ToggleWindowEvent,
    WindowVisibility {
        visible: bool,
    },
    NewQuery,
    ActivateResult {
        index: usize,
    },
    OpenSettings,
    CloseSettings,
    EditSettings {
        config: Config,
    },
    SaveSettings,
    Shutdown,
}

/// Calls and notifications sent to the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "request", rename_all = "snake_case")]
pub enum HostRequest {
    Search { token: RequestToken, query: String },
    AiRequest { stream: StreamId, prompt: String },
    ShowWindow,
    HideWindow,
    ResizeWindow { compact: bool },
    SetFocusHidingDisabled { disabled: bool },
    Subscribe { topic: EventTopic },
    Unsubscribe { topic: EventTopic },
    Render(SessionView),
    Error { code: ErrorCode, message: String },
}

/// What the host renders. The transcript is already cleaned for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionView {
    pub query: String,
    pub state: StateKind,
    pub results: Vec<SearchResult>,
    pub selected_index: Option<usize>,
    pub transcript: String,
    pub stream_complete: bool,
    pub error: Option<String>,
    pub settings_open: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings_draft: Option<Config>,
}
