use serde::{Deserialize, Serialize};

use crate::config::{Config, ConfigError};
use crate::session::{RequestToken, StreamId};

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("collaborator unavailable: {0}")]
    Unavailable(String),
    #[error("request rejected: {0}")]
    Rejected(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("encode error: {0}")]
    Encode(#[from] serde_json::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Push channels the controller listens to for the life of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventTopic {
    AiResponseChunk,
    AiResponseComplete,
    ToggleWindowEvent,
}

impl EventTopic {
    pub const ALL: [EventTopic; 3] = [
        EventTopic::AiResponseChunk,
        EventTopic::AiResponseComplete,
        EventTopic::ToggleWindowEvent,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubscriptionId(pub u64);

/// Calls the controller makes into the host side. Request-style calls only
/// initiate work: search replies and AI fragments come back as events.
pub trait Backend {
    fn search(&mut self, token: RequestToken, query: &str) -> Result<(), BackendError>;
    fn ai_request(&mut self, stream: StreamId, prompt: &str) -> Result<(), BackendError>;
    fn get_config(&mut self) -> Result<Config, BackendError>;
    fn save_config(&mut self, config: &Config) -> Result<(), BackendError>;
    fn subscribe(&mut self, topic: EventTopic) -> Result<SubscriptionId, BackendError>;
    fn unsubscribe(&mut self, id: SubscriptionId) -> Result<(), BackendError>;
    fn set_window_visible(&mut self, visible: bool) -> Result<(), BackendError>;
    fn resize_window(&mut self, compact: bool) -> Result<(), BackendError>;
    fn set_focus_hiding_disabled(&mut self, disabled: bool) -> Result<(), BackendError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    Search { token: RequestToken, query: String },
    AiRequest { stream: StreamId, prompt: String },
    GetConfig,
    SaveConfig(Config),
    Subscribe(EventTopic),
    Unsubscribe(EventTopic),
    SetWindowVisible(bool),
    ResizeWindow { compact: bool },
    SetFocusHidingDisabled(bool),
}

/// Recording backend for driving the controller in tests.
#[derive(Debug, Default)]
pub struct MockBackend {
    calls: Vec<BackendCall>,
    subscriptions: Vec<(SubscriptionId, EventTopic)>,
    next_subscription: u64,
    config: Option<Config>,
    fail_search: bool,
    fail_ai: bool,
    fail_save: bool,
}

impl MockBackend {
    pub fn with_config(config: Config) -> Self {
        Self {
            config: Some(config),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> &[BackendCall] {
        &self.calls
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    pub fn searches(&self) -> Vec<(RequestToken, String)> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                BackendCall::Search { token, query } => Some((*token, query.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn ai_requests(&self) -> Vec<(StreamId, String)> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                BackendCall::AiRequest { stream, prompt } => Some((*stream, prompt.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn active_topics(&self) -> Vec<EventTopic> {
        self.subscriptions.iter().map(|(_, topic)| *topic).collect()
    }

    pub fn stored_config(&self) -> Option<&Config> {
        self.config.as_ref()
    }

    pub fn fail_search(&mut self, fail: bool) {
        self.fail_search = fail;
    }

    pub fn fail_ai(&mut self, fail: bool) {
        self.fail_ai = fail;
    }

    pub fn fail_save(&mut self, fail: bool) {
        self.fail_save = fail;
    }
}

impl Backend for MockBackend {
    fn search(&mut self, token: RequestToken, query: &str) -> Result<(), BackendError> {
        self.calls.push(BackendCall::Search {
            token,
            query: query.to_string(),
        });
        if self.fail_search {
            return Err(BackendError::Unavailable("search offline".into()));
        }
        Ok(())
    }

    fn ai_request(&mut self, stream: StreamId, prompt: &str) -> Result<(), BackendError> {
        self.calls.push(BackendCall::AiRequest {
            stream,
            prompt: prompt.to_string(),
        });
        if self.fail_ai {
            return Err(BackendError::Rejected("API key not configured".into()));
        }
        Ok(())
    }

    fn get_config(&mut self) -> Result<Config, BackendError> {
        self.calls.push(BackendCall::GetConfig);
        self.config
            .clone()
            .ok_or_else(|| BackendError::Unavailable("no config stored".into()))
    }

    fn save_config(&mut self, config: &Config) -> Result<(), BackendError> {
        self.calls.push(BackendCall::SaveConfig(config.clone()));
        if self.fail_save {
            return Err(BackendError::Rejected("read-only config".into()));
        }
        self.config = Some(config.clone());
        Ok(())
    }

    fn subscribe(&mut self, topic: EventTopic) -> Result<SubscriptionId, BackendError> {
        self.calls.push(BackendCall::Subscribe(topic));
        self.next_subscription += 1;
        let id = SubscriptionId(self.next_subscription);
        self.subscriptions.push((id, topic));
        Ok(id)
    }

    fn unsubscribe(&mut self, id: SubscriptionId) -> Result<(), BackendError> {
        let Some(position) = self.subscriptions.iter().position(|(sub, _)| *sub == id) else {
            return Err(BackendError::Rejected(format!("unknown subscription {}", id.0)));
        };
        let (_, topic) = self.subscriptions.remove(position);
        self.calls.push(BackendCall::Unsubscribe(topic));
        Ok(())
    }

    fn set_window_visible(&mut self, visible: bool) -> Result<(), BackendError> {
        self.calls.push(BackendCall::SetWindowVisible(visible));
        Ok(())
    }

    fn resize_window(&mut self, compact: bool) -> Result<(), BackendError> {
        self.calls.push(BackendCall::ResizeWindow { compact });
        Ok(())
    }

    fn set_focus_hiding_disabled(&mut self, disabled: bool) -> Result<(), BackendError> {
        self.calls.push(BackendCall::SetFocusHidingDisabled(disabled));
        Ok(())
    }
}
