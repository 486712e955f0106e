use std::io::Write;

use serde::{Deserialize, Serialize};
use serde_json::error::Category;

use crate::backend::{Backend, BackendError, EventTopic, SubscriptionId};
use crate::config::{Config, ConfigStore};
use crate::contract::{HostEvent, HostRequest};
use crate::session::{RequestToken, StreamId};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    InvalidJson,
    InvalidEvent,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, thiserror::Error)]
#[error("{code:?}: {message}")]
pub struct ErrorResponse {
    pub code: ErrorCode,
    pub message: String,
}

impl From<ErrorResponse> for HostRequest {
    fn from(error: ErrorResponse) -> Self {
        HostRequest::Error {
            code: error.code,
            message: error.message,
        }
    }
}

/// Parses one inbound line. Malformed JSON and well-formed JSON that is not a
/// known event are reported with different codes.
pub fn decode_event(line: &str) -> Result<HostEvent, ErrorResponse> {
    serde_json::from_str::<HostEvent>(line).map_err(|error| {
        let code = match error.classify() {
            Category::Data => ErrorCode::InvalidEvent,
            _ => ErrorCode::InvalidJson,
        };
        ErrorResponse {
            code,
            message: error.to_string(),
        }
    })
}

pub fn encode_request(request: &HostRequest) -> Result<String, serde_json::Error> {
    serde_json::to_string(request)
}

/// [`Backend`] speaking newline-delimited JSON to the host. Outbound calls
/// are written as requests; config is kept in a local file.
pub struct JsonLineBackend<W: Write> {
    out: W,
    store: ConfigStore,
    subscriptions: Vec<(SubscriptionId, EventTopic)>,
    next_subscription: u64,
}

impl<W: Write> JsonLineBackend<W> {
    pub fn new(out: W, store: ConfigStore) -> Self {
        Self {
            out,
            store,
            subscriptions: Vec::new(),
            next_subscription: 0,
        }
    }

    pub fn emit(&mut self, request: &HostRequest) -> Result<(), BackendError> {
        let line = encode_request(request)?;
        self.out.write_all(line.as_bytes())?;
        self.out.write_all(b"\n")?;
        self.out.flush()?;
        Ok(())
    }

    pub fn is_subscribed(&self, topic: EventTopic) -> bool {
        self.subscriptions.iter().any(|(_, live)| *live == topic)
    }

    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    pub fn writer(&self) -> &W {
        &self.out
    }
}

impl<W: Write> Backend for JsonLineBackend<W> {
    fn search(&mut self, token: RequestToken, query: &str) -> Result<(), BackendError> {
        self.emit(&HostRequest::Search {
            token,
            query: query.to_string(),
        })
    }

    fn ai_request(&mut self, stream: StreamId, prompt: &str) -> Result<(), BackendError> {
        self.emit(&HostRequest::AiRequest {
            stream,
            prompt: prompt.to_string(),
        })
    }

    fn get_config(&mut self) -> Result<Config, BackendError> {
        Ok(self.store.load()?)
    }

    fn save_config(&mut self, config: &Config) -> Result<(), BackendError> {
        Ok(self.store.save(config)?)
    }

    fn subscribe(&mut self, topic: EventTopic) -> Result<SubscriptionId, BackendError> {
        self.emit(&HostRequest::Subscribe { topic })?;
        self.next_subscription += 1;
        let id = SubscriptionId(self.next_subscription);
        self.subscriptions.push((id, topic));
        Ok(id)
    }

    fn unsubscribe(&mut self, id: SubscriptionId) -> Result<(), BackendError> {
        let Some(position) = self.subscriptions.iter().position(|(live, _)| *live == id) else {
            return Err(BackendError::Rejected(format!("unknown subscription {}", id.0)));
        };
        let (_, topic) = self.subscriptions.remove(position);
        self.emit(&HostRequest::Unsubscribe { topic })
    }

    fn set_window_visible(&mut self, visible: bool) -> Result<(), BackendError> {
        if visible {
            self.emit(&HostRequest::ShowWindow)
        } else {
            self.emit(&HostRequest::HideWindow)
        }
    }

    fn resize_window(&mut self, compact: bool) -> Result<(), BackendError> {
        self.emit(&HostRequest::ResizeWindow { compact })
    }

    fn set_focus_hiding_disabled(&mut self, disabled: bool) -> Result<(), BackendError> {
        self.emit(&HostRequest::SetFocusHidingDisabled { disabled })
    }
}
