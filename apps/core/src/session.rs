use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::model::SearchResult;
use crate::navigation::clamp_selection;
use crate::stream::StreamAccumulator;

/// Identity of one issued search request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestToken(u64);

impl RequestToken {
    pub fn value(self) -> u64 {
        self.0
    }
}

impl From<u64> for RequestToken {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Identity of one AI answer stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StreamId(u64);

impl StreamId {
    pub fn value(self) -> u64 {
        self.0
    }
}

impl From<u64> for StreamId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Monotonic issuer with a single "live" slot. Issuing supersedes the previous
/// identity and invalidating leaves nothing live.
#[derive(Debug, Clone)]
pub struct Issuer<T> {
    last: u64,
    active: Option<T>,
}

impl<T> Default for Issuer<T> {
    fn default() -> Self {
        Self {
            last: 0,
            active: None,
        }
    }
}

impl<T: From<u64> + Copy + PartialEq> Issuer<T> {
    pub fn issue(&mut self) -> T {
        self.last += 1;
        let id = T::from(self.last);
        self.active = Some(id);
        id
    }

    pub fn invalidate(&mut self) {
        self.active = None;
    }

    pub fn active(&self) -> Option<T> {
        self.active
    }

    pub fn is_current(&self, id: T) -> bool {
        self.active == Some(id)
    }
}

pub type TokenIssuer = Issuer<RequestToken>;
pub type StreamIssuer = Issuer<StreamId>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateKind {
    Idle,
    Loading,
    Results,
    EmptyResults,
    Streaming,
    Error,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum SessionState {
    #[default]
    Idle,
    Loading {
        token: RequestToken,
        since: Instant,
    },
    Results {
        results: Vec<SearchResult>,
        selected: usize,
    },
    Streaming {
        stream: StreamId,
        buffer: StreamAccumulator,
    },
    Error {
        message: String,
    },
}

impl SessionState {
    pub fn results(results: Vec<SearchResult>) -> Self {
        Self::Results {
            results,
            selected: 0,
        }
    }

    pub fn streaming(stream: StreamId) -> Self {
        Self::Streaming {
            stream,
            buffer: StreamAccumulator::new(),
        }
    }

    pub fn kind(&self) -> StateKind {
        match self {
            Self::Idle => StateKind::Idle,
            Self::Loading { .. } => StateKind::Loading,
            Self::Results { results, .. } if results.is_empty() => StateKind::EmptyResults,
            Self::Results { .. } => StateKind::Results,
            Self::Streaming { .. } => StateKind::Streaming,
            Self::Error { .. } => StateKind::Error,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_streaming(&self) -> bool {
        matches!(self, Self::Streaming { .. })
    }

    pub fn loading_token(&self) -> Option<RequestToken> {
        match self {
            Self::Loading { token, .. } => Some(*token),
            _ => None,
        }
    }

    pub fn result_list(&self) -> &[SearchResult] {
        match self {
            Self::Results { results, .. } => results,
            _ => &[],
        }
    }

    pub fn selected_index(&self) -> Option<usize> {
        match self {
            Self::Results { results, selected } if !results.is_empty() => Some(*selected),
            _ => None,
        }
    }

    pub fn selected_result(&self) -> Option<&SearchResult> {
        match self {
            Self::Results { results, selected } => results.get(*selected),
            _ => None,
        }
    }

    /// Moves the selection with `step`, which maps the current index and the
    /// list length to a new index. The result is always clamped.
    pub fn move_selection(&mut self, step: impl FnOnce(usize, usize) -> usize) -> bool {
        let Self::Results { results, selected } = self else {
            return false;
        };
        if results.is_empty() {
            return false;
        }

        let next = clamp_selection(step(*selected, results.len()), results.len());
        let moved = next != *selected;
        *selected = next;
        moved
    }

    pub fn stream_buffer(&self) -> Option<&StreamAccumulator> {
        match self {
            Self::Streaming { buffer, .. } => Some(buffer),
            _ => None,
        }
    }

    pub fn transcript(&self) -> &str {
        self.stream_buffer()
            .map(StreamAccumulator::transcript)
            .unwrap_or("")
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Error { message } => Some(message),
            _ => None,
        }
    }
}
