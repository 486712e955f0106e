use serde::{Deserialize, Serialize};

pub const DEFAULT_AI_SIGIL: char = '/';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    OpenFile,
    OpenApp,
    OpenUrl,
    CopyToClipboard,
    AiResponse,
}

impl ActionType {
    pub fn label(self) -> &'static str {
        match self {
            Self::OpenFile => "open_file",
            Self::OpenApp => "open_app",
            Self::OpenUrl => "open_url",
            Self::CopyToClipboard => "copy_to_clipboard",
            Self::AiResponse => "ai_response",
        }
    }
}

/// One ranked entry as delivered by the search collaborator.
///
/// Results are kept in the order they arrive; the score is informational only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub action_type: ActionType,
    pub action_data: String,
    pub score: f32,
}

impl SearchResult {
    pub fn new(id: &str, title: &str, action_type: ActionType, action_data: &str) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            description: String::new(),
            icon: None,
            action_type,
            action_data: action_data.to_string(),
            score: 0.0,
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn with_icon(mut self, icon: &str) -> Self {
        self.icon = Some(icon.to_string());
        self
    }

    pub fn with_score(mut self, score: f32) -> Self {
        self.score = score;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryRoute<'a> {
    Empty,
    Search(&'a str),
    Ai(&'a str),
}

/// Decides which path a raw query takes. The prompt of an AI route has the
/// sigil stripped and surrounding whitespace removed.
pub fn route_query(query: &str, sigil: char) -> QueryRoute<'_> {
    if query.trim().is_empty() {
        return QueryRoute::Empty;
    }

    if let Some(prompt) = query.strip_prefix(sigil) {
        return QueryRoute::Ai(prompt.trim());
    }

    QueryRoute::Search(query.trim())
}
