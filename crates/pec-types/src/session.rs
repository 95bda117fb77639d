use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use crate::message::ChatMessage;

pub const DEFAULT_SESSION_TITLE: &str = "新对话";
const TITLE_MAX_CHARS: usize = 20;

/// A persisted conversation session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSession {
    pub id: String,
    pub title: String,
    pub messages: Vec<ChatMessage>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ChatSession {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: format!("session_{}", uuid::Uuid::new_v4().simple()),
            title: DEFAULT_SESSION_TITLE.to_string(),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace the message list, retitling an untitled session from its
    /// first user message.
    pub fn set_messages(&mut self, messages: Vec<ChatMessage>) {
        if self.title == DEFAULT_SESSION_TITLE {
            if let Some(first) = messages.iter().find(|m| m.is_user()) {
                self.title = title_from_message(&first.content);
            }
        }
        self.messages = messages;
        self.updated_at = Utc::now();
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            updated_at: self.updated_at,
            message_count: self.messages.len(),
        }
    }
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Session title derived from message text: newlines flattened, cut to
/// 20 characters with a trailing ellipsis.
pub fn title_from_message(content: &str) -> String {
    let cleaned = content.trim().replace('\n', " ");
    if cleaned.chars().count() > TITLE_MAX_CHARS {
        let head: String = cleaned.chars().take(TITLE_MAX_CHARS).collect();
        format!("{}...", head)
    } else {
        cleaned
    }
}

/// Summary of a session for listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: String,
    pub title: String,
    pub updated_at: DateTime<Utc>,
    pub message_count: usize,
}

/// Sessions bucketed by recency for the history sidebar
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionGroups {
    pub within_7_days: Vec<SessionSummary>,
    pub within_30_days: Vec<SessionSummary>,
    pub older: Vec<SessionSummary>,
}

impl SessionGroups {
    /// Bucket sessions relative to `now`, newest first within each bucket.
    pub fn from_sessions<'a>(
        sessions: impl IntoIterator<Item = &'a ChatSession>,
        now: DateTime<Utc>,
    ) -> Self {
        let mut sorted: Vec<&ChatSession> = sessions.into_iter().collect();
        sorted.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

        let seven_days_ago = now - Duration::days(7);
        let thirty_days_ago = now - Duration::days(30);

        let mut groups = SessionGroups::default();
        for session in sorted {
            let summary = session.summary();
            if session.updated_at >= seven_days_ago {
                groups.within_7_days.push(summary);
            } else if session.updated_at >= thirty_days_ago {
                groups.within_30_days.push(summary);
            } else {
                groups.older.push(summary);
            }
        }
        groups
    }

    pub fn is_empty(&self) -> bool {
        self.within_7_days.is_empty() && self.within_30_days.is_empty() && self.older.is_empty()
    }
}
