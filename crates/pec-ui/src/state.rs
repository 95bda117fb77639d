//! UI-level state that drives rendering.
//! This is a read-only projection of the chat runtime, updated each frame by
//! draining the EventBus and, whenever the runtime is free, by taking a
//! fresh [`RuntimeSnapshot`].

use chrono::{DateTime, Utc};
use pec_core::runtime::ChatRuntime;
use pec_types::{
    config::ChatMode,
    event::{ChatEvent, DesignPhase},
    message::{ChatMessage, Role},
    session::SessionGroups,
};

/// A chat entry for display
#[derive(Debug, Clone, PartialEq)]
pub struct ChatEntry {
    pub role: Role,
    pub content: String,
    pub reasoning: Option<String>,
    pub thinking_secs: Option<u64>,
}

impl From<&ChatMessage> for ChatEntry {
    fn from(msg: &ChatMessage) -> Self {
        Self {
            role: msg.role,
            content: msg.content.clone(),
            reasoning: msg.reasoning.clone(),
            thinking_secs: msg.thinking_secs,
        }
    }
}

/// Dismissible inline error shown under the conversation
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorBanner {
    pub message: String,
    pub retryable: bool,
}

/// Outcome of the last export
#[derive(Debug, Clone, PartialEq)]
pub struct ExportStatus {
    pub message: String,
    pub success: bool,
}

/// Everything the panels read from the runtime between turns
#[derive(Debug, Clone, Default)]
pub struct RuntimeSnapshot {
    pub messages: Vec<ChatMessage>,
    pub sessions: SessionGroups,
    pub current_session: Option<String>,
    pub suggestions: Vec<String>,
    pub phase: Option<DesignPhase>,
    pub mode: ChatMode,
    pub design_summary: Option<String>,
    pub has_valid_design: bool,
    pub last_failed_input: Option<String>,
}

impl RuntimeSnapshot {
    pub fn capture(runtime: &ChatRuntime, now: DateTime<Utc>) -> Self {
        Self {
            messages: runtime.messages().to_vec(),
            sessions: runtime.sessions().grouped(now),
            current_session: runtime.sessions().current_id().map(String::from),
            suggestions: runtime.suggestions(),
            phase: Some(runtime.design_state().phase()),
            mode: runtime.mode(),
            design_summary: runtime.outcome().map(|o| o.summary.clone()),
            has_valid_design: runtime.has_valid_design(),
            last_failed_input: runtime.last_failed_input().map(String::from),
        }
    }
}

/// State visible to UI panels
pub struct UiState {
    /// Committed conversation of the current session
    pub messages: Vec<ChatEntry>,
    /// User text of the exchange in flight, or of the one that just failed
    pub pending_user: Option<String>,
    /// Streaming reply text being assembled
    pub streaming_text: String,
    /// Streaming reasoning text being assembled
    pub streaming_reasoning: String,
    pub busy: bool,
    pub phase: DesignPhase,
    pub mode: ChatMode,
    pub error: Option<ErrorBanner>,
    /// Set once a design has been generated for the current conversation
    pub design_summary: Option<String>,
    pub has_valid_design: bool,
    pub sessions: SessionGroups,
    pub current_session: Option<String>,
    pub suggestions: Vec<String>,
    /// Input field content
    pub input_text: String,
    pub show_settings: bool,
    pub show_sessions: bool,
    /// Status line text
    pub status_text: String,
    /// Outcome of the last export, shown in the download panel
    pub export_status: Option<ExportStatus>,
    pub exporting: bool,
    /// A snapshot is due as soon as the runtime can be borrowed
    pub needs_sync: bool,
}

impl UiState {
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            pending_user: None,
            streaming_text: String::new(),
            streaming_reasoning: String::new(),
            busy: false,
            phase: DesignPhase::Idle,
            mode: ChatMode::Design,
            error: None,
            design_summary: None,
            has_valid_design: false,
            sessions: SessionGroups::default(),
            current_session: None,
            suggestions: Vec::new(),
            input_text: String::new(),
            show_settings: false,
            show_sessions: true,
            status_text: "就绪".to_string(),
            export_status: None,
            exporting: false,
            needs_sync: true,
        }
    }

    /// Process events from the EventBus and update UI state
    pub fn process_events(&mut self, events: Vec<ChatEvent>) {
        for event in events {
            match event {
                ChatEvent::TurnStart { user_text, .. } => {
                    self.busy = true;
                    self.error = None;
                    self.pending_user = Some(user_text);
                    self.clear_stream();
                    self.suggestions.clear();
                    self.status_text = "思考中...".to_string();
                }
                ChatEvent::ReasoningDelta { text } => {
                    self.streaming_reasoning.push_str(&text);
                    self.status_text = "深度思考中...".to_string();
                }
                ChatEvent::ContentDelta { text } => {
                    self.streaming_text.push_str(&text);
                    self.status_text = "正在回复...".to_string();
                }
                ChatEvent::TurnComplete { message, .. } => {
                    if let Some(text) = self.pending_user.take() {
                        self.messages.push(ChatEntry::from(&ChatMessage::user(text)));
                    }
                    self.messages.push(ChatEntry::from(&message));
                    self.finish_turn("就绪");
                    self.needs_sync = true;
                }
                ChatEvent::TurnFailed { message, retryable, .. } => {
                    self.error = Some(ErrorBanner { message, retryable });
                    self.finish_turn("出错");
                }
                ChatEvent::TurnCancelled { .. } => {
                    self.pending_user = None;
                    self.finish_turn("已停止");
                }
                ChatEvent::PhaseChanged { to, .. } => {
                    self.phase = to;
                }
                ChatEvent::DesignReady { summary } => {
                    self.design_summary = Some(summary);
                    self.mode = ChatMode::Qa;
                    self.needs_sync = true;
                }
                ChatEvent::SessionsChanged => {
                    self.needs_sync = true;
                }
            }
        }
    }

    fn clear_stream(&mut self) {
        self.streaming_text.clear();
        self.streaming_reasoning.clear();
    }

    fn finish_turn(&mut self, status: &str) {
        self.busy = false;
        self.clear_stream();
        self.status_text = status.to_string();
    }

    /// Replace the runtime-owned parts of the projection.
    pub fn apply_snapshot(&mut self, snapshot: RuntimeSnapshot) {
        self.messages = snapshot.messages.iter().map(ChatEntry::from).collect();
        self.sessions = snapshot.sessions;
        self.current_session = snapshot.current_session;
        self.suggestions = snapshot.suggestions;
        if let Some(phase) = snapshot.phase {
            self.phase = phase;
        }
        self.mode = snapshot.mode;
        self.design_summary = snapshot.design_summary;
        self.has_valid_design = snapshot.has_valid_design;
        if !self.busy && snapshot.last_failed_input.is_none() {
            self.pending_user = None;
            self.error = None;
        }
        self.needs_sync = false;
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    /// Downloads are offered once a design exists
    pub fn can_download(&self) -> bool {
        self.design_summary.is_some()
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }
}

impl Default for UiState {
    fn default() -> Self {
        Self::new()
    }
}
