use serde::{Deserialize, Serialize};
use crate::message::ChatMessage;

/// Phase of the design conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DesignPhase {
    Idle,
    ParamsConfirmed,
    AskingGeneration,
    DownloadRequested,
}

/// Events emitted by the chat runtime.
/// UI subscribes to these for reactive updates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ChatEvent {
    /// A user message was accepted and a reply requested
    TurnStart { turn_id: u64, user_text: String },

    /// Reasoning channel text grew
    ReasoningDelta { text: String },

    /// Visible reply text grew
    ContentDelta { text: String },

    /// The reply finished and both messages were committed to the session
    TurnComplete { turn_id: u64, message: ChatMessage },

    /// The exchange failed; the partial reply was discarded
    TurnFailed { turn_id: u64, message: String, retryable: bool },

    /// The exchange was cancelled before completion
    TurnCancelled { turn_id: u64 },

    /// The design conversation moved between phases
    PhaseChanged { from: DesignPhase, to: DesignPhase },

    /// A design was synthesized and downloads are available
    DesignReady { summary: String },

    /// Session list or current session changed
    SessionsChanged,
}
