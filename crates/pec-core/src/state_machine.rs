//! Conversation design state machine.
//!
//! `Idle → ParamsConfirmed → AskingGeneration → DownloadRequested`, plus the
//! orthogonal `has_generated_design` flag that switches later turns into
//! Q&A mode. Transitions come only from trigger phrases; no numeric design
//! data is held here.

use pec_types::{
    config::ChatMode,
    design::MissingField,
    event::DesignPhase,
    message::ChatMessage,
};
use crate::{extract, triggers};

/// One phase change, in the order it happened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: DesignPhase,
    pub to: DesignPhase,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationDesignState {
    phase: DesignPhase,
    has_generated_design: bool,
}

impl Default for ConversationDesignState {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationDesignState {
    pub fn new() -> Self {
        Self {
            phase: DesignPhase::Idle,
            has_generated_design: false,
        }
    }

    pub fn phase(&self) -> DesignPhase {
        self.phase
    }

    pub fn has_generated_design(&self) -> bool {
        self.has_generated_design
    }

    /// Parameters confirmed at some point in the current cycle
    pub fn is_confirmed(&self) -> bool {
        !matches!(self.phase, DesignPhase::Idle)
    }

    pub fn is_asking_for_generation(&self) -> bool {
        self.phase == DesignPhase::AskingGeneration
    }

    pub fn download_requested(&self) -> bool {
        self.phase == DesignPhase::DownloadRequested
    }

    /// System prompt selector for the next turn
    pub fn mode(&self) -> ChatMode {
        if self.has_generated_design {
            ChatMode::Qa
        } else {
            ChatMode::Design
        }
    }

    fn go(&mut self, to: DesignPhase, changes: &mut Vec<Transition>) {
        if self.phase != to {
            changes.push(Transition { from: self.phase, to });
            log::debug!("[design-state] {:?} -> {:?}", self.phase, to);
            self.phase = to;
        }
    }

    /// Evaluated when the user sends, against the state before the reply.
    /// Only a generation request while the assistant is asking acts here.
    pub fn on_user_message(&mut self, user_text: &str) -> Vec<Transition> {
        let mut changes = Vec::new();
        if self.phase == DesignPhase::AskingGeneration && triggers::wants_generation(user_text) {
            self.go(DesignPhase::DownloadRequested, &mut changes);
        }
        changes
    }

    /// Evaluated once the assistant reply is complete. `history` is the
    /// committed conversation including this exchange.
    pub fn on_assistant_reply(
        &mut self,
        reply: &str,
        user_text: &str,
        history: &[ChatMessage],
        mode: ChatMode,
    ) -> Vec<Transition> {
        let mut changes = Vec::new();
        if mode != ChatMode::Design {
            return changes;
        }
        let open = matches!(self.phase, DesignPhase::Idle | DesignPhase::ParamsConfirmed);
        if !open {
            return changes;
        }

        if triggers::is_asking_for_generation(reply) {
            // Asking implies the parameters were settled.
            self.go(DesignPhase::ParamsConfirmed, &mut changes);
            self.go(DesignPhase::AskingGeneration, &mut changes);
        } else if triggers::is_confirmation(user_text) {
            let design = extract::extract(history);
            let has_power = !design.is_missing(MissingField::OutputPower);
            let has_voltage = !design.is_missing(MissingField::InputVoltage)
                || !design.is_missing(MissingField::OutputVoltage);
            if has_power && has_voltage {
                self.go(DesignPhase::ParamsConfirmed, &mut changes);
            }
        }
        changes
    }

    /// A design was produced: back to `Idle` with the Q&A flag set.
    pub fn mark_design_generated(&mut self) -> Vec<Transition> {
        let mut changes = Vec::new();
        self.go(DesignPhase::Idle, &mut changes);
        self.has_generated_design = true;
        changes
    }

    /// New chat or session switch
    pub fn reset(&mut self) -> Vec<Transition> {
        let mut changes = Vec::new();
        self.go(DesignPhase::Idle, &mut changes);
        self.has_generated_design = false;
        changes
    }
}
