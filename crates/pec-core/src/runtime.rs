//! Chat runtime: one design conversation.
//!
//! Each turn follows the same shape:
//! 1. Reject the send if another exchange is in flight
//! 2. Run the user-side trigger check against the pre-send state
//! 3. Stream (or complete) the reply, emitting deltas on the event bus
//! 4. On success commit the user/assistant pair to the session store and
//!    run the assistant-side trigger check; on error or cancellation commit
//!    nothing
//!
//! When the state machine reaches `DownloadRequested` the host calls
//! [`ChatRuntime::generate_design`], which runs extract → normalize →
//! synthesize and switches later turns to Q&A mode.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use chrono::Utc;
use futures::StreamExt;
use futures::future::{AbortHandle, AbortRegistration, Abortable};
use pec_types::{
    PecError, Result,
    config::{AppConfig, ChatMode},
    design::{DesignParameters, DesignResult, ExtractedDesign},
    document::{ExportedFile, ReportKind},
    event::ChatEvent,
    message::ChatMessage,
};
use crate::event_bus::EventBus;
use crate::extract::extract;
use crate::markdown::clean_markdown;
use crate::normalize::normalize;
use crate::ports::*;
use crate::report;
use crate::session_store::SessionStore;
use crate::state_machine::{ConversationDesignState, Transition};
use crate::suggest::suggest_replies;
use crate::summary::{design_summary, has_valid_design};
use crate::synth::ResultSynthesizer;

/// At most one exchange in flight. Clones share the flag so the host can
/// check it without borrowing the runtime.
#[derive(Clone, Default)]
pub struct TurnGate {
    busy: Rc<Cell<bool>>,
}

/// Held for the duration of an exchange; releases the gate on drop.
pub struct TurnPermit {
    busy: Rc<Cell<bool>>,
}

impl TurnGate {
    pub fn try_acquire(&self) -> Result<TurnPermit> {
        if self.busy.get() {
            return Err(PecError::Busy);
        }
        self.busy.set(true);
        Ok(TurnPermit { busy: self.busy.clone() })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.get()
    }
}

impl Drop for TurnPermit {
    fn drop(&mut self) {
        self.busy.set(false);
    }
}

/// Stop button target for the exchange in flight. The host arms it only
/// once the runtime borrow for that exchange has succeeded, so a dispatch
/// that is turned away cannot replace the live handle.
#[derive(Clone, Default)]
pub struct StopSlot {
    handle: Rc<RefCell<Option<AbortHandle>>>,
}

impl StopSlot {
    pub fn arm(&self) -> AbortRegistration {
        let (handle, registration) = AbortHandle::new_pair();
        *self.handle.borrow_mut() = Some(handle);
        registration
    }

    /// Abort the armed exchange, if any. Returns whether one was armed.
    pub fn stop(&self) -> bool {
        match self.handle.borrow_mut().take() {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    pub fn disarm(&self) {
        self.handle.borrow_mut().take();
    }

    pub fn is_armed(&self) -> bool {
        self.handle.borrow().is_some()
    }
}

/// Everything produced by one generation cycle
#[derive(Debug, Clone, PartialEq)]
pub struct DesignOutcome {
    pub extracted: ExtractedDesign,
    pub parameters: DesignParameters,
    pub result: DesignResult,
    pub summary: String,
}

pub struct ChatRuntime {
    pub config: AppConfig,
    pub event_bus: EventBus,
    design: ConversationDesignState,
    store: SessionStore,
    synthesizer: Box<dyn ResultSynthesizer>,
    gate: TurnGate,
    outcome: Option<DesignOutcome>,
    failed: Option<FailedTurn>,
    turn_counter: u64,
}

/// Input of the last exchange that did not complete. `base` is set when
/// the exchange replayed an already stored message and holds the history
/// it should be committed on top of.
struct FailedTurn {
    text: String,
    base: Option<Vec<ChatMessage>>,
}

impl ChatRuntime {
    pub fn new(
        config: AppConfig,
        event_bus: EventBus,
        store: SessionStore,
        synthesizer: Box<dyn ResultSynthesizer>,
    ) -> Self {
        Self {
            config,
            event_bus,
            design: ConversationDesignState::new(),
            store,
            synthesizer,
            gate: TurnGate::default(),
            outcome: None,
            failed: None,
            turn_counter: 0,
        }
    }

    // ─── Accessors ───────────────────────────────────────────

    pub fn gate(&self) -> TurnGate {
        self.gate.clone()
    }

    pub fn design_state(&self) -> &ConversationDesignState {
        &self.design
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.store
    }

    pub fn messages(&self) -> &[ChatMessage] {
        self.store.messages()
    }

    pub fn outcome(&self) -> Option<&DesignOutcome> {
        self.outcome.as_ref()
    }

    pub fn last_failed_input(&self) -> Option<&str> {
        self.failed.as_ref().map(|f| f.text.as_str())
    }

    pub fn mode(&self) -> ChatMode {
        self.design.mode()
    }

    pub fn suggestions(&self) -> Vec<String> {
        suggest_replies(self.store.messages())
    }

    /// Whether the current conversation carries enough for a trustworthy design
    pub fn has_valid_design(&self) -> bool {
        has_valid_design(&extract(self.store.messages()))
    }

    fn emit_transitions(&self, transitions: Vec<Transition>) {
        self.event_bus.emit_all(
            transitions
                .into_iter()
                .map(|t| ChatEvent::PhaseChanged { from: t.from, to: t.to }),
        );
    }

    // ─── Turns ───────────────────────────────────────────────

    /// Restore persisted sessions.
    pub async fn load(&mut self) {
        self.store.load().await;
        self.event_bus.emit(ChatEvent::SessionsChanged);
    }

    /// Send one user message and wait for the reply.
    ///
    /// Returns `Busy` without side effects while another exchange runs.
    /// Any other failure discards the partial reply, leaves the session
    /// and the design phase untouched and remembers the input for
    /// [`retry`](Self::retry).
    pub async fn send(
        &mut self,
        text: &str,
        chat: &dyn ChatPort,
        abort: AbortRegistration,
    ) -> Result<()> {
        self.run_turn(text, None, chat, abort).await
    }

    /// One exchange. With `base`, the request is built on that history and
    /// a successful reply replaces the stored conversation with
    /// `base + [user, reply]`; otherwise the pair is appended.
    async fn run_turn(
        &mut self,
        text: &str,
        base: Option<Vec<ChatMessage>>,
        chat: &dyn ChatPort,
        abort: AbortRegistration,
    ) -> Result<()> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(());
        }
        let _permit = self.gate.try_acquire()?;

        self.turn_counter += 1;
        let turn_id = self.turn_counter;
        self.failed = None;
        log::info!("[turn {}] start ({:?} mode)", turn_id, self.design.mode());
        self.event_bus.emit(ChatEvent::TurnStart {
            turn_id,
            user_text: text.to_string(),
        });

        let design_before = self.design.clone();
        let transitions = self.design.on_user_message(text);
        self.emit_transitions(transitions);

        let mode = self.design.mode();
        let user_message = ChatMessage::user(text);
        let mut history = match &base {
            Some(base) => base.clone(),
            None => self.store.messages().to_vec(),
        };
        history.push(user_message.clone());
        let req = self.request(history, mode);

        match self.exchange(req, chat, abort).await {
            Ok(reply) => {
                let reply_text = reply.content.clone();
                match base {
                    Some(mut base) => {
                        base.extend([user_message, reply.clone()]);
                        self.store.set_messages(base).await;
                    }
                    None => {
                        self.store
                            .append_messages([user_message, reply.clone()])
                            .await;
                    }
                }
                self.event_bus.emit(ChatEvent::TurnComplete { turn_id, message: reply });
                self.event_bus.emit(ChatEvent::SessionsChanged);

                let transitions = self.design.on_assistant_reply(
                    &reply_text,
                    text,
                    self.store.messages(),
                    mode,
                );
                self.emit_transitions(transitions);
                log::info!("[turn {}] complete, phase {:?}", turn_id, self.design.phase());
                Ok(())
            }
            Err(e) => {
                self.failed = Some(FailedTurn { text: text.to_string(), base });
                self.restore_design(design_before);
                if e == PecError::Cancelled {
                    log::info!("[turn {}] cancelled", turn_id);
                    self.event_bus.emit(ChatEvent::TurnCancelled { turn_id });
                } else {
                    log::warn!("[turn {}] failed: {}", turn_id, e);
                    self.event_bus.emit(ChatEvent::TurnFailed {
                        turn_id,
                        message: e.to_string(),
                        retryable: e.is_retryable(),
                    });
                }
                Err(e)
            }
        }
    }

    /// Replay the last failed input, or when nothing failed, resend the
    /// last stored user message on top of the history before it. The
    /// stored session only changes once the replayed exchange succeeds.
    pub async fn retry(&mut self, chat: &dyn ChatPort, abort: AbortRegistration) -> Result<()> {
        if self.gate.is_busy() {
            return Err(PecError::Busy);
        }
        if let Some(FailedTurn { text, base }) = self.failed.take() {
            return self.run_turn(&text, base, chat, abort).await;
        }
        let messages = self.store.messages();
        let Some(idx) = messages.iter().rposition(|m| m.is_user()) else {
            return Ok(());
        };
        let text = messages[idx].content.clone();
        let kept = messages[..idx].to_vec();
        self.run_turn(&text, Some(kept), chat, abort).await
    }

    /// Undo the phase changes of an exchange that did not complete.
    fn restore_design(&mut self, before: ConversationDesignState) {
        let from = self.design.phase();
        self.design = before;
        let to = self.design.phase();
        if from != to {
            self.event_bus.emit(ChatEvent::PhaseChanged { from, to });
        }
    }

    fn request(&self, messages: Vec<ChatMessage>, mode: ChatMode) -> ChatRequest {
        let design_context = match mode {
            ChatMode::Qa => self.outcome.as_ref().map(|o| o.summary.clone()),
            ChatMode::Design => None,
        };
        ChatRequest {
            messages,
            mode,
            system_prompt: mode.system_prompt(design_context.as_deref()),
            design_context,
            model: self.config.llm.model.clone(),
            max_tokens: self.config.llm.max_tokens,
            temperature: self.config.llm.temperature,
        }
    }

    /// Run the transport and assemble the finished assistant message.
    async fn exchange(
        &self,
        req: ChatRequest,
        chat: &dyn ChatPort,
        abort: AbortRegistration,
    ) -> Result<ChatMessage> {
        let started = Utc::now();
        let mut reasoning = String::new();
        let mut content = String::new();
        let mut first_content_at = None;

        if self.config.llm.stream {
            let mut stream = Abortable::new(chat.stream(req), abort);
            while let Some(event) = stream.next().await {
                match event {
                    ChatStreamEvent::ReasoningDelta(text) => {
                        reasoning.push_str(&text);
                        self.event_bus.emit(ChatEvent::ReasoningDelta { text });
                    }
                    ChatStreamEvent::ContentDelta(text) => {
                        first_content_at.get_or_insert_with(Utc::now);
                        content.push_str(&text);
                        self.event_bus.emit(ChatEvent::ContentDelta { text });
                    }
                    ChatStreamEvent::Done => break,
                    ChatStreamEvent::Error(message) => return Err(PecError::Llm(message)),
                }
            }
            if stream.is_aborted() {
                return Err(PecError::Cancelled);
            }
        } else {
            content = Abortable::new(chat.complete(req), abort)
                .await
                .map_err(|_| PecError::Cancelled)??;
            first_content_at = Some(Utc::now());
        }

        let cleaned = clean_markdown(&content);
        if cleaned.is_empty() {
            return Err(PecError::EmptyResponse);
        }
        let mut message = ChatMessage::assistant(cleaned).with_reasoning(reasoning);
        message.thinking_secs = first_content_at
            .map(|at| (at - started).num_seconds().max(0) as u64);
        Ok(message)
    }

    // ─── Design lifecycle ────────────────────────────────────

    /// Extract → normalize → synthesize over the current conversation,
    /// then return the state machine to `Idle` in Q&A mode.
    pub fn generate_design(&mut self) -> &DesignOutcome {
        let extracted = extract(self.store.messages());
        let parameters = normalize(&extracted);
        let result = self.synthesizer.synthesize(&parameters);
        let summary = design_summary(&extracted, &result);
        log::info!(
            "[design] generated with {} synthesizer, confidence {:.1}",
            self.synthesizer.name(),
            extracted.confidence
        );

        let transitions = self.design.mark_design_generated();
        self.emit_transitions(transitions);
        self.event_bus.emit(ChatEvent::DesignReady { summary: summary.clone() });

        self.outcome.insert(DesignOutcome { extracted, parameters, result, summary })
    }

    fn require_outcome(&self) -> Result<&DesignOutcome> {
        self.outcome
            .as_ref()
            .ok_or_else(|| PecError::Other("no design has been generated".to_string()))
    }

    pub async fn export(
        &self,
        kind: ReportKind,
        renderer: &dyn DocumentRenderer,
    ) -> Result<ExportedFile> {
        let outcome = self.require_outcome()?;
        report::export_report(
            kind,
            &self.config.product_name,
            &outcome.parameters,
            &outcome.result,
            renderer,
        )
        .await
    }

    pub async fn export_all(&self, renderer: &dyn DocumentRenderer) -> Result<Vec<ExportedFile>> {
        let outcome = self.require_outcome()?;
        report::export_all(
            &self.config.product_name,
            &outcome.parameters,
            &outcome.result,
            renderer,
        )
        .await
    }

    // ─── Sessions ────────────────────────────────────────────

    fn reset_conversation(&mut self) {
        let transitions = self.design.reset();
        self.emit_transitions(transitions);
        self.outcome = None;
        self.failed = None;
    }

    pub async fn new_chat(&mut self) -> Result<String> {
        if self.gate.is_busy() {
            return Err(PecError::Busy);
        }
        let id = self.store.create_session().await;
        self.reset_conversation();
        self.event_bus.emit(ChatEvent::SessionsChanged);
        Ok(id)
    }

    pub fn switch_session(&mut self, id: &str) -> Result<()> {
        if self.gate.is_busy() {
            return Err(PecError::Busy);
        }
        self.store.switch_session(id)?;
        self.reset_conversation();
        self.event_bus.emit(ChatEvent::SessionsChanged);
        Ok(())
    }

    pub async fn delete_session(&mut self, id: &str) -> Result<()> {
        let was_current = self.store.current_id() == Some(id);
        if was_current && self.gate.is_busy() {
            return Err(PecError::Busy);
        }
        self.store.delete_session(id).await?;
        if was_current {
            self.reset_conversation();
        }
        self.event_bus.emit(ChatEvent::SessionsChanged);
        Ok(())
    }

    pub async fn clear_history(&mut self) -> Result<()> {
        if self.gate.is_busy() {
            return Err(PecError::Busy);
        }
        self.store.clear_all().await;
        self.reset_conversation();
        self.event_bus.emit(ChatEvent::SessionsChanged);
        Ok(())
    }
}
