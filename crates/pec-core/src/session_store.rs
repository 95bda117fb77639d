//! Session store: the single owner of persisted chat sessions.
//!
//! The whole collection is serialized as one JSON blob under a fixed key
//! and rewritten on every change (last write wins). Persistence failures
//! are logged and never surface as bootstrap errors.

use std::rc::Rc;
use chrono::{DateTime, Utc};
use pec_types::{
    PecError, Result,
    message::ChatMessage,
    session::{ChatSession, SessionGroups},
};
use crate::ports::StoragePort;

pub struct SessionStore {
    storage: Rc<dyn StoragePort>,
    key: String,
    sessions: Vec<ChatSession>,
    current_id: Option<String>,
}

impl SessionStore {
    pub fn new(storage: Rc<dyn StoragePort>, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
            sessions: Vec::new(),
            current_id: None,
        }
    }

    /// Read the collection back. Missing, unreadable or corrupt data all
    /// yield an empty history. The most recently updated session becomes
    /// current.
    pub async fn load(&mut self) {
        self.sessions = match self.storage.get(&self.key).await {
            Ok(Some(bytes)) => match serde_json::from_slice::<Vec<ChatSession>>(&bytes) {
                Ok(sessions) => sessions,
                Err(e) => {
                    log::warn!("[sessions] discarding unreadable history: {}", e);
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                log::warn!(
                    "[sessions] {} read failed, starting empty: {}",
                    self.storage.backend_name(),
                    e
                );
                Vec::new()
            }
        };
        self.current_id = self
            .sessions
            .iter()
            .max_by_key(|s| s.updated_at)
            .map(|s| s.id.clone());
        log::info!("[sessions] loaded {} session(s)", self.sessions.len());
    }

    async fn persist(&self) {
        let bytes = match serde_json::to_vec(&self.sessions) {
            Ok(bytes) => bytes,
            Err(e) => {
                log::error!("[sessions] serialize failed: {}", e);
                return;
            }
        };
        if let Err(e) = self.storage.set(&self.key, &bytes).await {
            log::error!("[sessions] save failed: {}", e);
        }
    }

    pub fn sessions(&self) -> &[ChatSession] {
        &self.sessions
    }

    pub fn current_id(&self) -> Option<&str> {
        self.current_id.as_deref()
    }

    pub fn current(&self) -> Option<&ChatSession> {
        let id = self.current_id.as_deref()?;
        self.sessions.iter().find(|s| s.id == id)
    }

    fn current_mut(&mut self) -> Option<&mut ChatSession> {
        let id = self.current_id.clone()?;
        self.sessions.iter_mut().find(|s| s.id == id)
    }

    /// Messages of the current session, empty when there is none
    pub fn messages(&self) -> &[ChatMessage] {
        self.current().map(|s| s.messages.as_slice()).unwrap_or(&[])
    }

    /// New empty session placed first and made current.
    pub async fn create_session(&mut self) -> String {
        let session = ChatSession::new();
        let id = session.id.clone();
        self.sessions.insert(0, session);
        self.current_id = Some(id.clone());
        self.persist().await;
        id
    }

    /// Replace the current session's messages, creating a session first
    /// when none is selected.
    pub async fn set_messages(&mut self, messages: Vec<ChatMessage>) {
        if self.current().is_none() {
            self.create_session().await;
        }
        if let Some(session) = self.current_mut() {
            session.set_messages(messages);
        }
        self.persist().await;
    }

    /// Append to the current session in one write.
    pub async fn append_messages(&mut self, new: impl IntoIterator<Item = ChatMessage>) {
        let mut messages = self.messages().to_vec();
        messages.extend(new);
        self.set_messages(messages).await;
    }

    pub async fn append_message(&mut self, message: ChatMessage) {
        self.append_messages([message]).await;
    }

    pub fn switch_session(&mut self, id: &str) -> Result<()> {
        if !self.sessions.iter().any(|s| s.id == id) {
            return Err(PecError::SessionNotFound(id.to_string()));
        }
        self.current_id = Some(id.to_string());
        Ok(())
    }

    /// Remove a session. Deleting the current one selects the first
    /// remaining session, if any.
    pub async fn delete_session(&mut self, id: &str) -> Result<()> {
        let before = self.sessions.len();
        self.sessions.retain(|s| s.id != id);
        if self.sessions.len() == before {
            return Err(PecError::SessionNotFound(id.to_string()));
        }
        if self.current_id.as_deref() == Some(id) {
            self.current_id = self.sessions.first().map(|s| s.id.clone());
        }
        self.persist().await;
        Ok(())
    }

    /// Drop every session and the stored blob.
    pub async fn clear_all(&mut self) {
        self.sessions.clear();
        self.current_id = None;
        if let Err(e) = self.storage.delete(&self.key).await {
            log::error!("[sessions] clear failed: {}", e);
        }
    }

    pub fn grouped(&self, now: DateTime<Utc>) -> SessionGroups {
        SessionGroups::from_sessions(&self.sessions, now)
    }
}
