//! Port traits: the hexagonal architecture boundary.
//!
//! These traits are defined here in `pec-core` (pure Rust).
//! Implementations live in `pec-platform` (browser adapters).
//! The core never imports platform code; it only depends on these traits.

use std::pin::Pin;
use async_trait::async_trait;
use futures::Stream;
use pec_types::{
    Result,
    config::ChatMode,
    document::PaginatedDocument,
    message::ChatMessage,
};

// ─── Chat Port ───────────────────────────────────────────────

/// Incremental event from a streamed chat reply
#[derive(Debug, Clone, PartialEq)]
pub enum ChatStreamEvent {
    /// Text on the separate reasoning channel
    ReasoningDelta(String),
    /// Visible reply text
    ContentDelta(String),
    /// Stream finished
    Done,
    /// Error during streaming
    Error(String),
}

/// Request sent to the chat transport
#[derive(Debug, Clone)]
pub struct ChatRequest {
    /// Conversation so far, ending with the new user message
    pub messages: Vec<ChatMessage>,
    pub mode: ChatMode,
    /// Fully assembled system prompt for `mode`
    pub system_prompt: String,
    /// Design summary handed over in Q&A mode
    pub design_context: Option<String>,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[async_trait(?Send)]
pub trait ChatPort {
    /// Single completion returning the raw reply text
    async fn complete(&self, req: ChatRequest) -> Result<String>;

    /// Streaming completion: reasoning-delta*, content-delta*, then done or error
    fn stream(
        &self,
        req: ChatRequest,
    ) -> Pin<Box<dyn Stream<Item = ChatStreamEvent>>>;
}

// ─── Storage Port ────────────────────────────────────────────

#[async_trait(?Send)]
pub trait StoragePort {
    /// Get a value by key
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Set a value
    async fn set(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Delete a value
    async fn delete(&self, key: &str) -> Result<()>;

    /// List keys with a given prefix
    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>>;

    /// Check if a key exists
    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.get(key).await?.is_some())
    }

    /// Name of this backend (for logging/debug)
    fn backend_name(&self) -> &str;
}

// ─── Document Renderer Port ──────────────────────────────────

#[async_trait(?Send)]
pub trait DocumentRenderer {
    /// Make the layout capability available, loading it on first use.
    /// Fails with `PecError::RenderingUnavailable`.
    async fn ensure_loaded(&self) -> Result<()>;

    /// Turn draw instructions into file bytes
    fn render(&self, doc: &PaginatedDocument) -> Result<Vec<u8>>;

    fn backend_name(&self) -> &str;
}
