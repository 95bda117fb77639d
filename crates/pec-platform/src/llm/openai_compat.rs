//! OpenAI-compatible chat adapter.
//!
//! Works with ModelScope, DeepSeek, OpenAI, and any provider using the
//! OpenAI chat completions API format.
//! Uses browser `fetch()` via gloo-net for WASM compatibility.

use std::collections::VecDeque;
use std::pin::Pin;
use async_trait::async_trait;
use futures::stream::{self, Stream, StreamExt};
use gloo_net::http::Request;
use js_sys::{Reflect, Uint8Array};
use serde::Deserialize;
use serde_json::{json, Value};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::ReadableStreamDefaultReader;

use pec_core::ports::*;
use pec_types::{
    PecError, Result,
    config::LlmConfig,
    message::{ChatMessage, Role},
};
use crate::js_err;
use super::sse::SseDecoder;

/// Provider that speaks the OpenAI chat completions protocol.
#[derive(Clone)]
pub struct OpenAiCompatProvider {
    config: LlmConfig,
    base_url: String,
}

impl OpenAiCompatProvider {
    pub fn new(config: LlmConfig) -> Self {
        let base_url = config
            .api_base
            .clone()
            .filter(|b| !b.trim().is_empty())
            .unwrap_or_else(|| config.provider.default_base_url().to_string());
        Self {
            config,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }

    /// The system prompt goes first, followed by the conversation.
    pub fn build_request_body(&self, req: &ChatRequest, stream: bool) -> Value {
        let mut messages = vec![json!({ "role": "system", "content": req.system_prompt })];
        messages.extend(req.messages.iter().map(message_to_json));

        json!({
            "model": req.model,
            "messages": messages,
            "max_tokens": req.max_tokens,
            "temperature": req.temperature,
            "stream": stream,
        })
    }

    async fn post(&self, body: &Value) -> Result<gloo_net::http::Response> {
        let response = Request::post(&self.endpoint())
            .header("Content-Type", "application/json")
            .header("Authorization", &format!("Bearer {}", self.config.api_key))
            .json(body)
            .map_err(|e| PecError::Network(e.to_string()))?
            .send()
            .await
            .map_err(|e| PecError::Network(e.to_string()))?;

        if !response.ok() {
            let status = response.status();
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(PecError::Llm(format!("HTTP {}: {}", status, text)));
        }
        Ok(response)
    }
}

#[async_trait(?Send)]
impl ChatPort for OpenAiCompatProvider {
    async fn complete(&self, req: ChatRequest) -> Result<String> {
        let body = self.build_request_body(&req, false);
        let response = self.post(&body).await?;

        let data: ApiResponse = response
            .json()
            .await
            .map_err(|e| PecError::Llm(e.to_string()))?;

        let choice = data
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| PecError::Llm("No choices in response".to_string()))?;

        Ok(choice.message.content.unwrap_or_default())
    }

    fn stream(&self, req: ChatRequest) -> Pin<Box<dyn Stream<Item = ChatStreamEvent>>> {
        let body = self.build_request_body(&req, true);
        log::debug!("[llm] streaming {} message(s) to {}", req.messages.len(), self.endpoint());

        let provider = self.clone();
        let opened = stream::once(async move {
            let response = provider.post(&body).await?;
            let body = response
                .body()
                .ok_or_else(|| PecError::Llm("response has no body".to_string()))?;
            body.get_reader()
                .dyn_into::<ReadableStreamDefaultReader>()
                .map_err(|_| PecError::JsInterop("stream reader unavailable".to_string()))
        });

        Box::pin(opened.flat_map(|opened| match opened {
            Ok(reader) => read_events(reader).boxed_local(),
            Err(e) => stream::iter(vec![ChatStreamEvent::Error(e.to_string())]).boxed_local(),
        }))
    }
}

// ─── Stream reading ──────────────────────────────────────────

struct ReadState {
    reader: ReadableStreamDefaultReader,
    decoder: SseDecoder,
    pending: VecDeque<ChatStreamEvent>,
    eof: bool,
}

impl Drop for ReadState {
    /// Dropping the stream (turn cancelled) releases the connection.
    fn drop(&mut self) {
        if !self.eof {
            let _ = self.reader.cancel();
        }
    }
}

fn read_events(reader: ReadableStreamDefaultReader) -> impl Stream<Item = ChatStreamEvent> {
    let state = ReadState {
        reader,
        decoder: SseDecoder::new(),
        pending: VecDeque::new(),
        eof: false,
    };
    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(event) = state.pending.pop_front() {
                return Some((event, state));
            }
            if state.eof {
                return None;
            }
            match read_chunk(&state.reader).await {
                Ok(Some(bytes)) => {
                    let events = state.decoder.push(&bytes);
                    state.pending.extend(events);
                }
                Ok(None) => {
                    state.eof = true;
                    let events = state.decoder.finish();
                    state.pending.extend(events);
                }
                Err(e) => {
                    state.eof = true;
                    state.pending.push_back(ChatStreamEvent::Error(e.to_string()));
                }
            }
        }
    })
}

/// One `reader.read()`; `None` once the body is exhausted.
async fn read_chunk(reader: &ReadableStreamDefaultReader) -> Result<Option<Vec<u8>>> {
    let result = JsFuture::from(reader.read()).await.map_err(js_err)?;
    let done = Reflect::get(&result, &JsValue::from_str("done"))
        .map_err(js_err)?
        .as_bool()
        .unwrap_or(true);
    if done {
        return Ok(None);
    }
    let value = Reflect::get(&result, &JsValue::from_str("value")).map_err(js_err)?;
    Ok(Some(Uint8Array::new(&value).to_vec()))
}

// ─── API response types ──────────────────────────────────────

#[derive(Deserialize)]
struct ApiResponse {
    choices: Vec<ApiChoice>,
}

#[derive(Deserialize)]
struct ApiChoice {
    message: ApiMessage,
}

#[derive(Deserialize)]
struct ApiMessage {
    #[serde(default)]
    content: Option<String>,
}

// ─── Serialization helpers ───────────────────────────────────

fn message_to_json(msg: &ChatMessage) -> Value {
    let role = match msg.role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
    };
    json!({
        "role": role,
        "content": msg.content,
    })
}
