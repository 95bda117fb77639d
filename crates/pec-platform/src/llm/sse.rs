//! Server-sent-event decoding for chat completion streams.
//!
//! Bytes arrive in arbitrary chunks. Only complete lines are decoded, so a
//! multi-byte character or a `data:` record split across two chunks is
//! reassembled before parsing.

use pec_core::ports::ChatStreamEvent;
use serde::Deserialize;

const DATA_PREFIX: &str = "data:";
const DONE_MARKER: &str = "[DONE]";

#[derive(Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

#[derive(Deserialize)]
struct Chunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
    error: Option<ChunkError>,
}

#[derive(Deserialize)]
struct ChunkChoice {
    delta: Option<Delta>,
}

#[derive(Deserialize)]
struct Delta {
    content: Option<String>,
    reasoning_content: Option<String>,
}

#[derive(Deserialize)]
struct ChunkError {
    message: String,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one network chunk; returns the events completed by it.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<ChatStreamEvent> {
        self.buffer.extend_from_slice(bytes);
        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            events.extend(decode_line(&String::from_utf8_lossy(&line)));
        }
        events
    }

    /// Flush a trailing line that had no newline.
    pub fn finish(&mut self) -> Vec<ChatStreamEvent> {
        let rest = std::mem::take(&mut self.buffer);
        decode_line(&String::from_utf8_lossy(&rest))
    }
}

fn decode_line(line: &str) -> Vec<ChatStreamEvent> {
    let line = line.trim();
    let Some(data) = line.strip_prefix(DATA_PREFIX) else {
        return Vec::new();
    };
    let data = data.trim_start();
    if data == DONE_MARKER {
        return vec![ChatStreamEvent::Done];
    }

    let chunk: Chunk = match serde_json::from_str(data) {
        Ok(chunk) => chunk,
        Err(e) => {
            log::debug!("[sse] skipping unparsable record: {}", e);
            return Vec::new();
        }
    };
    if let Some(err) = chunk.error {
        return vec![ChatStreamEvent::Error(err.message)];
    }

    let mut events = Vec::new();
    for delta in chunk.choices.into_iter().filter_map(|c| c.delta) {
        if let Some(text) = delta.reasoning_content.filter(|t| !t.is_empty()) {
            events.push(ChatStreamEvent::ReasoningDelta(text));
        }
        if let Some(text) = delta.content.filter(|t| !t.is_empty()) {
            events.push(ChatStreamEvent::ContentDelta(text));
        }
    }
    events
}
