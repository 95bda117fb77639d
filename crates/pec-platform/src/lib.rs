//! Browser adapters for the pec-core ports.
//!
//! Everything here talks to `window`: fetch for the chat transport,
//! `localStorage` for history, a lazily injected jsPDF script for
//! documents, and object URLs for downloads. The pure pieces (SSE
//! decoding, draw-call planning) are kept separate so they test natively.

pub mod download;
pub mod llm;
pub mod render;
pub mod storage;


use pec_types::PecError;
use wasm_bindgen::JsValue;

/// Convert a thrown JS value into the interop error variant.
pub(crate) fn js_err(value: JsValue) -> PecError {
    PecError::JsInterop(value.as_string().unwrap_or_else(|| format!("{:?}", value)))
}
