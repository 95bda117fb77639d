//! jsPDF-backed document renderer.
//!
//! The library is not bundled. On first use a `<script>` tag pointing at
//! the CDN build is injected and awaited; a failed load is reported as
//! `RenderingUnavailable` and the next export tries again.

use std::cell::Cell;
use async_trait::async_trait;
use js_sys::{Array, Function, Object, Promise, Reflect, Uint8Array};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

use pec_core::ports::DocumentRenderer;
use pec_types::{PecError, Result, document::PaginatedDocument};
use crate::js_err;
use super::plan::{pdf_calls, PdfArg};

pub const JSPDF_CDN_URL: &str = "https://cdnjs.cloudflare.com/ajax/libs/jspdf/2.5.1/jspdf.umd.min.js";

pub struct JsPdfRenderer {
    script_url: String,
    loaded: Cell<bool>,
}

impl Default for JsPdfRenderer {
    fn default() -> Self {
        Self::new(JSPDF_CDN_URL)
    }
}

fn unavailable(msg: impl Into<String>) -> PecError {
    PecError::RenderingUnavailable(msg.into())
}

fn window() -> Result<web_sys::Window> {
    web_sys::window().ok_or_else(|| unavailable("No window object"))
}

/// `window.jspdf.jsPDF`, when the UMD bundle has run
fn constructor() -> Option<Function> {
    let window = web_sys::window()?;
    let ns = Reflect::get(&window, &JsValue::from_str("jspdf")).ok()?;
    if ns.is_undefined() || ns.is_null() {
        return None;
    }
    Reflect::get(&ns, &JsValue::from_str("jsPDF")).ok()?.dyn_into().ok()
}

impl JsPdfRenderer {
    pub fn new(script_url: impl Into<String>) -> Self {
        Self {
            script_url: script_url.into(),
            loaded: Cell::new(false),
        }
    }

    async fn inject_script(&self) -> Result<()> {
        let document = window()?
            .document()
            .ok_or_else(|| unavailable("No document"))?;
        let script: web_sys::HtmlScriptElement = document
            .create_element("script")
            .map_err(js_err)?
            .dyn_into()
            .map_err(|_| unavailable("script element"))?;
        script.set_src(&self.script_url);

        let script_for_promise = script.clone();
        let promise = Promise::new(&mut move |resolve, reject| {
            let onload = Closure::once(move |_: web_sys::Event| {
                let _ = resolve.call0(&JsValue::NULL);
            });
            let onerror = Closure::once(move |_: web_sys::Event| {
                let _ = reject.call1(&JsValue::NULL, &JsValue::from_str("script failed to load"));
            });
            script_for_promise.set_onload(Some(onload.as_ref().unchecked_ref()));
            script_for_promise.set_onerror(Some(onerror.as_ref().unchecked_ref()));
            onload.forget();
            onerror.forget();
        });

        let head = document.head().ok_or_else(|| unavailable("No document head"))?;
        head.append_child(&script).map_err(js_err)?;

        if let Err(e) = JsFuture::from(promise).await {
            // Drop the dead tag so a retry injects a fresh one.
            script.remove();
            return Err(unavailable(format!("{} ({:?})", self.script_url, e)));
        }
        Ok(())
    }
}

fn invoke(target: &JsValue, method: &str, args: &[PdfArg]) -> Result<JsValue> {
    let f: Function = Reflect::get(target, &JsValue::from_str(method))
        .map_err(js_err)?
        .dyn_into()
        .map_err(|_| PecError::JsInterop(format!("jsPDF has no method {}", method)))?;
    let js_args = Array::new();
    for arg in args {
        let value = match arg {
            PdfArg::Num(n) => JsValue::from_f64(*n),
            PdfArg::Str(s) => JsValue::from_str(s),
            PdfArg::Align(a) => {
                let options = Object::new();
                Reflect::set(&options, &JsValue::from_str("align"), &JsValue::from_str(a))
                    .map_err(js_err)?;
                options.into()
            }
        };
        js_args.push(&value);
    }
    f.apply(target, &js_args).map_err(js_err)
}

#[async_trait(?Send)]
impl DocumentRenderer for JsPdfRenderer {
    async fn ensure_loaded(&self) -> Result<()> {
        if self.loaded.get() || constructor().is_some() {
            self.loaded.set(true);
            return Ok(());
        }
        log::info!("[render] loading jsPDF from {}", self.script_url);
        self.inject_script().await?;
        if constructor().is_none() {
            return Err(unavailable("jsPDF loaded but window.jspdf.jsPDF is missing"));
        }
        self.loaded.set(true);
        Ok(())
    }

    fn render(&self, doc: &PaginatedDocument) -> Result<Vec<u8>> {
        let ctor = constructor().ok_or_else(|| unavailable("jsPDF not loaded"))?;
        let pdf = Reflect::construct(&ctor, &Array::new()).map_err(js_err)?;

        for call in pdf_calls(doc) {
            invoke(&pdf, call.method, &call.args)?;
        }
        let buffer = invoke(&pdf, "output", &[PdfArg::Str("arraybuffer".to_string())])?;
        let bytes = Uint8Array::new(&buffer).to_vec();
        log::debug!("[render] {} → {} bytes over {} page(s)", doc.title, bytes.len(), doc.page_count());
        Ok(bytes)
    }

    fn backend_name(&self) -> &str {
        "jspdf"
    }
}
