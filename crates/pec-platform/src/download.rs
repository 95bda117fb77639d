//! Save exported files through the browser's download mechanism.

use std::time::Duration;
use gloo_timers::future::sleep;
use js_sys::{Array, Uint8Array};
use wasm_bindgen::JsCast;
use web_sys::{Blob, BlobPropertyBag, HtmlAnchorElement, Url};

use pec_types::{PecError, Result, document::ExportedFile};
use crate::js_err;

/// Pause between files of a download-all so the browser does not drop any.
pub const DOWNLOAD_SPACING: Duration = Duration::from_millis(300);

/// Hand one file to the browser as an attachment.
pub fn download_file(file: &ExportedFile) -> Result<()> {
    let window = web_sys::window().ok_or_else(|| PecError::JsInterop("No window object".to_string()))?;
    let document = window
        .document()
        .ok_or_else(|| PecError::JsInterop("No document".to_string()))?;
    let body = document
        .body()
        .ok_or_else(|| PecError::JsInterop("No document body".to_string()))?;

    let parts = Array::new();
    parts.push(&Uint8Array::from(file.bytes.as_slice()));
    let options = BlobPropertyBag::new();
    options.set_type(&file.mime_type);
    let blob = Blob::new_with_u8_array_sequence_and_options(&parts, &options).map_err(js_err)?;
    let url = Url::create_object_url_with_blob(&blob).map_err(js_err)?;

    let anchor: HtmlAnchorElement = document
        .create_element("a")
        .map_err(js_err)?
        .dyn_into()
        .map_err(|_| PecError::JsInterop("anchor element".to_string()))?;
    anchor.set_href(&url);
    anchor.set_download(&file.file_name);
    body.append_child(&anchor).map_err(js_err)?;
    anchor.click();
    anchor.remove();
    Url::revoke_object_url(&url).map_err(js_err)?;

    log::info!("[download] {} ({} bytes)", file.file_name, file.bytes.len());
    Ok(())
}

/// Download files one after another with [`DOWNLOAD_SPACING`] between them.
/// Stops at the first failure.
pub async fn download_all(files: &[ExportedFile]) -> Result<()> {
    for (i, file) in files.iter().enumerate() {
        if i > 0 {
            sleep(DOWNLOAD_SPACING).await;
        }
        download_file(file)?;
    }
    Ok(())
}
