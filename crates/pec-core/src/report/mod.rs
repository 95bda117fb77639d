//! Report renderers and export.
//!
//! The CSV bill of materials is plain string construction. The four
//! paginated reports are pure builders producing draw instructions; turning
//! them into files goes through a [`DocumentRenderer`], which may fail with
//! `RenderingUnavailable`.

pub mod bom;
pub mod capacitor;
pub mod design_report;
pub mod inductor;
pub mod layout;
pub mod semiconductor;

use pec_types::{
    Result,
    design::{DesignParameters, DesignResult},
    document::{ExportedFile, PaginatedDocument, ReportKind},
};
use crate::ports::DocumentRenderer;

pub use bom::{bom_bytes, render_bom, BOM_MARKER};
pub use capacitor::capacitor_report;
pub use design_report::design_report;
pub use inductor::inductor_report;
pub use semiconductor::semiconductor_report;

/// Name printed in report titles and footers
pub const BRAND: &str = "PEC-AI";

/// Draw instructions for a paginated report kind; `None` for the BOM.
pub fn build_document(
    kind: ReportKind,
    params: &DesignParameters,
    result: &DesignResult,
) -> Option<PaginatedDocument> {
    match kind {
        ReportKind::Bom => None,
        ReportKind::DesignReport => Some(design_report(params, result)),
        ReportKind::SemiconductorReport => Some(semiconductor_report(params, result)),
        ReportKind::InductorReport => Some(inductor_report(params, result)),
        ReportKind::CapacitorReport => Some(capacitor_report(params, result)),
    }
}

/// Produce one downloadable file.
pub async fn export_report(
    kind: ReportKind,
    product: &str,
    params: &DesignParameters,
    result: &DesignResult,
    renderer: &dyn DocumentRenderer,
) -> Result<ExportedFile> {
    let bytes = match build_document(kind, params, result) {
        None => bom_bytes(params, result),
        Some(doc) => {
            renderer.ensure_loaded().await.map_err(|e| {
                log::warn!("[report] {} unavailable: {}", renderer.backend_name(), e);
                e
            })?;
            renderer.render(&doc)?
        }
    };
    log::info!("[report] exported {:?} ({} bytes)", kind, bytes.len());
    Ok(ExportedFile {
        kind,
        file_name: kind.file_name(product),
        mime_type: kind.mime_type().to_string(),
        bytes,
    })
}

/// Every kind in download order, awaited one after another. Stops at the
/// first failure.
pub async fn export_all(
    product: &str,
    params: &DesignParameters,
    result: &DesignResult,
    renderer: &dyn DocumentRenderer,
) -> Result<Vec<ExportedFile>> {
    let mut files = Vec::with_capacity(ReportKind::all().len());
    for kind in ReportKind::all() {
        files.push(export_report(*kind, product, params, result, renderer).await?);
    }
    Ok(files)
}
