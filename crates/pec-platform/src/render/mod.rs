pub mod jspdf;
pub mod plan;

pub use jspdf::JsPdfRenderer;
pub use plan::{pdf_calls, PdfArg, PdfCall};
