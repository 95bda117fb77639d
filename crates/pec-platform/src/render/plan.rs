//! Translate draw instructions into jsPDF method calls.
//!
//! Kept free of JS types so the mapping is testable natively; the renderer
//! only replays the plan against a live `jsPDF` object.

use pec_types::document::{Align, DrawOp, PaginatedDocument, Rgb};

#[derive(Debug, Clone, PartialEq)]
pub enum PdfArg {
    Num(f64),
    Str(String),
    /// `{ align: "..." }` options object
    Align(&'static str),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PdfCall {
    pub method: &'static str,
    pub args: Vec<PdfArg>,
}

fn call(method: &'static str, args: Vec<PdfArg>) -> PdfCall {
    PdfCall { method, args }
}

fn rgb(c: Rgb) -> Vec<PdfArg> {
    vec![
        PdfArg::Num(c.0 as f64),
        PdfArg::Num(c.1 as f64),
        PdfArg::Num(c.2 as f64),
    ]
}

fn align_name(align: Align) -> &'static str {
    match align {
        Align::Left => "left",
        Align::Center => "center",
        Align::Right => "right",
    }
}

/// Every page after the first starts with `addPage`.
pub fn pdf_calls(doc: &PaginatedDocument) -> Vec<PdfCall> {
    let mut calls = Vec::new();
    for (i, page) in doc.pages.iter().enumerate() {
        if i > 0 {
            calls.push(call("addPage", Vec::new()));
        }
        for op in &page.ops {
            match op {
                DrawOp::Text { x, y, text, size, color, align } => {
                    calls.push(call("setFontSize", vec![PdfArg::Num(*size)]));
                    calls.push(call("setTextColor", rgb(*color)));
                    let mut args = vec![PdfArg::Str(text.clone()), PdfArg::Num(*x), PdfArg::Num(*y)];
                    if *align != Align::Left {
                        args.push(PdfArg::Align(align_name(*align)));
                    }
                    calls.push(call("text", args));
                }
                DrawOp::Line { x1, y1, x2, y2, color, width } => {
                    calls.push(call("setDrawColor", rgb(*color)));
                    calls.push(call("setLineWidth", vec![PdfArg::Num(*width)]));
                    calls.push(call(
                        "line",
                        vec![PdfArg::Num(*x1), PdfArg::Num(*y1), PdfArg::Num(*x2), PdfArg::Num(*y2)],
                    ));
                }
                DrawOp::RoundedRect { x, y, width, height, radius, fill } => {
                    calls.push(call("setFillColor", rgb(*fill)));
                    calls.push(call(
                        "roundedRect",
                        vec![
                            PdfArg::Num(*x),
                            PdfArg::Num(*y),
                            PdfArg::Num(*width),
                            PdfArg::Num(*height),
                            PdfArg::Num(*radius),
                            PdfArg::Num(*radius),
                            PdfArg::Str("F".to_string()),
                        ],
                    ));
                }
            }
        }
    }
    calls
}
