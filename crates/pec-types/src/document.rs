//! Renderer-agnostic paginated documents and export descriptors.
//!
//! Coordinates are millimetres on an A4 portrait page with the origin at
//! the top-left corner; text `y` is the baseline.

use serde::{Deserialize, Serialize};

pub const PAGE_WIDTH_MM: f64 = 210.0;
pub const PAGE_HEIGHT_MM: f64 = 297.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const fn gray(level: u8) -> Self {
        Rgb(level, level, level)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    Left,
    Center,
    Right,
}

/// One positioned drawing instruction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawOp {
    Text {
        x: f64,
        y: f64,
        text: String,
        size: f64,
        color: Rgb,
        align: Align,
    },
    Line {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        color: Rgb,
        width: f64,
    },
    /// Filled rounded rectangle, used for KPI boxes
    RoundedRect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        radius: f64,
        fill: Rgb,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub ops: Vec<DrawOp>,
}

impl Page {
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginatedDocument {
    pub title: String,
    pub pages: Vec<Page>,
}

impl PaginatedDocument {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Every text run in draw order, across all pages
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.pages.iter().flat_map(|p| p.texts())
    }

    pub fn contains_text(&self, needle: &str) -> bool {
        self.texts().any(|t| t.contains(needle))
    }
}

/// Downloadable artifacts offered once a design is generated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReportKind {
    Bom,
    DesignReport,
    SemiconductorReport,
    InductorReport,
    CapacitorReport,
}

impl ReportKind {
    /// Order used by "download all"
    pub fn all() -> &'static [ReportKind] {
        &[
            ReportKind::DesignReport,
            ReportKind::Bom,
            ReportKind::SemiconductorReport,
            ReportKind::InductorReport,
            ReportKind::CapacitorReport,
        ]
    }

    pub fn file_name(&self, product: &str) -> String {
        let stem = match self {
            ReportKind::Bom => "物料清单(BOM).csv",
            ReportKind::DesignReport => "设计报告.pdf",
            ReportKind::SemiconductorReport => "半导体选型与热分析.pdf",
            ReportKind::InductorReport => "磁性元件设计报告.pdf",
            ReportKind::CapacitorReport => "电容选型报告.pdf",
        };
        format!("{}_{}", product, stem)
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ReportKind::Bom => "text/csv;charset=utf-8",
            _ => "application/pdf",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ReportKind::Bom => "物料清单 (BOM)",
            ReportKind::DesignReport => "设计报告",
            ReportKind::SemiconductorReport => "半导体选型与热分析",
            ReportKind::InductorReport => "磁性元件设计报告",
            ReportKind::CapacitorReport => "电容选型报告",
        }
    }

    pub fn is_document(&self) -> bool {
        !matches!(self, ReportKind::Bom)
    }
}

/// A rendered artifact ready to hand to the browser
#[derive(Debug, Clone, PartialEq)]
pub struct ExportedFile {
    pub kind: ReportKind,
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}
