//! Cursor-based builder for paginated draw-instruction documents.

use pec_types::document::{Align, DrawOp, Page, PaginatedDocument, Rgb, PAGE_HEIGHT_MM, PAGE_WIDTH_MM};

pub const TITLE_COLOR: Rgb = Rgb(91, 95, 199);
pub const HEADING_COLOR: Rgb = Rgb(47, 84, 235);
pub const PASS_COLOR: Rgb = Rgb(34, 139, 34);
pub const BODY_COLOR: Rgb = Rgb::gray(80);
pub const LEAD_COLOR: Rgb = Rgb::gray(60);
pub const MUTED_COLOR: Rgb = Rgb::gray(100);

pub const MARGIN: f64 = 20.0;
pub const INDENT: f64 = 25.0;
pub const TOP: f64 = 20.0;
pub const LINE_STEP: f64 = 6.0;
const BOTTOM_LIMIT: f64 = PAGE_HEIGHT_MM - 25.0;

pub struct DocumentBuilder {
    title: String,
    pages: Vec<Page>,
    y: f64,
}

impl DocumentBuilder {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            pages: vec![Page::default()],
            y: TOP,
        }
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn advance(&mut self, dy: f64) -> &mut Self {
        self.y += dy;
        if self.y > BOTTOM_LIMIT {
            self.new_page();
        }
        self
    }

    pub fn new_page(&mut self) -> &mut Self {
        self.pages.push(Page::default());
        self.y = TOP;
        self
    }

    fn push(&mut self, op: DrawOp) {
        if let Some(page) = self.pages.last_mut() {
            page.ops.push(op);
        }
    }

    pub fn text_at(&mut self, x: f64, text: impl Into<String>, size: f64, color: Rgb, align: Align) -> &mut Self {
        let y = self.y;
        self.push(DrawOp::Text { x, y, text: text.into(), size, color, align });
        self
    }

    pub fn text(&mut self, x: f64, text: impl Into<String>, size: f64, color: Rgb) -> &mut Self {
        self.text_at(x, text, size, color, Align::Left)
    }

    pub fn centered(&mut self, text: impl Into<String>, size: f64, color: Rgb) -> &mut Self {
        self.text_at(PAGE_WIDTH_MM / 2.0, text, size, color, Align::Center)
    }

    /// Title, subtitle and divider shared by every report
    pub fn banner(&mut self, title: &str, title_size: f64, subtitle: &str) -> &mut Self {
        self.centered(title, title_size, TITLE_COLOR);
        self.advance(8.0);
        self.centered(subtitle, 10.0, MUTED_COLOR);
        self.advance(15.0);
        self.divider();
        self
    }

    pub fn divider(&mut self) -> &mut Self {
        let y = self.y;
        self.push(DrawOp::Line {
            x1: MARGIN,
            y1: y,
            x2: PAGE_WIDTH_MM - MARGIN,
            y2: y,
            color: TITLE_COLOR,
            width: 0.5,
        });
        self
    }

    pub fn heading(&mut self, text: impl Into<String>) -> &mut Self {
        self.text(MARGIN, text, 14.0, HEADING_COLOR)
    }

    pub fn subheading(&mut self, text: impl Into<String>) -> &mut Self {
        self.text(MARGIN, text, 12.0, HEADING_COLOR)
    }

    /// One body line per entry, each followed by `step`
    pub fn lines<I, S>(&mut self, lines: I, color: Rgb, step: f64) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for line in lines {
            self.text(INDENT, line, 10.0, color);
            self.advance(step);
        }
        self
    }

    /// Filled box with a caption and a value centred inside
    pub fn kpi_box(&mut self, x: f64, width: f64, fill: Rgb, caption: &str, value: String, value_color: Rgb) -> &mut Self {
        let y = self.y;
        self.push(DrawOp::RoundedRect { x, y, width, height: 25.0, radius: 3.0, fill });
        let cx = x + width / 2.0;
        self.push(DrawOp::Text {
            x: cx,
            y: y + 8.0,
            text: caption.to_string(),
            size: 9.0,
            color: MUTED_COLOR,
            align: Align::Center,
        });
        self.push(DrawOp::Text {
            x: cx,
            y: y + 18.0,
            text: value,
            size: 14.0,
            color: value_color,
            align: Align::Center,
        });
        self
    }

    /// Stamp "Page i of n" and a confidentiality line on every page.
    pub fn footers(&mut self, brand: &str) -> &mut Self {
        let total = self.pages.len();
        let y = PAGE_HEIGHT_MM - 10.0;
        for (i, page) in self.pages.iter_mut().enumerate() {
            page.ops.push(DrawOp::Text {
                x: PAGE_WIDTH_MM / 2.0,
                y,
                text: format!("Page {} of {}", i + 1, total),
                size: 8.0,
                color: Rgb::gray(150),
                align: Align::Center,
            });
            page.ops.push(DrawOp::Text {
                x: PAGE_WIDTH_MM - MARGIN,
                y,
                text: format!("Generated by {} | Confidential", brand),
                size: 8.0,
                color: Rgb::gray(150),
                align: Align::Right,
            });
        }
        self
    }

    pub fn finish(self) -> PaginatedDocument {
        PaginatedDocument {
            title: self.title,
            pages: self.pages,
        }
    }
}

/// Plain number display: integers without a fraction, otherwise up to
/// three decimals with trailing zeros trimmed.
pub fn num(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        return format!("{}", value as i64);
    }
    let s = format!("{:.3}", value);
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

pub fn micro_henry(henry: f64) -> String {
    format!("{} µH", num(henry * 1e6))
}
