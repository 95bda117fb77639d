//! Download surface: offered once a design has been generated.

use egui::{self, RichText, Vec2};
use pec_types::document::ReportKind;
use crate::state::UiState;
use crate::theme::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadAction {
    One(ReportKind),
    All,
}

pub fn report_label(kind: ReportKind) -> &'static str {
    match kind {
        ReportKind::DesignReport => "设计报告",
        ReportKind::Bom => "物料清单(BOM)",
        ReportKind::SemiconductorReport => "半导体选型与热分析",
        ReportKind::InductorReport => "磁性元件设计报告",
        ReportKind::CapacitorReport => "电容选型报告",
    }
}

pub fn downloads_panel(ui: &mut egui::Ui, state: &UiState) -> Option<DownloadAction> {
    let summary = state.design_summary.as_ref()?;
    let mut action = None;

    egui::Frame::default()
        .fill(BG_SECONDARY)
        .corner_radius(PANEL_ROUNDING)
        .inner_margin(PANEL_PADDING)
        .show(ui, |ui| {
            ui.label(RichText::new("设计方案已生成").color(ACCENT).strong());
            ui.label(RichText::new(summary).color(TEXT_SECONDARY).small());
            ui.add_space(4.0);

            ui.add_enabled_ui(!state.exporting, |ui| {
                ui.horizontal_wrapped(|ui| {
                    for kind in ReportKind::all() {
                        if ui.button(report_label(*kind)).clicked() {
                            action = Some(DownloadAction::One(*kind));
                        }
                    }
                    let all = ui.add(
                        egui::Button::new(RichText::new("全部下载").color(BG_SECONDARY))
                            .fill(ACCENT)
                            .corner_radius(PANEL_ROUNDING)
                            .min_size(Vec2::new(80.0, 0.0)),
                    );
                    if all.clicked() {
                        action = Some(DownloadAction::All);
                    }
                });
            });

            if state.exporting {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.label(RichText::new("正在生成文件...").color(TEXT_SECONDARY).small());
                });
            }
            if let Some(status) = &state.export_status {
                let color = if status.success { SUCCESS } else { ERROR };
                ui.label(RichText::new(&status.message).color(color).small());
            }
        });

    action
}
