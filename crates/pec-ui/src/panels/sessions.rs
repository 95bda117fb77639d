//! Session sidebar: history grouped by recency with new/switch/delete.

use egui::{self, RichText, ScrollArea, Vec2};
use pec_types::session::SessionSummary;
use crate::state::UiState;
use crate::theme::*;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    NewChat,
    Switch(String),
    Delete(String),
}

pub fn sessions_panel(ui: &mut egui::Ui, state: &UiState) -> Option<SessionAction> {
    let mut action = None;
    let busy = state.is_busy();

    egui::Frame::default()
        .fill(BG_SIDEBAR)
        .inner_margin(PANEL_PADDING)
        .show(ui, |ui| {
            let new_btn = ui.add_enabled(
                !busy,
                egui::Button::new(RichText::new("＋ 新对话").color(BG_SECONDARY).strong())
                    .fill(ACCENT)
                    .corner_radius(PANEL_ROUNDING)
                    .min_size(Vec2::new(ui.available_width(), 32.0)),
            );
            if new_btn.clicked() {
                action = Some(SessionAction::NewChat);
            }

            ui.add_space(8.0);

            if state.sessions.is_empty() {
                ui.label(RichText::new("暂无历史对话").color(TEXT_SECONDARY).small());
                return;
            }

            ScrollArea::vertical().auto_shrink([false, false]).show(ui, |ui| {
                let groups = [
                    ("7 天内", &state.sessions.within_7_days),
                    ("30 天内", &state.sessions.within_30_days),
                    ("更早", &state.sessions.older),
                ];
                for (heading, sessions) in groups {
                    if sessions.is_empty() {
                        continue;
                    }
                    ui.label(RichText::new(heading).color(TEXT_SECONDARY).small().strong());
                    for session in sessions {
                        let current = state.current_session.as_deref() == Some(session.id.as_str());
                        if let Some(a) = session_row(ui, session, current, busy) {
                            action = Some(a);
                        }
                    }
                    ui.add_space(6.0);
                }
            });
        });

    action
}

fn session_row(
    ui: &mut egui::Ui,
    session: &SessionSummary,
    current: bool,
    busy: bool,
) -> Option<SessionAction> {
    let mut action = None;
    ui.horizontal(|ui| {
        let title = RichText::new(&session.title).color(if current { ACCENT } else { TEXT_PRIMARY });
        let row = ui.add_enabled_ui(!busy, |ui| ui.selectable_label(current, title)).inner;
        if row.clicked() && !current {
            action = Some(SessionAction::Switch(session.id.clone()));
        }
        // The current session cannot be deleted mid-turn
        let can_delete = !(busy && current);
        if ui
            .add_enabled(can_delete, egui::Button::new(RichText::new("🗑").small()).frame(false))
            .on_hover_text("删除对话")
            .clicked()
        {
            action = Some(SessionAction::Delete(session.id.clone()));
        }
    });
    action
}
