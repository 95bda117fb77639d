//! Chat panel: displays the conversation, the streaming reply, the error
//! banner and the input field.

use egui::{self, Align, Layout, RichText, ScrollArea, Vec2};
use pec_types::message::Role;
use crate::state::{ChatEntry, UiState};
use crate::theme::*;

/// What the user asked for this frame
#[derive(Debug, Clone, PartialEq)]
pub enum ChatAction {
    Send(String),
    Retry,
    Stop,
}

/// Render the chat panel. Returns an action when the user submits input,
/// asks for a retry or stops the reply in flight.
pub fn chat_panel(ui: &mut egui::Ui, state: &mut UiState) -> Option<ChatAction> {
    let mut action = None;

    egui::Frame::default()
        .fill(BG_PRIMARY)
        .inner_margin(PANEL_PADDING)
        .show(ui, |ui| {
            ui.vertical(|ui| {
                // Header
                ui.horizontal(|ui| {
                    ui.heading(RichText::new("设计助手").color(TEXT_PRIMARY).strong());
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        let status_color = if state.is_busy() {
                            WARNING
                        } else if state.error.is_some() {
                            ERROR
                        } else {
                            SUCCESS
                        };
                        ui.label(RichText::new(&state.status_text).color(status_color).small());
                    });
                });

                ui.separator();

                let available_height = ui.available_height() - 96.0;
                ScrollArea::vertical()
                    .max_height(available_height)
                    .auto_shrink([false, false])
                    .stick_to_bottom(true)
                    .show(ui, |ui| {
                        if state.messages.is_empty() && state.pending_user.is_none() {
                            welcome(ui);
                        }
                        for (idx, entry) in state.messages.iter().enumerate() {
                            render_message(ui, idx, entry);
                            ui.add_space(4.0);
                        }
                        if let Some(text) = &state.pending_user {
                            bubble(ui, "您", ACCENT, USER_BUBBLE, text);
                            ui.add_space(4.0);
                        }
                        if state.is_busy() {
                            render_streaming(ui, state);
                        }
                        if let Some(err) = state.error.clone() {
                            if let Some(a) = error_banner(ui, &err.message, err.retryable) {
                                match a {
                                    BannerAction::Retry => action = Some(ChatAction::Retry),
                                    BannerAction::Dismiss => state.dismiss_error(),
                                }
                            }
                        }
                    });

                ui.add_space(4.0);

                if !state.is_busy() && !state.suggestions.is_empty() {
                    ui.horizontal_wrapped(|ui| {
                        for suggestion in &state.suggestions {
                            if ui.small_button(suggestion).clicked() {
                                state.input_text = suggestion.clone();
                            }
                        }
                    });
                }

                ui.add_space(4.0);

                // Input area
                ui.horizontal(|ui| {
                    let input = egui::TextEdit::singleline(&mut state.input_text)
                        .hint_text("描述您的电源设计需求，例如：48V转12V，500W的Buck电源")
                        .desired_width(ui.available_width() - 70.0)
                        .font(egui::FontId::proportional(14.0));

                    let response = ui.add(input);

                    if state.is_busy() {
                        let stop = ui.add(
                            egui::Button::new(RichText::new("停止").color(BG_SECONDARY))
                                .fill(ERROR)
                                .corner_radius(PANEL_ROUNDING)
                                .min_size(Vec2::new(60.0, 0.0)),
                        );
                        if stop.clicked() {
                            action = Some(ChatAction::Stop);
                        }
                        return;
                    }

                    let send_enabled = !state.input_text.trim().is_empty();
                    let send_btn = ui.add_enabled(
                        send_enabled,
                        egui::Button::new(RichText::new("发送").color(BG_SECONDARY))
                            .fill(if send_enabled { ACCENT } else { BG_SURFACE })
                            .corner_radius(PANEL_ROUNDING)
                            .min_size(Vec2::new(60.0, 0.0)),
                    );

                    // Submit on Enter or button click
                    if send_enabled
                        && ((response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)))
                            || send_btn.clicked())
                    {
                        let text = state.input_text.trim().to_string();
                        action = Some(ChatAction::Send(text));
                        state.input_text.clear();
                        response.request_focus();
                    }
                });
            });
        });

    action
}

fn welcome(ui: &mut egui::Ui) {
    ui.add_space(24.0);
    ui.vertical_centered(|ui| {
        ui.label(RichText::new("PEC-AI 电力电子设计助手").color(ACCENT).size(20.0).strong());
        ui.label(
            RichText::new("告诉我输入电压、输出电压、功率和拓扑，我会帮您确认参数并生成设计方案。")
                .color(TEXT_SECONDARY),
        );
    });
}

fn render_message(ui: &mut egui::Ui, idx: usize, entry: &ChatEntry) {
    match entry.role {
        Role::User => bubble(ui, "您", ACCENT, USER_BUBBLE, &entry.content),
        Role::Assistant => {
            if let Some(reasoning) = &entry.reasoning {
                let header = match entry.thinking_secs {
                    Some(secs) => format!("已深度思考（用时 {} 秒）", secs),
                    None => "已深度思考".to_string(),
                };
                egui::CollapsingHeader::new(RichText::new(header).color(TEXT_SECONDARY).small())
                    .id_salt(("reasoning", idx))
                    .default_open(false)
                    .show(ui, |ui| {
                        ui.label(RichText::new(reasoning).color(TEXT_SECONDARY).small());
                    });
            }
            bubble(ui, "PEC-AI", SUCCESS, BG_SECONDARY, &entry.content);
        }
        Role::System => bubble(ui, "系统", TEXT_SECONDARY, BG_SURFACE, &entry.content),
    }
}

fn render_streaming(ui: &mut egui::Ui, state: &UiState) {
    egui::Frame::default()
        .fill(BG_SECONDARY)
        .corner_radius(PANEL_ROUNDING)
        .inner_margin(8.0)
        .show(ui, |ui| {
            ui.label(RichText::new("PEC-AI").color(SUCCESS).strong().small());
            if !state.streaming_reasoning.is_empty() {
                egui::Frame::default()
                    .fill(REASONING_BG)
                    .corner_radius(PANEL_ROUNDING)
                    .inner_margin(6.0)
                    .show(ui, |ui| {
                        ui.label(
                            RichText::new(&state.streaming_reasoning)
                                .color(TEXT_SECONDARY)
                                .small(),
                        );
                    });
            }
            if !state.streaming_text.is_empty() {
                ui.label(RichText::new(&state.streaming_text).color(TEXT_PRIMARY));
            }
            ui.label(RichText::new("▌").color(ACCENT).strong());
        });
}

fn bubble(ui: &mut egui::Ui, label: &str, label_color: egui::Color32, bg: egui::Color32, text: &str) {
    egui::Frame::default()
        .fill(bg)
        .corner_radius(PANEL_ROUNDING)
        .inner_margin(8.0)
        .show(ui, |ui| {
            ui.label(RichText::new(label).color(label_color).strong().small());
            ui.label(RichText::new(text).color(TEXT_PRIMARY));
        });
}

enum BannerAction {
    Retry,
    Dismiss,
}

fn error_banner(ui: &mut egui::Ui, message: &str, retryable: bool) -> Option<BannerAction> {
    let mut action = None;
    egui::Frame::default()
        .fill(ERROR_BG)
        .corner_radius(PANEL_ROUNDING)
        .inner_margin(8.0)
        .show(ui, |ui| {
            ui.horizontal_wrapped(|ui| {
                ui.label(RichText::new(format!("请求失败：{}", message)).color(ERROR));
                if retryable && ui.button("重试").clicked() {
                    action = Some(BannerAction::Retry);
                }
                if ui.small_button("✕").clicked() {
                    action = Some(BannerAction::Dismiss);
                }
            });
        });
    action
}
