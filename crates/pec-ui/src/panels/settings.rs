//! Settings panel: chat transport and history storage.
//!
//! Edits apply to the live config right away so the transport can be
//! rebuilt. Persisting them is a separate, explicit Save.

use egui::{self, RichText, Vec2};
use pec_types::config::{AppConfig, LlmProvider, StorageBackendType};
use crate::theme::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsAction {
    None,
    /// A field was edited; the transport should be rebuilt
    Changed,
    SaveClicked,
    ClearHistory,
}

#[derive(Clone)]
pub struct SaveFeedback {
    pub message: String,
    pub success: bool,
}

/// History backends offered in the picker, with their explanations
const STORAGE_CHOICES: [(StorageBackendType, &str, &str); 3] = [
    (
        StorageBackendType::Auto,
        "自动",
        "优先使用浏览器本地存储，不可用时退回内存。刷新页面后生效。",
    ),
    (
        StorageBackendType::LocalStorage,
        "浏览器本地存储",
        "历史记录保存在浏览器中，刷新和重启后仍然保留。",
    ),
    (
        StorageBackendType::Memory,
        "内存",
        "不持久，刷新页面后历史记录丢失。",
    ),
];

pub fn storage_label(backend: &StorageBackendType) -> &'static str {
    STORAGE_CHOICES
        .iter()
        .find(|(b, _, _)| b == backend)
        .map_or("", |(_, label, _)| *label)
}

fn storage_description(backend: &StorageBackendType) -> &'static str {
    STORAGE_CHOICES
        .iter()
        .find(|(b, _, _)| b == backend)
        .map_or("", |(_, _, description)| *description)
}

/// Problems that will make the next chat request fail
pub fn config_issues(config: &AppConfig) -> Vec<&'static str> {
    let mut issues = Vec::new();
    if config.llm.api_key.trim().is_empty() {
        issues.push("尚未填写 API Key，消息将无法发送");
    }
    if config.llm.model.trim().is_empty() {
        issues.push("模型名称为空");
    }
    let custom_without_url = config.llm.provider == LlmProvider::Custom
        && config.llm.api_base.as_deref().map_or(true, |u| u.trim().is_empty());
    if custom_without_url {
        issues.push("自定义服务商需要填写 API 地址");
    }
    issues
}

/// Clearing history outranks saving, which outranks a plain edit.
pub fn resolve_action(changed: bool, save_clicked: bool, clear_clicked: bool) -> SettingsAction {
    if clear_clicked {
        SettingsAction::ClearHistory
    } else if save_clicked {
        SettingsAction::SaveClicked
    } else if changed {
        SettingsAction::Changed
    } else {
        SettingsAction::None
    }
}

pub fn settings_panel(
    ui: &mut egui::Ui,
    config: &mut AppConfig,
    save_feedback: Option<&SaveFeedback>,
) -> SettingsAction {
    let mut changed = false;
    let mut save_clicked = false;
    let mut clear_clicked = false;

    egui::Frame::default()
        .fill(BG_SECONDARY)
        .inner_margin(PANEL_PADDING)
        .corner_radius(PANEL_ROUNDING)
        .show(ui, |ui| {
            ui.heading(RichText::new("设置").color(TEXT_PRIMARY));
            ui.separator();

            changed |= transport_section(ui, config);
            for issue in config_issues(config) {
                ui.label(RichText::new(issue).color(ERROR).small());
            }

            ui.add_space(8.0);
            ui.separator();
            let (storage_changed, clear) = history_section(ui, config);
            changed |= storage_changed;
            clear_clicked = clear;

            ui.add_space(8.0);
            ui.separator();
            ui.horizontal(|ui| {
                save_clicked = ui
                    .add(
                        egui::Button::new(RichText::new("保存设置").color(BG_SECONDARY).strong())
                            .fill(ACCENT)
                            .corner_radius(PANEL_ROUNDING)
                            .min_size(Vec2::new(120.0, 28.0)),
                    )
                    .clicked();
                if let Some(fb) = save_feedback {
                    let color = if fb.success { SUCCESS } else { ERROR };
                    ui.label(RichText::new(&fb.message).color(color).small());
                }
            });
        });

    resolve_action(changed, save_clicked, clear_clicked)
}

fn field_label(ui: &mut egui::Ui, text: &str) {
    ui.label(RichText::new(text).color(TEXT_SECONDARY).small());
}

/// Provider, model, key and endpoint, with sampling under a collapsible
/// header. Returns whether anything was edited.
fn transport_section(ui: &mut egui::Ui, config: &mut AppConfig) -> bool {
    let llm = &mut config.llm;
    let mut changed = false;

    ui.label(RichText::new("对话模型").color(ACCENT).strong());

    field_label(ui, "服务商");
    egui::ComboBox::from_id_salt("llm_provider")
        .selected_text(llm.provider.label())
        .show_ui(ui, |ui| {
            for p in LlmProvider::all() {
                changed |= ui
                    .selectable_value(&mut llm.provider, p.clone(), p.label())
                    .changed();
            }
        });

    field_label(ui, "模型");
    changed |= ui.text_edit_singleline(&mut llm.model).changed();

    field_label(ui, "API Key");
    changed |= ui
        .add(egui::TextEdit::singleline(&mut llm.api_key).password(true))
        .changed();

    field_label(ui, "API 地址（可选）");
    let mut base_url = llm.api_base.clone().unwrap_or_default();
    if ui
        .add(egui::TextEdit::singleline(&mut base_url).hint_text(llm.provider.default_base_url()))
        .changed()
    {
        llm.api_base = Some(base_url).filter(|u| !u.trim().is_empty());
        changed = true;
    }

    changed |= ui.checkbox(&mut llm.stream, "流式输出（显示思考过程）").changed();

    egui::CollapsingHeader::new("生成参数")
        .id_salt("sampling")
        .show(ui, |ui| {
            changed |= ui
                .add(egui::Slider::new(&mut llm.temperature, 0.0..=2.0).text("temperature"))
                .changed();
            changed |= ui
                .add(egui::Slider::new(&mut llm.max_tokens, 256..=32768).text("max tokens"))
                .changed();
        });

    changed
}

/// Returns (backend changed, clear requested).
fn history_section(ui: &mut egui::Ui, config: &mut AppConfig) -> (bool, bool) {
    let mut changed = false;

    ui.label(RichText::new("对话历史").color(ACCENT).strong());
    egui::ComboBox::from_id_salt("storage_backend")
        .selected_text(storage_label(&config.storage.backend))
        .show_ui(ui, |ui| {
            for (backend, label, _) in STORAGE_CHOICES {
                changed |= ui
                    .selectable_value(&mut config.storage.backend, backend, label)
                    .changed();
            }
        });
    ui.label(
        RichText::new(storage_description(&config.storage.backend))
            .color(TEXT_SECONDARY)
            .small()
            .italics(),
    );

    let clear = ui
        .add(egui::Button::new(RichText::new("清空全部历史").color(ERROR)))
        .clicked();
    (changed, clear)
}
