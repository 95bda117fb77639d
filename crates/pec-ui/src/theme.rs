//! UI theme constants

use egui::{Color32, CornerRadius, Stroke, Vec2};

pub const BG_PRIMARY: Color32 = Color32::from_rgb(247, 248, 252);
pub const BG_SECONDARY: Color32 = Color32::from_rgb(255, 255, 255);
pub const BG_SURFACE: Color32 = Color32::from_rgb(236, 238, 246);
pub const BG_SIDEBAR: Color32 = Color32::from_rgb(240, 241, 250);
pub const TEXT_PRIMARY: Color32 = Color32::from_rgb(31, 35, 48);
pub const TEXT_SECONDARY: Color32 = Color32::from_rgb(110, 116, 135);
pub const ACCENT: Color32 = Color32::from_rgb(91, 95, 199);
pub const USER_BUBBLE: Color32 = Color32::from_rgb(225, 227, 250);
pub const REASONING_BG: Color32 = Color32::from_rgb(244, 244, 246);
pub const SUCCESS: Color32 = Color32::from_rgb(34, 139, 34);
pub const ERROR: Color32 = Color32::from_rgb(220, 53, 69);
pub const ERROR_BG: Color32 = Color32::from_rgb(253, 236, 238);
pub const WARNING: Color32 = Color32::from_rgb(217, 119, 6);

pub const PANEL_ROUNDING: CornerRadius = CornerRadius::same(8);
pub const PANEL_PADDING: Vec2 = Vec2::new(12.0, 8.0);

/// Apply the light theme to an egui context
pub fn apply_theme(ctx: &egui::Context) {
    let mut style = (*ctx.style()).clone();

    style.visuals = egui::Visuals::light();
    style.visuals.panel_fill = BG_PRIMARY;
    style.visuals.window_fill = BG_SECONDARY;
    style.visuals.extreme_bg_color = BG_SECONDARY;

    style.visuals.widgets.inactive.bg_fill = BG_SURFACE;
    style.visuals.widgets.inactive.fg_stroke = Stroke::new(1.0, TEXT_SECONDARY);
    style.visuals.widgets.hovered.bg_fill = USER_BUBBLE;
    style.visuals.widgets.hovered.fg_stroke = Stroke::new(1.0, TEXT_PRIMARY);
    style.visuals.widgets.active.bg_fill = ACCENT;
    style.visuals.widgets.active.fg_stroke = Stroke::new(1.0, BG_SECONDARY);

    style.visuals.selection.bg_fill = ACCENT.linear_multiply(0.3);
    style.visuals.selection.stroke = Stroke::new(1.0, ACCENT);

    style.spacing.item_spacing = Vec2::new(8.0, 6.0);

    ctx.set_style(style);
}
