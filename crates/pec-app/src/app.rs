//! Main egui application: composes all panels and drives the chat runtime.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use chrono::Utc;
use egui::{self, CentralPanel, RichText, SidePanel, TopBottomPanel};

use pec_core::event_bus::EventBus;
use pec_core::ports::{ChatPort, StoragePort};
use pec_core::report;
use pec_core::runtime::{ChatRuntime, DesignOutcome, StopSlot};
use pec_core::session_store::SessionStore;
use pec_core::synth::MockSynthesizer;
use pec_platform::download::download_all;
use pec_platform::llm::OpenAiCompatProvider;
use pec_platform::render::JsPdfRenderer;
use pec_platform::storage::open_storage;
use pec_types::config::{AppConfig, StorageBackendType, CONFIG_STORAGE_KEY};
use pec_types::document::ExportedFile;
use pec_types::Result;
use pec_ui::panels::chat::{self, ChatAction};
use pec_ui::panels::downloads::{self, DownloadAction};
use pec_ui::panels::sessions::{self, SessionAction};
use pec_ui::panels::settings::{self, SaveFeedback, SettingsAction};
use pec_ui::state::{ExportStatus, RuntimeSnapshot, UiState};
use pec_ui::theme;

const CJK_FONT_URL: &str = "NotoSansSC-Regular.otf";

/// The main application state
pub struct PecApp {
    ui_state: UiState,
    config: AppConfig,
    event_bus: EventBus,
    runtime: Rc<RefCell<ChatRuntime>>,
    chat: Rc<dyn ChatPort>,
    /// Holds the saved config; always the auto-selected backend
    config_storage: Rc<dyn StoragePort>,
    renderer: Rc<JsPdfRenderer>,
    stop: StopSlot,
    booted: Rc<Cell<bool>>,
    restored_config: Rc<RefCell<Option<AppConfig>>>,
    export_result: Rc<RefCell<Option<ExportStatus>>>,
    save_feedback: Option<SaveFeedback>,
    first_frame: bool,
    font_loaded: Rc<RefCell<bool>>,
}

fn new_runtime(config: &AppConfig, event_bus: EventBus, storage: Rc<dyn StoragePort>) -> ChatRuntime {
    let store = SessionStore::new(storage, config.storage.history_key.clone());
    ChatRuntime::new(config.clone(), event_bus, store, Box::new(MockSynthesizer::new()))
}

fn open_or_memory(backend: &StorageBackendType) -> Rc<dyn StoragePort> {
    open_storage(backend).unwrap_or_else(|e| {
        log::warn!("Storage backend {:?} unavailable ({}), using memory", backend, e);
        Rc::new(pec_platform::storage::MemoryStorage::new())
    })
}

impl PecApp {
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        let config = AppConfig::default();
        let event_bus = EventBus::new();
        let config_storage = open_or_memory(&StorageBackendType::Auto);
        let history_storage = open_or_memory(&config.storage.backend);
        let runtime = new_runtime(&config, event_bus.clone(), history_storage);

        let app = Self {
            ui_state: UiState::new(),
            chat: Rc::new(OpenAiCompatProvider::new(config.llm.clone())),
            config,
            event_bus,
            runtime: Rc::new(RefCell::new(runtime)),
            config_storage,
            renderer: Rc::new(JsPdfRenderer::default()),
            stop: StopSlot::default(),
            booted: Rc::new(Cell::new(false)),
            restored_config: Rc::new(RefCell::new(None)),
            export_result: Rc::new(RefCell::new(None)),
            save_feedback: None,
            first_frame: true,
            font_loaded: Rc::new(RefCell::new(false)),
        };
        app.boot();
        app
    }

    /// Restore the saved config, open the history backend it names and
    /// load sessions. Sending stays disabled until this finishes.
    fn boot(&self) {
        let config_storage = self.config_storage.clone();
        let runtime = self.runtime.clone();
        let event_bus = self.event_bus.clone();
        let slot = self.restored_config.clone();
        let booted = self.booted.clone();

        wasm_bindgen_futures::spawn_local(async move {
            let saved = match config_storage.get(CONFIG_STORAGE_KEY).await {
                Ok(Some(data)) => match serde_json::from_slice::<AppConfig>(&data) {
                    Ok(config) => {
                        log::info!("Config restored from storage");
                        Some(config)
                    }
                    Err(e) => {
                        log::warn!("Ignoring unreadable saved config: {}", e);
                        None
                    }
                },
                Ok(None) => None,
                Err(e) => {
                    log::warn!("Config read failed: {}", e);
                    None
                }
            };

            let Ok(mut rt) = runtime.try_borrow_mut() else {
                log::error!("Runtime busy during boot");
                return;
            };
            if let Some(config) = &saved {
                *rt = new_runtime(config, event_bus, open_or_memory(&config.storage.backend));
            }
            rt.load().await;
            drop(rt);

            *slot.borrow_mut() = saved;
            booted.set(true);
        });
    }

    fn save_config(&mut self) {
        let json = match serde_json::to_vec(&self.config) {
            Ok(json) => json,
            Err(e) => {
                self.save_feedback = Some(SaveFeedback {
                    message: format!("保存失败：{}", e),
                    success: false,
                });
                return;
            }
        };
        let storage = self.config_storage.clone();
        wasm_bindgen_futures::spawn_local(async move {
            match storage.set(CONFIG_STORAGE_KEY, &json).await {
                Ok(()) => log::info!("Config saved to storage"),
                Err(e) => log::error!("Config save failed: {}", e),
            }
        });
        self.save_feedback = Some(SaveFeedback {
            message: "已保存".to_string(),
            success: true,
        });
    }

    /// Fetch a CJK font from the server and install it into egui
    fn load_cjk_font(ctx: egui::Context, loaded_flag: Rc<RefCell<bool>>) {
        wasm_bindgen_futures::spawn_local(async move {
            let window = match web_sys::window() {
                Some(w) => w,
                None => return,
            };
            let resp = match wasm_bindgen_futures::JsFuture::from(window.fetch_with_str(CJK_FONT_URL)).await {
                Ok(r) => r,
                Err(e) => {
                    log::warn!("Failed to fetch CJK font: {:?}", e);
                    return;
                }
            };
            let resp: web_sys::Response = resp.into();
            if !resp.ok() {
                log::warn!("CJK font request returned {}", resp.status());
                return;
            }
            let buf = match resp.array_buffer() {
                Ok(p) => match wasm_bindgen_futures::JsFuture::from(p).await {
                    Ok(b) => b,
                    Err(_) => return,
                },
                Err(_) => return,
            };
            let bytes = js_sys::Uint8Array::new(&buf).to_vec();

            let mut fonts = egui::FontDefinitions::default();
            fonts.font_data.insert(
                "noto_sans_sc".to_owned(),
                egui::FontData::from_owned(bytes).into(),
            );
            fonts
                .families
                .entry(egui::FontFamily::Proportional)
                .or_default()
                .insert(0, "noto_sans_sc".to_owned());
            fonts
                .families
                .entry(egui::FontFamily::Monospace)
                .or_default()
                .push("noto_sans_sc".to_owned());

            ctx.set_fonts(fonts);
            *loaded_flag.borrow_mut() = true;
            ctx.request_repaint();
            log::info!("CJK font loaded");
        });
    }

    fn rebuild_chat(&mut self) {
        self.chat = Rc::new(OpenAiCompatProvider::new(self.config.llm.clone()));
        match self.runtime.try_borrow_mut() {
            Ok(mut rt) => rt.config = self.config.clone(),
            Err(_) => log::warn!("Settings apply to the next turn once the current one ends"),
        }
    }

    /// Pull state written by background tasks into the frame.
    fn absorb_background(&mut self) {
        if let Some(config) = self.restored_config.borrow_mut().take() {
            self.config = config;
            self.chat = Rc::new(OpenAiCompatProvider::new(self.config.llm.clone()));
        }
        if let Some(status) = self.export_result.borrow_mut().take() {
            self.ui_state.exporting = false;
            self.ui_state.export_status = Some(status);
        }
        if self.ui_state.needs_sync && self.booted.get() {
            if let Ok(rt) = self.runtime.try_borrow() {
                self.ui_state.apply_snapshot(RuntimeSnapshot::capture(&rt, Utc::now()));
            }
        }
    }
}

impl eframe::App for PecApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.first_frame {
            theme::apply_theme(ctx);
            Self::load_cjk_font(ctx.clone(), self.font_loaded.clone());
            self.first_frame = false;
        }

        // Drain events from the chat runtime
        let events = self.event_bus.drain();
        if !events.is_empty() {
            self.ui_state.process_events(events);
            ctx.request_repaint();
        }
        self.absorb_background();

        if self.ui_state.is_busy() || self.ui_state.exporting || !self.booted.get() {
            ctx.request_repaint();
        }

        // ── Top bar ──────────────────────────────────────────
        TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui.selectable_label(self.ui_state.show_sessions, "☰").clicked() {
                    self.ui_state.show_sessions = !self.ui_state.show_sessions;
                }
                ui.label(
                    RichText::new(&self.config.product_name)
                        .strong()
                        .color(theme::ACCENT)
                        .size(16.0),
                );
                ui.separator();
                ui.label(
                    RichText::new(format!(
                        "{} | {}",
                        self.config.llm.provider.label(),
                        self.config.llm.model
                    ))
                    .color(theme::TEXT_SECONDARY)
                    .small(),
                );
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.selectable_label(self.ui_state.show_settings, "设置").clicked() {
                        self.ui_state.show_settings = !self.ui_state.show_settings;
                    }
                });
            });
        });

        // ── Session sidebar ──────────────────────────────────
        if self.ui_state.show_sessions {
            SidePanel::left("sessions_panel")
                .min_width(200.0)
                .max_width(260.0)
                .show(ctx, |ui| {
                    if let Some(action) = sessions::sessions_panel(ui, &self.ui_state) {
                        self.dispatch_session_action(action, ctx);
                    }
                });
        }

        // ── Settings side panel ──────────────────────────────
        if self.ui_state.show_settings {
            SidePanel::right("settings_panel")
                .min_width(280.0)
                .max_width(350.0)
                .show(ctx, |ui| {
                    match settings::settings_panel(ui, &mut self.config, self.save_feedback.as_ref()) {
                        SettingsAction::None => {}
                        SettingsAction::Changed => {
                            self.save_feedback = None;
                            self.rebuild_chat();
                        }
                        SettingsAction::SaveClicked => {
                            self.rebuild_chat();
                            self.save_config();
                        }
                        SettingsAction::ClearHistory => self.dispatch_clear_history(ctx),
                    }
                });
        }

        // ── Download surface ─────────────────────────────────
        if self.ui_state.can_download() {
            TopBottomPanel::bottom("downloads_panel").show(ctx, |ui| {
                if let Some(action) = downloads::downloads_panel(ui, &self.ui_state) {
                    self.dispatch_export(action, ctx);
                }
            });
        }

        // ── Conversation ─────────────────────────────────────
        CentralPanel::default().show(ctx, |ui| {
            if !self.booted.get() {
                ui.centered_and_justified(|ui| ui.spinner());
                return;
            }
            match chat::chat_panel(ui, &mut self.ui_state) {
                Some(ChatAction::Send(text)) => self.dispatch_message(Some(text), ctx),
                Some(ChatAction::Retry) => self.dispatch_message(None, ctx),
                Some(ChatAction::Stop) => {
                    self.stop.stop();
                }
                None => {}
            }
        });
    }
}

impl PecApp {
    /// Send `text`, or retry the last exchange when `None`.
    fn dispatch_message(&mut self, text: Option<String>, ctx: &egui::Context) {
        let runtime = self.runtime.clone();
        let chat = self.chat.clone();
        let ctx = ctx.clone();
        let stop = self.stop.clone();

        wasm_bindgen_futures::spawn_local(async move {
            let Ok(mut rt) = runtime.try_borrow_mut() else {
                log::warn!("Send ignored: a turn is already in flight");
                return;
            };
            let registration = stop.arm();
            let result = match text {
                Some(text) => rt.send(&text, chat.as_ref(), registration).await,
                None => rt.retry(chat.as_ref(), registration).await,
            };
            stop.disarm();
            match result {
                Ok(()) if rt.design_state().download_requested() => {
                    rt.generate_design();
                }
                Ok(()) => {}
                Err(e) => log::debug!("Turn ended without a reply: {}", e),
            }
            ctx.request_repaint();
        });
    }

    fn dispatch_session_action(&mut self, action: SessionAction, ctx: &egui::Context) {
        let runtime = self.runtime.clone();
        let ctx = ctx.clone();
        self.ui_state.export_status = None;

        wasm_bindgen_futures::spawn_local(async move {
            let Ok(mut rt) = runtime.try_borrow_mut() else {
                log::warn!("Session change ignored while a turn is in flight");
                return;
            };
            let result = match action {
                SessionAction::NewChat => rt.new_chat().await.map(|_| ()),
                SessionAction::Switch(id) => rt.switch_session(&id),
                SessionAction::Delete(id) => rt.delete_session(&id).await,
            };
            if let Err(e) = result {
                log::warn!("Session action failed: {}", e);
            }
            ctx.request_repaint();
        });
    }

    fn dispatch_clear_history(&mut self, ctx: &egui::Context) {
        let runtime = self.runtime.clone();
        let ctx = ctx.clone();
        wasm_bindgen_futures::spawn_local(async move {
            let Ok(mut rt) = runtime.try_borrow_mut() else {
                log::warn!("Clear ignored while a turn is in flight");
                return;
            };
            if let Err(e) = rt.clear_history().await {
                log::warn!("Clear history failed: {}", e);
            }
            ctx.request_repaint();
        });
    }

    /// Render the requested files from a copy of the outcome so the
    /// runtime stays free for chatting, then hand them to the browser.
    fn dispatch_export(&mut self, action: DownloadAction, ctx: &egui::Context) {
        let Ok(rt) = self.runtime.try_borrow() else {
            return;
        };
        let Some(outcome) = rt.outcome().cloned() else {
            return;
        };
        let product = rt.config.product_name.clone();
        drop(rt);

        let renderer = self.renderer.clone();
        let slot = self.export_result.clone();
        let ctx = ctx.clone();
        self.ui_state.exporting = true;
        self.ui_state.export_status = None;

        wasm_bindgen_futures::spawn_local(async move {
            let status = match export_files(action, &product, &outcome, renderer.as_ref()).await {
                Ok(files) => match download_all(&files).await {
                    Ok(()) => ExportStatus {
                        message: format!("已下载 {} 个文件", files.len()),
                        success: true,
                    },
                    Err(e) => ExportStatus {
                        message: format!("下载失败：{}", e),
                        success: false,
                    },
                },
                Err(e) => ExportStatus {
                    message: format!("生成失败：{}，请重试", e),
                    success: false,
                },
            };
            *slot.borrow_mut() = Some(status);
            ctx.request_repaint();
        });
    }
}

async fn export_files(
    action: DownloadAction,
    product: &str,
    outcome: &DesignOutcome,
    renderer: &JsPdfRenderer,
) -> Result<Vec<ExportedFile>> {
    match action {
        DownloadAction::One(kind) => Ok(vec![
            report::export_report(kind, product, &outcome.parameters, &outcome.result, renderer).await?,
        ]),
        DownloadAction::All => {
            report::export_all(product, &outcome.parameters, &outcome.result, renderer).await
        }
    }
}
