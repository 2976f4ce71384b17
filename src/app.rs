use eframe::egui::{self, ScrollArea, Ui};

use crate::config::AppConfig;
use crate::state::AppState;
use crate::ui::{charts, panels, table};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct AtlasObserverApp {
    pub state: AppState,
}

impl AtlasObserverApp {
    /// Build the app and show the default dataset, if there is one.
    pub fn new(config: AppConfig, startup_error: Option<String>) -> Self {
        let mut state = AppState::new(config);
        state.load_default();
        if startup_error.is_some() {
            state.status_message = startup_error;
        }
        Self { state }
    }

    /// A file dropped on the window counts as an upload. Only the last one of
    /// a multi-file drop is kept.
    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        let dropped = ctx.input(|i| i.raw.dropped_files.clone());
        let Some(file) = dropped.last() else {
            return;
        };
        if let Some(bytes) = &file.bytes {
            self.state.open_bytes(&file.name, bytes);
        } else if let Some(path) = &file.path {
            self.state.open_path(path);
        }
    }
}

impl eframe::App for AtlasObserverApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_dropped_files(ctx);

        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: search and filters ----
        egui::SidePanel::left("filter_panel")
            .default_width(260.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: metrics, table, charts ----
        egui::CentralPanel::default().show(ctx, |ui| {
            if self.state.dataset.is_none() {
                ui.centered_and_justified(|ui: &mut Ui| {
                    ui.heading("Open a file to browse spacecraft  (File → Open…)");
                });
                return;
            }
            ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui: &mut Ui| {
                    table::summary_metrics(ui, &self.state);
                    ui.separator();
                    ui.heading("Filtered table");
                    table::filtered_table(ui, &self.state);
                    ui.separator();
                    charts::bar_charts(ui, &self.state);
                });
        });
    }
}
