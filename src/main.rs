mod app;
mod color;
mod config;
mod data;
mod state;
mod ui;

use app::AtlasObserverApp;
use config::AppConfig;
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();

    // A broken config file should not keep the browser from starting.
    let (config, startup_error) = match AppConfig::load() {
        Ok(config) => (config, None),
        Err(e) => {
            log::error!("Failed to load config: {e:#}");
            (AppConfig::default(), Some(format!("Config ignored: {e:#}")))
        }
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 860.0])
            .with_min_inner_size([700.0, 450.0])
            .with_drag_and_drop(true),
        ..Default::default()
    };

    let title = config.ui.window_title.clone();
    eframe::run_native(
        &title,
        options,
        Box::new(move |_cc| Ok(Box::new(AtlasObserverApp::new(config, startup_error)))),
    )
}
