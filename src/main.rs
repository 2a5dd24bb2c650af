mod app;
mod color;
mod config;
mod data;
mod state;
mod ui;

use std::path::PathBuf;

use app::CrashViewerApp;
use config::ViewerConfig;
use eframe::egui;
use state::AppState;

fn main() -> eframe::Result {
    env_logger::init();

    let mut config = ViewerConfig::load().unwrap_or_else(|e| {
        log::warn!("Ignoring config: {e:#}");
        ViewerConfig::default()
    });
    if let Some(path) = std::env::args_os().nth(1) {
        config.data_path = Some(PathBuf::from(path));
    }

    let mut state = AppState::from_config(&config);
    if let Some(path) = &config.data_path {
        state.load_path(path);
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 900.0])
            .with_min_inner_size([640.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "NYC Vehicle Collisions",
        options,
        Box::new(|_cc| Ok(Box::new(CrashViewerApp::new(state)))),
    )
}
