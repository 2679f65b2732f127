mod app;
mod color;
mod state;
mod ui;

use anyhow::{anyhow, Context, Result};
use app::DashboardApp;
use clap::Parser;
use eframe::egui;
use spotify_dashboard::config::Config;
use spotify_dashboard::data::loader::{load_campaigns, load_listening};
use state::AppState;

fn main() -> Result<()> {
    env_logger::init();
    let config = Config::parse();

    let listening = load_listening(&config.data)
        .inspect_err(|e| log::error!("{e}"))
        .with_context(|| format!("loading listening data from {}", config.data.display()))?;
    log::info!(
        "{} listening records, {} months",
        listening.len(),
        listening.months.len()
    );

    let campaigns = match &config.campaigns {
        Some(path) => {
            let ds = load_campaigns(path)
                .inspect_err(|e| log::error!("{e}"))
                .with_context(|| format!("loading campaign data from {}", path.display()))?;
            log::info!("{} campaign records", ds.len());
            Some(ds)
        }
        None => {
            log::info!("no campaign data configured");
            None
        }
    };

    let state = AppState::new(listening, campaigns, config.top_artists());

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 900.0])
            .with_min_inner_size([800.0, 500.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Spotify Stakeholder Dashboard",
        options,
        Box::new(|_cc| Ok(Box::new(DashboardApp::new(state)))),
    )
    .map_err(|e| anyhow!("{e}"))
}
