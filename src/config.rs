use std::ops::RangeInclusive;
use std::path::PathBuf;

use clap::Parser;

/// Allowed values of the "number of artists" slider.
pub const TOP_ARTISTS_RANGE: RangeInclusive<usize> = 5..=15;

/// Startup configuration, from flags or environment.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "spotify-dashboard",
    version,
    about = "Stakeholder dashboard over Spotify listening and campaign data"
)]
pub struct Config {
    /// Listening data (.csv, .json or .parquet).
    #[arg(long, env = "DASHBOARD_DATA", default_value = "spotify.csv")]
    pub data: PathBuf,

    /// Marketing campaign data. The campaign page stays empty without it.
    #[arg(long, env = "DASHBOARD_CAMPAIGNS")]
    pub campaigns: Option<PathBuf>,

    /// Initial number of artists in the top-artists chart.
    #[arg(long, env = "DASHBOARD_TOP_ARTISTS", default_value_t = 10)]
    pub top_artists: usize,
}

impl Config {
    /// `top_artists` clamped into [`TOP_ARTISTS_RANGE`].
    pub fn top_artists(&self) -> usize {
        self.top_artists
            .clamp(*TOP_ARTISTS_RANGE.start(), *TOP_ARTISTS_RANGE.end())
    }
}
