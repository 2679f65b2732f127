//! Filtering and aggregation core of the Spotify stakeholder dashboard.
//!
//! The `spotify-dashboard` binary renders this with egui; everything here is
//! plain data in, plain data out.

pub mod config;
pub mod data;
pub mod sample;
