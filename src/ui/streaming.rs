use std::collections::BTreeSet;

use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};
use spotify_dashboard::config::TOP_ARTISTS_RANGE;
use spotify_dashboard::data::aggregate::{by_month, group_by, group_by_pair, StreamingKpis, Summary};
use spotify_dashboard::data::insight::{country_top_artists, market_signals, Adoption};
use spotify_dashboard::data::{Dimension, ListeningRecord, Metric, SubscriptionTier};

use crate::color::{ColorMap, DEEP_GREEN, SPOTIFY_GREEN};
use crate::state::{AppState, StreamingView};
use crate::ui::kpi::{format_count, format_pct, kpi_row};
use crate::ui::plot::{self, Series};

const DRILL_DOWN_ARTISTS: usize = 5;

/// Render the streaming performance page.
pub fn streaming_page(ui: &mut Ui, state: &mut AppState) {
    let AppState {
        listening,
        visible,
        streaming: view,
        genre_colors,
        ..
    } = state;
    let records: Vec<&ListeningRecord> = visible.iter().map(|&i| &listening.records[i]).collect();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.heading("Streaming Performance");
            ui.add_space(4.0);

            let kpis = StreamingKpis::compute(records.iter().copied());
            kpi_row(
                ui,
                &[
                    ("Total streams", kpis.total_streams.map(format_count)),
                    ("Active listeners", kpis.active_listeners.map(format_count)),
                    ("Top artist", kpis.top_artist.clone()),
                    ("Premium share", kpis.premium_share.map(format_pct)),
                ],
            );
            ui.add_space(8.0);

            if records.is_empty() {
                ui.label(RichText::new("No records match the current filters.").italics());
                return;
            }

            // ---- Top artists ----
            ui.separator();
            ui.horizontal(|ui: &mut Ui| {
                ui.strong("Top artists by streams");
                ui.add(
                    egui::Slider::new(&mut view.top_artists, TOP_ARTISTS_RANGE).text("artists"),
                );
            });
            let artists = group_by(records.iter().copied(), Dimension::Artist, |r| {
                Metric::Streams.value(r)
            });
            let top: Vec<(String, f64)> = artists
                .top(view.top_artists)
                .into_iter()
                .map(|(k, s)| (k.to_string(), s.sum))
                .collect();
            plot::bar_chart(ui, "top_artists", &top, SPOTIFY_GREEN, true);

            // ---- Region × genre ----
            ui.separator();
            ui.strong("Streams by region and genre");
            let (regions, series) = region_genre_series(&records, genre_colors);
            plot::stacked_bars(ui, "region_genre", &regions, &series);

            // ---- Monthly trend ----
            ui.separator();
            ui.horizontal(|ui: &mut Ui| {
                ui.strong("Monthly streams");
                let text = view.trend_tier.map_or("All tiers", |t| t.as_str());
                egui::ComboBox::from_id_salt("trend_tier")
                    .selected_text(text)
                    .show_ui(ui, |ui: &mut Ui| {
                        ui.selectable_value(&mut view.trend_tier, None, "All tiers");
                        for tier in SubscriptionTier::ALL {
                            ui.selectable_value(&mut view.trend_tier, Some(tier), tier.as_str());
                        }
                    });
            });
            let tier = view.trend_tier;
            let months = by_month(
                records
                    .iter()
                    .copied()
                    .filter(|r| tier.map_or(true, |t| r.tier == t)),
                |r| Metric::Streams.value(r),
            );
            let labels: Vec<String> = months.keys().map(|m| m.to_string()).collect();
            let trend = Series {
                name: tier.map_or("All tiers", |t| t.as_str()).to_string(),
                values: months.values().map(|s| s.sum).collect(),
                color: SPOTIFY_GREEN,
            };
            plot::line_chart(ui, "monthly_trend", &[trend], &labels);

            // ---- Free vs Premium ----
            ui.separator();
            ui.horizontal(|ui: &mut Ui| {
                ui.strong("Free vs Premium by genre");
                egui::ComboBox::from_id_salt("engagement_metric")
                    .selected_text(view.engagement.label())
                    .show_ui(ui, |ui: &mut Ui| {
                        for m in Metric::ALL {
                            ui.selectable_value(&mut view.engagement, m, m.label());
                        }
                    });
            });
            let (genres, series) = tier_series(&records, view.engagement);
            plot::grouped_bars(ui, "free_vs_premium", &genres, &series);

            // ---- Market signals ----
            ui.separator();
            market_section(ui, &records, listening.values(Dimension::Genre), view);

            // ---- Country drill-down ----
            ui.separator();
            drill_down_section(ui, &records, view);
        });
}

/// Regions on the x axis, one stacked series per genre.
fn region_genre_series(records: &[&ListeningRecord], colors: &ColorMap) -> (Vec<String>, Vec<Series>) {
    let nested = group_by_pair(records.iter().copied(), Dimension::Region, Dimension::Genre, |r| {
        Metric::Streams.value(r)
    });
    let regions: Vec<String> = nested.keys().cloned().collect();
    let genres = group_by(records.iter().copied(), Dimension::Genre, |_| None);

    let series = genres
        .keys()
        .map(|genre| Series {
            name: genre.to_string(),
            values: nested
                .values()
                .map(|by_genre| by_genre.get(genre).map_or(0.0, |s| s.sum))
                .collect(),
            color: colors.color_for(genre),
        })
        .collect();
    (regions, series)
}

/// Genres on the x axis, one series per subscription tier.
fn tier_series(records: &[&ListeningRecord], metric: Metric) -> (Vec<String>, Vec<Series>) {
    let nested = group_by_pair(records.iter().copied(), Dimension::Genre, Dimension::Tier, |r| {
        metric.value(r)
    });
    let genres: Vec<String> = nested.keys().cloned().collect();

    let series = SubscriptionTier::ALL
        .into_iter()
        .zip([SPOTIFY_GREEN, DEEP_GREEN])
        .map(|(tier, color)| Series {
            name: tier.to_string(),
            values: nested
                .values()
                .map(|by_tier| {
                    by_tier
                        .get(tier.as_str())
                        .and_then(|s| summary_value(metric, s))
                        .unwrap_or(0.0)
                })
                .collect(),
            color,
        })
        .collect();
    (genres, series)
}

/// Counts add up across records; a rate is averaged.
fn summary_value(metric: Metric, summary: &Summary) -> Option<f64> {
    match metric {
        Metric::Streams | Metric::ActiveListeners => Some(summary.sum),
        Metric::CompletionRate => summary.mean(),
    }
}

fn adoption_color(adoption: Adoption) -> Color32 {
    match adoption {
        Adoption::High => SPOTIFY_GREEN,
        Adoption::Moderate => Color32::from_rgb(0xE8, 0xB3, 0x3A),
        Adoption::Low => Color32::GRAY,
    }
}

fn market_section<'a>(
    ui: &mut Ui,
    records: &[&ListeningRecord],
    all_genres: impl Iterator<Item = &'a str>,
    view: &mut StreamingView,
) {
    let all_genres: Vec<&str> = all_genres.collect();
    if view.market_genre.is_none() {
        view.market_genre = all_genres.first().map(|g| g.to_string());
    }

    ui.horizontal(|ui: &mut Ui| {
        ui.strong("Market signal for");
        egui::ComboBox::from_id_salt("market_genre")
            .selected_text(view.market_genre.clone().unwrap_or_default())
            .show_ui(ui, |ui: &mut Ui| {
                for g in &all_genres {
                    ui.selectable_value(&mut view.market_genre, Some(g.to_string()), *g);
                }
            });
    });

    let Some(genre) = view.market_genre.clone() else {
        return;
    };
    let signals = market_signals(records.iter().copied(), &genre);
    if signals.is_empty() {
        ui.label(RichText::new(format!("No {genre} streams in the current view.")).italics());
        return;
    }

    ui.push_id("market_signals", |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .vscroll(false)
            .column(Column::auto().at_least(120.0))
            .column(Column::auto().at_least(100.0))
            .column(Column::auto().at_least(100.0))
            .column(Column::remainder())
            .header(20.0, |mut header| {
                for title in ["Country", "Region", "Streams", "Adoption"] {
                    header.col(|ui: &mut Ui| {
                        ui.strong(title);
                    });
                }
            })
            .body(|mut body| {
                for s in &signals {
                    body.row(18.0, |mut row| {
                        row.col(|ui: &mut Ui| {
                            ui.label(&s.country);
                        });
                        row.col(|ui: &mut Ui| {
                            ui.label(&s.region);
                        });
                        row.col(|ui: &mut Ui| {
                            ui.label(format_count(s.streams));
                        });
                        row.col(|ui: &mut Ui| {
                            ui.label(
                                RichText::new(s.adoption.to_string())
                                    .color(adoption_color(s.adoption)),
                            );
                        });
                    });
                }
            });
    });
}

/// Distinct non-empty countries of the filtered view, sorted.
fn drill_countries(records: &[&ListeningRecord]) -> Vec<String> {
    let countries: BTreeSet<&str> = records
        .iter()
        .map(|r| r.country.as_str())
        .filter(|c| !c.is_empty())
        .collect();
    countries.into_iter().map(str::to_string).collect()
}

fn drill_down_section(ui: &mut Ui, records: &[&ListeningRecord], view: &mut StreamingView) {
    let countries = drill_countries(records);
    if countries.is_empty() {
        return;
    }
    if view
        .drill_country
        .as_ref()
        .is_some_and(|c| !countries.contains(c))
    {
        view.drill_country = None;
    }

    ui.horizontal(|ui: &mut Ui| {
        ui.strong("Top artists in");
        egui::ComboBox::from_id_salt("drill_country")
            .selected_text(view.drill_country.clone().unwrap_or_else(|| "choose a country".into()))
            .show_ui(ui, |ui: &mut Ui| {
                for c in &countries {
                    ui.selectable_value(&mut view.drill_country, Some(c.clone()), c);
                }
            });
    });
    if let Some(country) = &view.drill_country {
        let top: Vec<(String, f64)> = country_top_artists(records.iter().copied(), country, DRILL_DOWN_ARTISTS)
            .into_iter()
            .map(|(artist, streams)| (artist, streams as f64))
            .collect();
        plot::bar_chart(ui, "drill_down", &top, DEEP_GREEN, true);
    }
}

#[cfg(test)]
mod tests {
    use spotify_dashboard::data::Month;

    use super::*;

    fn record(artist: &str, genre: &str, region: &str, tier: SubscriptionTier, streams: u64) -> ListeningRecord {
        ListeningRecord {
            artist: artist.into(),
            genre: genre.into(),
            region: region.into(),
            country: String::new(),
            tier,
            month: Month::new(2024, 1).unwrap(),
            streams,
            active_listeners: streams / 10,
            completion_rate: Some(streams as f64 / 100.0),
        }
    }

    #[test]
    fn region_genre_fills_missing_pairs_with_zero() {
        let rows = [
            record("A", "Pop", "Europe", SubscriptionTier::Free, 10),
            record("B", "Rock", "Europe", SubscriptionTier::Free, 5),
            record("C", "Pop", "APAC", SubscriptionTier::Free, 7),
        ];
        let refs: Vec<&ListeningRecord> = rows.iter().collect();
        let colors = ColorMap::new(["Pop", "Rock"]);
        let (regions, series) = region_genre_series(&refs, &colors);

        assert_eq!(regions, ["APAC", "Europe"]);
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].name, "Pop");
        assert_eq!(series[0].values, [7.0, 10.0]);
        assert_eq!(series[1].name, "Rock");
        assert_eq!(series[1].values, [0.0, 5.0]);
    }

    #[test]
    fn tier_series_sums_counts_and_averages_rates() {
        let rows = [
            record("A", "Pop", "Europe", SubscriptionTier::Free, 25),
            record("B", "Pop", "Europe", SubscriptionTier::Free, 75),
            record("C", "Pop", "Europe", SubscriptionTier::Premium, 50),
        ];
        let refs: Vec<&ListeningRecord> = rows.iter().collect();

        let (genres, streams) = tier_series(&refs, Metric::Streams);
        assert_eq!(genres, ["Pop"]);
        assert_eq!(streams[0].values, [100.0]);
        assert_eq!(streams[1].values, [50.0]);

        let (_, rates) = tier_series(&refs, Metric::CompletionRate);
        assert_eq!(rates[0].values, [0.5]);
        assert_eq!(rates[1].values, [0.5]);
    }

    #[test]
    fn drill_down_lists_every_country_once() {
        let mut rows = [
            record("A", "Pop", "Europe", SubscriptionTier::Free, 10),
            record("B", "Rock", "Europe", SubscriptionTier::Free, 5),
            record("C", "Rock", "LATAM", SubscriptionTier::Free, 7),
            record("D", "Jazz", "LATAM", SubscriptionTier::Free, 1),
        ];
        rows[0].country = "Spain".into();
        rows[1].country = "Germany".into();
        rows[2].country = "Spain".into();
        let refs: Vec<&ListeningRecord> = rows.iter().collect();

        // Germany has no Pop streams but can still be drilled into.
        assert_eq!(drill_countries(&refs), ["Germany", "Spain"]);
        assert!(drill_countries(&[]).is_empty());
    }
}
