use std::collections::BTreeSet;

use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use spotify_dashboard::data::filter::{FilterState, MonthRange};
use spotify_dashboard::data::loader::{load_campaigns, load_listening};
use spotify_dashboard::data::{CampaignDimension, Dataset, Dimension, Month, TabularRecord};

use crate::color::ColorMap;
use crate::state::{AppState, Page};

/// Dimensions offered as checkbox filters on each page.
const LISTENING_FILTERS: [Dimension; 3] = [Dimension::Region, Dimension::Genre, Dimension::Tier];
const CAMPAIGN_FILTERS: [CampaignDimension; 2] =
    [CampaignDimension::Campaign, CampaignDimension::TargetRegion];

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel for the current page.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| match state.page {
            Page::Streaming => {
                let changed = filter_widgets(
                    ui,
                    "listening",
                    &state.listening,
                    &mut state.filters,
                    &LISTENING_FILTERS,
                    Some((Dimension::Genre, &state.genre_colors)),
                );
                if changed {
                    state.refilter();
                }
            }
            Page::Campaigns => {
                let Some(dataset) = &state.campaigns else {
                    ui.label("No campaign data loaded.");
                    return;
                };
                let changed = filter_widgets(
                    ui,
                    "campaigns",
                    dataset,
                    &mut state.campaign_filters,
                    &CAMPAIGN_FILTERS,
                    None,
                );
                if changed {
                    state.refilter_campaigns();
                }
            }
        });
}

/// Month range pickers followed by one collapsible checkbox list per
/// dimension. Returns whether any selection changed.
fn filter_widgets<R: TabularRecord>(
    ui: &mut Ui,
    id: &str,
    dataset: &Dataset<R>,
    filter: &mut FilterState<R::Dimension>,
    dimensions: &[R::Dimension],
    swatches: Option<(R::Dimension, &ColorMap)>,
) -> bool {
    let mut changed = month_range(ui, id, &dataset.months, &mut filter.months);
    ui.separator();

    for &dim in dimensions {
        let Some(all_values) = dataset.distinct.get(&dim) else {
            continue;
        };

        let n_selected = filter.selection(dim).count();
        let header_text = if n_selected == 0 {
            format!("{dim}  (all)")
        } else {
            format!("{dim}  ({n_selected}/{})", all_values.len())
        };

        egui::CollapsingHeader::new(RichText::new(header_text).strong())
            .id_salt((id, dim.to_string()))
            .default_open(true)
            .show(ui, |ui: &mut Ui| {
                ui.horizontal(|ui: &mut Ui| {
                    if ui.small_button("All").clicked() {
                        filter.select(dim, all_values.iter().cloned());
                        changed = true;
                    }
                    if ui.small_button("Clear").clicked() {
                        filter.clear(dim);
                        changed = true;
                    }
                });

                for val in all_values {
                    let mut text = RichText::new(val);
                    if let Some((swatch_dim, colors)) = swatches {
                        if swatch_dim == dim {
                            text = text.color(colors.color_for(val));
                        }
                    }

                    let mut checked = filter.is_selected(dim, val);
                    if ui.checkbox(&mut checked, text).changed() {
                        filter.toggle(dim, val);
                        changed = true;
                    }
                }
            });
    }
    changed
}

/// "From" / "To" month pickers; "Any" leaves that end open.
fn month_range(ui: &mut Ui, id: &str, months: &BTreeSet<Month>, range: &mut MonthRange) -> bool {
    let mut changed = false;
    ui.strong("Months");
    egui::Grid::new((id, "months"))
        .num_columns(2)
        .show(ui, |ui: &mut Ui| {
            ui.label("From");
            changed |= month_combo(ui, (id, "from"), months, &mut range.start);
            ui.end_row();
            ui.label("To");
            changed |= month_combo(ui, (id, "to"), months, &mut range.end);
            ui.end_row();
        });

    if range.is_reversed() {
        ui.colored_label(Color32::RED, "From is after To: no months match.");
    }
    changed
}

fn month_combo(
    ui: &mut Ui,
    id: impl std::hash::Hash,
    months: &BTreeSet<Month>,
    value: &mut Option<Month>,
) -> bool {
    let before = *value;
    let text = value.map_or_else(|| "Any".to_string(), |m| m.to_string());
    egui::ComboBox::from_id_salt(id)
        .selected_text(text)
        .show_ui(ui, |ui: &mut Ui| {
            ui.selectable_value(value, None, "Any");
            for m in months {
                ui.selectable_value(value, Some(*m), m.to_string());
            }
        });
    *value != before
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / page switch.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open listening data…").clicked() {
                open_listening_dialog(state);
                ui.close_menu();
            }
            if ui.button("Open campaign data…").clicked() {
                open_campaign_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        ui.selectable_value(&mut state.page, Page::Streaming, "Streaming");
        ui.selectable_value(&mut state.page, Page::Campaigns, "Campaigns");

        ui.separator();

        match state.page {
            Page::Streaming => {
                ui.label(format!(
                    "{} records, {} visible",
                    state.listening.len(),
                    state.visible.len()
                ));
            }
            Page::Campaigns => {
                if let Some(ds) = &state.campaigns {
                    ui.label(format!(
                        "{} campaign rows, {} visible",
                        ds.len(),
                        state.visible_campaigns.len()
                    ));
                }
            }
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

fn pick_table(title: &str) -> Option<std::path::PathBuf> {
    rfd::FileDialog::new()
        .set_title(title)
        .add_filter("Supported files", &["csv", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file()
}

pub fn open_listening_dialog(state: &mut AppState) {
    let Some(path) = pick_table("Open listening data") else {
        return;
    };
    match load_listening(&path) {
        Ok(dataset) => {
            log::info!(
                "Loaded {} listening records, {} months",
                dataset.len(),
                dataset.months.len()
            );
            state.set_listening(dataset);
            state.page = Page::Streaming;
        }
        Err(e) => {
            log::error!("Failed to load {}: {e}", path.display());
            state.status_message = Some(format!("Error: {e}"));
        }
    }
}

pub fn open_campaign_dialog(state: &mut AppState) {
    let Some(path) = pick_table("Open campaign data") else {
        return;
    };
    match load_campaigns(&path) {
        Ok(dataset) => {
            log::info!("Loaded {} campaign records", dataset.len());
            state.set_campaigns(dataset);
            state.page = Page::Campaigns;
        }
        Err(e) => {
            log::error!("Failed to load {}: {e}", path.display());
            state.status_message = Some(format!("Error: {e}"));
        }
    }
}
