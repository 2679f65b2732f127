use std::collections::BTreeSet;

use eframe::egui::{self, RichText, ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};
use spotify_dashboard::data::aggregate::{by_month, group_by, CampaignKpis};
use spotify_dashboard::data::insight::{assess_campaigns, CampaignAssessment, Verdict};
use spotify_dashboard::data::{CampaignDimension, CampaignMetric, CampaignRecord, Month};

use crate::color::{ColorMap, DEEP_GREEN, SPOTIFY_GREEN};
use crate::state::AppState;
use crate::ui::kpi::{format_pct, format_signed, kpi_row};
use crate::ui::plot::{self, Series};

/// Render the marketing campaign page.
pub fn campaigns_page(ui: &mut Ui, state: &mut AppState) {
    let AppState {
        campaigns: Some(dataset),
        visible_campaigns,
        thresholds,
        ..
    } = state
    else {
        ui.heading("Marketing Campaign Impact");
        ui.add_space(8.0);
        ui.label("No campaign data loaded.");
        ui.label(
            RichText::new(
                "Start with --campaigns <PATH> (or DASHBOARD_CAMPAIGNS), \
                 or use File → Open campaign data…",
            )
            .weak(),
        );
        return;
    };
    let records: Vec<&CampaignRecord> = visible_campaigns
        .iter()
        .map(|&i| &dataset.records[i])
        .collect();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.heading("Marketing Campaign Impact");
            ui.add_space(4.0);

            let kpis = CampaignKpis::compute(records.iter().copied());
            kpi_row(
                ui,
                &[
                    ("Net user gain", kpis.total_net_user_gain.map(format_signed)),
                    ("Avg user growth", kpis.avg_user_growth_pct.map(format_pct)),
                    ("Avg premium growth", kpis.avg_premium_growth_pct.map(format_pct)),
                ],
            );
            ui.add_space(8.0);

            if records.is_empty() {
                ui.label(RichText::new("No campaigns match the current filters.").italics());
                return;
            }

            // ---- Net gain by campaign ----
            ui.separator();
            ui.strong("Net user gain by campaign");
            let gain = ranked_sums(&records, CampaignDimension::Campaign, CampaignMetric::NetUserGain);
            plot::shaded_bar_chart(ui, "gain_by_campaign", &gain);

            // ---- Growth vs monetization ----
            ui.separator();
            ui.strong("User growth vs premium growth");
            ui.horizontal(|ui: &mut Ui| {
                ui.add(
                    egui::Slider::new(&mut thresholds.user_growth_pct, 0.0..=30.0)
                        .text("user growth threshold %"),
                );
                ui.add(
                    egui::Slider::new(&mut thresholds.premium_growth_pct, 0.0..=30.0)
                        .text("premium growth threshold %"),
                );
            });
            let assessments = assess_campaigns(records.iter().copied(), thresholds);
            let names: Vec<String> = assessments.iter().map(|a| a.campaign.clone()).collect();
            let series = [
                Series {
                    name: CampaignMetric::UserGrowthPct.label().to_string(),
                    values: assessments.iter().map(|a| a.user_growth_pct).collect(),
                    color: SPOTIFY_GREEN,
                },
                Series {
                    name: CampaignMetric::PremiumGrowthPct.label().to_string(),
                    values: assessments.iter().map(|a| a.premium_growth_pct).collect(),
                    color: DEEP_GREEN,
                },
            ];
            plot::grouped_bars(ui, "growth_vs_premium", &names, &series);
            verdict_table(ui, &assessments);

            // ---- Net gain by target genre ----
            ui.separator();
            ui.strong("Net user gain by target genre");
            let by_genre =
                ranked_sums(&records, CampaignDimension::TargetGenre, CampaignMetric::NetUserGain);
            plot::bar_chart(ui, "gain_by_genre", &by_genre, SPOTIFY_GREEN, false);

            // ---- Premium growth ranking ----
            ui.separator();
            ui.strong("Premium growth ranking");
            let premium = group_by(records.iter().copied(), CampaignDimension::Campaign, |r| {
                CampaignMetric::PremiumGrowthPct.value(r)
            });
            let ranking: Vec<(String, f64)> = premium
                .ranked_by(|s| s.mean())
                .into_iter()
                .filter_map(|(k, s)| Some((k.to_string(), s.mean()?)))
                .collect();
            plot::bar_chart(ui, "premium_ranking", &ranking, DEEP_GREEN, true);

            // ---- Monthly trend ----
            ui.separator();
            ui.strong("Monthly net user gain per campaign");
            let (months, series) = monthly_series(&records);
            plot::line_chart(ui, "campaign_trend", &series, &months);
        });
}

/// `metric` summed per key of `dimension`, largest first.
fn ranked_sums(
    records: &[&CampaignRecord],
    dimension: CampaignDimension,
    metric: CampaignMetric,
) -> Vec<(String, f64)> {
    group_by(records.iter().copied(), dimension, |r| metric.value(r))
        .ranked()
        .into_iter()
        .map(|(k, s)| (k.to_string(), s.sum))
        .collect()
}

/// Month labels plus one net-gain series per campaign. A campaign without
/// records in a month gets NaN there, which the line chart skips.
fn monthly_series(records: &[&CampaignRecord]) -> (Vec<String>, Vec<Series>) {
    let months: BTreeSet<Month> = records.iter().map(|r| r.month).collect();
    let campaigns = group_by(records.iter().copied(), CampaignDimension::Campaign, |_| None);
    let colors = ColorMap::new(campaigns.keys());

    let series = campaigns
        .keys()
        .map(|campaign| {
            let per_month = by_month(
                records.iter().copied().filter(|r| r.campaign == campaign),
                |r| CampaignMetric::NetUserGain.value(r),
            );
            Series {
                name: campaign.to_string(),
                values: months
                    .iter()
                    .map(|m| per_month.get(m).map_or(f64::NAN, |s| s.sum))
                    .collect(),
                color: colors.color_for(campaign),
            }
        })
        .collect();
    (months.iter().map(Month::to_string).collect(), series)
}

fn verdict_table(ui: &mut Ui, assessments: &[CampaignAssessment]) {
    ui.push_id("verdicts", |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .vscroll(false)
            .column(Column::auto().at_least(160.0))
            .column(Column::auto().at_least(100.0))
            .column(Column::auto().at_least(120.0))
            .column(Column::remainder())
            .header(20.0, |mut header| {
                for title in ["Campaign", "User growth", "Premium growth", "Verdict"] {
                    header.col(|ui: &mut Ui| {
                        ui.strong(title);
                    });
                }
            })
            .body(|mut body| {
                for a in assessments {
                    body.row(18.0, |mut row| {
                        row.col(|ui: &mut Ui| {
                            ui.label(&a.campaign);
                        });
                        row.col(|ui: &mut Ui| {
                            ui.label(format_pct(a.user_growth_pct));
                        });
                        row.col(|ui: &mut Ui| {
                            ui.label(format_pct(a.premium_growth_pct));
                        });
                        row.col(|ui: &mut Ui| {
                            let text = RichText::new(a.verdict.to_string());
                            ui.label(match a.verdict {
                                Verdict::ScaleCandidate => text.color(SPOTIFY_GREEN).strong(),
                                Verdict::Reassess => text.weak(),
                                _ => text,
                            });
                        });
                    });
                }
            });
    });
}
