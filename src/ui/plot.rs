use std::ops::RangeInclusive;

use eframe::egui::{Color32, Ui};
use egui_plot::{Bar, BarChart, GridMark, Legend, Line, Plot, PlotPoints, Points};

use crate::color::green_scale;

const CHART_HEIGHT: f32 = 260.0;

// ---------------------------------------------------------------------------
// Chart helpers (central panel)
// ---------------------------------------------------------------------------

/// Axis formatter that labels integer positions with category names.
fn category_axis(labels: Vec<String>) -> impl Fn(GridMark, &RangeInclusive<f64>) -> String {
    move |mark: GridMark, _range: &RangeInclusive<f64>| {
        let i = mark.value.round();
        if (mark.value - i).abs() > 1e-6 || i < 0.0 {
            return String::new();
        }
        labels.get(i as usize).cloned().unwrap_or_default()
    }
}

fn base_plot(id: &str) -> Plot<'static> {
    Plot::new(id.to_string())
        .height(CHART_HEIGHT)
        .allow_scroll(false)
        .allow_drag(false)
        .allow_zoom(false)
        .allow_boxed_zoom(false)
        .show_grid(true)
}

/// One bar per category. `horizontal` puts categories on the y axis, with
/// the first item at the top.
pub fn bar_chart(
    ui: &mut Ui,
    id: &str,
    items: &[(String, f64)],
    color: Color32,
    horizontal: bool,
) {
    let n = items.len();
    let bars: Vec<Bar> = items
        .iter()
        .enumerate()
        .map(|(i, (label, value))| {
            let pos = if horizontal { (n - 1 - i) as f64 } else { i as f64 };
            Bar::new(pos, *value).name(label).fill(color).width(0.7)
        })
        .collect();

    let mut labels: Vec<String> = items.iter().map(|(l, _)| l.clone()).collect();
    let mut plot = base_plot(id);
    if horizontal {
        labels.reverse();
        plot = plot.y_axis_formatter(category_axis(labels)).include_x(0.0);
    } else {
        plot = plot.x_axis_formatter(category_axis(labels)).include_y(0.0);
    }

    let mut chart = BarChart::new(bars).color(color);
    if horizontal {
        chart = chart.horizontal();
    }
    plot.show(ui, |plot_ui| plot_ui.bar_chart(chart));
}

/// Like [`bar_chart`] but each bar is shaded by its value, light to dark
/// green, and negative values stay visible below the axis.
pub fn shaded_bar_chart(ui: &mut Ui, id: &str, items: &[(String, f64)]) {
    let (min, max) = items.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), (_, v)| {
        (lo.min(*v), hi.max(*v))
    });
    let span = max - min;

    let bars: Vec<Bar> = items
        .iter()
        .enumerate()
        .map(|(i, (label, value))| {
            let t = if span > 0.0 { (value - min) / span } else { 1.0 };
            Bar::new(i as f64, *value)
                .name(label)
                .fill(green_scale(t))
                .width(0.7)
        })
        .collect();

    let labels: Vec<String> = items.iter().map(|(l, _)| l.clone()).collect();
    base_plot(id)
        .x_axis_formatter(category_axis(labels))
        .include_y(0.0)
        .show(ui, |plot_ui| plot_ui.bar_chart(BarChart::new(bars)));
}

/// A named series of values, one per category.
pub struct Series {
    pub name: String,
    pub values: Vec<f64>,
    pub color: Color32,
}

/// Series stacked on top of each other per category.
pub fn stacked_bars(ui: &mut Ui, id: &str, categories: &[String], series: &[Series]) {
    let mut charts: Vec<BarChart> = Vec::with_capacity(series.len());
    for s in series {
        let bars: Vec<Bar> = s
            .values
            .iter()
            .enumerate()
            .map(|(i, v)| Bar::new(i as f64, *v).width(0.6))
            .collect();
        let below: Vec<&BarChart> = charts.iter().collect();
        let chart = BarChart::new(bars)
            .name(&s.name)
            .color(s.color)
            .stack_on(&below);
        charts.push(chart);
    }

    base_plot(id)
        .legend(Legend::default())
        .x_axis_formatter(category_axis(categories.to_vec()))
        .include_y(0.0)
        .show(ui, |plot_ui| {
            for chart in charts {
                plot_ui.bar_chart(chart);
            }
        });
}

/// Series placed side by side per category.
pub fn grouped_bars(ui: &mut Ui, id: &str, categories: &[String], series: &[Series]) {
    let n = series.len().max(1) as f64;
    let width = 0.8 / n;

    base_plot(id)
        .legend(Legend::default())
        .x_axis_formatter(category_axis(categories.to_vec()))
        .include_y(0.0)
        .show(ui, |plot_ui| {
            for (k, s) in series.iter().enumerate() {
                let offset = (k as f64 - (n - 1.0) / 2.0) * width;
                let bars: Vec<Bar> = s
                    .values
                    .iter()
                    .enumerate()
                    .map(|(i, v)| Bar::new(i as f64 + offset, *v).width(width * 0.95))
                    .collect();
                plot_ui.bar_chart(BarChart::new(bars).name(&s.name).color(s.color));
            }
        });
}

/// Line with markers over ordered categories (months).
pub fn line_chart(ui: &mut Ui, id: &str, series: &[Series], categories: &[String]) {
    base_plot(id)
        .legend(Legend::default())
        .x_axis_formatter(category_axis(categories.to_vec()))
        .include_y(0.0)
        .show(ui, |plot_ui| {
            for s in series {
                let points: Vec<[f64; 2]> = s
                    .values
                    .iter()
                    .enumerate()
                    .filter(|(_, v)| v.is_finite())
                    .map(|(i, v)| [i as f64, *v])
                    .collect();
                plot_ui.line(
                    Line::new(PlotPoints::from(points.clone()))
                        .name(&s.name)
                        .color(s.color)
                        .width(2.0),
                );
                plot_ui.points(
                    Points::new(PlotPoints::from(points))
                        .name(&s.name)
                        .color(s.color)
                        .radius(3.5),
                );
            }
        });
}
