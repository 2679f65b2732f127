use eframe::egui::{self, Color32, RichText, Ui};

/// Shown instead of a value when the filtered view is empty.
pub const NO_DATA: &str = "no data";

// ---------------------------------------------------------------------------
// Number formatting
// ---------------------------------------------------------------------------

/// `1234567` → `"1,234,567"`.
pub fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Signed variant of [`format_count`].
pub fn format_signed(n: i64) -> String {
    let grouped = format_count(n.unsigned_abs());
    if n < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

/// One decimal and a percent sign.
pub fn format_pct(v: f64) -> String {
    format!("{v:.1}%")
}

// ---------------------------------------------------------------------------
// KPI card
// ---------------------------------------------------------------------------

/// A framed title + big value; `None` renders as [`NO_DATA`].
pub fn kpi_card(ui: &mut Ui, title: &str, value: Option<String>) {
    egui::Frame::group(ui.style())
        .fill(ui.visuals().extreme_bg_color)
        .corner_radius(12.0)
        .inner_margin(12.0)
        .show(ui, |ui: &mut Ui| {
            ui.set_min_width(ui.available_width());
            ui.label(RichText::new(title).small().weak());
            match value {
                Some(v) => ui.label(RichText::new(v).heading().strong()),
                None => ui.label(RichText::new(NO_DATA).heading().italics().color(Color32::GRAY)),
            };
        });
}

/// A row of KPI cards filling the available width.
pub fn kpi_row(ui: &mut Ui, cards: &[(&str, Option<String>)]) {
    ui.columns(cards.len(), |columns: &mut [Ui]| {
        for (col, (title, value)) in columns.iter_mut().zip(cards) {
            kpi_card(col, title, value.clone());
        }
    });
}
