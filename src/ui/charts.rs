use eframe::egui::{RichText, Ui};
use egui_plot::{Bar, BarChart, Plot};

use crate::color::ColorMap;
use crate::data::aggregate::Aggregate;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Bar charts (below the table)
// ---------------------------------------------------------------------------

/// One bar chart per chosen column, or a note when nothing is left to count.
pub fn bar_charts(ui: &mut Ui, state: &AppState) {
    let Some(dataset) = &state.dataset else {
        return;
    };
    if state.chart_columns.is_empty() {
        return;
    }
    let aggregates = state.aggregates();
    if aggregates.is_empty() {
        ui.label(RichText::new("No records match the current filters; nothing to chart.").italics());
        return;
    }

    for agg in &aggregates {
        let colors = dataset
            .category_labels(&agg.column)
            .map(|labels| ColorMap::new(&labels));
        ui.add_space(8.0);
        ui.strong(format!("Count by {}", agg.column));
        bar_chart(ui, agg, colors.as_ref(), state.config.ui.chart_height);
    }
}

fn bar_chart(ui: &mut Ui, agg: &Aggregate, colors: Option<&ColorMap>, height: f32) {
    let bars: Vec<Bar> = agg
        .counts
        .iter()
        .enumerate()
        .map(|(i, vc)| {
            let mut bar = Bar::new(i as f64, vc.count as f64)
                .name(&vc.value)
                .width(0.7);
            if let Some(cm) = colors {
                bar = bar.fill(cm.color_for(&vc.value));
            }
            bar
        })
        .collect();

    // Bars sit on integer x positions; label those with the category.
    let labels: Vec<String> = agg.counts.iter().map(|vc| vc.value.clone()).collect();

    Plot::new(format!("bar_chart_{}", agg.column))
        .height(height)
        .x_axis_label(agg.column.clone())
        .y_axis_label("count")
        .x_axis_formatter(move |mark, _range| {
            let slot = mark.value.round();
            if (mark.value - slot).abs() > 1e-6 || slot < 0.0 {
                return String::new();
            }
            labels.get(slot as usize).cloned().unwrap_or_default()
        })
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .allow_boxed_zoom(false)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).name(&agg.column));
        });
}
