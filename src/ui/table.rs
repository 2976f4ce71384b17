use eframe::egui::{RichText, Ui};
use egui_extras::{Column, TableBuilder};

use crate::state::AppState;

/// Placeholder shown when a metric's column is not in the dataset.
const MISSING_METRIC: &str = "—";

/// Headline metrics: filtered record count plus one distinct-count per
/// configured column.
pub fn summary_metrics(ui: &mut Ui, state: &AppState) {
    let summary = state.summary();
    let mut metrics = vec![("Spacecraft (filtered)".to_string(), summary.records.to_string())];
    for (col, count) in summary.distinct {
        let value = count.map_or_else(|| MISSING_METRIC.to_string(), |c| c.to_string());
        metrics.push((format!("Distinct {}", col.replace('_', " ")), value));
    }

    ui.columns(metrics.len(), |cols: &mut [Ui]| {
        for (ui, (title, value)) in cols.iter_mut().zip(metrics) {
            ui.vertical_centered(|ui: &mut Ui| {
                ui.label(RichText::new(title).weak());
                ui.heading(value);
            });
        }
    });
}

/// Every column of the filtered records.
pub fn filtered_table(ui: &mut Ui, state: &AppState) {
    let Some(dataset) = &state.dataset else {
        return;
    };
    let row_height = state.config.ui.table_row_height;
    let visible = &state.visible_indices;

    TableBuilder::new(ui)
        .striped(true)
        .resizable(true)
        .max_scroll_height(state.config.ui.table_max_height)
        .columns(Column::auto().at_least(60.0).clip(true), dataset.columns().len())
        .header(row_height, |mut header| {
            for col in dataset.columns() {
                header.col(|ui: &mut Ui| {
                    ui.strong(col);
                });
            }
        })
        .body(|body| {
            body.rows(row_height, visible.len(), |mut row| {
                let record = &dataset.records()[visible[row.index()]];
                for cell in &record.cells {
                    row.col(|ui: &mut Ui| {
                        if cell.is_null() {
                            ui.weak(MISSING_METRIC);
                        } else {
                            ui.label(cell.to_field());
                        }
                    });
                }
            });
        });
}
