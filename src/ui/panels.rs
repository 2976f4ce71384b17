use eframe::egui::{self, Color32, RichText, ScrollArea, TextEdit, Ui};

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – search and filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.horizontal(|ui: &mut Ui| {
        if ui.button("Open file…").clicked() {
            open_file_dialog(state);
        }
        if ui
            .add_enabled(state.dataset.is_some(), egui::Button::new("Reset filters"))
            .clicked()
        {
            state.reset_filters();
        }
    });
    ui.label(RichText::new("…or drop a CSV, JSON or Parquet file on the window.").weak());
    ui.separator();

    // Arc clone so the state can be mutated inside the loops.
    let Some(dataset) = state.dataset.clone() else {
        ui.label("No dataset loaded.");
        return;
    };

    // ---- Free-text search ----
    let mut query = state.filters.query.clone();
    let response = ui.add(
        TextEdit::singleline(&mut query)
            .hint_text("Search by name / operator / notes")
            .desired_width(f32::INFINITY),
    );
    if response.changed() {
        state.set_query(&query);
    }

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Which columns the search looks at ----
            let searched = state.filters.search_columns.len();
            egui::CollapsingHeader::new(RichText::new(format!("Search in  ({searched})")).strong())
                .id_salt("search_columns")
                .default_open(false)
                .show(ui, |ui: &mut Ui| {
                    for col in dataset.columns() {
                        let mut checked = state.filters.search_columns.contains(col);
                        if ui.checkbox(&mut checked, col.as_str()).changed() {
                            state.toggle_search_column(col);
                        }
                    }
                });
            ui.separator();

            // ---- Per-column category filters (collapsible) ----
            for col in state.categorical_columns() {
                let Some(all_labels) = dataset.category_labels(&col) else {
                    continue;
                };

                // Show count of selected / total in the header
                let n_selected = state
                    .filters
                    .categories
                    .get(&col)
                    .map_or(0, |s| s.intersection(&all_labels).count());
                let n_total = all_labels.len();
                let header_text = format!("{col}  ({n_selected}/{n_total})");

                egui::CollapsingHeader::new(RichText::new(header_text).strong())
                    .id_salt(&col)
                    .default_open(false)
                    .show(ui, |ui: &mut Ui| {
                        ui.horizontal(|ui: &mut Ui| {
                            if ui.small_button("All").clicked() {
                                state.select_all(&col);
                            }
                            if ui.small_button("None").clicked() {
                                state.select_none(&col);
                            }
                        });

                        for label in &all_labels {
                            let mut checked = state
                                .filters
                                .categories
                                .get(&col)
                                .is_some_and(|s| s.contains(label));
                            if ui.checkbox(&mut checked, label.as_str()).changed() {
                                state.toggle_filter_value(&col, label);
                            }
                        }
                    });
            }
            ui.separator();

            // ---- Bar chart column picker ----
            ui.strong("Bar charts");
            for col in state.chartable_columns() {
                let mut checked = state.chart_columns.contains(&col);
                if ui.checkbox(&mut checked, col.as_str()).changed() {
                    state.toggle_chart_column(&col);
                }
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            if ui.button("Reload default dataset").clicked() {
                state.reload_default();
                ui.close_menu();
            }
            ui.separator();
            if ui
                .add_enabled(state.dataset.is_some(), egui::Button::new("Export filtered…"))
                .clicked()
            {
                save_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let (Some(ds), Some(source)) = (&state.dataset, &state.source) {
            ui.label(format!(
                "{}: {} records loaded, {} visible",
                source.label(),
                ds.len(),
                state.visible_indices.len()
            ));
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

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open observer data")
        .add_filter("Supported files", &["csv", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        state.open_path(&path);
    }
}

pub fn save_file_dialog(state: &mut AppState) {
    let format = state.export_format();
    let file = rfd::FileDialog::new()
        .set_title("Export filtered data")
        .set_file_name(state.export_file_name())
        .add_filter(format.extension().to_uppercase(), &[format.extension()])
        .save_file();

    let Some(path) = file else {
        return;
    };
    match state.export_to(&path) {
        Ok(()) => {
            state.status_message = None;
        }
        Err(e) => {
            log::error!("Failed to export: {e:#}");
            state.status_message = Some(format!("Error: {e:#}"));
        }
    }
}
