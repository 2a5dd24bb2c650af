use eframe::egui::{self, Color32, RichText, Ui};
use egui_extras::DatePickerButton;

use crate::color::ColorScheme;
use crate::data::model::{Dataset, Metric};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – data inputs
// ---------------------------------------------------------------------------

/// Render the left input panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Data Inputs");
    ui.separator();

    // ---- Colour scheme ----
    ui.strong("Color scheme for graphs");
    for scheme in ColorScheme::ALL {
        ui.radio_value(&mut state.color_scheme, scheme, scheme.label());
    }
    ui.separator();

    // ---- Date window ----
    ui.strong("Start Date");
    ui.add(DatePickerButton::new(&mut state.start).id_salt("start_date"));
    ui.strong("End Date");
    ui.add(DatePickerButton::new(&mut state.end).id_salt("end_date"));

    if let Some(range) = state.dataset.as_ref().and_then(Dataset::date_range) {
        ui.small(format!("Data covers {} to {}", range.start, range.end));
        if ui.small_button("Use full range").clicked() {
            state.start = range.start;
            state.end = range.end;
        }
    }
    ui.separator();

    // ---- Metric selector ----
    ui.strong("Injury/Mortality metric");
    egui::ComboBox::from_id_salt("metric")
        .selected_text(state.metric.column())
        .show_ui(ui, |ui: &mut Ui| {
            for metric in Metric::ALL {
                ui.selectable_value(&mut state.metric, metric, metric.column());
            }
        });
    ui.separator();

    ui.checkbox(&mut state.show_table, "Display table");
    ui.add_space(8.0);

    let ready = state.dataset.is_some();
    if ui
        .add_enabled(ready, egui::Button::new(RichText::new("Get Charts").strong()))
        .clicked()
    {
        state.get_charts();
    }
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
            let can_export = state.aggregation.is_some();
            if ui
                .add_enabled(can_export, egui::Button::new("Export report…"))
                .clicked()
            {
                export_report_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(ds) = &state.dataset {
            let shown = state
                .aggregation
                .as_ref()
                .map_or(ds.len(), |agg| agg.indices.len());
            ui.label(format!("{} collisions loaded, {} shown", ds.len(), shown));
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
        .set_title("Open collision data")
        .add_filter("Supported files", &["csv", "parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        state.load_path(&path);
    }
}

pub fn export_report_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Export report")
        .add_filter("JSON", &["json"])
        .set_file_name("collision_report.json")
        .save_file();

    if let Some(path) = file {
        state.export_report(&path);
    }
}
