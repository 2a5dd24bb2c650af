use std::collections::{BTreeMap, BTreeSet};
use std::ops::RangeInclusive;

use chrono::{Datelike, NaiveDate};
use eframe::egui::{ScrollArea, Ui};
use egui_plot::{GridMark, Legend, Line, Plot, PlotPoints, Points};

use crate::color::{BoroughColors, ColorScheme};
use crate::data::filter::Aggregation;
use crate::data::model::Dataset;
use crate::data::report::summary_lines;
use crate::state::AppState;
use crate::ui::table;

const CHART_HEIGHT: f32 = 320.0;

// ---------------------------------------------------------------------------
// Dashboard (central panel)
// ---------------------------------------------------------------------------

/// Render the table, charts and statistics in the central panel.
pub fn dashboard(ui: &mut Ui, state: &AppState) {
    let dataset = match &state.dataset {
        Some(ds) => ds,
        None => {
            ui.centered_and_justified(|ui: &mut Ui| {
                ui.heading("Open a collision file to begin  (File → Open…)");
            });
            return;
        }
    };

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.heading("New York City Vehicle Collisions");
            ui.separator();

            if dataset.is_empty() {
                ui.label("The loaded file has no usable collision records.");
                return;
            }

            if state.show_table {
                ui.heading("Collision Records");
                let rows = state.aggregation.as_ref().map(|agg| agg.indices.as_slice());
                table::record_table(ui, dataset, rows);
                ui.separator();
            }

            let Some(agg) = &state.aggregation else {
                ui.label("Pick a date range and metric, then press \"Get Charts\".");
                return;
            };

            if agg.is_empty() {
                ui.heading("No Data");
                quick_statistics(ui, agg);
                return;
            }

            ui.heading("Collision Locations");
            location_map(ui, dataset, agg, &state.borough_colors);

            ui.heading("Collisions per Day");
            daily_plot(ui, agg, state.color_scheme);

            ui.heading("Injury/Mortality Chart");
            borough_day_plot(ui, agg, state.color_scheme);

            ui.heading("Quick Statistics");
            quick_statistics(ui, agg);
        });
}

fn quick_statistics(ui: &mut Ui, agg: &Aggregation) {
    for line in summary_lines(agg) {
        ui.label(line);
    }
}

// ---------------------------------------------------------------------------
// Map: one point series per borough
// ---------------------------------------------------------------------------

fn location_map(ui: &mut Ui, dataset: &Dataset, agg: &Aggregation, colors: &BoroughColors) {
    let mut by_borough: BTreeMap<&str, Vec<[f64; 2]>> = BTreeMap::new();
    let mut lat_sum = 0.0;
    for r in agg.records(dataset) {
        by_borough
            .entry(r.borough.as_str())
            .or_default()
            .push([r.longitude, r.latitude]);
        lat_sum += r.latitude;
    }
    // Shrink longitude degrees so the map is not stretched east-west.
    let mean_lat = lat_sum / agg.indices.len().max(1) as f64;
    let aspect = mean_lat.to_radians().cos().max(0.1) as f32;

    Plot::new("collision_map")
        .legend(Legend::default())
        .height(CHART_HEIGHT * 1.3)
        .data_aspect(aspect)
        .x_axis_label("Longitude")
        .y_axis_label("Latitude")
        .show(ui, |plot_ui| {
            for (borough, coords) in by_borough {
                let points = Points::new(PlotPoints::from(coords))
                    .name(borough)
                    .color(colors.color_for(borough))
                    .radius(2.5);
                plot_ui.points(points);
            }
        });
}

// ---------------------------------------------------------------------------
// Collisions per day
// ---------------------------------------------------------------------------

fn date_to_x(date: NaiveDate) -> f64 {
    f64::from(date.num_days_from_ce())
}

fn x_to_date(x: f64) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(x.round() as i32)
}

fn date_axis(mark: GridMark, _range: &RangeInclusive<f64>) -> String {
    x_to_date(mark.value)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

fn daily_plot(ui: &mut Ui, agg: &Aggregation, scheme: ColorScheme) {
    let points: PlotPoints = agg
        .daily
        .iter()
        .map(|d| [date_to_x(d.date), d.count as f64])
        .collect();

    let line = Line::new(points)
        .name("Number of collisions")
        .color(scheme.line_color())
        .width(2.0);

    Plot::new("daily_counts")
        .height(CHART_HEIGHT)
        .x_axis_label("Date")
        .y_axis_label("Number of collisions")
        .x_axis_formatter(date_axis)
        .label_formatter(|_name, value| {
            let date = x_to_date(value.x).map(|d| d.to_string()).unwrap_or_default();
            format!("{date}\n{:.0} collisions", value.y)
        })
        .show(ui, |plot_ui| plot_ui.line(line));
}

// ---------------------------------------------------------------------------
// Injury/mortality bubbles: date × borough, sized and coloured by metric
// ---------------------------------------------------------------------------

fn borough_day_plot(ui: &mut Ui, agg: &Aggregation, scheme: ColorScheme) {
    let boroughs: Vec<String> = agg
        .borough_days
        .iter()
        .map(|b| b.borough.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let max_value = agg.borough_days.iter().map(|b| b.value).max().unwrap_or(0).max(1) as f64;
    let metric = agg.metric;

    let labels = boroughs.clone();
    let hover_labels = boroughs.clone();

    Plot::new("borough_days")
        .height(CHART_HEIGHT)
        .x_axis_label("Date")
        .y_axis_label("Borough")
        .x_axis_formatter(date_axis)
        .y_axis_formatter(move |mark, _range| borough_label(&labels, mark.value))
        .y_grid_spacer(egui_plot::uniform_grid_spacer(|_| [1.0, 1.0, 1.0]))
        .label_formatter(move |_name, value| {
            let date = x_to_date(value.x).map(|d| d.to_string()).unwrap_or_default();
            format!("{date}\n{}", borough_label(&hover_labels, value.y))
        })
        .show(ui, |plot_ui| {
            for b in &agg.borough_days {
                let Ok(row) = boroughs.binary_search(&b.borough) else {
                    continue;
                };
                let t = b.value as f64 / max_value;
                let points = Points::new(PlotPoints::from(vec![[date_to_x(b.date), row as f64]]))
                    .name(format!("{metric}: {}", b.value))
                    .color(scheme.gradient(t as f32))
                    .radius((2.0 + 10.0 * t.sqrt()) as f32)
                    .filled(true);
                plot_ui.points(points);
            }
        });

    ui.horizontal(|ui: &mut Ui| {
        ui.label(format!("{metric}:"));
        ui.colored_label(scheme.gradient(0.0), "0");
        ui.label("→");
        ui.colored_label(scheme.gradient(1.0), format!("{}", max_value as u64));
    });
    ui.add_space(4.0);
}

fn borough_label(boroughs: &[String], y: f64) -> String {
    let idx = y.round();
    if (y - idx).abs() > 1e-6 || idx < 0.0 {
        return String::new();
    }
    boroughs.get(idx as usize).cloned().unwrap_or_default()
}
