use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::color::{BoroughColors, ColorScheme};
use crate::config::ViewerConfig;
use crate::data::filter::{filter_and_aggregate, Aggregation};
use crate::data::loader::load_file;
use crate::data::model::{Dataset, DateWindow, Metric};
use crate::data::report::Report;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Loaded dataset (None until a file loads successfully). Never mutated.
    pub dataset: Option<Dataset>,

    /// File the dataset came from.
    pub source_path: Option<PathBuf>,

    /// Current form selections.
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub metric: Metric,
    pub color_scheme: ColorScheme,
    pub show_table: bool,

    /// Result of the last "Get Charts" press.
    pub aggregation: Option<Aggregation>,

    /// Colours for the map, rebuilt per dataset.
    pub borough_colors: BoroughColors,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::from_config(&ViewerConfig::default())
    }
}

impl AppState {
    /// Seed form selections from startup configuration.
    pub fn from_config(config: &ViewerConfig) -> Self {
        let window = config.window();
        Self {
            dataset: None,
            source_path: None,
            start: window.start,
            end: window.end,
            metric: config.metric,
            color_scheme: config.color_scheme,
            show_table: config.show_table,
            aggregation: None,
            borough_colors: BoroughColors::default(),
            status_message: None,
        }
    }

    pub fn window(&self) -> DateWindow {
        DateWindow::new(self.start, self.end)
    }

    /// Load a file and install it, or report the error in the status line.
    /// A failed load leaves the previous dataset in place.
    pub fn load_path(&mut self, path: &Path) {
        match load_file(path) {
            Ok(dataset) => {
                log::info!(
                    "Loaded {} collisions ({} rows dropped) from {}",
                    dataset.len(),
                    dataset.dropped_rows,
                    path.display()
                );
                self.set_dataset(dataset, Some(path.to_path_buf()));
            }
            Err(e) => {
                log::error!("Failed to load {}: {e}", path.display());
                self.status_message = Some(format!("Error: {e}"));
            }
        }
    }

    /// Ingest a newly loaded dataset and clear results derived from the old one.
    pub fn set_dataset(&mut self, dataset: Dataset, source_path: Option<PathBuf>) {
        self.borough_colors = BoroughColors::new(&dataset.boroughs());
        self.aggregation = None;
        self.dataset = Some(dataset);
        self.source_path = source_path;
        self.status_message = None;
    }

    /// Recompute charts and statistics for the current selections.
    pub fn get_charts(&mut self) {
        let Some(ds) = &self.dataset else {
            self.status_message = Some("No dataset loaded.".to_string());
            return;
        };
        let window = self.window();
        self.status_message = window
            .is_inverted()
            .then(|| "Start date is after end date.".to_string());
        self.aggregation = Some(filter_and_aggregate(ds, window, self.metric));
    }

    /// Write the current aggregation as a JSON report.
    pub fn export_report(&mut self, path: &Path) {
        let Some(agg) = &self.aggregation else {
            return;
        };
        let report = Report::new(self.source_path.as_deref(), agg);
        if let Err(e) = report.write_json(path) {
            log::error!("Failed to export report: {e:#}");
            self.status_message = Some(format!("Error: {e:#}"));
        }
    }
}
