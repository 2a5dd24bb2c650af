use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::color::ColorScheme;
use crate::data::model::{DateWindow, Metric};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "CRASH_VIEWER_CONFIG";
/// Config file picked up from the working directory when present.
pub const DEFAULT_CONFIG_FILE: &str = "crash_viewer.json";

// ---------------------------------------------------------------------------
// Startup configuration
// ---------------------------------------------------------------------------

/// Initial selections for the dashboard. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ViewerConfig {
    pub data_path: Option<PathBuf>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub metric: Metric,
    pub color_scheme: ColorScheme,
    pub show_table: bool,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            data_path: Some(PathBuf::from("nyc_veh_crash_sample.csv")),
            start_date: NaiveDate::from_ymd_opt(2015, 1, 1).unwrap_or_default(),
            end_date: NaiveDate::from_ymd_opt(2017, 2, 28).unwrap_or_default(),
            metric: Metric::PersonsInjured,
            color_scheme: ColorScheme::default(),
            show_table: false,
        }
    }
}

impl ViewerConfig {
    /// Load from `$CRASH_VIEWER_CONFIG`, else `./crash_viewer.json`, else defaults.
    pub fn load() -> Result<Self> {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Self::from_file(Path::new(&path));
        }
        let local = Path::new(DEFAULT_CONFIG_FILE);
        if local.exists() {
            return Self::from_file(local);
        }
        Ok(Self::default())
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config = Self::from_json(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn window(&self) -> DateWindow {
        DateWindow::new(self.start_date, self.end_date)
    }
}
