use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Metric – which injury/fatality counter to aggregate
// ---------------------------------------------------------------------------

/// One of the eight injury/fatality counters of a collision record.
///
/// The serialized form is the (lower-cased) source column name, so config
/// files and reports read the same as the CSV header. Deserializing goes
/// through [`FromStr`] and so ignores case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum Metric {
    #[serde(rename = "persons injured")]
    PersonsInjured,
    #[serde(rename = "persons killed")]
    PersonsKilled,
    #[serde(rename = "pedestrians injured")]
    PedestriansInjured,
    #[serde(rename = "pedestrians killed")]
    PedestriansKilled,
    #[serde(rename = "cyclists injured")]
    CyclistsInjured,
    #[serde(rename = "cyclists killed")]
    CyclistsKilled,
    #[serde(rename = "motorists injured")]
    MotoristsInjured,
    #[serde(rename = "motorists killed")]
    MotoristsKilled,
}

impl Metric {
    pub const COUNT: usize = 8;

    /// All metrics in source column order.
    pub const ALL: [Metric; Metric::COUNT] = [
        Metric::PersonsInjured,
        Metric::PersonsKilled,
        Metric::PedestriansInjured,
        Metric::PedestriansKilled,
        Metric::CyclistsInjured,
        Metric::CyclistsKilled,
        Metric::MotoristsInjured,
        Metric::MotoristsKilled,
    ];

    /// Lower-cased source column name.
    pub fn column(self) -> &'static str {
        match self {
            Metric::PersonsInjured => "persons injured",
            Metric::PersonsKilled => "persons killed",
            Metric::PedestriansInjured => "pedestrians injured",
            Metric::PedestriansKilled => "pedestrians killed",
            Metric::CyclistsInjured => "cyclists injured",
            Metric::CyclistsKilled => "cyclists killed",
            Metric::MotoristsInjured => "motorists injured",
            Metric::MotoristsKilled => "motorists killed",
        }
    }

    /// Position of this counter inside [`Record::counts`].
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown metric '{0}'")]
pub struct ParseMetricError(pub String);

impl FromStr for Metric {
    type Err = ParseMetricError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Metric::ALL
            .into_iter()
            .find(|m| m.column() == wanted)
            .ok_or_else(|| ParseMetricError(s.to_string()))
    }
}

impl TryFrom<String> for Metric {
    type Error = ParseMetricError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

// ---------------------------------------------------------------------------
// DateWindow – inclusive date range
// ---------------------------------------------------------------------------

/// Inclusive `[start, end]` date range. An inverted window matches nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn is_inverted(&self) -> bool {
        self.start > self.end
    }
}

// ---------------------------------------------------------------------------
// Record – one cleaned collision row
// ---------------------------------------------------------------------------

/// A single collision event that survived cleaning.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub date: NaiveDate,
    pub borough: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Counters indexed by [`Metric::index`]; `None` where the source cell was empty.
    pub counts: [Option<u32>; Metric::COUNT],
    /// Retained descriptive columns: column_name → raw text.
    pub extra: BTreeMap<String, String>,
}

impl Record {
    pub fn metric(&self, metric: Metric) -> Option<u32> {
        self.counts[metric.index()]
    }
}

// ---------------------------------------------------------------------------
// Dataset – the complete cleaned table
// ---------------------------------------------------------------------------

/// The cleaned, immutable collision table.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    /// All kept records, in source order.
    pub records: Vec<Record>,
    /// Ordered list of retained descriptive column names.
    pub extra_columns: Vec<String>,
    /// Source rows removed because latitude, longitude or borough was null.
    pub dropped_rows: usize,
}

impl Dataset {
    pub fn new(records: Vec<Record>, extra_columns: Vec<String>, dropped_rows: usize) -> Self {
        Self {
            records,
            extra_columns,
            dropped_rows,
        }
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sorted set of borough labels present.
    pub fn boroughs(&self) -> BTreeSet<String> {
        self.records.iter().map(|r| r.borough.clone()).collect()
    }

    /// Earliest to latest date present, or `None` for an empty dataset.
    pub fn date_range(&self) -> Option<DateWindow> {
        let start = self.records.iter().map(|r| r.date).min()?;
        let end = self.records.iter().map(|r| r.date).max()?;
        Some(DateWindow::new(start, end))
    }
}
