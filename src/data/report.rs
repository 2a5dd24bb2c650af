use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use super::filter::{Aggregation, BoroughDay, DailyCount, Summary};
use super::model::{DateWindow, Metric};

// ---------------------------------------------------------------------------
// Quick statistics text
// ---------------------------------------------------------------------------

/// Human-readable sentences describing the summary of `aggregation`.
///
/// `NoData` reads differently depending on whether the window matched any
/// collisions at all or only records with an empty value for the metric.
pub fn summary_lines(aggregation: &Aggregation) -> Vec<String> {
    let metric = aggregation.metric;
    let start = aggregation.window.start.format("%x");
    let end = aggregation.window.end.format("%x");
    match &aggregation.summary {
        Summary::Stats(s) => vec![
            format!("The maximum number of {metric} from {start} to {end} is {}.", s.max),
            format!("The minimum is {}.", s.min),
            format!("The average is {:.2}.", s.mean),
        ],
        Summary::NoData if aggregation.is_empty() => {
            vec![format!("No collisions recorded from {start} to {end}.")]
        }
        Summary::NoData => vec![format!(
            "No {metric} values recorded from {start} to {end} ({} collisions).",
            aggregation.indices.len()
        )],
    }
}

// ---------------------------------------------------------------------------
// JSON report
// ---------------------------------------------------------------------------

/// Serializable snapshot of one aggregation.
#[derive(Debug, Serialize)]
pub struct Report<'a> {
    /// Data file the aggregation was computed from, when known.
    pub source: Option<String>,
    pub window: DateWindow,
    pub metric: Metric,
    pub records: usize,
    pub summary: &'a Summary,
    pub daily: &'a [DailyCount],
    pub borough_days: &'a [BoroughDay],
}

impl<'a> Report<'a> {
    pub fn new(source: Option<&Path>, aggregation: &'a Aggregation) -> Self {
        Report {
            source: source.map(|p| p.display().to_string()),
            window: aggregation.window,
            metric: aggregation.metric,
            records: aggregation.indices.len(),
            summary: &aggregation.summary,
            daily: &aggregation.daily,
            borough_days: &aggregation.borough_days,
        }
    }

    pub fn to_writer<W: Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer_pretty(writer, self).context("serializing report")
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        let file = File::create(path)
            .with_context(|| format!("creating report file {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        self.to_writer(&mut writer)?;
        writer.flush().context("writing report")?;
        log::info!("Wrote report for {} records to {}", self.records, path.display());
        Ok(())
    }
}
