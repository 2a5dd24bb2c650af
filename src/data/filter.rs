use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use super::model::{Dataset, DateWindow, Metric, Record};

// ---------------------------------------------------------------------------
// Derived values
// ---------------------------------------------------------------------------

/// Number of collisions on one date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub count: usize,
}

/// Summed metric for one borough on one date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoroughDay {
    pub borough: String,
    pub date: NaiveDate,
    pub value: u64,
}

/// Max / min / mean of a metric over the non-null values of a filtered view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SummaryStats {
    pub max: u32,
    pub min: u32,
    pub mean: f64,
    /// Number of non-null values the statistics were computed over.
    pub samples: usize,
}

/// Summary statistics, or the `NoData` marker when nothing was left to summarise.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Summary {
    Stats(SummaryStats),
    NoData,
}

/// Everything derived from one date window + metric selection.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregation {
    pub window: DateWindow,
    pub metric: Metric,
    /// Indices into [`Dataset::records`] of the records inside the window.
    pub indices: Vec<usize>,
    pub daily: Vec<DailyCount>,
    pub borough_days: Vec<BoroughDay>,
    pub summary: Summary,
}

impl Aggregation {
    /// Whether the window matched no records.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// The filtered records, in dataset order.
    pub fn records<'a>(&'a self, dataset: &'a Dataset) -> impl Iterator<Item = &'a Record> + 'a {
        self.indices.iter().map(move |&i| &dataset.records[i])
    }
}

// ---------------------------------------------------------------------------
// Filter & aggregate
// ---------------------------------------------------------------------------

/// Restrict `dataset` to `window` and compute every derived series for `metric`.
///
/// The dataset is only read: calling this repeatedly with different windows
/// always starts from the full table.
pub fn filter_and_aggregate(dataset: &Dataset, window: DateWindow, metric: Metric) -> Aggregation {
    let indices = filtered_indices(dataset, window);
    let daily = daily_counts(dataset, &indices);
    let borough_days = borough_days(dataset, &indices, metric);
    let summary = summarize(dataset, &indices, metric);

    log::debug!(
        "Window {}..={} on '{metric}': {} of {} records, {} days",
        window.start,
        window.end,
        indices.len(),
        dataset.len(),
        daily.len()
    );

    Aggregation {
        window,
        metric,
        indices,
        daily,
        borough_days,
        summary,
    }
}

/// Return indices of records whose date lies inside `window` (inclusive).
pub fn filtered_indices(dataset: &Dataset, window: DateWindow) -> Vec<usize> {
    dataset
        .records
        .iter()
        .enumerate()
        .filter(|(_, r)| window.contains(r.date))
        .map(|(i, _)| i)
        .collect()
}

/// Per-date record counts, ascending by date.
pub fn daily_counts(dataset: &Dataset, indices: &[usize]) -> Vec<DailyCount> {
    let mut counts: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for &i in indices {
        *counts.entry(dataset.records[i].date).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|(date, count)| DailyCount { date, count })
        .collect()
}

/// Per-(borough, date) metric sums, ascending by borough then date.
/// Records whose metric is null still contribute a zero-valued entry.
pub fn borough_days(dataset: &Dataset, indices: &[usize], metric: Metric) -> Vec<BoroughDay> {
    let mut sums: BTreeMap<(&str, NaiveDate), u64> = BTreeMap::new();
    for &i in indices {
        let r = &dataset.records[i];
        *sums.entry((r.borough.as_str(), r.date)).or_default() +=
            u64::from(r.metric(metric).unwrap_or(0));
    }
    sums.into_iter()
        .map(|((borough, date), value)| BoroughDay {
            borough: borough.to_string(),
            date,
            value,
        })
        .collect()
}

/// Max / min / mean of `metric` over the non-null values at `indices`.
pub fn summarize(dataset: &Dataset, indices: &[usize], metric: Metric) -> Summary {
    let mut values = indices
        .iter()
        .filter_map(|&i| dataset.records[i].metric(metric));

    let Some(first) = values.next() else {
        return Summary::NoData;
    };

    let (mut max, mut min, mut sum, mut samples) = (first, first, u64::from(first), 1usize);
    for v in values {
        max = max.max(v);
        min = min.min(v);
        sum += u64::from(v);
        samples += 1;
    }

    Summary::Stats(SummaryStats {
        max,
        min,
        mean: sum as f64 / samples as f64,
        samples,
    })
}
