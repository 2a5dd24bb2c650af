/// Data layer: core types, loading, filtering and reporting.
///
/// Architecture:
/// ```text
///  .csv / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse + clean → Dataset (typed, immutable)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  Dataset  │  Vec<Record>, retained column names
///   └──────────┘
///        │   DateWindow + Metric
///        ▼
///   ┌──────────┐
///   │  filter   │  indices, daily counts, borough/day sums, stats
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  report   │  quick-statistics text, JSON export
///   └──────────┘
/// ```

pub mod error;
pub mod filter;
pub mod loader;
pub mod model;
pub mod report;
