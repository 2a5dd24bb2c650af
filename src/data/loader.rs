use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use arrow::array::{make_array, Array, ArrayRef, AsArray};
use arrow::compute::cast;
use arrow::datatypes::DataType;
use chrono::{NaiveDate, NaiveDateTime};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use super::error::{LoadError, Result};
use super::model::{Dataset, Metric, Record};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load and clean a collision dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row plus one collision per line
/// * `.parquet` – any column types; every column is read back as text
pub fn load_file(path: &Path) -> Result<Dataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" => load_csv(File::open(path)?),
        "parquet" | "pq" => clean(read_parquet(File::open(path)?)?),
        other => Err(LoadError::UnsupportedFormat(other.to_string())),
    }
}

/// Load and clean CSV text from any reader.
pub fn load_csv<R: Read>(reader: R) -> Result<Dataset> {
    clean(read_csv(reader)?)
}

// ---------------------------------------------------------------------------
// Raw table: headers + nullable text cells, shared by every format
// ---------------------------------------------------------------------------

struct RawTable {
    headers: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
}

/// Cell spellings read as missing, compared case-insensitively.
const NULL_MARKERS: &[&str] = &["", "na", "n/a", "nan", "null", "none", "#n/a"];

fn null_if_missing(cell: &str) -> Option<String> {
    let cell = cell.trim();
    let lowered = cell.to_ascii_lowercase();
    if NULL_MARKERS.contains(&lowered.as_str()) {
        None
    } else {
        Some(cell.to_string())
    }
}

// ---------------------------------------------------------------------------
// CSV reader
// ---------------------------------------------------------------------------

fn read_csv<R: Read>(reader: R) -> Result<RawTable> {
    let mut reader = csv::Reader::from_reader(reader);
    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        rows.push(record.iter().map(null_if_missing).collect());
    }

    Ok(RawTable { headers, rows })
}

// ---------------------------------------------------------------------------
// Parquet reader
// ---------------------------------------------------------------------------

/// Read every column of a Parquet file as nullable text.
///
/// Numeric, date and timestamp columns go through Arrow's cast kernel so
/// they reach [`clean`] in the same textual form a CSV export would have.
/// Column names come from the file schema, so a file without rows still
/// yields its headers.
fn read_parquet(file: File) -> Result<RawTable> {
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    let headers = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build()?;

    let mut rows = Vec::new();
    for batch_result in reader {
        let batch = batch_result?;
        let text_columns = batch
            .columns()
            .iter()
            .map(text_column)
            .collect::<Result<Vec<_>>>()?;

        for row in 0..batch.num_rows() {
            let cells = text_columns
                .iter()
                .map(|col| {
                    if col.is_null(row) {
                        None
                    } else {
                        null_if_missing(col.as_string::<i32>().value(row))
                    }
                })
                .collect();
            rows.push(cells);
        }
    }

    Ok(RawTable { headers, rows })
}

/// Cast one column to Utf8.
///
/// Zoned timestamps are stored as UTC instants; the zone is dropped before
/// the cast so the text is the UTC wall-clock time and no zone database
/// is needed to render it.
fn text_column(col: &ArrayRef) -> Result<ArrayRef> {
    let col = match col.data_type() {
        DataType::Timestamp(unit, Some(_)) => {
            let data = col
                .to_data()
                .into_builder()
                .data_type(DataType::Timestamp(*unit, None))
                .build()?;
            make_array(data)
        }
        _ => col.clone(),
    };
    Ok(cast(&col, &DataType::Utf8)?)
}

// ---------------------------------------------------------------------------
// Cleaning
// ---------------------------------------------------------------------------

const STREET_COLUMNS: [&str; 3] = ["on street name", "cross street name", "off street name"];

/// Street names and the per-vehicle `vehicle N type` / `vehicle N factor`
/// slots (N in 1..=5) are not needed downstream.
fn is_dropped_column(name: &str) -> bool {
    if STREET_COLUMNS.contains(&name) {
        return true;
    }
    let Some(rest) = name.strip_prefix("vehicle ") else {
        return false;
    };
    let Some((slot, kind)) = rest.split_once(' ') else {
        return false;
    };
    matches!(slot.parse::<u8>(), Ok(1..=5)) && (kind == "type" || kind == "factor")
}

fn normalize_column(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Column positions resolved once against the normalized header.
struct Columns {
    latitude: usize,
    longitude: usize,
    borough: usize,
    date: usize,
    metrics: [usize; Metric::COUNT],
    extra: Vec<(usize, String)>,
}

impl Columns {
    fn resolve(headers: &[String]) -> Result<Self> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| LoadError::Schema(name.to_string()))
        };

        let latitude = find("latitude")?;
        let longitude = find("longitude")?;
        let borough = find("borough")?;
        let date = find("date")?;
        let mut metrics = [0; Metric::COUNT];
        for m in Metric::ALL {
            metrics[m.index()] = find(m.column())?;
        }

        let required: Vec<usize> = [latitude, longitude, borough, date]
            .into_iter()
            .chain(metrics)
            .collect();
        let extra = headers
            .iter()
            .enumerate()
            .filter(|(i, name)| !required.contains(i) && !is_dropped_column(name))
            .map(|(i, name)| (i, name.clone()))
            .collect();

        Ok(Columns {
            latitude,
            longitude,
            borough,
            date,
            metrics,
            extra,
        })
    }
}

fn clean(raw: RawTable) -> Result<Dataset> {
    let headers: Vec<String> = raw.headers.iter().map(|h| normalize_column(h)).collect();
    let cols = Columns::resolve(&headers)?;

    let mut records = Vec::with_capacity(raw.rows.len());
    let mut dropped = 0;

    for (i, cells) in raw.rows.into_iter().enumerate() {
        let row = i + 1;
        let cell = |idx: usize| cells.get(idx).and_then(|c| c.as_deref());

        let (Some(lat), Some(lon), Some(borough)) =
            (cell(cols.latitude), cell(cols.longitude), cell(cols.borough))
        else {
            dropped += 1;
            continue;
        };

        let latitude = parse_coordinate(lat, row, "latitude")?;
        let longitude = parse_coordinate(lon, row, "longitude")?;

        let date_text = cell(cols.date).unwrap_or("");
        let date = parse_date(date_text).ok_or_else(|| LoadError::TypeCoercion {
            row,
            column: "date".to_string(),
            value: date_text.to_string(),
            expected: "date",
        })?;

        let mut counts = [None; Metric::COUNT];
        for m in Metric::ALL {
            counts[m.index()] = match cell(cols.metrics[m.index()]) {
                Some(text) => Some(parse_count(text).ok_or_else(|| LoadError::TypeCoercion {
                    row,
                    column: m.column().to_string(),
                    value: text.to_string(),
                    expected: "count",
                })?),
                None => None,
            };
        }

        let extra = cols
            .extra
            .iter()
            .filter_map(|(idx, name)| cell(*idx).map(|v| (name.clone(), v.to_string())))
            .collect::<BTreeMap<_, _>>();

        records.push(Record {
            date,
            borough: borough.to_string(),
            latitude,
            longitude,
            counts,
            extra,
        });
    }

    log::debug!(
        "Cleaned {} rows: kept {}, dropped {} without location or borough",
        records.len() + dropped,
        records.len(),
        dropped
    );

    let extra_columns = cols.extra.into_iter().map(|(_, name)| name).collect();
    Ok(Dataset::new(records, extra_columns, dropped))
}

// -- Cell coercion helpers --

fn parse_coordinate(text: &str, row: usize, column: &str) -> Result<f64> {
    match text.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(LoadError::TypeCoercion {
            row,
            column: column.to_string(),
            value: text.to_string(),
            expected: "coordinate",
        }),
    }
}

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%m/%d/%Y"];
const DATETIME_FORMATS: [&str; 5] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %I:%M:%S %p",
];

/// Parse a calendar date, discarding any time-of-day component.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
                .map(|dt| dt.date())
        })
}

/// Parse a non-negative counter. Integral floats (`"2.0"`) are accepted
/// since columns with gaps are often exported as floating point.
fn parse_count(text: &str) -> Option<u32> {
    if let Ok(n) = text.parse::<u32>() {
        return Some(n);
    }
    let f = text.parse::<f64>().ok()?;
    (f.fract() == 0.0 && (0.0..=u32::MAX as f64).contains(&f)).then_some(f as u32)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arrow::array::{Float64Array, Int64Array, StringArray, TimestampSecondArray};
    use arrow::datatypes::{Field, Schema, TimeUnit};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;

    use super::*;

    const HEADER: &str = "DATE,TIME,BOROUGH,ZIP CODE,LATITUDE,LONGITUDE,ON STREET NAME,\
PERSONS INJURED,PERSONS KILLED,PEDESTRIANS INJURED,PEDESTRIANS KILLED,\
CYCLISTS INJURED,CYCLISTS KILLED,MOTORISTS INJURED,MOTORISTS KILLED,\
VEHICLE 1 TYPE,VEHICLE 1 FACTOR,VEHICLE 5 FACTOR,UNIQUE KEY";

    fn csv_with(rows: &[&str]) -> String {
        let mut text = String::from(HEADER);
        for row in rows {
            text.push('\n');
            text.push_str(row);
        }
        text
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn loads_and_types_a_clean_row() {
        let text = csv_with(&[
            "01/01/2016,13:05,BROOKLYN,11201,40.6943,-73.9903,COURT STREET,1,0,1,0,0,0,0,0,SEDAN,Unspecified,,3365332",
        ]);
        let ds = load_csv(text.as_bytes()).unwrap();

        assert_eq!(ds.len(), 1);
        let r = &ds.records[0];
        assert_eq!(r.date, date("2016-01-01"));
        assert_eq!(r.borough, "BROOKLYN");
        assert!((r.latitude - 40.6943).abs() < f64::EPSILON);
        assert!((r.longitude - -73.9903).abs() < f64::EPSILON);
        assert_eq!(r.metric(Metric::PersonsInjured), Some(1));
        assert_eq!(r.metric(Metric::PedestriansInjured), Some(1));
        assert_eq!(r.metric(Metric::MotoristsKilled), Some(0));
    }

    #[test]
    fn lowercases_columns_and_drops_street_and_vehicle_fields() {
        let text = csv_with(&[
            "2016-01-01,13:05,QUEENS,11368,40.75,-73.86,ROOSEVELT AVENUE,0,0,0,0,0,0,0,0,SUV,Driver Inattention,,42",
        ]);
        let ds = load_csv(text.as_bytes()).unwrap();

        assert_eq!(ds.extra_columns, vec!["time", "zip code", "unique key"]);
        let extra = &ds.records[0].extra;
        assert_eq!(extra.get("zip code").map(String::as_str), Some("11368"));
        assert!(!extra.contains_key("on street name"));
        assert!(!extra.contains_key("vehicle 1 type"));
    }

    #[test]
    fn drops_rows_missing_location_or_borough() {
        let text = csv_with(&[
            "2016-01-01,00:10,BRONX,10451,40.82,-73.92,,0,0,0,0,0,0,0,0,,,,1",
            "2016-01-01,00:20,,10451,40.82,-73.92,,0,0,0,0,0,0,0,0,,,,2",
            "2016-01-01,00:30,BRONX,10451,,-73.92,,0,0,0,0,0,0,0,0,,,,3",
            "2016-01-01,00:40,BRONX,10451,40.82,NaN,,0,0,0,0,0,0,0,0,,,,4",
            "2016-01-01,00:50,N/A,10451,40.82,-73.92,,0,0,0,0,0,0,0,0,,,,5",
        ]);
        let ds = load_csv(text.as_bytes()).unwrap();

        assert_eq!(ds.len(), 1);
        assert_eq!(ds.dropped_rows, 4);
        assert!(ds.records.iter().all(|r| !r.borough.is_empty()
            && r.latitude.is_finite()
            && r.longitude.is_finite()));
    }

    #[test]
    fn missing_required_column_is_a_schema_error() {
        let text = "DATE,BOROUGH,LATITUDE,PERSONS INJURED\n2016-01-01,QUEENS,40.7,1";
        let err = load_csv(text.as_bytes()).unwrap_err();
        assert!(matches!(err, LoadError::Schema(ref col) if col == "longitude"));
    }

    #[test]
    fn missing_counter_column_is_a_schema_error() {
        let text = HEADER.replace(",CYCLISTS KILLED", "");
        let err = load_csv(text.as_bytes()).unwrap_err();
        assert!(matches!(err, LoadError::Schema(ref col) if col == "cyclists killed"));
    }

    #[test]
    fn non_numeric_latitude_fails_the_load() {
        let text = csv_with(&[
            "2016-01-01,00:10,BRONX,10451,40.82,-73.92,,0,0,0,0,0,0,0,0,,,,1",
            "2016-01-01,00:20,BRONX,10451,north,-73.92,,0,0,0,0,0,0,0,0,,,,2",
        ]);
        let err = load_csv(text.as_bytes()).unwrap_err();
        match err {
            LoadError::TypeCoercion { row, column, value, .. } => {
                assert_eq!(row, 2);
                assert_eq!(column, "latitude");
                assert_eq!(value, "north");
            }
            other => panic!("expected TypeCoercion, got {other:?}"),
        }
    }

    #[test]
    fn bad_value_in_a_dropped_row_is_ignored() {
        let text = csv_with(&[
            "not-a-date,00:20,,10451,north,-73.92,,0,0,0,0,0,0,0,0,,,,2",
            "2016-01-01,00:10,BRONX,10451,40.82,-73.92,,0,0,0,0,0,0,0,0,,,,1",
        ]);
        let ds = load_csv(text.as_bytes()).unwrap();
        assert_eq!(ds.len(), 1);
    }

    #[test]
    fn unparseable_date_fails_the_load() {
        let text = csv_with(&[
            "yesterday,00:10,BRONX,10451,40.82,-73.92,,0,0,0,0,0,0,0,0,,,,1",
        ]);
        let err = load_csv(text.as_bytes()).unwrap_err();
        assert!(matches!(err, LoadError::TypeCoercion { ref column, .. } if column == "date"));
    }

    #[test]
    fn empty_counters_are_null_and_floats_are_accepted() {
        let text = csv_with(&[
            "2016-01-01,00:10,BRONX,10451,40.82,-73.92,,2.0,,0,0,0,0,0,0,,,,1",
        ]);
        let ds = load_csv(text.as_bytes()).unwrap();
        assert_eq!(ds.records[0].metric(Metric::PersonsInjured), Some(2));
        assert_eq!(ds.records[0].metric(Metric::PersonsKilled), None);

        let text = csv_with(&[
            "2016-01-01,00:10,BRONX,10451,40.82,-73.92,,1.5,0,0,0,0,0,0,0,,,,1",
        ]);
        let err = load_csv(text.as_bytes()).unwrap_err();
        assert!(matches!(err, LoadError::TypeCoercion { expected: "count", .. }));
    }

    #[test]
    fn parses_supported_date_forms() {
        let expected = Some(date("2016-02-29"));
        assert_eq!(parse_date("2016-02-29"), expected);
        assert_eq!(parse_date("02/29/2016"), expected);
        assert_eq!(parse_date("2016-02-29T00:00:00.000"), expected);
        assert_eq!(parse_date("2016-02-29 17:45:00"), expected);
        assert_eq!(parse_date("02/29/2016 5:45"), expected);
        assert_eq!(parse_date("2015-02-29"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn recognizes_dropped_columns() {
        assert!(is_dropped_column("cross street name"));
        assert!(is_dropped_column("vehicle 3 type"));
        assert!(is_dropped_column("vehicle 5 factor"));
        assert!(!is_dropped_column("vehicle 6 type"));
        assert!(!is_dropped_column("vehicle count"));
        assert!(!is_dropped_column("zip code"));
    }

    #[test]
    fn rejects_unknown_extension() {
        let err = load_file(Path::new("collisions.xlsx")).unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedFormat(ref ext) if ext == "xlsx"));
    }

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!(
            "nyc-crash-viewer-{}-{name}",
            std::process::id()
        ))
    }

    /// DATE/BOROUGH/LATITUDE/LONGITUDE plus every counter, upper-cased.
    fn collision_columns(
        date: (DataType, ArrayRef),
        boroughs: Vec<Option<&str>>,
        coords: Vec<(f64, f64)>,
    ) -> (Arc<Schema>, Vec<ArrayRef>) {
        let rows = boroughs.len();
        let mut fields = vec![
            Field::new("DATE", date.0, true),
            Field::new("BOROUGH", DataType::Utf8, true),
            Field::new("LATITUDE", DataType::Float64, true),
            Field::new("LONGITUDE", DataType::Float64, true),
        ];
        let mut columns: Vec<ArrayRef> = vec![
            date.1,
            Arc::new(StringArray::from(boroughs)),
            Arc::new(Float64Array::from_iter_values(coords.iter().map(|c| c.0))),
            Arc::new(Float64Array::from_iter_values(coords.iter().map(|c| c.1))),
        ];
        for (n, m) in Metric::ALL.iter().enumerate() {
            fields.push(Field::new(m.column().to_uppercase(), DataType::Int64, true));
            columns.push(Arc::new(Int64Array::from(vec![n as i64 + 1; rows])));
        }
        (Arc::new(Schema::new(fields)), columns)
    }

    fn write_parquet(path: &Path, schema: Arc<Schema>, batch: Option<RecordBatch>) {
        let file = File::create(path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        if let Some(batch) = batch {
            writer.write(&batch).unwrap();
        }
        writer.close().unwrap();
    }

    #[test]
    fn loads_typed_parquet_columns() {
        let dates: ArrayRef = Arc::new(StringArray::from(vec!["2016-01-01", "2016-01-02"]));
        let (schema, columns) = collision_columns(
            (DataType::Utf8, dates),
            vec![Some("MANHATTAN"), None],
            vec![(40.75, -73.99), (40.70, -73.95)],
        );
        let batch = RecordBatch::try_new(schema.clone(), columns).unwrap();

        let path = temp_path("typed.parquet");
        write_parquet(&path, schema, Some(batch));
        let ds = load_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(ds.len(), 1);
        assert_eq!(ds.dropped_rows, 1);
        assert_eq!(ds.records[0].borough, "MANHATTAN");
        assert_eq!(ds.records[0].metric(Metric::PersonsInjured), Some(1));
        assert_eq!(ds.records[0].metric(Metric::MotoristsKilled), Some(8));
        assert!((ds.records[0].latitude - 40.75).abs() < f64::EPSILON);
    }

    #[test]
    fn parquet_without_rows_loads_as_empty_dataset() {
        let dates: ArrayRef = Arc::new(StringArray::from(Vec::<&str>::new()));
        let (schema, _) = collision_columns((DataType::Utf8, dates), Vec::new(), Vec::new());

        let path = temp_path("empty.parquet");
        write_parquet(&path, schema, None);
        let ds = load_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert!(ds.is_empty());
        assert_eq!(ds.dropped_rows, 0);
        assert!(ds.extra_columns.is_empty());
    }

    #[test]
    fn parquet_without_rows_still_checks_the_schema() {
        let schema = Arc::new(Schema::new(vec![Field::new("DATE", DataType::Utf8, true)]));

        let path = temp_path("date-only.parquet");
        write_parquet(&path, schema, None);
        let err = load_file(&path).unwrap_err();
        std::fs::remove_file(&path).ok();

        assert!(matches!(err, LoadError::Schema(_)));
    }

    #[test]
    fn zoned_parquet_timestamps_become_utc_dates() {
        // 2016-01-01T23:30:00Z and 2016-01-02T00:15:00Z
        let stamps =
            TimestampSecondArray::from(vec![1_451_691_000, 1_451_693_700]).with_timezone("UTC");
        let date_type = DataType::Timestamp(TimeUnit::Second, Some("UTC".into()));
        let (schema, columns) = collision_columns(
            (date_type, Arc::new(stamps)),
            vec![Some("QUEENS"), Some("BRONX")],
            vec![(40.72, -73.79), (40.84, -73.86)],
        );
        let batch = RecordBatch::try_new(schema.clone(), columns).unwrap();

        let path = temp_path("zoned.parquet");
        write_parquet(&path, schema, Some(batch));
        let ds = load_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        let dates: Vec<NaiveDate> = ds.records.iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![date("2016-01-01"), date("2016-01-02")]);
    }

    #[test]
    fn csv_files_load_by_extension() {
        let path = temp_path("by-extension.CSV");
        let text = csv_with(&["2016-01-01,00:10,BRONX,10451,40.82,-73.92,,2,0,0,0,0,0,2,0,,,,1"]);
        std::fs::write(&path, text).unwrap();
        let ds = load_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(ds.len(), 1);
        assert_eq!(ds.records[0].metric(Metric::MotoristsInjured), Some(2));
    }
}
