use std::fs::File;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use arrow::util::pretty::pretty_format_batches;
use chrono::{Duration, NaiveDate};
use parquet::arrow::ArrowWriter;

const CSV_PATH: &str = "nyc_veh_crash_sample.csv";
const PARQUET_PATH: &str = "nyc_veh_crash_sample.parquet";
const ROWS: usize = 2_000;

const HEADER: [&str; 29] = [
    "DATE",
    "TIME",
    "BOROUGH",
    "ZIP CODE",
    "LATITUDE",
    "LONGITUDE",
    "LOCATION",
    "ON STREET NAME",
    "CROSS STREET NAME",
    "OFF STREET NAME",
    "PERSONS INJURED",
    "PERSONS KILLED",
    "PEDESTRIANS INJURED",
    "PEDESTRIANS KILLED",
    "CYCLISTS INJURED",
    "CYCLISTS KILLED",
    "MOTORISTS INJURED",
    "MOTORISTS KILLED",
    "VEHICLE 1 TYPE",
    "VEHICLE 2 TYPE",
    "VEHICLE 3 TYPE",
    "VEHICLE 4 TYPE",
    "VEHICLE 5 TYPE",
    "VEHICLE 1 FACTOR",
    "VEHICLE 2 FACTOR",
    "VEHICLE 3 FACTOR",
    "VEHICLE 4 FACTOR",
    "VEHICLE 5 FACTOR",
    "UNIQUE KEY",
];

/// Borough name, rough centre (lat, lon), a representative zip code and street.
const BOROUGHS: [(&str, f64, f64, &str, &str); 5] = [
    ("MANHATTAN", 40.7831, -73.9712, "10019", "BROADWAY"),
    ("BROOKLYN", 40.6782, -73.9442, "11201", "ATLANTIC AVENUE"),
    ("QUEENS", 40.7282, -73.7949, "11368", "QUEENS BOULEVARD"),
    ("BRONX", 40.8448, -73.8648, "10451", "GRAND CONCOURSE"),
    ("STATEN ISLAND", 40.5795, -74.1502, "10314", "RICHMOND AVENUE"),
];

const VEHICLES: [&str; 5] = [
    "PASSENGER VEHICLE",
    "SPORT UTILITY / STATION WAGON",
    "TAXI",
    "BICYCLE",
    "BUS",
];
const FACTORS: [&str; 4] = [
    "Unspecified",
    "Driver Inattention/Distraction",
    "Failure to Yield Right-of-Way",
    "Following Too Closely",
];

/// Minimal deterministic PRNG (splitmix64)
struct SampleRng(u64);

impl SampleRng {
    fn next_u64(&mut self) -> u64 {
        self.0 = self.0.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn below(&mut self, n: usize) -> usize {
        (self.next_u64() % n as u64) as usize
    }

    fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Small counts skewed towards zero.
    fn casualties(&mut self, p: f64) -> u32 {
        let mut n = 0;
        while n < 6 && self.chance(p) {
            n += 1;
        }
        n
    }
}

/// A random entry of `choices` for occupied vehicle slots, empty otherwise.
fn pick_if(rng: &mut SampleRng, occupied: bool, choices: &[&str]) -> String {
    if occupied {
        choices[rng.below(choices.len())].to_string()
    } else {
        String::new()
    }
}

fn sample_rows(rng: &mut SampleRng) -> Vec<Vec<String>> {
    let first_day = NaiveDate::from_ymd_opt(2015, 1, 1).unwrap_or_default();
    let days = 790;

    (0..ROWS)
        .map(|i| {
            let date = first_day + Duration::days(rng.below(days) as i64);
            let (borough, lat, lon, zip, street) = BOROUGHS[rng.below(BOROUGHS.len())];
            let lat = lat + (rng.next_f64() - 0.5) * 0.08;
            let lon = lon + (rng.next_f64() - 0.5) * 0.08;

            let pedestrians = rng.casualties(0.12);
            let cyclists = rng.casualties(0.06);
            let motorists = rng.casualties(0.2);
            let killed = |rng: &mut SampleRng| u32::from(rng.chance(0.004));
            let (ped_killed, cyc_killed, mot_killed) = (killed(rng), killed(rng), killed(rng));

            // Some rows lack a location or borough, as in the open-data export.
            let located = !rng.chance(0.08);
            let has_borough = !rng.chance(0.05);

            let mut row = vec![
                date.format("%m/%d/%Y").to_string(),
                format!("{}:{:02}", rng.below(24), rng.below(60)),
                if has_borough { borough.to_string() } else { String::new() },
                zip.to_string(),
                if located { format!("{lat:.7}") } else { String::new() },
                if located { format!("{lon:.7}") } else { String::new() },
                if located { format!("({lat:.7}, {lon:.7})") } else { String::new() },
                street.to_string(),
                String::new(),
                String::new(),
                (pedestrians + cyclists + motorists).to_string(),
                (ped_killed + cyc_killed + mot_killed).to_string(),
                pedestrians.to_string(),
                ped_killed.to_string(),
                cyclists.to_string(),
                cyc_killed.to_string(),
                motorists.to_string(),
                mot_killed.to_string(),
            ];

            let vehicles = 1 + rng.below(3);
            let types: Vec<String> = (0..5)
                .map(|slot| pick_if(rng, slot < vehicles, &VEHICLES))
                .collect();
            let factors: Vec<String> = (0..5)
                .map(|slot| pick_if(rng, slot < vehicles, &FACTORS))
                .collect();
            row.extend(types);
            row.extend(factors);
            row.push((3_000_000 + i).to_string());
            row
        })
        .collect()
}

fn write_csv(rows: &[Vec<String>]) -> Result<()> {
    let mut writer = csv::Writer::from_path(CSV_PATH).context("creating CSV output")?;
    writer.write_record(HEADER)?;
    for row in rows {
        writer.write_record(row)?;
    }
    writer.flush().context("flushing CSV output")?;
    Ok(())
}

/// Parquet copy with every column as nullable text; empty cells become nulls.
fn write_parquet(rows: &[Vec<String>]) -> Result<RecordBatch> {
    let schema = Arc::new(Schema::new(
        HEADER
            .iter()
            .map(|name| Field::new(*name, DataType::Utf8, true))
            .collect::<Vec<_>>(),
    ));

    let columns: Vec<ArrayRef> = (0..HEADER.len())
        .map(|col| {
            let values: StringArray = rows
                .iter()
                .map(|row| Some(row[col].as_str()).filter(|v| !v.is_empty()))
                .collect();
            Arc::new(values) as ArrayRef
        })
        .collect();

    let batch = RecordBatch::try_new(schema.clone(), columns).context("building record batch")?;

    let file = File::create(PARQUET_PATH).context("creating Parquet output")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating Parquet writer")?;
    writer.write(&batch).context("writing Parquet batch")?;
    writer.close().context("closing Parquet writer")?;
    Ok(batch)
}

fn main() -> Result<()> {
    let mut rng = SampleRng(2016);
    let rows = sample_rows(&mut rng);

    write_csv(&rows)?;
    let batch = write_parquet(&rows)?;

    println!("{}", pretty_format_batches(&[batch.slice(0, 5)])?);
    println!("Wrote {} collisions to {CSV_PATH} and {PARQUET_PATH}", rows.len());
    Ok(())
}
