use eframe::egui::Ui;
use egui_extras::{Column, TableBuilder};

use crate::data::model::{Dataset, Metric, Record};

const ROW_HEIGHT: f32 = 18.0;

/// Column headers in display order: core fields, counters, then retained extras.
fn headers(dataset: &Dataset) -> Vec<String> {
    ["date", "borough", "latitude", "longitude"]
        .into_iter()
        .map(str::to_string)
        .chain(Metric::ALL.into_iter().map(|m| m.column().to_string()))
        .chain(dataset.extra_columns.iter().cloned())
        .collect()
}

fn cells(record: &Record, extra_columns: &[String]) -> Vec<String> {
    let mut cells = vec![
        record.date.to_string(),
        record.borough.clone(),
        format!("{:.5}", record.latitude),
        format!("{:.5}", record.longitude),
    ];
    cells.extend(
        Metric::ALL
            .into_iter()
            .map(|m| record.metric(m).map(|v| v.to_string()).unwrap_or_default()),
    );
    cells.extend(
        extra_columns
            .iter()
            .map(|c| record.extra.get(c).cloned().unwrap_or_default()),
    );
    cells
}

/// Render records as a scrollable table: the rows at `indices`, or every row.
pub fn record_table(ui: &mut Ui, dataset: &Dataset, indices: Option<&[usize]>) {
    let headers = headers(dataset);
    let n_rows = indices.map_or(dataset.len(), <[usize]>::len);

    TableBuilder::new(ui)
        .striped(true)
        .resizable(true)
        .max_scroll_height(320.0)
        .columns(Column::auto().at_least(60.0), headers.len())
        .header(20.0, |mut header| {
            for name in &headers {
                header.col(|ui: &mut Ui| {
                    ui.strong(name);
                });
            }
        })
        .body(|body| {
            body.rows(ROW_HEIGHT, n_rows, |mut row| {
                let idx = indices.map_or(row.index(), |ix| ix[row.index()]);
                for text in cells(&dataset.records[idx], &dataset.extra_columns) {
                    row.col(|ui: &mut Ui| {
                        ui.label(text);
                    });
                }
            });
        });
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn cells_line_up_with_headers() {
        let mut counts = [Some(0); Metric::COUNT];
        counts[Metric::MotoristsInjured.index()] = None;
        let record = Record {
            date: NaiveDate::from_ymd_opt(2016, 1, 1).unwrap(),
            borough: "BRONX".to_string(),
            latitude: 40.8,
            longitude: -73.9,
            counts,
            extra: BTreeMap::from([("zip code".to_string(), "10451".to_string())]),
        };
        let extras = vec!["time".to_string(), "zip code".to_string()];
        let ds = Dataset::new(vec![record.clone()], extras.clone(), 0);

        let headers = headers(&ds);
        let cells = cells(&record, &extras);
        assert_eq!(headers.len(), cells.len());
        assert_eq!(headers[10], "motorists injured");
        assert_eq!(cells[10], "");
        assert_eq!(cells[12], "");
        assert_eq!(cells[13], "10451");
    }
}
