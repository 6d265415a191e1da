//! Projection: stored records → response bodies.
//!
//! Daily snapshots render tidy, one row per record. Case series render wide,
//! pivoted on the union of dates present in the point set. Both shapes have
//! a CSV and a JSON form; JSON is an object keyed by zero-based row index.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::NaiveDate;
use csv::{QuoteStyle, Terminator, WriterBuilder};
use epi_core::{
  CaseKind, Stored,
  query::OutputFormat,
  series::{CaseSeries, SeriesPoint},
  snapshot::DailySnapshot,
};
use serde_json::{Map, Value, json};

use crate::{Error, Result, row::TIMESTAMP_FORMAT, schema::WIDE_DATE_FORMAT};

pub const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// A response body together with its media type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
  pub content_type: &'static str,
  pub body:         Vec<u8>,
}

impl Rendered {
  fn csv(body: Vec<u8>) -> Self { Self { content_type: CSV_CONTENT_TYPE, body } }

  fn json(value: &Value) -> Result<Self> {
    Ok(Self { content_type: JSON_CONTENT_TYPE, body: serde_json::to_vec(value)? })
  }
}

/// Serialise `rows` (header first) as CSV. Rows may be ragged.
fn write_csv(rows: impl IntoIterator<Item = Vec<String>>) -> Result<Vec<u8>> {
  let mut writer = WriterBuilder::new()
    .flexible(true)
    .quote_style(QuoteStyle::Necessary)
    .terminator(Terminator::CRLF)
    .from_writer(Vec::new());
  for row in rows {
    writer.write_record(&row)?;
  }
  writer.into_inner().map_err(|e| Error::Io(e.into_error()))
}

/// Floats keep a fractional part (`5.0`, not `5`), matching how JSON renders
/// them.
fn float_cell(value: f64) -> String { format!("{value:?}") }

fn index_keyed(rows: impl IntoIterator<Item = Map<String, Value>>) -> Value {
  Value::Object(
    rows
      .into_iter()
      .enumerate()
      .map(|(i, row)| (i.to_string(), Value::Object(row)))
      .collect(),
  )
}

// ─── Tidy ────────────────────────────────────────────────────────────────────

fn snapshot_header(columns: &[CaseKind]) -> Vec<String> {
  let mut header = vec!["Province_State", "Country_Region", "Last_Update"];
  header.extend(columns.iter().map(|k| k.title()));
  header.extend(["Combined_Key", "Incidence_Rate", "Case-Fatality_Ratio"]);
  header.into_iter().map(str::to_owned).collect()
}

/// Render daily snapshots with only the requested value `columns`, which
/// must already be in output order.
pub fn render_snapshots(
  records: &[DailySnapshot],
  columns: &[CaseKind],
  format: OutputFormat,
) -> Result<Rendered> {
  match format {
    OutputFormat::Csv => {
      let rows = records.iter().map(|r| {
        let mut row = vec![
          r.province_state.clone(),
          r.country_region.clone(),
          r.last_update.format(TIMESTAMP_FORMAT).to_string(),
        ];
        row.extend(columns.iter().map(|k| r.count(*k).to_string()));
        row.extend([
          r.combined_key.clone(),
          float_cell(r.incidence_rate),
          float_cell(r.case_fatality_ratio),
        ]);
        row
      });
      let header = snapshot_header(columns);
      Ok(Rendered::csv(write_csv(std::iter::once(header).chain(rows))?))
    }
    OutputFormat::Json => {
      let rows = records.iter().map(|r| {
        let mut row = Map::new();
        row.insert("Province_State".into(), json!(r.province_state));
        row.insert("Country_Region".into(), json!(r.country_region));
        row.insert(
          "Last_Update".into(),
          json!(r.last_update.format(TIMESTAMP_FORMAT).to_string()),
        );
        for kind in columns {
          row.insert(kind.title().into(), json!(r.count(*kind)));
        }
        row.insert("Combined_Key".into(), json!(r.combined_key));
        row.insert("Incidence_Rate".into(), json!(r.incidence_rate));
        row.insert("Case-Fatality_Ratio".into(), json!(r.case_fatality_ratio));
        row
      });
      Rendered::json(&index_keyed(rows))
    }
  }
}

// ─── Wide ────────────────────────────────────────────────────────────────────

/// Render `series` pivoted on date. Points are matched to series by id;
/// points whose series is not listed are ignored.
pub fn render_series(
  series: &[Stored<CaseSeries>],
  points: &[SeriesPoint],
  format: OutputFormat,
) -> Result<Rendered> {
  let mut by_series: HashMap<i64, BTreeMap<NaiveDate, i64>> = HashMap::new();
  for p in points {
    by_series.entry(p.series_id).or_default().insert(p.date, p.cases);
  }
  let dates: BTreeSet<NaiveDate> = series
    .iter()
    .filter_map(|s| by_series.get(&s.id))
    .flat_map(|counts| counts.keys().copied())
    .collect();
  let empty = BTreeMap::new();
  let label = |d: &NaiveDate| d.format(WIDE_DATE_FORMAT).to_string();

  match format {
    OutputFormat::Csv => {
      let mut header: Vec<String> = ["Province/State", "Country/Region", "Lat", "Long"]
        .into_iter()
        .map(str::to_owned)
        .collect();
      header.extend(dates.iter().map(label));

      let rows = series.iter().map(|s| {
        let counts = by_series.get(&s.id).unwrap_or(&empty);
        let mut row = vec![
          s.record.province_state.clone(),
          s.record.country_region.clone(),
          float_cell(s.record.lat),
          float_cell(s.record.long),
        ];
        row.extend(
          dates
            .iter()
            .map(|d| counts.get(d).map(i64::to_string).unwrap_or_default()),
        );
        // Gaps inside the row stay as empty cells; trailing gaps are dropped.
        while row.len() > 4 && row.last().is_some_and(String::is_empty) {
          row.pop();
        }
        row
      });
      Ok(Rendered::csv(write_csv(std::iter::once(header).chain(rows))?))
    }
    OutputFormat::Json => {
      let rows = series.iter().map(|s| {
        let mut row = Map::new();
        row.insert("Province/State".into(), json!(s.record.province_state));
        row.insert("Country/Region".into(), json!(s.record.country_region));
        row.insert("Lat".into(), json!(s.record.lat));
        row.insert("Long".into(), json!(s.record.long));
        for (date, cases) in by_series.get(&s.id).unwrap_or(&empty) {
          row.insert(label(date), json!(cases));
        }
        row
      });
      Rendered::json(&index_keyed(rows))
    }
  }
}
