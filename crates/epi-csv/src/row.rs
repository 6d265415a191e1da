//! Row typing: one raw CSV record → one typed record, or a rejection reason.
//!
//! Rejections carry a human-readable reason only; the reader attaches the
//! line number and aborts the batch.

use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use csv::StringRecord;
use epi_core::{
  CaseKind,
  series::{CaseSeries, SeriesRow},
  snapshot::DailySnapshot,
};

/// Accepted format for `Last_Update`, interpreted as UTC.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Why a row was rejected.
pub type Reject = String;

/// Knobs for tidy-row typing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypingOptions {
  /// Replace an `Active` of 0 (or empty) with
  /// `Confirmed − Deaths − Recovered`. A genuinely-zero active count cannot
  /// survive this.
  pub derive_active_on_zero: bool,
}

impl Default for TypingOptions {
  fn default() -> Self { Self { derive_active_on_zero: true } }
}

fn or_default<'a>(raw: &'a str, default: &'a str) -> &'a str {
  if raw.is_empty() { default } else { raw }
}

fn parse<T: FromStr>(name: &str, raw: &str) -> Result<T, Reject> {
  raw
    .parse()
    .map_err(|_| format!("{name} {raw:?} is not a valid number"))
}

fn non_empty<'a>(name: &str, raw: &'a str) -> Result<&'a str, Reject> {
  if raw.is_empty() {
    Err(format!("{name} is empty"))
  } else {
    Ok(raw)
  }
}

fn finite(name: &str, value: f64) -> Result<f64, Reject> {
  if value.is_finite() {
    Ok(value)
  } else {
    Err(format!("{name} {value} is not a finite number"))
  }
}

fn check_coordinates(lat: f64, long: f64) -> Result<(), Reject> {
  if !(-90.0..=90.0).contains(&lat) {
    return Err(format!("latitude {lat} is outside [-90, 90]"));
  }
  if !(-180.0..=180.0).contains(&long) {
    return Err(format!("longitude {long} is outside [-180, 180]"));
  }
  Ok(())
}

/// Type one row of a tidy (daily snapshot) upload.
///
/// `header_len` is the validated header width; extra trailing fields are
/// ignored, missing ones reject the row.
pub fn type_snapshot_row(
  dataset: &str,
  header_len: usize,
  row: &StringRecord,
  options: TypingOptions,
) -> Result<DailySnapshot, Reject> {
  if row.len() < header_len {
    return Err(format!("expected {header_len} fields, found {}", row.len()));
  }
  let field = move |i: usize| row.get(i).unwrap_or_default();

  let country_region = non_empty("Country_Region", field(3))?;
  let last_update = non_empty("Last_Update", field(4))?;
  let incidence_rate = non_empty("Incidence_Rate", field(12))?;
  let case_fatality_ratio = non_empty("Case-Fatality_Ratio", field(13))?;

  let fips: i64 = parse("FIPS", or_default(field(0), "-1"))?;
  let lat: f64 = parse("Lat", or_default(field(5), "0.0"))?;
  let long: f64 = parse("Long_", or_default(field(6), "0.0"))?;
  let confirmed: i64 = parse("Confirmed", or_default(field(7), "0"))?;
  let deaths: i64 = parse("Deaths", or_default(field(8), "0"))?;
  let recovered: i64 = parse("Recovered", or_default(field(9), "0"))?;
  let mut active: i64 = parse("Active", or_default(field(10), "0"))?;
  let incidence_rate = finite("Incidence_Rate", parse("Incidence_Rate", incidence_rate)?)?;
  let case_fatality_ratio =
    finite("Case-Fatality_Ratio", parse("Case-Fatality_Ratio", case_fatality_ratio)?)?;

  let last_update = NaiveDateTime::parse_from_str(last_update, TIMESTAMP_FORMAT)
    .map_err(|_| format!("Last_Update {last_update:?} is not YYYY-MM-DD HH:MM:SS"))?
    .and_utc();

  if active == 0 && options.derive_active_on_zero {
    active = confirmed
      .checked_sub(deaths)
      .and_then(|a| a.checked_sub(recovered))
      .ok_or_else(|| {
        format!("Active {confirmed} - {deaths} - {recovered} overflows a 64-bit count")
      })?;
  }

  check_coordinates(lat, long)?;

  Ok(DailySnapshot {
    dataset: dataset.to_owned(),
    fips,
    admin2: field(1).to_owned(),
    province_state: field(2).to_owned(),
    country_region: country_region.to_owned(),
    last_update,
    lat,
    long,
    confirmed,
    deaths,
    recovered,
    active,
    combined_key: field(11).to_owned(),
    incidence_rate,
    case_fatality_ratio,
  })
}

/// Type one row of a wide (time series) upload. `dates` are the validated
/// header's date columns.
pub fn type_series_row(
  dataset: &str,
  kind: CaseKind,
  dates: &[NaiveDate],
  row: &StringRecord,
) -> Result<SeriesRow, Reject> {
  let width = dates.len() + 4;
  if row.len() != width {
    return Err(format!("expected {width} fields, found {}", row.len()));
  }

  let country_region = non_empty("Country/Region", &row[1])?;
  let lat: f64 = parse("Lat", or_default(&row[2], "0.0"))?;
  let long: f64 = parse("Long", or_default(&row[3], "0.0"))?;
  check_coordinates(lat, long)?;

  let counts = dates
    .iter()
    .zip(row.iter().skip(4))
    .map(|(date, raw)| {
      if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("count {raw:?} for {date} is not a non-negative integer"));
      }
      parse::<i64>("count", raw).map(|cases| (*date, cases))
    })
    .collect::<Result<Vec<_>, _>>()?;

  Ok(SeriesRow {
    series: CaseSeries {
      dataset: dataset.to_owned(),
      kind,
      province_state: row[0].to_owned(),
      country_region: country_region.to_owned(),
      lat,
      long,
    },
    counts,
  })
}
