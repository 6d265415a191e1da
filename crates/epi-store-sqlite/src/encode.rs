//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as `YYYY-MM-DD HH:MM:SS` (UTC) and dates as
//! `YYYY-MM-DD`, so lexical order is chronological and range predicates can
//! compare text directly. Case kinds are stored as their one-letter code.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use epi_core::{
  CaseKind, Stored,
  series::{CaseSeries, SeriesPoint},
  snapshot::DailySnapshot,
};

use crate::{Error, Result};

const DT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const DATE_FORMAT: &str = "%Y-%m-%d";

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.format(DT_FORMAT).to_string() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  NaiveDateTime::parse_from_str(s, DT_FORMAT)
    .map(|dt| dt.and_utc())
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── NaiveDate ───────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format(DATE_FORMAT).to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, DATE_FORMAT)
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── CaseKind ────────────────────────────────────────────────────────────────

pub fn decode_kind(s: &str) -> Result<CaseKind> { Ok(CaseKind::from_code(s)?) }

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawSnapshot::from_row`].
pub const SNAPSHOT_COLUMNS: &str = "id, dataset, fips, admin2, province_state, \
   country_region, last_update, lat, long, confirmed, deaths, recovered, active, \
   combined_key, incidence_rate, case_fatality_ratio";

/// Raw values read directly from a `daily_reports` row.
pub struct RawSnapshot {
  pub id:                  i64,
  pub dataset:             String,
  pub fips:                i64,
  pub admin2:              String,
  pub province_state:      String,
  pub country_region:      String,
  pub last_update:         String,
  pub lat:                 f64,
  pub long:                f64,
  pub confirmed:           i64,
  pub deaths:              i64,
  pub recovered:           i64,
  pub active:              i64,
  pub combined_key:        String,
  pub incidence_rate:      f64,
  pub case_fatality_ratio: f64,
}

impl RawSnapshot {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:                  row.get(0)?,
      dataset:             row.get(1)?,
      fips:                row.get(2)?,
      admin2:              row.get(3)?,
      province_state:      row.get(4)?,
      country_region:      row.get(5)?,
      last_update:         row.get(6)?,
      lat:                 row.get(7)?,
      long:                row.get(8)?,
      confirmed:           row.get(9)?,
      deaths:              row.get(10)?,
      recovered:           row.get(11)?,
      active:              row.get(12)?,
      combined_key:        row.get(13)?,
      incidence_rate:      row.get(14)?,
      case_fatality_ratio: row.get(15)?,
    })
  }

  pub fn into_stored(self) -> Result<Stored<DailySnapshot>> {
    Ok(Stored {
      id:     self.id,
      record: DailySnapshot {
        dataset:             self.dataset,
        fips:                self.fips,
        admin2:              self.admin2,
        province_state:      self.province_state,
        country_region:      self.country_region,
        last_update:         decode_dt(&self.last_update)?,
        lat:                 self.lat,
        long:                self.long,
        confirmed:           self.confirmed,
        deaths:              self.deaths,
        recovered:           self.recovered,
        active:              self.active,
        combined_key:        self.combined_key,
        incidence_rate:      self.incidence_rate,
        case_fatality_ratio: self.case_fatality_ratio,
      },
    })
  }
}

/// Column list matching [`RawSeries::from_row`].
pub const SERIES_COLUMNS: &str =
  "id, dataset, kind, province_state, country_region, lat, long";

/// Raw values read directly from a `time_series` row.
pub struct RawSeries {
  pub id:             i64,
  pub dataset:        String,
  pub kind:           String,
  pub province_state: String,
  pub country_region: String,
  pub lat:            f64,
  pub long:           f64,
}

impl RawSeries {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:             row.get(0)?,
      dataset:        row.get(1)?,
      kind:           row.get(2)?,
      province_state: row.get(3)?,
      country_region: row.get(4)?,
      lat:            row.get(5)?,
      long:           row.get(6)?,
    })
  }

  pub fn into_stored(self) -> Result<Stored<CaseSeries>> {
    Ok(Stored {
      id:     self.id,
      record: CaseSeries {
        dataset:        self.dataset,
        kind:           decode_kind(&self.kind)?,
        province_state: self.province_state,
        country_region: self.country_region,
        lat:            self.lat,
        long:           self.long,
      },
    })
  }
}

/// Raw values read directly from a `time_series_points` row.
pub struct RawPoint {
  pub id:        i64,
  pub series_id: i64,
  pub date:      String,
  pub cases:     i64,
}

impl RawPoint {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:        row.get(0)?,
      series_id: row.get(1)?,
      date:      row.get(2)?,
      cases:     row.get(3)?,
    })
  }

  pub fn into_stored(self) -> Result<Stored<SeriesPoint>> {
    Ok(Stored {
      id:     self.id,
      record: SeriesPoint {
        series_id: self.series_id,
        date:      decode_date(&self.date)?,
        cases:     self.cases,
      },
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn timestamps_round_trip_as_sortable_text() {
    let dt = Utc.with_ymd_and_hms(2020, 6, 6, 2, 33, 0).unwrap();
    assert_eq!(encode_dt(dt), "2020-06-06 02:33:00");
    assert_eq!(decode_dt("2020-06-06 02:33:00").unwrap(), dt);
    assert!(encode_dt(dt) < encode_dt(Utc.with_ymd_and_hms(2020, 6, 10, 0, 0, 0).unwrap()));
  }

  #[test]
  fn bad_stored_values_are_errors() {
    assert!(matches!(decode_dt("2020-06-06T02:33:00Z"), Err(Error::DateParse(_))));
    assert!(matches!(decode_date("01/22/20"), Err(Error::DateParse(_))));
    assert!(matches!(decode_kind("A"), Err(Error::Core(_))));
    assert_eq!(decode_kind("D").unwrap(), CaseKind::Deaths);
  }
}
