//! Daily location snapshots: one observation of a dataset at one location
//! at one timestamp.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{CaseKind, reconcile::Reconcile};

/// A single tidy-format row as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySnapshot {
  pub dataset:             String,
  /// Facility code; `-1` when the upload left it empty.
  pub fips:                i64,
  pub admin2:              String,
  pub province_state:      String,
  pub country_region:      String,
  pub last_update:         DateTime<Utc>,
  pub lat:                 f64,
  pub long:                f64,
  pub confirmed:           i64,
  pub deaths:              i64,
  pub recovered:           i64,
  /// May be negative only when the upstream counts are inconsistent.
  pub active:              i64,
  pub combined_key:        String,
  pub incidence_rate:      f64,
  pub case_fatality_ratio: f64,
}

/// Natural identity of a [`DailySnapshot`].
///
/// `admin2` is part of the key, so county-level rows that share a state,
/// country and timestamp stay distinct. Keying on the state alone would fold
/// every county of one report into a single row.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SnapshotKey {
  pub dataset:        String,
  pub admin2:         String,
  pub province_state: String,
  pub country_region: String,
  pub last_update:    DateTime<Utc>,
}

impl DailySnapshot {
  /// The stored count for one value column.
  pub fn count(&self, kind: CaseKind) -> i64 {
    match kind {
      CaseKind::Active => self.active,
      CaseKind::Confirmed => self.confirmed,
      CaseKind::Deaths => self.deaths,
      CaseKind::Recovered => self.recovered,
    }
  }
}

impl Reconcile for DailySnapshot {
  type Key = SnapshotKey;

  fn natural_key(&self) -> SnapshotKey {
    SnapshotKey {
      dataset:        self.dataset.clone(),
      admin2:         self.admin2.clone(),
      province_state: self.province_state.clone(),
      country_region: self.country_region.clone(),
      last_update:    self.last_update,
    }
  }

  /// Counts and rates only.
  fn absorb(&mut self, incoming: Self) {
    self.confirmed = incoming.confirmed;
    self.deaths = incoming.deaths;
    self.recovered = incoming.recovered;
    self.active = incoming.active;
    self.incidence_rate = incoming.incidence_rate;
    self.case_fatality_ratio = incoming.case_fatality_ratio;
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  fn snapshot() -> DailySnapshot {
    DailySnapshot {
      dataset:             "d".into(),
      fips:                45001,
      admin2:              "Abbeville".into(),
      province_state:      "South Carolina".into(),
      country_region:      "US".into(),
      last_update:         Utc.with_ymd_and_hms(2020, 6, 6, 2, 33, 0).unwrap(),
      lat:                 34.22,
      long:                -82.46,
      confirmed:           47,
      deaths:              0,
      recovered:           0,
      active:              47,
      combined_key:        "Abbeville, South Carolina, US".into(),
      incidence_rate:      191.6,
      case_fatality_ratio: 0.0,
    }
  }

  #[test]
  fn absorb_leaves_identity_alone() {
    let mut stored = snapshot();
    let mut incoming = snapshot();
    incoming.fips = 1;
    incoming.lat = 10.0;
    incoming.combined_key = "elsewhere".into();
    incoming.deaths = 5;
    incoming.case_fatality_ratio = 10.6;

    stored.absorb(incoming);
    assert_eq!(stored.fips, 45001);
    assert_eq!(stored.lat, 34.22);
    assert_eq!(stored.combined_key, "Abbeville, South Carolina, US");
    assert_eq!(stored.deaths, 5);
    assert_eq!(stored.case_fatality_ratio, 10.6);
  }

  #[test]
  fn count_selects_column() {
    let s = snapshot();
    assert_eq!(s.count(CaseKind::Confirmed), 47);
    assert_eq!(s.count(CaseKind::Active), 47);
    assert_eq!(s.count(CaseKind::Deaths), 0);
  }

  #[test]
  fn counties_of_one_state_have_distinct_keys() {
    let abbeville = snapshot();
    let aiken = DailySnapshot { admin2: "Aiken".into(), ..snapshot() };
    assert_ne!(abbeville.natural_key(), aiken.natural_key());

    let restated = DailySnapshot { confirmed: 50, combined_key: "x".into(), ..snapshot() };
    assert_eq!(abbeville.natural_key(), restated.natural_key());
  }
}
