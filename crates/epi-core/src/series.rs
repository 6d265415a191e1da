//! Case series: per-location, date-indexed counts of one case kind.
//!
//! A [`CaseSeries`] is the identity envelope; its counts live in
//! [`SeriesPoint`] rows owned by that series and removed with it.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{CaseKind, reconcile::Reconcile};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseSeries {
  pub dataset:        String,
  /// Always a stored kind; `Active` series are only ever derived.
  pub kind:           CaseKind,
  pub province_state: String,
  pub country_region: String,
  /// Representative coordinates; last write wins.
  pub lat:            f64,
  pub long:           f64,
}

/// Natural identity of a [`CaseSeries`]. Coordinates are not part of it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SeriesKey {
  pub dataset:        String,
  pub kind:           CaseKind,
  pub province_state: String,
  pub country_region: String,
}

impl CaseSeries {
  /// Whether `other` describes the same location under the same dataset,
  /// coordinates included. Used to pair series of different kinds.
  pub fn same_location(&self, other: &CaseSeries) -> bool {
    self.dataset == other.dataset
      && self.province_state == other.province_state
      && self.country_region == other.country_region
      && self.lat == other.lat
      && self.long == other.long
  }
}

impl Reconcile for CaseSeries {
  type Key = SeriesKey;

  fn natural_key(&self) -> SeriesKey {
    SeriesKey {
      dataset:        self.dataset.clone(),
      kind:           self.kind,
      province_state: self.province_state.clone(),
      country_region: self.country_region.clone(),
    }
  }

  fn absorb(&mut self, incoming: Self) {
    self.lat = incoming.lat;
    self.long = incoming.long;
  }
}

/// One day's count for one series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesPoint {
  pub series_id: i64,
  pub date:      NaiveDate,
  pub cases:     i64,
}

impl Reconcile for SeriesPoint {
  /// Scoped to the owning series, so two series can never collide.
  type Key = (i64, NaiveDate);

  fn natural_key(&self) -> Self::Key { (self.series_id, self.date) }

  fn absorb(&mut self, incoming: Self) { self.cases = incoming.cases; }
}

/// A typed wide-format upload row: the series identity plus its counts in
/// header order.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesRow {
  pub series: CaseSeries,
  pub counts: Vec<(NaiveDate, i64)>,
}

impl SeriesRow {
  /// Attach the counts to a resolved series id.
  pub fn points(&self, series_id: i64) -> impl Iterator<Item = SeriesPoint> + '_ {
    self
      .counts
      .iter()
      .map(move |&(date, cases)| SeriesPoint { series_id, date, cases })
  }
}
