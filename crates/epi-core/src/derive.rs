//! Derived `active` series: confirmed − deaths, all or nothing.
//!
//! No `active` series is ever stored. It is computed per request from the
//! confirmed and deaths series that match the same location filters. Any
//! misalignment between the two sides, or any negative day, makes the whole
//! derived result unavailable; a partial join is never returned.

use std::collections::HashMap;

use chrono::NaiveDate;
use thiserror::Error;

use crate::{
  Stored,
  series::{CaseSeries, SeriesPoint},
};

/// Why a derived series could not be produced. Not a request failure: the
/// caller answers with an empty projection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Unavailable {
  #[error("no confirmed series")]
  NoConfirmedSeries,
  #[error("no deaths series")]
  NoDeathsSeries,
  #[error("{confirmed} confirmed series vs {deaths} deaths series")]
  SeriesCountMismatch { confirmed: usize, deaths: usize },
  #[error("confirmed series {0} has no deaths counterpart")]
  UnpairedSeries(i64),
  #[error("no points in range")]
  NoPoints,
  #[error("{confirmed} confirmed points vs {deaths} deaths points")]
  PointCountMismatch { confirmed: usize, deaths: usize },
  #[error("no deaths point for series {series_id} on {date}")]
  UnpairedPoint { series_id: i64, date: NaiveDate },
  #[error("negative active count for series {series_id} on {date}")]
  NegativeActive { series_id: i64, date: NaiveDate },
}

/// Confirmed series id → deaths series id.
pub type SeriesPairing = HashMap<i64, i64>;

/// Pair every confirmed series with the deaths series at the same location
/// (dataset, province/state, country/region, and coordinates).
pub fn pair_series(
  confirmed: &[Stored<CaseSeries>],
  deaths: &[Stored<CaseSeries>],
) -> Result<SeriesPairing, Unavailable> {
  if confirmed.is_empty() {
    return Err(Unavailable::NoConfirmedSeries);
  }
  if deaths.is_empty() {
    return Err(Unavailable::NoDeathsSeries);
  }
  if confirmed.len() != deaths.len() {
    return Err(Unavailable::SeriesCountMismatch {
      confirmed: confirmed.len(),
      deaths:    deaths.len(),
    });
  }

  confirmed
    .iter()
    .map(|c| {
      deaths
        .iter()
        .find(|d| c.record.same_location(&d.record))
        .map(|d| (c.id, d.id))
        .ok_or(Unavailable::UnpairedSeries(c.id))
    })
    .collect()
}

/// Subtract deaths points from confirmed points, day by day, within each
/// pair. The result keeps the confirmed points' order and series ids.
pub fn subtract_points(
  pairing: &SeriesPairing,
  confirmed: &[SeriesPoint],
  deaths: &[SeriesPoint],
) -> Result<Vec<SeriesPoint>, Unavailable> {
  if confirmed.is_empty() || deaths.is_empty() {
    return Err(Unavailable::NoPoints);
  }
  if confirmed.len() != deaths.len() {
    return Err(Unavailable::PointCountMismatch {
      confirmed: confirmed.len(),
      deaths:    deaths.len(),
    });
  }

  let deaths_by_day: HashMap<(i64, NaiveDate), i64> = deaths
    .iter()
    .map(|p| ((p.series_id, p.date), p.cases))
    .collect();

  confirmed
    .iter()
    .map(|c| {
      let unpaired = Unavailable::UnpairedPoint { series_id: c.series_id, date: c.date };
      let deaths_id = pairing.get(&c.series_id).ok_or_else(|| unpaired.clone())?;
      let dead = deaths_by_day.get(&(*deaths_id, c.date)).ok_or(unpaired)?;

      let active = c.cases - dead;
      if active < 0 {
        return Err(Unavailable::NegativeActive { series_id: c.series_id, date: c.date });
      }
      Ok(SeriesPoint { cases: active, ..c.clone() })
    })
    .collect()
}
