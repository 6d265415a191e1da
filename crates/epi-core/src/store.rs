//! The `EpiStore` trait: a generic keyed record store.
//!
//! The trait is implemented by storage backends (e.g. `epi-store-sqlite`).
//! The server depends on this abstraction, not on any concrete backend.
//!
//! Every write is a bulk operation over one record type. Callers resolve
//! natural keys with one `find_*` read, partition with
//! [`crate::reconcile::reconcile`], then issue one `insert_*` and one
//! `update_*`. The two writes are not atomic with each other.

use std::future::Future;

use crate::{
  Stored,
  query::{DateRange, SeriesQuery, SnapshotQuery},
  series::{CaseSeries, SeriesKey, SeriesPoint},
  snapshot::{DailySnapshot, SnapshotKey},
};

/// Abstraction over an epidemiological dataset store backend.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait EpiStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Daily snapshots ───────────────────────────────────────────────────

  /// Every stored snapshot whose natural key is in `keys`.
  fn find_snapshots<'a>(
    &'a self,
    keys: &'a [SnapshotKey],
  ) -> impl Future<Output = Result<Vec<Stored<DailySnapshot>>, Self::Error>> + Send + 'a;

  /// Insert new snapshots; returns the number written.
  fn insert_snapshots(
    &self,
    records: Vec<DailySnapshot>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  /// Overwrite counts and rates (confirmed, deaths, recovered, active,
  /// incidence rate, case-fatality ratio) of existing rows by id. Identity
  /// columns are never written.
  fn update_snapshots(
    &self,
    records: Vec<Stored<DailySnapshot>>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  /// Snapshots matching `query`, in insertion order.
  fn query_snapshots<'a>(
    &'a self,
    query: &'a SnapshotQuery,
  ) -> impl Future<Output = Result<Vec<DailySnapshot>, Self::Error>> + Send + 'a;

  /// Remove every snapshot of `dataset`; returns the number removed.
  fn delete_snapshots<'a>(
    &'a self,
    dataset: &'a str,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + 'a;

  // ── Case series ───────────────────────────────────────────────────────

  /// Every stored series whose natural key is in `keys`.
  fn find_series<'a>(
    &'a self,
    keys: &'a [SeriesKey],
  ) -> impl Future<Output = Result<Vec<Stored<CaseSeries>>, Self::Error>> + Send + 'a;

  /// Insert new series and return them with their assigned ids, in input
  /// order.
  fn insert_series(
    &self,
    records: Vec<CaseSeries>,
  ) -> impl Future<Output = Result<Vec<Stored<CaseSeries>>, Self::Error>> + Send + '_;

  /// Overwrite latitude and longitude of existing series by id.
  fn update_series(
    &self,
    records: Vec<Stored<CaseSeries>>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  /// Series matching `query`, in insertion order.
  fn query_series<'a>(
    &'a self,
    query: &'a SeriesQuery,
  ) -> impl Future<Output = Result<Vec<Stored<CaseSeries>>, Self::Error>> + Send + 'a;

  /// Remove every series of `dataset` together with its points; returns the
  /// number of series removed.
  fn delete_series<'a>(
    &'a self,
    dataset: &'a str,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + 'a;

  // ── Series points ─────────────────────────────────────────────────────

  /// Points owned by any of `series_ids` whose date lies in `range`
  /// (inclusive), ordered by series then date.
  fn find_points<'a>(
    &'a self,
    series_ids: &'a [i64],
    range: DateRange,
  ) -> impl Future<Output = Result<Vec<Stored<SeriesPoint>>, Self::Error>> + Send + 'a;

  fn insert_points(
    &self,
    records: Vec<SeriesPoint>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  /// Overwrite the case count of existing points by id.
  fn update_points(
    &self,
    records: Vec<Stored<SeriesPoint>>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;
}
