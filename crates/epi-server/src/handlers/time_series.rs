//! Handlers for `/time_series/{dataset}/{kind}` and `/time_series/{dataset}`.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/time_series/{dataset}/{kind}` | Body: wide CSV; `kind` is `confirmed`, `deaths` or `recovered` |
//! | `GET`    | `/time_series/{dataset}/{kind}` | `kind` may also be `active`, derived as confirmed minus deaths |
//! | `DELETE` | `/time_series/{dataset}` | Removes every series of every kind with its points |

use std::collections::{HashMap, HashSet};

use axum::{
  body::Body,
  extract::{Path, Query, State},
  http::StatusCode,
  response::{IntoResponse, Response},
};
use epi_core::{
  CaseKind, Stored,
  derive::{pair_series, subtract_points},
  query::{DateRange, QueryParams, SeriesPlan, plan_series_query},
  reconcile::{Reconcile, index_by_key, reconcile},
  series::{CaseSeries, SeriesKey, SeriesPoint},
  store::EpiStore,
};

use crate::{
  AppState,
  error::Error,
  handlers::{DELETE_OK, UPLOAD_OK, collect_body, rendered_response},
};

/// `POST /time_series/{dataset}/{kind}`
pub async fn upload<S>(
  State(state): State<AppState<S>>,
  Path((dataset, kind)): Path<(String, String)>,
  body: Body,
) -> Result<Response, Error>
where
  S: EpiStore + Clone + 'static,
{
  // The kind is checked before the body is read.
  let kind = CaseKind::uploadable(&kind)?;
  let body = collect_body(body, state.config.max_body_bytes).await?;
  let rows = epi_csv::read_series(&body, &dataset, kind)
    .inspect_err(|e| tracing::warn!(%dataset, %kind, "rejected time series upload: {e}"))?;

  // Phase 1: series envelopes.
  let keys: Vec<SeriesKey> = rows
    .iter()
    .map(|row| row.series.natural_key())
    .collect::<HashSet<_>>()
    .into_iter()
    .collect();
  let existing = state.store.find_series(&keys).await.map_err(Error::store)?;
  let mut index = index_by_key(existing);
  let partition = reconcile(rows.iter().map(|row| row.series.clone()), |k| index.remove(k));

  let mut ids: HashMap<SeriesKey, i64> = partition
    .update
    .iter()
    .map(|s| (s.record.natural_key(), s.id))
    .collect();
  let series_updated = state
    .store
    .update_series(partition.update)
    .await
    .map_err(Error::store)?;
  let created = state
    .store
    .insert_series(partition.create)
    .await
    .map_err(Error::store)?;
  let series_created = created.len();
  ids.extend(created.into_iter().map(|s| (s.record.natural_key(), s.id)));

  // Phase 2: the points, now that every row has a series id.
  let mut points = Vec::new();
  for row in &rows {
    if let Some(&id) = ids.get(&row.series.natural_key()) {
      points.extend(row.points(id));
    }
  }
  let series_ids: Vec<i64> = ids.values().copied().collect();
  let existing = state
    .store
    .find_points(&series_ids, DateRange::default())
    .await
    .map_err(Error::store)?;
  let mut index = index_by_key(existing);
  let partition = reconcile(points, |k| index.remove(k));

  let points_created = state
    .store
    .insert_points(partition.create)
    .await
    .map_err(Error::store)?;
  let points_updated = state
    .store
    .update_points(partition.update)
    .await
    .map_err(Error::store)?;

  tracing::info!(
    %dataset,
    %kind,
    series_created,
    series_updated,
    points_created,
    points_updated,
    "time series uploaded"
  );
  Ok((StatusCode::OK, UPLOAD_OK).into_response())
}

/// `GET /time_series/{dataset}/{kind}`
pub async fn query<S>(
  State(state): State<AppState<S>>,
  Path((dataset, kind)): Path<(String, String)>,
  Query(params): Query<QueryParams>,
) -> Result<Response, Error>
where
  S: EpiStore + Clone + 'static,
{
  let kind: CaseKind = kind.parse()?;
  let plan = plan_series_query(&dataset, kind, &params)?;

  let (series, points) = if kind.is_stored() {
    let series = state
      .store
      .query_series(&plan.series_query(kind))
      .await
      .map_err(Error::store)?;
    let points = points_of(&*state.store, &series, plan.range).await?;
    (series, points)
  } else {
    derive_active(&*state.store, &plan).await?
  };

  let rendered = epi_csv::render_series(&series, &points, plan.format)?;
  Ok(rendered_response(rendered))
}

/// `DELETE /time_series/{dataset}`
pub async fn remove<S>(
  State(state): State<AppState<S>>,
  Path(dataset): Path<String>,
) -> Result<Response, Error>
where
  S: EpiStore + Clone + 'static,
{
  let removed = state
    .store
    .delete_series(&dataset)
    .await
    .map_err(Error::store)?;

  if removed == 0 {
    return Err(Error::NotFound { what: "Time series", dataset });
  }
  tracing::info!(%dataset, removed, "time series deleted");
  Ok((StatusCode::OK, DELETE_OK).into_response())
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

async fn points_of<S: EpiStore>(
  store: &S,
  series: &[Stored<CaseSeries>],
  range: DateRange,
) -> Result<Vec<SeriesPoint>, Error> {
  let ids: Vec<i64> = series.iter().map(|s| s.id).collect();
  let points = store.find_points(&ids, range).await.map_err(Error::store)?;
  Ok(points.into_iter().map(|p| p.record).collect())
}

/// Confirmed minus deaths under the plan's filters. An unavailable result
/// yields no series at all.
async fn derive_active<S: EpiStore>(
  store: &S,
  plan: &SeriesPlan,
) -> Result<(Vec<Stored<CaseSeries>>, Vec<SeriesPoint>), Error> {
  let confirmed = store
    .query_series(&plan.series_query(CaseKind::Confirmed))
    .await
    .map_err(Error::store)?;
  let deaths = store
    .query_series(&plan.series_query(CaseKind::Deaths))
    .await
    .map_err(Error::store)?;

  let pairing = match pair_series(&confirmed, &deaths) {
    Ok(pairing) => pairing,
    Err(reason) => {
      tracing::debug!(dataset = %plan.dataset, %reason, "active series unavailable");
      return Ok(Default::default());
    }
  };

  let confirmed_points = points_of(store, &confirmed, plan.range).await?;
  let deaths_points = points_of(store, &deaths, plan.range).await?;

  match subtract_points(&pairing, &confirmed_points, &deaths_points) {
    Ok(active) => Ok((confirmed, active)),
    Err(reason) => {
      tracing::debug!(dataset = %plan.dataset, %reason, "active series unavailable");
      Ok(Default::default())
    }
  }
}
