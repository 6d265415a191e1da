//! Handlers for `/daily_reports/{dataset}`.
//!
//! | Method   | Notes |
//! |----------|-------|
//! | `POST`   | Body: tidy CSV; reconciled against stored snapshots |
//! | `GET`    | Filters: `countries`, `regions`, `combined_key`, `data_type`, `start_date`, `end_date`, `format` |
//! | `DELETE` | Removes every snapshot of the dataset; 404 when there were none |

use std::collections::HashSet;

use axum::{
  body::Body,
  extract::{Path, Query, State},
  http::StatusCode,
  response::{IntoResponse, Response},
};
use epi_core::{
  query::{QueryParams, plan_snapshot_query},
  reconcile::{Reconcile, index_by_key, reconcile},
  store::EpiStore,
};

use crate::{
  AppState,
  error::Error,
  handlers::{DELETE_OK, UPLOAD_OK, collect_body, rendered_response},
};

/// `POST /daily_reports/{dataset}`
pub async fn upload<S>(
  State(state): State<AppState<S>>,
  Path(dataset): Path<String>,
  body: Body,
) -> Result<Response, Error>
where
  S: EpiStore + Clone + 'static,
{
  let body = collect_body(body, state.config.max_body_bytes).await?;
  let rows = epi_csv::read_snapshots(&body, &dataset, state.config.typing_options())
    .inspect_err(|e| tracing::warn!(%dataset, "rejected daily report upload: {e}"))?;

  let keys: Vec<_> = rows
    .iter()
    .map(Reconcile::natural_key)
    .collect::<HashSet<_>>()
    .into_iter()
    .collect();
  let existing = state.store.find_snapshots(&keys).await.map_err(Error::store)?;
  let mut index = index_by_key(existing);
  let partition = reconcile(rows, |k| index.remove(k));

  let created = state
    .store
    .insert_snapshots(partition.create)
    .await
    .map_err(Error::store)?;
  let updated = state
    .store
    .update_snapshots(partition.update)
    .await
    .map_err(Error::store)?;

  tracing::info!(%dataset, created, updated, "daily reports uploaded");
  Ok((StatusCode::OK, UPLOAD_OK).into_response())
}

/// `GET /daily_reports/{dataset}`
pub async fn query<S>(
  State(state): State<AppState<S>>,
  Path(dataset): Path<String>,
  Query(params): Query<QueryParams>,
) -> Result<Response, Error>
where
  S: EpiStore + Clone + 'static,
{
  let plan = plan_snapshot_query(&dataset, &params)?;
  let records = state
    .store
    .query_snapshots(&plan.query)
    .await
    .map_err(Error::store)?;

  let rendered = epi_csv::render_snapshots(&records, &plan.columns, plan.format)?;
  Ok(rendered_response(rendered))
}

/// `DELETE /daily_reports/{dataset}`
pub async fn remove<S>(
  State(state): State<AppState<S>>,
  Path(dataset): Path<String>,
) -> Result<Response, Error>
where
  S: EpiStore + Clone + 'static,
{
  let removed = state
    .store
    .delete_snapshots(&dataset)
    .await
    .map_err(Error::store)?;

  if removed == 0 {
    return Err(Error::NotFound { what: "Daily reports", dataset });
  }
  tracing::info!(%dataset, removed, "daily reports deleted");
  Ok((StatusCode::OK, DELETE_OK).into_response())
}
