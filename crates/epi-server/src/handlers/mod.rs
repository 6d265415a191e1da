pub mod daily_reports;
pub mod time_series;

use axum::{
  body::Body,
  http::{StatusCode, header},
  response::{IntoResponse, Response},
};
use epi_csv::Rendered;

use crate::error::Error;

pub(super) const UPLOAD_OK: &str = "Upload successful";
pub(super) const DELETE_OK: &str = "Successfully deleted";

/// Read the whole request body as UTF-8 text, refusing anything over `limit`
/// bytes.
pub(super) async fn collect_body(body: Body, limit: usize) -> Result<String, Error> {
  let bytes = axum::body::to_bytes(body, limit)
    .await
    .map_err(|_| Error::PayloadTooLarge(limit))?;
  String::from_utf8(bytes.to_vec())
    .map_err(|_| Error::Malformed("body is not valid UTF-8".to_owned()))
}

pub(super) fn rendered_response(rendered: Rendered) -> Response {
  (
    StatusCode::OK,
    [(header::CONTENT_TYPE, rendered.content_type)],
    rendered.body,
  )
    .into_response()
}
