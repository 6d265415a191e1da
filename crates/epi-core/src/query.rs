//! Query planning: raw request parameters → normalised store predicates.
//!
//! Both endpoints accept the same loosely-typed parameter bag
//! ([`QueryParams`]). Planning validates every token up front, so a request
//! either yields a complete plan or a single [`Error::QueryParam`].

use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use serde::Deserialize;

use crate::{CaseKind, Error, Result};

/// Accepted format for `start_date` / `end_date`.
pub const QUERY_DATE_FORMAT: &str = "%Y-%m-%d";

// ─── Raw parameters ──────────────────────────────────────────────────────────

/// Query-string parameters exactly as received.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryParams {
  /// Comma-separated `Country_Region` values.
  pub countries:    Option<String>,
  /// Comma-separated `Province_State` values.
  pub regions:      Option<String>,
  /// Exact `Combined_Key` match; daily snapshots only.
  pub combined_key: Option<String>,
  /// Comma-separated value columns; daily snapshots only.
  pub data_type:    Option<String>,
  pub start_date:   Option<String>,
  pub end_date:     Option<String>,
  pub format:       Option<String>,
}

// ─── Normalised pieces ───────────────────────────────────────────────────────

/// Response body encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
  #[default]
  Csv,
  Json,
}

impl OutputFormat {
  fn parse(token: &str) -> Result<Self> {
    match token {
      "csv" => Ok(Self::Csv),
      "json" => Ok(Self::Json),
      other => Err(Error::QueryParam(format!("unknown format {other:?}"))),
    }
  }
}

/// An inclusive calendar-date range; `None` on either side is unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateRange {
  pub start: Option<NaiveDate>,
  pub end:   Option<NaiveDate>,
}

impl DateRange {
  pub fn contains(&self, date: NaiveDate) -> bool {
    self.start.is_none_or(|s| date >= s) && self.end.is_none_or(|e| date <= e)
  }

  /// Lower timestamp bound, inclusive: midnight of `start`.
  pub fn start_instant(&self) -> Option<DateTime<Utc>> {
    self.start.map(|d| d.and_time(NaiveTime::MIN).and_utc())
  }

  /// Upper timestamp bound, exclusive: midnight after `end`, so the whole
  /// end day is covered. `None` when unbounded (or past the calendar's end).
  pub fn end_instant_exclusive(&self) -> Option<DateTime<Utc>> {
    self
      .end
      .and_then(|d| d.checked_add_days(Days::new(1)))
      .map(|d| d.and_time(NaiveTime::MIN).and_utc())
  }
}

/// Location filters shared by both record shapes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocationFilter {
  /// Membership filter on `country_region`.
  pub countries: Option<Vec<String>>,
  /// Membership filter on `province_state`.
  pub regions:   Option<Vec<String>>,
}

// ─── Plans ───────────────────────────────────────────────────────────────────

/// Store predicate for daily snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotQuery {
  pub dataset:      String,
  pub location:     LocationFilter,
  pub combined_key: Option<String>,
  pub range:        DateRange,
}

/// A validated daily-snapshot request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotPlan {
  pub query:   SnapshotQuery,
  /// Requested value columns in the fixed output order.
  pub columns: Vec<CaseKind>,
  pub format:  OutputFormat,
}

/// Store predicate for case series of one stored kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesQuery {
  pub dataset:  String,
  pub kind:     CaseKind,
  pub location: LocationFilter,
}

/// A validated time-series request. `kind` may be `Active`, in which case
/// the result is derived rather than read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesPlan {
  pub dataset:  String,
  pub kind:     CaseKind,
  pub location: LocationFilter,
  pub range:    DateRange,
  pub format:   OutputFormat,
}

impl SeriesPlan {
  /// The series predicate for `kind` under this plan's location filters.
  pub fn series_query(&self, kind: CaseKind) -> SeriesQuery {
    SeriesQuery {
      dataset: self.dataset.clone(),
      kind,
      location: self.location.clone(),
    }
  }
}

// ─── Planning ────────────────────────────────────────────────────────────────

/// Plan a daily-snapshot query.
pub fn plan_snapshot_query(dataset: &str, params: &QueryParams) -> Result<SnapshotPlan> {
  let columns = match &params.data_type {
    Some(list) => value_columns(list)?,
    None => CaseKind::ALL.to_vec(),
  };

  Ok(SnapshotPlan {
    query: SnapshotQuery {
      dataset:      dataset.to_owned(),
      location:     location_filter(params),
      combined_key: params.combined_key.clone(),
      range:        date_range(params)?,
    },
    columns,
    format: output_format(params)?,
  })
}

/// Plan a time-series query for the kind named in the request path.
pub fn plan_series_query(
  dataset: &str,
  kind: CaseKind,
  params: &QueryParams,
) -> Result<SeriesPlan> {
  Ok(SeriesPlan {
    dataset: dataset.to_owned(),
    kind,
    location: location_filter(params),
    range: date_range(params)?,
    format: output_format(params)?,
  })
}

fn split_list(list: &str) -> Vec<String> {
  list.split(',').map(str::to_owned).collect()
}

fn location_filter(params: &QueryParams) -> LocationFilter {
  LocationFilter {
    countries: params.countries.as_deref().map(split_list),
    regions:   params.regions.as_deref().map(split_list),
  }
}

/// Parse a `data_type` list; output is deduplicated and in fixed order.
fn value_columns(list: &str) -> Result<Vec<CaseKind>> {
  let mut requested = Vec::new();
  for token in list.split(',') {
    // Exact lowercase tokens only; `Deaths` is not a value column name.
    let kind = CaseKind::ALL
      .into_iter()
      .find(|k| k.token() == token)
      .ok_or_else(|| Error::QueryParam(format!("unknown data_type {token:?}")))?;
    requested.push(kind);
  }
  Ok(
    CaseKind::ALL
      .into_iter()
      .filter(|k| requested.contains(k))
      .collect(),
  )
}

fn parse_date(name: &str, value: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(value, QUERY_DATE_FORMAT)
    .map_err(|e| Error::QueryParam(format!("{name} {value:?}: {e}")))
}

fn date_range(params: &QueryParams) -> Result<DateRange> {
  Ok(DateRange {
    start: params
      .start_date
      .as_deref()
      .map(|v| parse_date("start_date", v))
      .transpose()?,
    end:   params
      .end_date
      .as_deref()
      .map(|v| parse_date("end_date", v))
      .transpose()?,
  })
}

fn output_format(params: &QueryParams) -> Result<OutputFormat> {
  params
    .format
    .as_deref()
    .map(OutputFormat::parse)
    .transpose()
    .map(Option::unwrap_or_default)
}
