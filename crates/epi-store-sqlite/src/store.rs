//! [`SqliteStore`]: the SQLite implementation of [`EpiStore`].

use std::path::Path;

use rusqlite::{OptionalExtension as _, types::Value};

use epi_core::{
  Stored,
  query::{DateRange, LocationFilter, SeriesQuery, SnapshotQuery},
  series::{CaseSeries, SeriesKey, SeriesPoint},
  snapshot::{DailySnapshot, SnapshotKey},
  store::EpiStore,
};

use crate::{
  Result,
  encode::{
    RawPoint, RawSeries, RawSnapshot, SERIES_COLUMNS, SNAPSHOT_COLUMNS, encode_date,
    encode_dt,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// An epidemiological dataset store backed by a single SQLite file.
///
/// Cloning shares the inner connection.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run `sql` once per parameter set inside one transaction; returns the
  /// total number of rows changed.
  async fn execute_each(&self, sql: &'static str, rows: Vec<Vec<Value>>) -> Result<usize> {
    if rows.is_empty() {
      return Ok(0);
    }
    let changed = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut changed = 0;
        {
          let mut stmt = tx.prepare(sql)?;
          for params in rows {
            changed += stmt.execute(rusqlite::params_from_iter(params))?;
          }
        }
        tx.commit()?;
        Ok(changed)
      })
      .await?;
    Ok(changed)
  }

  /// Delete every row of `table` belonging to `dataset`.
  async fn delete_dataset(&self, table: &'static str, dataset: &str) -> Result<usize> {
    let dataset = dataset.to_owned();
    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          &format!("DELETE FROM {table} WHERE dataset = ?1"),
          rusqlite::params![dataset],
        )?)
      })
      .await?;
    Ok(removed)
  }
}

// ─── Predicate building ──────────────────────────────────────────────────────

/// A dynamically built `WHERE` clause with positional parameters.
#[derive(Default)]
struct Filter {
  conds:  Vec<String>,
  params: Vec<Value>,
}

impl Filter {
  fn cmp(&mut self, column: &str, op: &str, value: impl Into<Value>) {
    self.conds.push(format!("{column} {op} ?"));
    self.params.push(value.into());
  }

  fn eq(&mut self, column: &str, value: impl Into<Value>) { self.cmp(column, "=", value); }

  fn any_of(&mut self, column: &str, values: impl IntoIterator<Item = Value>) {
    let start = self.params.len();
    self.params.extend(values);
    let marks = vec!["?"; self.params.len() - start].join(", ");
    self.conds.push(format!("{column} IN ({marks})"));
  }

  fn location(&mut self, location: &LocationFilter) {
    if let Some(countries) = &location.countries {
      self.any_of("country_region", countries.iter().cloned().map(Value::from));
    }
    if let Some(regions) = &location.regions {
      self.any_of("province_state", regions.iter().cloned().map(Value::from));
    }
  }

  fn where_clause(&self) -> String {
    if self.conds.is_empty() {
      String::new()
    } else {
      format!("WHERE {}", self.conds.join(" AND "))
    }
  }
}

// ─── EpiStore impl ───────────────────────────────────────────────────────────

impl EpiStore for SqliteStore {
  type Error = crate::Error;

  // ── Daily snapshots ───────────────────────────────────────────────────────

  async fn find_snapshots(&self, keys: &[SnapshotKey]) -> Result<Vec<Stored<DailySnapshot>>> {
    let keys: Vec<[String; 5]> = keys
      .iter()
      .map(|k| {
        [
          k.dataset.clone(),
          k.admin2.clone(),
          k.province_state.clone(),
          k.country_region.clone(),
          encode_dt(k.last_update),
        ]
      })
      .collect();

    let raws: Vec<RawSnapshot> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {SNAPSHOT_COLUMNS} FROM daily_reports
           WHERE dataset = ?1 AND admin2 = ?2 AND province_state = ?3
             AND country_region = ?4 AND last_update = ?5"
        ))?;
        let mut found = Vec::new();
        for key in keys {
          let raw = stmt
            .query_row(rusqlite::params_from_iter(key), RawSnapshot::from_row)
            .optional()?;
          found.extend(raw);
        }
        Ok(found)
      })
      .await?;

    let mut found: Vec<Stored<DailySnapshot>> = raws
      .into_iter()
      .map(RawSnapshot::into_stored)
      .collect::<Result<_>>()?;
    found.sort_by_key(|s| s.id);
    found.dedup_by_key(|s| s.id);
    Ok(found)
  }

  async fn insert_snapshots(&self, records: Vec<DailySnapshot>) -> Result<usize> {
    let rows: Vec<Vec<Value>> = records
      .into_iter()
      .map(|r| {
        vec![
          r.dataset.into(),
          r.fips.into(),
          r.admin2.into(),
          r.province_state.into(),
          r.country_region.into(),
          encode_dt(r.last_update).into(),
          r.lat.into(),
          r.long.into(),
          r.confirmed.into(),
          r.deaths.into(),
          r.recovered.into(),
          r.active.into(),
          r.combined_key.into(),
          r.incidence_rate.into(),
          r.case_fatality_ratio.into(),
        ]
      })
      .collect();

    self
      .execute_each(
        "INSERT INTO daily_reports (
           dataset, fips, admin2, province_state, country_region, last_update,
           lat, long, confirmed, deaths, recovered, active,
           combined_key, incidence_rate, case_fatality_ratio
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
        rows,
      )
      .await
  }

  async fn update_snapshots(&self, records: Vec<Stored<DailySnapshot>>) -> Result<usize> {
    let rows: Vec<Vec<Value>> = records
      .into_iter()
      .map(|Stored { id, record: r }| {
        vec![
          r.confirmed.into(),
          r.deaths.into(),
          r.recovered.into(),
          r.active.into(),
          r.incidence_rate.into(),
          r.case_fatality_ratio.into(),
          id.into(),
        ]
      })
      .collect();

    self
      .execute_each(
        "UPDATE daily_reports
         SET confirmed = ?1, deaths = ?2, recovered = ?3, active = ?4,
             incidence_rate = ?5, case_fatality_ratio = ?6
         WHERE id = ?7",
        rows,
      )
      .await
  }

  async fn query_snapshots(&self, query: &SnapshotQuery) -> Result<Vec<DailySnapshot>> {
    let mut filter = Filter::default();
    filter.eq("dataset", query.dataset.clone());
    filter.location(&query.location);
    if let Some(combined_key) = &query.combined_key {
      filter.eq("combined_key", combined_key.clone());
    }
    if let Some(start) = query.range.start_instant() {
      filter.cmp("last_update", ">=", encode_dt(start));
    }
    if let Some(end) = query.range.end_instant_exclusive() {
      filter.cmp("last_update", "<", encode_dt(end));
    }

    let raws: Vec<RawSnapshot> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {SNAPSHOT_COLUMNS} FROM daily_reports {} ORDER BY id",
          filter.where_clause()
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(filter.params), RawSnapshot::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(|raw| raw.into_stored().map(|s| s.record))
      .collect()
  }

  async fn delete_snapshots(&self, dataset: &str) -> Result<usize> {
    self.delete_dataset("daily_reports", dataset).await
  }

  // ── Case series ───────────────────────────────────────────────────────────

  async fn find_series(&self, keys: &[SeriesKey]) -> Result<Vec<Stored<CaseSeries>>> {
    let keys: Vec<[String; 4]> = keys
      .iter()
      .map(|k| {
        [
          k.dataset.clone(),
          k.kind.code().to_owned(),
          k.province_state.clone(),
          k.country_region.clone(),
        ]
      })
      .collect();

    let raws: Vec<RawSeries> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {SERIES_COLUMNS} FROM time_series
           WHERE dataset = ?1 AND kind = ?2 AND province_state = ?3 AND country_region = ?4"
        ))?;
        let mut found = Vec::new();
        for key in keys {
          let raw = stmt
            .query_row(rusqlite::params_from_iter(key), RawSeries::from_row)
            .optional()?;
          found.extend(raw);
        }
        Ok(found)
      })
      .await?;

    let mut found: Vec<Stored<CaseSeries>> = raws
      .into_iter()
      .map(RawSeries::into_stored)
      .collect::<Result<_>>()?;
    found.sort_by_key(|s| s.id);
    found.dedup_by_key(|s| s.id);
    Ok(found)
  }

  async fn insert_series(&self, records: Vec<CaseSeries>) -> Result<Vec<Stored<CaseSeries>>> {
    if records.is_empty() {
      return Ok(Vec::new());
    }

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut stored = Vec::with_capacity(records.len());
        {
          let mut stmt = tx.prepare(
            "INSERT INTO time_series (dataset, kind, province_state, country_region, lat, long)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          )?;
          for record in records {
            let id = stmt.insert(rusqlite::params![
              record.dataset,
              record.kind.code(),
              record.province_state,
              record.country_region,
              record.lat,
              record.long,
            ])?;
            stored.push(Stored { id, record });
          }
        }
        tx.commit()?;
        Ok(stored)
      })
      .await
      .map_err(Into::into)
  }

  async fn update_series(&self, records: Vec<Stored<CaseSeries>>) -> Result<usize> {
    let rows: Vec<Vec<Value>> = records
      .into_iter()
      .map(|Stored { id, record }| vec![record.lat.into(), record.long.into(), id.into()])
      .collect();

    self
      .execute_each("UPDATE time_series SET lat = ?1, long = ?2 WHERE id = ?3", rows)
      .await
  }

  async fn query_series(&self, query: &SeriesQuery) -> Result<Vec<Stored<CaseSeries>>> {
    let mut filter = Filter::default();
    filter.eq("dataset", query.dataset.clone());
    filter.eq("kind", query.kind.code().to_owned());
    filter.location(&query.location);

    let raws: Vec<RawSeries> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {SERIES_COLUMNS} FROM time_series {} ORDER BY id",
          filter.where_clause()
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(filter.params), RawSeries::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSeries::into_stored).collect()
  }

  async fn delete_series(&self, dataset: &str) -> Result<usize> {
    // Points go with their series via ON DELETE CASCADE.
    self.delete_dataset("time_series", dataset).await
  }

  // ── Series points ─────────────────────────────────────────────────────────

  async fn find_points(
    &self,
    series_ids: &[i64],
    range: DateRange,
  ) -> Result<Vec<Stored<SeriesPoint>>> {
    if series_ids.is_empty() {
      return Ok(Vec::new());
    }

    let mut filter = Filter::default();
    filter.any_of("series_id", series_ids.iter().copied().map(Value::from));
    if let Some(start) = range.start {
      filter.cmp("date", ">=", encode_date(start));
    }
    if let Some(end) = range.end {
      filter.cmp("date", "<=", encode_date(end));
    }

    let raws: Vec<RawPoint> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT id, series_id, date, cases FROM time_series_points {}
           ORDER BY series_id, date",
          filter.where_clause()
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(filter.params), RawPoint::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawPoint::into_stored).collect()
  }

  async fn insert_points(&self, records: Vec<SeriesPoint>) -> Result<usize> {
    let rows: Vec<Vec<Value>> = records
      .into_iter()
      .map(|p| vec![p.series_id.into(), encode_date(p.date).into(), p.cases.into()])
      .collect();

    self
      .execute_each(
        "INSERT INTO time_series_points (series_id, date, cases) VALUES (?1, ?2, ?3)",
        rows,
      )
      .await
  }

  async fn update_points(&self, records: Vec<Stored<SeriesPoint>>) -> Result<usize> {
    let rows: Vec<Vec<Value>> = records
      .into_iter()
      .map(|Stored { id, record }| vec![record.cases.into(), id.into()])
      .collect();

    self
      .execute_each("UPDATE time_series_points SET cases = ?1 WHERE id = ?2", rows)
      .await
  }
}
