//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{NaiveDate, TimeZone, Utc};
use epi_core::{
  CaseKind, Stored,
  query::{DateRange, LocationFilter, SeriesQuery, SnapshotQuery},
  reconcile::Reconcile,
  series::{CaseSeries, SeriesPoint},
  snapshot::DailySnapshot,
  store::EpiStore,
};

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn day(d: u32) -> NaiveDate { NaiveDate::from_ymd_opt(2020, 1, d).unwrap() }

// ─── Daily snapshots ─────────────────────────────────────────────────────────

fn snapshot(admin2: &str, country: &str, hour: u32) -> DailySnapshot {
  DailySnapshot {
    dataset:             "daily".into(),
    fips:                -1,
    admin2:              admin2.into(),
    province_state:      "Louisiana".into(),
    country_region:      country.into(),
    last_update:         Utc.with_ymd_and_hms(2020, 6, 6, hour, 33, 0).unwrap(),
    lat:                 30.29,
    long:                -92.41,
    confirmed:           467,
    deaths:              26,
    recovered:           0,
    active:              441,
    combined_key:        format!("{admin2}, Louisiana, {country}"),
    incidence_rate:      752.67,
    case_fatality_ratio: 5.56,
  }
}

fn snapshot_query() -> SnapshotQuery {
  SnapshotQuery {
    dataset:      "daily".into(),
    location:     LocationFilter::default(),
    combined_key: None,
    range:        DateRange::default(),
  }
}

#[tokio::test]
async fn insert_then_find_by_key() {
  let s = store().await;
  let rows = vec![snapshot("Acadia", "US", 2), snapshot("Allen", "US", 2)];
  assert_eq!(s.insert_snapshots(rows.clone()).await.unwrap(), 2);

  let keys = vec![rows[1].natural_key(), snapshot("Nowhere", "US", 2).natural_key()];
  let found = s.find_snapshots(&keys).await.unwrap();
  assert_eq!(found.len(), 1);
  assert_eq!(found[0].record, rows[1]);
}

#[tokio::test]
async fn duplicate_natural_key_is_rejected_by_schema() {
  let s = store().await;
  s.insert_snapshots(vec![snapshot("Acadia", "US", 2)]).await.unwrap();
  assert!(s.insert_snapshots(vec![snapshot("Acadia", "US", 2)]).await.is_err());
}

#[tokio::test]
async fn update_touches_counts_and_rates_only() {
  let s = store().await;
  s.insert_snapshots(vec![snapshot("Acadia", "US", 2)]).await.unwrap();
  let mut found = s
    .find_snapshots(&[snapshot("Acadia", "US", 2).natural_key()])
    .await
    .unwrap();
  let mut row = found.remove(0);
  row.record.confirmed = 500;
  row.record.incidence_rate = 800.0;
  row.record.combined_key = "ignored".into();
  row.record.fips = 22001;

  assert_eq!(s.update_snapshots(vec![row]).await.unwrap(), 1);

  let stored = s.query_snapshots(&snapshot_query()).await.unwrap();
  assert_eq!(stored[0].confirmed, 500);
  assert_eq!(stored[0].incidence_rate, 800.0);
  assert_eq!(stored[0].combined_key, "Acadia, Louisiana, US");
  assert_eq!(stored[0].fips, -1);
}

#[tokio::test]
async fn query_filters_and_keeps_insertion_order() {
  let s = store().await;
  s.insert_snapshots(vec![
    snapshot("Cameron", "US", 2),
    snapshot("Acadia", "US", 2),
    snapshot("Acadia", "Canada", 2),
  ])
  .await
  .unwrap();

  let all = s.query_snapshots(&snapshot_query()).await.unwrap();
  let names: Vec<_> = all.iter().map(|r| (r.admin2.as_str(), r.country_region.as_str())).collect();
  assert_eq!(names, vec![("Cameron", "US"), ("Acadia", "US"), ("Acadia", "Canada")]);

  let q = SnapshotQuery {
    location: LocationFilter { countries: Some(vec!["Canada".into(), "Mexico".into()]), regions: None },
    ..snapshot_query()
  };
  assert_eq!(s.query_snapshots(&q).await.unwrap().len(), 1);

  let q = SnapshotQuery { combined_key: Some("Acadia, Louisiana, US".into()), ..snapshot_query() };
  let hit = s.query_snapshots(&q).await.unwrap();
  assert_eq!(hit.len(), 1);
  assert_eq!(hit[0].country_region, "US");

  let q = SnapshotQuery { dataset: "other".into(), ..snapshot_query() };
  assert!(s.query_snapshots(&q).await.unwrap().is_empty());
}

#[tokio::test]
async fn end_date_covers_the_whole_day() {
  let s = store().await;
  s.insert_snapshots(vec![snapshot("Acadia", "US", 23)]).await.unwrap();
  let june_6 = NaiveDate::from_ymd_opt(2020, 6, 6).unwrap();

  let q = SnapshotQuery {
    range: DateRange { start: Some(june_6), end: Some(june_6) },
    ..snapshot_query()
  };
  assert_eq!(s.query_snapshots(&q).await.unwrap().len(), 1);

  let q = SnapshotQuery {
    range: DateRange { start: june_6.succ_opt(), end: None },
    ..snapshot_query()
  };
  assert!(s.query_snapshots(&q).await.unwrap().is_empty());
}

#[tokio::test]
async fn delete_snapshots_counts_rows() {
  let s = store().await;
  s.insert_snapshots(vec![snapshot("Acadia", "US", 2), snapshot("Allen", "US", 2)])
    .await
    .unwrap();
  assert_eq!(s.delete_snapshots("daily").await.unwrap(), 2);
  assert_eq!(s.delete_snapshots("daily").await.unwrap(), 0);
  assert!(s.query_snapshots(&snapshot_query()).await.unwrap().is_empty());
}

// ─── Case series and points ──────────────────────────────────────────────────

fn series(kind: CaseKind, province: &str) -> CaseSeries {
  CaseSeries {
    dataset: "ts".into(),
    kind,
    province_state: province.into(),
    country_region: "Australia".into(),
    lat: -35.47,
    long: 149.01,
  }
}

fn series_query(kind: CaseKind) -> SeriesQuery {
  SeriesQuery { dataset: "ts".into(), kind, location: LocationFilter::default() }
}

#[tokio::test]
async fn insert_series_returns_ids_in_input_order() {
  let s = store().await;
  let stored = s
    .insert_series(vec![series(CaseKind::Deaths, "NSW"), series(CaseKind::Deaths, "ACT")])
    .await
    .unwrap();
  assert_eq!(stored.len(), 2);
  assert!(stored[0].id < stored[1].id);
  assert_eq!(stored[1].record.province_state, "ACT");

  let found = s
    .find_series(&[series(CaseKind::Deaths, "ACT").natural_key()])
    .await
    .unwrap();
  assert_eq!(found, vec![stored[1].clone()]);
}

#[tokio::test]
async fn kinds_are_separate_series() {
  let s = store().await;
  s.insert_series(vec![series(CaseKind::Deaths, "ACT"), series(CaseKind::Confirmed, "ACT")])
    .await
    .unwrap();

  let deaths = s.query_series(&series_query(CaseKind::Deaths)).await.unwrap();
  assert_eq!(deaths.len(), 1);
  assert_eq!(deaths[0].record.kind, CaseKind::Deaths);
  assert!(s.query_series(&series_query(CaseKind::Recovered)).await.unwrap().is_empty());
}

#[tokio::test]
async fn update_series_moves_coordinates() {
  let s = store().await;
  let mut stored = s.insert_series(vec![series(CaseKind::Deaths, "ACT")]).await.unwrap();
  stored[0].record.lat = -35.0;
  stored[0].record.long = 149.5;
  assert_eq!(s.update_series(stored).await.unwrap(), 1);

  let found = s.query_series(&series_query(CaseKind::Deaths)).await.unwrap();
  assert_eq!((found[0].record.lat, found[0].record.long), (-35.0, 149.5));
}

#[tokio::test]
async fn points_are_range_filtered_inclusively() {
  let s = store().await;
  let id = s.insert_series(vec![series(CaseKind::Deaths, "ACT")]).await.unwrap()[0].id;
  let points: Vec<_> =
    (22..=25).map(|d| SeriesPoint { series_id: id, date: day(d), cases: d as i64 }).collect();
  assert_eq!(s.insert_points(points).await.unwrap(), 4);

  let range = DateRange { start: Some(day(23)), end: Some(day(24)) };
  let found = s.find_points(&[id], range).await.unwrap();
  assert_eq!(
    found.iter().map(|p| p.record.date).collect::<Vec<_>>(),
    vec![day(23), day(24)]
  );
  assert!(s.find_points(&[], DateRange::default()).await.unwrap().is_empty());
}

#[tokio::test]
async fn update_points_overwrites_cases() {
  let s = store().await;
  let id = s.insert_series(vec![series(CaseKind::Deaths, "ACT")]).await.unwrap()[0].id;
  s.insert_points(vec![SeriesPoint { series_id: id, date: day(22), cases: 1 }])
    .await
    .unwrap();

  let found = s.find_points(&[id], DateRange::default()).await.unwrap();
  let updated: Vec<_> = found
    .into_iter()
    .map(|Stored { id, record }| Stored { id, record: SeriesPoint { cases: 9, ..record } })
    .collect();
  assert_eq!(s.update_points(updated).await.unwrap(), 1);

  let found = s.find_points(&[id], DateRange::default()).await.unwrap();
  assert_eq!(found[0].record.cases, 9);
}

#[tokio::test]
async fn deleting_series_cascades_to_points() {
  let s = store().await;
  let id = s.insert_series(vec![series(CaseKind::Deaths, "ACT")]).await.unwrap()[0].id;
  s.insert_points(vec![SeriesPoint { series_id: id, date: day(22), cases: 1 }])
    .await
    .unwrap();

  assert_eq!(s.delete_series("ts").await.unwrap(), 1);
  assert!(s.find_points(&[id], DateRange::default()).await.unwrap().is_empty());
  assert_eq!(s.delete_series("ts").await.unwrap(), 0);
}

#[tokio::test]
async fn empty_bulk_writes_are_no_ops() {
  let s = store().await;
  assert_eq!(s.insert_snapshots(Vec::new()).await.unwrap(), 0);
  assert_eq!(s.update_points(Vec::new()).await.unwrap(), 0);
  assert!(s.insert_series(Vec::new()).await.unwrap().is_empty());
}
