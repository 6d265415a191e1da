//! SQL schema for the epidemiological SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- One tidy-format row per location per timestamp.
CREATE TABLE IF NOT EXISTS daily_reports (
    id                  INTEGER PRIMARY KEY AUTOINCREMENT,
    dataset             TEXT    NOT NULL,
    fips                INTEGER NOT NULL,
    admin2              TEXT    NOT NULL,
    province_state      TEXT    NOT NULL,
    country_region      TEXT    NOT NULL,
    last_update         TEXT    NOT NULL,   -- YYYY-MM-DD HH:MM:SS, UTC
    lat                 REAL    NOT NULL,
    long                REAL    NOT NULL,
    confirmed           INTEGER NOT NULL,
    deaths              INTEGER NOT NULL,
    recovered           INTEGER NOT NULL,
    active              INTEGER NOT NULL,
    combined_key        TEXT    NOT NULL,
    incidence_rate      REAL    NOT NULL,
    case_fatality_ratio REAL    NOT NULL,
    UNIQUE (dataset, admin2, province_state, country_region, last_update)
);

-- Identity envelope of one per-location series; counts live in
-- time_series_points.
CREATE TABLE IF NOT EXISTS time_series (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    dataset        TEXT NOT NULL,
    kind           TEXT NOT NULL,   -- 'C' | 'D' | 'R'; active is never stored
    province_state TEXT NOT NULL,
    country_region TEXT NOT NULL,
    lat            REAL NOT NULL,
    long           REAL NOT NULL,
    UNIQUE (dataset, kind, province_state, country_region)
);

CREATE TABLE IF NOT EXISTS time_series_points (
    id        INTEGER PRIMARY KEY AUTOINCREMENT,
    series_id INTEGER NOT NULL REFERENCES time_series(id) ON DELETE CASCADE,
    date      TEXT    NOT NULL,   -- YYYY-MM-DD
    cases     INTEGER NOT NULL,
    UNIQUE (series_id, date)
);

CREATE INDEX IF NOT EXISTS daily_reports_dataset_idx ON daily_reports(dataset, last_update);
CREATE INDEX IF NOT EXISTS time_series_dataset_idx   ON time_series(dataset, kind);

PRAGMA user_version = 1;
";
