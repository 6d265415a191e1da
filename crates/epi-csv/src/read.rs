//! Upload readers: a whole CSV body → a fully-typed batch.
//!
//! Validation is all-or-nothing. The header is checked before any row is
//! looked at, and the first rejected row aborts the batch, so callers never
//! see a partially-typed upload.

use std::io::Read;

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, Trim};
use epi_core::{CaseKind, series::SeriesRow, snapshot::DailySnapshot};

use crate::{
  Error, Result,
  row::{TypingOptions, type_series_row, type_snapshot_row},
  schema::{Schema, TIDY, WIDE},
};

/// A line holding nothing but whitespace comes through as one empty field.
/// Rows of empty fields (`,,,`) are not blank; the row typer rejects them.
fn is_blank(record: &StringRecord) -> bool { record.len() == 1 && record[0].is_empty() }

fn line_of(record: &StringRecord) -> u64 {
  record.position().map(|p| p.line()).unwrap_or_default()
}

/// Check the first line of `reader` against `schema`. Header names are
/// compared untrimmed.
fn header<R: Read>(
  reader: &mut csv::Reader<R>,
  schema: &Schema,
) -> Result<(usize, Vec<NaiveDate>)> {
  let header = reader.headers()?;
  if header.iter().all(|name| name.trim().is_empty()) {
    return Err(Error::Schema("empty upload".to_owned()));
  }
  let dates = schema.validate(header)?;
  Ok((header.len(), dates))
}

/// Non-blank data records, with CSV-level failures lifted into [`Error`].
fn records<R: Read>(
  reader: &mut csv::Reader<R>,
) -> impl Iterator<Item = Result<StringRecord>> + '_ {
  reader
    .records()
    .map(|r| r.map_err(Error::from))
    .filter(|r| !matches!(r, Ok(record) if is_blank(record)))
}

fn reader(body: &str) -> csv::Reader<&[u8]> {
  ReaderBuilder::new()
    .has_headers(true)
    .flexible(true)
    .trim(Trim::Fields)
    .from_reader(body.as_bytes())
}

/// Parse a tidy upload for `dataset`.
pub fn read_snapshots(
  body: &str,
  dataset: &str,
  options: TypingOptions,
) -> Result<Vec<DailySnapshot>> {
  let mut reader = reader(body);
  let (width, _) = header(&mut reader, &TIDY)?;

  records(&mut reader)
    .map(|record| {
      let record = record?;
      type_snapshot_row(dataset, width, &record, options)
        .map_err(|reason| Error::Row { line: line_of(&record), reason })
    })
    .collect()
}

/// Parse a wide upload of `kind` counts for `dataset`.
pub fn read_series(body: &str, dataset: &str, kind: CaseKind) -> Result<Vec<SeriesRow>> {
  let mut reader = reader(body);
  let (_, dates) = header(&mut reader, &WIDE)?;

  records(&mut reader)
    .map(|record| {
      let record = record?;
      type_series_row(dataset, kind, &dates, &record)
        .map_err(|reason| Error::Row { line: line_of(&record), reason })
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  // Indented continuation lines, as produced by pasting into a test harness.
  const TIDY_BODY: &str = r#"FIPS,Admin2,Province_State,Country_Region,Last_Update,Lat,Long_,Confirmed,Deaths,Recovered,Active,Combined_Key,Incidence_Rate,Case-Fatality_Ratio
                45001,Abbeville,South Carolina,US,2020-06-06 02:33:00,34.22333378,-82.46170658,47,0,0,47,"Abbeville, South Carolina, US",191.625555510254,0
                22001,Acadia,Louisiana,US,2020-06-06 02:33:00,30.2950649,-92.41419698,467,26,0,441,"Acadia, Louisiana, US",752.6795068095737,5.56745182012848
"#;

  #[test]
  fn reads_tidy_body() {
    let rows = read_snapshots(TIDY_BODY, "test1", TypingOptions::default()).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].fips, 45001);
    assert_eq!(rows[0].combined_key, "Abbeville, South Carolina, US");
    assert_eq!(rows[1].dataset, "test1");
    assert_eq!(rows[1].active, 441);
  }

  #[test]
  fn bad_header_rejects_before_rows() {
    let body = TIDY_BODY.replacen("FIPS", "qwfqwfwfafsfafasfasf", 1);
    assert!(matches!(
      read_snapshots(&body, "t", TypingOptions::default()),
      Err(Error::Schema(_))
    ));
  }

  #[test]
  fn one_bad_row_rejects_batch_with_line() {
    let body = TIDY_BODY.replacen("22001", "afasfasfasfas", 1);
    match read_snapshots(&body, "t", TypingOptions::default()) {
      Err(Error::Row { line, .. }) => assert_eq!(line, 3),
      other => panic!("expected row error, got {other:?}"),
    }
  }

  #[test]
  fn empty_body_is_a_schema_error() {
    assert!(matches!(read_series("", "t", CaseKind::Deaths), Err(Error::Schema(_))));
    assert!(matches!(read_series("  \n", "t", CaseKind::Deaths), Err(Error::Schema(_))));
  }

  #[test]
  fn header_names_are_not_trimmed() {
    let body = TIDY_BODY.replacen("FIPS", " FIPS", 1);
    assert!(matches!(
      read_snapshots(&body, "t", TypingOptions::default()),
      Err(Error::Schema(_))
    ));
  }

  #[test]
  fn whitespace_lines_are_skipped() {
    let body = format!("{TIDY_BODY}   \n\n");
    assert_eq!(read_snapshots(&body, "t", TypingOptions::default()).unwrap().len(), 2);
  }

  #[test]
  fn all_comma_rows_are_rejected_not_skipped() {
    let body = format!("{TIDY_BODY},,,,,,,,,,,,,\n");
    assert!(matches!(
      read_snapshots(&body, "t", TypingOptions::default()),
      Err(Error::Row { line: 4, .. })
    ));

    let body = "Province/State,Country/Region,Lat,Long,1/22/20\n,,,,\n";
    assert!(matches!(read_series(body, "t", CaseKind::Deaths), Err(Error::Row { line: 2, .. })));
  }

  #[test]
  fn header_only_body_is_an_empty_batch() {
    let rows = read_series("Province/State,Country/Region,Lat,Long,1/22/20\n", "t", CaseKind::Deaths)
      .unwrap();
    assert!(rows.is_empty());
  }

  #[test]
  fn reads_wide_body() {
    let body = "Province/State,Country/Region,Lat,Long,1/22/20,1/23/20
                  ,Afghanistan,33.93911,67.709953,0,0
                  Australian Capital Territory,Australia,-35.4735,149.0124,4,5";
    let rows = read_series(body, "abc", CaseKind::Confirmed).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].series.province_state, "");
    assert_eq!(rows[0].series.country_region, "Afghanistan");
    assert_eq!(rows[1].counts.iter().map(|c| c.1).collect::<Vec<_>>(), vec![4, 5]);
    assert!(rows.iter().all(|r| r.series.kind == CaseKind::Confirmed));
  }

  #[test]
  fn wide_row_with_bad_latitude_rejects() {
    let body = "Province/State,Country/Region,Lat,Long,1/22/20,1/23/20
                  ,Afghanistan,3asfasfasfasfasfasffasfa3.93911,67.709953,0,0";
    assert!(matches!(read_series(body, "abc", CaseKind::Deaths), Err(Error::Row { .. })));
  }
}
