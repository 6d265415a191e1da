//! Header validation against a fixed column prefix and an optional trailing
//! run of date columns.

use chrono::NaiveDate;
use csv::StringRecord;

use crate::{Error, Result};

/// `M/D/YY`; zero padding is optional on input.
pub const WIDE_DATE_FORMAT: &str = "%m/%d/%y";

/// An expected header layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schema {
  /// Literal column names, matched exactly (case and punctuation).
  pub fixed: &'static [&'static str],
  /// Whether one or more date columns follow the fixed prefix.
  pub dated: bool,
}

/// The 14-column daily snapshot layout.
pub const TIDY: Schema = Schema {
  fixed: &[
    "FIPS",
    "Admin2",
    "Province_State",
    "Country_Region",
    "Last_Update",
    "Lat",
    "Long_",
    "Confirmed",
    "Deaths",
    "Recovered",
    "Active",
    "Combined_Key",
    "Incidence_Rate",
    "Case-Fatality_Ratio",
  ],
  dated: false,
};

/// The per-location time series layout; dates follow `Long`.
pub const WIDE: Schema = Schema {
  fixed: &["Province/State", "Country/Region", "Lat", "Long"],
  dated: true,
};

impl Schema {
  /// Check `header` and return the parsed date columns (empty for undated
  /// schemas).
  pub fn validate(&self, header: &StringRecord) -> Result<Vec<NaiveDate>> {
    let fixed = self.fixed.len();
    if header.len() < fixed {
      return Err(Error::Schema(format!(
        "expected at least {fixed} columns, found {}",
        header.len()
      )));
    }

    for (i, (found, expected)) in header.iter().zip(self.fixed).enumerate() {
      if found != *expected {
        return Err(Error::Schema(format!(
          "column {} is {found:?}, expected {expected:?}",
          i + 1
        )));
      }
    }

    if !self.dated {
      if header.len() > fixed {
        return Err(Error::Schema(format!(
          "expected {fixed} columns, found {}",
          header.len()
        )));
      }
      return Ok(Vec::new());
    }

    if header.len() == fixed {
      return Err(Error::Schema("no date columns".to_owned()));
    }

    header
      .iter()
      .skip(fixed)
      .map(|token| {
        NaiveDate::parse_from_str(token, WIDE_DATE_FORMAT)
          .map_err(|_| Error::Schema(format!("date column {token:?} is not M/D/YY")))
      })
      .collect()
  }
}
