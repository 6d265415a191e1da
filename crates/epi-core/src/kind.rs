//! The closed set of case kinds and the boundary mapping table.
//!
//! URLs carry a lowercase token (`deaths`), the store carries a one-letter
//! code (`D`), and rendered output carries a title (`Deaths`). All three
//! conversions go through the table below; nothing else branches on raw
//! strings.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// What a series (or a value column) counts.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum CaseKind {
  Active,
  Confirmed,
  Deaths,
  Recovered,
}

/// `(kind, token, stored code, title)`. `Active` has a code for completeness
/// but is never written to the store.
const TABLE: [(CaseKind, &str, &str, &str); 4] = [
  (CaseKind::Active, "active", "A", "Active"),
  (CaseKind::Confirmed, "confirmed", "C", "Confirmed"),
  (CaseKind::Deaths, "deaths", "D", "Deaths"),
  (CaseKind::Recovered, "recovered", "R", "Recovered"),
];

impl CaseKind {
  /// Every kind in the fixed output order used by tidy projections.
  pub const ALL: [CaseKind; 4] = [
    CaseKind::Active,
    CaseKind::Confirmed,
    CaseKind::Deaths,
    CaseKind::Recovered,
  ];

  fn row(self) -> &'static (CaseKind, &'static str, &'static str, &'static str) {
    // The table is indexed in declaration order.
    &TABLE[self as usize]
  }

  pub fn token(self) -> &'static str { self.row().1 }

  /// The one-letter discriminant stored in the `kind` column.
  pub fn code(self) -> &'static str { self.row().2 }

  pub fn title(self) -> &'static str { self.row().3 }

  /// Only `Active` is derived rather than stored.
  pub fn is_stored(self) -> bool { self != CaseKind::Active }

  /// Decode a stored one-letter code. `A` is not a valid stored code.
  pub fn from_code(code: &str) -> Result<Self> {
    TABLE
      .iter()
      .find(|(kind, _, c, _)| kind.is_stored() && *c == code)
      .map(|(kind, ..)| *kind)
      .ok_or_else(|| Error::UnknownCaseKind(code.to_owned()))
  }

  /// Parse a URL token for an upload; rejects `active`.
  pub fn uploadable(token: &str) -> Result<Self> {
    let kind: CaseKind = token.parse()?;
    if kind.is_stored() {
      Ok(kind)
    } else {
      Err(Error::NotUploadable(kind))
    }
  }
}

impl FromStr for CaseKind {
  type Err = Error;

  /// Tokens are matched case-insensitively.
  fn from_str(s: &str) -> Result<Self> {
    TABLE
      .iter()
      .find(|(_, token, ..)| token.eq_ignore_ascii_case(s))
      .map(|(kind, ..)| *kind)
      .ok_or_else(|| Error::UnknownCaseKind(s.to_owned()))
  }
}

impl fmt::Display for CaseKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.token())
  }
}
