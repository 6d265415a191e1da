//! CSV codec for the epidemiological dataset store.
//!
//! Converts between uploaded CSV text and [`epi_core`] domain types, and
//! projects stored records back into CSV or JSON. Pure synchronous; no HTTP
//! or database dependencies.
//!
//! # Quick start
//!
//! ```no_run
//! use epi_csv::{TypingOptions, read_snapshots};
//!
//! let body = "FIPS,Admin2,Province_State,Country_Region,Last_Update,Lat,Long_,\
//!             Confirmed,Deaths,Recovered,Active,Combined_Key,Incidence_Rate,\
//!             Case-Fatality_Ratio\n\
//!             ,,BC,Canada,2021-11-21 16:30:00,49.2,-123.1,500,10,300,0,,4.3,2.0\n";
//! let rows = read_snapshots(body, "daily", TypingOptions::default()).unwrap();
//! println!("{} rows, active={}", rows.len(), rows[0].active);
//! ```

pub mod error;
mod read;
mod render;
mod row;
mod schema;

pub use error::{Error, Result};
pub use read::{read_series, read_snapshots};
pub use render::{
  CSV_CONTENT_TYPE, JSON_CONTENT_TYPE, Rendered, render_series, render_snapshots,
};
pub use row::{TIMESTAMP_FORMAT, TypingOptions};
pub use schema::{Schema, TIDY, WIDE, WIDE_DATE_FORMAT};
