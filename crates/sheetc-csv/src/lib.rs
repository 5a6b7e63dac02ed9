//! # sheetc-csv
//!
//! Loads CSV files into sheetc worksheets.
//!
//! Every field lands in the cell at its row and column. A field starting with
//! `=` is kept as a formula; other fields are typed as booleans, numbers,
//! percentages or ISO dates when [`CsvReadOptions::auto_detect_types`] is set.
//!
//! ```rust
//! use sheetc_core::CellValue;
//! use sheetc_csv::{CsvReadOptions, CsvReader};
//!
//! let sheet = CsvReader::read_str("5,=A1*2\n", &CsvReadOptions::default()).unwrap();
//! assert_eq!(sheet.get_value("A1").unwrap(), CellValue::Number(5.0));
//! assert!(sheet.get_value("B1").unwrap().is_formula());
//! ```

mod error;
mod options;
mod reader;

pub use error::{CsvError, CsvResult};
pub use options::CsvReadOptions;
pub use reader::CsvReader;
