//! # sheetc-model-tests
//!
//! `build.rs` runs the generator over a small pricing workbook and this crate
//! compiles the printed source as the `pricing` module. The workbook mixes
//! shared inputs, a cross-sheet rate, a circular pair, an unsupported function
//! and math on bare literals.

include!(concat!(env!("OUT_DIR"), "/pricing.rs"));

/// The generated source, for assertions on its text
pub const PRICING_SOURCE: &str = include_str!(concat!(env!("OUT_DIR"), "/pricing.rs"));
