//! # sheetc-runtime
//!
//! Support library for generated models.
//!
//! Generated code keeps statically known values in native types (`f64`, `bool`,
//! `String`, [`Date`]) and falls back to [`Dynamic`] where a formula's type cannot
//! be pinned down. Every operation on `Dynamic` goes through a function in this
//! crate, so spreadsheet semantics (case-insensitive text equality, mixed-type
//! ordering, error values) live in one place.
//!
//! ```rust
//! use sheetc_runtime as rt;
//!
//! let total = rt::sum(&[rt::Dynamic::from(2.0), rt::Dynamic::from("x"), 3.0.into()]);
//! assert_eq!(total, 5.0);
//! assert!(rt::text_eq("Yes", "YES"));
//! ```

pub mod compare;
pub mod date;
pub mod lookup;
pub mod math;
pub mod ops;
pub mod text;
pub mod value;

pub use compare::{compare, eq, ge, gt, le, lt, ne, text_eq};
pub use date::{date_add, date_diff, date_sub, Date};
pub use lookup::{choose, hlookup, index, match_position, vlookup};
pub use math::{
    average, count, counta, int, max, min, modulo, product, round, rounddown, roundup, sign, sum,
};
pub use ops::{
    add, and, concat, date, if_error, is_blank, is_number, is_text, num, or, sub, text, truthy,
};
pub use sheetc_core::CellError;
pub use text::{exact, left, len, lower, mid, right, trim, upper};
pub use value::Dynamic;
