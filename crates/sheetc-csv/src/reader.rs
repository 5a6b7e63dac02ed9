//! CSV reader

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use sheetc_core::{CellValue, Worksheet, MAX_COLS, MAX_ROWS};

use crate::error::{CsvError, CsvResult};
use crate::options::CsvReadOptions;

/// CSV file reader
pub struct CsvReader;

impl CsvReader {
    /// Read a CSV file into a worksheet named after the file
    pub fn read_file<P: AsRef<Path>>(path: P, options: &CsvReadOptions) -> CsvResult<Worksheet> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let mut worksheet = Self::read(file, options)?;
        if options.sheet_name.is_none() {
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                worksheet.set_name(stem);
            }
        }
        tracing::debug!(
            "Loaded {} cells from {}",
            worksheet.cell_count(),
            path.display()
        );
        Ok(worksheet)
    }

    /// Read CSV text into a worksheet
    pub fn read_str(text: &str, options: &CsvReadOptions) -> CsvResult<Worksheet> {
        Self::read(text.as_bytes(), options)
    }

    /// Read CSV from a reader into a worksheet
    pub fn read<R: Read>(reader: R, options: &CsvReadOptions) -> CsvResult<Worksheet> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(options.delimiter)
            .quote(options.quote)
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        let name = options.sheet_name.as_deref().unwrap_or("Sheet1");
        let mut worksheet = Worksheet::new(name);

        for (row, result) in csv_reader.records().enumerate() {
            let record = result?;
            if row >= MAX_ROWS as usize {
                return Err(CsvError::TooLarge {
                    row: row + 1,
                    column: 1,
                    message: format!("more than {MAX_ROWS} rows"),
                });
            }
            if record.len() > MAX_COLS as usize {
                return Err(CsvError::TooLarge {
                    row: row + 1,
                    column: record.len(),
                    message: format!("more than {MAX_COLS} columns"),
                });
            }

            let header = options.has_header && row == 0;
            for (col, field) in record.iter().enumerate() {
                let value = if header {
                    text(field)
                } else {
                    Self::detect_type(field, options.auto_detect_types)
                };
                worksheet.set_cell_value_at(row as u32, col as u16, value);
            }
        }

        Ok(worksheet)
    }

    /// Detect the type of a field value
    ///
    /// Formulas are recognized regardless of `auto_detect`.
    fn detect_type(field: &str, auto_detect: bool) -> CellValue {
        let trimmed = field.trim();

        if trimmed.len() > 1 && trimmed.starts_with('=') {
            return CellValue::formula(trimmed);
        }
        if !auto_detect {
            return text(field);
        }
        if trimmed.is_empty() {
            return CellValue::Empty;
        }

        if trimmed.eq_ignore_ascii_case("true") {
            return CellValue::Boolean(true);
        }
        if trimmed.eq_ignore_ascii_case("false") {
            return CellValue::Boolean(false);
        }

        if let Ok(n) = trimmed.parse::<f64>() {
            if n.is_finite() {
                return CellValue::Number(n);
            }
        }

        if let Some(percent) = trimmed.strip_suffix('%') {
            if let Ok(n) = percent.trim().parse::<f64>() {
                return CellValue::Number(n / 100.0);
            }
        }

        if let Some(serial) = date_serial(trimmed) {
            return CellValue::Date(serial);
        }

        CellValue::string(trimmed)
    }
}

fn text(field: &str) -> CellValue {
    if field.is_empty() {
        CellValue::Empty
    } else {
        CellValue::string(field)
    }
}

/// Serial day number of an ISO `YYYY-MM-DD` date, counted from 1899-12-30
fn date_serial(field: &str) -> Option<f64> {
    let date = NaiveDate::parse_from_str(field, "%Y-%m-%d").ok()?;
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    Some(date.signed_duration_since(epoch).num_days() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn detect(field: &str) -> CellValue {
        CsvReader::detect_type(field, true)
    }

    #[test]
    fn test_detect_type() {
        assert_eq!(detect("42"), CellValue::Number(42.0));
        assert_eq!(detect(" 1.5 "), CellValue::Number(1.5));
        assert_eq!(detect("TRUE"), CellValue::Boolean(true));
        assert_eq!(detect("false"), CellValue::Boolean(false));
        assert_eq!(detect("1"), CellValue::Number(1.0));
        assert_eq!(detect("5%"), CellValue::Number(0.05));
        assert_eq!(detect(""), CellValue::Empty);
        assert_eq!(detect("inf"), CellValue::string("inf"));
        assert_eq!(detect("hello"), CellValue::string("hello"));
    }

    #[test]
    fn test_detect_dates() {
        assert_eq!(detect("1900-01-01"), CellValue::Date(2.0));
        assert_eq!(detect("2024-01-15"), CellValue::Date(45306.0));
        assert_eq!(detect("2024-02-30"), CellValue::string("2024-02-30"));
    }

    #[test]
    fn test_formulas_kept_without_detection() {
        assert!(CsvReader::detect_type("=A1+1", false).is_formula());
        assert_eq!(CsvReader::detect_type("=", true), CellValue::string("="));
        assert_eq!(CsvReader::detect_type("42", false), CellValue::string("42"));
    }

    #[test]
    fn test_read_grid() {
        let sheet = CsvReader::read_str("1,2\n3,,=A1+B1\n", &CsvReadOptions::default()).unwrap();

        assert_eq!(sheet.name(), "Sheet1");
        assert_eq!(sheet.get_value("A2").unwrap(), CellValue::Number(3.0));
        assert_eq!(sheet.get_value("B2").unwrap(), CellValue::Empty);
        assert_eq!(
            sheet.get_value("C2").unwrap().formula_text(),
            Some("=A1+B1")
        );
        assert_eq!(sheet.cell_count(), 4);
    }

    #[test]
    fn test_header_row_is_text() {
        let options = CsvReadOptions::new()
            .with_header(true)
            .with_delimiter(b';')
            .with_sheet_name("Prices");
        let sheet = CsvReader::read_str("2024;TRUE\n5;=A2*2\n", &options).unwrap();

        assert_eq!(sheet.name(), "Prices");
        assert_eq!(sheet.get_value("A1").unwrap(), CellValue::string("2024"));
        assert_eq!(sheet.get_value("B1").unwrap(), CellValue::string("TRUE"));
        assert_eq!(sheet.get_value("A2").unwrap(), CellValue::Number(5.0));
    }
}
