//! Generates `pricing.rs` from a workbook built in code

use std::error::Error;
use std::path::PathBuf;

use sheetc::prelude::*;

fn main() -> Result<(), Box<dyn Error>> {
    println!("cargo:rerun-if-changed=build.rs");

    let mut workbook = Workbook::new();
    let rates = workbook.add_worksheet_with_name("Rates")?;
    workbook
        .worksheet_mut(rates)
        .ok_or("Rates sheet missing")?
        .set_cell_value("A1", 0.5)?;

    let sheet = workbook.worksheet_mut(0).ok_or("active sheet missing")?;
    // Inputs; A1 and A2 are read by several outputs
    sheet.set_cell_value("A1", 10.0)?;
    sheet.set_cell_value("A2", "Yes")?;
    sheet.set_cell_value("A3", CellValue::Date(45306.0))?;
    sheet.set_cell_value("K1", "a")?;
    sheet.set_cell_value("L1", 1.0)?;
    sheet.set_cell_value("K2", "B")?;
    sheet.set_cell_value("L2", 2.0)?;

    sheet.set_cell_formula("B1", "=A1*Rates!A1+(1+1)^2")?;
    sheet.set_cell_formula("C1", "=IF(A2=\"yes\",A1+ABS(-3),)")?;
    sheet.set_cell_formula("D1", "=E1+1")?;
    sheet.set_cell_formula("E1", "=D1+1")?;
    sheet.set_cell_formula("F1", "=D1")?;
    sheet.set_cell_formula("G1", "=OFFSET(A1,0,0)")?;
    sheet.set_cell_formula("H1", "=A2&\" \"&A1")?;
    sheet.set_cell_formula("I1", "=A3+30")?;
    sheet.set_cell_formula("J1", "=VLOOKUP(\"b\",K1:L2,2,)")?;

    let options = GenerateOptions::new().with_codegen(CodegenOptions::new().with_module("pricing"));
    let generation = workbook.generate(&options)?;

    let out = PathBuf::from(std::env::var("OUT_DIR")?).join("pricing.rs");
    std::fs::write(out, generation.source)?;
    Ok(())
}
