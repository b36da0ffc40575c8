//! Example: Create an xlsx file with formulas and grouped rows

use gridbook::prelude::*;
use gridbook::XlsxResult;

fn main() -> XlsxResult<()> {
    let mut workbook = Workbook::new();
    let sheet = workbook.sheet_at_mut(0).unwrap();

    // Add header row
    sheet.set_value("A1", "Name")?;
    sheet.set_value("B1", "Value")?;
    sheet.set_value("C1", "Double")?;

    // Add data rows
    sheet.set_value("A2", "Item 1")?;
    sheet.set_value("B2", 100.0)?;
    sheet.set_formula("C2", "B2*2")?;

    sheet.set_value("A3", "Item 2")?;
    sheet.set_value("B3", 200.0)?;
    sheet.set_formula("C3", "B3*2")?;

    // Add total row
    sheet.set_value("A4", "Total")?;
    sheet.set_formula("B4", "SUM(B2:B3)")?;
    sheet.set_formula("C4", "SUM(C2:C3)")?;

    // Group the detail rows under the total
    sheet.group_rows(1, 2)?;

    // Save the file
    workbook.save("/tmp/test.xlsx")?;
    println!("Created /tmp/test.xlsx");

    // Read it back and show what survived
    let reloaded = Workbook::open("/tmp/test.xlsx")?;
    let sheet = reloaded.sheet_at(0).unwrap();
    println!("\nReloaded values:");
    println!("B2: {:?}", sheet.value("B2")?.as_number());
    println!("C2 formula: {:?}", sheet.value("C2")?.formula_text());
    println!("B4 formula: {:?}", sheet.value("B4")?.formula_text());
    println!("Row groups: {:?}", sheet.row_groups());

    Ok(())
}
