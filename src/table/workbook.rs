use anyhow::{Context, Result};
use rust_xlsxwriter::{Format, Workbook};

use super::Table;

pub const SHEET_NAME: &str = "Master";

/// Encode `table` as a single-sheet xlsx workbook: a header row followed by
/// one string cell per value. Missing values are left as blank cells.
pub fn to_xlsx_bytes(table: &Table) -> Result<Vec<u8>> {
    let blank = Format::new();
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;

    for (col, name) in table.columns().iter().enumerate() {
        sheet
            .write_string(0, sheet_col(col)?, name)
            .with_context(|| format!("writing header cell {}", col))?;
    }
    for (idx, row) in table.rows().iter().enumerate() {
        let r = u32::try_from(idx + 1).context("row index exceeds the sheet limit")?;
        // a row of missing values still takes a line on the sheet
        if row.iter().all(Option::is_none) {
            sheet.write_blank(r, 0, &blank)?;
            continue;
        }
        for (col, cell) in row.iter().enumerate() {
            let Some(value) = cell else { continue };
            sheet
                .write_string(r, sheet_col(col)?, value)
                .with_context(|| format!("writing row {} column {}", idx, col))?;
        }
    }

    workbook.save_to_buffer().context("serializing workbook")
}

fn sheet_col(col: usize) -> Result<u16> {
    u16::try_from(col).context("column index exceeds the sheet limit")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::read_csv_bytes;
    use std::io::{Cursor, Read};
    use zip::ZipArchive;

    fn part(xlsx: &[u8], name: &str) -> Result<String> {
        let mut archive = ZipArchive::new(Cursor::new(xlsx))?;
        let mut out = String::new();
        archive.by_name(name)?.read_to_string(&mut out)?;
        Ok(out)
    }

    #[test]
    fn header_and_rows_land_on_one_sheet() -> Result<()> {
        let table = read_csv_bytes(b"seat,votes\nnorth,10\nsouth,\n,\neast,7\n")?;
        let xlsx = to_xlsx_bytes(&table)?;

        let workbook = part(&xlsx, "xl/workbook.xml")?;
        assert!(workbook.contains(&format!("name=\"{}\"", SHEET_NAME)));

        let sheet = part(&xlsx, "xl/worksheets/sheet1.xml")?;
        assert_eq!(sheet.matches("<row ").count(), 5);
        // "south" has no votes, so row 3 only has an A cell
        assert!(sheet.contains("r=\"A3\""));
        assert!(!sheet.contains("r=\"B3\""));

        let strings = part(&xlsx, "xl/sharedStrings.xml")?;
        for value in ["seat", "votes", "north", "10", "east"] {
            assert!(strings.contains(&format!("<t>{}</t>", value)), "{value}");
        }
        Ok(())
    }

    #[test]
    fn header_only_table_is_a_single_row() -> Result<()> {
        let table = read_csv_bytes(b"a,b,c\n")?;
        let sheet = part(&to_xlsx_bytes(&table)?, "xl/worksheets/sheet1.xml")?;
        assert_eq!(sheet.matches("<row ").count(), 1);
        Ok(())
    }
}
