use anyhow::{Context, Result};
use csv::WriterBuilder;

use super::Table;

/// Spreadsheet tools sniff this to decode the file as UTF-8.
pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Encode `table` as CSV prefixed with a UTF-8 byte-order mark.
/// Missing values are written as empty fields.
pub fn to_csv_bytes(table: &Table) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(UTF8_BOM.len() + table.num_rows() * 32);
    buf.extend_from_slice(UTF8_BOM);

    let mut wtr = WriterBuilder::new().from_writer(buf);
    wtr.write_record(table.columns())
        .context("writing CSV header")?;
    for (idx, row) in table.rows().iter().enumerate() {
        wtr.write_record(row.iter().map(|cell| cell.as_deref().unwrap_or("")))
            .with_context(|| format!("writing CSV row {}", idx))?;
    }

    wtr.into_inner()
        .map_err(|e| e.into_error())
        .context("flushing CSV buffer")
}
