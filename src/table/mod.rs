// src/table/mod.rs

pub mod columnar;
pub mod encode;
pub mod read;
pub mod workbook;

use std::collections::{HashMap, TryReserveError};

pub use columnar::{to_record_batch, write_parquet};
pub use encode::{to_csv_bytes, UTF8_BOM};
pub use read::{read_csv_bytes, read_csv_path, TableError};
pub use workbook::to_xlsx_bytes;

/// One parsed CSV file, or the concatenation of several.
///
/// Every row holds exactly one cell per column. A `None` cell is a missing
/// value: either an empty field in the source file, or a column the row's
/// source file never had.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Option<String>>] {
        &self.rows
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// True when the table has no data rows (it may still carry a header).
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Append a row, padding short rows with missing values and dropping
    /// cells beyond the last column.
    pub fn push_row(&mut self, mut row: Vec<Option<String>>) {
        row.resize(self.columns.len(), None);
        self.rows.push(row);
    }

    /// Cell at `row` under the column named `column`.
    pub fn get(&self, row: usize, column: &str) -> Option<&str> {
        let idx = self.columns.iter().position(|c| c == column)?;
        self.rows.get(row)?.get(idx)?.as_deref()
    }

    /// Row-wise concatenation in the given order.
    ///
    /// Columns are the union of every input's columns, in order of first
    /// appearance. Cells for columns a table lacks come out as `None`.
    pub fn concat<'a, I>(tables: I) -> Result<Table, TryReserveError>
    where
        I: IntoIterator<Item = &'a Table>,
    {
        let tables: Vec<&Table> = tables.into_iter().collect();

        let mut columns: Vec<String> = Vec::new();
        let mut index: HashMap<&str, usize> = HashMap::new();
        for table in &tables {
            for name in &table.columns {
                if !index.contains_key(name.as_str()) {
                    index.insert(name.as_str(), columns.len());
                    columns.push(name.clone());
                }
            }
        }

        let total: usize = tables.iter().map(|t| t.num_rows()).sum();
        let mut rows: Vec<Vec<Option<String>>> = Vec::new();
        rows.try_reserve_exact(total)?;

        for table in &tables {
            // target position of each of this table's columns
            let positions: Vec<usize> = table
                .columns
                .iter()
                .map(|name| index[name.as_str()])
                .collect();

            for src in &table.rows {
                let mut row = vec![None; columns.len()];
                for (cell, &pos) in src.iter().zip(&positions) {
                    row[pos] = cell.clone();
                }
                rows.push(row);
            }
        }

        Ok(Table { columns, rows })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(columns: &[&str], rows: &[&[Option<&str>]]) -> Table {
        let mut t = Table::new(columns.iter().map(|c| c.to_string()).collect());
        for row in rows {
            t.push_row(row.iter().map(|c| c.map(str::to_string)).collect());
        }
        t
    }

    #[test]
    fn concat_keeps_input_order() {
        let a = table(&["id"], &[&[Some("a1")], &[Some("a2")]]);
        let b = table(&["id"], &[&[Some("b1")]]);

        let out = Table::concat([&a, &b]).unwrap();
        assert_eq!(out.num_rows(), 3);
        assert_eq!(out.get(0, "id"), Some("a1"));
        assert_eq!(out.get(1, "id"), Some("a2"));
        assert_eq!(out.get(2, "id"), Some("b1"));
    }

    #[test]
    fn concat_unions_columns_with_missing_markers() {
        let detail = table(&["seat", "votes"], &[&[Some("north"), Some("10")]]);
        let sup = table(&["seat", "party"], &[&[Some("south"), Some("green")]]);

        let out = Table::concat([&detail, &sup]).unwrap();
        assert_eq!(out.columns(), ["seat", "votes", "party"]);
        assert_eq!(
            out.rows(),
            [
                vec![Some("north".to_string()), Some("10".to_string()), None],
                vec![Some("south".to_string()), None, Some("green".to_string())],
            ]
        );
    }

    #[test]
    fn concat_of_nothing_is_empty() {
        let out = Table::concat(std::iter::empty::<&Table>()).unwrap();
        assert_eq!(out.num_columns(), 0);
        assert!(out.is_empty());
    }

    #[test]
    fn push_row_pads_short_rows() {
        let t = table(&["a", "b", "c"], &[&[Some("1")]]);
        assert_eq!(t.rows()[0], vec![Some("1".to_string()), None, None]);
    }
}
