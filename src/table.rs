//! Editable recognition results table.
//!
//! Rows arrive one per recognition request; columns grow as wider results
//! come in and never shrink, so data already entered in earlier columns
//! survives later recognitions with fewer fields.

/// Headers plus rows of cell text. Cells are plain strings: the table is
/// the editable staging area between recognition and export.
#[derive(Debug, Clone, Default)]
pub struct ResultsTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl ResultsTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.rows.get(row)?.get(column).map(String::as_str)
    }

    /// Edit a cell in place. Out-of-range coordinates are ignored.
    pub fn set_cell(&mut self, row: usize, column: usize, value: impl Into<String>) {
        if let Some(cell) = self.rows.get_mut(row).and_then(|r| r.get_mut(column)) {
            *cell = value.into();
        }
    }

    /// Append one result row of `(field name, text)` cells.
    ///
    /// When the row is wider than the table, new columns are created using
    /// the incoming field names and every existing row is padded; existing
    /// headers (possibly renamed by the user) are never overwritten, and
    /// columns are never removed. A narrower row is padded with empty
    /// cells.
    pub fn push_row(&mut self, cells: Vec<(String, String)>) {
        if cells.len() > self.headers.len() {
            for (name, _) in cells.iter().skip(self.headers.len()) {
                self.headers.push(name.clone());
            }
            let width = self.headers.len();
            for row in &mut self.rows {
                row.resize(width, String::new());
            }
        }

        let mut row: Vec<String> = cells.into_iter().map(|(_, text)| text).collect();
        row.resize(self.headers.len(), String::new());
        self.rows.push(row);
    }

    /// Rename a column header. Out-of-range indices are ignored.
    pub fn rename_header(&mut self, column: usize, name: impl Into<String>) {
        if let Some(header) = self.headers.get_mut(column) {
            *header = name.into();
        }
    }

    /// Delete the given rows. Indices may arrive in any order and may
    /// contain duplicates or out-of-range entries.
    pub fn delete_rows(&mut self, indices: &[usize]) {
        let mut sorted: Vec<usize> = indices.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        for index in sorted.into_iter().rev() {
            if index < self.rows.len() {
                self.rows.remove(index);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(n, t)| (n.to_string(), t.to_string()))
            .collect()
    }

    #[test]
    fn test_push_row_creates_columns() {
        let mut table = ResultsTable::new();
        table.push_row(cells(&[("Region 1", "a"), ("Region 2", "b")]));
        assert_eq!(table.headers(), &["Region 1", "Region 2"]);
        assert_eq!(table.row_count(), 1);
        assert_eq!(table.cell(0, 1), Some("b"));
    }

    #[test]
    fn test_wider_row_grows_and_pads_history() {
        let mut table = ResultsTable::new();
        table.push_row(cells(&[("Region 1", "a")]));
        table.push_row(cells(&[("Region 1", "x"), ("Region 2", "y"), ("Region 3", "z")]));

        assert_eq!(table.column_count(), 3);
        // the older row was padded, not lost
        assert_eq!(table.cell(0, 0), Some("a"));
        assert_eq!(table.cell(0, 2), Some(""));
        assert_eq!(table.cell(1, 2), Some("z"));
    }

    #[test]
    fn test_narrower_row_is_padded() {
        let mut table = ResultsTable::new();
        table.push_row(cells(&[("Region 1", "a"), ("Region 2", "b")]));
        table.push_row(cells(&[("Region 1", "only")]));
        assert_eq!(table.cell(1, 1), Some(""));
        assert_eq!(table.column_count(), 2);
    }

    #[test]
    fn test_growth_keeps_renamed_headers() {
        let mut table = ResultsTable::new();
        table.push_row(cells(&[("Region 1", "a")]));
        table.rename_header(0, "Invoice number");
        table.push_row(cells(&[("Region 1", "x"), ("Region 2", "y")]));
        assert_eq!(table.headers(), &["Invoice number", "Region 2"]);
    }

    #[test]
    fn test_delete_rows_unordered_indices() {
        let mut table = ResultsTable::new();
        for i in 0..4 {
            table.push_row(vec![("Region 1".to_string(), format!("row{}", i))]);
        }
        table.delete_rows(&[3, 1, 1, 99]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.cell(0, 0), Some("row0"));
        assert_eq!(table.cell(1, 0), Some("row2"));
    }

    #[test]
    fn test_set_cell_ignores_out_of_range() {
        let mut table = ResultsTable::new();
        table.push_row(cells(&[("Region 1", "a")]));
        table.set_cell(0, 0, "edited");
        table.set_cell(5, 5, "nowhere");
        assert_eq!(table.cell(0, 0), Some("edited"));
    }
}
