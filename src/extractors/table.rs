// src/extractors/table.rs
use serde::Serialize;
use std::collections::HashSet;

/// Prefix given to a column whose header cell was empty.
pub const UNNAMED_PREFIX: &str = "Unnamed: ";

/// A rectangular table of string cells. An empty string means "no value".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedTable {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl ParsedTable {
    /// Builds a table, padding or truncating every row to the column count.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();
        Self { columns, rows }
    }

    /// Builds a table from a raw header record and data records.
    /// Header names are disambiguated, empty rows and columns dropped, and
    /// all-placeholder headers renamed to `Column_N`.
    pub fn from_records(header: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let table = Self::new(disambiguate_headers(header), rows).drop_empty();
        table.rename_placeholder_columns()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.columns.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Cell in `row` under the column called `name`.
    pub fn cell(&self, row: usize, name: &str) -> Option<&str> {
        let col = self.column_index(name)?;
        self.rows.get(row).map(|r| r[col].as_str())
    }

    /// Cell in `row` at column position `col`.
    pub fn cell_at(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(row)?.get(col).map(String::as_str)
    }

    /// Drops every row and every column whose cells are all empty.
    /// A table without rows keeps its columns.
    pub fn drop_empty(self) -> Self {
        let rows: Vec<Vec<String>> = self
            .rows
            .into_iter()
            .filter(|row| row.iter().any(|cell| !cell.is_empty()))
            .collect();

        if rows.is_empty() {
            return Self { columns: self.columns, rows };
        }

        let keep: Vec<bool> = (0..self.columns.len())
            .map(|col| rows.iter().any(|row| !row[col].is_empty()))
            .collect();

        let columns = self
            .columns
            .into_iter()
            .zip(&keep)
            .filter_map(|(name, &k)| k.then_some(name))
            .collect();
        let rows = rows
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .zip(&keep)
                    .filter_map(|(cell, &k)| k.then_some(cell))
                    .collect()
            })
            .collect();

        Self { columns, rows }
    }

    /// Applies `f` to every cell of every column for which `select` is true.
    pub fn map_cells<S, F>(mut self, select: S, f: F) -> Self
    where
        S: Fn(usize) -> bool,
        F: Fn(&str) -> String,
    {
        for row in &mut self.rows {
            for (col, cell) in row.iter_mut().enumerate() {
                if select(col) {
                    *cell = f(cell);
                }
            }
        }
        self
    }

    /// Column names and the first `max_rows` rows joined by spaces.
    pub fn search_text(&self, max_rows: usize) -> String {
        let mut text = self.columns.join(" ");
        for row in self.rows.iter().take(max_rows) {
            for cell in row {
                text.push(' ');
                text.push_str(cell);
            }
        }
        text
    }

    fn rename_placeholder_columns(mut self) -> Self {
        if !self.columns.is_empty() && self.columns.iter().all(|c| c.starts_with(UNNAMED_PREFIX)) {
            self.columns = (0..self.columns.len()).map(|i| format!("Column_{}", i)).collect();
        }
        self
    }
}

/// Makes header names unique. Empty names become `Unnamed: {position}`;
/// repeats of a name get `.1`, `.2`, ... appended in order of appearance.
pub fn disambiguate_headers(header: Vec<String>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut names = Vec::with_capacity(header.len());

    for (i, raw) in header.into_iter().enumerate() {
        let base = if raw.trim().is_empty() {
            format!("{}{}", UNNAMED_PREFIX, i)
        } else {
            raw.trim().to_string()
        };

        let mut name = base.clone();
        let mut n = 1;
        while seen.contains(&name) {
            name = format!("{}.{}", base, n);
            n += 1;
        }
        seen.insert(name.clone());
        names.push(name);
    }

    names
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_duplicate_headers_get_suffixes() {
        let names = disambiguate_headers(strings(&["납부일", "금액", "납부일", "", "납부일"]));
        assert_eq!(names, strings(&["납부일", "금액", "납부일.1", "Unnamed: 3", "납부일.2"]));
    }

    #[test]
    fn test_drop_empty_rows_and_columns() {
        let table = ParsedTable::new(
            strings(&["A", "B", "C"]),
            vec![strings(&["1", "", "x"]), strings(&["", "", ""]), strings(&["2", "", "y"])],
        )
        .drop_empty();

        assert_eq!(table.columns(), strings(&["A", "C"]).as_slice());
        assert_eq!(table.rows(), &[strings(&["1", "x"]), strings(&["2", "y"])]);
    }

    #[test]
    fn test_placeholder_headers_renamed() {
        let table = ParsedTable::from_records(
            strings(&["", ""]),
            vec![strings(&["a", "b"])],
        );
        assert_eq!(table.columns(), strings(&["Column_0", "Column_1"]).as_slice());

        // One real header keeps the placeholders as they are
        let mixed = ParsedTable::from_records(strings(&["Name", ""]), vec![strings(&["a", "b"])]);
        assert_eq!(mixed.columns(), strings(&["Name", "Unnamed: 1"]).as_slice());
    }

    #[test]
    fn test_rows_padded_to_width() {
        let table = ParsedTable::new(strings(&["A", "B"]), vec![strings(&["1"])]);
        assert_eq!(table.cell(0, "B"), Some(""));
        assert_eq!(table.cell_at(0, 0), Some("1"));
        assert_eq!(table.cell(1, "A"), None);
    }
}
