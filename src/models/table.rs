//! In-memory table used for CSV input and output.

use serde::Serialize;

/// Ordered column names plus string rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Create an empty table with the given header.
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column by exact name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Append a row, padding or truncating it to the header width.
    pub fn push_row(&mut self, mut row: Vec<String>) {
        row.resize(self.columns.len(), String::new());
        self.rows.push(row);
    }

    /// Add a column holding the same value in every existing row.
    pub fn add_constant_column(&mut self, name: impl Into<String>, value: &str) {
        self.columns.push(name.into());
        for row in &mut self.rows {
            row.push(value.to_string());
        }
    }

    /// Keep only the named columns, in the given order.
    ///
    /// Unknown names are skipped; returns the names that were kept.
    pub fn select(&self, names: &[String]) -> (Table, Vec<String>) {
        let picks: Vec<(usize, &String)> = names
            .iter()
            .filter_map(|name| self.column_index(name).map(|idx| (idx, name)))
            .collect();

        let table = Table {
            columns: picks.iter().map(|(_, name)| (*name).clone()).collect(),
            rows: self
                .rows
                .iter()
                .map(|row| picks.iter().map(|(idx, _)| row[*idx].clone()).collect())
                .collect(),
        };
        let kept = table.columns.clone();
        (table, kept)
    }

    /// Append another table, aligning cells by column name.
    ///
    /// Columns unseen so far are added at the end; rows missing a column get an
    /// empty cell.
    pub fn append(&mut self, other: Table) {
        if self.columns.is_empty() && self.rows.is_empty() {
            *self = other;
            return;
        }

        let mapping: Vec<usize> = other
            .columns
            .iter()
            .map(|name| match self.column_index(name) {
                Some(idx) => idx,
                None => {
                    self.columns.push(name.clone());
                    for row in &mut self.rows {
                        row.push(String::new());
                    }
                    self.columns.len() - 1
                }
            })
            .collect();

        let width = self.columns.len();
        for source in other.rows {
            let mut row = vec![String::new(); width];
            for (cell, &target) in source.into_iter().zip(&mapping) {
                row[target] = cell;
            }
            self.rows.push(row);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_select_skips_unknown_columns() {
        let mut table = Table::new(["a", "b", "c"]);
        table.push_row(row(&["1", "2", "3"]));

        let (selected, kept) = table.select(&["c".into(), "zz".into(), "a".into()]);
        assert_eq!(kept, vec!["c", "a"]);
        assert_eq!(selected.rows, vec![row(&["3", "1"])]);
    }

    #[test]
    fn test_append_aligns_by_name() {
        let mut first = Table::new(["name", "page_index"]);
        first.push_row(row(&["x", "1"]));

        let mut second = Table::new(["page_index", "name", "extra"]);
        second.push_row(row(&["2", "y", "e"]));

        first.append(second);
        assert_eq!(first.columns, vec!["name", "page_index", "extra"]);
        assert_eq!(first.rows, vec![row(&["x", "1", ""]), row(&["y", "2", "e"])]);
    }

    #[test]
    fn test_append_into_empty_takes_other() {
        let mut table = Table::default();
        let mut other = Table::new(["a"]);
        other.push_row(row(&["1"]));
        table.append(other.clone());
        assert_eq!(table, other);
    }

    #[test]
    fn test_add_constant_column() {
        let mut table = Table::new(["a"]);
        table.push_row(row(&["1"]));
        table.push_row(row(&["2"]));
        table.add_constant_column("page_index", "4");
        assert_eq!(table.rows, vec![row(&["1", "4"]), row(&["2", "4"])]);
    }

    #[test]
    fn test_push_row_pads() {
        let mut table = Table::new(["a", "b"]);
        table.push_row(row(&["1"]));
        assert_eq!(table.rows[0], row(&["1", ""]));
    }
}
