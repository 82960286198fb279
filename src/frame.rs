use crate::error::{FdError, Result};

/// A single table value. The loader only produces `Text` and `Null`;
/// type coercion narrows cells to `Int` and `Float` afterwards.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Int(i64),
    Float(f32),
    Text(String),
}

impl Cell {
    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    /// Textual form used for join-key comparison. `Null` keys never match.
    pub fn key_text(&self) -> Option<String> {
        match self {
            Cell::Null => None,
            Cell::Int(i) => Some(i.to_string()),
            Cell::Float(_) => None,
            Cell::Text(s) => Some(s.clone()),
        }
    }
}

/// An in-memory table: ordered column names plus row-major cells.
/// Used both for fully-materialized reference tables and for streamed
/// fact fragments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Frame {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn push_row(&mut self, row: Vec<Cell>) {
        debug_assert_eq!(row.len(), self.columns.len());
        self.rows.push(row);
    }

    /// Appends another frame's rows. Column lists must match exactly.
    pub fn extend(&mut self, other: Frame) -> Result<()> {
        if other.columns != self.columns {
            return Err(FdError::SchemaMismatch(format!(
                "cannot append rows: expected columns {:?}, got {:?}",
                self.columns, other.columns
            )));
        }
        self.rows.extend(other.rows);
        Ok(())
    }

    /// Renames a column if it exists; succeeds either way. This is the
    /// idempotent remap used for documented upstream naming quirks.
    pub fn rename_if_present(&mut self, from: &str, to: &str) {
        if let Some(idx) = self.column_index(from) {
            self.columns[idx] = to.to_string();
        }
    }

    /// Applies `f` to every cell of one column.
    pub fn map_column<F>(&mut self, idx: usize, mut f: F) -> Result<()>
    where
        F: FnMut(&mut Cell) -> Result<()>,
    {
        for row in &mut self.rows {
            f(&mut row[idx])?;
        }
        Ok(())
    }

    /// Projects the frame onto an explicit column list, preserving row
    /// order. Columns absent from the frame are filled with `Null`;
    /// columns absent from the list are dropped.
    pub fn project(&self, columns: &[&str]) -> Frame {
        let indices: Vec<Option<usize>> = columns.iter().map(|c| self.column_index(c)).collect();
        let mut out = Frame::new(columns.iter().map(|c| c.to_string()).collect());
        for row in &self.rows {
            let projected = indices
                .iter()
                .map(|idx| match idx {
                    Some(i) => row[*i].clone(),
                    None => Cell::Null,
                })
                .collect();
            out.push_row(projected);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Frame {
        let mut frame = Frame::new(vec!["code".to_string(), "value".to_string()]);
        frame.push_row(vec![Cell::Text("A".to_string()), Cell::Text("1".to_string())]);
        frame.push_row(vec![Cell::Text("B".to_string()), Cell::Null]);
        frame
    }

    #[test]
    fn rename_if_present_is_idempotent() {
        let mut frame = sample();
        frame.rename_if_present("code", "series_code");
        assert!(frame.has_column("series_code"));

        // Renaming a column that no longer exists is a no-op, not an error.
        frame.rename_if_present("code", "series_code");
        assert_eq!(frame.columns(), ["series_code", "value"]);
    }

    #[test]
    fn project_fills_missing_columns_with_null() {
        let frame = sample();
        let projected = frame.project(&["value", "code", "note"]);
        assert_eq!(projected.columns(), ["value", "code", "note"]);
        assert_eq!(projected.len(), 2);
        assert_eq!(projected.rows()[0][1], Cell::Text("A".to_string()));
        assert_eq!(projected.rows()[0][2], Cell::Null);
    }

    #[test]
    fn extend_rejects_mismatched_columns() {
        let mut frame = sample();
        let other = Frame::new(vec!["code".to_string()]);
        assert!(frame.extend(other).is_err());
    }

    #[test]
    fn null_keys_never_match() {
        assert_eq!(Cell::Null.key_text(), None);
        assert_eq!(Cell::Text("X".to_string()).key_text().as_deref(), Some("X"));
    }
}
