use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sheet \"{0}\" not found")]
    MissingSheet(String),
    #[error("a row of sheet \"{0}\" was modified since it was read")]
    StaleRow(String),
    #[error("sheet \"{0}\" is locked by another writer")]
    Locked(String),
    #[error("cannot access sheet \"{sheet}\"")]
    Io {
        sheet: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed csv in sheet \"{sheet}\"")]
    Csv {
        sheet: String,
        #[source]
        source: csv::Error,
    },
    #[error("database error")]
    Sql(#[from] sqlx::Error),
}

/// A named table of the backing store together with the columns this program
/// reads and writes. Stored sheets may carry more columns than these.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sheet {
    pub title: String,
    pub columns: Vec<String>,
}

impl Sheet {
    pub fn new(title: &str, columns: Vec<String>) -> Self {
        Self {
            title: title.to_owned(),
            columns,
        }
    }
}

/// Snapshot of one stored row. Modifications are local until the row is
/// handed back to [`RecordStore::save_row`], which refuses the write if the
/// stored row no longer holds the values read here.
#[derive(Clone, Debug)]
pub struct Row {
    position: usize,
    cells: HashMap<String, String>,
    original: HashMap<String, String>,
}

impl Row {
    pub fn new(position: usize, cells: HashMap<String, String>) -> Self {
        Self {
            position,
            original: cells.clone(),
            cells,
        }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// Value of `column`, or the empty string when the cell is absent.
    pub fn get(&self, column: &str) -> &str {
        self.cells.get(column).map_or("", String::as_str)
    }

    pub fn set(&mut self, column: &str, value: impl Into<String>) {
        self.cells.insert(column.to_owned(), value.into());
    }

    pub fn cells(&self) -> &HashMap<String, String> {
        &self.cells
    }

    pub fn original(&self) -> &HashMap<String, String> {
        &self.original
    }

    pub fn is_modified(&self) -> bool {
        !same_cells(&self.cells, &self.original)
    }
}

/// Compare two sets of cells, an absent cell being equal to an empty one.
pub fn same_cells(a: &HashMap<String, String>, b: &HashMap<String, String>) -> bool {
    a.keys()
        .chain(b.keys())
        .all(|k| a.get(k).map_or("", String::as_str) == b.get(k).map_or("", String::as_str))
}

/// Tabular backing store: full scans, appends and conditional row updates.
#[allow(async_fn_in_trait)]
pub trait RecordStore {
    /// Create the sheet if it does not exist, and add any of its columns
    /// missing from an existing one.
    async fn ensure_sheet(&mut self, sheet: &Sheet) -> Result<(), StoreError>;

    async fn rows(&mut self, sheet: &Sheet) -> Result<Vec<Row>, StoreError>;

    async fn add_row(
        &mut self,
        sheet: &Sheet,
        cells: Vec<(String, String)>,
    ) -> Result<(), StoreError>;

    /// Persist `row`. Fails with [`StoreError::StaleRow`] and writes nothing
    /// if the stored row differs from the values `row` was read with.
    async fn save_row(&mut self, sheet: &Sheet, row: &Row) -> Result<(), StoreError>;

    async fn find_row(
        &mut self,
        sheet: &Sheet,
        column: &str,
        value: &str,
    ) -> Result<Option<Row>, StoreError> {
        Ok(self
            .rows(sheet)
            .await?
            .into_iter()
            .find(|row| row.get(column) == value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_cells_read_as_empty() {
        let row = Row::new(0, HashMap::from([("a".to_owned(), "1".to_owned())]));
        assert_eq!(row.get("a"), "1");
        assert_eq!(row.get("b"), "");
    }

    #[test]
    fn setting_an_absent_cell_to_empty_is_not_a_modification() {
        let mut row = Row::new(3, HashMap::from([("a".to_owned(), "1".to_owned())]));
        row.set("b", "");
        assert!(!row.is_modified());
        row.set("a", "2");
        assert!(row.is_modified());
        assert_eq!(row.original()["a"], "1");
        assert_eq!(row.position(), 3);
    }
}
