use super::record::{RecordStore, Row, Sheet, StoreError, same_cells};
use std::collections::HashMap;
use tracing::debug;

#[derive(Clone, Debug, Default)]
struct MemorySheet {
    columns: Vec<String>,
    rows: Vec<HashMap<String, String>>,
}

/// Sheets kept in process memory. Used for dry runs and tests.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    sheets: HashMap<String, MemorySheet>,
}

impl MemoryStore {
    /// Copy the given sheets out of another store. Sheets absent from
    /// `source` are absent from the copy as well.
    pub async fn snapshot<S: RecordStore>(
        source: &mut S,
        sheets: &[&Sheet],
    ) -> Result<Self, StoreError> {
        let mut copy = Self::default();
        for sheet in sheets {
            match source.rows(sheet).await {
                Ok(rows) => {
                    debug!(sheet = %sheet.title, rows = rows.len(), "sheet copied");
                    copy.sheets.insert(
                        sheet.title.clone(),
                        MemorySheet {
                            columns: sheet.columns.clone(),
                            rows: rows.into_iter().map(|r| r.cells().clone()).collect(),
                        },
                    );
                }
                Err(StoreError::MissingSheet(_)) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(copy)
    }

    fn sheet_mut(&mut self, sheet: &Sheet) -> Result<&mut MemorySheet, StoreError> {
        self.sheets
            .get_mut(&sheet.title)
            .ok_or_else(|| StoreError::MissingSheet(sheet.title.clone()))
    }
}

impl RecordStore for MemoryStore {
    async fn ensure_sheet(&mut self, sheet: &Sheet) -> Result<(), StoreError> {
        let stored = self.sheets.entry(sheet.title.clone()).or_default();
        for column in &sheet.columns {
            if !stored.columns.contains(column) {
                stored.columns.push(column.clone());
            }
        }
        Ok(())
    }

    async fn rows(&mut self, sheet: &Sheet) -> Result<Vec<Row>, StoreError> {
        Ok(self
            .sheet_mut(sheet)?
            .rows
            .iter()
            .enumerate()
            .map(|(position, cells)| Row::new(position, cells.clone()))
            .collect())
    }

    async fn add_row(
        &mut self,
        sheet: &Sheet,
        cells: Vec<(String, String)>,
    ) -> Result<(), StoreError> {
        self.sheet_mut(sheet)?.rows.push(cells.into_iter().collect());
        Ok(())
    }

    async fn save_row(&mut self, sheet: &Sheet, row: &Row) -> Result<(), StoreError> {
        if !row.is_modified() {
            return Ok(());
        }
        let stored = self
            .sheet_mut(sheet)?
            .rows
            .get_mut(row.position())
            .filter(|stored| same_cells(stored, row.original()))
            .ok_or_else(|| StoreError::StaleRow(sheet.title.clone()))?;
        stored.clone_from(row.cells());
        Ok(())
    }
}
