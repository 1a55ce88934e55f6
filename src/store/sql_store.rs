use super::record::{RecordStore, Row, Sheet, StoreError};
use sqlx::any::{AnyConnectOptions, AnyRow};
use sqlx::{AnyConnection, Column as _, Connection, Executor as _, Row as _, Statement as _};
use std::collections::{HashMap, HashSet};
use std::str::FromStr;
use tracing::{debug, trace};

/// One table per sheet in a database reached through `sqlx`'s `Any` driver.
/// Table and column names are derived from sheet titles and headers with
/// [`identifier`].
pub struct SqlStore {
    conn: AnyConnection,
}

/// Lower snake case form of a title or header, e.g. `Year ?` becomes `year`
/// and `Member-1 Reg NO` becomes `member_1_reg_no`.
pub fn identifier(name: &str) -> String {
    name.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_ascii_lowercase)
        .collect::<Vec<_>>()
        .join("_")
}

impl SqlStore {
    pub async fn new(url: &str) -> Result<Self, StoreError> {
        sqlx::any::install_default_drivers();
        Ok(Self {
            conn: AnyConnection::connect_with(&AnyConnectOptions::from_str(url)?).await?,
        })
    }

    fn column_list(sheet: &Sheet) -> String {
        sheet
            .columns
            .iter()
            .map(|c| identifier(c))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Column names of an existing table, read from a prepared statement.
    async fn existing_columns(&mut self, table: &str) -> Result<HashSet<String>, StoreError> {
        let sql = format!("SELECT * FROM {table}");
        let statement = (&mut self.conn).prepare(&sql).await?;
        Ok(statement
            .columns()
            .iter()
            .map(|c| c.name().to_ascii_lowercase())
            .collect())
    }
}

impl RecordStore for SqlStore {
    async fn ensure_sheet(&mut self, sheet: &Sheet) -> Result<(), StoreError> {
        let columns = sheet
            .columns
            .iter()
            .map(|c| format!("{} TEXT", identifier(c)))
            .collect::<Vec<_>>()
            .join(", ");
        let table = identifier(&sheet.title);
        let sql = format!("CREATE TABLE IF NOT EXISTS {table} ({columns})");
        sqlx::query(&sql).execute(&mut self.conn).await?;
        let mut existing = self.existing_columns(&table).await?;
        for column in sheet.columns.iter().map(|c| identifier(c)) {
            if existing.contains(&column) {
                continue;
            }
            let sql = format!("ALTER TABLE {table} ADD COLUMN {column} TEXT");
            sqlx::query(&sql).execute(&mut self.conn).await?;
            debug!(sheet = %sheet.title, %table, %column, "column added");
            existing.insert(column);
        }
        debug!(sheet = %sheet.title, %table, "table ensured");
        Ok(())
    }

    async fn rows(&mut self, sheet: &Sheet) -> Result<Vec<Row>, StoreError> {
        let sql = format!(
            "SELECT {} FROM {}",
            Self::column_list(sheet),
            identifier(&sheet.title)
        );
        let rows: Vec<AnyRow> = sqlx::query(&sql).fetch_all(&mut self.conn).await?;
        trace!(sheet = %sheet.title, rows = rows.len(), "table scanned");
        rows.iter()
            .enumerate()
            .map(|(position, row)| -> Result<Row, StoreError> {
                let cells = sheet
                    .columns
                    .iter()
                    .enumerate()
                    .map(|(idx, column)| -> Result<_, sqlx::Error> {
                        Ok((
                            column.clone(),
                            row.try_get::<Option<String>, _>(idx)?.unwrap_or_default(),
                        ))
                    })
                    .collect::<Result<HashMap<_, _>, sqlx::Error>>()?;
                Ok(Row::new(position, cells))
            })
            .collect()
    }

    async fn add_row(
        &mut self,
        sheet: &Sheet,
        cells: Vec<(String, String)>,
    ) -> Result<(), StoreError> {
        let mut cells = cells.into_iter().collect::<HashMap<_, _>>();
        let placeholders = vec!["?"; sheet.columns.len()].join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({placeholders})",
            identifier(&sheet.title),
            Self::column_list(sheet)
        );
        let mut query = sqlx::query(&sql);
        for column in &sheet.columns {
            query = query.bind(cells.remove(column).unwrap_or_default());
        }
        query.execute(&mut self.conn).await?;
        Ok(())
    }

    /// The update is conditioned on every column still holding the value it
    /// was read with.
    async fn save_row(&mut self, sheet: &Sheet, row: &Row) -> Result<(), StoreError> {
        if !row.is_modified() {
            return Ok(());
        }
        let assignments = sheet
            .columns
            .iter()
            .map(|c| format!("{} = ?", identifier(c)))
            .collect::<Vec<_>>()
            .join(", ");
        let conditions = sheet
            .columns
            .iter()
            .map(|c| format!("COALESCE({}, '') = ?", identifier(c)))
            .collect::<Vec<_>>()
            .join(" AND ");
        let sql = format!(
            "UPDATE {} SET {assignments} WHERE {conditions}",
            identifier(&sheet.title)
        );
        let mut query = sqlx::query(&sql);
        for column in &sheet.columns {
            query = query.bind(row.get(column).to_owned());
        }
        for column in &sheet.columns {
            query = query.bind(row.original().get(column).cloned().unwrap_or_default());
        }
        let result = query.execute(&mut self.conn).await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::StaleRow(sheet.title.clone()));
        }
        Ok(())
    }
}
