use super::record::{RecordStore, Row, Sheet, StoreError, same_cells};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, trace, warn};

const LOCK_ATTEMPTS: u32 = 200;
const LOCK_RETRY: Duration = Duration::from_millis(25);

/// A directory holding one `<title>.csv` file per sheet, the first line of
/// each file being the column headers.
pub struct CsvStore {
    dir: PathBuf,
}

/// Exclusive hold on a sheet across processes, released when dropped.
struct SheetLock {
    path: PathBuf,
}

impl Drop for SheetLock {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            warn!(path = %self.path.display(), error = %e, "cannot release sheet lock");
        }
    }
}

struct CsvSheet {
    headers: Vec<String>,
    records: Vec<Vec<String>>,
}

impl CsvSheet {
    fn column(&mut self, name: &str) -> usize {
        if let Some(idx) = self.headers.iter().position(|h| h == name) {
            idx
        } else {
            self.headers.push(name.to_owned());
            self.headers.len() - 1
        }
    }

    fn cells(&self, record: &[String]) -> HashMap<String, String> {
        self.headers
            .iter()
            .enumerate()
            .map(|(idx, h)| (h.clone(), record.get(idx).cloned().unwrap_or_default()))
            .collect()
    }

    fn write_cells<'a>(
        &mut self,
        position: usize,
        cells: impl IntoIterator<Item = (&'a String, &'a String)>,
    ) {
        for (name, value) in cells {
            let idx = self.column(name);
            let record = &mut self.records[position];
            if record.len() <= idx {
                record.resize(idx + 1, String::new());
            }
            record[idx].clone_from(value);
        }
    }
}

impl CsvStore {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_owned(),
        }
    }

    fn path(&self, sheet: &Sheet) -> PathBuf {
        self.dir.join(format!("{}.csv", sheet.title))
    }

    /// Take the `<title>.csv.lock` file. Every read-modify-write of a sheet
    /// runs under it so that concurrent writers see each other's rows.
    async fn lock(&self, sheet: &Sheet) -> Result<SheetLock, StoreError> {
        let path = self.dir.join(format!("{}.csv.lock", sheet.title));
        for _ in 0..LOCK_ATTEMPTS {
            match tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(_) => {
                    trace!(sheet = %sheet.title, "sheet locked");
                    return Ok(SheetLock { path });
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    tokio::time::sleep(LOCK_RETRY).await;
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    return Err(StoreError::MissingSheet(sheet.title.clone()));
                }
                Err(source) => {
                    return Err(StoreError::Io {
                        sheet: sheet.title.clone(),
                        source,
                    });
                }
            }
        }
        Err(StoreError::Locked(sheet.title.clone()))
    }

    async fn load(&self, sheet: &Sheet) -> Result<CsvSheet, StoreError> {
        let path = self.path(sheet);
        let content = match tokio::fs::read(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::MissingSheet(sheet.title.clone()));
            }
            Err(source) => {
                return Err(StoreError::Io {
                    sheet: sheet.title.clone(),
                    source,
                });
            }
        };
        let csv_error = |source| StoreError::Csv {
            sheet: sheet.title.clone(),
            source,
        };
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(&content[..]);
        let headers = reader
            .headers()
            .map_err(csv_error)?
            .iter()
            .map(String::from)
            .collect();
        let records = reader
            .records()
            .map(|record| record.map(|r| r.iter().map(String::from).collect::<Vec<_>>()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(csv_error)?;
        trace!(sheet = %sheet.title, path = %path.display(), records = records.len(), "sheet loaded");
        Ok(CsvSheet { headers, records })
    }

    /// Write the whole sheet to a temporary file then move it in place.
    async fn store(&self, sheet: &Sheet, data: &CsvSheet) -> Result<(), StoreError> {
        let csv_error = |source| StoreError::Csv {
            sheet: sheet.title.clone(),
            source,
        };
        let io_error = |source| StoreError::Io {
            sheet: sheet.title.clone(),
            source,
        };
        let width = data.headers.len();
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(&data.headers).map_err(csv_error)?;
        for record in &data.records {
            let mut record = record.clone();
            record.resize(width.max(record.len()), String::new());
            writer.write_record(&record).map_err(csv_error)?;
        }
        let content = writer
            .into_inner()
            .map_err(|e| io_error(e.into_error()))?;
        let path = self.path(sheet);
        let tmp = path.with_extension("csv.tmp");
        tokio::fs::write(&tmp, content).await.map_err(io_error)?;
        tokio::fs::rename(&tmp, &path).await.map_err(io_error)?;
        debug!(sheet = %sheet.title, path = %path.display(), "sheet written");
        Ok(())
    }
}

impl RecordStore for CsvStore {
    async fn ensure_sheet(&mut self, sheet: &Sheet) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| StoreError::Io {
                sheet: sheet.title.clone(),
                source,
            })?;
        let _lock = self.lock(sheet).await?;
        let mut data = match self.load(sheet).await {
            Ok(data) => data,
            Err(StoreError::MissingSheet(_)) => {
                CsvSheet {
                    headers: Vec::new(),
                    records: Vec::new(),
                }
            }
            Err(e) => return Err(e),
        };
        let known = data.headers.len();
        for column in &sheet.columns {
            data.column(column);
        }
        if known == 0 || data.headers.len() != known {
            self.store(sheet, &data).await?;
        }
        Ok(())
    }

    async fn rows(&mut self, sheet: &Sheet) -> Result<Vec<Row>, StoreError> {
        let data = self.load(sheet).await?;
        Ok(data
            .records
            .iter()
            .enumerate()
            .map(|(position, record)| Row::new(position, data.cells(record)))
            .collect())
    }

    async fn add_row(
        &mut self,
        sheet: &Sheet,
        cells: Vec<(String, String)>,
    ) -> Result<(), StoreError> {
        let _lock = self.lock(sheet).await?;
        let mut data = self.load(sheet).await?;
        data.records.push(Vec::new());
        let position = data.records.len() - 1;
        data.write_cells(position, cells.iter().map(|(k, v)| (k, v)));
        self.store(sheet, &data).await
    }

    async fn save_row(&mut self, sheet: &Sheet, row: &Row) -> Result<(), StoreError> {
        if !row.is_modified() {
            return Ok(());
        }
        let _lock = self.lock(sheet).await?;
        let mut data = self.load(sheet).await?;
        let unchanged = data
            .records
            .get(row.position())
            .is_some_and(|record| same_cells(&data.cells(record), row.original()));
        if !unchanged {
            return Err(StoreError::StaleRow(sheet.title.clone()));
        }
        data.write_cells(row.position(), row.cells());
        self.store(sheet, &data).await
    }
}
