pub use self::csv_store::CsvStore;
pub use self::memory_store::MemoryStore;
pub use self::record::{RecordStore, Row, Sheet, StoreError};
pub use self::sql_store::SqlStore;

mod csv_store;
mod memory_store;
mod record;
mod sql_store;
