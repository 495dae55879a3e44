//! Input tables of the dashboard: schemas, typed records, CSV loading and the
//! process-wide snapshot cache.

pub mod cache;
pub mod loader;
pub mod records;
pub mod schema;

pub use cache::DatasetCache;
pub use loader::{load_datasets, read_table, Datasets, Table, TableStatus};
pub use records::*;
pub use schema::{columns, TableId, TableSchema};
