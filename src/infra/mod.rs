//! Infrastructure adapters for the news feed and headline storage.

pub mod importer;
pub mod storage;

pub use importer::{FinvizImporter, StaticImporter};
pub use storage::{InMemoryStore, SqliteStore};
