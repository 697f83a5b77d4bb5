//! Importer backends.

pub mod finviz;
pub mod memory;
pub mod wire;

pub use finviz::FinvizImporter;
pub use memory::StaticImporter;
