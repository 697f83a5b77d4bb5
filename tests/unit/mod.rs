//! Unit tests for individual components

mod builders_test;
mod error_test;
mod interrupt_test;
mod runtime_test;
mod snapshot_test;
mod storage_test;
