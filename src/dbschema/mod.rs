//! Schema synchronization
//!
//! Keeps the physical structure set (`<name>_structure`, `<name>_indexes`,
//! `<name>_uniques`) a superset of a schema before anything reads or writes
//! it. Synchronization is additive only: members removed from a type leave
//! their columns behind.

pub mod ddl;
mod manager;
mod synchronizer;
mod upserter;

pub use ddl::CreateTableBuilder;
pub use manager::DbSchemaManager;
pub use synchronizer::{ColumnSynchronizer, entity_tags};
pub use upserter::DbSchemaUpserter;
