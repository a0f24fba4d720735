// ============================================================================
// structdb Library
// ============================================================================

extern crate self as structdb;

pub mod core;
pub mod schema;
pub mod codec;
pub mod structure;
pub mod query;
pub mod compiler;
pub mod sql;
pub mod dbschema;
pub mod dac;
pub mod result;
pub mod facade;
pub mod prelude;

// Re-export main types for convenience
pub use core::{DataType, DbError, IdType, Result, StructureId, Value};
pub use facade::{DocumentSession, DocumentStore, StoreConfig};
pub use query::{Expr, QueryCommand};
pub use schema::{Document, Members};
pub use sql::{SqlDialect, SqlQuery};

// Derive macros share the trait names, like serde's
pub use structdb_derive::{Document, Members};
