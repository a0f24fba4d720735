//! SQL assembly
//!
//! Dialect conventions, the named statement templates and the generator that
//! turns compiled query fragments into parameterized statements.

mod dialect;
mod generator;
mod query;
pub mod statements;

pub use dialect::{PagingStrategy, SqlDialect};
pub use generator::DbQueryGenerator;
pub use query::{SqlParam, SqlQuery};
pub use statements::SqlStatements;
