//! Caller-level query model: predicate trees and query commands.

mod command;
mod expr;

pub use command::{IncludeSpec, Paging, QueryCommand, SortDirection, Sorting};
pub use expr::{BinaryOp, Expr};
