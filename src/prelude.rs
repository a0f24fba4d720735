//! Everything an application needs to describe, store and query documents.

pub use crate::codec::{DocumentCodec, JsonCodec};
pub use crate::core::{DataType, DbError, IdType, Result, StructureId, Value};
pub use crate::dac::{DataRecord, DbColumn, RecordStream, StatementExecutor};
pub use crate::facade::{DocumentSession, DocumentStore, StoreConfig};
pub use crate::query::{Expr, IncludeSpec, Paging, QueryCommand, SortDirection, Sorting};
pub use crate::schema::{MemberSet, Shape};
pub use crate::sql::{PagingStrategy, SqlDialect, SqlParam, SqlQuery};
pub use crate::structure::{BuildStrategy, IdentitySource, SequentialIdentitySource};
pub use crate::{Document, Members};
