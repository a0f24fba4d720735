//! Structural schema model
//!
//! Maps a document type's shape to the three-table storage layout:
//!
//! - `shape.rs` - `Document`/`Members` descriptions and the shape builder
//! - `accessors.rs` - per-member get/set capabilities
//! - `values.rs` - member value contracts (index, identity, timestamp)
//! - `model.rs` - type-erased `SchemaModel` used by the SQL layers
//! - `structure_schema.rs` - validated typed schema and its hash
//! - `registry.rs` - process-lifetime schema cache

mod accessors;
mod model;
mod registry;
mod shape;
mod structure_schema;
mod values;

pub use accessors::{IdAccessor, IndexAccessor, TimeStampAccessor};
pub use model::{
    IndexMember, JSON_COLUMN, ROW_NUMBER_COLUMN, STRUCTURE_ID_COLUMN, SchemaModel, TableRole,
    is_reserved_output, is_valid_member_path,
};
pub use registry::StructureSchemas;
pub use shape::{Document, MemberSet, Members, Shape};
pub use structure_schema::StructureSchema;
pub use values::{IdValue, IndexValue, TimeStampValue};
