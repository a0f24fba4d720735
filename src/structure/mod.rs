mod builder;
mod id_generator;
mod structure;

pub use builder::{BuildStrategy, StructureBuilder};
pub use id_generator::{IdentitySource, SequentialIdentitySource, StructureIdGenerator};
pub use structure::{Structure, StructureIndex};
