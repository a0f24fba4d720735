use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;
use crate::core::{DbError, Result};
use super::accessors::{IdAccessor, IndexAccessor, TimeStampAccessor};
use super::model::{
    IndexMember, SchemaModel, is_reserved_column, is_valid_member_path, is_valid_schema_name,
};
use super::shape::{Document, Shape};

/// Typed schema of a document type: the storage model plus the accessors
/// builders evaluate against items.
pub struct StructureSchema<T> {
    model: Arc<SchemaModel>,
    id_accessor: IdAccessor<T>,
    index_accessors: Vec<IndexAccessor<T>>,
    timestamp_accessor: Option<TimeStampAccessor<T>>,
}

impl<T: Document> StructureSchema<T> {
    /// Derive the schema from `T`'s shape description.
    pub fn derive() -> Result<Self> {
        let mut shape = Shape::<T>::for_type();
        T::describe(&mut shape);
        Self::from_shape(shape)
    }
}

impl<T: 'static> StructureSchema<T> {
    pub fn from_shape(shape: Shape<T>) -> Result<Self> {
        let Shape {
            name,
            mut ids,
            mut timestamps,
            members,
        } = shape;
        let fail = |message: String| DbError::SchemaError(name.clone(), message);

        if !is_valid_schema_name(&name) {
            return Err(fail("name must be an identifier".to_string()));
        }

        let id_accessor = match ids.len() {
            0 => return Err(fail("no identity member declared".to_string())),
            1 => ids.remove(0),
            _ => {
                let paths: Vec<&str> = ids.iter().map(|a| a.path()).collect();
                return Err(fail(format!("ambiguous identity member: {}", paths.join(", "))));
            }
        };
        if !is_valid_member_path(id_accessor.path()) {
            return Err(fail(format!("invalid identity member path '{}'", id_accessor.path())));
        }

        let timestamp_accessor = match timestamps.len() {
            0 => None,
            1 => Some(timestamps.remove(0)),
            _ => {
                let paths: Vec<&str> = timestamps.iter().map(|a| a.path()).collect();
                return Err(fail(format!("ambiguous timestamp member: {}", paths.join(", "))));
            }
        };

        let index_accessors = members.into_accessors();
        let mut seen = HashSet::with_capacity(index_accessors.len());
        for accessor in &index_accessors {
            let path = accessor.path();
            if !is_valid_member_path(path) {
                return Err(fail(format!("invalid member path '{}'", path)));
            }
            if is_reserved_column(path) {
                return Err(fail(format!("member path '{}' collides with a reserved column", path)));
            }
            if path == id_accessor.path() {
                return Err(fail(format!("identity member '{}' cannot also be indexed", path)));
            }
            if !seen.insert(path.to_ascii_lowercase()) {
                return Err(fail(format!("duplicate member path '{}'", path)));
            }
        }

        let members: Vec<IndexMember> = index_accessors
            .iter()
            .map(|accessor| IndexMember {
                member_path: accessor.path().to_string(),
                column_name: accessor.column_name().to_string(),
                data_type: accessor.data_type(),
                is_unique: accessor.is_unique(),
            })
            .collect();

        let timestamp_path = timestamp_accessor.as_ref().map(|a| a.path().to_string());
        let hash = shape_hash(&name, &id_accessor, &members, timestamp_path.as_deref());
        let model = SchemaModel::new(
            name,
            hash,
            id_accessor.path().to_string(),
            id_accessor.id_type(),
            members,
            timestamp_path,
        );

        Ok(Self {
            model: Arc::new(model),
            id_accessor,
            index_accessors,
            timestamp_accessor,
        })
    }
}

impl<T> StructureSchema<T> {
    pub fn name(&self) -> &str {
        self.model.name()
    }

    pub fn hash(&self) -> &str {
        self.model.hash()
    }

    pub fn model(&self) -> &Arc<SchemaModel> {
        &self.model
    }

    pub fn id_accessor(&self) -> &IdAccessor<T> {
        &self.id_accessor
    }

    pub fn index_accessors(&self) -> &[IndexAccessor<T>] {
        &self.index_accessors
    }

    pub fn unique_accessors(&self) -> impl Iterator<Item = &IndexAccessor<T>> {
        self.index_accessors.iter().filter(|a| a.is_unique())
    }

    pub fn timestamp_accessor(&self) -> Option<&TimeStampAccessor<T>> {
        self.timestamp_accessor.as_ref()
    }

    pub fn has_timestamp(&self) -> bool {
        self.timestamp_accessor.is_some()
    }
}

/// Name-based UUID over the canonical shape signature, as 32 hex chars.
fn shape_hash<T>(
    name: &str,
    id_accessor: &IdAccessor<T>,
    members: &[IndexMember],
    timestamp_path: Option<&str>,
) -> String {
    let mut signature = format!("{}|{}:{}|", name, id_accessor.path(), id_accessor.id_type());
    for member in members {
        signature.push_str(&member.member_path);
        signature.push(':');
        signature.push_str(&member.data_type.to_string());
        if member.is_unique {
            signature.push_str(":unique");
        }
        signature.push(',');
    }
    signature.push('|');
    signature.push_str(timestamp_path.unwrap_or_default());

    Uuid::new_v5(&Uuid::NAMESPACE_OID, signature.as_bytes())
        .simple()
        .to_string()
}
