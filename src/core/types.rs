use std::fmt;
use uuid::Uuid;
use super::{DataType, Value};

/// Kind of identity a document type uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdType {
    /// Sequential integer reserved from the identity source.
    Identity,
    /// Globally unique identifier.
    Guid,
    /// Caller-assigned string.
    String,
}

impl IdType {
    /// Data type an index member must have to reference a structure of this id type.
    pub fn data_type(&self) -> DataType {
        match self {
            Self::Identity => DataType::Integer,
            Self::Guid => DataType::Uuid,
            Self::String => DataType::Text,
        }
    }

    pub fn empty_id(&self) -> StructureId {
        match self {
            Self::Identity => StructureId::Identity(0),
            Self::Guid => StructureId::Guid(Uuid::nil()),
            Self::String => StructureId::String(String::new()),
        }
    }
}

impl fmt::Display for IdType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identity => write!(f, "IDENTITY"),
            Self::Guid => write!(f, "GUID"),
            Self::String => write!(f, "STRING"),
        }
    }
}

/// Identity value of one stored document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StructureId {
    Identity(i64),
    Guid(Uuid),
    String(String),
}

impl StructureId {
    pub fn id_type(&self) -> IdType {
        match self {
            Self::Identity(_) => IdType::Identity,
            Self::Guid(_) => IdType::Guid,
            Self::String(_) => IdType::String,
        }
    }

    /// Zero, the nil uuid and the empty string all mean "not assigned yet".
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Identity(i) => *i == 0,
            Self::Guid(g) => g.is_nil(),
            Self::String(s) => s.is_empty(),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Self::Identity(i) => Value::Integer(*i),
            Self::Guid(g) => Value::Uuid(*g),
            Self::String(s) => Value::Text(s.clone()),
        }
    }
}

impl fmt::Display for StructureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identity(i) => write!(f, "{}", i),
            Self::Guid(g) => write!(f, "{}", g),
            Self::String(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for StructureId {
    fn from(id: i64) -> Self {
        Self::Identity(id)
    }
}

impl From<Uuid> for StructureId {
    fn from(id: Uuid) -> Self {
        Self::Guid(id)
    }
}

impl From<&str> for StructureId {
    fn from(id: &str) -> Self {
        Self::String(id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_ids() {
        for id_type in [IdType::Identity, IdType::Guid, IdType::String] {
            assert!(id_type.empty_id().is_empty());
            assert_eq!(id_type.empty_id().id_type(), id_type);
        }
        assert!(!StructureId::Identity(7).is_empty());
    }

    #[test]
    fn test_id_value_matches_reference_data_type() {
        let id = StructureId::Guid(Uuid::new_v4());
        assert!(id.id_type().data_type().is_compatible(&id.to_value()));
    }
}
