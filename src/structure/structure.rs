use crate::core::{DataType, StructureId, Value};

/// One extracted member value of a structure.
#[derive(Debug, Clone, PartialEq)]
pub struct StructureIndex {
    pub member_path: String,
    pub value: Value,
    pub data_type: DataType,
    pub is_unique: bool,
}

/// Storage-ready record of one document.
#[derive(Debug, Clone, PartialEq)]
pub struct Structure {
    pub schema_name: String,
    pub id: StructureId,
    pub indexes: Vec<StructureIndex>,
    pub json: String,
}

impl Structure {
    pub fn uniques(&self) -> impl Iterator<Item = &StructureIndex> {
        self.indexes.iter().filter(|index| index.is_unique)
    }

    pub fn index_value(&self, member_path: &str) -> Option<&Value> {
        self.indexes
            .iter()
            .find(|index| index.member_path == member_path)
            .map(|index| &index.value)
    }
}
