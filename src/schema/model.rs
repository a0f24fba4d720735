use std::fmt;
use lazy_static::lazy_static;
use regex::Regex;
use crate::core::{DataType, IdType};

/// Identity column shared by all three tables of a structure set.
pub const STRUCTURE_ID_COLUMN: &str = "StructureId";
/// Document body column of the structure table.
pub const JSON_COLUMN: &str = "Json";
/// Ordinal column projected by both paging shapes.
pub const ROW_NUMBER_COLUMN: &str = "RowNum";

lazy_static! {
    static ref MEMBER_PATH: Regex =
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*$").unwrap();
    static ref SCHEMA_NAME: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap();
}

/// Dotted identifier path; these are the only strings ever embedded in SQL text.
pub fn is_valid_member_path(path: &str) -> bool {
    MEMBER_PATH.is_match(path)
}

pub fn is_valid_schema_name(name: &str) -> bool {
    SCHEMA_NAME.is_match(name)
}

pub fn is_reserved_column(name: &str) -> bool {
    name.eq_ignore_ascii_case(STRUCTURE_ID_COLUMN) || name.eq_ignore_ascii_case(JSON_COLUMN)
}

/// Names a listing already projects; include outputs may not reuse them.
pub fn is_reserved_output(name: &str) -> bool {
    is_reserved_column(name) || name.eq_ignore_ascii_case(ROW_NUMBER_COLUMN)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableRole {
    Structure,
    Indexes,
    Uniques,
}

impl TableRole {
    pub fn suffix(&self) -> &'static str {
        match self {
            Self::Structure => "structure",
            Self::Indexes => "indexes",
            Self::Uniques => "uniques",
        }
    }
}

impl fmt::Display for TableRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.suffix())
    }
}

/// Storage view of one index accessor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexMember {
    pub member_path: String,
    pub column_name: String,
    pub data_type: DataType,
    pub is_unique: bool,
}

/// Type-erased schema consumed by the SQL layers.
///
/// Holds everything needed to name tables and columns and to resolve member
/// paths, but none of the typed accessors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaModel {
    name: String,
    hash: String,
    id_member_path: String,
    id_type: IdType,
    members: Vec<IndexMember>,
    timestamp_member_path: Option<String>,
}

impl SchemaModel {
    pub(crate) fn new(
        name: String,
        hash: String,
        id_member_path: String,
        id_type: IdType,
        members: Vec<IndexMember>,
        timestamp_member_path: Option<String>,
    ) -> Self {
        Self {
            name,
            hash,
            id_member_path,
            id_type,
            members,
            timestamp_member_path,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub fn id_member_path(&self) -> &str {
        &self.id_member_path
    }

    pub fn id_type(&self) -> IdType {
        self.id_type
    }

    pub fn members(&self) -> &[IndexMember] {
        &self.members
    }

    pub fn unique_members(&self) -> impl Iterator<Item = &IndexMember> {
        self.members.iter().filter(|m| m.is_unique)
    }

    pub fn has_uniques(&self) -> bool {
        self.members.iter().any(|m| m.is_unique)
    }

    pub fn timestamp_member_path(&self) -> Option<&str> {
        self.timestamp_member_path.as_deref()
    }

    pub fn table_name(&self, role: TableRole) -> String {
        format!("{}_{}", self.name, role.suffix())
    }

    pub fn structure_table_name(&self) -> String {
        self.table_name(TableRole::Structure)
    }

    pub fn indexes_table_name(&self) -> String {
        self.table_name(TableRole::Indexes)
    }

    pub fn uniques_table_name(&self) -> String {
        self.table_name(TableRole::Uniques)
    }

    pub fn find_member(&self, member_path: &str) -> Option<&IndexMember> {
        self.members.iter().find(|m| m.member_path == member_path)
    }

    /// The identity member lives on the structure row itself, addressable by its
    /// own path or by the reserved `StructureId` name.
    pub fn is_id_member(&self, member_path: &str) -> bool {
        member_path == self.id_member_path || member_path == STRUCTURE_ID_COLUMN
    }
}
