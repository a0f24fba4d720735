use std::fmt;
use crate::core::{DataType, IdType};

/// How a paged listing selects its row-number window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagingStrategy {
    /// `with pagedRs as (...)` common table expression filtered on the window
    WindowedCte,
    /// Derived table carrying the row number, for engines without CTE paging
    RowNumberSubquery,
}

/// Target SQL dialect of generated statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SqlDialect {
    #[default]
    Sql2008,
    Sql2005,
}

impl SqlDialect {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sql2008 => "Sql2008",
            Self::Sql2005 => "Sql2005",
        }
    }

    pub fn paging_strategy(&self) -> PagingStrategy {
        match self {
            Self::Sql2008 => PagingStrategy::WindowedCte,
            Self::Sql2005 => PagingStrategy::RowNumberSubquery,
        }
    }

    pub fn param_prefix(&self) -> char {
        '@'
    }

    pub fn param_name(&self, name: &str) -> String {
        format!("{}{}", self.param_prefix(), name)
    }

    /// Delimit an identifier, doubling any closing bracket.
    pub fn quote(&self, ident: &str) -> String {
        format!("[{}]", ident.replace(']', "]]"))
    }

    /// Qualified column reference, `alias.[column]`.
    pub fn column(&self, alias: &str, column: &str) -> String {
        format!("{}.{}", alias, self.quote(column))
    }

    pub fn column_type(&self, data_type: DataType) -> &'static str {
        match (self, data_type) {
            (_, DataType::Integer) => "bigint",
            (_, DataType::Float) => "float",
            (_, DataType::Text) => "nvarchar(300)",
            (_, DataType::Boolean) => "bit",
            (Self::Sql2008, DataType::Timestamp) => "datetime2",
            (Self::Sql2005, DataType::Timestamp) => "datetime",
            (_, DataType::Uuid) => "uniqueidentifier",
        }
    }

    pub fn id_column_type(&self, id_type: IdType) -> &'static str {
        match id_type {
            IdType::Identity => "bigint",
            IdType::Guid => "uniqueidentifier",
            IdType::String => "nvarchar(128)",
        }
    }

    pub fn json_column_type(&self) -> &'static str {
        "nvarchar(max)"
    }
}

impl fmt::Display for SqlDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
