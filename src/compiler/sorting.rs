use crate::core::{DbError, Result};
use crate::query::{SortDirection, Sorting};
use crate::schema::{STRUCTURE_ID_COLUMN, SchemaModel};
use crate::sql::SqlDialect;
use super::joins::{MAIN_ALIAS, MemberJoins};

/// One lowered sort key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlSorting {
    pub member_path: String,
    /// Column reference, `memN.[path]` or the main row's identity column
    pub column: String,
    pub direction: SortDirection,
    pub is_id: bool,
}

impl SqlSorting {
    /// Grouped rows fan out per join, so member keys order by their `min`.
    pub fn order_expression(&self) -> String {
        if self.is_id {
            format!("{} {}", self.column, self.direction)
        } else {
            format!("min({}) {}", self.column, self.direction)
        }
    }
}

pub fn lower_sortings(
    schema: &SchemaModel,
    dialect: SqlDialect,
    sortings: &[Sorting],
    joins: &mut MemberJoins,
) -> Result<Vec<SqlSorting>> {
    sortings
        .iter()
        .map(|sorting| {
            if schema.is_id_member(&sorting.member_path) {
                return Ok(SqlSorting {
                    member_path: sorting.member_path.clone(),
                    column: dialect.column(MAIN_ALIAS, STRUCTURE_ID_COLUMN),
                    direction: sorting.direction,
                    is_id: true,
                });
            }

            let member = schema.find_member(&sorting.member_path).ok_or_else(|| {
                DbError::MemberNotFound(sorting.member_path.clone(), schema.name().to_string())
            })?;
            let alias = joins.alias_for(&member.member_path);

            Ok(SqlSorting {
                member_path: member.member_path.clone(),
                column: dialect.column(alias, &member.column_name),
                direction: sorting.direction,
                is_id: false,
            })
        })
        .collect()
}
