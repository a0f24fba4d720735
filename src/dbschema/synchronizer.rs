use std::collections::HashSet;
use std::sync::Arc;
use log::info;
use crate::core::Result;
use crate::dac::StatementExecutor;
use crate::schema::{IndexMember, STRUCTURE_ID_COLUMN, SchemaModel, TableRole};
use crate::sql::{SqlParam, SqlStatements};
use super::ddl;

/// Brings an existing member table's columns up to the schema's members.
///
/// Additive only: missing columns are added, extra columns stay untouched and
/// existing columns are never altered.
pub struct ColumnSynchronizer {
    statements: Arc<SqlStatements>,
}

impl ColumnSynchronizer {
    pub fn new(statements: Arc<SqlStatements>) -> Self {
        Self { statements }
    }

    /// Add the columns `role`'s table is missing; returns how many were added.
    pub fn synchronize(
        &self,
        executor: &mut dyn StatementExecutor,
        model: &SchemaModel,
        role: TableRole,
    ) -> Result<usize> {
        let table = model.table_name(role);
        let existing: HashSet<String> = executor
            .list_columns(&table)?
            .into_iter()
            .map(|column| column.name.to_ascii_lowercase())
            .collect();

        let members: Vec<&IndexMember> = match role {
            TableRole::Structure => Vec::new(),
            TableRole::Indexes => model.members().iter().collect(),
            TableRole::Uniques => model.unique_members().collect(),
        };
        let missing: Vec<&IndexMember> = members
            .into_iter()
            .filter(|member| !existing.contains(&member.column_name.to_ascii_lowercase()))
            .filter(|member| !member.column_name.eq_ignore_ascii_case(STRUCTURE_ID_COLUMN))
            .collect();

        if missing.is_empty() {
            return Ok(0);
        }

        let mut batch = Vec::new();
        for member in &missing {
            batch.extend(ddl::add_column(&self.statements, &table, role, member)?);
        }
        executor.execute(&batch.join("\n"), &entity_tags(&self.statements, model))?;

        let names: Vec<&str> = missing.iter().map(|m| m.column_name.as_str()).collect();
        info!(
            "Added column(s) {} to '{}' (schema '{}', hash {})",
            names.join(", "),
            table,
            model.name(),
            model.hash()
        );
        Ok(missing.len())
    }
}

/// Parameters tagging DDL batches with the schema they belong to.
pub fn entity_tags(statements: &SqlStatements, model: &SchemaModel) -> Vec<SqlParam> {
    let dialect = statements.dialect();
    vec![
        SqlParam::new(dialect.param_name("entityHash"), model.hash()),
        SqlParam::new(dialect.param_name("entityName"), model.name()),
    ]
}
