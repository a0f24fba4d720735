use log::warn;
use crate::core::{DbError, Result};
use crate::query::IncludeSpec;
use crate::schema::{
    JSON_COLUMN, STRUCTURE_ID_COLUMN, SchemaModel, is_reserved_output, is_valid_member_path,
};
use crate::sql::SqlDialect;
use super::joins::MemberJoins;

/// One lowered include: a joined child structure row and its output column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlInclude {
    pub id_reference_path: String,
    pub object_reference_path: String,
    /// Alias of the member join holding the referenced identity
    pub member_alias: String,
    /// Alias of the joined child structure table, `csN`
    pub alias: String,
    pub child_table: String,
}

impl SqlInclude {
    pub fn select_expression(&self, dialect: SqlDialect) -> String {
        format!(
            "min({}) as {}",
            dialect.column(&self.alias, JSON_COLUMN),
            dialect.quote(&self.object_reference_path)
        )
    }

    pub fn join(&self, dialect: SqlDialect) -> String {
        format!(
            "left join {} {} on {} = {}",
            dialect.quote(&self.child_table),
            self.alias,
            dialect.column(&self.alias, STRUCTURE_ID_COLUMN),
            dialect.column(&self.member_alias, &self.id_reference_path)
        )
    }

    /// Output column carrying the child body, merged under this name.
    pub fn output_column(&self) -> &str {
        &self.object_reference_path
    }
}

/// Specs sharing an id reference path collapse into the first one.
pub fn merge_includes(schema: &SchemaModel, includes: &[IncludeSpec]) -> Vec<IncludeSpec> {
    let mut merged: Vec<IncludeSpec> = Vec::with_capacity(includes.len());
    for include in includes {
        match merged
            .iter()
            .find(|m| m.id_reference_path == include.id_reference_path)
        {
            Some(existing) => warn!(
                "Include of '{}' via '{}' merged into '{}' on '{}'",
                include.object_reference_path,
                include.id_reference_path,
                existing.object_reference_path,
                schema.name()
            ),
            None => merged.push(include.clone()),
        }
    }
    merged
}

pub fn lower_includes(
    schema: &SchemaModel,
    includes: &[IncludeSpec],
    joins: &mut MemberJoins,
) -> Result<Vec<SqlInclude>> {
    let merged = merge_includes(schema, includes);
    let mut lowered: Vec<SqlInclude> = Vec::with_capacity(merged.len());

    for (index, include) in merged.iter().enumerate() {
        let member = schema.find_member(&include.id_reference_path).ok_or_else(|| {
            DbError::MemberNotFound(include.id_reference_path.clone(), schema.name().to_string())
        })?;

        let child_id_type = include.child.id_type().data_type();
        if member.data_type != child_id_type {
            return Err(DbError::TypeMismatch(format!(
                "member '{}' of '{}' is {} but '{}' identities are {}",
                member.member_path,
                schema.name(),
                member.data_type,
                include.child.name(),
                child_id_type
            )));
        }

        let output = &include.object_reference_path;
        if !is_valid_member_path(output) || is_reserved_output(output) {
            return Err(DbError::ContractViolation(format!(
                "'{}' is not a valid include target on '{}'",
                output,
                schema.name()
            )));
        }
        if lowered
            .iter()
            .any(|l| l.object_reference_path.eq_ignore_ascii_case(output))
        {
            return Err(DbError::ContractViolation(format!(
                "include target '{}' is used twice on '{}'",
                output,
                schema.name()
            )));
        }

        let member_alias = joins.alias_for(&member.member_path).to_string();
        lowered.push(SqlInclude {
            id_reference_path: member.column_name.clone(),
            object_reference_path: output.clone(),
            member_alias,
            alias: format!("cs{}", index),
            child_table: include.child.structure_table_name(),
        });
    }

    Ok(lowered)
}
