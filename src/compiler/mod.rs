//! Query compiler
//!
//! Lowers a [`QueryCommand`]'s predicate, sortings and includes into SQL
//! fragments bound to one schema. The compiler knows nothing of the final
//! statement shape; it only decides which member joins are needed, allocating
//! them in discovery order: predicate first, then sortings, then includes.
//!
//! Predicate nodes are lowered by [`PredicateLowering`] plugins looked up in a
//! [`LoweringRegistry`], one plugin per operator family.

mod include;
mod joins;
mod lowering;
mod plugins;
mod sorting;

pub use include::{SqlInclude, lower_includes, merge_includes};
pub use joins::{MAIN_ALIAS, MemberJoin, MemberJoins};
pub use lowering::{LoweringContext, LoweringRegistry, PredicateLowering};
pub use sorting::{SqlSorting, lower_sortings};

use crate::core::Result;
use crate::query::{Expr, QueryCommand};
use crate::schema::SchemaModel;
use crate::sql::{SqlDialect, SqlParam};

/// Lowered predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlWhere {
    pub criteria: String,
    pub params: Vec<SqlParam>,
    /// Distinct member paths the predicate references, in first-seen order
    pub member_paths: Vec<String>,
}

/// All fragments of one command plus the joins they need.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    pub where_clause: Option<SqlWhere>,
    pub sortings: Vec<SqlSorting>,
    pub includes: Vec<SqlInclude>,
    pub joins: MemberJoins,
}

impl CompiledQuery {
    pub fn params(&self) -> &[SqlParam] {
        self.where_clause
            .as_ref()
            .map(|w| w.params.as_slice())
            .unwrap_or_default()
    }
}

pub struct QueryCompiler {
    dialect: SqlDialect,
    registry: LoweringRegistry,
}

impl QueryCompiler {
    pub fn new(dialect: SqlDialect) -> Self {
        Self::with_registry(dialect, LoweringRegistry::with_default_lowerings())
    }

    pub fn with_registry(dialect: SqlDialect, registry: LoweringRegistry) -> Self {
        Self { dialect, registry }
    }

    pub fn dialect(&self) -> SqlDialect {
        self.dialect
    }

    pub fn compile(&self, command: &QueryCommand) -> Result<CompiledQuery> {
        let schema = command.schema();
        let mut joins = MemberJoins::new();

        let where_clause = match command.predicate() {
            Some(predicate) => Some(self.compile_where(schema, predicate, &mut joins)?),
            None => None,
        };
        let sortings = lower_sortings(schema, self.dialect, command.sortings(), &mut joins)?;
        let includes = lower_includes(schema, command.includes(), &mut joins)?;

        Ok(CompiledQuery {
            where_clause,
            sortings,
            includes,
            joins,
        })
    }

    pub fn compile_where(
        &self,
        schema: &SchemaModel,
        predicate: &Expr,
        joins: &mut MemberJoins,
    ) -> Result<SqlWhere> {
        let mut context = LoweringContext::new(schema, self.dialect, &self.registry, joins);
        let criteria = context.lower(predicate)?;

        Ok(SqlWhere {
            criteria,
            params: context.into_params(),
            member_paths: predicate
                .member_paths()
                .into_iter()
                .map(str::to_string)
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use crate::core::{DataType, DbError, IdType, Value};
    use crate::query::{IncludeSpec, SortDirection};
    use crate::schema::IndexMember;

    fn member(path: &str, data_type: DataType) -> IndexMember {
        IndexMember {
            member_path: path.to_string(),
            column_name: path.to_string(),
            data_type,
            is_unique: false,
        }
    }

    fn person() -> Arc<SchemaModel> {
        Arc::new(SchemaModel::new(
            "Person".into(),
            "h1".into(),
            "Id".into(),
            IdType::Identity,
            vec![
                member("Name", DataType::Text),
                member("Age", DataType::Integer),
                member("IsActive", DataType::Boolean),
                member("CompanyId", DataType::Integer),
                member("Address.City", DataType::Text),
            ],
            None,
        ))
    }

    fn company() -> Arc<SchemaModel> {
        Arc::new(SchemaModel::new(
            "Company".into(),
            "h2".into(),
            "Id".into(),
            IdType::Identity,
            vec![member("Name", DataType::Text)],
            None,
        ))
    }

    fn compile(command: QueryCommand) -> Result<CompiledQuery> {
        QueryCompiler::new(SqlDialect::Sql2008).compile(&command)
    }

    #[test]
    fn lowers_comparisons_with_bound_parameters() {
        let command = QueryCommand::new(person())
            .filter(Expr::member("Age").gt(18).and(Expr::member("Name").eq("Jo")));
        let compiled = compile(command).unwrap();
        let where_clause = compiled.where_clause.unwrap();

        assert_eq!(where_clause.criteria, "(mem0.[Age] > @p0 and mem1.[Name] = @p1)");
        assert_eq!(where_clause.params[0], SqlParam::new("@p0", 18));
        assert_eq!(where_clause.params[1], SqlParam::new("@p1", "Jo"));
        assert_eq!(where_clause.member_paths, vec!["Age", "Name"]);
    }

    #[test]
    fn null_comparisons_become_is_null() {
        let command = QueryCommand::new(person())
            .filter(Expr::member("Name").eq(Value::Null).or(Expr::member("Age").not_eq(Value::Null)));
        let where_clause = compile(command).unwrap().where_clause.unwrap();

        assert_eq!(where_clause.criteria, "(mem0.[Name] is null or mem1.[Age] is not null)");
        assert!(where_clause.params.is_empty());
    }

    #[test]
    fn identity_member_uses_main_row_without_join() {
        let command = QueryCommand::new(person())
            .filter(Expr::member("Id").in_list([1i64, 2, 3]))
            .order_by_desc("Id");
        let compiled = compile(command).unwrap();

        assert_eq!(
            compiled.where_clause.unwrap().criteria,
            "s.[StructureId] in (@p0, @p1, @p2)"
        );
        assert_eq!(compiled.sortings[0].order_expression(), "s.[StructureId] desc");
        assert!(compiled.joins.is_empty());
    }

    #[test]
    fn joins_are_shared_between_predicate_and_sortings() {
        let command = QueryCommand::new(person())
            .filter(Expr::member("Age").gt_eq(21))
            .order_by("Name")
            .order_by("Age");
        let compiled = compile(command).unwrap();

        let aliases: Vec<(&str, &str)> = compiled
            .joins
            .iter()
            .map(|j| (j.member_path.as_str(), j.alias.as_str()))
            .collect();
        assert_eq!(aliases, vec![("Age", "mem0"), ("Name", "mem1")]);
        assert_eq!(compiled.sortings[0].order_expression(), "min(mem1.[Name]) asc");
        assert_eq!(compiled.sortings[1].direction, SortDirection::Asc);
    }

    #[test]
    fn bare_boolean_member_is_a_condition() {
        let command = QueryCommand::new(person()).filter(Expr::member("IsActive").negate());
        let where_clause = compile(command).unwrap().where_clause.unwrap();

        assert_eq!(where_clause.criteria, "not (mem0.[IsActive] = @p0)");
        assert_eq!(where_clause.params[0].value, Value::Boolean(true));
    }

    #[test]
    fn non_boolean_member_is_not_a_condition() {
        let command = QueryCommand::new(person()).filter(Expr::member("Age"));
        assert!(matches!(compile(command), Err(DbError::TypeMismatch(_))));
    }

    #[test]
    fn unknown_members_are_rejected() {
        let command = QueryCommand::new(person()).filter(Expr::member("Shoe").eq(42));
        let err = compile(command).unwrap_err();
        assert!(matches!(err, DbError::MemberNotFound(path, schema) if path == "Shoe" && schema == "Person"));

        let command = QueryCommand::new(person()).order_by("Shoe");
        assert!(matches!(compile(command), Err(DbError::MemberNotFound(..))));
    }

    #[test]
    fn constants_are_coerced_to_member_type() {
        let command = QueryCommand::new(person()).filter(Expr::member("Age").lt(30.0));
        let where_clause = compile(command).unwrap().where_clause.unwrap();
        assert!(matches!(where_clause.params[0].value, Value::Integer(30)));

        let command = QueryCommand::new(person()).filter(Expr::member("Age").eq("thirty"));
        assert!(matches!(compile(command), Err(DbError::TypeMismatch(_))));
    }

    #[test]
    fn like_and_nested_paths() {
        let command =
            QueryCommand::new(person()).filter(Expr::member("Address.City").starts_with("Sto"));
        let where_clause = compile(command).unwrap().where_clause.unwrap();

        assert_eq!(where_clause.criteria, "mem0.[Address.City] like @p0");
        assert_eq!(where_clause.params[0].value, Value::Text("Sto%".into()));
    }

    #[test]
    fn empty_in_list_matches_nothing() {
        let command = QueryCommand::new(person()).filter(Expr::member("Age").in_list(Vec::<i64>::new()));
        assert_eq!(compile(command).unwrap().where_clause.unwrap().criteria, "1 = 0");
    }

    #[test]
    fn includes_merge_by_id_reference_and_join_after_sortings() {
        let command = QueryCommand::new(person())
            .order_by("Name")
            .include(IncludeSpec::new("CompanyId", "Company", company()))
            .include(IncludeSpec::new("CompanyId", "Employer", company()));
        let compiled = compile(command).unwrap();

        assert_eq!(compiled.includes.len(), 1);
        let include = &compiled.includes[0];
        assert_eq!(include.member_alias, "mem1");
        assert_eq!(
            include.select_expression(SqlDialect::Sql2008),
            "min(cs0.[Json]) as [Company]"
        );
        assert_eq!(
            include.join(SqlDialect::Sql2008),
            "left join [Company_structure] cs0 on cs0.[StructureId] = mem1.[CompanyId]"
        );
    }

    #[test]
    fn include_targets_may_not_shadow_listing_columns() {
        for target in ["json", "JSON", "structureid", "RowNum", "rownum"] {
            let command = QueryCommand::new(person())
                .page(0, 10)
                .include(IncludeSpec::new("CompanyId", target, company()));
            assert!(
                matches!(compile(command), Err(DbError::ContractViolation(_))),
                "target {target} accepted"
            );
        }
    }

    #[test]
    fn include_targets_are_unique_ignoring_case() {
        let staff = Arc::new(SchemaModel::new(
            "Staff".into(),
            "h3".into(),
            "Id".into(),
            IdType::Identity,
            vec![member("CompanyId", DataType::Integer), member("EmployerId", DataType::Integer)],
            None,
        ));
        let command = QueryCommand::new(staff)
            .include(IncludeSpec::new("CompanyId", "Company", company()))
            .include(IncludeSpec::new("EmployerId", "company", company()));
        assert!(matches!(compile(command), Err(DbError::ContractViolation(_))));
    }

    #[test]
    fn include_reference_must_match_child_identity_type() {
        let command =
            QueryCommand::new(person()).include(IncludeSpec::new("Name", "Company", company()));
        assert!(matches!(compile(command), Err(DbError::TypeMismatch(_))));
    }
}
