//! Named SQL templates
//!
//! Every fixed statement shape the engine issues lives here, keyed by name and
//! built once per dialect. Templates take positional `{0}`, `{1}`... holes that
//! are only ever filled with quoted identifiers, type names or generated
//! fragments; caller values always travel as parameters.

use std::collections::HashMap;
use crate::core::{DbError, Result};
use super::dialect::SqlDialect;

pub const CREATE_STRUCTURE_TABLE: &str = "CreateStructureTable";
pub const CREATE_INDEXES_TABLE: &str = "CreateIndexesTable";
pub const CREATE_UNIQUES_TABLE: &str = "CreateUniquesTable";
pub const CREATE_UNIQUE_INDEX: &str = "CreateUniqueIndex";
pub const ADD_COLUMN: &str = "AddColumn";
pub const DROP_TABLE: &str = "DropTable";
pub const INSERT_STRUCTURE: &str = "InsertStructure";
pub const INSERT_ROW: &str = "InsertRow";
pub const UPDATE_JSON: &str = "UpdateJson";
pub const DELETE_BY_ID: &str = "DeleteById";
pub const DELETE_BY_IDS: &str = "DeleteByIds";
pub const DELETE_BY_ID_RANGE: &str = "DeleteByIdRange";
pub const DECLARE_ID_TABLE: &str = "DeclareIdTable";
pub const FILL_ID_TABLE: &str = "FillIdTable";
pub const DELETE_IN_ID_TABLE: &str = "DeleteInIdTable";
pub const GET_BY_ID: &str = "GetById";
pub const GET_BY_IDS: &str = "GetByIds";
pub const GET_BY_ID_RANGE: &str = "GetByIdRange";
pub const COUNT_ALL: &str = "CountAll";
pub const COUNT_WHERE: &str = "CountWhere";
pub const PAGED_QUERY_CTE: &str = "PagedQueryCte";
pub const PAGED_QUERY_ROW_NUMBER: &str = "PagedQueryRowNumber";

/// Immutable template map for one dialect.
#[derive(Debug, Clone)]
pub struct SqlStatements {
    dialect: SqlDialect,
    templates: HashMap<&'static str, String>,
}

impl SqlStatements {
    pub fn for_dialect(dialect: SqlDialect) -> Self {
        let mut templates: HashMap<&'static str, String> = HashMap::new();
        let mut add = |name: &'static str, template: &str| {
            templates.insert(name, template.to_string());
        };

        add(
            CREATE_STRUCTURE_TABLE,
            "create table {0} ([StructureId] {1} not null primary key, [Json] {2} not null);",
        );
        add(
            CREATE_INDEXES_TABLE,
            "create table {0} ([StructureId] {1} not null primary key{2});",
        );
        add(
            CREATE_UNIQUES_TABLE,
            "create table {0} ([StructureId] {1} not null primary key{2});",
        );
        add(ADD_COLUMN, "alter table {0} add {1} {2} null;");
        add(DROP_TABLE, "if object_id('{0}', 'U') is not null drop table {1};");
        add(INSERT_STRUCTURE, "insert into {0} ([StructureId], [Json]) values (@id, @json);");
        add(INSERT_ROW, "insert into {0} ([StructureId]{1}) values (@id{2});");
        add(UPDATE_JSON, "update {0} set [Json] = @json where [StructureId] = @id;");
        add(DELETE_BY_ID, "delete from {0} where [StructureId] = @id;");
        add(DELETE_BY_IDS, "delete from {0} where [StructureId] in ({1});");
        add(DELETE_BY_ID_RANGE, "delete from {0} where [StructureId] between @idFrom and @idTo;");
        add(DECLARE_ID_TABLE, "declare @ids table ([StructureId] {0} not null primary key);");
        add(FILL_ID_TABLE, "insert into @ids ([StructureId]) {0};");
        add(
            DELETE_IN_ID_TABLE,
            "delete from {0} where [StructureId] in (select [StructureId] from @ids);",
        );
        add(GET_BY_ID, "select [Json] from {0} where [StructureId] = @id;");
        add(GET_BY_IDS, "select [Json] from {0} where [StructureId] in ({1});");
        add(
            GET_BY_ID_RANGE,
            "select [Json] from {0} where [StructureId] between @idFrom and @idTo order by [StructureId];",
        );
        add(COUNT_ALL, "select count(*) from {0};");
        add(COUNT_WHERE, "select count(*) from ({0}) ids;");
        add(
            PAGED_QUERY_CTE,
            "with pagedRs as ({0}) select {1} from pagedRs where pagedRs.RowNum between @pagingFrom and @pagingTo order by pagedRs.RowNum;",
        );
        add(
            PAGED_QUERY_ROW_NUMBER,
            "select {1} from ({0}) rs where rs.RowNum between @pagingFrom and @pagingTo order by rs.RowNum;",
        );

        match dialect {
            // Filtered indexes let several documents leave a unique member unset.
            SqlDialect::Sql2008 => add(
                CREATE_UNIQUE_INDEX,
                "create unique nonclustered index {0} on {1} ({2}) where {2} is not null;",
            ),
            SqlDialect::Sql2005 => add(
                CREATE_UNIQUE_INDEX,
                "create unique nonclustered index {0} on {1} ({2});",
            ),
        }

        Self { dialect, templates }
    }

    pub fn dialect(&self) -> SqlDialect {
        self.dialect
    }

    pub fn get(&self, name: &str) -> Result<&str> {
        self.templates
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| DbError::ContractViolation(format!("no SQL template named '{}'", name)))
    }

    /// Fill the named template's `{n}` holes with `args`.
    pub fn inject(&self, name: &str, args: &[&str]) -> Result<String> {
        let template = self.get(name)?;
        fill(template, args).ok_or_else(|| {
            DbError::ContractViolation(format!(
                "SQL template '{}' expects more than {} argument(s)",
                name,
                args.len()
            ))
        })
    }
}

/// Single pass so substituted text is never rescanned for holes.
fn fill(template: &str, args: &[&str]) -> Option<String> {
    let mut out = String::with_capacity(template.len() + args.iter().map(|a| a.len()).sum::<usize>());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let digits = after.chars().take_while(|c| c.is_ascii_digit()).count();

        if digits > 0 && after[digits..].starts_with('}') {
            let index: usize = after[..digits].parse().ok()?;
            out.push_str(args.get(index)?);
            rest = &after[digits + 1..];
        } else {
            out.push('{');
            rest = after;
        }
    }
    out.push_str(rest);
    Some(out)
}
