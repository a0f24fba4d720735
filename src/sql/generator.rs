//! SQL assembly
//!
//! Combines compiled fragments into one statement against a single schema.
//! Every listing selects from the structure table aliased `s`, inner joins the
//! indexes table once as `si` so only fully stored documents are listed, left
//! joins the indexes table once per referenced member path (`memN`) and the
//! child structure table once per include (`csN`), then groups back to one row
//! per document because member joins may fan rows out.

use std::sync::Arc;
use log::debug;
use crate::compiler::{CompiledQuery, MAIN_ALIAS, QueryCompiler, SqlWhere};
use crate::core::{DbError, Result, StructureId, Value};
use crate::query::QueryCommand;
use crate::schema::{JSON_COLUMN, ROW_NUMBER_COLUMN, STRUCTURE_ID_COLUMN, SchemaModel};
use crate::structure::Structure;
use super::dialect::{PagingStrategy, SqlDialect};
use super::query::{SqlParam, SqlQuery};
use super::statements::{self, SqlStatements};

const TAKE_PARAM: &str = "take";
const PAGING_FROM_PARAM: &str = "pagingFrom";
const PAGING_TO_PARAM: &str = "pagingTo";
const INDEXES_ALIAS: &str = "si";

pub struct DbQueryGenerator {
    statements: Arc<SqlStatements>,
    compiler: QueryCompiler,
    paging: PagingStrategy,
}

impl DbQueryGenerator {
    pub fn new(statements: Arc<SqlStatements>) -> Self {
        let dialect = statements.dialect();
        Self {
            statements,
            compiler: QueryCompiler::new(dialect),
            paging: dialect.paging_strategy(),
        }
    }

    pub fn with_paging_strategy(mut self, paging: PagingStrategy) -> Self {
        self.paging = paging;
        self
    }

    pub fn with_compiler(mut self, compiler: QueryCompiler) -> Self {
        self.compiler = compiler;
        self
    }

    pub fn dialect(&self) -> SqlDialect {
        self.statements.dialect()
    }

    pub fn paging_strategy(&self) -> PagingStrategy {
        self.paging
    }

    pub fn statements(&self) -> &Arc<SqlStatements> {
        &self.statements
    }

    /// Listing of document bodies, plus one column per include.
    ///
    /// Paging takes precedence over `take` when both are set.
    pub fn generate_query(&self, command: &QueryCommand) -> Result<SqlQuery> {
        validate_limits(command)?;
        let compiled = self.compiler.compile(command)?;
        let schema = command.schema();

        let query = match command.paging() {
            Some(paging) => {
                let (from, to) = paging.bounds();
                self.paged_query(schema, &compiled, from, to)?
            }
            None => self.plain_query(schema, &compiled, command.take_count())?,
        };

        debug!("Generated query for '{}': {}", schema.name(), query);
        Ok(query)
    }

    /// Identities of matching documents only.
    ///
    /// Requires a predicate and rejects includes, sortings and paging.
    pub fn generate_query_returning_identifiers(&self, command: &QueryCommand) -> Result<SqlQuery> {
        let (select, params) = self.identifier_select(command)?;
        let query = SqlQuery::new(format!("{};", select), params);
        debug!("Generated identifier query for '{}': {}", command.schema().name(), query);
        Ok(query)
    }

    /// One batch deleting every document the command's predicate matches.
    ///
    /// Matching identities are captured in a table variable before any row is
    /// removed, so deleting member rows cannot change what the predicate selects.
    pub fn generate_delete_by_query(&self, command: &QueryCommand) -> Result<SqlQuery> {
        let (select, params) = self.identifier_select(command)?;
        let schema = command.schema();
        let dialect = self.dialect();

        let mut batch = vec![
            self.statements.inject(
                statements::DECLARE_ID_TABLE,
                &[dialect.id_column_type(schema.id_type())],
            )?,
            self.statements.inject(statements::FILL_ID_TABLE, &[&select])?,
        ];
        for table in self.deletion_order(schema) {
            batch.push(
                self.statements
                    .inject(statements::DELETE_IN_ID_TABLE, &[&dialect.quote(&table)])?,
            );
        }

        let query = SqlQuery::new(batch.join("\n"), params);
        debug!("Generated delete by query for '{}': {}", schema.name(), query);
        Ok(query)
    }

    /// Number of documents matching the predicate, or of all documents.
    ///
    /// Sortings, includes, paging and take do not affect a count.
    pub fn generate_count_query(&self, command: &QueryCommand) -> Result<SqlQuery> {
        let schema = command.schema();
        let dialect = self.dialect();

        let query = match command.predicate() {
            None => SqlQuery::new(
                self.statements.inject(
                    statements::COUNT_ALL,
                    &[&dialect.quote(&schema.structure_table_name())],
                )?,
                Vec::new(),
            ),
            Some(predicate) => {
                let mut joins = Default::default();
                let where_clause = self.compiler.compile_where(schema, predicate, &mut joins)?;
                let params = where_clause.params.clone();
                let compiled = CompiledQuery {
                    where_clause: Some(where_clause),
                    sortings: Vec::new(),
                    includes: Vec::new(),
                    joins,
                };
                let inner = self.ids_select(schema, &compiled, false);
                SqlQuery::new(
                    self.statements.inject(statements::COUNT_WHERE, &[&inner])?,
                    params,
                )
            }
        };

        debug!("Generated count query for '{}': {}", schema.name(), query);
        Ok(query)
    }

    pub fn generate_get_by_id(&self, schema: &SchemaModel, id: &StructureId) -> Result<SqlQuery> {
        let sql = self.statements.inject(
            statements::GET_BY_ID,
            &[&self.dialect().quote(&schema.structure_table_name())],
        )?;
        Ok(SqlQuery::new(sql, vec![self.id_param(schema, id)?]))
    }

    pub fn generate_get_by_ids(&self, schema: &SchemaModel, ids: &[StructureId]) -> Result<SqlQuery> {
        let (params, names) = self.id_list_params(schema, ids)?;
        let sql = self.statements.inject(
            statements::GET_BY_IDS,
            &[&self.dialect().quote(&schema.structure_table_name()), &names],
        )?;
        Ok(SqlQuery::new(sql, params))
    }

    /// Bodies whose identity lies in `[from, to]`, in identity order.
    pub fn generate_get_by_id_range(
        &self,
        schema: &SchemaModel,
        from: &StructureId,
        to: &StructureId,
    ) -> Result<SqlQuery> {
        let params = self.range_params(schema, from, to)?;
        let sql = self.statements.inject(
            statements::GET_BY_ID_RANGE,
            &[&self.dialect().quote(&schema.structure_table_name())],
        )?;
        Ok(SqlQuery::new(sql, params))
    }

    /// Statements storing one structure: body row, index row and unique row.
    pub fn generate_insert(&self, schema: &SchemaModel, structure: &Structure) -> Result<Vec<SqlQuery>> {
        let dialect = self.dialect();
        let id = self.id_param(schema, &structure.id)?;
        let json = SqlParam::new(dialect.param_name("json"), Value::Text(structure.json.clone()));

        let mut queries = vec![SqlQuery::new(
            self.statements.inject(
                statements::INSERT_STRUCTURE,
                &[&dialect.quote(&schema.structure_table_name())],
            )?,
            vec![id, json],
        )];
        queries.extend(self.member_rows(schema, structure)?);
        Ok(queries)
    }

    /// Replace the body and rewrite the member rows of an existing structure.
    pub fn generate_update(&self, schema: &SchemaModel, structure: &Structure) -> Result<Vec<SqlQuery>> {
        let dialect = self.dialect();
        let id = self.id_param(schema, &structure.id)?;
        let json = SqlParam::new(dialect.param_name("json"), Value::Text(structure.json.clone()));

        let mut queries = vec![SqlQuery::new(
            self.statements.inject(
                statements::UPDATE_JSON,
                &[&dialect.quote(&schema.structure_table_name())],
            )?,
            vec![id.clone(), json],
        )];
        for table in self.member_tables(schema) {
            queries.push(SqlQuery::new(
                self.statements
                    .inject(statements::DELETE_BY_ID, &[&dialect.quote(&table)])?,
                vec![id.clone()],
            ));
        }
        queries.extend(self.member_rows(schema, structure)?);
        Ok(queries)
    }

    /// Delete one document from every table; the body row goes last.
    pub fn generate_delete_by_id(&self, schema: &SchemaModel, id: &StructureId) -> Result<Vec<SqlQuery>> {
        let id = self.id_param(schema, id)?;
        self.delete_everywhere(schema, statements::DELETE_BY_ID, &[], vec![id])
    }

    pub fn generate_delete_by_ids(&self, schema: &SchemaModel, ids: &[StructureId]) -> Result<Vec<SqlQuery>> {
        let (params, names) = self.id_list_params(schema, ids)?;
        self.delete_everywhere(schema, statements::DELETE_BY_IDS, &[&names], params)
    }

    /// Delete every document whose identity lies in `[from, to]`.
    pub fn generate_delete_by_id_range(
        &self,
        schema: &SchemaModel,
        from: &StructureId,
        to: &StructureId,
    ) -> Result<Vec<SqlQuery>> {
        let params = self.range_params(schema, from, to)?;
        self.delete_everywhere(schema, statements::DELETE_BY_ID_RANGE, &[], params)
    }

    /// `select s.[StructureId] ...` for the command, without the terminator.
    fn identifier_select(&self, command: &QueryCommand) -> Result<(String, Vec<SqlParam>)> {
        let schema = command.schema();
        let violation = |what: &str| {
            DbError::ContractViolation(format!(
                "identifier query on '{}' {}",
                schema.name(),
                what
            ))
        };
        if !command.has_predicate() {
            return Err(violation("requires a predicate"));
        }
        if command.has_includes() {
            return Err(violation("cannot have includes"));
        }
        if command.has_sortings() {
            return Err(violation("cannot have sortings"));
        }
        if command.has_paging() {
            return Err(violation("cannot have paging"));
        }
        validate_limits(command)?;

        let compiled = self.compiler.compile(command)?;
        let mut params = compiled.params().to_vec();
        let take = command.take_count();
        if let Some(take) = take {
            params.push(self.take_param(take)?);
        }
        Ok((self.ids_select(schema, &compiled, take.is_some()), params))
    }

    /// The same template run against each table in deletion order.
    fn delete_everywhere(
        &self,
        schema: &SchemaModel,
        template: &str,
        args: &[&str],
        params: Vec<SqlParam>,
    ) -> Result<Vec<SqlQuery>> {
        let dialect = self.dialect();
        self.deletion_order(schema)
            .iter()
            .map(|table| {
                let table = dialect.quote(table);
                let mut holes = vec![table.as_str()];
                holes.extend_from_slice(args);
                Ok(SqlQuery::new(self.statements.inject(template, &holes)?, params.clone()))
            })
            .collect()
    }

    /// Member tables first, uniques before indexes, then the structure table.
    fn deletion_order(&self, schema: &SchemaModel) -> Vec<String> {
        let mut tables = self.member_tables(schema);
        tables.reverse();
        tables.push(schema.structure_table_name());
        tables
    }

    fn plain_query(&self, schema: &SchemaModel, compiled: &CompiledQuery, take: Option<usize>) -> Result<SqlQuery> {
        let mut params = compiled.params().to_vec();
        let mut sql = String::from("select ");
        if let Some(take) = take {
            let param = self.take_param(take)?;
            sql.push_str(&format!("top({}) ", param.name));
            params.push(param);
        }
        sql.push_str(&self.select_columns(compiled).join(", "));
        sql.push_str(&self.from_clause(schema, compiled));
        if needs_grouping(compiled) {
            sql.push_str(&self.group_by());
        }
        if !compiled.sortings.is_empty() {
            let keys: Vec<String> = compiled.sortings.iter().map(|s| s.order_expression()).collect();
            sql.push_str(" order by ");
            sql.push_str(&keys.join(", "));
        }
        sql.push(';');
        Ok(SqlQuery::new(sql, params))
    }

    fn paged_query(&self, schema: &SchemaModel, compiled: &CompiledQuery, from: u64, to: u64) -> Result<SqlQuery> {
        let dialect = self.dialect();
        let order = if compiled.sortings.is_empty() {
            dialect.column(MAIN_ALIAS, STRUCTURE_ID_COLUMN)
        } else {
            let keys: Vec<String> = compiled.sortings.iter().map(|s| s.order_expression()).collect();
            keys.join(", ")
        };

        let mut columns = self.select_columns(compiled);
        columns.push(format!("row_number() over (order by {}) as {}", order, ROW_NUMBER_COLUMN));
        let inner = format!(
            "select {}{}{}",
            columns.join(", "),
            self.from_clause(schema, compiled),
            self.group_by()
        );

        let mut outer = vec![dialect.quote(JSON_COLUMN)];
        outer.extend(compiled.includes.iter().map(|i| dialect.quote(i.output_column())));

        let template = match self.paging {
            PagingStrategy::WindowedCte => statements::PAGED_QUERY_CTE,
            PagingStrategy::RowNumberSubquery => statements::PAGED_QUERY_ROW_NUMBER,
        };
        let sql = self.statements.inject(template, &[&inner, &outer.join(", ")])?;

        let mut params = compiled.params().to_vec();
        params.push(SqlParam::new(dialect.param_name(PAGING_FROM_PARAM), bound_value(from)?));
        params.push(SqlParam::new(dialect.param_name(PAGING_TO_PARAM), bound_value(to)?));
        Ok(SqlQuery::new(sql, params))
    }

    fn ids_select(&self, schema: &SchemaModel, compiled: &CompiledQuery, with_take: bool) -> String {
        let dialect = self.dialect();
        let id_column = dialect.column(MAIN_ALIAS, STRUCTURE_ID_COLUMN);
        let top = if with_take {
            format!("top({}) ", dialect.param_name(TAKE_PARAM))
        } else {
            String::new()
        };
        format!(
            "select {}{}{} group by {}",
            top,
            id_column,
            self.from_clause(schema, compiled),
            id_column
        )
    }

    fn select_columns(&self, compiled: &CompiledQuery) -> Vec<String> {
        let dialect = self.dialect();
        let mut columns = vec![dialect.column(MAIN_ALIAS, JSON_COLUMN)];
        columns.extend(compiled.includes.iter().map(|i| i.select_expression(dialect)));
        columns
    }

    /// ` from ... s` with all joins and the where clause.
    fn from_clause(&self, schema: &SchemaModel, compiled: &CompiledQuery) -> String {
        let dialect = self.dialect();
        let indexes_table = dialect.quote(&schema.indexes_table_name());
        let main_id = dialect.column(MAIN_ALIAS, STRUCTURE_ID_COLUMN);

        let mut sql = format!(
            " from {} {} inner join {} {} on {} = {}",
            dialect.quote(&schema.structure_table_name()),
            MAIN_ALIAS,
            indexes_table,
            INDEXES_ALIAS,
            dialect.column(INDEXES_ALIAS, STRUCTURE_ID_COLUMN),
            main_id
        );
        for join in compiled.joins.iter() {
            sql.push_str(&format!(
                " left join {} {} on {} = {}",
                indexes_table,
                join.alias,
                dialect.column(&join.alias, STRUCTURE_ID_COLUMN),
                main_id
            ));
        }
        for include in &compiled.includes {
            sql.push(' ');
            sql.push_str(&include.join(dialect));
        }
        if let Some(SqlWhere { criteria, .. }) = &compiled.where_clause {
            sql.push_str(" where ");
            sql.push_str(criteria);
        }
        sql
    }

    fn group_by(&self) -> String {
        let dialect = self.dialect();
        format!(
            " group by {}, {}",
            dialect.column(MAIN_ALIAS, STRUCTURE_ID_COLUMN),
            dialect.column(MAIN_ALIAS, JSON_COLUMN)
        )
    }

    fn member_tables(&self, schema: &SchemaModel) -> Vec<String> {
        let mut tables = vec![schema.indexes_table_name()];
        if schema.has_uniques() {
            tables.push(schema.uniques_table_name());
        }
        tables
    }

    fn member_rows(&self, schema: &SchemaModel, structure: &Structure) -> Result<Vec<SqlQuery>> {
        let dialect = self.dialect();
        let id = self.id_param(schema, &structure.id)?;

        let mut index_row = RowBuilder::new(dialect, "i", id.clone());
        let mut unique_row = RowBuilder::new(dialect, "u", id);
        for index in &structure.indexes {
            let member = schema.find_member(&index.member_path).ok_or_else(|| {
                DbError::MemberNotFound(index.member_path.clone(), schema.name().to_string())
            })?;
            index_row.push(&member.column_name, index.value.clone());
            if member.is_unique {
                unique_row.push(&member.column_name, index.value.clone());
            }
        }

        let mut queries = vec![index_row.build(&self.statements, &schema.indexes_table_name())?];
        if schema.has_uniques() {
            queries.push(unique_row.build(&self.statements, &schema.uniques_table_name())?);
        }
        Ok(queries)
    }

    fn id_param(&self, schema: &SchemaModel, id: &StructureId) -> Result<SqlParam> {
        check_id_type(schema, id)?;
        if id.is_empty() {
            return Err(DbError::ContractViolation(format!(
                "statement on '{}' needs a non-empty identity",
                schema.name()
            )));
        }
        Ok(SqlParam::new(self.dialect().param_name("id"), id.to_value()))
    }

    /// `@id0, @id1, ...` for a non-empty identity list.
    fn id_list_params(&self, schema: &SchemaModel, ids: &[StructureId]) -> Result<(Vec<SqlParam>, String)> {
        if ids.is_empty() {
            return Err(DbError::ContractViolation(format!(
                "statement on '{}' needs at least one identity",
                schema.name()
            )));
        }

        let dialect = self.dialect();
        let mut params = Vec::with_capacity(ids.len());
        for (index, id) in ids.iter().enumerate() {
            check_id_type(schema, id)?;
            params.push(SqlParam::new(dialect.param_name(&format!("id{}", index)), id.to_value()));
        }
        let names: Vec<&str> = params.iter().map(|p| p.name.as_str()).collect();
        let names = names.join(", ");
        Ok((params, names))
    }

    fn range_params(&self, schema: &SchemaModel, from: &StructureId, to: &StructureId) -> Result<Vec<SqlParam>> {
        for id in [from, to] {
            check_id_type(schema, id)?;
            if id.is_empty() {
                return Err(DbError::ContractViolation(format!(
                    "identity range on '{}' needs non-empty bounds",
                    schema.name()
                )));
            }
        }
        if let (StructureId::Identity(low), StructureId::Identity(high)) = (from, to) {
            if low > high {
                return Err(DbError::ContractViolation(format!(
                    "identity range {}..{} on '{}' is reversed",
                    low,
                    high,
                    schema.name()
                )));
            }
        }

        let dialect = self.dialect();
        Ok(vec![
            SqlParam::new(dialect.param_name("idFrom"), from.to_value()),
            SqlParam::new(dialect.param_name("idTo"), to.to_value()),
        ])
    }

    fn take_param(&self, take: usize) -> Result<SqlParam> {
        Ok(SqlParam::new(
            self.dialect().param_name(TAKE_PARAM),
            bound_value(take as u64)?,
        ))
    }
}

/// Parameterized `insert` of one member row.
struct RowBuilder {
    dialect: SqlDialect,
    prefix: &'static str,
    columns: String,
    values: String,
    params: Vec<SqlParam>,
}

impl RowBuilder {
    fn new(dialect: SqlDialect, prefix: &'static str, id: SqlParam) -> Self {
        Self {
            dialect,
            prefix,
            columns: String::new(),
            values: String::new(),
            params: vec![id],
        }
    }

    fn push(&mut self, column: &str, value: Value) {
        let name = self
            .dialect
            .param_name(&format!("{}{}", self.prefix, self.params.len() - 1));
        self.columns.push_str(", ");
        self.columns.push_str(&self.dialect.quote(column));
        self.values.push_str(", ");
        self.values.push_str(&name);
        self.params.push(SqlParam::new(name, value));
    }

    fn build(self, statements: &SqlStatements, table: &str) -> Result<SqlQuery> {
        let sql = statements.inject(
            statements::INSERT_ROW,
            &[&self.dialect.quote(table), &self.columns, &self.values],
        )?;
        Ok(SqlQuery::new(sql, self.params))
    }
}

/// Paged listings always group; plain listings only when something joins or filters.
fn needs_grouping(compiled: &CompiledQuery) -> bool {
    compiled.where_clause.is_some()
        || !compiled.sortings.is_empty()
        || !compiled.includes.is_empty()
}

fn validate_limits(command: &QueryCommand) -> Result<()> {
    if command.take_count() == Some(0) {
        return Err(DbError::ContractViolation(format!(
            "take on '{}' must be positive",
            command.schema().name()
        )));
    }
    if let Some(paging) = command.paging() {
        if paging.page_size == 0 {
            return Err(DbError::ContractViolation(format!(
                "page size on '{}' must be positive",
                command.schema().name()
            )));
        }
    }
    Ok(())
}

fn check_id_type(schema: &SchemaModel, id: &StructureId) -> Result<()> {
    if id.id_type() != schema.id_type() {
        return Err(DbError::TypeMismatch(format!(
            "'{}' uses {} identities, got {}",
            schema.name(),
            schema.id_type(),
            id.id_type()
        )));
    }
    Ok(())
}

fn bound_value(value: u64) -> Result<Value> {
    i64::try_from(value)
        .map(Value::Integer)
        .map_err(|_| DbError::ContractViolation(format!("row bound {} is out of range", value)))
}
