use std::sync::Arc;
use log::debug;
use serde::de::DeserializeOwned;
use crate::codec::{DocumentCodec, JsonCodec};
use crate::core::{DbError, Result, StructureId, Value};
use crate::dac::StatementExecutor;
use crate::dbschema::DbSchemaManager;
use crate::query::QueryCommand;
use crate::result::{IdResults, JsonResults, TypedResults};
use crate::schema::{Document, SchemaModel, StructureSchema, StructureSchemas};
use crate::sql::{DbQueryGenerator, SqlQuery};
use crate::structure::StructureBuilder;

/// Unit of work over one executor handle.
///
/// Result sequences borrow the session mutably, so a new statement cannot be
/// issued while a sequence is still alive.
pub struct DocumentSession<E: StatementExecutor, C: DocumentCodec + Clone = JsonCodec> {
    executor: E,
    schemas: Arc<StructureSchemas>,
    schema_manager: Arc<DbSchemaManager>,
    generator: DbQueryGenerator,
    builder: StructureBuilder<C>,
    upsert_schemas: bool,
}

impl<E: StatementExecutor, C: DocumentCodec + Clone> DocumentSession<E, C> {
    pub(crate) fn new(
        executor: E,
        schemas: Arc<StructureSchemas>,
        schema_manager: Arc<DbSchemaManager>,
        generator: DbQueryGenerator,
        builder: StructureBuilder<C>,
        upsert_schemas: bool,
    ) -> Self {
        Self {
            executor,
            schemas,
            schema_manager,
            generator,
            builder,
            upsert_schemas,
        }
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn executor_mut(&mut self) -> &mut E {
        &mut self.executor
    }

    pub fn into_executor(self) -> E {
        self.executor
    }

    pub fn schema<T: Document>(&self) -> Result<Arc<StructureSchema<T>>> {
        self.schemas.get_schema::<T>()
    }

    /// Make sure `T`'s structure set exists, regardless of configuration.
    pub fn upsert_schema<T: Document>(&mut self) -> Result<()> {
        let schema = self.schema::<T>()?;
        self.schema_manager
            .upsert_structure_set(&mut self.executor, schema.model())
    }

    pub fn insert<T: Document>(&mut self, item: &mut T) -> Result<StructureId> {
        let schema = self.schema::<T>()?;
        self.ensure_schema(schema.model())?;

        let structure = self.builder.build_structure(item, &schema)?;
        for query in self.generator.generate_insert(schema.model(), &structure)? {
            self.execute(&query)?;
        }
        Ok(structure.id)
    }

    pub fn insert_many<T: Document>(&mut self, items: &mut [T]) -> Result<Vec<StructureId>> {
        let schema = self.schema::<T>()?;
        self.ensure_schema(schema.model())?;

        let structures = self.builder.build_structures(items, &schema)?;
        let mut ids = Vec::with_capacity(structures.len());
        for structure in structures {
            for query in self.generator.generate_insert(schema.model(), &structure)? {
                self.execute(&query)?;
            }
            ids.push(structure.id);
        }
        Ok(ids)
    }

    /// Replace a stored document; its identity must already be assigned.
    pub fn update<T: Document>(&mut self, item: &mut T) -> Result<()> {
        let schema = self.schema::<T>()?;
        if schema.id_accessor().get_value(item).is_empty() {
            return Err(DbError::ContractViolation(format!(
                "cannot update a '{}' document without an identity",
                schema.name()
            )));
        }
        self.ensure_schema(schema.model())?;

        let structure = self.builder.build_structure(item, &schema)?;
        let mut queries = self.generator.generate_update(schema.model(), &structure)?.into_iter();
        if let Some(replace) = queries.next() {
            if self.execute(&replace)? == 0 {
                return Err(DbError::ContractViolation(format!(
                    "no stored '{}' document has that identity",
                    schema.name()
                )));
            }
        }
        for query in queries {
            self.execute(&query)?;
        }
        Ok(())
    }

    /// Delete one document; `false` when nothing was stored under `id`.
    pub fn delete_by_id<T: Document>(&mut self, id: impl Into<StructureId>) -> Result<bool> {
        let schema = self.schema::<T>()?;
        self.ensure_schema(schema.model())?;

        let queries = self.generator.generate_delete_by_id(schema.model(), &id.into())?;
        Ok(self.execute_all(&queries)? > 0)
    }

    /// Delete the listed documents; returns how many bodies were removed.
    pub fn delete_by_ids<T: Document>(&mut self, ids: &[StructureId]) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        let schema = self.schema::<T>()?;
        self.ensure_schema(schema.model())?;

        let queries = self.generator.generate_delete_by_ids(schema.model(), ids)?;
        self.execute_all(&queries)
    }

    /// Delete every document whose identity lies in `[from, to]`.
    pub fn delete_by_id_range<T: Document>(
        &mut self,
        from: impl Into<StructureId>,
        to: impl Into<StructureId>,
    ) -> Result<u64> {
        let schema = self.schema::<T>()?;
        self.ensure_schema(schema.model())?;

        let queries = self
            .generator
            .generate_delete_by_id_range(schema.model(), &from.into(), &to.into())?;
        self.execute_all(&queries)
    }

    /// Delete every document the command's predicate matches, as one batch.
    pub fn delete_by_query(&mut self, command: &QueryCommand) -> Result<()> {
        self.ensure_schema(command.schema())?;

        let query = self.generator.generate_delete_by_query(command)?;
        self.execute(&query)?;
        Ok(())
    }

    pub fn get_by_id<T: Document>(&mut self, id: impl Into<StructureId>) -> Result<Option<T>> {
        self.get_by_id_as::<T, T>(id)
    }

    /// Stored `T` read back as the projection `Out`.
    pub fn get_by_id_as<T: Document, Out: DeserializeOwned>(
        &mut self,
        id: impl Into<StructureId>,
    ) -> Result<Option<Out>> {
        match self.get_by_id_as_json::<T>(id)? {
            Some(body) => self.builder.codec().decode(&body).map(Some),
            None => Ok(None),
        }
    }

    pub fn get_by_id_as_json<T: Document>(&mut self, id: impl Into<StructureId>) -> Result<Option<String>> {
        let schema = self.schema::<T>()?;
        self.ensure_schema(schema.model())?;

        let query = self.generator.generate_get_by_id(schema.model(), &id.into())?;
        match self.executor.execute_scalar(&query.sql, &query.params)? {
            Value::Null => Ok(None),
            Value::Text(body) => Ok(Some(body)),
            other => Err(DbError::CodecError(format!(
                "document body of '{}' is {} instead of text",
                schema.name(),
                other.type_name()
            ))),
        }
    }

    pub fn get_by_ids<T: Document>(&mut self, ids: &[StructureId]) -> Result<Vec<T>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let schema = self.schema::<T>()?;
        self.ensure_schema(schema.model())?;

        let query = self.generator.generate_get_by_ids(schema.model(), ids)?;
        let records = self.executor.execute_reader(&query.sql, &query.params)?;
        TypedResults::<T, C>::new(records, self.builder.codec().clone()).collect()
    }

    /// Documents whose identity lies in `[from, to]`, in identity order.
    pub fn get_by_id_range<T: Document>(
        &mut self,
        from: impl Into<StructureId>,
        to: impl Into<StructureId>,
    ) -> Result<TypedResults<'_, T, C>> {
        let schema = self.schema::<T>()?;
        self.ensure_schema(schema.model())?;

        let query = self
            .generator
            .generate_get_by_id_range(schema.model(), &from.into(), &to.into())?;
        let records = self.executor.execute_reader(&query.sql, &query.params)?;
        Ok(TypedResults::new(records, self.builder.codec().clone()))
    }

    /// Lazily decoded documents matching `command`.
    pub fn query<T: Document>(&mut self, command: &QueryCommand) -> Result<TypedResults<'_, T, C>> {
        self.query_as::<T, T>(command)
    }

    /// Documents of `T` matching `command`, each decoded as the projection
    /// `Out`. Include targets are visible to `Out` as top-level members.
    pub fn query_as<T: Document, Out: DeserializeOwned>(
        &mut self,
        command: &QueryCommand,
    ) -> Result<TypedResults<'_, Out, C>> {
        let schema = self.schema::<T>()?;
        if command.schema().hash() != schema.hash() {
            return Err(DbError::ContractViolation(format!(
                "query against '{}' cannot return '{}' documents",
                command.schema().name(),
                schema.name()
            )));
        }
        self.ensure_command_schemas(command)?;

        let query = self.generator.generate_query(command)?;
        let records = self.executor.execute_reader(&query.sql, &query.params)?;
        Ok(TypedResults::new(records, self.builder.codec().clone()))
    }

    /// The only document matching `command`; none or several is an error.
    pub fn single<T: Document>(&mut self, command: &QueryCommand) -> Result<T> {
        let name = command.schema().name().to_string();
        self.single_or_default::<T>(command)?.ok_or_else(|| {
            DbError::ContractViolation(format!("no '{}' document matches the query", name))
        })
    }

    /// The only document matching `command`, or `None`; several is an error.
    ///
    /// At most two rows are read from the result stream.
    pub fn single_or_default<T: Document>(&mut self, command: &QueryCommand) -> Result<Option<T>> {
        let name = command.schema().name().to_string();
        let mut documents = self.query::<T>(command)?;
        let first = documents.next().transpose()?;
        if first.is_some() && documents.next().is_some() {
            return Err(DbError::ContractViolation(format!(
                "more than one '{}' document matches the query",
                name
            )));
        }
        Ok(first)
    }

    /// Documents matching `command` as JSON, includes merged in.
    pub fn query_as_json(&mut self, command: &QueryCommand) -> Result<JsonResults<'_>> {
        self.ensure_command_schemas(command)?;

        let query = self.generator.generate_query(command)?;
        let records = self.executor.execute_reader(&query.sql, &query.params)?;
        Ok(JsonResults::new(records))
    }

    pub fn query_ids(&mut self, command: &QueryCommand) -> Result<IdResults<'_>> {
        self.ensure_command_schemas(command)?;

        let query = self.generator.generate_query_returning_identifiers(command)?;
        let id_type = command.schema().id_type();
        let records = self.executor.execute_reader(&query.sql, &query.params)?;
        Ok(IdResults::new(records, id_type))
    }

    pub fn count<T: Document>(&mut self) -> Result<u64> {
        let schema = self.schema::<T>()?;
        self.count_where(&QueryCommand::for_schema(schema.as_ref()))
    }

    pub fn count_where(&mut self, command: &QueryCommand) -> Result<u64> {
        self.ensure_schema(command.schema())?;

        let query = self.generator.generate_count_query(command)?;
        match self.executor.execute_scalar(&query.sql, &query.params)? {
            Value::Integer(count) => u64::try_from(count)
                .map_err(|_| DbError::ExecutionError(format!("negative count {}", count))),
            Value::Null => Ok(0),
            other => Err(DbError::ExecutionError(format!(
                "count returned {} instead of an integer",
                other.type_name()
            ))),
        }
    }

    pub fn drop_structure_set<T: Document>(&mut self) -> Result<()> {
        let schema = self.schema::<T>()?;
        self.schema_manager
            .drop_structure_set(&mut self.executor, schema.model())
    }

    fn ensure_schema(&mut self, model: &SchemaModel) -> Result<()> {
        if !self.upsert_schemas {
            return Ok(());
        }
        self.schema_manager.upsert_structure_set(&mut self.executor, model)
    }

    fn ensure_command_schemas(&mut self, command: &QueryCommand) -> Result<()> {
        self.ensure_schema(command.schema())?;
        for include in command.includes() {
            self.ensure_schema(&include.child)?;
        }
        Ok(())
    }

    /// Run statements in order; the last one's affected count is returned.
    fn execute_all(&mut self, queries: &[SqlQuery]) -> Result<u64> {
        let mut affected = 0;
        for query in queries {
            affected = self.execute(query)?;
        }
        Ok(affected)
    }

    fn execute(&mut self, query: &SqlQuery) -> Result<u64> {
        debug!("Executing {}", query);
        self.executor.execute(&query.sql, &query.params)
    }
}
