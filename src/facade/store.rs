use std::sync::Arc;
use crate::codec::{DocumentCodec, JsonCodec};
use crate::core::Result;
use crate::dac::StatementExecutor;
use crate::dbschema::DbSchemaManager;
use crate::query::{IncludeSpec, QueryCommand};
use crate::schema::{Document, StructureSchema, StructureSchemas};
use crate::sql::{DbQueryGenerator, SqlStatements};
use crate::structure::{IdentitySource, SequentialIdentitySource, StructureBuilder};
use super::config::StoreConfig;
use super::session::DocumentSession;

/// Process-wide state shared by all sessions: configuration, SQL templates,
/// the schema cache and the memo of upserted structure sets.
pub struct DocumentStore<C: DocumentCodec + Clone = JsonCodec> {
    config: StoreConfig,
    statements: Arc<SqlStatements>,
    schemas: Arc<StructureSchemas>,
    schema_manager: Arc<DbSchemaManager>,
    identity_source: Arc<dyn IdentitySource>,
    codec: C,
}

impl DocumentStore<JsonCodec> {
    /// Store with the in-process identity source and the JSON codec.
    pub fn new(config: StoreConfig) -> Result<Self> {
        Self::with_codec(config, Arc::new(SequentialIdentitySource::new()), JsonCodec)
    }
}

impl<C: DocumentCodec + Clone> DocumentStore<C> {
    pub fn with_codec(
        config: StoreConfig,
        identity_source: Arc<dyn IdentitySource>,
        codec: C,
    ) -> Result<Self> {
        config.validate()?;
        let statements = Arc::new(SqlStatements::for_dialect(config.dialect));

        Ok(Self {
            schema_manager: Arc::new(DbSchemaManager::new(Arc::clone(&statements))),
            schemas: Arc::new(StructureSchemas::new()),
            statements,
            identity_source,
            codec,
            config,
        })
    }

    pub fn with_identity_source(mut self, identity_source: Arc<dyn IdentitySource>) -> Self {
        self.identity_source = identity_source;
        self
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn statements(&self) -> &Arc<SqlStatements> {
        &self.statements
    }

    pub fn schema_manager(&self) -> &Arc<DbSchemaManager> {
        &self.schema_manager
    }

    pub fn schema<T: Document>(&self) -> Result<Arc<StructureSchema<T>>> {
        self.schemas.get_schema::<T>()
    }

    /// Empty query command against `T`'s schema.
    pub fn query<T: Document>(&self) -> Result<QueryCommand> {
        Ok(QueryCommand::for_schema(self.schema::<T>()?.as_ref()))
    }

    /// Include of `Child` documents referenced through `id_reference_path`.
    pub fn include<Child: Document>(
        &self,
        id_reference_path: &str,
        object_reference_path: &str,
    ) -> Result<IncludeSpec> {
        let child = self.schema::<Child>()?;
        Ok(IncludeSpec::new(
            id_reference_path,
            object_reference_path,
            Arc::clone(child.model()),
        ))
    }

    pub fn generator(&self) -> DbQueryGenerator {
        DbQueryGenerator::new(Arc::clone(&self.statements))
            .with_paging_strategy(self.config.effective_paging_strategy())
    }

    /// Session owning `executor` for its whole lifetime.
    pub fn open_session<E: StatementExecutor>(&self, executor: E) -> DocumentSession<E, C> {
        let builder = StructureBuilder::with_codec(Arc::clone(&self.identity_source), self.codec.clone())
            .strategy(self.config.build_strategy);

        DocumentSession::new(
            executor,
            Arc::clone(&self.schemas),
            Arc::clone(&self.schema_manager),
            self.generator(),
            builder,
            self.config.upsert_schemas,
        )
    }
}
