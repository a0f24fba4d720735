use std::sync::Arc;
use log::{debug, info};
use crate::core::{DbError, Result};
use crate::dac::StatementExecutor;
use crate::schema::{SchemaModel, TableRole};
use crate::sql::SqlStatements;
use super::ddl::{self, CreateTableBuilder};
use super::synchronizer::{ColumnSynchronizer, entity_tags};

/// Makes the physical structure set a superset of a schema.
pub struct DbSchemaUpserter {
    statements: Arc<SqlStatements>,
    columns: ColumnSynchronizer,
}

impl DbSchemaUpserter {
    pub fn new(statements: Arc<SqlStatements>) -> Self {
        Self {
            columns: ColumnSynchronizer::new(Arc::clone(&statements)),
            statements,
        }
    }

    /// Create missing tables and add missing member columns.
    ///
    /// Idempotent; when all three tables exist and are complete nothing is issued.
    pub fn upsert(&self, executor: &mut dyn StatementExecutor, model: &SchemaModel) -> Result<()> {
        self.try_upsert(executor, model).map_err(|err| match err {
            err @ DbError::SynchronizationFailed { .. } => err,
            err => DbError::SynchronizationFailed {
                schema: model.name().to_string(),
                source: Box::new(err),
            },
        })
    }

    /// Drop every table of the structure set.
    pub fn drop(&self, executor: &mut dyn StatementExecutor, model: &SchemaModel) -> Result<()> {
        let batch = ddl::drop_structure_set(&self.statements, model)?;
        executor
            .execute(&batch.join("\n"), &entity_tags(&self.statements, model))
            .map_err(|err| DbError::SynchronizationFailed {
                schema: model.name().to_string(),
                source: Box::new(err),
            })?;
        info!("Dropped structure set of '{}' (hash {})", model.name(), model.hash());
        Ok(())
    }

    fn try_upsert(&self, executor: &mut dyn StatementExecutor, model: &SchemaModel) -> Result<()> {
        let structure_exists = executor.table_exists(&model.structure_table_name())?;
        let indexes_exists = executor.table_exists(&model.indexes_table_name())?;
        let uniques_exists = executor.table_exists(&model.uniques_table_name())?;

        if indexes_exists {
            self.columns.synchronize(executor, model, TableRole::Indexes)?;
        }
        if uniques_exists {
            self.columns.synchronize(executor, model, TableRole::Uniques)?;
        }
        if structure_exists && indexes_exists && uniques_exists {
            debug!("Structure set of '{}' is up to date", model.name());
            return Ok(());
        }

        let mut batch = Vec::new();
        let mut created = Vec::new();
        for (role, exists) in [
            (TableRole::Structure, structure_exists),
            (TableRole::Indexes, indexes_exists),
            (TableRole::Uniques, uniques_exists),
        ] {
            if !exists {
                batch.extend(CreateTableBuilder::new(&self.statements, model, role).build()?);
                created.push(model.table_name(role));
            }
        }

        executor.execute(&batch.join("\n"), &entity_tags(&self.statements, model))?;
        info!(
            "Created {} for '{}' (hash {})",
            created.join(", "),
            model.name(),
            model.hash()
        );
        Ok(())
    }
}
