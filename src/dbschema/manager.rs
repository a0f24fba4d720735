use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use crate::core::Result;
use crate::dac::StatementExecutor;
use crate::schema::SchemaModel;
use crate::sql::SqlStatements;
use super::upserter::DbSchemaUpserter;

/// Remembers which structure sets were already upserted so each schema hits
/// the store once per manager.
pub struct DbSchemaManager {
    upserter: DbSchemaUpserter,
    upserted: Mutex<HashSet<String>>,
}

impl DbSchemaManager {
    pub fn new(statements: Arc<SqlStatements>) -> Self {
        Self {
            upserter: DbSchemaUpserter::new(statements),
            upserted: Mutex::new(HashSet::new()),
        }
    }

    pub fn upsert_structure_set(&self, executor: &mut dyn StatementExecutor, model: &SchemaModel) -> Result<()> {
        if self.upserted.lock()?.contains(model.name()) {
            return Ok(());
        }

        // Not held across the DDL; a racing upsert of the same set is harmless.
        self.upserter.upsert(executor, model)?;
        self.upserted.lock()?.insert(model.name().to_string());
        Ok(())
    }

    pub fn drop_structure_set(&self, executor: &mut dyn StatementExecutor, model: &SchemaModel) -> Result<()> {
        self.upserted.lock()?.remove(model.name());
        self.upserter.drop(executor, model)
    }

    pub fn is_upserted(&self, schema_name: &str) -> Result<bool> {
        Ok(self.upserted.lock()?.contains(schema_name))
    }

    pub fn clear_cache(&self) -> Result<()> {
        self.upserted.lock()?.clear();
        Ok(())
    }
}
