use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use log::debug;
use crate::core::{DbError, Result};
use super::shape::Document;
use super::structure_schema::StructureSchema;

type CachedSchema = Arc<dyn Any + Send + Sync>;

/// Process-lifetime cache of derived schemas, one per document type.
///
/// Deriving is a pure function of the type's shape, so the first successful
/// derivation wins and every later lookup returns the same `Arc`.
#[derive(Default)]
pub struct StructureSchemas {
    schemas: RwLock<HashMap<TypeId, CachedSchema>>,
}

impl StructureSchemas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_schema<T: Document>(&self) -> Result<Arc<StructureSchema<T>>> {
        let key = TypeId::of::<T>();

        if let Some(cached) = self.schemas.read()?.get(&key) {
            return downcast::<T>(Arc::clone(cached));
        }

        let derived = Arc::new(StructureSchema::<T>::derive()?);
        debug!(
            "Derived schema '{}' ({}) with {} index members",
            derived.name(),
            derived.hash(),
            derived.index_accessors().len()
        );

        let mut schemas = self.schemas.write()?;
        let cached = schemas
            .entry(key)
            .or_insert_with(|| derived as CachedSchema);
        downcast::<T>(Arc::clone(cached))
    }

    pub fn len(&self) -> usize {
        self.schemas.read().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) -> Result<()> {
        self.schemas.write()?.clear();
        Ok(())
    }
}

fn downcast<T: Document>(cached: CachedSchema) -> Result<Arc<StructureSchema<T>>> {
    cached.downcast::<StructureSchema<T>>().map_err(|_| {
        DbError::SchemaError(
            std::any::type_name::<T>().to_string(),
            "cached schema has a different type".to_string(),
        )
    })
}
