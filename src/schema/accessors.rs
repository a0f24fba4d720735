//! Member accessors
//!
//! Each accessor is a capability object resolved once when the schema is
//! derived: a boxed getter (and setter where the engine writes back) keyed by
//! member path. Builders evaluate them per item without any lookups.

use std::fmt;
use std::sync::Arc;
use chrono::{DateTime, Utc};
use crate::core::{DataType, DbError, IdType, Result, StructureId, Value};
use super::values::{IdValue, IndexValue, TimeStampValue};

type Getter<T, R> = Arc<dyn Fn(&T) -> R + Send + Sync>;

/// Reads and writes the identity member of a document.
pub struct IdAccessor<T> {
    path: String,
    id_type: IdType,
    get: Getter<T, StructureId>,
    set: Arc<dyn Fn(&mut T, &StructureId) -> bool + Send + Sync>,
}

impl<T: 'static> IdAccessor<T> {
    pub(crate) fn new<V: IdValue>(
        path: impl Into<String>,
        get: fn(&T) -> &V,
        get_mut: fn(&mut T) -> &mut V,
    ) -> Self {
        Self {
            path: path.into(),
            id_type: V::ID_TYPE,
            get: Arc::new(move |item: &T| get(item).to_structure_id()),
            set: Arc::new(move |item: &mut T, id: &StructureId| match V::from_structure_id(id) {
                Some(value) => {
                    *get_mut(item) = value;
                    true
                }
                None => false,
            }),
        }
    }
}

impl<T> IdAccessor<T> {
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn id_type(&self) -> IdType {
        self.id_type
    }

    pub fn get_value(&self, item: &T) -> StructureId {
        (self.get)(item)
    }

    pub fn set_value(&self, item: &mut T, id: &StructureId) -> Result<()> {
        if (self.set)(item, id) {
            Ok(())
        } else {
            Err(DbError::TypeMismatch(format!(
                "Identity member '{}' expects {} identities, got {}",
                self.path,
                self.id_type,
                id.id_type()
            )))
        }
    }
}

impl<T> Clone for IdAccessor<T> {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            id_type: self.id_type,
            get: Arc::clone(&self.get),
            set: Arc::clone(&self.set),
        }
    }
}

impl<T> fmt::Debug for IdAccessor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdAccessor")
            .field("path", &self.path)
            .field("id_type", &self.id_type)
            .finish()
    }
}

/// Reads one scalar member that is stored in the indexes (and maybe uniques) table.
pub struct IndexAccessor<T> {
    path: String,
    data_type: DataType,
    is_unique: bool,
    get: Getter<T, Value>,
}

impl<T: 'static> IndexAccessor<T> {
    pub(crate) fn new<V: IndexValue>(
        path: impl Into<String>,
        data_type: DataType,
        is_unique: bool,
        get: fn(&T) -> &V,
    ) -> Self {
        Self {
            path: path.into(),
            data_type,
            is_unique,
            get: Arc::new(move |item: &T| get(item).to_value()),
        }
    }

    /// Re-root this accessor under `prefix`, reached from an outer type through `outer`.
    pub(crate) fn nest<P: 'static>(self, prefix: &str, outer: fn(&P) -> &T) -> IndexAccessor<P> {
        let get = self.get;
        IndexAccessor {
            path: format!("{}.{}", prefix, self.path),
            data_type: self.data_type,
            is_unique: self.is_unique,
            get: Arc::new(move |item: &P| get(outer(item))),
        }
    }
}

impl<T> IndexAccessor<T> {
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Storage column holding this member; the path itself, always emitted quoted.
    pub fn column_name(&self) -> &str {
        &self.path
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn is_unique(&self) -> bool {
        self.is_unique
    }

    /// Evaluate the member on `item` and coerce it to the declared data type.
    pub fn value_of(&self, item: &T, schema_name: &str) -> Result<Value> {
        let raw = (self.get)(item);
        raw.coerce_to(self.data_type).ok_or_else(|| {
            DbError::TypeMismatch(format!(
                "Member '{}' of '{}' is declared {} but holds a {} value",
                self.path,
                schema_name,
                self.data_type,
                raw.type_name()
            ))
        })
    }
}

impl<T> Clone for IndexAccessor<T> {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            data_type: self.data_type,
            is_unique: self.is_unique,
            get: Arc::clone(&self.get),
        }
    }
}

impl<T> fmt::Debug for IndexAccessor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexAccessor")
            .field("path", &self.path)
            .field("data_type", &self.data_type)
            .field("is_unique", &self.is_unique)
            .finish()
    }
}

/// Stamps the last-modified member of a document.
pub struct TimeStampAccessor<T> {
    path: String,
    set: Arc<dyn Fn(&mut T, DateTime<Utc>) -> Option<DateTime<Utc>> + Send + Sync>,
    restore: Arc<dyn Fn(&mut T, Option<DateTime<Utc>>) + Send + Sync>,
}

impl<T: 'static> TimeStampAccessor<T> {
    pub(crate) fn new<V: TimeStampValue>(path: impl Into<String>, get_mut: fn(&mut T) -> &mut V) -> Self {
        Self {
            path: path.into(),
            set: Arc::new(move |item: &mut T, at: DateTime<Utc>| get_mut(item).stamp(at)),
            restore: Arc::new(move |item: &mut T, previous: Option<DateTime<Utc>>| {
                get_mut(item).restore(previous)
            }),
        }
    }
}

impl<T> TimeStampAccessor<T> {
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Stamp `item` and return the instant it held before.
    pub fn set_value(&self, item: &mut T, at: DateTime<Utc>) -> Option<DateTime<Utc>> {
        (self.set)(item, at)
    }

    pub fn restore(&self, item: &mut T, previous: Option<DateTime<Utc>>) {
        (self.restore)(item, previous)
    }
}

impl<T> Clone for TimeStampAccessor<T> {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            set: Arc::clone(&self.set),
            restore: Arc::clone(&self.restore),
        }
    }
}

impl<T> fmt::Debug for TimeStampAccessor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimeStampAccessor")
            .field("path", &self.path)
            .finish()
    }
}
