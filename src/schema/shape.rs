//! Structural type descriptions
//!
//! A document type describes its shape once by registering member lenses on a
//! [`Shape`]; `#[derive(Document)]` and `#[derive(Members)]` generate exactly
//! these calls. Nothing here validates: the collected shape is checked as a
//! whole when a [`StructureSchema`](super::StructureSchema) is derived from it.

use serde::Serialize;
use serde::de::DeserializeOwned;
use crate::core::DataType;
use super::accessors::{IdAccessor, IndexAccessor, TimeStampAccessor};
use super::values::{IdValue, IndexValue, TimeStampValue};

/// A type stored as a document with its own identity.
pub trait Document: Serialize + DeserializeOwned + Send + Sync + 'static {
    fn describe(shape: &mut Shape<Self>);
}

/// A value type embedded in a document whose scalar members are indexed
/// under the embedding member's path.
pub trait Members: Sized + 'static {
    fn describe_members(members: &mut MemberSet<Self>);
}

/// Ordered collection of index accessors for `T`.
pub struct MemberSet<T> {
    accessors: Vec<IndexAccessor<T>>,
}

impl<T: 'static> MemberSet<T> {
    pub fn new() -> Self {
        Self { accessors: Vec::new() }
    }

    /// Index a scalar member with the data type implied by its Rust type.
    pub fn index<V: IndexValue>(&mut self, path: &str, get: fn(&T) -> &V) -> &mut Self {
        self.accessors
            .push(IndexAccessor::new(path, V::DATA_TYPE, false, get));
        self
    }

    /// Index a scalar member under an explicitly declared data type.
    ///
    /// Values are coerced when structures are built; a value that cannot be
    /// represented in `data_type` fails the build.
    pub fn index_as<V: IndexValue>(
        &mut self,
        path: &str,
        data_type: DataType,
        get: fn(&T) -> &V,
    ) -> &mut Self {
        self.accessors
            .push(IndexAccessor::new(path, data_type, false, get));
        self
    }

    /// Index a scalar member and enforce uniqueness per document type.
    pub fn unique<V: IndexValue>(&mut self, path: &str, get: fn(&T) -> &V) -> &mut Self {
        self.accessors
            .push(IndexAccessor::new(path, V::DATA_TYPE, true, get));
        self
    }

    /// Index every member `N` declares, prefixed with `path`.
    pub fn nested<N: Members>(&mut self, path: &str, get: fn(&T) -> &N) -> &mut Self {
        let mut inner = MemberSet::<N>::new();
        N::describe_members(&mut inner);
        self.accessors.extend(
            inner
                .accessors
                .into_iter()
                .map(|accessor| accessor.nest(path, get)),
        );
        self
    }

    pub fn accessors(&self) -> &[IndexAccessor<T>] {
        &self.accessors
    }

    pub(crate) fn into_accessors(self) -> Vec<IndexAccessor<T>> {
        self.accessors
    }
}

impl<T: 'static> Default for MemberSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Shape of a document type: name, identity, members and optional timestamp.
pub struct Shape<T> {
    pub(crate) name: String,
    pub(crate) ids: Vec<IdAccessor<T>>,
    pub(crate) timestamps: Vec<TimeStampAccessor<T>>,
    pub(crate) members: MemberSet<T>,
}

impl<T: 'static> Shape<T> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ids: Vec::new(),
            timestamps: Vec::new(),
            members: MemberSet::new(),
        }
    }

    /// Shape named after the last path segment of the Rust type name.
    pub fn for_type() -> Self {
        let full = std::any::type_name::<T>();
        let base = full.split('<').next().unwrap_or(full);
        Self::new(base.rsplit("::").next().unwrap_or(base))
    }

    /// Override the logical name the tables are derived from.
    pub fn name(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = name.into();
        self
    }

    pub fn id<V: IdValue>(
        &mut self,
        path: &str,
        get: fn(&T) -> &V,
        get_mut: fn(&mut T) -> &mut V,
    ) -> &mut Self {
        self.ids.push(IdAccessor::new(path, get, get_mut));
        self
    }

    /// Register the auto-maintained last-modified member; it is indexed too.
    pub fn timestamp<V: TimeStampValue>(
        &mut self,
        path: &str,
        get: fn(&T) -> &V,
        get_mut: fn(&mut T) -> &mut V,
    ) -> &mut Self {
        self.timestamps.push(TimeStampAccessor::new(path, get_mut));
        self.members.index(path, get);
        self
    }

    pub fn index<V: IndexValue>(&mut self, path: &str, get: fn(&T) -> &V) -> &mut Self {
        self.members.index(path, get);
        self
    }

    pub fn index_as<V: IndexValue>(
        &mut self,
        path: &str,
        data_type: DataType,
        get: fn(&T) -> &V,
    ) -> &mut Self {
        self.members.index_as(path, data_type, get);
        self
    }

    pub fn unique<V: IndexValue>(&mut self, path: &str, get: fn(&T) -> &V) -> &mut Self {
        self.members.unique(path, get);
        self
    }

    pub fn nested<N: Members>(&mut self, path: &str, get: fn(&T) -> &N) -> &mut Self {
        self.members.nested(path, get);
        self
    }

    pub fn members(&self) -> &MemberSet<T> {
        &self.members
    }
}
