use std::fmt;
use std::sync::Arc;
use crate::schema::{Document, SchemaModel, StructureSchema};
use super::expr::Expr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn token(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.token())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sorting {
    pub member_path: String,
    pub direction: SortDirection,
}

impl Sorting {
    pub fn new(member_path: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            member_path: member_path.into(),
            direction,
        }
    }

    pub fn asc(member_path: impl Into<String>) -> Self {
        Self::new(member_path, SortDirection::Asc)
    }

    pub fn desc(member_path: impl Into<String>) -> Self {
        Self::new(member_path, SortDirection::Desc)
    }
}

/// Zero-based page of a deterministically ordered result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paging {
    pub page_index: usize,
    pub page_size: usize,
}

impl Paging {
    pub fn new(page_index: usize, page_size: usize) -> Self {
        Self { page_index, page_size }
    }

    /// Inclusive, 1-based row-number window of this page.
    pub fn bounds(&self) -> (u64, u64) {
        let skip = (self.page_index as u64).saturating_mul(self.page_size as u64);
        let from = skip.saturating_add(1);
        let to = skip.saturating_add(self.page_size as u64);
        (from, to)
    }
}

/// Pulls the referenced document of another schema into each result row.
///
/// `id_reference_path` is the member holding the referenced identity;
/// the child's body is emitted under `object_reference_path`.
#[derive(Debug, Clone, PartialEq)]
pub struct IncludeSpec {
    pub id_reference_path: String,
    pub object_reference_path: String,
    pub child: Arc<SchemaModel>,
}

impl IncludeSpec {
    pub fn new(
        id_reference_path: impl Into<String>,
        object_reference_path: impl Into<String>,
        child: Arc<SchemaModel>,
    ) -> Self {
        Self {
            id_reference_path: id_reference_path.into(),
            object_reference_path: object_reference_path.into(),
            child,
        }
    }
}

/// Typed query against one schema: predicate, sortings, includes, paging and take.
#[derive(Debug, Clone)]
pub struct QueryCommand {
    schema: Arc<SchemaModel>,
    predicate: Option<Expr>,
    sortings: Vec<Sorting>,
    includes: Vec<IncludeSpec>,
    paging: Option<Paging>,
    take: Option<usize>,
}

impl QueryCommand {
    pub fn new(schema: Arc<SchemaModel>) -> Self {
        Self {
            schema,
            predicate: None,
            sortings: Vec::new(),
            includes: Vec::new(),
            paging: None,
            take: None,
        }
    }

    pub fn for_schema<T>(schema: &StructureSchema<T>) -> Self {
        Self::new(Arc::clone(schema.model()))
    }

    /// Add a predicate; repeated calls are combined with `and`.
    pub fn filter(mut self, predicate: Expr) -> Self {
        self.predicate = Some(match self.predicate.take() {
            Some(existing) => existing.and(predicate),
            None => predicate,
        });
        self
    }

    pub fn order_by(mut self, member_path: impl Into<String>) -> Self {
        self.sortings.push(Sorting::asc(member_path));
        self
    }

    pub fn order_by_desc(mut self, member_path: impl Into<String>) -> Self {
        self.sortings.push(Sorting::desc(member_path));
        self
    }

    pub fn sort(mut self, sorting: Sorting) -> Self {
        self.sortings.push(sorting);
        self
    }

    pub fn include(mut self, include: IncludeSpec) -> Self {
        self.includes.push(include);
        self
    }

    /// Include documents of `C` referenced through `id_reference_path`.
    pub fn include_document<C: Document>(
        self,
        child: &StructureSchema<C>,
        id_reference_path: impl Into<String>,
        object_reference_path: impl Into<String>,
    ) -> Self {
        let spec = IncludeSpec::new(
            id_reference_path,
            object_reference_path,
            Arc::clone(child.model()),
        );
        self.include(spec)
    }

    pub fn page(mut self, page_index: usize, page_size: usize) -> Self {
        self.paging = Some(Paging::new(page_index, page_size));
        self
    }

    pub fn take(mut self, count: usize) -> Self {
        self.take = Some(count);
        self
    }

    pub fn schema(&self) -> &Arc<SchemaModel> {
        &self.schema
    }

    pub fn predicate(&self) -> Option<&Expr> {
        self.predicate.as_ref()
    }

    pub fn sortings(&self) -> &[Sorting] {
        &self.sortings
    }

    pub fn includes(&self) -> &[IncludeSpec] {
        &self.includes
    }

    pub fn paging(&self) -> Option<Paging> {
        self.paging
    }

    pub fn take_count(&self) -> Option<usize> {
        self.take
    }

    pub fn has_predicate(&self) -> bool {
        self.predicate.is_some()
    }

    pub fn has_sortings(&self) -> bool {
        !self.sortings.is_empty()
    }

    pub fn has_includes(&self) -> bool {
        !self.includes.is_empty()
    }

    pub fn has_paging(&self) -> bool {
        self.paging.is_some()
    }

    pub fn has_take(&self) -> bool {
        self.take.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paging_bounds_are_one_based_and_inclusive() {
        assert_eq!(Paging::new(0, 10).bounds(), (1, 10));
        assert_eq!(Paging::new(1, 10).bounds(), (11, 20));
        assert_eq!(Paging::new(2, 5).bounds(), (11, 15));
    }
}
