use crate::core::{DbError, Result};
use crate::sql::{PagingStrategy, SqlDialect};
use crate::structure::BuildStrategy;

/// Store configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Dialect of generated SQL
    pub dialect: SqlDialect,

    /// Paging strategy; the dialect's own when unset
    pub paging_strategy: Option<PagingStrategy>,

    /// How batches of items are turned into structures
    pub build_strategy: BuildStrategy,

    /// Upsert the structure set before each operation touching it
    pub upsert_schemas: bool,
}

impl StoreConfig {
    pub fn new(dialect: SqlDialect) -> Self {
        Self {
            dialect,
            paging_strategy: None,
            build_strategy: BuildStrategy::default(),
            upsert_schemas: true,
        }
    }

    pub fn dialect(mut self, dialect: SqlDialect) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn paging_strategy(mut self, strategy: PagingStrategy) -> Self {
        self.paging_strategy = Some(strategy);
        self
    }

    pub fn build_strategy(mut self, strategy: BuildStrategy) -> Self {
        self.build_strategy = strategy;
        self
    }

    pub fn upsert_schemas(mut self, enabled: bool) -> Self {
        self.upsert_schemas = enabled;
        self
    }

    pub fn effective_paging_strategy(&self) -> PagingStrategy {
        self.paging_strategy
            .unwrap_or_else(|| self.dialect.paging_strategy())
    }

    pub fn validate(&self) -> Result<()> {
        match self.build_strategy {
            BuildStrategy::Parallel { workers: 0 } => Err(DbError::ContractViolation(
                "parallel build needs at least one worker".to_string(),
            )),
            BuildStrategy::Auto { threshold: 0 } => Err(DbError::ContractViolation(
                "auto build threshold must be positive".to_string(),
            )),
            _ => Ok(()),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new(SqlDialect::default())
    }
}
