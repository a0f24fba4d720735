use log::debug;
use crate::core::{DataType, DbError, Result, Value};
use crate::query::Expr;
use crate::schema::{STRUCTURE_ID_COLUMN, SchemaModel};
use crate::sql::{SqlDialect, SqlParam};
use super::joins::{MAIN_ALIAS, MemberJoins};
use super::plugins;

/// Lowers one family of predicate nodes to SQL criteria text.
pub trait PredicateLowering: Send + Sync {
    fn name(&self) -> &'static str;

    fn can_lower(&self, expr: &Expr) -> bool;

    fn lower(&self, expr: &Expr, context: &mut LoweringContext<'_>) -> Result<String>;
}

/// State shared while one predicate tree is lowered.
pub struct LoweringContext<'a> {
    schema: &'a SchemaModel,
    dialect: SqlDialect,
    registry: &'a LoweringRegistry,
    joins: &'a mut MemberJoins,
    params: Vec<SqlParam>,
}

impl<'a> LoweringContext<'a> {
    pub fn new(
        schema: &'a SchemaModel,
        dialect: SqlDialect,
        registry: &'a LoweringRegistry,
        joins: &'a mut MemberJoins,
    ) -> Self {
        Self {
            schema,
            dialect,
            registry,
            joins,
            params: Vec::new(),
        }
    }

    pub fn schema(&self) -> &SchemaModel {
        self.schema
    }

    /// Lower a node in predicate position through the matching plugin.
    pub fn lower(&mut self, expr: &Expr) -> Result<String> {
        let registry = self.registry;
        match registry.find_lowering(expr) {
            Some(lowering) => lowering.lower(expr, self),
            None => Err(DbError::ContractViolation(format!(
                "no lowering for predicate node in schema '{}'",
                self.schema.name()
            ))),
        }
    }

    /// Lower a node in value position: a member column or a bound constant.
    ///
    /// Constants are coerced to `expected` when the other side of the
    /// comparison is a member.
    pub fn operand(&mut self, expr: &Expr, expected: Option<DataType>) -> Result<String> {
        match expr {
            Expr::Member(path) => self.member_column(path),
            Expr::Constant(value) => {
                let value = self.coerce(value, expected)?;
                Ok(self.bind(value))
            }
            _ => Err(DbError::ContractViolation(format!(
                "predicate on '{}' uses a condition where a member or constant is expected",
                self.schema.name()
            ))),
        }
    }

    /// Declared data type of a member operand; constants have none.
    pub fn operand_type(&self, expr: &Expr) -> Result<Option<DataType>> {
        match expr {
            Expr::Member(path) => self.member_type(path).map(Some),
            _ => Ok(None),
        }
    }

    pub fn member_type(&self, path: &str) -> Result<DataType> {
        if self.schema.is_id_member(path) {
            return Ok(self.schema.id_type().data_type());
        }
        self.schema
            .find_member(path)
            .map(|member| member.data_type)
            .ok_or_else(|| DbError::MemberNotFound(path.to_string(), self.schema.name().to_string()))
    }

    /// Column reference for a member; the identity never needs a join.
    pub fn member_column(&mut self, path: &str) -> Result<String> {
        let schema = self.schema;
        if schema.is_id_member(path) {
            return Ok(self.dialect.column(MAIN_ALIAS, STRUCTURE_ID_COLUMN));
        }
        let member = schema
            .find_member(path)
            .ok_or_else(|| DbError::MemberNotFound(path.to_string(), schema.name().to_string()))?;
        let alias = self.joins.alias_for(&member.member_path);
        Ok(self.dialect.column(alias, &member.column_name))
    }

    pub fn coerce(&self, value: &Value, expected: Option<DataType>) -> Result<Value> {
        match expected {
            None => Ok(value.clone()),
            Some(data_type) => value.coerce_to(data_type).ok_or_else(|| {
                DbError::TypeMismatch(format!(
                    "{} constant cannot be compared with a {} member of '{}'",
                    value.type_name(),
                    data_type,
                    self.schema.name()
                ))
            }),
        }
    }

    /// Bind `value` as the next `@pN` parameter and return its name.
    pub fn bind(&mut self, value: Value) -> String {
        let name = self.dialect.param_name(&format!("p{}", self.params.len()));
        self.params.push(SqlParam::new(name.clone(), value));
        name
    }

    pub fn into_params(self) -> Vec<SqlParam> {
        self.params
    }
}

/// Predicate lowering plugins, tried in registration order.
pub struct LoweringRegistry {
    lowerings: Vec<Box<dyn PredicateLowering>>,
}

impl LoweringRegistry {
    pub fn new() -> Self {
        Self {
            lowerings: Vec::new(),
        }
    }

    pub fn register(&mut self, lowering: Box<dyn PredicateLowering>) {
        debug!("Registered predicate lowering: {}", lowering.name());
        self.lowerings.push(lowering);
    }

    pub fn with_default_lowerings() -> Self {
        use plugins::*;

        let mut registry = Self::new();

        registry.register(Box::new(boolean::BooleanLowering));
        registry.register(Box::new(comparison::ComparisonLowering));
        registry.register(Box::new(logical::LogicalLowering));
        registry.register(Box::new(like::LikeLowering));
        registry.register(Box::new(in_list::InListLowering));
        registry.register(Box::new(is_null::IsNullLowering));

        registry
    }

    fn find_lowering(&self, expr: &Expr) -> Option<&dyn PredicateLowering> {
        self.lowerings
            .iter()
            .find(|lowering| lowering.can_lower(expr))
            .map(|boxed| &**boxed)
    }
}

impl Default for LoweringRegistry {
    fn default() -> Self {
        Self::with_default_lowerings()
    }
}
