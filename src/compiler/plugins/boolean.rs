use super::super::{LoweringContext, PredicateLowering};
use crate::core::{DataType, DbError, Result, Value};
use crate::query::Expr;

/// Bare boolean members and boolean constants in predicate position.
pub struct BooleanLowering;

impl PredicateLowering for BooleanLowering {
    fn name(&self) -> &'static str {
        "BOOLEAN"
    }

    fn can_lower(&self, expr: &Expr) -> bool {
        matches!(expr, Expr::Member(_) | Expr::Constant(Value::Boolean(_)))
    }

    fn lower(&self, expr: &Expr, context: &mut LoweringContext<'_>) -> Result<String> {
        match expr {
            Expr::Constant(Value::Boolean(true)) => Ok("1 = 1".to_string()),
            Expr::Constant(Value::Boolean(false)) => Ok("1 = 0".to_string()),
            Expr::Member(path) => {
                let data_type = context.member_type(path)?;
                if data_type != DataType::Boolean {
                    return Err(DbError::TypeMismatch(format!(
                        "member '{}' of '{}' is {} and cannot be used as a condition",
                        path,
                        context.schema().name(),
                        data_type
                    )));
                }
                let column = context.member_column(path)?;
                let param = context.bind(Value::Boolean(true));
                Ok(format!("{} = {}", column, param))
            }
            _ => unreachable!(),
        }
    }
}
