use super::super::{LoweringContext, PredicateLowering};
use crate::core::{DataType, DbError, Result, Value};
use crate::query::Expr;

pub struct LikeLowering;

impl PredicateLowering for LikeLowering {
    fn name(&self) -> &'static str {
        "LIKE"
    }

    fn can_lower(&self, expr: &Expr) -> bool {
        matches!(expr, Expr::Like { .. })
    }

    fn lower(&self, expr: &Expr, context: &mut LoweringContext<'_>) -> Result<String> {
        let Expr::Like {
            expr,
            pattern,
            negated,
        } = expr
        else {
            unreachable!();
        };

        if let Some(data_type) = context.operand_type(expr)? {
            if data_type != DataType::Text {
                return Err(DbError::TypeMismatch(format!(
                    "pattern matching needs a text member, got {} in '{}'",
                    data_type,
                    context.schema().name()
                )));
            }
        }

        let operand = context.operand(expr, None)?;
        let param = context.bind(Value::Text(pattern.clone()));
        let keyword = if *negated { "not like" } else { "like" };

        Ok(format!("{} {} {}", operand, keyword, param))
    }
}
