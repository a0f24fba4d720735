use super::super::{LoweringContext, PredicateLowering};
use crate::core::Result;
use crate::query::Expr;

/// `and`, `or` and `not`; every connective is parenthesized.
pub struct LogicalLowering;

impl PredicateLowering for LogicalLowering {
    fn name(&self) -> &'static str {
        "LOGICAL"
    }

    fn can_lower(&self, expr: &Expr) -> bool {
        match expr {
            Expr::BinaryOp { op, .. } => op.is_logical(),
            Expr::Not { .. } => true,
            _ => false,
        }
    }

    fn lower(&self, expr: &Expr, context: &mut LoweringContext<'_>) -> Result<String> {
        match expr {
            Expr::BinaryOp { left, op, right } => {
                let left_sql = context.lower(left)?;
                let right_sql = context.lower(right)?;
                Ok(format!("({} {} {})", left_sql, op, right_sql))
            }
            Expr::Not { expr } => Ok(format!("not ({})", context.lower(expr)?)),
            _ => unreachable!(),
        }
    }
}
