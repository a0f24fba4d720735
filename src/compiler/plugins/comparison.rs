use super::super::{LoweringContext, PredicateLowering};
use crate::core::{DbError, Result, Value};
use crate::query::{BinaryOp, Expr};

pub struct ComparisonLowering;

impl PredicateLowering for ComparisonLowering {
    fn name(&self) -> &'static str {
        "COMPARISON"
    }

    fn can_lower(&self, expr: &Expr) -> bool {
        matches!(expr, Expr::BinaryOp { op, .. } if op.is_comparison())
    }

    fn lower(&self, expr: &Expr, context: &mut LoweringContext<'_>) -> Result<String> {
        let Expr::BinaryOp { left, op, right } = expr else {
            unreachable!();
        };

        // `x = null` never matches in SQL; it means `is null` here.
        match (left.as_ref(), right.as_ref()) {
            (other, Expr::Constant(Value::Null)) | (Expr::Constant(Value::Null), other) => {
                let operand = context.operand(other, None)?;
                return match op {
                    BinaryOp::Eq => Ok(format!("{} is null", operand)),
                    BinaryOp::NotEq => Ok(format!("{} is not null", operand)),
                    _ => Err(DbError::ContractViolation(format!(
                        "null can only be compared with = or <> in '{}'",
                        context.schema().name()
                    ))),
                };
            }
            _ => {}
        }

        let left_expected = context.operand_type(right)?;
        let right_expected = context.operand_type(left)?;
        let left_sql = context.operand(left, left_expected)?;
        let right_sql = context.operand(right, right_expected)?;

        Ok(format!("{} {} {}", left_sql, op, right_sql))
    }
}
