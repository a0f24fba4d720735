use super::super::{LoweringContext, PredicateLowering};
use crate::core::Result;
use crate::query::Expr;

pub struct IsNullLowering;

impl PredicateLowering for IsNullLowering {
    fn name(&self) -> &'static str {
        "IS_NULL"
    }

    fn can_lower(&self, expr: &Expr) -> bool {
        matches!(expr, Expr::IsNull { .. })
    }

    fn lower(&self, expr: &Expr, context: &mut LoweringContext<'_>) -> Result<String> {
        let Expr::IsNull { expr, negated } = expr else {
            unreachable!();
        };

        let operand = context.operand(expr, None)?;
        Ok(if *negated {
            format!("{} is not null", operand)
        } else {
            format!("{} is null", operand)
        })
    }
}
