use super::super::{LoweringContext, PredicateLowering};
use crate::core::Result;
use crate::query::Expr;

pub struct InListLowering;

impl PredicateLowering for InListLowering {
    fn name(&self) -> &'static str {
        "IN_LIST"
    }

    fn can_lower(&self, expr: &Expr) -> bool {
        matches!(expr, Expr::In { .. })
    }

    fn lower(&self, expr: &Expr, context: &mut LoweringContext<'_>) -> Result<String> {
        let Expr::In {
            expr,
            list,
            negated,
        } = expr
        else {
            unreachable!();
        };

        // An empty list matches nothing, so its negation matches everything.
        if list.is_empty() {
            return Ok(if *negated { "1 = 1" } else { "1 = 0" }.to_string());
        }

        let expected = context.operand_type(expr)?;
        let operand = context.operand(expr, None)?;
        let mut params = Vec::with_capacity(list.len());
        for value in list {
            let value = context.coerce(value, expected)?;
            params.push(context.bind(value));
        }
        let keyword = if *negated { "not in" } else { "in" };

        Ok(format!("{} {} ({})", operand, keyword, params.join(", ")))
    }
}
