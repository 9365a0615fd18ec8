//! ClosureExpander: replace reads of captured values with the values

use super::fold;
use crate::ast::{Expr, ExprRef};
use crate::error::NormalizeResult;
use crate::eval::Evaluate;
use crate::visitor::context::VisitContext;
use crate::visitor::{Visitor, VisitorModule};
use std::sync::Arc;

/// Expands member reads rooted at a constant (a captured closure value) or
/// at a static member. Expansion is best-effort: any evaluation failure
/// returns the node unchanged.
pub struct ClosureExpander {
    evaluator: Arc<dyn Evaluate>,
}

impl ClosureExpander {
    pub fn new(evaluator: Arc<dyn Evaluate>) -> Self {
        Self { evaluator }
    }
}

/// `c.a.b...` where `c` is a constant, or a static member chain
fn rooted_at_constant(node: &Expr) -> bool {
    match node {
        Expr::Member { target: None, .. } => true,
        Expr::Member {
            target: Some(target),
            ..
        } => target.is_constant() || rooted_at_constant(target),
        _ => false,
    }
}

impl VisitorModule for ClosureExpander {
    fn name(&self) -> &'static str {
        "closure_expander"
    }

    fn claims(&self, node: &Expr, _context: &VisitContext) -> bool {
        rooted_at_constant(node)
    }

    fn visit(&self, node: &ExprRef, visitor: &Visitor<'_>) -> NormalizeResult<ExprRef> {
        let Expr::Member { member, .. } = &**node else {
            return Ok(node.clone());
        };
        let reduced = visitor.visit_children(node)?;
        let receiver_ready = match &*reduced {
            Expr::Member { target, .. } => target.as_ref().map_or(true, |t| t.is_constant()),
            _ => false,
        };
        if !receiver_ready {
            return Ok(node.clone());
        }
        match self.evaluator.evaluate(&reduced) {
            Ok(value) => fold(value, member.member_type(), visitor),
            Err(err) => {
                visitor.report(&err, node);
                Ok(node.clone())
            }
        }
    }
}

#[cfg(test)]
#[path = "closure_expander_test.rs"]
mod tests;
