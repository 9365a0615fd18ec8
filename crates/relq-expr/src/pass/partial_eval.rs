//! PartialEvaluator: fold side-effect-free subtrees into constants

use super::fold;
use crate::ast::{Expr, ExprRef, Value};
use crate::error::NormalizeResult;
use crate::eval::Evaluate;
use crate::visitor::context::VisitContext;
use crate::visitor::{Visitor, VisitorModule};
use std::sync::Arc;

/// Folds member reads, host method calls and pure operators whose inputs
/// all reduce to constants.
///
/// Sequence-operator calls are left to the family reducers. Evaluation
/// failures leave the (partially rewritten) subtree symbolic.
pub struct PartialEvaluator {
    evaluator: Arc<dyn Evaluate>,
}

impl PartialEvaluator {
    pub fn new(evaluator: Arc<dyn Evaluate>) -> Self {
        Self { evaluator }
    }
}

impl VisitorModule for PartialEvaluator {
    fn name(&self) -> &'static str {
        "partial_evaluator"
    }

    fn claims(&self, node: &Expr, _context: &VisitContext) -> bool {
        match node {
            Expr::Call { method, .. } => method.signature().is_none(),
            Expr::Member { .. }
            | Expr::Unary { .. }
            | Expr::Binary { .. }
            | Expr::Conditional { .. }
            | Expr::TypeIs { .. }
            | Expr::New { .. }
            | Expr::NewArray { .. }
            | Expr::Invoke { .. } => true,
            _ => false,
        }
    }

    fn visit(&self, node: &ExprRef, visitor: &Visitor<'_>) -> NormalizeResult<ExprRef> {
        if let Expr::Conditional {
            test,
            if_true,
            if_false,
            ..
        } = &**node
        {
            let test = visitor.visit(test)?;
            return match test.as_constant() {
                Some(Value::Bool(true)) => visitor.visit(if_true),
                Some(Value::Bool(false)) => visitor.visit(if_false),
                _ => {
                    let branches = [visitor.visit(if_true)?, visitor.visit(if_false)?];
                    let unchanged = Arc::ptr_eq(&test, &node.children()[0])
                        && Arc::ptr_eq(&branches[0], if_true)
                        && Arc::ptr_eq(&branches[1], if_false);
                    if unchanged {
                        Ok(node.clone())
                    } else {
                        let [t, f] = branches;
                        Ok(Expr::conditional(test, t, f))
                    }
                }
            };
        }

        let reduced = visitor.visit_children(node)?;
        if !reduced.children().iter().all(|c| c.is_constant()) {
            return Ok(reduced);
        }
        match self.evaluator.evaluate(&reduced) {
            Ok(value) => fold(value, node.ty(), visitor),
            Err(err) => {
                visitor.report(&err, &reduced);
                Ok(reduced)
            }
        }
    }
}

#[cfg(test)]
#[path = "partial_eval_test.rs"]
mod tests;
