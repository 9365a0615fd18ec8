//! Operator-family reducers
//!
//! A sequence-operator call over a materialized receiver is moved to the
//! immediate family and computed when every argument is a constant or a
//! closed lambda. A call over a deferred receiver is moved to the deferred
//! family. Any other receiver selects the family from its static type.

use super::fold;
use crate::ast::{Expr, ExprRef, Method, QueryType, Value};
use crate::error::{NormalizeError, NormalizeResult};
use crate::eval::{is_closed, Evaluate};
use crate::operators::{OperatorCatalog, OperatorFamily};
use crate::visitor::context::VisitContext;
use crate::visitor::{Visitor, VisitorModule};
use std::sync::Arc;

/// Shared reducer logic, parameterized by the family whose calls it claims
struct FamilyReducer {
    family: OperatorFamily,
    catalog: Arc<OperatorCatalog>,
    evaluator: Arc<dyn Evaluate>,
}

impl FamilyReducer {
    fn claims(&self, node: &Expr) -> bool {
        match node {
            Expr::Call { method, args, .. } => {
                method.family() == Some(self.family) && !args.is_empty()
            }
            _ => false,
        }
    }

    fn visit(&self, node: &ExprRef, visitor: &Visitor<'_>) -> NormalizeResult<ExprRef> {
        let Expr::Call {
            target,
            method,
            args,
            ..
        } = &**node
        else {
            return visitor.visit_children(node);
        };
        let Some((first, rest)) = args.split_first() else {
            return visitor.visit_children(node);
        };

        let target = match target {
            Some(t) => Some(visitor.visit(t)?),
            None => None,
        };
        let source = visitor.visit(first)?;
        let rest = rest
            .iter()
            .map(|a| visitor.visit(a))
            .collect::<NormalizeResult<Vec<_>>>()?;

        let family = match source.as_constant() {
            Some(value) if value.is_deferred() => OperatorFamily::Deferred,
            Some(_) => OperatorFamily::Immediate,
            None => OperatorFamily::of_type(source.ty()),
        };
        let resolved = match self.catalog.equivalent(method, family) {
            Ok(resolved) => resolved,
            // Immediate-only operators materialize a deferred receiver themselves.
            Err(NormalizeError::MissingEquivalent { .. })
                if family == OperatorFamily::Deferred && is_immediate_only(method) =>
            {
                method.clone()
            }
            Err(err) => return Err(err),
        };

        if resolved.family() == Some(OperatorFamily::Immediate) {
            if let Some(receiver) = source.as_constant() {
                if let Some(values) = self.compile_args(&rest, visitor) {
                    let mut all = Vec::with_capacity(values.len() + 1);
                    all.push(receiver.clone());
                    all.extend(values);
                    let receiver_value = target.as_ref().and_then(|t| t.as_constant());
                    match resolved.invoke(receiver_value, &all, self.evaluator.as_ref()) {
                        Ok(result) => {
                            let ty = result_type(&resolved, &source, &rest);
                            return fold(result, &ty, visitor);
                        }
                        Err(err) => visitor.report(&err, node),
                    }
                }
            }
        }

        let mut new_args = Vec::with_capacity(args.len());
        new_args.push(source);
        new_args.extend(rest);
        Ok(rebuild(node, &resolved, target, new_args))
    }

    /// Argument values when every argument is a constant or a closed lambda
    fn compile_args(&self, args: &[ExprRef], visitor: &Visitor<'_>) -> Option<Vec<Value>> {
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            match &**arg {
                Expr::Constant { value, .. } => values.push(value.clone()),
                Expr::Lambda { .. } if is_closed(arg) => match self.evaluator.evaluate(arg) {
                    Ok(value) => values.push(value),
                    Err(err) => {
                        visitor.report(&err, arg);
                        return None;
                    }
                },
                _ => return None,
            }
        }
        Some(values)
    }
}

fn is_immediate_only(method: &Method) -> bool {
    method
        .signature()
        .is_some_and(|sig| sig.operator.is_immediate_only())
}

fn result_type(method: &Method, source: &ExprRef, rest: &[ExprRef]) -> QueryType {
    let types: Vec<&QueryType> = std::iter::once(source)
        .chain(rest)
        .map(|e| e.ty())
        .collect();
    method.result_type(&types)
}

/// The call over `method` and the given children, or `node` itself when
/// nothing changed
fn rebuild(
    node: &ExprRef,
    method: &Arc<Method>,
    target: Option<ExprRef>,
    args: Vec<ExprRef>,
) -> ExprRef {
    if let Expr::Call {
        target: old_target,
        method: old_method,
        args: old_args,
        ..
    } = &**node
    {
        let same_target = match (old_target, &target) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        let same_args = old_args.len() == args.len()
            && old_args.iter().zip(&args).all(|(a, b)| Arc::ptr_eq(a, b));
        if same_target && same_args && Arc::ptr_eq(old_method, method) {
            return node.clone();
        }
    }
    Expr::call(target, method.clone(), args)
}

/// Reduces deferred-family (`Queryable`) operator calls
pub struct QueryableMethodsReducer {
    inner: FamilyReducer,
}

impl QueryableMethodsReducer {
    pub fn new(catalog: Arc<OperatorCatalog>, evaluator: Arc<dyn Evaluate>) -> Self {
        Self {
            inner: FamilyReducer {
                family: OperatorFamily::Deferred,
                catalog,
                evaluator,
            },
        }
    }
}

impl VisitorModule for QueryableMethodsReducer {
    fn name(&self) -> &'static str {
        "queryable_methods_reducer"
    }

    fn claims(&self, node: &Expr, _context: &VisitContext) -> bool {
        self.inner.claims(node)
    }

    fn visit(&self, node: &ExprRef, visitor: &Visitor<'_>) -> NormalizeResult<ExprRef> {
        self.inner.visit(node, visitor)
    }
}

/// Reduces immediate-family (`Enumerable`) operator calls
pub struct EnumerableMethodsReducer {
    inner: FamilyReducer,
}

impl EnumerableMethodsReducer {
    pub fn new(catalog: Arc<OperatorCatalog>, evaluator: Arc<dyn Evaluate>) -> Self {
        Self {
            inner: FamilyReducer {
                family: OperatorFamily::Immediate,
                catalog,
                evaluator,
            },
        }
    }
}

impl VisitorModule for EnumerableMethodsReducer {
    fn name(&self) -> &'static str {
        "enumerable_methods_reducer"
    }

    fn claims(&self, node: &Expr, _context: &VisitContext) -> bool {
        self.inner.claims(node)
    }

    fn visit(&self, node: &ExprRef, visitor: &Visitor<'_>) -> NormalizeResult<ExprRef> {
        self.inner.visit(node, visitor)
    }
}

#[cfg(test)]
#[path = "methods_reducer_test.rs"]
mod tests;
