//! Normalization passes, each a module of the composite visitor
//!
//! Registered by [`crate::pipeline::Normalizer`] in this order:
//! partial evaluation, deferred-source resolution, deferred operator
//! reduction, immediate operator reduction, closure expansion.

mod closure_expander;
mod constant_resolver;
mod methods_reducer;
mod partial_eval;

pub use closure_expander::ClosureExpander;
pub use constant_resolver::QueryableConstantResolver;
pub use methods_reducer::{EnumerableMethodsReducer, QueryableMethodsReducer};
pub use partial_eval::PartialEvaluator;

use crate::ast::{Expr, ExprRef, QueryType, Value};
use crate::error::NormalizeResult;
use crate::visitor::Visitor;

/// Wrap an evaluated value as a constant of `ty`.
///
/// Deferred sources are dispatched again so the resolver sees them in the
/// same run.
fn fold(value: Value, ty: &QueryType, visitor: &Visitor<'_>) -> NormalizeResult<ExprRef> {
    let deferred = value.is_deferred();
    let constant = Expr::constant(value, ty.clone());
    if deferred {
        visitor.visit(&constant)
    } else {
        Ok(constant)
    }
}
