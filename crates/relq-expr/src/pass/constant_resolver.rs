//! QueryableConstantResolver: inline or materialize deferred-source constants

use crate::ast::{Expr, ExprRef, QueryType, Value};
use crate::error::{EvalError, NormalizeError, NormalizeResult};
use crate::source::same_provider;
use crate::visitor::context::{VisitContext, PROVIDER};
use crate::visitor::{Visitor, VisitorModule};

/// Resolves constants wrapping a deferred query source against the provider
/// driving the compilation.
///
/// A source of the same provider is replaced by its own AST (normalized),
/// unless that AST is a raw constant, which marks a leaf repository. A
/// source of any other provider is executed through its own provider and
/// replaced by the materialized sequence.
#[derive(Debug, Default, Clone, Copy)]
pub struct QueryableConstantResolver;

impl VisitorModule for QueryableConstantResolver {
    fn name(&self) -> &'static str {
        "queryable_constant_resolver"
    }

    fn claims(&self, node: &Expr, _context: &VisitContext) -> bool {
        matches!(node.as_constant(), Some(Value::Query(_)))
    }

    fn visit(&self, node: &ExprRef, visitor: &Visitor<'_>) -> NormalizeResult<ExprRef> {
        let Some(Value::Query(source)) = node.as_constant() else {
            return Ok(node.clone());
        };
        let current = match visitor.context().get(&PROVIDER) {
            Ok(provider) => provider,
            Err(crate::error::ContextError::Missing { .. }) => {
                return Err(NormalizeError::MissingProvider)
            }
            Err(err) => return Err(err.into()),
        };

        if same_provider(source.provider(), current) {
            if source.expression().is_constant() {
                return Ok(node.clone());
            }
            return visitor.visit(source.expression());
        }

        let provider = source.provider();
        log::debug!(
            "Materializing source of provider '{}' under '{}'",
            provider.name(),
            current.name()
        );
        let execution_error = |err: EvalError| NormalizeError::Execution {
            provider: provider.name().to_string(),
            source: err,
        };
        match provider.execute(source.expression()) {
            Ok(value @ Value::Sequence(_)) => Ok(Expr::constant(
                value,
                QueryType::sequence(source.element_type().clone()),
            )),
            Ok(other) => Err(execution_error(EvalError::TypeMismatch {
                expected: "sequence".to_string(),
                found: other.kind_name().to_string(),
            })),
            Err(err) => Err(execution_error(err)),
        }
    }
}
