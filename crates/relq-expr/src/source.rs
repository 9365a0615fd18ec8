//! Deferred query sources and the providers that own them

use crate::ast::{Expr, ExprRef, QueryType, Value};
use crate::error::{EvalError, EvalResult};
use crate::eval::{Evaluate, Interpreter};
use crate::pipeline::Normalizer;
use relq_core::NormalizeConfig;
use std::sync::Arc;

/// Executes query ASTs it owns
pub trait QueryProvider: Send + Sync + std::fmt::Debug {
    /// Provider name, used in diagnostics
    fn name(&self) -> &str;

    /// Execute `expression` and return its materialized result
    fn execute(&self, expression: &ExprRef) -> EvalResult<Value>;
}

/// Shared provider handle. Provider identity is the allocation.
pub type ProviderRef = Arc<dyn QueryProvider>;

/// Returns true if both handles point to the same provider
pub fn same_provider(a: &ProviderRef, b: &ProviderRef) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

/// A deferred sequence: an owning provider plus the AST that produces it
pub trait QuerySource: Send + Sync + std::fmt::Debug {
    fn provider(&self) -> &ProviderRef;

    /// The source's own AST. A constant here marks a leaf repository.
    fn expression(&self) -> &ExprRef;

    fn element_type(&self) -> &QueryType;
}

/// Standard deferred query source
#[derive(Debug, Clone)]
pub struct Query {
    provider: ProviderRef,
    expression: ExprRef,
    element_type: QueryType,
}

impl Query {
    pub fn new(provider: ProviderRef, expression: ExprRef, element_type: QueryType) -> Self {
        Self {
            provider,
            expression,
            element_type,
        }
    }

    /// A leaf repository over `items`; its own AST is the raw sequence constant
    pub fn leaf(provider: ProviderRef, element_type: QueryType, items: Vec<Value>) -> Self {
        let expression = Expr::constant(
            Value::sequence(items),
            QueryType::sequence(element_type.clone()),
        );
        Self::new(provider, expression, element_type)
    }

    /// Wrap as a runtime value
    pub fn into_value(self) -> Value {
        Value::Query(Arc::new(self))
    }

    /// Wrap as a constant node typed `Queryable<element>`
    pub fn constant(self) -> ExprRef {
        let ty = QueryType::queryable(self.element_type.clone());
        Expr::constant(self.into_value(), ty)
    }
}

impl QuerySource for Query {
    fn provider(&self) -> &ProviderRef {
        &self.provider
    }

    fn expression(&self) -> &ExprRef {
        &self.expression
    }

    fn element_type(&self) -> &QueryType {
        &self.element_type
    }
}

/// Provider over in-memory repositories.
///
/// Execution normalizes the query under a detached provider identity, so
/// every source it references is materialized through its own provider and
/// every operator is computed by the immediate family, then evaluates
/// what remains. Both steps honour the provider's [`NormalizeConfig`].
pub struct InMemoryProvider {
    name: String,
    max_depth: usize,
    normalizer: Normalizer,
}

impl InMemoryProvider {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_config(name, &NormalizeConfig::default())
    }

    /// A provider whose executions use the depth limit and passes of `config`
    pub fn with_config(name: impl Into<String>, config: &NormalizeConfig) -> Self {
        Self {
            name: name.into(),
            max_depth: config.max_depth,
            normalizer: Normalizer::from_config(config),
        }
    }

    /// A new provider behind a shared handle
    pub fn shared(name: impl Into<String>) -> ProviderRef {
        Arc::new(Self::new(name))
    }

    pub fn shared_with_config(name: impl Into<String>, config: &NormalizeConfig) -> ProviderRef {
        Arc::new(Self::with_config(name, config))
    }
}

impl std::fmt::Debug for InMemoryProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryProvider")
            .field("name", &self.name)
            .field("max_depth", &self.max_depth)
            .field("modules", &self.normalizer.composition().module_names())
            .finish()
    }
}

impl QueryProvider for InMemoryProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn execute(&self, expression: &ExprRef) -> EvalResult<Value> {
        let detached: ProviderRef = Arc::new(Detached {
            name: format!("{}:detached", self.name),
        });
        let normalized = self
            .normalizer
            .normalize(expression, &detached)
            .map_err(|e| EvalError::Execution(e.to_string()))?;
        match Interpreter::with_max_depth(self.max_depth).evaluate(&normalized)? {
            Value::Query(source) => Err(EvalError::Execution(format!(
                "query over provider '{}' did not materialize",
                source.provider().name()
            ))),
            value => Ok(value),
        }
    }
}

/// Identity no source belongs to; it never executes anything itself
#[derive(Debug)]
struct Detached {
    name: String,
}

impl QueryProvider for Detached {
    fn name(&self) -> &str {
        &self.name
    }

    fn execute(&self, _expression: &ExprRef) -> EvalResult<Value> {
        Err(EvalError::Execution(format!(
            "provider '{}' owns no sources",
            self.name
        )))
    }
}

/// A leaf repository of `provider` as a constant node
pub fn repository(provider: &ProviderRef, element_type: QueryType, items: Vec<Value>) -> ExprRef {
    Query::leaf(provider.clone(), element_type, items).constant()
}
