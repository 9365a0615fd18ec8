//! Error types for relq-expr

use crate::ast::ExprKind;
use crate::operators::OperatorFamily;
use thiserror::Error;

/// Fatal normalization error.
///
/// A normalization run either returns a fully normalized tree or one of these.
/// Best-effort evaluation failures never surface here; see [`EvalError`].
#[derive(Error, Debug)]
pub enum NormalizeError {
    /// NE001: No registered module claims a node kind (pipeline wiring bug)
    #[error("[NE001] No visitor module claims {kind} node")]
    NoHandler { kind: ExprKind },

    /// NE002: A pass that needs the driving provider ran without one
    #[error("[NE002] No query provider in visit context")]
    MissingProvider,

    /// NE003: Visit context lookup or extension failed
    #[error("[NE003] Visit context error: {0}")]
    Context(#[from] ContextError),

    /// NE004: An operator has no sibling in the requested family
    #[error("[NE004] Operator '{operator}' with {arity} argument(s) has no {family} equivalent")]
    MissingEquivalent {
        operator: String,
        arity: usize,
        family: OperatorFamily,
    },

    /// NE005: Expression nesting exceeded the configured depth limit
    #[error("[NE005] Expression nesting exceeds the depth limit of {limit}")]
    DepthExceeded { limit: usize },

    /// NE006: A foreign provider failed to materialize its source
    #[error("[NE006] Provider '{provider}' failed to execute query: {source}")]
    Execution { provider: String, source: EvalError },

    /// NE007: Operator is not registered in the catalog
    #[error("[NE007] Operator '{operator}' with {arity} argument(s) is not registered for the {family} family")]
    UnknownOperator {
        operator: String,
        arity: usize,
        family: OperatorFamily,
    },

    /// NE008: Core error propagation
    #[error("[NE008] Core error: {0}")]
    Core(#[from] relq_core::CoreError),
}

/// Result type alias for NormalizeError
pub type NormalizeResult<T> = Result<T, NormalizeError>;

/// Failure of the "evaluate this sub-tree to a value" capability.
///
/// Passes treat these as "could not reduce": the affected subtree is left
/// symbolic and the error is handed to the diagnostic hook, if any.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    /// EV001: Reading a property or field failed
    #[error("[EV001] Failed to read member '{member}': {message}")]
    MemberRead { member: String, message: String },

    /// EV002: A method or operator body failed
    #[error("[EV002] Invocation of '{method}' failed: {message}")]
    Invocation { method: String, message: String },

    /// EV003: A value had the wrong runtime shape
    #[error("[EV003] Type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    /// EV004: A lambda parameter was referenced outside its binding scope
    #[error("[EV004] Parameter '{name}' is not bound")]
    UnboundParameter { name: String },

    /// EV005: Invocation target is not a function value
    #[error("[EV005] Value is not callable: {found}")]
    NotCallable { found: String },

    /// EV006: Evaluation recursed past the interpreter's depth limit
    #[error("[EV006] Evaluation exceeds the depth limit of {limit}")]
    DepthExceeded { limit: usize },

    /// EV007: A provider could not execute a query
    #[error("[EV007] Query execution failed: {0}")]
    Execution(String),
}

/// Result type alias for EvalError
pub type EvalResult<T> = Result<T, EvalError>;

/// Visit context lookup and extension failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContextError {
    /// CX001: Key was never added
    #[error("[CX001] Context key '{key}' is not present")]
    Missing { key: &'static str },

    /// CX002: Key is present but holds a value of another type
    #[error("[CX002] Context key '{key}' holds a value that is not a {expected}")]
    WrongType {
        key: &'static str,
        expected: &'static str,
    },

    /// CX003: Key was already added; contexts never shadow
    #[error("[CX003] Context key '{key}' is already present")]
    DuplicateKey { key: &'static str },
}
