//! relq-expr: query expression trees and their normalization
//!
//! This crate provides the query AST node model, a tree-walking evaluator,
//! the deferred/immediate sequence operator catalog, a composite visitor
//! framework, and the normalization pipeline built from five rewrite passes.

pub mod ast;
pub(crate) mod error;
pub mod eval;
pub mod operators;
pub mod pass;
pub mod pipeline;
pub mod source;
pub mod visitor;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;

pub use ast::{
    BinaryOp, Expr, ExprKind, ExprRef, Member, Method, ParamKind, Parameter, QueryType, Record,
    ReturnKind, UnaryOp, Value,
};
pub use error::{ContextError, EvalError, EvalResult, NormalizeError, NormalizeResult};
pub use eval::{Bindings, Callable, Evaluate, Interpreter};
pub use operators::{sequence_call, OperatorCatalog, OperatorFamily, SequenceOperator};
pub use pass::{
    ClosureExpander, EnumerableMethodsReducer, PartialEvaluator, QueryableConstantResolver,
    QueryableMethodsReducer,
};
pub use pipeline::{normalize, Normalizer};
pub use source::{same_provider, InMemoryProvider, ProviderRef, Query, QueryProvider, QuerySource};
pub use visitor::context::{ContextKey, DiagnosticHook, VisitContext, DIAGNOSTICS, PROVIDER};
pub use visitor::{ChildVisitor, Composition, Visitor, VisitorModule};
