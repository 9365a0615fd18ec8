//! relq-algebra - Relational algebra IR
//!
//! Immutable value types describing a query in relational terms: scalars,
//! predicates over scalars, and relations composed from base relations,
//! joins, renames, selections, and projections. The join builders fold
//! accumulated join requests onto a main relation in insertion order.

pub mod builder;
pub mod error;
pub mod predicate;
pub mod relation;
pub mod scalar;
pub mod visitor;

pub use builder::{build_relation, JoinSpec, QueryBuilder, SourceRelationBuilder};
pub use error::{AlgebraError, AlgebraResult};
pub use predicate::Predicate;
pub use relation::{BaseRelation, Relation, RelationFunction};
pub use scalar::{ConstantValue, RelationAttribute, Scalar, ScalarFunction};
pub use visitor::AlgebraVisitor;
