//! Relational expressions - the nodes of the algebra tree

use crate::error::{AlgebraError, AlgebraResult};
use crate::predicate::Predicate;
use crate::scalar::{write_list, RelationAttribute, Scalar};
use crate::visitor::{collect_attributes, AlgebraVisitor, LeafCollector};
use relq_core::{FunctionName, RelationName};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A stored relation, identified by name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BaseRelation {
    name: RelationName,
}

impl BaseRelation {
    pub fn new(name: &str) -> AlgebraResult<Self> {
        let name =
            RelationName::try_new(name).ok_or(AlgebraError::EmptyName { kind: "relation" })?;
        Ok(Self { name })
    }

    pub fn name(&self) -> &RelationName {
        &self.name
    }
}

/// A relation produced by a table-valued function
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelationFunction {
    name: FunctionName,
    args: Vec<Scalar>,
}

impl RelationFunction {
    pub fn new(name: &str, args: Vec<Scalar>) -> AlgebraResult<Self> {
        let name =
            FunctionName::try_new(name).ok_or(AlgebraError::EmptyName { kind: "function" })?;
        Ok(Self { name, args })
    }

    pub fn name(&self) -> &FunctionName {
        &self.name
    }

    pub fn args(&self) -> &[Scalar] {
        &self.args
    }
}

/// Relational expression
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    /// Stored relation
    Base(BaseRelation),

    /// Table-valued function
    Function(RelationFunction),

    /// Inner join of two relations
    InnerJoin {
        /// Left input
        left: Box<Relation>,
        /// Right input
        right: Box<Relation>,
        /// Join condition
        predicate: Predicate,
    },

    /// The input under a new name
    Rename {
        /// Input relation
        input: Box<Relation>,
        /// New relation name
        name: RelationName,
    },

    /// Rows of the input satisfying a predicate
    Selection {
        /// Input relation
        input: Box<Relation>,
        /// Filter condition
        predicate: Predicate,
    },

    /// A subset of the input's attributes
    Projection {
        /// Input relation
        input: Box<Relation>,
        /// Projected attributes, in output order
        attributes: Vec<RelationAttribute>,
    },
}

impl Relation {
    /// Base relation `name`; fails on a blank name
    pub fn base(name: &str) -> AlgebraResult<Self> {
        BaseRelation::new(name).map(Self::Base)
    }

    /// Table-valued function `name(args)`; fails on a blank name
    pub fn function(name: &str, args: Vec<Scalar>) -> AlgebraResult<Self> {
        RelationFunction::new(name, args).map(Self::Function)
    }

    pub fn inner_join(left: Relation, right: Relation, predicate: Predicate) -> Self {
        Self::InnerJoin {
            left: Box::new(left),
            right: Box::new(right),
            predicate,
        }
    }

    /// `input` renamed to `name`; fails on a blank name
    pub fn rename(input: Relation, name: &str) -> AlgebraResult<Self> {
        let name =
            RelationName::try_new(name).ok_or(AlgebraError::EmptyName { kind: "relation" })?;
        Ok(Self::Rename {
            input: Box::new(input),
            name,
        })
    }

    pub fn selection(input: Relation, predicate: Predicate) -> Self {
        Self::Selection {
            input: Box::new(input),
            predicate,
        }
    }

    /// Projection of `input` onto `attributes`; an empty list is rejected
    pub fn projection(input: Relation, attributes: Vec<RelationAttribute>) -> AlgebraResult<Self> {
        if attributes.is_empty() {
            return Err(AlgebraError::MissingOperand {
                operand: "projection",
            });
        }
        Ok(Self::Projection {
            input: Box::new(input),
            attributes,
        })
    }

    /// The name attributes of this relation are qualified with, if it has one
    pub fn label(&self) -> Option<&str> {
        match self {
            Self::Base(base) => Some(base.name().as_str()),
            Self::Function(function) => Some(function.name().as_str()),
            Self::Rename { name, .. } => Some(name.as_str()),
            _ => None,
        }
    }

    /// Distinct base relations and relation functions this relation reads,
    /// in pre-order
    pub fn referenced_relations(&self) -> Vec<&Relation> {
        let mut collector = LeafCollector::default();
        collector.visit_relation(self);
        collector.into_found()
    }

    /// Distinct attributes used by predicates and projections in this tree
    pub fn attributes(&self) -> Vec<&RelationAttribute> {
        collect_attributes(|visitor| visitor.visit_relation(self))
    }

    pub fn accept<'ir, V: AlgebraVisitor<'ir> + ?Sized>(&'ir self, visitor: &mut V) {
        visitor.visit_relation(self);
    }
}

impl From<BaseRelation> for Relation {
    fn from(base: BaseRelation) -> Self {
        Self::Base(base)
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Base(base) => write!(f, "{}", base.name()),
            Self::Function(function) => {
                write!(f, "{}(", function.name())?;
                write_list(f, function.args())?;
                write!(f, ")")
            }
            Self::InnerJoin {
                left,
                right,
                predicate,
            } => write!(f, "({left} ⋈[{predicate}] {right})"),
            Self::Rename { input, name } => write!(f, "ρ[{name}]({input})"),
            Self::Selection { input, predicate } => write!(f, "σ[{predicate}]({input})"),
            Self::Projection { input, attributes } => {
                write!(f, "π[")?;
                write_list(f, attributes)?;
                write!(f, "]({input})")
            }
        }
    }
}

#[cfg(test)]
#[path = "relation_test.rs"]
mod tests;
