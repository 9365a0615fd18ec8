//! Scalar terms: constants, relation attributes, and scalar functions

use crate::error::{AlgebraError, AlgebraResult};
use crate::relation::Relation;
use relq_core::{AttributeName, FunctionName};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// A constant value in the IR.
///
/// Floats compare and hash by bit pattern so that `Eq` and `Hash` stay
/// consistent (`NaN == NaN`, `0.0 != -0.0`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstantValue {
    /// Null constant
    Null,
    /// Boolean constant
    Bool(bool),
    /// Integer constant
    Int(i64),
    /// Float constant
    Float(f64),
    /// String constant
    String(String),
}

impl PartialEq for ConstantValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::String(a), Self::String(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for ConstantValue {}

impl Hash for ConstantValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::Null => {}
            Self::Bool(b) => b.hash(state),
            Self::Int(i) => i.hash(state),
            Self::Float(x) => x.to_bits().hash(state),
            Self::String(s) => s.hash(state),
        }
    }
}

impl fmt::Display for ConstantValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x:?}"),
            Self::String(s) => write!(f, "'{}'", s.replace('\'', "''")),
        }
    }
}

impl From<bool> for ConstantValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for ConstantValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for ConstantValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for ConstantValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for ConstantValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

/// An attribute of a specific relation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelationAttribute {
    name: AttributeName,
    relation: Box<Relation>,
}

impl RelationAttribute {
    /// Attribute `name` owned by `relation`; fails on a blank name
    pub fn new(name: &str, relation: &Relation) -> AlgebraResult<Self> {
        let name =
            AttributeName::try_new(name).ok_or(AlgebraError::EmptyName { kind: "attribute" })?;
        Ok(Self::from_name(name, relation))
    }

    pub fn from_name(name: AttributeName, relation: &Relation) -> Self {
        Self {
            name,
            relation: Box::new(relation.clone()),
        }
    }

    pub fn name(&self) -> &AttributeName {
        &self.name
    }

    /// The relation this attribute belongs to
    pub fn relation(&self) -> &Relation {
        &self.relation
    }
}

impl fmt::Display for RelationAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.relation.label() {
            Some(label) => write!(f, "{label}.{}", self.name),
            None => write!(f, "({}).{}", self.relation, self.name),
        }
    }
}

/// A named scalar function applied to scalar arguments
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScalarFunction {
    name: FunctionName,
    args: Vec<Scalar>,
}

impl ScalarFunction {
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

impl fmt::Display for ScalarFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        write_list(f, &self.args)?;
        write!(f, ")")
    }
}

/// A scalar term
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scalar {
    /// Constant value
    Constant(ConstantValue),
    /// Attribute of a relation
    Attribute(RelationAttribute),
    /// Scalar function call
    Function(ScalarFunction),
}

impl Scalar {
    pub fn constant(value: impl Into<ConstantValue>) -> Self {
        Self::Constant(value.into())
    }

    /// Attribute `name` of `relation`; fails on a blank name
    pub fn attribute(name: &str, relation: &Relation) -> AlgebraResult<Self> {
        RelationAttribute::new(name, relation).map(Self::Attribute)
    }

    /// Function `name` applied to `args`; fails on a blank name
    pub fn function(name: &str, args: Vec<Scalar>) -> AlgebraResult<Self> {
        ScalarFunction::new(name, args).map(Self::Function)
    }
}

impl From<RelationAttribute> for Scalar {
    fn from(attribute: RelationAttribute) -> Self {
        Self::Attribute(attribute)
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constant(value) => write!(f, "{value}"),
            Self::Attribute(attribute) => write!(f, "{attribute}"),
            Self::Function(function) => write!(f, "{function}"),
        }
    }
}

pub(crate) fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}
