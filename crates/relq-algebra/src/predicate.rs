//! Predicates over scalar terms

use crate::error::{AlgebraError, AlgebraResult};
use crate::scalar::{RelationAttribute, Scalar};
use crate::visitor::{collect_attributes, AlgebraVisitor};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A boolean condition.
///
/// Equality is structural and operand order is significant for every binary
/// form: `And(a, b)` and `And(b, a)` are different predicates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    /// Always true
    True,
    /// Always false
    False,
    /// Logical negation
    Not(Box<Predicate>),
    /// Logical conjunction
    And(Box<Predicate>, Box<Predicate>),
    /// Logical disjunction
    Or(Box<Predicate>, Box<Predicate>),
    /// Exclusive or
    Xor(Box<Predicate>, Box<Predicate>),
    /// `left = right`
    Equal(Scalar, Scalar),
    /// `left <> right`
    NotEqual(Scalar, Scalar),
    /// `left > right`
    Greater(Scalar, Scalar),
    /// `left >= right`
    GreaterOrEqual(Scalar, Scalar),
    /// `left < right`
    Less(Scalar, Scalar),
    /// `left <= right`
    LessOrEqual(Scalar, Scalar),
}

impl Predicate {
    #[allow(clippy::should_implement_trait)]
    pub fn not(operand: Predicate) -> Self {
        Self::Not(Box::new(operand))
    }

    pub fn and(left: Predicate, right: Predicate) -> Self {
        Self::And(Box::new(left), Box::new(right))
    }

    pub fn or(left: Predicate, right: Predicate) -> Self {
        Self::Or(Box::new(left), Box::new(right))
    }

    pub fn xor(left: Predicate, right: Predicate) -> Self {
        Self::Xor(Box::new(left), Box::new(right))
    }

    pub fn equal(left: Scalar, right: Scalar) -> Self {
        Self::Equal(left, right)
    }

    pub fn not_equal(left: Scalar, right: Scalar) -> Self {
        Self::NotEqual(left, right)
    }

    pub fn greater(left: Scalar, right: Scalar) -> Self {
        Self::Greater(left, right)
    }

    pub fn greater_or_equal(left: Scalar, right: Scalar) -> Self {
        Self::GreaterOrEqual(left, right)
    }

    pub fn less(left: Scalar, right: Scalar) -> Self {
        Self::Less(left, right)
    }

    pub fn less_or_equal(left: Scalar, right: Scalar) -> Self {
        Self::LessOrEqual(left, right)
    }

    /// Left fold of `predicates` with `And`: `And(And(p1, p2), p3)`.
    ///
    /// An empty input has no conjunction and is rejected.
    pub fn conjoin(predicates: impl IntoIterator<Item = Predicate>) -> AlgebraResult<Self> {
        predicates
            .into_iter()
            .reduce(Self::and)
            .ok_or(AlgebraError::MissingOperand {
                operand: "conjunction",
            })
    }

    /// The scalar operands of a comparison
    pub fn scalar_operands(&self) -> Option<(&Scalar, &Scalar)> {
        match self {
            Self::Equal(l, r)
            | Self::NotEqual(l, r)
            | Self::Greater(l, r)
            | Self::GreaterOrEqual(l, r)
            | Self::Less(l, r)
            | Self::LessOrEqual(l, r) => Some((l, r)),
            _ => None,
        }
    }

    /// Distinct relation attributes referenced by this predicate, in the
    /// order they first appear
    pub fn attributes(&self) -> Vec<&RelationAttribute> {
        collect_attributes(|visitor| visitor.visit_predicate(self))
    }

    pub fn accept<'ir, V: AlgebraVisitor<'ir> + ?Sized>(&'ir self, visitor: &mut V) {
        visitor.visit_predicate(self);
    }
}

fn write_comparison(
    f: &mut fmt::Formatter<'_>,
    left: &Scalar,
    symbol: &str,
    right: &Scalar,
) -> fmt::Result {
    write!(f, "({left} {symbol} {right})")
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::True => write!(f, "true"),
            Self::False => write!(f, "false"),
            Self::Not(p) => write!(f, "¬{p}"),
            Self::And(l, r) => write!(f, "({l} ∧ {r})"),
            Self::Or(l, r) => write!(f, "({l} ∨ {r})"),
            Self::Xor(l, r) => write!(f, "({l} ⊕ {r})"),
            Self::Equal(l, r) => write_comparison(f, l, "=", r),
            Self::NotEqual(l, r) => write_comparison(f, l, "<>", r),
            Self::Greater(l, r) => write_comparison(f, l, ">", r),
            Self::GreaterOrEqual(l, r) => write_comparison(f, l, ">=", r),
            Self::Less(l, r) => write_comparison(f, l, "<", r),
            Self::LessOrEqual(l, r) => write_comparison(f, l, "<=", r),
        }
    }
}

#[cfg(test)]
#[path = "predicate_test.rs"]
mod tests;
