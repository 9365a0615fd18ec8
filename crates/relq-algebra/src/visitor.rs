//! Read-only traversal of IR trees
//!
//! Implementors override the hooks they care about and call the matching
//! `walk_*` function to keep descending. Walks are pre-order and do not enter
//! the owning relation of an attribute, since that relation is a reference to
//! a node that already appears elsewhere in the tree.

use crate::predicate::Predicate;
use crate::relation::Relation;
use crate::scalar::{RelationAttribute, Scalar};
use std::collections::HashSet;

/// Visitor over relations, predicates, and scalars
pub trait AlgebraVisitor<'ir> {
    fn visit_relation(&mut self, relation: &'ir Relation) {
        walk_relation(self, relation);
    }

    fn visit_predicate(&mut self, predicate: &'ir Predicate) {
        walk_predicate(self, predicate);
    }

    fn visit_scalar(&mut self, scalar: &'ir Scalar) {
        walk_scalar(self, scalar);
    }

    fn visit_attribute(&mut self, _attribute: &'ir RelationAttribute) {}
}

pub fn walk_relation<'ir, V: AlgebraVisitor<'ir> + ?Sized>(
    visitor: &mut V,
    relation: &'ir Relation,
) {
    match relation {
        Relation::Base(_) => {}
        Relation::Function(function) => {
            for arg in function.args() {
                visitor.visit_scalar(arg);
            }
        }
        Relation::InnerJoin {
            left,
            right,
            predicate,
        } => {
            visitor.visit_relation(left);
            visitor.visit_relation(right);
            visitor.visit_predicate(predicate);
        }
        Relation::Rename { input, .. } => visitor.visit_relation(input),
        Relation::Selection { input, predicate } => {
            visitor.visit_relation(input);
            visitor.visit_predicate(predicate);
        }
        Relation::Projection { input, attributes } => {
            visitor.visit_relation(input);
            for attribute in attributes {
                visitor.visit_attribute(attribute);
            }
        }
    }
}

pub fn walk_predicate<'ir, V: AlgebraVisitor<'ir> + ?Sized>(
    visitor: &mut V,
    predicate: &'ir Predicate,
) {
    match predicate {
        Predicate::True | Predicate::False => {}
        Predicate::Not(operand) => visitor.visit_predicate(operand),
        Predicate::And(l, r) | Predicate::Or(l, r) | Predicate::Xor(l, r) => {
            visitor.visit_predicate(l);
            visitor.visit_predicate(r);
        }
        Predicate::Equal(l, r)
        | Predicate::NotEqual(l, r)
        | Predicate::Greater(l, r)
        | Predicate::GreaterOrEqual(l, r)
        | Predicate::Less(l, r)
        | Predicate::LessOrEqual(l, r) => {
            visitor.visit_scalar(l);
            visitor.visit_scalar(r);
        }
    }
}

pub fn walk_scalar<'ir, V: AlgebraVisitor<'ir> + ?Sized>(visitor: &mut V, scalar: &'ir Scalar) {
    match scalar {
        Scalar::Constant(_) => {}
        Scalar::Attribute(attribute) => visitor.visit_attribute(attribute),
        Scalar::Function(function) => {
            for arg in function.args() {
                visitor.visit_scalar(arg);
            }
        }
    }
}

/// Collects distinct attributes in first-seen order
#[derive(Default)]
pub(crate) struct AttributeCollector<'ir> {
    seen: HashSet<&'ir RelationAttribute>,
    found: Vec<&'ir RelationAttribute>,
}

impl<'ir> AlgebraVisitor<'ir> for AttributeCollector<'ir> {
    fn visit_attribute(&mut self, attribute: &'ir RelationAttribute) {
        if self.seen.insert(attribute) {
            self.found.push(attribute);
        }
    }
}

pub(crate) fn collect_attributes<'ir>(
    walk: impl FnOnce(&mut AttributeCollector<'ir>),
) -> Vec<&'ir RelationAttribute> {
    let mut collector = AttributeCollector::default();
    walk(&mut collector);
    collector.found
}

/// Collects distinct leaf relations (base relations and relation functions)
#[derive(Default)]
pub(crate) struct LeafCollector<'ir> {
    seen: HashSet<&'ir Relation>,
    found: Vec<&'ir Relation>,
}

impl<'ir> AlgebraVisitor<'ir> for LeafCollector<'ir> {
    fn visit_relation(&mut self, relation: &'ir Relation) {
        match relation {
            Relation::Base(_) | Relation::Function(_) => {
                if self.seen.insert(relation) {
                    self.found.push(relation);
                }
            }
            _ => walk_relation(self, relation),
        }
    }
}

impl<'ir> LeafCollector<'ir> {
    pub(crate) fn into_found(self) -> Vec<&'ir Relation> {
        self.found
    }
}
