//! Join builders
//!
//! A builder holds a main relation and an insertion-ordered list of join
//! requests. Folding is always in insertion order, producing a left-deep
//! chain `((main ⋈ a) ⋈ b)`, independent of how callers stored the requests.

use crate::error::{AlgebraError, AlgebraResult};
use crate::predicate::Predicate;
use crate::relation::Relation;
use crate::scalar::{RelationAttribute, Scalar};
use relq_core::AttributeName;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// How a relation is joined to the main relation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinSpec {
    /// Explicit join condition
    On(Predicate),
    /// Equality on each named attribute, present on both sides
    Natural(Vec<AttributeName>),
}

impl JoinSpec {
    /// Natural join over `names`; fails if any name is blank
    pub fn natural<'a>(names: impl IntoIterator<Item = &'a str>) -> AlgebraResult<Self> {
        names
            .into_iter()
            .map(|name| {
                AttributeName::try_new(name).ok_or(AlgebraError::EmptyName { kind: "attribute" })
            })
            .collect::<AlgebraResult<Vec<_>>>()
            .map(Self::Natural)
    }
}

/// `And(Equal(a1@main, a1@target), Equal(a2@main, a2@target), ...)`
fn natural_predicate(
    main: &Relation,
    target: &Relation,
    names: &[AttributeName],
) -> AlgebraResult<Predicate> {
    if names.is_empty() {
        return Err(AlgebraError::EmptyJoinAttributes {
            relation: target.to_string(),
        });
    }
    Predicate::conjoin(names.iter().map(|name| {
        Predicate::equal(
            Scalar::Attribute(RelationAttribute::from_name(name.clone(), main)),
            Scalar::Attribute(RelationAttribute::from_name(name.clone(), target)),
        )
    }))
}

/// Main relation plus the relations joined to it
#[derive(Debug, Clone)]
pub struct SourceRelationBuilder {
    main: Relation,
    joins: Vec<(Relation, Predicate)>,
    joined: HashSet<Relation>,
}

impl SourceRelationBuilder {
    pub fn new(main: Relation) -> Self {
        Self {
            main,
            joins: Vec::new(),
            joined: HashSet::new(),
        }
    }

    pub fn main(&self) -> &Relation {
        &self.main
    }

    /// Request a join of `target`.
    ///
    /// Returns `false` without touching the builder when `target` is already
    /// joined; the first request for a relation wins.
    pub fn join(&mut self, target: Relation, spec: JoinSpec) -> AlgebraResult<bool> {
        if self.joined.contains(&target) {
            log::debug!("Relation {target} is already joined, ignoring repeated join");
            return Ok(false);
        }
        let predicate = match spec {
            JoinSpec::On(predicate) => predicate,
            JoinSpec::Natural(names) => natural_predicate(&self.main, &target, &names)?,
        };
        self.joined.insert(target.clone());
        self.joins.push((target, predicate));
        Ok(true)
    }

    /// Joined relations with their conditions, in request order
    pub fn joins(&self) -> &[(Relation, Predicate)] {
        &self.joins
    }

    pub fn len(&self) -> usize {
        self.joins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joins.is_empty()
    }

    /// Fold the joins onto the main relation
    pub fn to_relation(&self) -> Relation {
        self.joins
            .iter()
            .fold(self.main.clone(), |acc, (target, predicate)| {
                Relation::inner_join(acc, target.clone(), predicate.clone())
            })
    }
}

/// Joins plus an optional selection and projection on top
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    source: SourceRelationBuilder,
    selection: Option<Predicate>,
    projection: Vec<RelationAttribute>,
}

impl QueryBuilder {
    pub fn new(main: Relation) -> Self {
        Self::from_source(SourceRelationBuilder::new(main))
    }

    pub fn from_source(source: SourceRelationBuilder) -> Self {
        Self {
            source,
            selection: None,
            projection: Vec::new(),
        }
    }

    pub fn source(&self) -> &SourceRelationBuilder {
        &self.source
    }

    pub fn join(&mut self, target: Relation, spec: JoinSpec) -> AlgebraResult<bool> {
        self.source.join(target, spec)
    }

    /// Add a filter; repeated filters are conjoined in the order given
    pub fn filter(&mut self, predicate: Predicate) -> &mut Self {
        self.selection = Some(match self.selection.take() {
            Some(existing) => Predicate::and(existing, predicate),
            None => predicate,
        });
        self
    }

    /// Append output attributes
    pub fn project(&mut self, attributes: impl IntoIterator<Item = RelationAttribute>) -> &mut Self {
        self.projection.extend(attributes);
        self
    }

    /// `π[attributes](σ[selection](joins))`, omitting the parts not requested
    pub fn build(&self) -> AlgebraResult<Relation> {
        let mut relation = self.source.to_relation();
        if let Some(predicate) = &self.selection {
            relation = Relation::selection(relation, predicate.clone());
        }
        if !self.projection.is_empty() {
            relation = Relation::projection(relation, self.projection.clone())?;
        }
        Ok(relation)
    }
}

/// Fold `joins` onto `main` in iteration order, skipping repeated targets
pub fn build_relation(
    main: Relation,
    joins: impl IntoIterator<Item = (Relation, JoinSpec)>,
) -> AlgebraResult<Relation> {
    let mut builder = SourceRelationBuilder::new(main);
    for (target, spec) in joins {
        builder.join(target, spec)?;
    }
    Ok(builder.to_relation())
}

#[cfg(test)]
#[path = "builder_test.rs"]
mod tests;
