use super::*;
use crate::relation::Relation;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

fn hash_of(predicate: &Predicate) -> u64 {
    let mut hasher = DefaultHasher::new();
    predicate.hash(&mut hasher);
    hasher.finish()
}

fn one_eq_two() -> Predicate {
    Predicate::equal(Scalar::constant(1i64), Scalar::constant(2i64))
}

#[test]
fn test_independent_construction_is_equal() {
    let a = one_eq_two();
    let b = one_eq_two();
    assert_eq!(a, b);
    assert_eq!(hash_of(&a), hash_of(&b));
}

#[test]
fn test_comparison_operand_order_matters() {
    let swapped = Predicate::equal(Scalar::constant(2i64), Scalar::constant(1i64));
    assert_ne!(one_eq_two(), swapped);
}

#[test]
fn test_logical_operand_order_matters() {
    let and = Predicate::and(Predicate::True, Predicate::False);
    assert_ne!(and, Predicate::and(Predicate::False, Predicate::True));
    let or = Predicate::or(Predicate::True, Predicate::False);
    assert_ne!(or, Predicate::or(Predicate::False, Predicate::True));
}

#[test]
fn test_same_operands_different_operator() {
    let less = Predicate::less(Scalar::constant(1i64), Scalar::constant(2i64));
    assert_ne!(one_eq_two(), less);
    assert_ne!(
        Predicate::and(Predicate::True, Predicate::True),
        Predicate::xor(Predicate::True, Predicate::True)
    );
}

#[test]
fn test_conjoin_is_left_fold() {
    let p = |n: i64| Predicate::equal(Scalar::constant(n), Scalar::constant(n));
    let folded = Predicate::conjoin(vec![p(1), p(2), p(3)]).unwrap();
    assert_eq!(folded, Predicate::and(Predicate::and(p(1), p(2)), p(3)));
}

#[test]
fn test_conjoin_of_one_is_itself() {
    assert_eq!(Predicate::conjoin(vec![one_eq_two()]).unwrap(), one_eq_two());
}

#[test]
fn test_conjoin_of_nothing_is_rejected() {
    assert_eq!(
        Predicate::conjoin(Vec::new()).unwrap_err(),
        AlgebraError::MissingOperand {
            operand: "conjunction"
        }
    );
}

#[test]
fn test_attributes_are_distinct_in_order() {
    let users = Relation::base("users").unwrap();
    let id = Scalar::attribute("id", &users).unwrap();
    let age = Scalar::attribute("age", &users).unwrap();
    let predicate = Predicate::and(
        Predicate::greater(age.clone(), Scalar::constant(18i64)),
        Predicate::or(
            Predicate::equal(id.clone(), Scalar::constant(1i64)),
            Predicate::less_or_equal(age, Scalar::function("abs", vec![id]).unwrap()),
        ),
    );
    let names: Vec<&str> = predicate
        .attributes()
        .iter()
        .map(|a| a.name().as_str())
        .collect();
    assert_eq!(names, vec!["age", "id"]);
}

#[test]
fn test_display() {
    let users = Relation::base("users").unwrap();
    let predicate = Predicate::not(Predicate::and(
        Predicate::not_equal(
            Scalar::attribute("name", &users).unwrap(),
            Scalar::constant("bob"),
        ),
        Predicate::greater_or_equal(
            Scalar::attribute("age", &users).unwrap(),
            Scalar::constant(21i64),
        ),
    ));
    assert_eq!(
        predicate.to_string(),
        "¬((users.name <> 'bob') ∧ (users.age >= 21))"
    );
}

#[test]
fn test_serde_round_trip_preserves_equality() {
    let users = Relation::base("users").unwrap();
    let predicate = Predicate::xor(
        Predicate::equal(Scalar::attribute("id", &users).unwrap(), Scalar::constant(1i64)),
        Predicate::False,
    );
    let json = serde_json::to_string(&predicate).unwrap();
    let back: Predicate = serde_json::from_str(&json).unwrap();
    assert_eq!(back, predicate);
}
