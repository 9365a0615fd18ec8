//! Shared test fixtures: a small person model, closures and providers

use crate::ast::{BinaryOp, Expr, ExprRef, Member, Parameter, QueryType, Value};
use crate::error::{EvalError, EvalResult};
use crate::source::{ProviderRef, QueryProvider};
use crate::visitor::context::DiagnosticHook;
use std::sync::{Arc, Mutex};

pub fn person_type() -> QueryType {
    QueryType::object("Person")
}

pub fn person(name: &str, age: i64) -> Value {
    Value::record(
        "Person",
        vec![("name", Value::string(name)), ("age", Value::Int(age))],
    )
}

/// Ada (36), Brian (25), Grace (45)
pub fn people() -> Vec<Value> {
    vec![person("Ada", 36), person("Brian", 25), person("Grace", 45)]
}

pub fn name_member() -> Arc<Member> {
    Arc::new(Member::field(person_type(), "name", QueryType::String))
}

pub fn age_member() -> Arc<Member> {
    Arc::new(Member::field(person_type(), "age", QueryType::Int))
}

/// An instance property whose getter always fails
pub fn failing_member() -> Arc<Member> {
    Arc::new(Member::property(
        QueryType::object("Closure"),
        "broken",
        QueryType::Int,
        |_| {
            Err(EvalError::MemberRead {
                member: "broken".to_string(),
                message: "getter failed".to_string(),
            })
        },
    ))
}

/// A captured environment as a constant node
pub fn closure(fields: Vec<(&str, Value)>) -> ExprRef {
    Expr::constant(
        Value::record("Closure", fields),
        QueryType::object("Closure"),
    )
}

/// `closure.name`, typed `ty`
pub fn captured(closure: &ExprRef, name: &str, ty: QueryType) -> ExprRef {
    let member = Arc::new(Member::field(QueryType::object("Closure"), name, ty));
    Expr::member(Some(closure.clone()), member)
}

/// `p => p.age > <threshold>` where the threshold is an arbitrary node
pub fn age_over(threshold: ExprRef) -> ExprRef {
    let p = Parameter::new("p", person_type());
    let body = Expr::binary(
        BinaryOp::GreaterThan,
        Expr::member(Some(Expr::parameter(&p)), age_member()),
        threshold,
    );
    Expr::lambda(vec![p], body)
}

/// `p => p.name`
pub fn name_of() -> ExprRef {
    let p = Parameter::new("p", person_type());
    Expr::lambda(
        vec![p.clone()],
        Expr::member(Some(Expr::parameter(&p)), name_member()),
    )
}

/// A diagnostic hook recording every reported error as `node: error`
pub fn recording_hook() -> (DiagnosticHook, Arc<Mutex<Vec<String>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let hook: DiagnosticHook = Arc::new(move |err: &EvalError, node: &Expr| {
        if let Ok(mut guard) = sink.lock() {
            guard.push(format!("{node}: {err}"));
        }
    });
    (hook, seen)
}

/// A provider whose execution always fails
#[derive(Debug)]
pub struct FailingProvider;

impl FailingProvider {
    pub fn shared() -> ProviderRef {
        Arc::new(FailingProvider)
    }
}

impl QueryProvider for FailingProvider {
    fn name(&self) -> &str {
        "failing"
    }

    fn execute(&self, _expression: &ExprRef) -> EvalResult<Value> {
        Err(EvalError::Execution("backend unavailable".to_string()))
    }
}
