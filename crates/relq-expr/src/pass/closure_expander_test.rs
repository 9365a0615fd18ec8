use super::*;
use crate::ast::{Member, Parameter, QueryType, Value};
use crate::eval::Interpreter;
use crate::test_utils::*;
use crate::visitor::context::DIAGNOSTICS;
use crate::visitor::{ChildVisitor, Composition};

fn composition() -> Composition {
    Composition::new()
        .register(ClosureExpander::new(Arc::new(Interpreter::new())))
        .register(ChildVisitor)
}

fn run(tree: &ExprRef) -> ExprRef {
    composition().visit(tree, &VisitContext::new()).unwrap()
}

#[test]
fn test_captured_value_in_lambda_body() {
    let env = closure(vec![("i", Value::Int(1))]);
    let tree = Expr::lambda(Vec::new(), captured(&env, "i", QueryType::Int));
    let out = run(&tree);
    match &*out {
        Expr::Lambda { params, body, .. } => {
            assert!(params.is_empty());
            assert_eq!(body.as_constant(), Some(&Value::Int(1)));
            assert_eq!(body.ty(), &QueryType::Int);
        }
        other => panic!("expected lambda, got {other:?}"),
    }
}

#[test]
fn test_nested_member_chain() {
    let inner = Value::record("Limits", vec![("max", Value::Int(5))]);
    let env = closure(vec![("limits", inner)]);
    let limits = captured(&env, "limits", QueryType::object("Limits"));
    let max = Arc::new(Member::field(QueryType::object("Limits"), "max", QueryType::Int));
    let tree = Expr::member(Some(limits), max);
    assert_eq!(run(&tree).as_constant(), Some(&Value::Int(5)));
}

#[test]
fn test_throwing_accessor_returns_node_unchanged() {
    let env = closure(Vec::new());
    let tree = Expr::member(Some(env), failing_member());
    let (hook, seen) = recording_hook();
    let ctx = VisitContext::new().with(&DIAGNOSTICS, hook).unwrap();
    let out = composition().visit(&tree, &ctx).unwrap();
    assert!(Arc::ptr_eq(&out, &tree));
    assert_eq!(seen.lock().unwrap().len(), 1);
}

#[test]
fn test_member_of_parameter_is_not_claimed() {
    let p = Parameter::new("p", person_type());
    let tree = Expr::member(Some(Expr::parameter(&p)), age_member());
    let expander = ClosureExpander::new(Arc::new(Interpreter::new()));
    assert!(!expander.claims(&tree, &VisitContext::new()));
    assert!(Arc::ptr_eq(&run(&tree), &tree));
}

#[test]
fn test_static_member_is_expanded() {
    let member = Arc::new(Member::static_property(
        QueryType::object("Settings"),
        "page_size",
        QueryType::Int,
        || Ok(Value::Int(50)),
    ));
    assert_eq!(
        run(&Expr::member(None, member)).as_constant(),
        Some(&Value::Int(50))
    );
}
