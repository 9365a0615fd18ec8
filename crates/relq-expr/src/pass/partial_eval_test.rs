use super::*;
use crate::ast::{BinaryOp, Method, ParamKind, QueryType, UnaryOp};
use crate::error::EvalError;
use crate::eval::Interpreter;
use crate::test_utils::*;
use crate::visitor::context::DIAGNOSTICS;
use crate::visitor::{ChildVisitor, Composition};

fn composition() -> Composition {
    Composition::new()
        .register(PartialEvaluator::new(Arc::new(Interpreter::new())))
        .register(ChildVisitor)
}

fn run(tree: &ExprRef) -> ExprRef {
    composition().visit(tree, &VisitContext::new()).unwrap()
}

#[test]
fn test_folds_arithmetic() {
    let tree = Expr::binary(
        BinaryOp::Multiply,
        Expr::binary(BinaryOp::Add, Expr::literal(1i64), Expr::literal(2i64)),
        Expr::literal(4i64),
    );
    let out = run(&tree);
    assert_eq!(out.as_constant(), Some(&Value::Int(12)));
    assert_eq!(out.ty(), &QueryType::Int);
}

#[test]
fn test_folds_captured_member_with_declared_type() {
    let env = closure(vec![("limit", Value::Int(30))]);
    let tree = captured(&env, "limit", QueryType::Int);
    let out = run(&tree);
    assert_eq!(out.as_constant(), Some(&Value::Int(30)));
    assert_eq!(out.ty(), &QueryType::Int);
}

#[test]
fn test_folds_static_member() {
    let member = Arc::new(crate::ast::Member::static_property(
        QueryType::object("Limits"),
        "max",
        QueryType::Int,
        || Ok(Value::Int(99)),
    ));
    let out = run(&Expr::member(None, member));
    assert_eq!(out.as_constant(), Some(&Value::Int(99)));
}

#[test]
fn test_failing_member_leaves_node_and_reports() {
    let env = closure(Vec::new());
    let tree = Expr::member(Some(env), failing_member());
    let (hook, seen) = recording_hook();
    let ctx = VisitContext::new().with(&DIAGNOSTICS, hook).unwrap();
    let out = composition().visit(&tree, &ctx).unwrap();
    assert!(Arc::ptr_eq(&out, &tree));
    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert!(seen[0].contains("EV001"));
}

#[test]
fn test_lambda_body_reduces_around_parameters() {
    let env = closure(vec![("limit", Value::Int(30))]);
    let tree = age_over(captured(&env, "limit", QueryType::Int));
    let out = run(&tree);
    assert_eq!(out.to_string(), "p => (p.age > 30)");
    let again = run(&out);
    assert!(Arc::ptr_eq(&again, &out));
}

#[test]
fn test_host_method_call_with_constant_args() {
    let shout = Arc::new(Method::new(
        QueryType::String,
        "to_upper",
        Vec::new(),
        QueryType::String,
        |target, _| match target {
            Some(Value::String(s)) => Ok(Value::string(s.to_uppercase())),
            _ => Err(EvalError::Execution("no receiver".to_string())),
        },
    ));
    let call = Expr::call(Some(Expr::literal("ada")), shout, Vec::new());
    assert_eq!(run(&call).as_constant(), Some(&Value::string("ADA")));
}

#[test]
fn test_host_method_with_symbolic_arg_is_rebuilt() {
    let add = Arc::new(Method::new(
        QueryType::object("Math"),
        "add",
        vec![ParamKind::Value(QueryType::Int), ParamKind::Value(QueryType::Int)],
        QueryType::Int,
        |_, args| match args {
            [Value::Int(a), Value::Int(b)] => Ok(Value::Int(a + b)),
            _ => Err(EvalError::Execution("bad args".to_string())),
        },
    ));
    let p = crate::ast::Parameter::new("x", QueryType::Int);
    let folded_arg = Expr::binary(BinaryOp::Add, Expr::literal(1i64), Expr::literal(1i64));
    let call = Expr::call(None, add, vec![folded_arg, Expr::parameter(&p)]);
    let out = run(&call);
    assert_eq!(out.to_string(), "Math::add(2, x)");
}

#[test]
fn test_conditional_with_constant_test_picks_branch() {
    let p = crate::ast::Parameter::new("x", QueryType::Int);
    let tree = Expr::conditional(
        Expr::unary(UnaryOp::Not, Expr::literal(true)),
        Expr::parameter(&p),
        Expr::literal(7i64),
    );
    assert_eq!(run(&tree).as_constant(), Some(&Value::Int(7)));
}

#[test]
fn test_conditional_with_symbolic_test_is_shared_when_unchanged() {
    let p = crate::ast::Parameter::new("b", QueryType::Bool);
    let tree = Expr::conditional(
        Expr::parameter(&p),
        Expr::literal(1i64),
        Expr::literal(2i64),
    );
    assert!(Arc::ptr_eq(&run(&tree), &tree));
}

#[test]
fn test_type_check_and_array_fold() {
    let check = Expr::type_is(Expr::literal("s"), QueryType::String);
    assert_eq!(run(&check).as_constant(), Some(&Value::Bool(true)));

    let array = Expr::new_array(
        QueryType::Int,
        vec![Expr::literal(1i64), Expr::literal(2i64)],
    );
    let out = run(&array);
    assert_eq!(
        out.as_constant(),
        Some(&Value::sequence(vec![Value::Int(1), Value::Int(2)]))
    );
    assert_eq!(out.ty(), &QueryType::sequence(QueryType::Int));
}

#[test]
fn test_division_by_zero_stays_symbolic() {
    let tree = Expr::binary(BinaryOp::Divide, Expr::literal(1i64), Expr::literal(0i64));
    let out = run(&tree);
    assert!(Arc::ptr_eq(&out, &tree));
}

#[test]
fn test_does_not_claim_sequence_operators() {
    let provider = crate::source::InMemoryProvider::shared("mem");
    let source = crate::source::repository(&provider, person_type(), people());
    let call = crate::operators::sequence_call(
        crate::operators::OperatorFamily::Deferred,
        crate::operators::SequenceOperator::Count,
        vec![source],
    )
    .unwrap();
    let evaluator = PartialEvaluator::new(Arc::new(Interpreter::new()));
    assert!(!evaluator.claims(&call, &VisitContext::new()));
}
