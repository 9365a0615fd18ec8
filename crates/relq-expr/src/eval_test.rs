use super::*;
use crate::ast::Member;

fn eval(expr: &ExprRef) -> EvalResult<Value> {
    Interpreter::new().evaluate(expr)
}

#[test]
fn test_arithmetic_and_comparison() {
    let sum = Expr::binary(BinaryOp::Add, Expr::literal(2i64), Expr::literal(3i64));
    assert_eq!(eval(&sum).unwrap(), Value::Int(5));

    let mixed = Expr::binary(BinaryOp::Multiply, Expr::literal(2i64), Expr::literal(1.5f64));
    assert_eq!(eval(&mixed).unwrap(), Value::Float(3.0));

    let cmp = Expr::binary(BinaryOp::GreaterThanOrEqual, sum, Expr::literal(5i64));
    assert_eq!(eval(&cmp).unwrap(), Value::Bool(true));
}

#[test]
fn test_integer_overflow_is_an_error() {
    let expr = Expr::binary(BinaryOp::Add, Expr::literal(i64::MAX), Expr::literal(1i64));
    assert!(matches!(eval(&expr), Err(EvalError::Invocation { .. })));
}

#[test]
fn test_division_by_zero_is_an_error() {
    let expr = Expr::binary(BinaryOp::Divide, Expr::literal(1i64), Expr::literal(0i64));
    let err = eval(&expr).unwrap_err();
    assert!(err.to_string().contains("division by zero"));
}

#[test]
fn test_and_short_circuits() {
    // The right side would fail if evaluated.
    let failing = Expr::binary(BinaryOp::Divide, Expr::literal(1i64), Expr::literal(0i64));
    let rhs = Expr::binary(BinaryOp::Equal, failing, Expr::literal(1i64));
    let and = Expr::binary(BinaryOp::And, Expr::literal(false), rhs);
    assert_eq!(eval(&and).unwrap(), Value::Bool(false));
}

#[test]
fn test_coalesce_picks_first_non_null() {
    let expr = Expr::binary(
        BinaryOp::Coalesce,
        Expr::literal(Value::Null),
        Expr::literal("fallback"),
    );
    assert_eq!(eval(&expr).unwrap(), Value::string("fallback"));
}

#[test]
fn test_lambda_captures_and_invokes() {
    let x = Parameter::new("x", QueryType::Int);
    let body = Expr::binary(BinaryOp::Multiply, Expr::parameter(&x), Expr::literal(10i64));
    let lambda = Expr::lambda(vec![x], body);
    let call = Expr::invoke(lambda, vec![Expr::literal(4i64)]);
    assert_eq!(call.ty(), &QueryType::Int);
    assert_eq!(eval(&call).unwrap(), Value::Int(40));
}

#[test]
fn test_unbound_parameter() {
    let x = Parameter::new("x", QueryType::Int);
    let err = eval(&Expr::parameter(&x)).unwrap_err();
    assert_eq!(
        err,
        EvalError::UnboundParameter {
            name: "x".to_string()
        }
    );
}

#[test]
fn test_invoke_non_function() {
    let call = Expr::invoke(Expr::literal(3i64), Vec::new());
    assert!(matches!(eval(&call), Err(EvalError::NotCallable { .. })));
}

#[test]
fn test_member_read_on_record() {
    let ty = QueryType::object("Person");
    let name = Arc::new(Member::field(ty, "name", QueryType::String));
    let ada = Value::record("Person", vec![("name", Value::string("Ada"))]);
    let access = Expr::member(Some(Expr::literal(ada)), name);
    assert_eq!(eval(&access).unwrap(), Value::string("Ada"));
}

#[test]
fn test_new_and_member_init_build_records() {
    let ty = QueryType::object("Point");
    let new = Expr::new_object(ty, vec!["x".to_string()], vec![Expr::literal(1i64)]);
    let init = Expr::member_init(new, vec![("y".to_string(), Expr::literal(2i64))]);
    let value = eval(&init).unwrap();
    let record = value.as_record().unwrap();
    assert_eq!(record.type_name(), "Point");
    assert_eq!(record.get("x"), Some(&Value::Int(1)));
    assert_eq!(record.get("y"), Some(&Value::Int(2)));
}

#[test]
fn test_new_array_and_type_is() {
    let array = Expr::new_array(
        QueryType::Int,
        vec![Expr::literal(1i64), Expr::literal(2i64)],
    );
    assert_eq!(
        eval(&array).unwrap(),
        Value::sequence(vec![Value::Int(1), Value::Int(2)])
    );

    let check = Expr::type_is(Expr::literal(Value::Null), QueryType::Any);
    assert_eq!(eval(&check).unwrap(), Value::Bool(false));
}

#[test]
fn test_convert() {
    let to_float = Expr::unary(UnaryOp::Convert(QueryType::Float), Expr::literal(2i64));
    assert_eq!(eval(&to_float).unwrap(), Value::Float(2.0));

    let bad = Expr::unary(UnaryOp::Convert(QueryType::Bool), Expr::literal(2i64));
    assert!(matches!(eval(&bad), Err(EvalError::TypeMismatch { .. })));
}

#[test]
fn test_float_to_int_convert() {
    let to_int = |x: f64| Expr::unary(UnaryOp::Convert(QueryType::Int), Expr::literal(x));
    assert_eq!(eval(&to_int(-2.7)).unwrap(), Value::Int(-2));
    assert_eq!(eval(&to_int(1e15)).unwrap(), Value::Int(1_000_000_000_000_000));

    for x in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY, 1e19, -1e19, 9_223_372_036_854_775_807.0] {
        let err = eval(&to_int(x)).unwrap_err();
        assert!(
            matches!(&err, EvalError::Invocation { message, .. } if message == "integer overflow"),
            "{x} converted: {err}"
        );
    }
}

#[test]
fn test_depth_limit() {
    let mut expr = Expr::literal(0i64);
    for _ in 0..20 {
        expr = Expr::unary(UnaryOp::Negate, expr);
    }
    let shallow = Interpreter::with_max_depth(5);
    assert_eq!(
        shallow.evaluate(&expr).unwrap_err(),
        EvalError::DepthExceeded { limit: 5 }
    );
    assert_eq!(Interpreter::new().evaluate(&expr).unwrap(), Value::Int(0));
}

#[test]
fn test_free_parameters() {
    let outer = Parameter::new("o", QueryType::Int);
    let inner = Parameter::new("i", QueryType::Int);
    let body = Expr::binary(
        BinaryOp::Add,
        Expr::parameter(&outer),
        Expr::parameter(&inner),
    );
    let inner_lambda = Expr::lambda(vec![inner], body);
    assert_eq!(free_parameters(&inner_lambda), vec![outer.clone()]);
    assert!(!is_closed(&inner_lambda));

    let outer_lambda = Expr::lambda(vec![outer], inner_lambda);
    assert!(is_closed(&outer_lambda));
}

#[test]
fn test_host_function_checks_arity() {
    let double = HostFunction::new("double", 1, |args| match args {
        [Value::Int(i)] => Ok(Value::Int(i * 2)),
        _ => Err(EvalError::Execution("bad args".to_string())),
    });
    let interp = Interpreter::new();
    assert_eq!(double.call(&[Value::Int(4)], &interp).unwrap(), Value::Int(8));
    assert!(double.call(&[], &interp).is_err());
}
