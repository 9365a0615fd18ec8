use super::*;
use crate::ast::Parameter;
use crate::eval::{HostFunction, Interpreter};
use crate::source::InMemoryProvider;

fn ints(values: &[i64]) -> Value {
    Value::sequence(values.iter().map(|i| Value::Int(*i)).collect())
}

fn greater_than(n: i64) -> Value {
    HostFunction::new("gt", 1, move |args| match args {
        [Value::Int(i)] => Ok(Value::Bool(*i > n)),
        _ => Ok(Value::Bool(false)),
    })
    .into_value()
}

fn run(operator: SequenceOperator, args: &[Value]) -> Result<Value, EvalError> {
    let catalog = OperatorCatalog::standard();
    let method = catalog
        .method(OperatorFamily::Immediate, operator, args.len())
        .unwrap();
    method.invoke(None, args, &Interpreter::new())
}

#[test]
fn test_family_sibling_and_type_selection() {
    assert_eq!(OperatorFamily::Deferred.sibling(), OperatorFamily::Immediate);
    assert_eq!(
        OperatorFamily::of_type(&QueryType::queryable(QueryType::Int)),
        OperatorFamily::Deferred
    );
    assert_eq!(
        OperatorFamily::of_type(&QueryType::sequence(QueryType::Int)),
        OperatorFamily::Immediate
    );
    assert_eq!(OperatorFamily::Immediate.to_string(), "immediate");
}

#[test]
fn test_standard_catalog_pairs_every_shared_operator() {
    let catalog = OperatorCatalog::standard();
    let unpaired: Vec<&str> = catalog.unpaired().iter().map(|m| m.name()).collect();
    assert_eq!(unpaired, vec!["to_list"]);
}

#[test]
fn test_standard_catalog_is_shared() {
    let a = OperatorCatalog::standard();
    let b = OperatorCatalog::standard();
    assert!(Arc::ptr_eq(&a, &b));
}

#[test]
fn test_equivalent_switches_family() {
    let catalog = OperatorCatalog::standard();
    let deferred = catalog
        .method(OperatorFamily::Deferred, SequenceOperator::Where, 2)
        .unwrap()
        .clone();
    let immediate = catalog
        .equivalent(&deferred, OperatorFamily::Immediate)
        .unwrap();
    assert_eq!(immediate.family(), Some(OperatorFamily::Immediate));
    assert_eq!(immediate.name(), "where");
    assert_eq!(immediate.params()[1], ParamKind::Delegate(1));

    let back = catalog
        .equivalent(&immediate, OperatorFamily::Deferred)
        .unwrap();
    assert!(Arc::ptr_eq(&back, &deferred));

    let same = catalog
        .equivalent(&deferred, OperatorFamily::Deferred)
        .unwrap();
    assert!(Arc::ptr_eq(&same, &deferred));
}

#[test]
fn test_overloads_are_keyed_by_arity() {
    let catalog = OperatorCatalog::standard();
    let count1 = catalog
        .method(OperatorFamily::Deferred, SequenceOperator::Count, 1)
        .unwrap();
    let count2 = catalog
        .method(OperatorFamily::Deferred, SequenceOperator::Count, 2)
        .unwrap();
    assert_ne!(count1, count2);
}

#[test]
fn test_immediate_only_operator_has_no_deferred_equivalent() {
    let catalog = OperatorCatalog::standard();
    let to_list = catalog
        .method(OperatorFamily::Immediate, SequenceOperator::ToList, 1)
        .unwrap()
        .clone();
    let err = catalog
        .equivalent(&to_list, OperatorFamily::Deferred)
        .unwrap_err();
    assert!(matches!(
        err,
        NormalizeError::MissingEquivalent {
            arity: 1,
            family: OperatorFamily::Deferred,
            ..
        }
    ));
    assert!(err.to_string().contains("NE004"));
}

#[test]
fn test_unknown_operator() {
    let catalog = OperatorCatalog::standard();
    let err = catalog
        .method(OperatorFamily::Deferred, SequenceOperator::ToList, 1)
        .unwrap_err();
    assert!(matches!(err, NormalizeError::UnknownOperator { .. }));
}

#[test]
fn test_custom_catalog_without_siblings() {
    let immediate_only: Vec<Arc<Method>> = standard_methods()
        .into_iter()
        .filter(|m| m.family() == Some(OperatorFamily::Immediate))
        .collect();
    let catalog = OperatorCatalog::new(immediate_only);
    assert_eq!(catalog.unpaired().len(), catalog.len());
    let where_ = catalog
        .method(OperatorFamily::Immediate, SequenceOperator::Where, 2)
        .unwrap()
        .clone();
    assert!(catalog
        .equivalent(&where_, OperatorFamily::Deferred)
        .is_err());
}

#[test]
fn test_result_types() {
    let elem = QueryType::object("Person");
    let src = QueryType::queryable(elem.clone());
    let pred = QueryType::function(vec![elem.clone()], QueryType::Bool);
    let catalog = OperatorCatalog::standard();

    let where_ = catalog
        .method(OperatorFamily::Deferred, SequenceOperator::Where, 2)
        .unwrap();
    assert_eq!(where_.result_type(&[&src, &pred]), QueryType::queryable(elem.clone()));

    let immediate = catalog.equivalent(where_, OperatorFamily::Immediate).unwrap();
    assert_eq!(
        immediate.result_type(&[&QueryType::sequence(elem.clone()), &pred]),
        QueryType::sequence(elem.clone())
    );

    let first = catalog
        .method(OperatorFamily::Deferred, SequenceOperator::First, 1)
        .unwrap();
    assert_eq!(first.result_type(&[&src]), elem);

    let select = catalog
        .method(OperatorFamily::Deferred, SequenceOperator::Select, 2)
        .unwrap();
    let to_name = QueryType::function(vec![elem], QueryType::String);
    assert_eq!(
        select.result_type(&[&src, &to_name]),
        QueryType::queryable(QueryType::String)
    );
}

#[test]
fn test_immediate_where_count_and_sum() {
    let source = ints(&[1, 5, 8, 2]);
    assert_eq!(
        run(SequenceOperator::Where, &[source.clone(), greater_than(3)]).unwrap(),
        ints(&[5, 8])
    );
    assert_eq!(
        run(SequenceOperator::Count, &[source.clone(), greater_than(1)]).unwrap(),
        Value::Int(3)
    );
    assert_eq!(run(SequenceOperator::Sum, &[source]).unwrap(), Value::Int(16));
}

#[test]
fn test_immediate_take_skip_distinct_concat() {
    let source = ints(&[3, 1, 3, 2]);
    assert_eq!(
        run(SequenceOperator::Take, &[source.clone(), Value::Int(2)]).unwrap(),
        ints(&[3, 1])
    );
    assert_eq!(
        run(SequenceOperator::Skip, &[source.clone(), Value::Int(-1)]).unwrap(),
        source
    );
    assert_eq!(
        run(SequenceOperator::Distinct, &[source.clone()]).unwrap(),
        ints(&[3, 1, 2])
    );
    assert_eq!(
        run(SequenceOperator::Concat, &[ints(&[1]), ints(&[2])]).unwrap(),
        ints(&[1, 2])
    );
}

#[test]
fn test_immediate_order_by_with_lambda() {
    let x = Parameter::new("x", QueryType::Int);
    let negate = Expr::lambda(
        vec![x.clone()],
        Expr::unary(crate::ast::UnaryOp::Negate, Expr::parameter(&x)),
    );
    let key = Interpreter::new().evaluate(&negate).unwrap();
    assert_eq!(
        run(SequenceOperator::OrderBy, &[ints(&[1, 3, 2]), key]).unwrap(),
        ints(&[3, 2, 1])
    );
}

#[test]
fn test_first_of_empty_fails() {
    let err = run(SequenceOperator::First, &[ints(&[])]).unwrap_err();
    assert!(matches!(err, EvalError::Invocation { .. }));
}

#[test]
fn test_immediate_materializes_query_receiver() {
    let provider = InMemoryProvider::shared("mem");
    let query = Query::leaf(provider, QueryType::Int, vec![Value::Int(4), Value::Int(6)]);
    assert_eq!(
        run(SequenceOperator::Count, &[query.into_value()]).unwrap(),
        Value::Int(2)
    );
}

#[test]
fn test_sequence_call_builds_static_call() {
    let provider = InMemoryProvider::shared("mem");
    let source = Query::leaf(provider, QueryType::Int, Vec::new()).constant();
    let call = sequence_call(
        OperatorFamily::Deferred,
        SequenceOperator::Take,
        vec![source, Expr::literal(2i64)],
    )
    .unwrap();
    assert_eq!(call.ty(), &QueryType::queryable(QueryType::Int));
    assert!(call.to_string().starts_with("Queryable::take("));

    let err = sequence_call(OperatorFamily::Deferred, SequenceOperator::Take, Vec::new());
    assert!(err.is_err());
}

#[test]
fn test_immediate_only_operators() {
    assert!(SequenceOperator::ToList.is_immediate_only());
    assert!(!SequenceOperator::Where.is_immediate_only());
    assert!(!SequenceOperator::Count.is_immediate_only());
}

#[test]
fn test_operator_names_serialize_in_snake_case() {
    assert_eq!(
        serde_json::to_string(&SequenceOperator::OrderBy).unwrap(),
        "\"order_by\""
    );
    assert_eq!(
        serde_json::to_string(&OperatorFamily::Deferred).unwrap(),
        "\"deferred\""
    );
    let op: SequenceOperator = serde_json::from_str("\"to_list\"").unwrap();
    assert_eq!(op, SequenceOperator::ToList);
    assert!(serde_json::from_str::<OperatorFamily>("\"lazy\"").is_err());
}
