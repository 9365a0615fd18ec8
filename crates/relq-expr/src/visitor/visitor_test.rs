use super::context::ContextKey;
use super::*;
use crate::ast::{BinaryOp, UnaryOp, Value};
use std::sync::Mutex;

/// Replaces every integer constant with its double
struct DoubleInts;

impl VisitorModule for DoubleInts {
    fn name(&self) -> &'static str {
        "double_ints"
    }

    fn claims(&self, node: &Expr, _context: &VisitContext) -> bool {
        matches!(node.as_constant(), Some(Value::Int(_)))
    }

    fn visit(&self, node: &ExprRef, _visitor: &Visitor<'_>) -> NormalizeResult<ExprRef> {
        match node.as_constant() {
            Some(Value::Int(i)) => Ok(Expr::literal(i * 2)),
            _ => Ok(node.clone()),
        }
    }
}

/// Replaces every integer constant with zero
struct ZeroInts;

impl VisitorModule for ZeroInts {
    fn name(&self) -> &'static str {
        "zero_ints"
    }

    fn claims(&self, node: &Expr, _context: &VisitContext) -> bool {
        matches!(node.as_constant(), Some(Value::Int(_)))
    }

    fn visit(&self, _node: &ExprRef, _visitor: &Visitor<'_>) -> NormalizeResult<ExprRef> {
        Ok(Expr::literal(0i64))
    }
}

const SCALE: ContextKey<i64> = ContextKey::new("scale");

/// Multiplies integer constants by the context's scale
struct ScaleInts;

impl VisitorModule for ScaleInts {
    fn name(&self) -> &'static str {
        "scale_ints"
    }

    fn claims(&self, node: &Expr, context: &VisitContext) -> bool {
        context.get(&SCALE).is_ok() && matches!(node.as_constant(), Some(Value::Int(_)))
    }

    fn visit(&self, node: &ExprRef, visitor: &Visitor<'_>) -> NormalizeResult<ExprRef> {
        let scale = *visitor.context().get(&SCALE)?;
        match node.as_constant() {
            Some(Value::Int(i)) => Ok(Expr::literal(i * scale)),
            _ => Ok(node.clone()),
        }
    }
}

/// Visits the operand of a negation under a scaled context
struct ScaleUnderNegate;

impl VisitorModule for ScaleUnderNegate {
    fn name(&self) -> &'static str {
        "scale_under_negate"
    }

    fn claims(&self, node: &Expr, _context: &VisitContext) -> bool {
        matches!(
            node,
            Expr::Unary {
                op: UnaryOp::Negate,
                ..
            }
        )
    }

    fn visit(&self, node: &ExprRef, visitor: &Visitor<'_>) -> NormalizeResult<ExprRef> {
        let extended = visitor.context().with(&SCALE, 10)?;
        visitor.with_context(&extended).visit_children(node)
    }
}

fn sum(a: i64, b: i64) -> ExprRef {
    Expr::binary(BinaryOp::Add, Expr::literal(a), Expr::literal(b))
}

#[test]
fn test_first_claiming_module_wins() {
    let composition = Composition::new()
        .register(DoubleInts)
        .register(ZeroInts)
        .register(ChildVisitor);
    let out = composition.visit(&sum(1, 2), &VisitContext::new()).unwrap();
    assert_eq!(out.to_string(), "(2 + 4)");

    let reversed = Composition::new()
        .register(ZeroInts)
        .register(DoubleInts)
        .register(ChildVisitor);
    let out = reversed.visit(&sum(1, 2), &VisitContext::new()).unwrap();
    assert_eq!(out.to_string(), "(0 + 0)");
}

#[test]
fn test_no_handler_is_fatal() {
    let composition = Composition::new().register(DoubleInts);
    let err = composition
        .visit(&sum(1, 2), &VisitContext::new())
        .unwrap_err();
    assert!(matches!(
        err,
        NormalizeError::NoHandler {
            kind: crate::ast::ExprKind::Binary
        }
    ));
}

#[test]
fn test_unchanged_children_share_node() {
    let composition = Composition::new().register(ChildVisitor);
    let tree = Expr::unary(UnaryOp::Not, Expr::literal(true));
    let out = composition.visit(&tree, &VisitContext::new()).unwrap();
    assert!(Arc::ptr_eq(&out, &tree));
}

#[test]
fn test_changed_child_rebuilds_only_its_path() {
    let composition = Composition::new()
        .register(DoubleInts)
        .register(ChildVisitor);
    let untouched = Expr::literal("s");
    let tree = Expr::conditional(Expr::literal(true), untouched.clone(), Expr::literal(3i64));
    let out = composition.visit(&tree, &VisitContext::new()).unwrap();
    assert!(!Arc::ptr_eq(&out, &tree));
    let children = out.children();
    assert!(Arc::ptr_eq(&children[1], &untouched));
    assert_eq!(children[2].as_constant(), Some(&Value::Int(6)));
}

#[test]
fn test_depth_limit() {
    let mut tree = Expr::literal(true);
    for _ in 0..10 {
        tree = Expr::unary(UnaryOp::Not, tree);
    }
    let shallow = Composition::new().with_max_depth(5).register(ChildVisitor);
    assert!(matches!(
        shallow.visit(&tree, &VisitContext::new()),
        Err(NormalizeError::DepthExceeded { limit: 5 })
    ));

    let deep = Composition::new().with_max_depth(11).register(ChildVisitor);
    assert!(deep.visit(&tree, &VisitContext::new()).is_ok());
}

#[test]
fn test_with_context_extends_for_subtree() {
    let composition = Composition::new()
        .register(ScaleUnderNegate)
        .register(ScaleInts)
        .register(ChildVisitor);
    let tree = Expr::binary(
        BinaryOp::Add,
        Expr::literal(1i64),
        Expr::unary(UnaryOp::Negate, Expr::literal(2i64)),
    );
    let out = composition.visit(&tree, &VisitContext::new()).unwrap();
    assert_eq!(out.to_string(), "(1 + -20)");
}

#[test]
fn test_report_forwards_to_hook() {
    let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let hook: context::DiagnosticHook = Arc::new(move |err: &EvalError, node: &Expr| {
        sink.lock().unwrap().push(format!("{node}: {err}"));
    });
    let ctx = VisitContext::new().with(&DIAGNOSTICS, hook).unwrap();
    let composition = Composition::new().register(ChildVisitor);
    let visitor = Visitor {
        composition: &composition,
        context: &ctx,
        depth: 0,
    };
    visitor.report(
        &EvalError::Execution("boom".to_string()),
        &Expr::literal(1i64),
    );
    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert!(seen[0].starts_with("1: [EV007]"));
}

#[test]
fn test_module_names_in_priority_order() {
    let composition = Composition::new()
        .register(DoubleInts)
        .register(ChildVisitor);
    assert_eq!(composition.module_names(), vec!["double_ints", "child_visitor"]);
}
