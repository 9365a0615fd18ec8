//! Evaluation of query AST sub-trees to runtime values
//!
//! The passes never evaluate directly; they go through [`Evaluate`], so a
//! host can substitute its own compiler. [`Interpreter`] is the default
//! tree-walking implementation.

use crate::ast::{BinaryOp, Expr, ExprRef, Parameter, QueryType, Record, UnaryOp, Value};
use crate::error::{EvalError, EvalResult};
use relq_core::config::DEFAULT_MAX_DEPTH;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// A function value: a compiled lambda or a host function
pub trait Callable: Send + Sync + std::fmt::Debug {
    /// Number of arguments the function takes
    fn arity(&self) -> usize;

    /// Apply the function. `evaluator` evaluates any AST the function body
    /// still holds.
    fn call(&self, args: &[Value], evaluator: &dyn Evaluate) -> EvalResult<Value>;
}

/// Values bound to lambda parameters, keyed by parameter id
#[derive(Debug, Clone, Default)]
pub struct Bindings {
    values: HashMap<u64, Value>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of these bindings with `param` bound to `value`
    pub fn with(&self, param: &Parameter, value: Value) -> Self {
        let mut values = self.values.clone();
        values.insert(param.id(), value);
        Self { values }
    }

    pub fn get(&self, param: &Parameter) -> Option<&Value> {
        self.values.get(&param.id())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Compile-and-invoke capability consumed by the normalization passes
pub trait Evaluate: Send + Sync {
    /// Evaluate `expr` with the given parameter bindings
    fn evaluate_with(&self, expr: &ExprRef, bindings: &Bindings) -> EvalResult<Value>;

    /// Evaluate a closed expression
    fn evaluate(&self, expr: &ExprRef) -> EvalResult<Value> {
        self.evaluate_with(expr, &Bindings::default())
    }
}

/// A lambda evaluated to a function value, closing over the bindings that
/// were in scope when it was evaluated.
#[derive(Debug)]
pub struct LambdaClosure {
    params: Vec<Parameter>,
    body: ExprRef,
    captured: Bindings,
}

impl Callable for LambdaClosure {
    fn arity(&self) -> usize {
        self.params.len()
    }

    fn call(&self, args: &[Value], evaluator: &dyn Evaluate) -> EvalResult<Value> {
        if args.len() != self.params.len() {
            return Err(EvalError::Invocation {
                method: "lambda".to_string(),
                message: format!(
                    "expected {} argument(s), got {}",
                    self.params.len(),
                    args.len()
                ),
            });
        }
        let bindings = self
            .params
            .iter()
            .zip(args)
            .fold(self.captured.clone(), |acc, (p, v)| acc.with(p, v.clone()));
        evaluator.evaluate_with(&self.body, &bindings)
    }
}

type HostFn = dyn Fn(&[Value]) -> EvalResult<Value> + Send + Sync;

/// A function implemented by the host
pub struct HostFunction {
    name: String,
    arity: usize,
    func: Box<HostFn>,
}

impl HostFunction {
    pub fn new<F>(name: impl Into<String>, arity: usize, func: F) -> Self
    where
        F: Fn(&[Value]) -> EvalResult<Value> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            arity,
            func: Box::new(func),
        }
    }

    /// Wrap as a function value
    pub fn into_value(self) -> Value {
        Value::Function(Arc::new(self))
    }
}

impl std::fmt::Debug for HostFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostFunction")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish()
    }
}

impl Callable for HostFunction {
    fn arity(&self) -> usize {
        self.arity
    }

    fn call(&self, args: &[Value], _evaluator: &dyn Evaluate) -> EvalResult<Value> {
        if args.len() != self.arity {
            return Err(EvalError::Invocation {
                method: self.name.clone(),
                message: format!("expected {} argument(s), got {}", self.arity, args.len()),
            });
        }
        (self.func)(args)
    }
}

/// Tree-walking evaluator
#[derive(Debug, Clone, Copy)]
pub struct Interpreter {
    max_depth: usize,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl Interpreter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Interpreter that fails with `DepthExceeded` past `max_depth` nested nodes
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self { max_depth }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    fn eval(&self, expr: &ExprRef, bindings: &Bindings, depth: usize) -> EvalResult<Value> {
        if depth > self.max_depth {
            return Err(EvalError::DepthExceeded {
                limit: self.max_depth,
            });
        }
        let next = depth + 1;
        match &**expr {
            Expr::Constant { value, .. } => Ok(value.clone()),

            Expr::Parameter(p) => {
                bindings
                    .get(p)
                    .cloned()
                    .ok_or_else(|| EvalError::UnboundParameter {
                        name: p.name().to_string(),
                    })
            }

            Expr::Unary { op, operand, .. } => {
                let value = self.eval(operand, bindings, next)?;
                eval_unary(op, value)
            }

            Expr::Binary {
                op, left, right, ..
            } => self.eval_binary(*op, left, right, bindings, next),

            Expr::Conditional {
                test,
                if_true,
                if_false,
                ..
            } => {
                let test = self.eval(test, bindings, next)?;
                match test {
                    Value::Bool(true) => self.eval(if_true, bindings, next),
                    Value::Bool(false) => self.eval(if_false, bindings, next),
                    other => Err(mismatch("bool", &other)),
                }
            }

            Expr::Invoke { target, args, .. } => {
                let target = self.eval(target, bindings, next)?;
                let args = self.eval_all(args, bindings, next)?;
                match target {
                    Value::Function(func) => func.call(&args, self),
                    other => Err(EvalError::NotCallable {
                        found: other.kind_name().to_string(),
                    }),
                }
            }

            Expr::Lambda { params, body, .. } => Ok(Value::Function(Arc::new(LambdaClosure {
                params: params.clone(),
                body: body.clone(),
                captured: bindings.clone(),
            }))),

            Expr::Member { target, member } => match target {
                Some(target) => {
                    let receiver = self.eval(target, bindings, next)?;
                    member.read(Some(&receiver))
                }
                None => member.read(None),
            },

            Expr::Call {
                target,
                method,
                args,
                ..
            } => {
                let receiver = match target {
                    Some(t) => Some(self.eval(t, bindings, next)?),
                    None => None,
                };
                let args = self.eval_all(args, bindings, next)?;
                method.invoke(receiver.as_ref(), &args, self)
            }

            Expr::New { ty, members, args } => {
                let args = self.eval_all(args, bindings, next)?;
                let fields = args
                    .into_iter()
                    .enumerate()
                    .map(|(i, v)| {
                        let name = members
                            .get(i)
                            .cloned()
                            .unwrap_or_else(|| format!("item{}", i + 1));
                        (name, v)
                    })
                    .collect();
                Ok(Value::Record(Arc::new(Record::new(type_name(ty), fields))))
            }

            Expr::NewArray { items, .. } => {
                Ok(Value::sequence(self.eval_all(items, bindings, next)?))
            }

            Expr::MemberInit { new, bindings: assigns } => {
                let base = self.eval(new, bindings, next)?;
                let record = match &base {
                    Value::Record(r) => r,
                    other => return Err(mismatch("record", other)),
                };
                let mut fields = record.fields().to_vec();
                for (name, value) in assigns {
                    let value = self.eval(value, bindings, next)?;
                    match fields.iter_mut().find(|(n, _)| n == name) {
                        Some(slot) => slot.1 = value,
                        None => fields.push((name.clone(), value)),
                    }
                }
                Ok(Value::Record(Arc::new(Record::new(
                    record.type_name(),
                    fields,
                ))))
            }

            Expr::ListInit { new, items } => {
                let base = self.eval(new, bindings, next)?;
                let mut values = match &base {
                    Value::Sequence(items) => items.to_vec(),
                    Value::Record(r) if r.fields().is_empty() => Vec::new(),
                    other => return Err(mismatch("sequence", other)),
                };
                values.extend(self.eval_all(items, bindings, next)?);
                Ok(Value::sequence(values))
            }

            Expr::TypeIs { operand, target } => {
                let value = self.eval(operand, bindings, next)?;
                Ok(Value::Bool(value.is_instance_of(target)))
            }
        }
    }

    fn eval_all(
        &self,
        exprs: &[ExprRef],
        bindings: &Bindings,
        depth: usize,
    ) -> EvalResult<Vec<Value>> {
        exprs.iter().map(|e| self.eval(e, bindings, depth)).collect()
    }

    fn eval_binary(
        &self,
        op: BinaryOp,
        left: &ExprRef,
        right: &ExprRef,
        bindings: &Bindings,
        depth: usize,
    ) -> EvalResult<Value> {
        let lhs = self.eval(left, bindings, depth)?;
        match op {
            BinaryOp::And | BinaryOp::Or => {
                let l = lhs.as_bool().ok_or_else(|| mismatch("bool", &lhs))?;
                if (op == BinaryOp::And && !l) || (op == BinaryOp::Or && l) {
                    return Ok(Value::Bool(l));
                }
                let rhs = self.eval(right, bindings, depth)?;
                rhs.as_bool()
                    .map(Value::Bool)
                    .ok_or_else(|| mismatch("bool", &rhs))
            }
            BinaryOp::Coalesce => match lhs {
                Value::Null => self.eval(right, bindings, depth),
                other => Ok(other),
            },
            _ => {
                let rhs = self.eval(right, bindings, depth)?;
                apply_binary(op, &lhs, &rhs)
            }
        }
    }
}

impl Evaluate for Interpreter {
    fn evaluate_with(&self, expr: &ExprRef, bindings: &Bindings) -> EvalResult<Value> {
        self.eval(expr, bindings, 0)
    }
}

fn mismatch(expected: &str, found: &Value) -> EvalError {
    EvalError::TypeMismatch {
        expected: expected.to_string(),
        found: found.kind_name().to_string(),
    }
}

fn type_name(ty: &QueryType) -> String {
    match ty {
        QueryType::Object(name) => name.clone(),
        other => other.to_string(),
    }
}

fn eval_unary(op: &UnaryOp, value: Value) -> EvalResult<Value> {
    match (op, value) {
        (UnaryOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
        (UnaryOp::Negate, Value::Int(i)) => {
            i.checked_neg().map(Value::Int).ok_or_else(|| overflow("-"))
        }
        (UnaryOp::Negate, Value::Float(x)) => Ok(Value::Float(-x)),
        (UnaryOp::Convert(ty), value) => convert(value, ty),
        (UnaryOp::Not, other) => Err(mismatch("bool", &other)),
        (UnaryOp::Negate, other) => Err(mismatch("number", &other)),
    }
}

fn convert(value: Value, ty: &QueryType) -> EvalResult<Value> {
    match (value, ty) {
        (Value::Null, _) => Ok(Value::Null),
        (value, QueryType::Any) => Ok(value),
        (Value::Int(i), QueryType::Float) => Ok(Value::Float(i as f64)),
        (Value::Float(x), QueryType::Int) => float_to_int(x),
        (Value::String(s), QueryType::String) => Ok(Value::String(s)),
        (value, QueryType::String) => Ok(Value::string(value.to_string())),
        (value, ty) if value.is_instance_of(ty) => Ok(value),
        (value, ty) => Err(EvalError::TypeMismatch {
            expected: ty.to_string(),
            found: value.kind_name().to_string(),
        }),
    }
}

/// Truncate toward zero; NaN, infinities and out-of-range values do not fold
fn float_to_int(x: f64) -> EvalResult<Value> {
    let truncated = x.trunc();
    // `i64::MAX as f64` rounds up to 2^63, so the upper bound is exclusive.
    if truncated.is_finite() && truncated >= i64::MIN as f64 && truncated < i64::MAX as f64 {
        Ok(Value::Int(truncated as i64))
    } else {
        Err(overflow("convert"))
    }
}

fn overflow(op: &str) -> EvalError {
    EvalError::Invocation {
        method: op.to_string(),
        message: "integer overflow".to_string(),
    }
}

fn apply_binary(op: BinaryOp, lhs: &Value, rhs: &Value) -> EvalResult<Value> {
    if op.is_comparison() {
        return compare(op, lhs, rhs);
    }
    let symbol = op.to_string();
    match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => {
            let (a, b) = (*a, *b);
            let result = match op {
                BinaryOp::Add => a.checked_add(b),
                BinaryOp::Subtract => a.checked_sub(b),
                BinaryOp::Multiply => a.checked_mul(b),
                BinaryOp::Divide | BinaryOp::Modulo if b == 0 => {
                    return Err(EvalError::Invocation {
                        method: symbol,
                        message: "division by zero".to_string(),
                    })
                }
                BinaryOp::Divide => a.checked_div(b),
                BinaryOp::Modulo => a.checked_rem(b),
                _ => return Err(mismatch("bool", lhs)),
            };
            result.map(Value::Int).ok_or_else(|| overflow(&symbol))
        }
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
            let a = as_float(lhs);
            let b = as_float(rhs);
            let result = match op {
                BinaryOp::Add => a + b,
                BinaryOp::Subtract => a - b,
                BinaryOp::Multiply => a * b,
                BinaryOp::Divide => a / b,
                BinaryOp::Modulo => a % b,
                _ => return Err(mismatch("bool", lhs)),
            };
            Ok(Value::Float(result))
        }
        (Value::String(a), Value::String(b)) if op == BinaryOp::Add => {
            Ok(Value::string(format!("{a}{b}")))
        }
        _ => Err(EvalError::TypeMismatch {
            expected: format!("operands for '{symbol}'"),
            found: format!("{} and {}", lhs.kind_name(), rhs.kind_name()),
        }),
    }
}

fn as_float(value: &Value) -> f64 {
    match value {
        Value::Int(i) => *i as f64,
        Value::Float(x) => *x,
        _ => f64::NAN,
    }
}

fn compare(op: BinaryOp, lhs: &Value, rhs: &Value) -> EvalResult<Value> {
    let ordering = lhs.compare(rhs);
    let result = match op {
        BinaryOp::Equal => ordering.map_or_else(|| lhs == rhs, |o| o == Ordering::Equal),
        BinaryOp::NotEqual => ordering.map_or_else(|| lhs != rhs, |o| o != Ordering::Equal),
        _ => {
            let ordering = ordering.ok_or_else(|| EvalError::TypeMismatch {
                expected: "comparable operands".to_string(),
                found: format!("{} and {}", lhs.kind_name(), rhs.kind_name()),
            })?;
            match op {
                BinaryOp::LessThan => ordering == Ordering::Less,
                BinaryOp::LessThanOrEqual => ordering != Ordering::Greater,
                BinaryOp::GreaterThan => ordering == Ordering::Greater,
                _ => ordering != Ordering::Less,
            }
        }
    };
    Ok(Value::Bool(result))
}

/// Parameters referenced by `expr` that no enclosing lambda inside `expr`
/// binds, in first-occurrence order.
pub fn free_parameters(expr: &ExprRef) -> Vec<Parameter> {
    let mut bound = HashSet::new();
    let mut free = Vec::new();
    collect_free(expr, &mut bound, &mut free);
    free
}

fn collect_free(expr: &ExprRef, bound: &mut HashSet<u64>, free: &mut Vec<Parameter>) {
    match &**expr {
        Expr::Parameter(p) => {
            if !bound.contains(&p.id()) && !free.contains(p) {
                free.push(p.clone());
            }
        }
        Expr::Lambda { params, body, .. } => {
            let introduced: Vec<u64> = params
                .iter()
                .map(Parameter::id)
                .filter(|id| bound.insert(*id))
                .collect();
            collect_free(body, bound, free);
            for id in introduced {
                bound.remove(&id);
            }
        }
        other => {
            for child in other.children() {
                collect_free(&child, bound, free);
            }
        }
    }
}

/// A lambda can be compiled to a function value when it references no
/// parameters from an enclosing scope.
pub fn is_closed(expr: &ExprRef) -> bool {
    free_parameters(expr).is_empty()
}

#[cfg(test)]
#[path = "eval_test.rs"]
mod tests;
