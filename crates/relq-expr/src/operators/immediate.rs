//! Immediate operator implementations over materialized sequences

use super::SequenceOperator;
use crate::ast::Value;
use crate::error::{EvalError, EvalResult};
use crate::eval::Evaluate;
use std::cmp::Ordering;
use std::sync::Arc;

/// Apply `operator` to `args` (source first). Deferred sources are
/// materialized through their own provider.
pub(super) fn apply(
    operator: SequenceOperator,
    args: &[Value],
    evaluator: &dyn Evaluate,
) -> EvalResult<Value> {
    let (source, rest) = args.split_first().ok_or_else(|| invocation(operator, "missing source"))?;
    let items = materialize(source)?;

    match (operator, rest) {
        (SequenceOperator::Where, [predicate]) => {
            let mut kept = Vec::new();
            for item in items.iter() {
                if test(operator, predicate, item, evaluator)? {
                    kept.push(item.clone());
                }
            }
            Ok(Value::sequence(kept))
        }
        (SequenceOperator::Select, [selector]) => {
            let projected = items
                .iter()
                .map(|item| call(selector, item, evaluator))
                .collect::<EvalResult<Vec<_>>>()?;
            Ok(Value::sequence(projected))
        }
        (SequenceOperator::Take, [count]) => {
            let n = count_arg(operator, count)?;
            Ok(Value::sequence(items.iter().take(n).cloned().collect()))
        }
        (SequenceOperator::Skip, [count]) => {
            let n = count_arg(operator, count)?;
            Ok(Value::sequence(items.iter().skip(n).cloned().collect()))
        }
        (SequenceOperator::Count, []) => Ok(Value::Int(len(&items))),
        (SequenceOperator::Count, [predicate]) => {
            let mut n = 0;
            for item in items.iter() {
                if test(operator, predicate, item, evaluator)? {
                    n += 1;
                }
            }
            Ok(Value::Int(n))
        }
        (SequenceOperator::Any, []) => Ok(Value::Bool(!items.is_empty())),
        (SequenceOperator::Any, [predicate]) => {
            for item in items.iter() {
                if test(operator, predicate, item, evaluator)? {
                    return Ok(Value::Bool(true));
                }
            }
            Ok(Value::Bool(false))
        }
        (SequenceOperator::All, [predicate]) => {
            for item in items.iter() {
                if !test(operator, predicate, item, evaluator)? {
                    return Ok(Value::Bool(false));
                }
            }
            Ok(Value::Bool(true))
        }
        (SequenceOperator::First, []) => items
            .first()
            .cloned()
            .ok_or_else(|| invocation(operator, "sequence contains no elements")),
        (SequenceOperator::Contains, [needle]) => Ok(Value::Bool(items.contains(needle))),
        (SequenceOperator::Distinct, []) => {
            let mut seen: Vec<Value> = Vec::new();
            for item in items.iter() {
                if !seen.contains(item) {
                    seen.push(item.clone());
                }
            }
            Ok(Value::sequence(seen))
        }
        (SequenceOperator::OrderBy, [key]) => {
            let mut keyed = items
                .iter()
                .map(|item| Ok((call(key, item, evaluator)?, item.clone())))
                .collect::<EvalResult<Vec<_>>>()?;
            let mut incomparable = false;
            keyed.sort_by(|(a, _), (b, _)| {
                a.compare(b).unwrap_or_else(|| {
                    incomparable = true;
                    Ordering::Equal
                })
            });
            if incomparable {
                return Err(invocation(operator, "keys are not comparable"));
            }
            Ok(Value::sequence(keyed.into_iter().map(|(_, v)| v).collect()))
        }
        (SequenceOperator::Concat, [other]) => {
            let other = materialize(other)?;
            Ok(Value::sequence(
                items.iter().chain(other.iter()).cloned().collect(),
            ))
        }
        (SequenceOperator::Sum, []) => sum(&items),
        (SequenceOperator::ToList, []) => Ok(Value::Sequence(items)),
        (_, rest) => Err(invocation(
            operator,
            &format!("no overload takes {} argument(s)", rest.len() + 1),
        )),
    }
}

fn invocation(operator: SequenceOperator, message: &str) -> EvalError {
    EvalError::Invocation {
        method: operator.name().to_string(),
        message: message.to_string(),
    }
}

/// A sequence argument as a materialized item list
fn materialize(value: &Value) -> EvalResult<Arc<[Value]>> {
    match value {
        Value::Sequence(items) => Ok(items.clone()),
        Value::Query(source) => match source.provider().execute(source.expression())? {
            Value::Sequence(items) => Ok(items),
            other => Err(EvalError::TypeMismatch {
                expected: "sequence".to_string(),
                found: other.kind_name().to_string(),
            }),
        },
        other => Err(EvalError::TypeMismatch {
            expected: "sequence".to_string(),
            found: other.kind_name().to_string(),
        }),
    }
}

fn call(func: &Value, item: &Value, evaluator: &dyn Evaluate) -> EvalResult<Value> {
    match func {
        Value::Function(f) => f.call(std::slice::from_ref(item), evaluator),
        other => Err(EvalError::NotCallable {
            found: other.kind_name().to_string(),
        }),
    }
}

fn test(
    operator: SequenceOperator,
    predicate: &Value,
    item: &Value,
    evaluator: &dyn Evaluate,
) -> EvalResult<bool> {
    call(predicate, item, evaluator)?
        .as_bool()
        .ok_or_else(|| invocation(operator, "predicate returned a non-boolean value"))
}

fn count_arg(operator: SequenceOperator, value: &Value) -> EvalResult<usize> {
    match value {
        Value::Int(n) => Ok(usize::try_from(*n).unwrap_or(0)),
        other => Err(invocation(
            operator,
            &format!("count must be an int, got {}", other.kind_name()),
        )),
    }
}

fn len(items: &[Value]) -> i64 {
    i64::try_from(items.len()).unwrap_or(i64::MAX)
}

fn sum(items: &[Value]) -> EvalResult<Value> {
    let mut int_total: i64 = 0;
    let mut float_total: Option<f64> = None;
    for item in items {
        match item {
            Value::Int(i) => {
                int_total = int_total
                    .checked_add(*i)
                    .ok_or_else(|| invocation(SequenceOperator::Sum, "integer overflow"))?;
            }
            Value::Float(x) => *float_total.get_or_insert(0.0) += x,
            Value::Null => {}
            other => {
                return Err(EvalError::TypeMismatch {
                    expected: "number".to_string(),
                    found: other.kind_name().to_string(),
                })
            }
        }
    }
    Ok(match float_total {
        Some(total) => Value::Float(total + int_total as f64),
        None => Value::Int(int_total),
    })
}
