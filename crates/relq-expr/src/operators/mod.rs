//! Sequence operators and the deferred/immediate operator catalog
//!
//! Every sequence operator exists in two families: a deferred one over
//! `Queryable<T>` that builds a new query, and an immediate one over
//! `Sequence<T>` that computes its result. [`OperatorCatalog`] holds both
//! families and the sibling pairing between them, computed once from an
//! explicit definition table.

mod immediate;

use crate::ast::{Expr, ExprRef, Method, OperatorSignature, ParamKind, QueryType, ReturnKind, Value};
use crate::error::{EvalError, NormalizeError, NormalizeResult};
use crate::eval::Evaluate;
use crate::source::Query;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

/// Operator family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperatorFamily {
    /// Builds a new deferred query over `Queryable<T>`
    Deferred,
    /// Computes over a materialized `Sequence<T>`
    Immediate,
}

impl OperatorFamily {
    /// The other family
    pub fn sibling(self) -> Self {
        match self {
            OperatorFamily::Deferred => OperatorFamily::Immediate,
            OperatorFamily::Immediate => OperatorFamily::Deferred,
        }
    }

    /// Family selected by a source's static type
    pub fn of_type(ty: &QueryType) -> Self {
        if ty.is_queryable() {
            OperatorFamily::Deferred
        } else {
            OperatorFamily::Immediate
        }
    }

    /// Name of the type declaring this family's operators
    pub fn declaring_type_name(self) -> &'static str {
        match self {
            OperatorFamily::Deferred => "Queryable",
            OperatorFamily::Immediate => "Enumerable",
        }
    }

    fn lambda(self, arity: usize) -> ParamKind {
        match self {
            OperatorFamily::Deferred => ParamKind::Lambda(arity),
            OperatorFamily::Immediate => ParamKind::Delegate(arity),
        }
    }
}

impl std::fmt::Display for OperatorFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OperatorFamily::Deferred => write!(f, "deferred"),
            OperatorFamily::Immediate => write!(f, "immediate"),
        }
    }
}

/// Sequence operator identity, shared by both families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SequenceOperator {
    Where,
    Select,
    Take,
    Skip,
    Count,
    Any,
    All,
    First,
    Contains,
    Distinct,
    OrderBy,
    Concat,
    Sum,
    ToList,
}

impl SequenceOperator {
    pub fn name(self) -> &'static str {
        match self {
            SequenceOperator::Where => "where",
            SequenceOperator::Select => "select",
            SequenceOperator::Take => "take",
            SequenceOperator::Skip => "skip",
            SequenceOperator::Count => "count",
            SequenceOperator::Any => "any",
            SequenceOperator::All => "all",
            SequenceOperator::First => "first",
            SequenceOperator::Contains => "contains",
            SequenceOperator::Distinct => "distinct",
            SequenceOperator::OrderBy => "order_by",
            SequenceOperator::Concat => "concat",
            SequenceOperator::Sum => "sum",
            SequenceOperator::ToList => "to_list",
        }
    }

    /// Whether the operator has no deferred form
    pub fn is_immediate_only(self) -> bool {
        definitions()
            .iter()
            .any(|definition| definition.operator == self && !definition.deferred)
    }
}

impl std::fmt::Display for SequenceOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Shape of one operator overload, independent of family
struct Definition {
    operator: SequenceOperator,
    /// Arguments after the source
    args: &'static [ArgShape],
    returns: ReturnKind,
    /// `false` for operators that only exist in the immediate family
    deferred: bool,
}

#[derive(Clone, Copy)]
enum ArgShape {
    Function1,
    Int,
    AnyValue,
    Source,
}

fn definitions() -> Vec<Definition> {
    use ArgShape::*;
    use SequenceOperator as Op;

    fn def(operator: Op, args: &'static [ArgShape], returns: ReturnKind) -> Definition {
        Definition {
            operator,
            args,
            returns,
            deferred: true,
        }
    }

    vec![
        def(Op::Where, &[Function1], ReturnKind::SourceSequence),
        def(Op::Select, &[Function1], ReturnKind::ProjectedSequence),
        def(Op::Take, &[Int], ReturnKind::SourceSequence),
        def(Op::Skip, &[Int], ReturnKind::SourceSequence),
        def(Op::Count, &[], ReturnKind::Fixed(QueryType::Int)),
        def(Op::Count, &[Function1], ReturnKind::Fixed(QueryType::Int)),
        def(Op::Any, &[], ReturnKind::Fixed(QueryType::Bool)),
        def(Op::Any, &[Function1], ReturnKind::Fixed(QueryType::Bool)),
        def(Op::All, &[Function1], ReturnKind::Fixed(QueryType::Bool)),
        def(Op::First, &[], ReturnKind::Element),
        def(Op::Contains, &[AnyValue], ReturnKind::Fixed(QueryType::Bool)),
        def(Op::Distinct, &[], ReturnKind::SourceSequence),
        def(Op::OrderBy, &[Function1], ReturnKind::SourceSequence),
        def(Op::Concat, &[Source], ReturnKind::SourceSequence),
        def(Op::Sum, &[], ReturnKind::Element),
        Definition {
            operator: Op::ToList,
            args: &[],
            returns: ReturnKind::SourceSequence,
            deferred: false,
        },
    ]
}

fn build_method(definition: &Definition, family: OperatorFamily) -> Method {
    let mut params = vec![ParamKind::Source];
    params.extend(definition.args.iter().map(|shape| match shape {
        ArgShape::Function1 => family.lambda(1),
        ArgShape::Int => ParamKind::Value(QueryType::Int),
        ArgShape::AnyValue => ParamKind::Value(QueryType::Any),
        ArgShape::Source => ParamKind::Source,
    }));
    let signature = OperatorSignature {
        operator: definition.operator,
        family,
    };
    let operator = definition.operator;
    let arity = params.len();
    let invoke: crate::ast::Invoker = match family {
        OperatorFamily::Immediate => Arc::new(move |_, args, evaluator| {
            immediate::apply(operator, args, evaluator)
        }),
        OperatorFamily::Deferred => Arc::new(move |_, args, evaluator| {
            deferred_apply(operator, arity, args, evaluator)
        }),
    };
    Method::operator(signature, params, definition.returns.clone(), invoke)
}

/// A deferred operator over a query builds a new query owned by the same
/// provider; over a materialized sequence it computes immediately.
fn deferred_apply(
    operator: SequenceOperator,
    arity: usize,
    args: &[Value],
    evaluator: &dyn Evaluate,
) -> Result<Value, EvalError> {
    let source = match args.first() {
        Some(Value::Query(source)) => source.clone(),
        _ => return immediate::apply(operator, args, evaluator),
    };
    let method = OperatorCatalog::standard()
        .method(OperatorFamily::Deferred, operator, arity)
        .map_err(|e| EvalError::Execution(e.to_string()))?
        .clone();
    let call_args: Vec<ExprRef> = args
        .iter()
        .map(|v| Expr::constant(v.clone(), v.static_type()))
        .collect();
    let call = Expr::call(None, method, call_args);
    let element_type = call
        .ty()
        .element_type()
        .cloned()
        .unwrap_or(QueryType::Any);
    if !call.ty().is_queryable() {
        // Scalar-valued operators execute right away.
        return source.provider().execute(&call);
    }
    Ok(Query::new(source.provider().clone(), call, element_type).into_value())
}

type CatalogKey = (SequenceOperator, usize, OperatorFamily);

/// Both operator families plus their sibling pairing
#[derive(Debug)]
pub struct OperatorCatalog {
    methods: HashMap<CatalogKey, Arc<Method>>,
    siblings: HashMap<CatalogKey, Arc<Method>>,
}

impl OperatorCatalog {
    /// Build a catalog over `methods`. Non-operator methods are ignored.
    ///
    /// Siblings are paired by operator name, arity and parameter
    /// compatibility, where a quoted lambda matches a compiled function of
    /// the same arity.
    pub fn new(methods: Vec<Arc<Method>>) -> Self {
        let mut by_key: HashMap<CatalogKey, Arc<Method>> = HashMap::new();
        for method in methods {
            match method.signature() {
                Some(sig) => {
                    by_key.insert((sig.operator, method.arity(), sig.family), method);
                }
                None => log::debug!("Skipping non-operator method '{}'", method.name()),
            }
        }

        let mut siblings = HashMap::new();
        for (key, method) in &by_key {
            let (operator, arity, family) = *key;
            let Some(candidate) = by_key.get(&(operator, arity, family.sibling())) else {
                continue;
            };
            let compatible = method
                .params()
                .iter()
                .zip(candidate.params())
                .all(|(a, b)| a.is_compatible_with(b));
            if compatible && method.name() == candidate.name() {
                siblings.insert(*key, candidate.clone());
            }
        }

        Self {
            methods: by_key,
            siblings,
        }
    }

    /// The standard catalog, built once
    pub fn standard() -> Arc<OperatorCatalog> {
        static STANDARD: OnceLock<Arc<OperatorCatalog>> = OnceLock::new();
        STANDARD
            .get_or_init(|| {
                let catalog = OperatorCatalog::new(standard_methods());
                log::debug!(
                    "Built operator catalog: {} methods, {} unpaired",
                    catalog.len(),
                    catalog.unpaired().len()
                );
                Arc::new(catalog)
            })
            .clone()
    }

    /// Number of registered methods across both families
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    /// Look up an operator overload
    pub fn method(
        &self,
        family: OperatorFamily,
        operator: SequenceOperator,
        arity: usize,
    ) -> NormalizeResult<&Arc<Method>> {
        self.methods
            .get(&(operator, arity, family))
            .ok_or_else(|| NormalizeError::UnknownOperator {
                operator: operator.name().to_string(),
                arity,
                family,
            })
    }

    /// The overload equivalent to `method` in `family`; `method` itself when
    /// it already belongs to `family`.
    pub fn equivalent(
        &self,
        method: &Arc<Method>,
        family: OperatorFamily,
    ) -> NormalizeResult<Arc<Method>> {
        let Some(sig) = method.signature() else {
            return Err(NormalizeError::UnknownOperator {
                operator: method.name().to_string(),
                arity: method.arity(),
                family,
            });
        };
        if sig.family == family {
            return Ok(method.clone());
        }
        self.siblings
            .get(&(sig.operator, method.arity(), sig.family))
            .cloned()
            .ok_or_else(|| NormalizeError::MissingEquivalent {
                operator: method.name().to_string(),
                arity: method.arity(),
                family,
            })
    }

    /// Registered methods with no sibling, ordered by operator and arity
    pub fn unpaired(&self) -> Vec<&Arc<Method>> {
        let mut keys: Vec<&CatalogKey> = self
            .methods
            .keys()
            .filter(|k| !self.siblings.contains_key(*k))
            .collect();
        keys.sort_by_key(|(op, arity, family)| (*op, *arity, *family == OperatorFamily::Immediate));
        keys.into_iter().filter_map(|k| self.methods.get(k)).collect()
    }
}

/// Every operator overload of both families
pub fn standard_methods() -> Vec<Arc<Method>> {
    let mut methods = Vec::new();
    for definition in definitions() {
        if definition.deferred {
            methods.push(Arc::new(build_method(&definition, OperatorFamily::Deferred)));
        }
        methods.push(Arc::new(build_method(&definition, OperatorFamily::Immediate)));
    }
    methods
}

/// A static call to a standard sequence operator with `args` (source first)
pub fn sequence_call(
    family: OperatorFamily,
    operator: SequenceOperator,
    args: Vec<ExprRef>,
) -> NormalizeResult<ExprRef> {
    let catalog = OperatorCatalog::standard();
    let method = catalog.method(family, operator, args.len())?.clone();
    Ok(Expr::call(None, method, args))
}

#[cfg(test)]
#[path = "operators_test.rs"]
mod tests;
