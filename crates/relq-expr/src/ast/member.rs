//! Resolved members and methods referenced by AST nodes

use super::types::QueryType;
use super::value::Value;
use crate::error::{EvalError, EvalResult};
use crate::eval::Evaluate;
use crate::operators::{OperatorFamily, SequenceOperator};
use std::sync::Arc;

/// Reads a member from an optional receiver (`None` for static members)
pub type Getter = Arc<dyn Fn(Option<&Value>) -> EvalResult<Value> + Send + Sync>;

/// Invokes a method on an optional receiver with evaluated arguments
pub type Invoker = Arc<dyn Fn(Option<&Value>, &[Value], &dyn Evaluate) -> EvalResult<Value> + Send + Sync>;

/// A property or field
#[derive(Clone)]
pub struct Member {
    name: String,
    declaring_type: QueryType,
    member_type: QueryType,
    is_static: bool,
    getter: Getter,
}

impl Member {
    /// A record field, read by name from the receiver
    pub fn field(declaring_type: QueryType, name: impl Into<String>, member_type: QueryType) -> Self {
        let name = name.into();
        let field_name = name.clone();
        Self {
            name,
            declaring_type,
            member_type,
            is_static: false,
            getter: Arc::new(move |target| match target {
                Some(Value::Record(record)) => {
                    record
                        .get(&field_name)
                        .cloned()
                        .ok_or_else(|| EvalError::MemberRead {
                            member: field_name.clone(),
                            message: format!("record '{}' has no such field", record.type_name()),
                        })
                }
                Some(other) => Err(EvalError::TypeMismatch {
                    expected: "record".to_string(),
                    found: other.kind_name().to_string(),
                }),
                None => Err(EvalError::MemberRead {
                    member: field_name.clone(),
                    message: "instance member read without a receiver".to_string(),
                }),
            }),
        }
    }

    /// An instance property with a custom getter
    pub fn property<F>(
        declaring_type: QueryType,
        name: impl Into<String>,
        member_type: QueryType,
        getter: F,
    ) -> Self
    where
        F: Fn(&Value) -> EvalResult<Value> + Send + Sync + 'static,
    {
        let name = name.into();
        let member = name.clone();
        Self {
            name,
            declaring_type,
            member_type,
            is_static: false,
            getter: Arc::new(move |target| match target {
                Some(value) => getter(value),
                None => Err(EvalError::MemberRead {
                    member: member.clone(),
                    message: "instance member read without a receiver".to_string(),
                }),
            }),
        }
    }

    /// A static property
    pub fn static_property<F>(
        declaring_type: QueryType,
        name: impl Into<String>,
        member_type: QueryType,
        getter: F,
    ) -> Self
    where
        F: Fn() -> EvalResult<Value> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            declaring_type,
            member_type,
            is_static: true,
            getter: Arc::new(move |_| getter()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn declaring_type(&self) -> &QueryType {
        &self.declaring_type
    }

    /// Declared type of the member; folded reads are typed with it
    pub fn member_type(&self) -> &QueryType {
        &self.member_type
    }

    pub fn is_static(&self) -> bool {
        self.is_static
    }

    /// Read the member. Static members ignore the receiver.
    pub fn read(&self, target: Option<&Value>) -> EvalResult<Value> {
        if self.is_static {
            (self.getter)(None)
        } else {
            (self.getter)(target)
        }
    }
}

/// Members are the same resolved member when name, owner, type and
/// staticness agree.
impl PartialEq for Member {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.declaring_type == other.declaring_type
            && self.member_type == other.member_type
            && self.is_static == other.is_static
    }
}

impl std::fmt::Debug for Member {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Member")
            .field("name", &self.name)
            .field("declaring_type", &self.declaring_type)
            .field("member_type", &self.member_type)
            .field("is_static", &self.is_static)
            .finish()
    }
}

/// Shape of a method parameter, used to pair operator siblings
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParamKind {
    /// The sequence an operator runs over (deferred or materialized)
    Source,
    /// A plain value of the given type
    Value(QueryType),
    /// A quoted lambda of the given arity (deferred family)
    Lambda(usize),
    /// A compiled function of the given arity (immediate family)
    Delegate(usize),
}

impl ParamKind {
    /// Parameter compatibility for sibling matching: a quoted lambda matches
    /// a compiled function of the same arity.
    pub fn is_compatible_with(&self, other: &ParamKind) -> bool {
        match (self, other) {
            (ParamKind::Source, ParamKind::Source) => true,
            (ParamKind::Value(a), ParamKind::Value(b)) => a == b,
            (ParamKind::Lambda(a), ParamKind::Lambda(b))
            | (ParamKind::Lambda(a), ParamKind::Delegate(b))
            | (ParamKind::Delegate(a), ParamKind::Lambda(b))
            | (ParamKind::Delegate(a), ParamKind::Delegate(b)) => a == b,
            _ => false,
        }
    }
}

/// How a method's result type is derived from its arguments
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ReturnKind {
    /// Always this type
    Fixed(QueryType),
    /// The family's sequence type over the source's element type
    SourceSequence,
    /// The family's sequence type over the selector lambda's return type
    ProjectedSequence,
    /// The source's element type
    Element,
}

/// Operator identity of a sequence method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OperatorSignature {
    pub operator: SequenceOperator,
    pub family: OperatorFamily,
}

/// A resolved method
#[derive(Clone)]
pub struct Method {
    name: String,
    declaring_type: QueryType,
    params: Vec<ParamKind>,
    returns: ReturnKind,
    operator: Option<OperatorSignature>,
    invoke: Invoker,
}

impl Method {
    /// A host method (not a sequence operator)
    pub fn new<F>(
        declaring_type: QueryType,
        name: impl Into<String>,
        params: Vec<ParamKind>,
        returns: QueryType,
        invoke: F,
    ) -> Self
    where
        F: Fn(Option<&Value>, &[Value]) -> EvalResult<Value> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            declaring_type,
            params,
            returns: ReturnKind::Fixed(returns),
            operator: None,
            invoke: Arc::new(move |target, args, _| invoke(target, args)),
        }
    }

    /// A sequence operator belonging to `family`
    pub(crate) fn operator(
        signature: OperatorSignature,
        params: Vec<ParamKind>,
        returns: ReturnKind,
        invoke: Invoker,
    ) -> Self {
        Self {
            name: signature.operator.name().to_string(),
            declaring_type: QueryType::object(signature.family.declaring_type_name()),
            params,
            returns,
            operator: Some(signature),
            invoke,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn declaring_type(&self) -> &QueryType {
        &self.declaring_type
    }

    pub fn params(&self) -> &[ParamKind] {
        &self.params
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    pub fn returns(&self) -> &ReturnKind {
        &self.returns
    }

    /// Operator identity, if this method is a sequence operator
    pub fn signature(&self) -> Option<OperatorSignature> {
        self.operator
    }

    /// Family this method belongs to, if it is a sequence operator
    pub fn family(&self) -> Option<OperatorFamily> {
        self.operator.map(|sig| sig.family)
    }

    /// Static result type of a call with the given argument types.
    ///
    /// Sequence operators take their source as the first argument.
    pub fn result_type(&self, arg_types: &[&QueryType]) -> QueryType {
        let source_element = || {
            arg_types
                .first()
                .and_then(|t| t.element_type())
                .cloned()
                .unwrap_or(QueryType::Any)
        };
        let wrap = |elem: QueryType| match self.family() {
            Some(OperatorFamily::Deferred) => QueryType::queryable(elem),
            _ => QueryType::sequence(elem),
        };
        match &self.returns {
            ReturnKind::Fixed(ty) => ty.clone(),
            ReturnKind::SourceSequence => wrap(source_element()),
            ReturnKind::ProjectedSequence => wrap(
                arg_types
                    .get(1)
                    .and_then(|t| t.return_type())
                    .cloned()
                    .unwrap_or(QueryType::Any),
            ),
            ReturnKind::Element => source_element(),
        }
    }

    /// Invoke with an optional receiver and evaluated arguments
    pub fn invoke(
        &self,
        target: Option<&Value>,
        args: &[Value],
        evaluator: &dyn Evaluate,
    ) -> EvalResult<Value> {
        if args.len() != self.params.len() {
            return Err(EvalError::Invocation {
                method: self.name.clone(),
                message: format!(
                    "expected {} argument(s), got {}",
                    self.params.len(),
                    args.len()
                ),
            });
        }
        (self.invoke)(target, args, evaluator)
    }
}

/// Methods are the same resolved method when owner, name, parameters and
/// operator identity agree.
impl PartialEq for Method {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.declaring_type == other.declaring_type
            && self.params == other.params
            && self.returns == other.returns
            && self.operator == other.operator
    }
}

impl std::fmt::Debug for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Method")
            .field("name", &self.name)
            .field("declaring_type", &self.declaring_type)
            .field("params", &self.params)
            .field("returns", &self.returns)
            .field("operator", &self.operator)
            .finish()
    }
}
