//! Query AST: an immutable, typed expression tree
//!
//! Nodes are shared behind [`ExprRef`]; rewrites build new nodes and reuse
//! unchanged children by reference, so `Arc::ptr_eq` on a child tells a
//! caller that nothing below it changed.

pub mod member;
pub mod types;
pub mod value;

pub use member::{Getter, Invoker, Member, Method, OperatorSignature, ParamKind, ReturnKind};
pub use types::QueryType;
pub use value::{Record, Value};

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Shared handle to an immutable AST node
pub type ExprRef = Arc<Expr>;

/// Node-kind tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExprKind {
    Unary,
    Binary,
    Conditional,
    Constant,
    Invoke,
    Lambda,
    Member,
    Call,
    New,
    NewArray,
    MemberInit,
    ListInit,
    Parameter,
    TypeIs,
}

impl std::fmt::Display for ExprKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ExprKind::Unary => "unary",
            ExprKind::Binary => "binary",
            ExprKind::Conditional => "conditional",
            ExprKind::Constant => "constant",
            ExprKind::Invoke => "invocation",
            ExprKind::Lambda => "lambda",
            ExprKind::Member => "member-access",
            ExprKind::Call => "method-call",
            ExprKind::New => "constructor-call",
            ExprKind::NewArray => "array-construction",
            ExprKind::MemberInit => "member-init",
            ExprKind::ListInit => "list-init",
            ExprKind::Parameter => "parameter",
            ExprKind::TypeIs => "type-check",
        };
        f.write_str(name)
    }
}

/// Unary operator
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// Logical NOT
    Not,
    /// Arithmetic negation
    Negate,
    /// Conversion to the given type
    Convert(QueryType),
}

impl std::fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnaryOp::Not => write!(f, "!"),
            UnaryOp::Negate => write!(f, "-"),
            UnaryOp::Convert(ty) => write!(f, "({ty})"),
        }
    }
}

/// Binary operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    /// Short-circuit logical AND
    And,
    /// Short-circuit logical OR
    Or,
    /// `left ?? right`
    Coalesce,
}

impl BinaryOp {
    /// Check if this is a comparison operator
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOp::Equal
                | BinaryOp::NotEqual
                | BinaryOp::LessThan
                | BinaryOp::LessThanOrEqual
                | BinaryOp::GreaterThan
                | BinaryOp::GreaterThanOrEqual
        )
    }

    /// Check if this is a logical operator
    pub fn is_logical(&self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }
}

impl std::fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BinaryOp::Add => write!(f, "+"),
            BinaryOp::Subtract => write!(f, "-"),
            BinaryOp::Multiply => write!(f, "*"),
            BinaryOp::Divide => write!(f, "/"),
            BinaryOp::Modulo => write!(f, "%"),
            BinaryOp::Equal => write!(f, "=="),
            BinaryOp::NotEqual => write!(f, "!="),
            BinaryOp::LessThan => write!(f, "<"),
            BinaryOp::LessThanOrEqual => write!(f, "<="),
            BinaryOp::GreaterThan => write!(f, ">"),
            BinaryOp::GreaterThanOrEqual => write!(f, ">="),
            BinaryOp::And => write!(f, "&&"),
            BinaryOp::Or => write!(f, "||"),
            BinaryOp::Coalesce => write!(f, "??"),
        }
    }
}

static NEXT_PARAMETER_ID: AtomicU64 = AtomicU64::new(1);

/// A lambda parameter. Identity is a process-unique id, so two parameters
/// with the same name in different lambdas never alias.
#[derive(Debug, Clone)]
pub struct Parameter {
    id: u64,
    name: String,
    ty: QueryType,
}

impl Parameter {
    pub fn new(name: impl Into<String>, ty: QueryType) -> Self {
        Self {
            id: NEXT_PARAMETER_ID.fetch_add(1, Ordering::Relaxed),
            name: name.into(),
            ty,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> &QueryType {
        &self.ty
    }
}

impl PartialEq for Parameter {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Parameter {}

/// Query AST node. Every node has a static result type, see [`Expr::ty`].
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// `op operand`
    Unary {
        op: UnaryOp,
        operand: ExprRef,
        ty: QueryType,
    },

    /// `left op right`
    Binary {
        op: BinaryOp,
        left: ExprRef,
        right: ExprRef,
        ty: QueryType,
    },

    /// `test ? if_true : if_false`
    Conditional {
        test: ExprRef,
        if_true: ExprRef,
        if_false: ExprRef,
        ty: QueryType,
    },

    /// A literal or captured value
    Constant { value: Value, ty: QueryType },

    /// Application of a function-valued expression
    Invoke {
        target: ExprRef,
        args: Vec<ExprRef>,
        ty: QueryType,
    },

    /// `(params) => body`
    Lambda {
        params: Vec<Parameter>,
        body: ExprRef,
        ty: QueryType,
    },

    /// Property or field read; no target for static members
    Member {
        target: Option<ExprRef>,
        member: Arc<Member>,
    },

    /// Method call; sequence operators are static and take the source as
    /// their first argument
    Call {
        target: Option<ExprRef>,
        method: Arc<Method>,
        args: Vec<ExprRef>,
        ty: QueryType,
    },

    /// Constructor call initializing the named members positionally
    New {
        ty: QueryType,
        members: Vec<String>,
        args: Vec<ExprRef>,
    },

    /// Array of `element` built from `items`
    NewArray {
        element: QueryType,
        items: Vec<ExprRef>,
        ty: QueryType,
    },

    /// Constructor call followed by member assignments
    MemberInit {
        new: ExprRef,
        bindings: Vec<(String, ExprRef)>,
    },

    /// Constructor call followed by element additions
    ListInit { new: ExprRef, items: Vec<ExprRef> },

    /// Reference to a lambda parameter
    Parameter(Parameter),

    /// `operand is target`
    TypeIs { operand: ExprRef, target: QueryType },
}

static BOOL: QueryType = QueryType::Bool;

impl Expr {
    /// A constant with an explicit static type
    pub fn constant(value: Value, ty: QueryType) -> ExprRef {
        Arc::new(Expr::Constant { value, ty })
    }

    /// A constant typed by its value
    pub fn literal(value: impl Into<Value>) -> ExprRef {
        let value = value.into();
        let ty = value.static_type();
        Arc::new(Expr::Constant { value, ty })
    }

    pub fn unary(op: UnaryOp, operand: ExprRef) -> ExprRef {
        let ty = match &op {
            UnaryOp::Not => QueryType::Bool,
            UnaryOp::Negate => operand.ty().clone(),
            UnaryOp::Convert(target) => target.clone(),
        };
        Arc::new(Expr::Unary { op, operand, ty })
    }

    pub fn binary(op: BinaryOp, left: ExprRef, right: ExprRef) -> ExprRef {
        let ty = if op.is_comparison() || op.is_logical() {
            QueryType::Bool
        } else if left.ty() == &QueryType::Int && right.ty() == &QueryType::Float {
            QueryType::Float
        } else {
            left.ty().clone()
        };
        Arc::new(Expr::Binary {
            op,
            left,
            right,
            ty,
        })
    }

    pub fn conditional(test: ExprRef, if_true: ExprRef, if_false: ExprRef) -> ExprRef {
        let ty = if_true.ty().clone();
        Arc::new(Expr::Conditional {
            test,
            if_true,
            if_false,
            ty,
        })
    }

    pub fn invoke(target: ExprRef, args: Vec<ExprRef>) -> ExprRef {
        let ty = target.ty().return_type().cloned().unwrap_or(QueryType::Any);
        Arc::new(Expr::Invoke { target, args, ty })
    }

    pub fn lambda(params: Vec<Parameter>, body: ExprRef) -> ExprRef {
        let ty = QueryType::function(
            params.iter().map(|p| p.ty().clone()).collect(),
            body.ty().clone(),
        );
        Arc::new(Expr::Lambda { params, body, ty })
    }

    pub fn member(target: Option<ExprRef>, member: Arc<Member>) -> ExprRef {
        Arc::new(Expr::Member { target, member })
    }

    /// A method call; the result type is derived from the method
    pub fn call(target: Option<ExprRef>, method: Arc<Method>, args: Vec<ExprRef>) -> ExprRef {
        let arg_types: Vec<&QueryType> = args.iter().map(|a| a.ty()).collect();
        let ty = method.result_type(&arg_types);
        Arc::new(Expr::Call {
            target,
            method,
            args,
            ty,
        })
    }

    pub fn new_object(ty: QueryType, members: Vec<String>, args: Vec<ExprRef>) -> ExprRef {
        Arc::new(Expr::New { ty, members, args })
    }

    pub fn new_array(element: QueryType, items: Vec<ExprRef>) -> ExprRef {
        let ty = QueryType::sequence(element.clone());
        Arc::new(Expr::NewArray { element, items, ty })
    }

    pub fn member_init(new: ExprRef, bindings: Vec<(String, ExprRef)>) -> ExprRef {
        Arc::new(Expr::MemberInit { new, bindings })
    }

    pub fn list_init(new: ExprRef, items: Vec<ExprRef>) -> ExprRef {
        Arc::new(Expr::ListInit { new, items })
    }

    pub fn parameter(param: &Parameter) -> ExprRef {
        Arc::new(Expr::Parameter(param.clone()))
    }

    pub fn type_is(operand: ExprRef, target: QueryType) -> ExprRef {
        Arc::new(Expr::TypeIs { operand, target })
    }

    /// Node-kind tag
    pub fn kind(&self) -> ExprKind {
        match self {
            Expr::Unary { .. } => ExprKind::Unary,
            Expr::Binary { .. } => ExprKind::Binary,
            Expr::Conditional { .. } => ExprKind::Conditional,
            Expr::Constant { .. } => ExprKind::Constant,
            Expr::Invoke { .. } => ExprKind::Invoke,
            Expr::Lambda { .. } => ExprKind::Lambda,
            Expr::Member { .. } => ExprKind::Member,
            Expr::Call { .. } => ExprKind::Call,
            Expr::New { .. } => ExprKind::New,
            Expr::NewArray { .. } => ExprKind::NewArray,
            Expr::MemberInit { .. } => ExprKind::MemberInit,
            Expr::ListInit { .. } => ExprKind::ListInit,
            Expr::Parameter(_) => ExprKind::Parameter,
            Expr::TypeIs { .. } => ExprKind::TypeIs,
        }
    }

    /// Static result type
    pub fn ty(&self) -> &QueryType {
        match self {
            Expr::Unary { ty, .. }
            | Expr::Binary { ty, .. }
            | Expr::Conditional { ty, .. }
            | Expr::Constant { ty, .. }
            | Expr::Invoke { ty, .. }
            | Expr::Lambda { ty, .. }
            | Expr::Call { ty, .. }
            | Expr::New { ty, .. }
            | Expr::NewArray { ty, .. } => ty,
            Expr::Member { member, .. } => member.member_type(),
            Expr::MemberInit { new, .. } | Expr::ListInit { new, .. } => new.ty(),
            Expr::Parameter(p) => p.ty(),
            Expr::TypeIs { .. } => &BOOL,
        }
    }

    /// The value of a constant node
    pub fn as_constant(&self) -> Option<&Value> {
        match self {
            Expr::Constant { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn is_constant(&self) -> bool {
        matches!(self, Expr::Constant { .. })
    }

    /// Direct children in evaluation order
    pub fn children(&self) -> Vec<ExprRef> {
        match self {
            Expr::Unary { operand, .. } => vec![operand.clone()],
            Expr::Binary { left, right, .. } => vec![left.clone(), right.clone()],
            Expr::Conditional {
                test,
                if_true,
                if_false,
                ..
            } => vec![test.clone(), if_true.clone(), if_false.clone()],
            Expr::Constant { .. } | Expr::Parameter(_) => Vec::new(),
            Expr::Invoke { target, args, .. } => {
                std::iter::once(target).chain(args).cloned().collect()
            }
            Expr::Lambda { body, .. } => vec![body.clone()],
            Expr::Member { target, .. } => target.iter().cloned().collect(),
            Expr::Call { target, args, .. } => target.iter().chain(args).cloned().collect(),
            Expr::New { args, .. } => args.clone(),
            Expr::NewArray { items, .. } => items.clone(),
            Expr::MemberInit { new, bindings } => std::iter::once(new.clone())
                .chain(bindings.iter().map(|(_, e)| e.clone()))
                .collect(),
            Expr::ListInit { new, items } => {
                std::iter::once(new).chain(items).cloned().collect()
            }
            Expr::TypeIs { operand, .. } => vec![operand.clone()],
        }
    }

    /// Rebuild this node over new children, in [`Expr::children`] order.
    ///
    /// Types derived from children are recomputed. A mismatched child count
    /// returns an unchanged copy of the node.
    pub fn with_children(&self, children: Vec<ExprRef>) -> ExprRef {
        if children.len() != self.children().len() {
            return Arc::new(self.clone());
        }
        let mut it = children.into_iter();
        let mut next = || it.next().unwrap_or_else(|| Expr::literal(Value::Null));
        match self {
            Expr::Unary { op, .. } => Expr::unary(op.clone(), next()),
            Expr::Binary { op, .. } => {
                let left = next();
                Expr::binary(*op, left, next())
            }
            Expr::Conditional { .. } => {
                let test = next();
                let if_true = next();
                Expr::conditional(test, if_true, next())
            }
            Expr::Constant { .. } | Expr::Parameter(_) => Arc::new(self.clone()),
            Expr::Invoke { args, .. } => {
                let target = next();
                let args = args.iter().map(|_| next()).collect();
                Expr::invoke(target, args)
            }
            Expr::Lambda { params, .. } => Expr::lambda(params.clone(), next()),
            Expr::Member { target, member } => {
                let target = target.as_ref().map(|_| next());
                Expr::member(target, member.clone())
            }
            Expr::Call {
                target,
                method,
                args,
                ..
            } => {
                let target = target.as_ref().map(|_| next());
                let args = args.iter().map(|_| next()).collect();
                Expr::call(target, method.clone(), args)
            }
            Expr::New { ty, members, args } => Expr::new_object(
                ty.clone(),
                members.clone(),
                args.iter().map(|_| next()).collect(),
            ),
            Expr::NewArray { element, items, .. } => {
                Expr::new_array(element.clone(), items.iter().map(|_| next()).collect())
            }
            Expr::MemberInit { bindings, .. } => {
                let new = next();
                let bindings = bindings
                    .iter()
                    .map(|(name, _)| (name.clone(), next()))
                    .collect();
                Expr::member_init(new, bindings)
            }
            Expr::ListInit { items, .. } => {
                let new = next();
                let items = items.iter().map(|_| next()).collect();
                Expr::list_init(new, items)
            }
            Expr::TypeIs { target, .. } => Expr::type_is(next(), target.clone()),
        }
    }

    /// Two nodes are matchable for rewriting when kind, result type and (for
    /// operators) the resolved operator, member or method agree.
    pub fn is_matchable(&self, other: &Expr) -> bool {
        if self.kind() != other.kind() || self.ty() != other.ty() {
            return false;
        }
        match (self, other) {
            (Expr::Unary { op: a, .. }, Expr::Unary { op: b, .. }) => a == b,
            (Expr::Binary { op: a, .. }, Expr::Binary { op: b, .. }) => a == b,
            (Expr::Member { member: a, .. }, Expr::Member { member: b, .. }) => a == b,
            (Expr::Call { method: a, .. }, Expr::Call { method: b, .. }) => a == b,
            _ => true,
        }
    }
}

fn write_list(f: &mut std::fmt::Formatter<'_>, items: &[ExprRef]) -> std::fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

impl std::fmt::Display for Expr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expr::Unary { op, operand, .. } => write!(f, "{op}{operand}"),
            Expr::Binary {
                op, left, right, ..
            } => write!(f, "({left} {op} {right})"),
            Expr::Conditional {
                test,
                if_true,
                if_false,
                ..
            } => write!(f, "({test} ? {if_true} : {if_false})"),
            Expr::Constant { value, .. } => write!(f, "{value}"),
            Expr::Invoke { target, args, .. } => {
                write!(f, "{target}(")?;
                write_list(f, args)?;
                write!(f, ")")
            }
            Expr::Lambda { params, body, .. } => {
                if params.len() == 1 {
                    write!(f, "{} => {body}", params[0].name())
                } else {
                    let names: Vec<&str> = params.iter().map(Parameter::name).collect();
                    write!(f, "({}) => {body}", names.join(", "))
                }
            }
            Expr::Member { target, member } => match target {
                Some(t) => write!(f, "{t}.{}", member.name()),
                None => write!(f, "{}.{}", member.declaring_type(), member.name()),
            },
            Expr::Call {
                target,
                method,
                args,
                ..
            } => {
                match target {
                    Some(t) => write!(f, "{t}.{}(", method.name())?,
                    None => write!(f, "{}::{}(", method.declaring_type(), method.name())?,
                }
                write_list(f, args)?;
                write!(f, ")")
            }
            Expr::New { ty, args, .. } => {
                write!(f, "new {ty}(")?;
                write_list(f, args)?;
                write!(f, ")")
            }
            Expr::NewArray { element, items, .. } => {
                write!(f, "new {element}[] {{ ")?;
                write_list(f, items)?;
                write!(f, " }}")
            }
            Expr::MemberInit { new, bindings } => {
                write!(f, "{new} {{ ")?;
                for (i, (name, value)) in bindings.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{name} = {value}")?;
                }
                write!(f, " }}")
            }
            Expr::ListInit { new, items } => {
                write!(f, "{new} {{ ")?;
                write_list(f, items)?;
                write!(f, " }}")
            }
            Expr::Parameter(p) => write!(f, "{}", p.name()),
            Expr::TypeIs { operand, target } => write!(f, "({operand} is {target})"),
        }
    }
}

#[cfg(test)]
#[path = "ast_test.rs"]
mod tests;
