//! Static types carried by query AST nodes

use serde::{Deserialize, Serialize};

/// Static result type of a query AST node
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QueryType {
    /// No value (e.g. an action-returning method)
    Unit,
    /// Boolean
    Bool,
    /// 64-bit signed integer
    Int,
    /// 64-bit float
    Float,
    /// UTF-8 string
    String,
    /// Named object type (records, captured closures, host objects)
    Object(String),
    /// Materialized sequence, consumed by the immediate operator family
    Sequence(Box<QueryType>),
    /// Deferred sequence backed by a query provider
    Queryable(Box<QueryType>),
    /// Function taking `params` and returning `ret`
    Function {
        params: Vec<QueryType>,
        ret: Box<QueryType>,
    },
    /// Type is not statically known; compatible with everything
    Any,
}

impl QueryType {
    /// Shorthand for `QueryType::Object(name)`
    pub fn object(name: impl Into<String>) -> Self {
        QueryType::Object(name.into())
    }

    /// Shorthand for `QueryType::Sequence(element)`
    pub fn sequence(element: QueryType) -> Self {
        QueryType::Sequence(Box::new(element))
    }

    /// Shorthand for `QueryType::Queryable(element)`
    pub fn queryable(element: QueryType) -> Self {
        QueryType::Queryable(Box::new(element))
    }

    /// Shorthand for a function type
    pub fn function(params: Vec<QueryType>, ret: QueryType) -> Self {
        QueryType::Function {
            params,
            ret: Box::new(ret),
        }
    }

    /// Element type of a sequence or deferred sequence
    pub fn element_type(&self) -> Option<&QueryType> {
        match self {
            QueryType::Sequence(elem) | QueryType::Queryable(elem) => Some(elem),
            _ => None,
        }
    }

    /// Return type of a function type
    pub fn return_type(&self) -> Option<&QueryType> {
        match self {
            QueryType::Function { ret, .. } => Some(ret),
            _ => None,
        }
    }

    /// Returns true for deferred sequence types
    pub fn is_queryable(&self) -> bool {
        matches!(self, QueryType::Queryable(_))
    }

    /// Returns true if a value of `other` can flow where `self` is expected.
    ///
    /// `Any` accepts and is accepted by everything, a deferred sequence is
    /// also a sequence, and element types are compared recursively.
    pub fn is_assignable_from(&self, other: &QueryType) -> bool {
        match (self, other) {
            (QueryType::Any, _) | (_, QueryType::Any) => true,
            (QueryType::Sequence(a), QueryType::Sequence(b))
            | (QueryType::Sequence(a), QueryType::Queryable(b))
            | (QueryType::Queryable(a), QueryType::Queryable(b)) => a.is_assignable_from(b),
            (
                QueryType::Function {
                    params: pa,
                    ret: ra,
                },
                QueryType::Function {
                    params: pb,
                    ret: rb,
                },
            ) => {
                pa.len() == pb.len()
                    && pa.iter().zip(pb).all(|(a, b)| b.is_assignable_from(a))
                    && ra.is_assignable_from(rb)
            }
            (a, b) => a == b,
        }
    }
}

impl std::fmt::Display for QueryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueryType::Unit => write!(f, "unit"),
            QueryType::Bool => write!(f, "bool"),
            QueryType::Int => write!(f, "int"),
            QueryType::Float => write!(f, "float"),
            QueryType::String => write!(f, "string"),
            QueryType::Object(name) => write!(f, "{name}"),
            QueryType::Sequence(elem) => write!(f, "Sequence<{elem}>"),
            QueryType::Queryable(elem) => write!(f, "Queryable<{elem}>"),
            QueryType::Function { params, ret } => {
                write!(f, "fn(")?;
                for (i, p) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{p}")?;
                }
                write!(f, ") -> {ret}")
            }
            QueryType::Any => write!(f, "any"),
        }
    }
}
