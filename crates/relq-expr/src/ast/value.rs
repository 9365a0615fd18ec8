//! Runtime values held by constant nodes and produced by evaluation

use super::types::QueryType;
use crate::eval::Callable;
use crate::source::QuerySource;
use std::cmp::Ordering;
use std::sync::Arc;

/// A named bag of fields: host objects, anonymous projections and the
/// environments captured by closures.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    type_name: String,
    fields: Vec<(String, Value)>,
}

impl Record {
    /// Create a record of the given object type
    pub fn new(type_name: impl Into<String>, fields: Vec<(String, Value)>) -> Self {
        Self {
            type_name: type_name.into(),
            fields,
        }
    }

    /// Object type name
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Look up a field by name
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// All fields in declaration order
    pub fn fields(&self) -> &[(String, Value)] {
        &self.fields
    }
}

/// A runtime value
#[derive(Debug, Clone)]
pub enum Value {
    /// Absent value
    Null,
    /// Boolean
    Bool(bool),
    /// 64-bit signed integer
    Int(i64),
    /// 64-bit float
    Float(f64),
    /// String
    String(Arc<str>),
    /// Materialized sequence
    Sequence(Arc<[Value]>),
    /// Object with named fields
    Record(Arc<Record>),
    /// Deferred query source
    Query(Arc<dyn QuerySource>),
    /// Compiled lambda or host function
    Function(Arc<dyn Callable>),
}

impl Value {
    /// Build a string value
    pub fn string(s: impl AsRef<str>) -> Self {
        Value::String(Arc::from(s.as_ref()))
    }

    /// Build a materialized sequence value
    pub fn sequence(items: Vec<Value>) -> Self {
        Value::Sequence(Arc::from(items))
    }

    /// Build a record value
    pub fn record(type_name: impl Into<String>, fields: Vec<(&str, Value)>) -> Self {
        Value::Record(Arc::new(Record::new(
            type_name,
            fields
                .into_iter()
                .map(|(n, v)| (n.to_string(), v))
                .collect(),
        )))
    }

    /// Returns true for deferred query sources
    pub fn is_deferred(&self) -> bool {
        matches!(self, Value::Query(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Value::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_query(&self) -> Option<&Arc<dyn QuerySource>> {
        match self {
            Value::Query(q) => Some(q),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&Arc<dyn Callable>> {
        match self {
            Value::Function(f) => Some(f),
            _ => None,
        }
    }

    /// Short description of the runtime shape, used in error messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Sequence(_) => "sequence",
            Value::Record(_) => "record",
            Value::Query(_) => "query",
            Value::Function(_) => "function",
        }
    }

    /// Best-effort static type of this value
    pub fn static_type(&self) -> QueryType {
        match self {
            Value::Null => QueryType::Any,
            Value::Bool(_) => QueryType::Bool,
            Value::Int(_) => QueryType::Int,
            Value::Float(_) => QueryType::Float,
            Value::String(_) => QueryType::String,
            Value::Sequence(items) => QueryType::sequence(
                items
                    .first()
                    .map(Value::static_type)
                    .unwrap_or(QueryType::Any),
            ),
            Value::Record(r) => QueryType::object(r.type_name()),
            Value::Query(q) => QueryType::queryable(q.element_type().clone()),
            Value::Function(f) => {
                QueryType::function(vec![QueryType::Any; f.arity()], QueryType::Any)
            }
        }
    }

    /// Runtime type test backing the `is` operator. `Null` is never an
    /// instance of anything.
    pub fn is_instance_of(&self, ty: &QueryType) -> bool {
        match (self, ty) {
            (Value::Null, _) => false,
            (_, QueryType::Any) => true,
            (Value::Bool(_), QueryType::Bool)
            | (Value::Int(_), QueryType::Int)
            | (Value::Float(_), QueryType::Float)
            | (Value::String(_), QueryType::String)
            | (Value::Sequence(_), QueryType::Sequence(_))
            | (Value::Query(_), QueryType::Sequence(_))
            | (Value::Query(_), QueryType::Queryable(_))
            | (Value::Function(_), QueryType::Function { .. }) => true,
            (Value::Record(r), QueryType::Object(name)) => r.type_name() == name,
            _ => false,
        }
    }

    /// Ordering for sorting and comparison operators.
    ///
    /// `Null` sorts first; ints and floats compare numerically; values of
    /// unrelated kinds are incomparable.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Null, Value::Null) => Some(Ordering::Equal),
            (Value::Null, _) => Some(Ordering::Less),
            (_, Value::Null) => Some(Ordering::Greater),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
            (Value::Int(a), Value::Float(b)) => (*a as f64).partial_cmp(b),
            (Value::Float(a), Value::Int(b)) => a.partial_cmp(&(*b as f64)),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

/// Data values compare structurally; query sources and functions compare by
/// identity.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Sequence(a), Value::Sequence(b)) => a == b,
            (Value::Record(a), Value::Record(b)) => a == b,
            (Value::Query(a), Value::Query(b)) => std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b)),
            (Value::Function(a), Value::Function(b)) => {
                std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
            }
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x:?}"),
            Value::String(s) => write!(f, "{s:?}"),
            Value::Sequence(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Record(r) => {
                write!(f, "{} {{", r.type_name())?;
                for (i, (name, value)) in r.fields().iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, " {name}: {value}")?;
                }
                write!(f, " }}")
            }
            Value::Query(q) => write!(f, "query<{}>", q.provider().name()),
            Value::Function(func) => write!(f, "<fn/{}>", func.arity()),
        }
    }
}
