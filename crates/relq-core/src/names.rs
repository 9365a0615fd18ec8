//! Strongly-typed names used by the relational algebra IR.
//!
//! Keeps relation names, attribute names and function names from being mixed
//! up, and makes a blank name unrepresentable.

use crate::newtype_string::define_newtype_string;

define_newtype_string! {
    /// Name of a base relation or a renamed relation.
    pub struct RelationName;
}

define_newtype_string! {
    /// Name of an attribute (column) of a relation.
    pub struct AttributeName;
}

define_newtype_string! {
    /// Name of a scalar or relation-valued function.
    pub struct FunctionName;
}
