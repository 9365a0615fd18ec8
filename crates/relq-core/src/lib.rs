//! relq-core - Core library for relq
//!
//! This crate provides the configuration, error types, and strongly-typed
//! names shared by the query normalizer (`relq-expr`) and the relational
//! algebra IR (`relq-algebra`).

pub mod config;
pub mod error;
pub mod names;
mod newtype_string;

pub use config::{NormalizeConfig, PassToggles};
pub use error::{CoreError, CoreResult};
pub use names::{AttributeName, FunctionName, RelationName};
