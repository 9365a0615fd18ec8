//! Error types for relq-algebra

use thiserror::Error;

/// Relational algebra construction error
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AlgebraError {
    /// RA001: A relation, attribute, or function name is empty or blank
    #[error("[RA001] {kind} name must not be blank")]
    EmptyName { kind: &'static str },

    /// RA002: A builder was asked for a node without a required operand
    #[error("[RA002] Missing {operand} operand")]
    MissingOperand { operand: &'static str },

    /// RA003: Natural join requested without shared attributes
    #[error("[RA003] Natural join with '{relation}' needs at least one shared attribute")]
    EmptyJoinAttributes { relation: String },
}

/// Result type alias for AlgebraError
pub type AlgebraResult<T> = Result<T, AlgebraError>;
