//! Error type for the sparse store and the operator registry.
//!
//! Every fallible operation in this crate returns [`SparseResult`]. The
//! DebtRank layer maps these onto its own taxonomy (shape, configuration,
//! division) at its API boundary.

use thiserror::Error;

/// Errors raised by sparse construction, elementwise operations and operator lookup.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SparseError {
    /// A matrix coordinate lies outside the explicitly requested shape.
    #[error("index ({row}, {col}) out of bounds for {rows}x{cols} matrix")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    /// A vector index lies outside the vector length.
    #[error("index {index} out of range for vector of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// Operand dimensions do not agree.
    #[error("shape mismatch in {context}: expected {expected}, found {found}")]
    ShapeMismatch {
        context: &'static str,
        expected: usize,
        found: usize,
    },

    /// `truediv` with a zero right operand.
    #[error("division by zero (numerator {numerator})")]
    DivisionByZero { numerator: f64 },

    /// No operator registered under this name.
    #[error("unknown operator '{0}'")]
    UnknownOperator(String),

    /// The operator exists but has the wrong kind for the request.
    #[error("operator '{name}' is a {found}, expected a {expected}")]
    OperatorKind {
        name: String,
        expected: &'static str,
        found: &'static str,
    },
}

/// Convenience alias for results in this crate.
pub type SparseResult<T> = Result<T, SparseError>;
