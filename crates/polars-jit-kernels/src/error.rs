//! Error types for kernel wrapping and nested-array conversion

use polars::prelude::{DataType, PolarsError};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, KernelError>;

#[derive(Error, Debug)]
pub enum KernelError {
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),

    #[error("Unsupported dtype for nested arrays: {0}")]
    UnsupportedDtype(DataType),

    #[error("Kernel output length mismatch: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("Argument count mismatch: expected {expected}, got {actual}")]
    ArgumentCount { expected: usize, actual: usize },

    #[error("Argument {index} is not a {expected}")]
    ArgumentKind { index: usize, expected: &'static str },

    #[error("Cannot append {value} to a {layer} builder")]
    BuilderTypeConflict {
        layer: &'static str,
        value: &'static str,
    },

    #[error("Builder error: {0}")]
    Builder(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Computation error: {0}")]
    Compute(String),
}

impl From<KernelError> for PolarsError {
    fn from(err: KernelError) -> Self {
        match err {
            KernelError::Polars(e) => e,
            other => PolarsError::ComputeError(format!("Kernel error: {}", other).into()),
        }
    }
}
