//! Argument roles of a wrapped kernel
//!
//! Every call site lists its arguments as columns or constants up front.
//! [`Signature`] records that list once, when the expression is built; at
//! execution time it only has to zip the materialized columns back in.

use polars::prelude::*;

use crate::error::{KernelError, Result};
use crate::kernel::{KernelArg, KernelArgs};
use crate::layout::convert;
use crate::scalar::Scalar;

/// Argument of a lazy kernel call
#[derive(Debug, Clone)]
pub enum Arg {
    Column(Expr),
    Constant(Scalar),
}

impl Arg {
    pub fn column(expr: Expr) -> Self {
        Arg::Column(expr)
    }

    pub fn constant(value: impl Into<Scalar>) -> Self {
        Arg::Constant(value.into())
    }
}

impl From<Expr> for Arg {
    fn from(expr: Expr) -> Self {
        Arg::Column(expr)
    }
}

impl From<Scalar> for Arg {
    fn from(value: Scalar) -> Self {
        Arg::Constant(value)
    }
}

impl From<i64> for Arg {
    fn from(value: i64) -> Self {
        Arg::Constant(value.into())
    }
}

impl From<f64> for Arg {
    fn from(value: f64) -> Self {
        Arg::Constant(value.into())
    }
}

impl From<bool> for Arg {
    fn from(value: bool) -> Self {
        Arg::Constant(value.into())
    }
}

impl From<&str> for Arg {
    fn from(value: &str) -> Self {
        Arg::Constant(value.into())
    }
}

/// Argument of an eager kernel call over materialized data
#[derive(Debug, Clone)]
pub enum BatchArg {
    Series(Series),
    Constant(Scalar),
}

impl BatchArg {
    pub fn constant(value: impl Into<Scalar>) -> Self {
        BatchArg::Constant(value.into())
    }
}

impl From<Series> for BatchArg {
    fn from(series: Series) -> Self {
        BatchArg::Series(series)
    }
}

impl From<&Series> for BatchArg {
    fn from(series: &Series) -> Self {
        BatchArg::Series(series.clone())
    }
}

impl From<Scalar> for BatchArg {
    fn from(value: Scalar) -> Self {
        BatchArg::Constant(value)
    }
}

/// Role of one kernel parameter
#[derive(Debug, Clone, PartialEq)]
pub enum ParamInfo {
    /// Next column, read from struct field `field`
    Column { field: usize },
    /// Constant captured at wrap time
    Constant(Scalar),
}

/// Ordered parameter roles of one kernel call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Signature {
    params: Vec<ParamInfo>,
    columns: usize,
}

impl Signature {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column parameter
    pub fn column(mut self) -> Self {
        self.params.push(ParamInfo::Column {
            field: self.columns,
        });
        self.columns += 1;
        self
    }

    /// Append a constant parameter
    pub fn constant(mut self, value: impl Into<Scalar>) -> Self {
        self.params.push(ParamInfo::Constant(value.into()));
        self
    }

    /// Split a lazy call into its signature and the column expressions to
    /// pack into one struct; `primary` is always the first column
    ///
    /// Every packed expression is aliased to its position (`_arg0`,
    /// `_arg1`, ...) so struct field names never collide.
    pub fn resolve(primary: Expr, args: impl IntoIterator<Item = Arg>) -> (Self, Vec<Expr>) {
        let mut signature = Self::new();
        let mut exprs = Vec::new();
        let columns = std::iter::once(Arg::Column(primary)).chain(args);
        for arg in columns {
            match arg {
                Arg::Column(expr) => {
                    exprs.push(expr.alias(field_name(signature.columns)));
                    signature = signature.column();
                }
                Arg::Constant(value) => signature = signature.constant(value),
            }
        }
        (signature, exprs)
    }

    /// Split an eager call into its signature and the columns it reads
    pub fn resolve_batch(args: &[BatchArg]) -> Result<(Self, Vec<Series>)> {
        match args.first() {
            Some(BatchArg::Series(_)) => {}
            Some(BatchArg::Constant(_)) => {
                return Err(KernelError::ArgumentKind {
                    index: 0,
                    expected: "column",
                })
            }
            None => {
                return Err(KernelError::ArgumentCount {
                    expected: 1,
                    actual: 0,
                })
            }
        }

        let mut signature = Self::new();
        let mut columns = Vec::new();
        for arg in args {
            match arg {
                BatchArg::Series(series) => {
                    signature = signature.column();
                    columns.push(series.clone());
                }
                BatchArg::Constant(value) => signature = signature.constant(value.clone()),
            }
        }
        Ok((signature, columns))
    }

    pub fn params(&self) -> &[ParamInfo] {
        &self.params
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Number of column parameters
    pub fn column_count(&self) -> usize {
        self.columns
    }

    /// Convert `columns` into nested arrays and reinsert constants in
    /// parameter order
    pub fn bind(&self, columns: &[Series]) -> Result<KernelArgs> {
        if columns.len() != self.columns {
            return Err(KernelError::ArgumentCount {
                expected: self.columns,
                actual: columns.len(),
            });
        }

        let args = self
            .params
            .iter()
            .map(|param| match param {
                ParamInfo::Column { field } => {
                    convert::from_series(&columns[*field]).map(KernelArg::Array)
                }
                ParamInfo::Constant(value) => Ok(KernelArg::Scalar(value.clone())),
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(KernelArgs::new(args))
    }
}

fn field_name(index: usize) -> String {
    format!("_arg{index}")
}
