//! Wrapping native kernels into Polars expressions
//!
//! A [`JitKernel`] pairs a kernel with its declared return dtype. Calling it
//! with column expressions and constants yields an [`Expr`]: the columns are
//! packed into a single struct (the UDF facility takes one input), constants
//! stay in the resolved [`Signature`], and every batch is unpacked, converted
//! to nested arrays and handed to the kernel. The result is named after the
//! first column expression unless the config sets an output name.
//!
//! # Example
//! ```rust,no_run
//! use polars::prelude::*;
//! use polars_jit_kernels::{Arg, ArrayBuilder, JitKernel, KernelArgs};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let add = JitKernel::column(
//!     "add_scalar",
//!     DataType::Int64,
//!     |args: &KernelArgs, out: &mut ArrayBuilder| {
//!         let offset = args.scalar(1)?.as_i64().unwrap_or_default();
//!         for value in args.array(0)?.iter() {
//!             match value.and_then(|v| v.as_i64()) {
//!                 Some(v) => out.integer(v + offset)?,
//!                 None => out.null()?,
//!             }
//!         }
//!         Ok(())
//!     },
//! );
//!
//! let df = df!("values" => [Some(17i64), Some(2), None, Some(5)])?;
//! let out = df
//!     .lazy()
//!     .select([add.call(col("values"), [Arg::constant(100)])])
//!     .collect()?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use polars::prelude::*;
use polars_plan::prelude::FunctionFlags;
use polars_plan::utils::expr_output_name;
use tracing::{debug, warn};

use crate::builder::ArrayBuilder;
use crate::config::{KernelConfig, LengthPolicy};
use crate::error::{KernelError, Result};
use crate::kernel::{ColumnKernel, KernelArgs, KernelKind, ScalarKernel};
use crate::layout::convert;
use crate::params::{Arg, BatchArg, Signature};
use crate::scalar::Scalar;

/// A kernel usable as a Polars column transformation
#[derive(Debug, Clone)]
pub struct JitKernel {
    name: Arc<str>,
    return_dtype: DataType,
    kind: KernelKind,
    config: KernelConfig,
}

impl JitKernel {
    /// Wrap a kernel returning one scalar per batch or group
    pub fn scalar<F>(name: impl Into<Arc<str>>, return_dtype: DataType, kernel: F) -> Self
    where
        F: Fn(&KernelArgs) -> Result<Scalar> + Send + Sync + 'static,
    {
        let kernel: Arc<dyn ScalarKernel> = Arc::new(kernel);
        Self::from_kind(name, return_dtype, KernelKind::Scalar(kernel))
    }

    /// Wrap a kernel building an output column with an [`ArrayBuilder`]
    pub fn column<F>(name: impl Into<Arc<str>>, return_dtype: DataType, kernel: F) -> Self
    where
        F: Fn(&KernelArgs, &mut ArrayBuilder) -> Result<()> + Send + Sync + 'static,
    {
        let kernel: Arc<dyn ColumnKernel> = Arc::new(kernel);
        Self::from_kind(name, return_dtype, KernelKind::Column(kernel))
    }

    /// Wrap any kernel implementation
    pub fn from_kind(name: impl Into<Arc<str>>, return_dtype: DataType, kind: KernelKind) -> Self {
        Self {
            name: name.into(),
            return_dtype,
            kind,
            config: KernelConfig::new(),
        }
    }

    pub fn with_config(mut self, config: KernelConfig) -> Self {
        self.config = config;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn return_dtype(&self) -> &DataType {
        &self.return_dtype
    }

    pub fn returns_scalar(&self) -> bool {
        self.kind.returns_scalar()
    }

    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    /// Apply the kernel to a single column
    pub fn apply(&self, expr: Expr) -> Expr {
        self.call(expr, Vec::<Arg>::new())
    }

    /// Build the expression for `kernel(expr, args...)`
    ///
    /// Scalar kernels are evaluated per group and yield one value per group,
    /// column kernels are evaluated per batch.
    pub fn call<I, A>(&self, expr: Expr, args: I) -> Expr
    where
        I: IntoIterator<Item = A>,
        A: Into<Arg>,
    {
        let output_name = match &self.config.output_name {
            Some(name) => Some(PlSmallStr::from_str(name)),
            None => expr_output_name(&expr).ok(),
        };
        let (signature, exprs) = Signature::resolve(expr, args.into_iter().map(Into::into));
        debug!(
            kernel = %self.name,
            columns = signature.column_count(),
            params = signature.len(),
            "Wrapping kernel into expression"
        );

        let kernel = self.clone();
        let function = move |packed: Column| -> PolarsResult<Option<Column>> {
            let series = kernel.run_batch(packed.as_materialized_series(), &signature)?;
            Ok(Some(Column::from(series)))
        };

        let output_type = GetOutput::from_type(self.return_dtype.clone());
        let packed = as_struct(exprs);
        let udf = if self.returns_scalar() {
            returning_scalar(packed.apply(function, output_type))
        } else {
            packed.map(function, output_type)
        };
        match output_name {
            Some(name) => udf.alias(name),
            None => udf,
        }
    }

    /// Execute one batch: `batch` is the struct built by [`JitKernel::call`]
    pub fn run_batch(&self, batch: &Series, signature: &Signature) -> Result<Series> {
        let columns = batch.struct_()?.fields_as_series();
        let name = self.output_name(batch.name());
        self.execute(&columns, signature, name)
    }

    /// Run the kernel eagerly over materialized series and constants
    ///
    /// The first argument must be a series; all series must have the same
    /// length.
    pub fn evaluate(&self, args: &[BatchArg]) -> Result<Series> {
        let (signature, columns) = Signature::resolve_batch(args)?;
        let rows = columns[0].len();
        if let Some(other) = columns.iter().find(|s| s.len() != rows) {
            return Err(KernelError::LengthMismatch {
                expected: rows,
                actual: other.len(),
            });
        }
        let name = self.output_name(columns[0].name());
        self.execute(&columns, &signature, name)
    }

    fn output_name(&self, input: &PlSmallStr) -> PlSmallStr {
        match &self.config.output_name {
            Some(name) => PlSmallStr::from_str(name),
            None => input.clone(),
        }
    }

    fn execute(&self, columns: &[Series], signature: &Signature, name: PlSmallStr) -> Result<Series> {
        let rows = columns.first().map_or(0, |s| s.len());
        debug!(kernel = %self.name, rows, params = signature.len(), "Running kernel batch");

        let args = signature.bind(columns)?;
        match &self.kind {
            KernelKind::Scalar(kernel) => {
                let value = kernel.call(&args)?;
                value.to_series(name, &self.return_dtype)
            }
            KernelKind::Column(kernel) => {
                let mut builder = ArrayBuilder::new();
                kernel.call(&args, &mut builder)?;
                let output = convert::to_series(&builder.snapshot()?, name.as_str())?;
                let output = self.fit_length(output, rows)?;
                let untyped = output.dtype() == &DataType::Null;
                if (self.config.cast_output || untyped) && output.dtype() != &self.return_dtype {
                    Ok(output.strict_cast(&self.return_dtype)?)
                } else {
                    Ok(output)
                }
            }
        }
    }

    fn fit_length(&self, output: Series, rows: usize) -> Result<Series> {
        let produced = output.len();
        if produced == rows {
            return Ok(output);
        }

        match self.config.length_policy {
            LengthPolicy::Strict => Err(KernelError::LengthMismatch {
                expected: rows,
                actual: produced,
            }),
            LengthPolicy::Truncate | LengthPolicy::PadWithNulls if produced > rows => {
                warn!(kernel = %self.name, rows, produced, "Truncating kernel output");
                Ok(output.slice(0, rows))
            }
            LengthPolicy::Truncate => Err(KernelError::LengthMismatch {
                expected: rows,
                actual: produced,
            }),
            LengthPolicy::PadWithNulls => {
                warn!(kernel = %self.name, rows, produced, "Padding kernel output with nulls");
                Ok(output.extend_constant(AnyValue::Null, rows - produced)?)
            }
        }
    }
}

/// Flag a group-wise UDF as producing one value per group
fn returning_scalar(expr: Expr) -> Expr {
    match expr {
        Expr::AnonymousFunction {
            input,
            function,
            output_type,
            mut options,
        } => {
            options.flags |= FunctionFlags::RETURNS_SCALAR;
            Expr::AnonymousFunction {
                input,
                function,
                output_type,
                options,
            }
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emit_n(n: usize) -> JitKernel {
        JitKernel::column("emit", DataType::Int64, move |_: &KernelArgs, out: &mut ArrayBuilder| {
            for i in 0..n {
                out.integer(i as i64)?;
            }
            Ok(())
        })
    }

    fn input() -> Series {
        Series::new("values".into(), [1i64, 2, 3])
    }

    #[test]
    fn test_strict_length_mismatch() {
        let kernel = emit_n(2).with_config(KernelConfig::new().with_length_policy(LengthPolicy::Strict));
        let err = kernel.evaluate(&[input().into()]).unwrap_err();
        assert!(matches!(
            err,
            KernelError::LengthMismatch { expected: 3, actual: 2 }
        ));
    }

    #[test]
    fn test_truncate_policy() {
        let kernel = emit_n(5).with_config(KernelConfig::new().with_length_policy(LengthPolicy::Truncate));
        let out = kernel.evaluate(&[input().into()]).unwrap();
        assert_eq!(out.len(), 3);

        let short = emit_n(1).with_config(KernelConfig::new().with_length_policy(LengthPolicy::Truncate));
        assert!(short.evaluate(&[input().into()]).is_err());
    }

    #[test]
    fn test_pad_policy() {
        let kernel = emit_n(1).with_config(KernelConfig::new().with_length_policy(LengthPolicy::PadWithNulls));
        let out = kernel.evaluate(&[input().into()]).unwrap();
        let values: Vec<_> = out.i64().unwrap().into_iter().collect();
        assert_eq!(values, vec![Some(0), None, None]);
    }

    #[test]
    fn test_output_cast_and_name() {
        let kernel = emit_n(3).with_config(
            KernelConfig::new()
                .with_length_policy(LengthPolicy::Strict)
                .with_output_name("out"),
        );
        let kernel = JitKernel {
            return_dtype: DataType::Float64,
            ..kernel
        };

        let out = kernel.evaluate(&[input().into()]).unwrap();
        assert_eq!(out.name().as_str(), "out");
        assert_eq!(out.dtype(), &DataType::Float64);
    }

    #[test]
    fn test_all_null_output_takes_return_dtype() {
        let kernel = JitKernel::column(
            "nothing",
            DataType::Int64,
            |args: &KernelArgs, out: &mut ArrayBuilder| {
                for _ in 0..args.array(0)?.len() {
                    out.null()?;
                }
                Ok(())
            },
        )
        .with_config(KernelConfig::new().with_cast_output(false));

        let out = kernel.evaluate(&[input().into()]).unwrap();
        assert_eq!(out.dtype(), &DataType::Int64);
        assert_eq!(out.null_count(), 3);
    }

    #[test]
    fn test_scalar_kernel_expression_is_flagged() {
        let kernel = JitKernel::scalar("len", DataType::Int64, |args: &KernelArgs| {
            Ok(Scalar::Int64(args.array(0)?.len() as i64))
        });

        let flagged = |expr: &Expr| match expr {
            Expr::AnonymousFunction { options, .. } => {
                options.flags.contains(FunctionFlags::RETURNS_SCALAR)
            }
            _ => false,
        };
        let expr = kernel.apply(col("values"));
        assert!((&expr).into_iter().any(flagged));

        let column = emit_n(1).apply(col("values"));
        assert!(!(&column).into_iter().any(flagged));
    }

    #[test]
    fn test_evaluate_rejects_ragged_columns() {
        let kernel = emit_n(3);
        let other = Series::new("other".into(), [1i64]);
        let err = kernel
            .evaluate(&[input().into(), other.into()])
            .unwrap_err();
        assert!(matches!(err, KernelError::LengthMismatch { .. }));
    }

    #[test]
    fn test_scalar_kernel_result_shape() {
        let kernel = JitKernel::scalar("len", DataType::Int32, |args: &KernelArgs| {
            Ok(Scalar::Int64(args.array(0)?.len() as i64))
        });
        assert!(kernel.returns_scalar());

        let out = kernel.evaluate(&[input().into()]).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out.dtype(), &DataType::Int32);
        assert_eq!(out.i32().unwrap().get(0), Some(3));
    }

    #[test]
    fn test_run_batch_unpacks_struct() {
        let kernel = JitKernel::column(
            "sum_pairs",
            DataType::Int64,
            |args: &KernelArgs, out: &mut ArrayBuilder| {
                let (a, b) = (args.array(0)?, args.array(1)?);
                for i in 0..a.len() {
                    match (a.get(i).and_then(|v| v.as_i64()), b.get(i).and_then(|v| v.as_i64())) {
                        (Some(x), Some(y)) => out.integer(x + y)?,
                        _ => out.null()?,
                    }
                }
                Ok(())
            },
        )
        .with_config(KernelConfig::new().with_length_policy(LengthPolicy::Strict));

        let df = df!("a" => [1i64, 2], "b" => [Some(10i64), None]).unwrap();
        let packed = df
            .into_struct("a".into())
            .into_series();
        let signature = Signature::new().column().column();

        let out = kernel.run_batch(&packed, &signature).unwrap();
        assert_eq!(out.name().as_str(), "a");
        let values: Vec<_> = out.i64().unwrap().into_iter().collect();
        assert_eq!(values, vec![Some(11), None]);
    }
}
