//! Ready-made kernels
//!
//! Small numeric kernels over nullable integer columns, usable directly in
//! an expression pipeline and as templates for custom kernels.

use polars::prelude::*;

use crate::adapter::JitKernel;
use crate::builder::ArrayBuilder;
use crate::error::{KernelError, Result};
use crate::kernel::KernelArgs;
use crate::layout::Element;
use crate::params::BatchArg;
use crate::scalar::Scalar;

/// Weight applied by [`weighted_sum`]
pub const WEIGHT: f64 = 0.7;

fn number(element: Element<'_>) -> Result<f64> {
    element.as_f64().ok_or_else(|| {
        KernelError::InvalidValue(format!("expected a number, got {}", element.kind_name()))
    })
}

fn integer(element: Element<'_>) -> Result<i64> {
    element.as_i64().ok_or_else(|| {
        KernelError::InvalidValue(format!("expected an integer, got {}", element.kind_name()))
    })
}

fn overflow() -> KernelError {
    KernelError::Compute("integer overflow".to_string())
}

/// Sum of `WEIGHT * value` over the non-null values; `0.0` when empty
pub fn weighted_sum() -> JitKernel {
    JitKernel::scalar("weighted_sum", DataType::Float64, |args: &KernelArgs| {
        let mut result = 0.0;
        for value in args.array(0)?.iter().flatten() {
            result += number(value)? * WEIGHT;
        }
        Ok(Scalar::Float64(result))
    })
}

/// `value + 1`, nulls preserved
pub fn add_one() -> JitKernel {
    JitKernel::column(
        "add_one",
        DataType::Int64,
        |args: &KernelArgs, out: &mut ArrayBuilder| {
            for value in args.array(0)?.iter() {
                match value {
                    None => out.null()?,
                    Some(v) => out.integer(integer(v)?.checked_add(1).ok_or_else(overflow)?)?,
                }
            }
            Ok(())
        },
    )
}

/// `value + scalar` for `(column, constant)`, nulls preserved
pub fn add_scalar_to_series() -> JitKernel {
    JitKernel::column(
        "add_scalar_to_series",
        DataType::Int64,
        |args: &KernelArgs, out: &mut ArrayBuilder| {
            let values = args.array(0)?;
            let scalar = args.scalar(1)?;
            let Some(offset) = scalar.as_i64() else {
                if scalar.is_null() {
                    for _ in 0..values.len() {
                        out.null()?;
                    }
                    return Ok(());
                }
                return Err(KernelError::InvalidValue(format!(
                    "expected an integer constant, got {scalar:?}"
                )));
            };

            for value in values.iter() {
                match value {
                    None => out.null()?,
                    Some(v) => out.integer(integer(v)?.checked_add(offset).ok_or_else(overflow)?)?,
                }
            }
            Ok(())
        },
    )
}

/// `10 * a + b` for two columns, null when either side is null
pub fn add_two_series() -> JitKernel {
    JitKernel::column(
        "add_two_series",
        DataType::Int64,
        |args: &KernelArgs, out: &mut ArrayBuilder| {
            let (left, right) = (args.array(0)?, args.array(1)?);
            for i in 0..left.len() {
                match (left.get(i), right.get(i)) {
                    (Some(a), Some(b)) => {
                        let (a, b) = (integer(a)?, integer(b)?);
                        let value = a
                            .checked_mul(10)
                            .and_then(|v| v.checked_add(b))
                            .ok_or_else(overflow)?;
                        out.integer(value)?;
                    }
                    _ => out.null()?,
                }
            }
            Ok(())
        },
    )
}

/// Eager `add_one`: series to nested array, kernel, builder, back to series
pub fn add_one_e2e(series: &Series) -> Result<Series> {
    add_one().evaluate(&[BatchArg::from(series)])
}
