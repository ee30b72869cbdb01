//! # Polars JIT Kernels
//!
//! Run native element-wise kernels over Polars columns from inside the
//! expression pipeline.
//!
//! ## Features
//!
//! - **Nested-array view**: columns are converted to [`JaggedArray`]s with
//!   per-element access, nulls and variable-length lists
//! - **Output builder**: column kernels append results to an [`ArrayBuilder`]
//!   that is converted back into a `Series`
//! - **Multi-argument calls**: mix columns and constants, the columns are
//!   packed into one struct expression for the UDF
//! - **Scalar or column results**: one value per group, or one per row
//!
//! ## Example
//!
//! ```rust,no_run
//! use polars::prelude::*;
//! use polars_jit_kernels::kernels::{add_two_series, weighted_sum};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let df = df!(
//!     "values" => [Some(17i64), Some(2), None, Some(5)],
//!     "values2" => [Some(3i64), None, Some(4), Some(1)]
//! )?;
//!
//! let combined = df
//!     .clone()
//!     .lazy()
//!     .select([add_two_series().call(col("values"), [col("values2")])])
//!     .collect()?;
//! let total = df
//!     .lazy()
//!     .select([weighted_sum().apply(col("values"))])
//!     .collect()?;
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod builder;
pub mod config;
pub mod error;
pub mod kernel;
pub mod kernels;
pub mod layout;
pub mod params;
pub mod scalar;

// Re-exports
pub use adapter::JitKernel;
pub use builder::ArrayBuilder;
pub use config::{KernelConfig, LengthPolicy};
pub use error::{KernelError, Result};
pub use kernel::{ColumnKernel, KernelArg, KernelArgs, KernelKind, ScalarKernel};
pub use layout::convert::{from_series, to_series};
pub use layout::{Content, Element, JaggedArray, ListView};
pub use params::{Arg, BatchArg, ParamInfo, Signature};
pub use scalar::Scalar;
