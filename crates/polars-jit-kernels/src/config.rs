//! Configuration for wrapped kernels

use std::str::FromStr;

use crate::error::KernelError;

/// Environment variable overriding the default [`LengthPolicy`]
pub const LENGTH_POLICY_ENV: &str = "POLARS_JIT_LENGTH_POLICY";

/// What to do when a column kernel emits a different number of values
/// than it received
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LengthPolicy {
    /// Fail with `KernelError::LengthMismatch`
    #[default]
    Strict,
    /// Drop trailing values beyond the input length
    Truncate,
    /// Fill missing trailing values with nulls, drop extra ones
    PadWithNulls,
}

impl FromStr for LengthPolicy {
    type Err = KernelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "truncate" => Ok(Self::Truncate),
            "pad" | "pad_with_nulls" => Ok(Self::PadWithNulls),
            other => Err(KernelError::InvalidConfig(format!(
                "unknown length policy '{other}'"
            ))),
        }
    }
}

/// Kernel execution configuration
#[derive(Debug, Clone)]
pub struct KernelConfig {
    /// Handling of output length mismatches for column kernels
    pub length_policy: LengthPolicy,

    /// Strict-cast column outputs to the declared return dtype
    pub cast_output: bool,

    /// Output series name (defaults to the first input column's name)
    pub output_name: Option<String>,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl KernelConfig {
    /// Create config with defaults, honouring `POLARS_JIT_LENGTH_POLICY`
    ///
    /// An unparseable environment value falls back to [`LengthPolicy::Strict`].
    pub fn new() -> Self {
        let length_policy = std::env::var(LENGTH_POLICY_ENV)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_default();

        Self {
            length_policy,
            cast_output: true,
            output_name: None,
        }
    }

    /// Override the length policy
    pub fn with_length_policy(mut self, policy: LengthPolicy) -> Self {
        self.length_policy = policy;
        self
    }

    /// Enable or disable casting to the declared return dtype
    pub fn with_cast_output(mut self, cast: bool) -> Self {
        self.cast_output = cast;
        self
    }

    /// Override the output series name
    pub fn with_output_name(mut self, name: impl Into<String>) -> Self {
        self.output_name = Some(name.into());
        self
    }
}
