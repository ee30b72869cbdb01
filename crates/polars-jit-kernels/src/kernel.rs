//! Kernel traits and the arguments they receive

use std::sync::Arc;

use crate::builder::ArrayBuilder;
use crate::error::{KernelError, Result};
use crate::layout::JaggedArray;
use crate::scalar::Scalar;

/// One unpacked kernel argument
#[derive(Debug, Clone, PartialEq)]
pub enum KernelArg {
    Array(JaggedArray),
    Scalar(Scalar),
}

/// Kernel arguments in the order the caller passed them
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KernelArgs {
    args: Vec<KernelArg>,
}

impl KernelArgs {
    pub fn new(args: Vec<KernelArg>) -> Self {
        Self { args }
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&KernelArg> {
        self.args.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, KernelArg> {
        self.args.iter()
    }

    /// Array argument at `index`
    pub fn array(&self, index: usize) -> Result<&JaggedArray> {
        match self.args.get(index) {
            Some(KernelArg::Array(array)) => Ok(array),
            Some(KernelArg::Scalar(_)) => Err(KernelError::ArgumentKind {
                index,
                expected: "column",
            }),
            None => Err(self.missing(index)),
        }
    }

    /// Scalar argument at `index`
    pub fn scalar(&self, index: usize) -> Result<&Scalar> {
        match self.args.get(index) {
            Some(KernelArg::Scalar(value)) => Ok(value),
            Some(KernelArg::Array(_)) => Err(KernelError::ArgumentKind {
                index,
                expected: "constant",
            }),
            None => Err(self.missing(index)),
        }
    }

    fn missing(&self, index: usize) -> KernelError {
        KernelError::ArgumentCount {
            expected: index + 1,
            actual: self.args.len(),
        }
    }
}

/// Kernel reducing its arguments to one value per batch or group
pub trait ScalarKernel: Send + Sync {
    fn call(&self, args: &KernelArgs) -> Result<Scalar>;
}

impl<F> ScalarKernel for F
where
    F: Fn(&KernelArgs) -> Result<Scalar> + Send + Sync,
{
    fn call(&self, args: &KernelArgs) -> Result<Scalar> {
        self(args)
    }
}

/// Kernel appending one output value per input element to `out`
pub trait ColumnKernel: Send + Sync {
    fn call(&self, args: &KernelArgs, out: &mut ArrayBuilder) -> Result<()>;
}

impl<F> ColumnKernel for F
where
    F: Fn(&KernelArgs, &mut ArrayBuilder) -> Result<()> + Send + Sync,
{
    fn call(&self, args: &KernelArgs, out: &mut ArrayBuilder) -> Result<()> {
        self(args, out)
    }
}

/// A kernel together with its return shape
#[derive(Clone)]
pub enum KernelKind {
    Scalar(Arc<dyn ScalarKernel>),
    Column(Arc<dyn ColumnKernel>),
}

impl KernelKind {
    pub fn returns_scalar(&self) -> bool {
        matches!(self, KernelKind::Scalar(_))
    }
}

impl std::fmt::Debug for KernelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KernelKind::Scalar(_) => f.write_str("KernelKind::Scalar"),
            KernelKind::Column(_) => f.write_str("KernelKind::Column"),
        }
    }
}
