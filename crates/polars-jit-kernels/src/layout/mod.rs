//! Nested-array representation handed to kernels
//!
//! A [`JaggedArray`] is a nullable, possibly nested array with element-wise
//! access. Signed and narrow unsigned integers are widened to `i64`, `UInt64`
//! stays `u64` and floats are widened to `f64`; the Polars dtype a column was converted from is remembered so the way back
//! restores it exactly.
//!
//! ```text
//! List[Int32]  [[1, 2], null, []]
//!
//!   validity  [1, 0, 1]
//!   offsets   [0, 2, 2, 2]
//!   values    Int64 [1, 2]        (source dtype Int32)
//! ```

pub mod convert;

use polars::prelude::DataType;

use crate::error::{KernelError, Result};

/// Physical content of a [`JaggedArray`]
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    /// No typed values: every element is null
    Empty,
    Boolean(Vec<bool>),
    Int64(Vec<i64>),
    UInt64(Vec<u64>),
    Float64(Vec<f64>),
    Utf8(Vec<String>),
    /// Variable-length lists; element `i` spans `offsets[i]..offsets[i + 1]`
    List {
        offsets: Vec<usize>,
        values: Box<JaggedArray>,
    },
}

impl Content {
    fn kind_name(&self) -> &'static str {
        match self {
            Content::Empty => "empty",
            Content::Boolean(_) => "boolean",
            Content::Int64(_) => "int64",
            Content::UInt64(_) => "uint64",
            Content::Float64(_) => "float64",
            Content::Utf8(_) => "string",
            Content::List { .. } => "list",
        }
    }
}

/// Nullable, jagged array
#[derive(Debug, Clone, PartialEq)]
pub struct JaggedArray {
    len: usize,
    content: Content,
    validity: Option<Vec<bool>>,
    source_dtype: Option<DataType>,
}

impl JaggedArray {
    /// Create an array, checking that content, validity and offsets agree
    /// with `len`
    pub fn new(len: usize, content: Content, validity: Option<Vec<bool>>) -> Result<Self> {
        if let Some(mask) = &validity {
            if mask.len() != len {
                return Err(KernelError::LengthMismatch {
                    expected: len,
                    actual: mask.len(),
                });
            }
        }

        let content_len = match &content {
            Content::Empty => len,
            Content::Boolean(v) => v.len(),
            Content::Int64(v) => v.len(),
            Content::UInt64(v) => v.len(),
            Content::Float64(v) => v.len(),
            Content::Utf8(v) => v.len(),
            Content::List { offsets, values } => {
                if offsets.first().copied() != Some(0)
                    || offsets.windows(2).any(|w| w[0] > w[1])
                    || offsets.last().copied() != Some(values.len())
                {
                    return Err(KernelError::InvalidValue(
                        "list offsets must start at 0, be non-decreasing and end at the child length"
                            .to_string(),
                    ));
                }
                offsets.len() - 1
            }
        };
        if content_len != len {
            return Err(KernelError::LengthMismatch {
                expected: len,
                actual: content_len,
            });
        }

        Ok(Self {
            len,
            content,
            validity,
            source_dtype: None,
        })
    }

    /// All-null array of length `len`
    pub fn nulls(len: usize) -> Self {
        Self {
            len,
            content: Content::Empty,
            validity: (len > 0).then(|| vec![false; len]),
            source_dtype: None,
        }
    }

    /// Remember the dtype this array was converted from
    pub fn with_source_dtype(mut self, dtype: DataType) -> Self {
        self.source_dtype = Some(dtype);
        self
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn content(&self) -> &Content {
        &self.content
    }

    pub fn validity(&self) -> Option<&[bool]> {
        self.validity.as_deref()
    }

    pub fn source_dtype(&self) -> Option<&DataType> {
        self.source_dtype.as_ref()
    }

    /// Name of the content type, e.g. `"int64"`
    pub fn kind_name(&self) -> &'static str {
        self.content.kind_name()
    }

    /// Whether element `index` is null. Out-of-range indices count as null.
    pub fn is_null(&self, index: usize) -> bool {
        if index >= self.len || matches!(self.content, Content::Empty) {
            return true;
        }
        self.validity.as_ref().is_some_and(|mask| !mask[index])
    }

    pub fn null_count(&self) -> usize {
        match (&self.content, &self.validity) {
            (Content::Empty, _) => self.len,
            (_, Some(mask)) => mask.iter().filter(|valid| !**valid).count(),
            (_, None) => 0,
        }
    }

    /// Element at `index`, `None` when null or out of range
    pub fn get(&self, index: usize) -> Option<Element<'_>> {
        if self.is_null(index) {
            return None;
        }
        let element = match &self.content {
            Content::Empty => return None,
            Content::Boolean(v) => Element::Boolean(v[index]),
            Content::Int64(v) => Element::Int64(v[index]),
            Content::UInt64(v) => Element::UInt64(v[index]),
            Content::Float64(v) => Element::Float64(v[index]),
            Content::Utf8(v) => Element::Str(v[index].as_str()),
            Content::List { offsets, values } => Element::List(ListView {
                values,
                start: offsets[index],
                end: offsets[index + 1],
            }),
        };
        Some(element)
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<Element<'_>>> + '_ {
        (0..self.len).map(move |i| self.get(i))
    }
}

/// A non-null element of a [`JaggedArray`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Element<'a> {
    Boolean(bool),
    Int64(i64),
    UInt64(u64),
    Float64(f64),
    Str(&'a str),
    List(ListView<'a>),
}

impl<'a> Element<'a> {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Element::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Integer value; floats are not truncated and unsigned values above
    /// `i64::MAX` give `None`
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Element::Int64(v) => Some(*v),
            Element::UInt64(v) => i64::try_from(*v).ok(),
            _ => None,
        }
    }

    /// Non-negative integer value
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Element::Int64(v) => u64::try_from(*v).ok(),
            Element::UInt64(v) => Some(*v),
            _ => None,
        }
    }

    /// Numeric value, integers included
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Element::Int64(v) => Some(*v as f64),
            Element::UInt64(v) => Some(*v as f64),
            Element::Float64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&'a str> {
        match self {
            Element::Str(s) => Some(*s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<ListView<'a>> {
        match self {
            Element::List(view) => Some(*view),
            _ => None,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Element::Boolean(_) => "boolean",
            Element::Int64(_) => "int64",
            Element::UInt64(_) => "uint64",
            Element::Float64(_) => "float64",
            Element::Str(_) => "string",
            Element::List(_) => "list",
        }
    }
}

/// Borrowed sub-range of a list array's child values
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ListView<'a> {
    values: &'a JaggedArray,
    start: usize,
    end: usize,
}

impl<'a> ListView<'a> {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn get(&self, index: usize) -> Option<Element<'a>> {
        if index >= self.len() {
            return None;
        }
        self.values.get(self.start + index)
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<Element<'a>>> + 'a {
        let values = self.values;
        (self.start..self.end).map(move |i| values.get(i))
    }
}
