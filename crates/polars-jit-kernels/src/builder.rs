//! Incremental output builder for column kernels
//!
//! [`ArrayBuilder`] is append-only and dynamically typed: the first non-null
//! value decides the type of a layer, nulls seen before that are back-filled.
//! Appending a real after integers promotes the layer to `Float64`; signed and
//! unsigned integers do not mix. Lists are
//! opened with [`ArrayBuilder::begin_list`] and closed with
//! [`ArrayBuilder::end_list`]; while a list is open every append goes into it.

use std::mem;

use crate::error::{KernelError, Result};
use crate::layout::{Content, Element, JaggedArray};

#[derive(Debug, Clone)]
enum Value {
    Boolean(bool),
    Int64(i64),
    UInt64(u64),
    Float64(f64),
    Utf8(String),
}

impl Value {
    fn kind_name(&self) -> &'static str {
        match self {
            Value::Boolean(_) => "boolean",
            Value::Int64(_) => "int64",
            Value::UInt64(_) => "uint64",
            Value::Float64(_) => "float64",
            Value::Utf8(_) => "string",
        }
    }
}

#[derive(Debug, Clone, Default)]
enum Node {
    #[default]
    Unknown,
    Boolean(Vec<bool>),
    Int64(Vec<i64>),
    UInt64(Vec<u64>),
    Float64(Vec<f64>),
    Utf8(Vec<String>),
    List {
        offsets: Vec<usize>,
        child: Box<Layer>,
        open: bool,
    },
}

impl Node {
    fn kind_name(&self) -> &'static str {
        match self {
            Node::Unknown => "unknown",
            Node::Boolean(_) => "boolean",
            Node::Int64(_) => "int64",
            Node::UInt64(_) => "uint64",
            Node::Float64(_) => "float64",
            Node::Utf8(_) => "string",
            Node::List { .. } => "list",
        }
    }
}

#[derive(Debug, Clone, Default)]
struct Layer {
    node: Node,
    validity: Vec<bool>,
}

impl Layer {
    fn len(&self) -> usize {
        self.validity.len()
    }

    fn open_child(&mut self) -> Option<&mut Layer> {
        match &mut self.node {
            Node::List {
                child, open: true, ..
            } => Some(&mut **child),
            _ => None,
        }
    }

    fn null(&mut self) {
        if let Some(child) = self.open_child() {
            return child.null();
        }
        match &mut self.node {
            Node::Unknown => {}
            Node::Boolean(v) => v.push(false),
            Node::Int64(v) => v.push(0),
            Node::UInt64(v) => v.push(0),
            Node::Float64(v) => v.push(0.0),
            Node::Utf8(v) => v.push(String::new()),
            Node::List { offsets, .. } => {
                let last = offsets.last().copied().unwrap_or_default();
                offsets.push(last);
            }
        }
        self.validity.push(false);
    }

    fn push(&mut self, value: Value) -> Result<()> {
        if let Some(child) = self.open_child() {
            return child.push(value);
        }

        let n = self.len();
        self.node = match (mem::take(&mut self.node), &value) {
            (Node::Unknown, Value::Boolean(_)) => Node::Boolean(vec![false; n]),
            (Node::Unknown, Value::Int64(_)) => Node::Int64(vec![0; n]),
            (Node::Unknown, Value::UInt64(_)) => Node::UInt64(vec![0; n]),
            (Node::Unknown, Value::Float64(_)) => Node::Float64(vec![0.0; n]),
            (Node::Unknown, Value::Utf8(_)) => Node::Utf8(vec![String::new(); n]),
            (Node::Int64(values), Value::Float64(_)) => {
                Node::Float64(values.into_iter().map(|v| v as f64).collect())
            }
            (Node::UInt64(values), Value::Float64(_)) => {
                Node::Float64(values.into_iter().map(|v| v as f64).collect())
            }
            (node, _) => node,
        };

        match (&mut self.node, value) {
            (Node::Boolean(v), Value::Boolean(b)) => v.push(b),
            (Node::Int64(v), Value::Int64(i)) => v.push(i),
            (Node::Float64(v), Value::Float64(f)) => v.push(f),
            (Node::Float64(v), Value::Int64(i)) => v.push(i as f64),
            (Node::UInt64(v), Value::UInt64(u)) => v.push(u),
            (Node::Float64(v), Value::UInt64(u)) => v.push(u as f64),
            (Node::Utf8(v), Value::Utf8(s)) => v.push(s),
            (node, value) => {
                return Err(KernelError::BuilderTypeConflict {
                    layer: node.kind_name(),
                    value: value.kind_name(),
                })
            }
        }
        self.validity.push(true);
        Ok(())
    }

    fn begin_list(&mut self) -> Result<()> {
        if let Some(child) = self.open_child() {
            return child.begin_list();
        }

        if matches!(self.node, Node::Unknown) {
            self.node = Node::List {
                offsets: vec![0; self.len() + 1],
                child: Box::default(),
                open: false,
            };
        }
        match &mut self.node {
            Node::List { open, .. } => *open = true,
            node => {
                return Err(KernelError::BuilderTypeConflict {
                    layer: node.kind_name(),
                    value: "list",
                })
            }
        }
        self.validity.push(true);
        Ok(())
    }

    fn end_list(&mut self) -> Result<()> {
        match &mut self.node {
            Node::List {
                offsets,
                child,
                open,
            } if *open => {
                if matches!(child.node, Node::List { open: true, .. }) {
                    return child.end_list();
                }
                offsets.push(child.len());
                *open = false;
                Ok(())
            }
            _ => Err(KernelError::Builder(
                "end_list called without a matching begin_list".to_string(),
            )),
        }
    }

    fn to_array(&self) -> Result<JaggedArray> {
        let content = match &self.node {
            Node::Unknown => Content::Empty,
            Node::Boolean(v) => Content::Boolean(v.clone()),
            Node::Int64(v) => Content::Int64(v.clone()),
            Node::UInt64(v) => Content::UInt64(v.clone()),
            Node::Float64(v) => Content::Float64(v.clone()),
            Node::Utf8(v) => Content::Utf8(v.clone()),
            Node::List { open: true, .. } => {
                return Err(KernelError::Builder(
                    "snapshot taken while a list is still open".to_string(),
                ))
            }
            Node::List { offsets, child, .. } => Content::List {
                offsets: offsets.clone(),
                values: Box::new(child.to_array()?),
            },
        };

        let validity = self
            .validity
            .iter()
            .any(|valid| !valid)
            .then(|| self.validity.clone());
        JaggedArray::new(self.len(), content, validity)
    }
}

/// Append-only builder producing a [`JaggedArray`]
///
/// # Example
/// ```rust
/// use polars_jit_kernels::ArrayBuilder;
///
/// # fn main() -> polars_jit_kernels::Result<()> {
/// let mut builder = ArrayBuilder::new();
/// builder.integer(18)?;
/// builder.null()?;
/// builder.integer(6)?;
///
/// let array = builder.snapshot()?;
/// assert_eq!(array.len(), 3);
/// assert_eq!(array.null_count(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct ArrayBuilder {
    root: Layer,
}

impl ArrayBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of top-level elements appended so far
    pub fn len(&self) -> usize {
        self.root.len()
    }

    pub fn is_empty(&self) -> bool {
        self.root.len() == 0
    }

    pub fn null(&mut self) -> Result<()> {
        self.root.null();
        Ok(())
    }

    pub fn boolean(&mut self, value: bool) -> Result<()> {
        self.root.push(Value::Boolean(value))
    }

    pub fn integer(&mut self, value: i64) -> Result<()> {
        self.root.push(Value::Int64(value))
    }

    pub fn unsigned(&mut self, value: u64) -> Result<()> {
        self.root.push(Value::UInt64(value))
    }

    pub fn real(&mut self, value: f64) -> Result<()> {
        self.root.push(Value::Float64(value))
    }

    pub fn string(&mut self, value: &str) -> Result<()> {
        self.root.push(Value::Utf8(value.to_string()))
    }

    pub fn begin_list(&mut self) -> Result<()> {
        self.root.begin_list()
    }

    pub fn end_list(&mut self) -> Result<()> {
        self.root.end_list()
    }

    /// Append an element read from another array, copying lists deeply
    pub fn append(&mut self, element: Option<Element<'_>>) -> Result<()> {
        match element {
            None => self.null(),
            Some(Element::Boolean(b)) => self.boolean(b),
            Some(Element::Int64(i)) => self.integer(i),
            Some(Element::UInt64(u)) => self.unsigned(u),
            Some(Element::Float64(f)) => self.real(f),
            Some(Element::Str(s)) => self.string(s),
            Some(Element::List(view)) => {
                self.begin_list()?;
                for item in view.iter() {
                    self.append(item)?;
                }
                self.end_list()
            }
        }
    }

    /// Freeze the current contents; the builder stays usable
    pub fn snapshot(&self) -> Result<JaggedArray> {
        self.root.to_array()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integers_with_nulls() {
        let mut builder = ArrayBuilder::new();
        builder.null().unwrap();
        builder.integer(18).unwrap();
        builder.null().unwrap();
        builder.integer(6).unwrap();

        let arr = builder.snapshot().unwrap();
        assert_eq!(arr.kind_name(), "int64");
        let values: Vec<_> = arr.iter().map(|e| e.and_then(|e| e.as_i64())).collect();
        assert_eq!(values, vec![None, Some(18), None, Some(6)]);
    }

    #[test]
    fn test_integer_then_real_promotes() {
        let mut builder = ArrayBuilder::new();
        builder.integer(1).unwrap();
        builder.real(2.5).unwrap();
        builder.integer(3).unwrap();

        let arr = builder.snapshot().unwrap();
        assert_eq!(arr.content(), &Content::Float64(vec![1.0, 2.5, 3.0]));
        assert_eq!(arr.validity(), None);
    }

    #[test]
    fn test_unsigned_values() {
        let mut builder = ArrayBuilder::new();
        builder.unsigned(u64::MAX).unwrap();
        builder.null().unwrap();
        assert!(matches!(
            builder.integer(-1),
            Err(KernelError::BuilderTypeConflict {
                layer: "uint64",
                value: "int64"
            })
        ));

        let arr = builder.snapshot().unwrap();
        assert_eq!(arr.content(), &Content::UInt64(vec![u64::MAX, 0]));
        assert_eq!(arr.validity(), Some(&[true, false][..]));
    }

    #[test]
    fn test_type_conflict() {
        let mut builder = ArrayBuilder::new();
        builder.boolean(true).unwrap();
        let err = builder.string("x").unwrap_err();
        assert!(matches!(
            err,
            KernelError::BuilderTypeConflict {
                layer: "boolean",
                value: "string"
            }
        ));
        // the rejected value is not recorded
        assert_eq!(builder.len(), 1);
    }

    #[test]
    fn test_only_nulls() {
        let mut builder = ArrayBuilder::new();
        builder.null().unwrap();
        builder.null().unwrap();

        let arr = builder.snapshot().unwrap();
        assert_eq!(arr.content(), &Content::Empty);
        assert_eq!(arr.null_count(), 2);
    }

    #[test]
    fn test_nested_lists() {
        let mut builder = ArrayBuilder::new();
        builder.begin_list().unwrap();
        builder.integer(1).unwrap();
        builder.integer(2).unwrap();
        builder.end_list().unwrap();
        builder.null().unwrap();
        builder.begin_list().unwrap();
        builder.end_list().unwrap();

        assert_eq!(builder.len(), 3);
        let arr = builder.snapshot().unwrap();
        match arr.content() {
            Content::List { offsets, values } => {
                assert_eq!(offsets, &vec![0, 2, 2, 2]);
                assert_eq!(values.len(), 2);
            }
            other => panic!("expected list content, got {other:?}"),
        }
        assert!(arr.is_null(1));
        assert_eq!(arr.get(2).and_then(|e| e.as_list()).map(|l| l.len()), Some(0));
    }

    #[test]
    fn test_list_of_lists() {
        let mut builder = ArrayBuilder::new();
        builder.begin_list().unwrap();
        builder.begin_list().unwrap();
        builder.real(0.5).unwrap();
        builder.end_list().unwrap();
        builder.null().unwrap();
        builder.end_list().unwrap();

        let arr = builder.snapshot().unwrap();
        let outer = arr.get(0).and_then(|e| e.as_list()).unwrap();
        assert_eq!(outer.len(), 2);
        let inner = outer.get(0).and_then(|e| e.as_list()).unwrap();
        assert_eq!(inner.get(0), Some(Element::Float64(0.5)));
        assert!(outer.get(1).is_none());
    }

    #[test]
    fn test_unbalanced_lists() {
        let mut builder = ArrayBuilder::new();
        assert!(matches!(builder.end_list(), Err(KernelError::Builder(_))));

        builder.begin_list().unwrap();
        builder.integer(1).unwrap();
        assert!(matches!(builder.snapshot(), Err(KernelError::Builder(_))));
    }

    #[test]
    fn test_append_copies_elements() {
        let mut source = ArrayBuilder::new();
        source.begin_list().unwrap();
        source.string("a").unwrap();
        source.null().unwrap();
        source.end_list().unwrap();
        source.null().unwrap();
        let source = source.snapshot().unwrap();

        let mut builder = ArrayBuilder::new();
        for element in source.iter() {
            builder.append(element).unwrap();
        }
        assert_eq!(builder.snapshot().unwrap(), source);
    }
}
