//! Scalar values: kernel constants and scalar kernel results

use polars::prelude::*;

use crate::error::{KernelError, Result};
use crate::layout::Element;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Scalar {
    #[default]
    Null,
    Boolean(bool),
    Int64(i64),
    Float64(f64),
    Utf8(String),
}

impl Scalar {
    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Scalar::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Scalar::Int64(v) => Some(*v),
            _ => None,
        }
    }

    /// Numeric value, integers included
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Int64(v) => Some(*v as f64),
            Scalar::Float64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::Utf8(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// One-row series holding this value, cast to `dtype`
    pub fn to_series(&self, name: PlSmallStr, dtype: &DataType) -> Result<Series> {
        let series = match self {
            Scalar::Null => return Ok(Series::full_null(name, 1, dtype)),
            Scalar::Boolean(b) => Series::new(name, [*b]),
            Scalar::Int64(v) => Series::new(name, [*v]),
            Scalar::Float64(v) => Series::new(name, [*v]),
            Scalar::Utf8(s) => Series::new(name, [s.as_str()]),
        };
        if series.dtype() == dtype {
            Ok(series)
        } else {
            Ok(series.strict_cast(dtype)?)
        }
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Boolean(value)
    }
}

impl From<i32> for Scalar {
    fn from(value: i32) -> Self {
        Scalar::Int64(value as i64)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Int64(value)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Float64(value)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Utf8(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::Utf8(value)
    }
}

impl<T: Into<Scalar>> From<Option<T>> for Scalar {
    fn from(value: Option<T>) -> Self {
        value.map_or(Scalar::Null, Into::into)
    }
}

impl TryFrom<Element<'_>> for Scalar {
    type Error = KernelError;

    fn try_from(element: Element<'_>) -> Result<Self> {
        match element {
            Element::Boolean(b) => Ok(Scalar::Boolean(b)),
            Element::Int64(v) => Ok(Scalar::Int64(v)),
            Element::UInt64(v) => i64::try_from(v).map(Scalar::Int64).map_err(|_| {
                KernelError::InvalidValue(format!("{v} does not fit a signed integer"))
            }),
            Element::Float64(v) => Ok(Scalar::Float64(v)),
            Element::Str(s) => Ok(Scalar::Utf8(s.to_string())),
            Element::List(_) => Err(KernelError::InvalidValue(
                "a list element is not a scalar".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversions() {
        assert_eq!(Scalar::from(100), Scalar::Int64(100));
        assert_eq!(Scalar::from(Some(0.5)), Scalar::Float64(0.5));
        assert_eq!(Scalar::from(None::<i64>), Scalar::Null);
        assert_eq!(Scalar::from("x").as_str(), Some("x"));
        assert_eq!(Scalar::Int64(3).as_f64(), Some(3.0));
        assert_eq!(Scalar::Float64(3.0).as_i64(), None);
    }

    #[test]
    fn test_to_series_casts() {
        let s = Scalar::Int64(7)
            .to_series("out".into(), &DataType::Float64)
            .unwrap();
        assert_eq!(s.dtype(), &DataType::Float64);
        assert_eq!(s.len(), 1);
        assert_eq!(s.f64().unwrap().get(0), Some(7.0));

        let null = Scalar::Null.to_series("out".into(), &DataType::Int64).unwrap();
        assert_eq!(null.dtype(), &DataType::Int64);
        assert_eq!(null.null_count(), 1);
    }

    #[test]
    fn test_from_element() {
        assert_eq!(
            Scalar::try_from(Element::Str("a")).unwrap(),
            Scalar::Utf8("a".to_string())
        );
        assert_eq!(Scalar::try_from(Element::UInt64(7)).unwrap(), Scalar::Int64(7));
        assert!(Scalar::try_from(Element::UInt64(u64::MAX)).is_err());
    }
}
