//! Conversion between Polars series and [`JaggedArray`]s

use polars::prelude::*;

use super::{Content, JaggedArray};
use crate::error::{KernelError, Result};

/// Convert a series into the nested-array representation
///
/// Supports booleans, every integer and float width, strings, the `Null`
/// dtype and lists of any of those (recursively). `UInt64` keeps its own
/// content so values above `i64::MAX` survive.
pub fn from_series(series: &Series) -> Result<JaggedArray> {
    let dtype = series.dtype().clone();
    let len = series.len();

    let array = match &dtype {
        DataType::Null => JaggedArray::nulls(len),
        DataType::Boolean => {
            let (values, validity) = split_options(series.bool()?.iter(), len);
            JaggedArray::new(len, Content::Boolean(values), validity)?
        }
        DataType::UInt64 => {
            let (values, validity) = split_options(series.u64()?.iter(), len);
            JaggedArray::new(len, Content::UInt64(values), validity)?
        }
        dt if dt.is_integer() => {
            let widened = series.strict_cast(&DataType::Int64)?;
            let (values, validity) = split_options(widened.i64()?.iter(), len);
            JaggedArray::new(len, Content::Int64(values), validity)?
        }
        dt if dt.is_float() => {
            let widened = series.strict_cast(&DataType::Float64)?;
            let (values, validity) = split_options(widened.f64()?.iter(), len);
            JaggedArray::new(len, Content::Float64(values), validity)?
        }
        DataType::String => {
            let strings = series.str()?.iter().map(|v| v.map(str::to_string));
            let (values, validity) = split_options(strings, len);
            JaggedArray::new(len, Content::Utf8(values), validity)?
        }
        DataType::List(inner) => list_from_series(series, inner)?,
        other => return Err(KernelError::UnsupportedDtype(other.clone())),
    };

    Ok(array.with_source_dtype(dtype))
}

fn list_from_series(series: &Series, inner: &DataType) -> Result<JaggedArray> {
    let len = series.len();
    let ca = series.list()?;

    let mut child = Series::new_empty(series.name().clone(), inner);
    let mut offsets = Vec::with_capacity(len + 1);
    let mut validity = Vec::with_capacity(len);
    offsets.push(0);

    for item in ca.into_iter() {
        match item {
            Some(sub) => {
                child.append(&sub)?;
                validity.push(true);
            }
            None => validity.push(false),
        }
        offsets.push(child.len());
    }

    let values = from_series(&child)?;
    let validity = validity.iter().any(|valid| !valid).then_some(validity);
    JaggedArray::new(
        len,
        Content::List {
            offsets,
            values: Box::new(values),
        },
        validity,
    )
}

/// Convert a nested array back into a series named `name`
///
/// Arrays that came from [`from_series`] are cast back to their source dtype.
pub fn to_series(array: &JaggedArray, name: &str) -> Result<Series> {
    let name = PlSmallStr::from_str(name);
    let validity = array.validity();

    let series = match array.content() {
        Content::Empty => Series::full_null(name, array.len(), &DataType::Null),
        Content::Boolean(values) => Series::new(name, masked(values, validity)),
        Content::Int64(values) => Series::new(name, masked(values, validity)),
        Content::UInt64(values) => Series::new(name, masked(values, validity)),
        Content::Float64(values) => Series::new(name, masked(values, validity)),
        Content::Utf8(values) => {
            let strings: Vec<Option<&str>> = values
                .iter()
                .enumerate()
                .map(|(i, v)| is_valid(validity, i).then_some(v.as_str()))
                .collect();
            Series::new(name, strings)
        }
        Content::List { offsets, values } => {
            let child = to_series(values, "")?;
            let list_dtype = DataType::List(Box::new(child.dtype().clone()));
            if array.is_empty() {
                Series::new_empty(name, &list_dtype)
            } else {
                let ca: ListChunked = (0..array.len())
                    .map(|i| {
                        is_valid(validity, i)
                            .then(|| child.slice(offsets[i] as i64, offsets[i + 1] - offsets[i]))
                    })
                    .collect();
                ca.into_series().with_name(name).cast(&list_dtype)?
            }
        }
    };

    match array.source_dtype() {
        Some(dtype) if dtype != series.dtype() => Ok(series.strict_cast(dtype)?),
        _ => Ok(series),
    }
}

fn is_valid(validity: Option<&[bool]>, index: usize) -> bool {
    validity.map_or(true, |mask| mask[index])
}

fn masked<T: Copy>(values: &[T], validity: Option<&[bool]>) -> Vec<Option<T>> {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| is_valid(validity, i).then_some(*v))
        .collect()
}

fn split_options<T: Default>(
    iter: impl Iterator<Item = Option<T>>,
    len: usize,
) -> (Vec<T>, Option<Vec<bool>>) {
    let mut values = Vec::with_capacity(len);
    let mut validity = Vec::with_capacity(len);
    for item in iter {
        validity.push(item.is_some());
        values.push(item.unwrap_or_default());
    }
    let validity = validity.iter().any(|valid| !valid).then_some(validity);
    (values, validity)
}
