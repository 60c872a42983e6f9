//! Typed sequence container, the canonical value for "array of T" parameters.
//!
//! An [`Array`] always carries its element type. Construction goes through
//! [`typed_construct`], which accepts an existing container, a native list, a
//! numeric-library array with matching storage type, a single text value for
//! text arrays, or nothing at all.
//!
//! ```rust
//! use calltypes::array::typed_construct;
//! use calltypes::types::TypeTag;
//! use calltypes::value::Value;
//!
//! let ints = typed_construct(TypeTag::Int, Some(Value::from(vec![1i64, 2]))).unwrap();
//! assert!(ints == [Value::Int(1), Value::Int(2)][..]);
//! assert!(ints.contains(&Value::Int(1)));
//! ```

use std::fmt;

use crate::errors::{CallTypesError, Result};
use crate::types::{NumericArray, TypeTag};
use crate::value::{join_reprs, Value};

#[derive(Debug, Clone)]
enum Storage {
    Values(Vec<Value>),
    Numeric(NumericArray),
}

/// Homogeneous, element-type-checked ordered container.
#[derive(Debug, Clone)]
pub struct Array {
    typ: TypeTag,
    seq: Storage,
}

impl Array {
    /// Empty container of `typ`.
    pub fn new(typ: TypeTag) -> Self {
        Self {
            typ,
            seq: Storage::Values(Vec::new()),
        }
    }

    /// Construct from an optional element type. A missing element type is an error.
    pub fn construct(typ: Option<TypeTag>, raw: Option<Value>) -> Result<Self> {
        let typ = typ.ok_or(CallTypesError::UnboundArray)?;
        typed_construct(typ, raw)
    }

    /// Declared element type.
    pub fn typ(&self) -> &TypeTag {
        &self.typ
    }

    pub fn len(&self) -> usize {
        match &self.seq {
            Storage::Values(values) => values.len(),
            Storage::Numeric(numeric) => numeric.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<Value> {
        match &self.seq {
            Storage::Values(values) => values.get(index).cloned(),
            Storage::Numeric(numeric) => numeric.get(index),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = Value> + '_ {
        (0..self.len()).filter_map(move |i| self.get(i))
    }

    /// Elementwise containment.
    pub fn contains(&self, value: &Value) -> bool {
        self.iter().any(|v| v == *value)
    }

    /// The wrapped numeric array, if the container was built from one.
    pub fn as_numeric(&self) -> Option<&NumericArray> {
        match &self.seq {
            Storage::Numeric(numeric) => Some(numeric),
            Storage::Values(_) => None,
        }
    }

    /// Append a value, coercing it to the element type.
    ///
    /// A numeric-backed container is materialised into owned values first.
    pub fn push(&mut self, value: impl Into<Value>) -> Result<()> {
        let value = self.typ.coerce(value.into())?;
        if let Storage::Numeric(numeric) = &self.seq {
            self.seq = Storage::Values(numeric.iter().collect());
        }
        if let Storage::Values(values) = &mut self.seq {
            values.push(value);
        }
        Ok(())
    }

    /// Elementwise equality against a plain sequence.
    pub fn eq_values(&self, values: &[Value]) -> bool {
        self.len() == values.len() && self.iter().zip(values.iter()).all(|(a, b)| a == *b)
    }

    /// Python-style representation, e.g. `Array(['x'])` or `Array(array([0, 1]))`.
    pub fn repr(&self) -> String {
        match &self.seq {
            Storage::Values(values) => format!("Array([{}])", join_reprs(values.iter())),
            Storage::Numeric(numeric) => format!("Array({})", numeric.repr()),
        }
    }
}

impl PartialEq for Array {
    fn eq(&self, other: &Self) -> bool {
        self.typ == other.typ && self.eq_values(&other.iter().collect::<Vec<_>>())
    }
}

impl PartialEq<[Value]> for Array {
    fn eq(&self, other: &[Value]) -> bool {
        self.eq_values(other)
    }
}

impl PartialEq<Vec<Value>> for Array {
    fn eq(&self, other: &Vec<Value>) -> bool {
        self.eq_values(other)
    }
}

impl PartialEq<NumericArray> for Array {
    fn eq(&self, other: &NumericArray) -> bool {
        self.len() == other.len() && self.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}

impl fmt::Display for Array {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.repr())
    }
}

/// Build a container of `typ` from `raw`.
///
/// Dispatch order: existing container (identity, or an error if the element
/// type differs), nothing (empty), numeric array (storage type must match
/// exactly, wrapped without copying), native list (each element coerced),
/// single text value for text containers. Anything else is an error.
pub fn typed_construct(typ: TypeTag, raw: Option<Value>) -> Result<Array> {
    match raw {
        Some(Value::Array(existing)) => {
            if existing.typ == typ {
                Ok(existing)
            } else {
                Err(CallTypesError::ArrayElementMismatch {
                    expected: typ.to_string(),
                    actual: existing.typ.to_string(),
                })
            }
        }
        None => Ok(Array::new(typ)),
        Some(Value::NdArray(numeric)) => {
            if numeric.dtype().matches(&typ) {
                Ok(Array {
                    typ,
                    seq: Storage::Numeric(numeric),
                })
            } else {
                Err(CallTypesError::DtypeMismatch {
                    expected: typ.to_string(),
                    dtype: numeric.dtype().to_string(),
                })
            }
        }
        Some(Value::List(values)) => {
            let values = values
                .into_iter()
                .map(|v| typ.coerce(v))
                .collect::<Result<Vec<_>>>()?;
            Ok(Array {
                typ,
                seq: Storage::Values(values),
            })
        }
        Some(Value::Str(text)) if typ == TypeTag::Str => Ok(Array {
            typ,
            seq: Storage::Values(vec![Value::Str(text)]),
        }),
        Some(other) => Err(CallTypesError::UnconvertibleArray {
            expected: typ.to_string(),
            actual: other.type_name(),
        }),
    }
}

/// Convert `raw` to the container type `array_type` (which must be `Array[T]`).
pub fn to_array(array_type: &TypeTag, raw: Option<Value>) -> Result<Array> {
    let element = self::array_type(array_type).ok_or(CallTypesError::UnboundArray)?;
    typed_construct(element.clone(), raw)
}

/// Element type of an `Array[T]` type tag.
pub fn array_type(typ: &TypeTag) -> Option<&TypeTag> {
    match typ {
        TypeTag::Array(element) => Some(element),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(values: &[i64]) -> Value {
        Value::List(values.iter().map(|v| Value::Int(*v)).collect())
    }

    #[test]
    fn test_construct_without_type_fails() {
        assert_eq!(
            Array::construct(None, None).unwrap_err(),
            CallTypesError::UnboundArray
        );
    }

    #[test]
    fn test_empty_equals_empty_list() {
        let empty = Array::construct(Some(TypeTag::Int), None).unwrap();
        let from_list = typed_construct(TypeTag::Int, Some(ints(&[]))).unwrap();
        assert_eq!(empty, from_list);
        assert!(empty.is_empty());
    }

    #[test]
    fn test_different_element_types_never_equal() {
        let a = typed_construct(TypeTag::Int, Some(ints(&[1, 2]))).unwrap();
        let b = typed_construct(TypeTag::Float, Some(ints(&[1, 2]))).unwrap();
        assert_ne!(a, b);
        assert_ne!(Array::new(TypeTag::Int), Array::new(TypeTag::Float));
    }

    #[test]
    fn test_equals_plain_sequence() {
        let a = typed_construct(TypeTag::Int, Some(ints(&[1, 2]))).unwrap();
        assert!(a == vec![Value::Int(1), Value::Int(2)]);
        assert!(a != vec![Value::Int(2), Value::Int(2)]);
        assert!(a == NumericArray::from_i64(vec![1, 2]));
        assert!(a != NumericArray::from_i64(vec![2, 2]));
    }

    #[test]
    fn test_identity_for_same_type() {
        let a = typed_construct(TypeTag::Int, Some(NumericArray::arange(3).into())).unwrap();
        let again = typed_construct(TypeTag::Int, Some(Value::Array(a.clone()))).unwrap();
        let (Some(x), Some(y)) = (a.as_numeric(), again.as_numeric()) else {
            panic!("expected numeric storage");
        };
        assert!(x.shares_buffer(y));
    }

    #[test]
    fn test_mismatched_container_fails() {
        let a = typed_construct(TypeTag::Int, Some(ints(&[1]))).unwrap();
        let err = to_array(&TypeTag::array_of(TypeTag::Float), Some(Value::Array(a))).unwrap_err();
        assert_eq!(err.to_string(), "Expected Array[float], got Array[int]");
        assert_eq!(err.python_class(), "AssertionError");
    }

    #[test]
    fn test_numeric_dtype_checked() {
        let t = TypeTag::array_of(TypeTag::Float);
        assert!(matches!(
            to_array(&t, Some(NumericArray::arange(43).into())),
            Err(CallTypesError::DtypeMismatch { .. })
        ));
        let ok = to_array(&t, Some(NumericArray::arange_f64(3).into())).unwrap();
        assert!(ok == vec![Value::Float(0.0), Value::Float(1.0), Value::Float(2.0)]);
    }

    #[test]
    fn test_numeric_wrap_shares_buffer() {
        let numeric = NumericArray::arange(3);
        let a = typed_construct(TypeTag::Int, Some(numeric.clone().into())).unwrap();
        assert!(a.as_numeric().unwrap().shares_buffer(&numeric));
        assert_eq!(a.repr(), "Array(array([0, 1, 2]))");
    }

    #[test]
    fn test_text_scalar_wrapped() {
        let a = to_array(&TypeTag::array_of(TypeTag::Str), Some(Value::from("233"))).unwrap();
        assert_eq!(a.get(0), Some(Value::from("233")));
        assert_eq!(a.len(), 1);
    }

    #[test]
    fn test_non_text_scalar_rejected() {
        let err = typed_construct(TypeTag::Int, Some(Value::Int(3))).unwrap_err();
        assert_eq!(err.to_string(), "Cannot make Array[int] from int");
    }

    #[test]
    fn test_elements_coerced() {
        let a = typed_construct(TypeTag::Float, Some(ints(&[1]))).unwrap();
        assert_eq!(a.repr(), "Array([1.0])");
        assert!(typed_construct(TypeTag::Int, Some(Value::from(vec!["x"]))).is_err());
    }

    #[test]
    fn test_contains() {
        let a = typed_construct(TypeTag::Int, Some(ints(&[1, 2]))).unwrap();
        assert!(a.contains(&Value::Int(1)));
        assert!(!a.contains(&Value::Int(0)));
    }

    #[test]
    fn test_push_keeps_type_and_materialises() {
        let mut a = typed_construct(TypeTag::Int, Some(NumericArray::arange(2).into())).unwrap();
        a.push(5i64).unwrap();
        assert_eq!(a.typ(), &TypeTag::Int);
        assert!(a.as_numeric().is_none());
        assert!(a == vec![Value::Int(0), Value::Int(1), Value::Int(5)]);
        assert!(a.push("nope").is_err());
    }

    #[test]
    fn test_array_type() {
        assert_eq!(array_type(&TypeTag::array_of(TypeTag::Int)), Some(&TypeTag::Int));
        assert_eq!(array_type(&TypeTag::Int), None);
    }
}
