//! Closed set of type tags and the per-tag coercion rules.
//!
//! Every declared parameter resolves to a [`TypeTag`]. Validation is a
//! tagged-union dispatch in [`TypeTag::coerce`]: each tag knows which
//! runtime [`Value`]s it accepts and how they are converted.

use std::fmt;
use std::sync::Arc;

use crate::array::typed_construct;
use crate::config::get_coercion_config;
use crate::errors::{CallTypesError, Result};
use crate::value::{format_float, Value};

/// Type reference carried by a descriptor.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeTag {
    /// Accepts every value unchanged.
    Any,
    NoneType,
    Str,
    Int,
    Float,
    Bool,
    Enum(Arc<EnumType>),
    Class(ClassKey),
    /// Homogeneous typed sequence of the inner type.
    Array(Box<TypeTag>),
    /// Mapping from key type to value type.
    Mapping(Box<TypeTag>, Box<TypeTag>),
    /// Union of alternatives. Only legal nested inside another type.
    Union(Vec<TypeTag>),
}

impl TypeTag {
    pub fn array_of(element: TypeTag) -> Self {
        Self::Array(Box::new(element))
    }

    pub fn mapping_of(key: TypeTag, value: TypeTag) -> Self {
        Self::Mapping(Box::new(key), Box::new(value))
    }

    /// Name of the generic origin for subscripted tags, used in error messages.
    pub fn origin(&self) -> Option<&'static str> {
        match self {
            Self::Array(_) => Some("Array"),
            Self::Mapping(..) => Some("typing.Mapping"),
            Self::Union(_) => Some("typing.Union"),
            _ => None,
        }
    }

    /// Validate `value` against this tag, returning the canonical value.
    pub fn coerce(&self, value: Value) -> Result<Value> {
        let config = get_coercion_config();
        match self {
            Self::Any => Ok(value),
            Self::NoneType => match value {
                Value::None => Ok(Value::None),
                other => Err(self.mismatch(&other)),
            },
            Self::Str => match value {
                Value::Str(s) => Ok(Value::Str(s)),
                Value::Int(i) if config.stringify_scalars => Ok(Value::Str(i.to_string())),
                Value::Float(f) if config.stringify_scalars => Ok(Value::Str(format_float(f))),
                Value::Bool(b) if config.stringify_scalars => {
                    Ok(Value::Str(if b { "True" } else { "False" }.to_string()))
                }
                Value::Enum(e) if config.stringify_scalars => {
                    Ok(Value::Str(format!("{}.{}", e.enum_name, e.name)))
                }
                other => Err(self.mismatch(&other)),
            },
            Self::Float => match value {
                Value::Float(f) => Ok(Value::Float(f)),
                Value::Int(i) if config.widen_int_to_float => Ok(Value::Float(i as f64)),
                Value::Str(s) if config.parse_numeric_text => match s.trim().parse::<f64>() {
                    Ok(f) => Ok(Value::Float(f)),
                    Err(_) => Err(self.mismatch(&Value::Str(s))),
                },
                other => Err(self.mismatch(&other)),
            },
            Self::Int => match value {
                Value::Int(i) => Ok(Value::Int(i)),
                Value::Float(f)
                    if config.narrow_integral_floats
                        && f.fract() == 0.0
                        && f.is_finite()
                        && f.abs() < i64::MAX as f64 =>
                {
                    Ok(Value::Int(f as i64))
                }
                Value::Str(s) if config.parse_numeric_text => match s.trim().parse::<i64>() {
                    Ok(i) => Ok(Value::Int(i)),
                    Err(_) => Err(self.mismatch(&Value::Str(s))),
                },
                other => Err(self.mismatch(&other)),
            },
            Self::Bool => match value {
                Value::Bool(b) => Ok(Value::Bool(b)),
                Value::Int(0) => Ok(Value::Bool(false)),
                Value::Int(1) => Ok(Value::Bool(true)),
                other => Err(self.mismatch(&other)),
            },
            Self::Enum(enum_type) => enum_type.coerce(value),
            Self::Class(key) => match &value {
                Value::Object(instance) if instance.class().key().is_subclass_of(key) => {
                    Ok(value.clone())
                }
                other => Err(self.mismatch(other)),
            },
            Self::Array(element) => {
                let raw = match value {
                    Value::None => None,
                    other => Some(other),
                };
                typed_construct((**element).clone(), raw).map(Value::Array)
            }
            Self::Mapping(key_type, value_type) => match value {
                Value::Map(pairs) => {
                    let mut coerced: Vec<(Value, Value)> = Vec::with_capacity(pairs.len());
                    for (k, v) in pairs {
                        let k = key_type.coerce(k)?;
                        if coerced.iter().any(|(existing, _)| *existing == k) {
                            return Err(CallTypesError::DuplicateKey { key: k.repr() });
                        }
                        coerced.push((k, value_type.coerce(v)?));
                    }
                    Ok(Value::Map(coerced))
                }
                other => Err(self.mismatch(&other)),
            },
            Self::Union(members) => members
                .iter()
                .find_map(|member| member.coerce(value.clone()).ok())
                .ok_or_else(|| self.mismatch(&value)),
        }
    }

    fn mismatch(&self, value: &Value) -> CallTypesError {
        CallTypesError::type_mismatch(self.to_string(), value.type_name(), value.repr())
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => write!(f, "Any"),
            Self::NoneType => write!(f, "NoneType"),
            Self::Str => write!(f, "str"),
            Self::Int => write!(f, "int"),
            Self::Float => write!(f, "float"),
            Self::Bool => write!(f, "bool"),
            Self::Enum(e) => write!(f, "{}", e.name),
            Self::Class(key) => write!(f, "{}", key.name()),
            Self::Array(element) => write!(f, "Array[{}]", element),
            Self::Mapping(k, v) => write!(f, "Mapping[{}, {}]", k, v),
            Self::Union(members) => {
                let names: Vec<String> = members.iter().map(ToString::to_string).collect();
                write!(f, "Union[{}]", names.join(", "))
            }
        }
    }
}

/// Enumeration with named members carrying integer values.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumType {
    pub name: String,
    members: Vec<(String, i64)>,
}

impl EnumType {
    pub fn new<S, N, I>(name: S, members: I) -> Self
    where
        S: Into<String>,
        N: Into<String>,
        I: IntoIterator<Item = (N, i64)>,
    {
        Self {
            name: name.into(),
            members: members
                .into_iter()
                .map(|(member, value)| (member.into(), value))
                .collect(),
        }
    }

    /// Look a member up by name, like `Status['good']`.
    pub fn member(&self, name: &str) -> Option<EnumValue> {
        self.members
            .iter()
            .find(|(member, _)| member == name)
            .map(|(member, value)| self.make_value(member, *value))
    }

    /// Look a member up by value, like `Status(0)`.
    pub fn from_value(&self, value: i64) -> Option<EnumValue> {
        self.members
            .iter()
            .find(|(_, v)| *v == value)
            .map(|(member, v)| self.make_value(member, *v))
    }

    pub fn members(&self) -> impl Iterator<Item = EnumValue> + '_ {
        self.members
            .iter()
            .map(|(member, value)| self.make_value(member, *value))
    }

    fn make_value(&self, member: &str, value: i64) -> EnumValue {
        EnumValue {
            enum_name: self.name.clone(),
            name: member.to_string(),
            value,
        }
    }

    fn coerce(&self, value: Value) -> Result<Value> {
        let found = match &value {
            Value::Enum(e) if e.enum_name == self.name => self.member(&e.name),
            Value::Str(s) => self.member(s),
            Value::Int(i) => self.from_value(*i),
            _ => None,
        };
        found.map(Value::Enum).ok_or_else(|| {
            CallTypesError::type_mismatch(self.name.clone(), value.type_name(), value.repr())
        })
    }
}

/// A member of an [`EnumType`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnumValue {
    pub enum_name: String,
    pub name: String,
    pub value: i64,
}

impl fmt::Display for EnumValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}.{}: {}>", self.enum_name, self.name, self.value)
    }
}

/// Identity of a declared class: its name followed by its ancestors' names.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClassKey {
    lineage: Arc<[String]>,
}

impl ClassKey {
    pub fn new(name: impl Into<String>, parent: Option<&ClassKey>) -> Self {
        let mut lineage = vec![name.into()];
        if let Some(parent) = parent {
            lineage.extend(parent.lineage.iter().cloned());
        }
        Self {
            lineage: lineage.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.lineage[0]
    }

    /// Ancestor names, nearest first, excluding the class itself.
    pub fn ancestors(&self) -> &[String] {
        &self.lineage[1..]
    }

    /// True if `self` is `other` or derives from it.
    pub fn is_subclass_of(&self, other: &ClassKey) -> bool {
        self.lineage.ends_with(&other.lineage)
    }
}

/// Element storage type of a numeric array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dtype {
    Int32,
    Int64,
    Float32,
    Float64,
    Bool,
}

impl Dtype {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
            Self::Bool => "bool",
        }
    }

    /// True if the storage type is exactly the declared element type.
    pub fn matches(&self, element: &TypeTag) -> bool {
        matches!(
            (self, element),
            (Self::Int64, TypeTag::Int) | (Self::Float64, TypeTag::Float) | (Self::Bool, TypeTag::Bool)
        )
    }
}

impl fmt::Display for Dtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone)]
enum NumericBuffer {
    Int(Arc<[i64]>),
    Float(Arc<[f64]>),
    Bool(Arc<[bool]>),
}

/// Numeric-library array: a dtype plus a shared buffer.
///
/// Cloning shares the buffer, so wrapping one in an `Array` never copies.
#[derive(Debug, Clone)]
pub struct NumericArray {
    dtype: Dtype,
    buffer: NumericBuffer,
}

impl NumericArray {
    pub fn from_i64(data: Vec<i64>) -> Self {
        Self {
            dtype: Dtype::Int64,
            buffer: NumericBuffer::Int(data.into()),
        }
    }

    pub fn from_i32(data: Vec<i32>) -> Self {
        Self {
            dtype: Dtype::Int32,
            buffer: NumericBuffer::Int(data.into_iter().map(i64::from).collect()),
        }
    }

    pub fn from_f64(data: Vec<f64>) -> Self {
        Self {
            dtype: Dtype::Float64,
            buffer: NumericBuffer::Float(data.into()),
        }
    }

    pub fn from_f32(data: Vec<f32>) -> Self {
        Self {
            dtype: Dtype::Float32,
            buffer: NumericBuffer::Float(data.into_iter().map(f64::from).collect()),
        }
    }

    pub fn from_bool(data: Vec<bool>) -> Self {
        Self {
            dtype: Dtype::Bool,
            buffer: NumericBuffer::Bool(data.into()),
        }
    }

    /// `0..n` with int64 storage.
    pub fn arange(n: i64) -> Self {
        Self::from_i64((0..n).collect())
    }

    /// `0..n` with float64 storage.
    pub fn arange_f64(n: i64) -> Self {
        Self::from_f64((0..n).map(|i| i as f64).collect())
    }

    pub fn dtype(&self) -> Dtype {
        self.dtype
    }

    pub fn len(&self) -> usize {
        match &self.buffer {
            NumericBuffer::Int(data) => data.len(),
            NumericBuffer::Float(data) => data.len(),
            NumericBuffer::Bool(data) => data.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<Value> {
        match &self.buffer {
            NumericBuffer::Int(data) => data.get(index).map(|v| Value::Int(*v)),
            NumericBuffer::Float(data) => data.get(index).map(|v| Value::Float(*v)),
            NumericBuffer::Bool(data) => data.get(index).map(|v| Value::Bool(*v)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = Value> + '_ {
        (0..self.len()).filter_map(move |i| self.get(i))
    }

    /// True if both arrays point at the same buffer.
    pub fn shares_buffer(&self, other: &NumericArray) -> bool {
        match (&self.buffer, &other.buffer) {
            (NumericBuffer::Int(a), NumericBuffer::Int(b)) => Arc::ptr_eq(a, b),
            (NumericBuffer::Float(a), NumericBuffer::Float(b)) => Arc::ptr_eq(a, b),
            (NumericBuffer::Bool(a), NumericBuffer::Bool(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Python-style representation, e.g. `array([0, 1, 2])`.
    pub fn repr(&self) -> String {
        let items: Vec<String> = self.iter().map(|v| v.repr()).collect();
        format!("array([{}])", items.join(", "))
    }
}

impl PartialEq for NumericArray {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}
