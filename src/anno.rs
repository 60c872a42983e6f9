//! Type descriptors: a named, typed, documented, optionally defaulted
//! description of one parameter or return value.

use std::fmt;

use crate::array::typed_construct;
use crate::errors::{CallTypesError, Result};
use crate::types::{ClassKey, TypeTag};
use crate::value::Value;

/// Default carried by a descriptor.
#[derive(Debug, Clone, PartialEq)]
pub enum AnnoDefault {
    /// The parameter is required.
    NoDefault,
    /// The parameter defaults to this value. `Value::None` means optional.
    Value(Value),
}

impl AnnoDefault {
    pub fn value(&self) -> Option<&Value> {
        match self {
            Self::NoDefault => None,
            Self::Value(v) => Some(v),
        }
    }

    pub fn is_required(&self) -> bool {
        matches!(self, Self::NoDefault)
    }
}

/// Type descriptor.
///
/// For sequence descriptors `typ` is the element type and `is_array` is set.
/// For mapping descriptors `typ` is `Mapping(key, value)` and `is_mapping` is set.
#[derive(Debug, Clone, PartialEq)]
pub struct Anno {
    description: String,
    name: Option<String>,
    typ: TypeTag,
    default: AnnoDefault,
    is_array: bool,
    is_mapping: bool,
}

impl Anno {
    /// New descriptor accepting any value, to be typed with [`Anno::set_typ`].
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            name: None,
            typ: TypeTag::Any,
            default: AnnoDefault::NoDefault,
            is_array: false,
            is_mapping: false,
        }
    }

    /// Descriptor for an `Any` annotation, carrying the marker's own name.
    pub fn any(description: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(description).with_name(name)
    }

    /// Descriptor for an instance of a declared class.
    pub fn instance(key: ClassKey) -> Self {
        Self {
            description: "Class instance".into(),
            name: Some("Instance".into()),
            typ: TypeTag::Class(key),
            default: AnnoDefault::NoDefault,
            is_array: false,
            is_mapping: false,
        }
    }

    /// Descriptor for a sequence of instances of a declared class.
    pub fn instances(key: ClassKey) -> Self {
        Self {
            description: "Class instances".into(),
            name: Some("Instances".into()),
            typ: TypeTag::Class(key),
            default: AnnoDefault::NoDefault,
            is_array: true,
            is_mapping: false,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the declared type, recognising sequence and mapping forms.
    ///
    /// Union origins are rejected: a descriptor must resolve to exactly one
    /// concrete type, sequence-of-type or mapping-of-types.
    pub fn set_typ(mut self, typ: TypeTag) -> Result<Self> {
        match typ {
            TypeTag::Union(_) => {
                return Err(CallTypesError::BadOrigin {
                    origin: typ.origin().unwrap_or("typing.Union").to_string(),
                })
            }
            TypeTag::Array(element) => {
                self.typ = *element;
                self.is_array = true;
                self.is_mapping = false;
            }
            TypeTag::Mapping(..) => {
                self.typ = typ;
                self.is_array = false;
                self.is_mapping = true;
            }
            other => {
                self.typ = other;
                self.is_array = false;
                self.is_mapping = false;
            }
        }
        Ok(self)
    }

    /// Copy of this descriptor carrying `default`.
    ///
    /// Concrete defaults are validated through the descriptor so they are
    /// stored in canonical form; a `None` default is kept as is.
    pub fn with_default(&self, default: AnnoDefault) -> Result<Self> {
        let default = match default {
            AnnoDefault::Value(Value::None) | AnnoDefault::NoDefault => default,
            AnnoDefault::Value(value) => AnnoDefault::Value(self.call(value)?),
        };
        Ok(Self {
            default,
            ..self.clone()
        })
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn typ(&self) -> &TypeTag {
        &self.typ
    }

    pub fn default(&self) -> &AnnoDefault {
        &self.default
    }

    pub fn is_array(&self) -> bool {
        self.is_array
    }

    pub fn is_mapping(&self) -> bool {
        self.is_mapping
    }

    /// `(key, value)` types of a mapping descriptor.
    pub fn key_value_types(&self) -> Option<(&TypeTag, &TypeTag)> {
        match &self.typ {
            TypeTag::Mapping(k, v) if self.is_mapping => Some((&**k, &**v)),
            _ => None,
        }
    }

    /// The full type this descriptor validates against, re-wrapping sequences.
    pub fn full_type(&self) -> TypeTag {
        if self.is_array {
            TypeTag::array_of(self.typ.clone())
        } else {
            self.typ.clone()
        }
    }

    /// Validate and coerce `value`, returning the canonical value.
    pub fn call(&self, value: Value) -> Result<Value> {
        if self.is_array {
            let raw = match value {
                Value::None => None,
                other => Some(other),
            };
            typed_construct(self.typ.clone(), raw).map(Value::Array)
        } else {
            self.typ.coerce(value)
        }
    }
}

impl fmt::Display for Anno {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self
            .name
            .as_deref()
            .map(|n| format!("'{}'", n))
            .unwrap_or_else(|| "None".to_string());
        write!(
            f,
            "Anno(name={}, typ={}, description={})",
            name,
            self.full_type(),
            Value::Str(self.description.clone()).repr()
        )
    }
}
