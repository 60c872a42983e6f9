//! Error types for descriptor declaration, signature derivation and value validation.
//!
//! Errors fall into the categories below. Declaration-time errors are raised
//! while a type alias, class or function is being registered and are meant to
//! be fixed by the engineer. Validation errors are raised when a value is
//! passed through a descriptor or container and can be handled by the caller,
//! for example to re-prompt for corrected input.
//!
//! # Categories
//!
//! - `Declaration`: malformed origins, unresolvable type comments, missing
//!   return markers
//! - `Assertion`: internal contract checks such as argument/type count
//!   mismatches or a resolved type that is not a descriptor
//! - `Lookup`: a parameter with no resolvable annotation
//! - `Validation`: a supplied value does not match a declared type
//! - `Environment`: source parsing and configuration failures
//!
//! # Example
//!
//! ```rust
//! use calltypes::errors::{CallTypesError, ErrorCategory};
//!
//! let err = CallTypesError::type_mismatch("float", "str", "'abc'");
//! assert_eq!(err.category(), ErrorCategory::Validation);
//! assert!(err.is_recoverable());
//! assert_eq!(err.python_class(), "TypeError");
//! ```

use thiserror::Error;

/// Error raised by the calltypes engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CallTypesError {
    /// A declaration resolved to a generic origin that cannot be described.
    #[error("Cannot annotate a type with origin {origin}")]
    BadOrigin { origin: String },

    /// A scoped declaration block finished without binding a name.
    #[error("No type was assigned inside the declaration block for {description:?}")]
    EmptyDeclaration { description: String },

    /// A scoped declaration block bound more than one name.
    #[error("Expected exactly one assignment inside the declaration block, got {names:?}")]
    MultipleDeclaration { names: Vec<String> },

    /// A descriptor was declared with an empty description.
    #[error("Description for '{name}' must not be empty")]
    EmptyDescription { name: String },

    /// A type expression could not be evaluated against the namespace.
    #[error("Error evaluating '{expr}': {reason}")]
    Evaluation { expr: String, reason: String },

    /// Type comments ran out before one carried a `->` return marker.
    #[error("Got to the end of the function without seeing ->")]
    MissingReturnMarker,

    /// The number of type comment arguments does not match the parameters.
    #[error("Args {args:?} Types {types:?} length mismatch")]
    ArgumentCountMismatch {
        args: Vec<String>,
        types: Vec<String>,
    },

    /// A parameter resolved to something that is not a descriptor.
    #[error("Argument '{param}' has type {found} which is not an Anno")]
    NotAnAnno { param: String, found: String },

    /// The return annotation resolved to something that is not a descriptor.
    #[error("Return has type {found} which is not an Anno")]
    ReturnNotAnAnno { found: String },

    /// A formal parameter has no annotation at all.
    #[error("No annotation for argument '{param}' of '{callable}'")]
    MissingAnnotation { param: String, callable: String },

    /// A value does not match the declared type.
    #[error("Expected {expected}, got {actual} {value}")]
    TypeMismatch {
        expected: String,
        actual: String,
        value: String,
    },

    /// An existing container was passed where a different element type is declared.
    #[error("Expected Array[{expected}], got Array[{actual}]")]
    ArrayElementMismatch { expected: String, actual: String },

    /// A numeric array has a storage type other than the declared element type.
    #[error("Expected numeric array of {expected}, got dtype {dtype}")]
    DtypeMismatch { expected: String, dtype: String },

    /// A value cannot be turned into a typed sequence container.
    #[error("Cannot make Array[{expected}] from {actual}")]
    UnconvertibleArray { expected: String, actual: String },

    /// A container was requested without an element type.
    #[error("Array must be given an element type, e.g. Array[int]")]
    UnboundArray,

    /// A class asked to store a field its constructor does not declare.
    #[error("Stored field '{name}' of '{class}' is not a constructor argument")]
    UnknownStoredField { name: String, class: String },

    /// A call left a parameter without value or default.
    #[error("Missing required argument '{name}'")]
    MissingArgument { name: String },

    /// A call named a parameter that is not declared.
    #[error("Unexpected argument '{name}'")]
    UnexpectedArgument { name: String },

    /// A call passed more positional values than declared parameters.
    #[error("Takes {expected} positional arguments but {got} were given")]
    TooManyArguments { expected: usize, got: usize },

    /// A call supplied the same parameter positionally and by keyword.
    #[error("Got multiple values for argument '{name}'")]
    DuplicateArgument { name: String },

    /// A mapping value ended up with the same key twice after coercion.
    #[error("Duplicate key {key} in mapping")]
    DuplicateKey { key: String },

    /// Declaration source text could not be parsed.
    #[error("Source parse error: {message}")]
    SourceParse { message: String },

    /// Configuration could not be parsed.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// An exported summary could not be serialized.
    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

/// Coarse classification of a [`CallTypesError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Declaration,
    Assertion,
    Lookup,
    Validation,
    Environment,
}

impl CallTypesError {
    /// Create an evaluation error for `expr`.
    pub fn evaluation(expr: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Evaluation {
            expr: expr.into(),
            reason: reason.into(),
        }
    }

    /// Create a type mismatch error from the expected type, actual type and value repr.
    pub fn type_mismatch(
        expected: impl Into<String>,
        actual: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::TypeMismatch {
            expected: expected.into(),
            actual: actual.into(),
            value: value.into(),
        }
    }

    /// Create a source parse error.
    pub fn source_parse(message: impl Into<String>) -> Self {
        Self::SourceParse {
            message: message.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Get the error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::BadOrigin { .. }
            | Self::EmptyDeclaration { .. }
            | Self::MultipleDeclaration { .. }
            | Self::EmptyDescription { .. }
            | Self::Evaluation { .. }
            | Self::MissingReturnMarker
            | Self::UnknownStoredField { .. } => ErrorCategory::Declaration,
            Self::ArgumentCountMismatch { .. }
            | Self::NotAnAnno { .. }
            | Self::ReturnNotAnAnno { .. }
            | Self::ArrayElementMismatch { .. }
            | Self::DtypeMismatch { .. }
            | Self::UnconvertibleArray { .. }
            | Self::UnboundArray => ErrorCategory::Assertion,
            Self::MissingAnnotation { .. } => ErrorCategory::Lookup,
            Self::TypeMismatch { .. }
            | Self::MissingArgument { .. }
            | Self::UnexpectedArgument { .. }
            | Self::TooManyArguments { .. }
            | Self::DuplicateArgument { .. }
            | Self::DuplicateKey { .. } => ErrorCategory::Validation,
            Self::SourceParse { .. } | Self::Config { .. } | Self::Serialization { .. } => {
                ErrorCategory::Environment
            }
        }
    }

    /// Name of the equivalent Python exception class.
    ///
    /// Consumers that mirror the Python exception conventions match on this.
    pub fn python_class(&self) -> &'static str {
        match self {
            Self::BadOrigin { .. }
            | Self::EmptyDeclaration { .. }
            | Self::MultipleDeclaration { .. }
            | Self::EmptyDescription { .. }
            | Self::Evaluation { .. }
            | Self::MissingReturnMarker
            | Self::UnknownStoredField { .. }
            | Self::SourceParse { .. }
            | Self::Config { .. }
            | Self::Serialization { .. } => "ValueError",
            Self::ArgumentCountMismatch { .. }
            | Self::NotAnAnno { .. }
            | Self::ReturnNotAnAnno { .. }
            | Self::ArrayElementMismatch { .. }
            | Self::DtypeMismatch { .. }
            | Self::UnconvertibleArray { .. }
            | Self::UnboundArray => "AssertionError",
            Self::MissingAnnotation { .. } => "KeyError",
            Self::TypeMismatch { .. }
            | Self::MissingArgument { .. }
            | Self::UnexpectedArgument { .. }
            | Self::TooManyArguments { .. }
            | Self::DuplicateArgument { .. }
            | Self::DuplicateKey { .. } => "TypeError",
        }
    }

    /// True if the error can only happen while registering a declaration.
    pub fn is_declaration_time(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Declaration | ErrorCategory::Lookup
        ) || matches!(
            self,
            Self::ArgumentCountMismatch { .. }
                | Self::NotAnAnno { .. }
                | Self::ReturnNotAnAnno { .. }
        )
    }

    /// True if the caller can recover by supplying a different value.
    ///
    /// Container construction failures count as recoverable: they are
    /// reported at call time against caller-supplied data.
    pub fn is_recoverable(&self) -> bool {
        match self.category() {
            ErrorCategory::Validation => true,
            ErrorCategory::Assertion => !self.is_declaration_time(),
            _ => false,
        }
    }
}

/// Result type alias for calltypes operations.
pub type Result<T> = std::result::Result<T, CallTypesError>;
