//! Runtime type descriptors and call signatures.
//!
//! An [`Anno`] describes one parameter: a human description, a declared
//! type, an optional default and a display name. From a function or
//! constructor signature, annotated either natively or with Python style
//! `# type:` comments, the engine derives an ordered map of those
//! descriptors ([`CallTypes`]) plus a return descriptor. Classes declared
//! through [`ClassSpec`] get a representation built from their call types.
//!
//! ```rust
//! use calltypes::{make_call_types, Callable, Namespace, TypeTag};
//!
//! let mut ns = Namespace::with_builtins();
//! ns.declare("The exposure to be active for", |block| {
//!     block.assign("AExposure", TypeTag::Float);
//!     Ok(())
//! })
//! .unwrap();
//!
//! let f = Callable::from_source(
//!     "def write(exposure):\n    # type: (AExposure) -> None\n    pass\n",
//!     &ns,
//! )
//! .unwrap();
//! let (call_types, return_type) = make_call_types(&f, &ns).unwrap();
//! assert_eq!(call_types["exposure"].typ(), &TypeTag::Float);
//! assert!(return_type.is_none());
//! ```

pub mod anno;
pub mod array;
pub mod calltypes;
pub mod class;
pub mod config;
pub mod errors;
pub mod export;
pub mod namespace;
pub mod signature;
pub mod source;
pub mod types;
pub mod value;

// Re-export commonly used types
pub use crate::anno::{Anno, AnnoDefault};

pub use crate::array::{to_array, typed_construct, Array};

pub use crate::calltypes::{
    add_call_types, anno_with_default, bind_arguments, make_annotations, make_call_types,
    AnnotatedFunction, BoundArguments, CallTypes,
};

pub use crate::class::{make_repr, ClassBuilder, ClassSpec, Instance, WithCallTypes};

pub use crate::errors::{CallTypesError, ErrorCategory, Result};

pub use crate::export::{describe_call_types, ParameterSummary, SignatureSummary};

pub use crate::namespace::{DeclarationBlock, GenericOrigin, Namespace, Symbol};

pub use crate::signature::{Callable, CallableBuilder};

pub use crate::source::comment_annotations;

pub use crate::types::{ClassKey, Dtype, EnumType, EnumValue, NumericArray, TypeTag};

pub use crate::value::Value;
