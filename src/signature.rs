//! Explicit registration records for functions and constructors.
//!
//! A [`Callable`] carries what reflection over a live function would
//! otherwise provide: the formal argument names, trailing positional
//! defaults, catch-all names, live annotations and the declaration source
//! that type comments are scanned from.
//!
//! ```rust
//! use calltypes::namespace::Namespace;
//! use calltypes::signature::Callable;
//! use calltypes::types::TypeTag;
//! use calltypes::value::Value;
//!
//! let f = Callable::builder("write")
//!     .arg("exposure")
//!     .arg_with_default("path", Value::from("/tmp/file.txt"))
//!     .annotate("exposure", TypeTag::Float)
//!     .build()
//!     .unwrap();
//! assert_eq!(f.args(), ["exposure", "path"]);
//!
//! let g = Callable::from_source("def g(a, b=1):\n    pass\n", &Namespace::with_builtins()).unwrap();
//! assert_eq!(g.defaults(), [Value::Int(1)]);
//! ```

use indexmap::IndexMap;

use crate::anno::AnnoDefault;
use crate::errors::{CallTypesError, Result};
use crate::namespace::{Namespace, Symbol};
use crate::value::Value;

/// Key under which the return annotation is stored.
pub const RETURN_KEY: &str = "return";

/// Name of the implicit receiver parameter.
pub const SELF_PARAM: &str = "self";

/// Signature of a function or constructor.
#[derive(Debug, Clone, PartialEq)]
pub struct Callable {
    name: String,
    takes_self: bool,
    args: Vec<String>,
    defaults: Vec<Value>,
    varargs: Option<String>,
    keyword_only: Vec<String>,
    keyword_only_defaults: IndexMap<String, Value>,
    kwargs: Option<String>,
    annotations: IndexMap<String, Symbol>,
    source: Option<String>,
}

impl Callable {
    pub fn builder(name: impl Into<String>) -> CallableBuilder {
        CallableBuilder {
            name: name.into(),
            takes_self: false,
            params: Vec::new(),
            after_separator: false,
            varargs: None,
            kwargs: None,
            annotations: IndexMap::new(),
            source: None,
        }
    }

    /// Parse the first `def` in `source`.
    ///
    /// Native annotations are evaluated against `ns` and become live
    /// annotations; literal defaults become values. The text of the
    /// definition is kept so type comments can be scanned later.
    pub fn from_source(source: &str, ns: &Namespace) -> Result<Self> {
        crate::source::parse_function(source, ns)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// True if the first parameter is an implicit `self`.
    pub fn takes_self(&self) -> bool {
        self.takes_self
    }

    /// Positional-or-keyword argument names, excluding `self`.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Arguments declared after `*` or `*args`, bound by keyword only.
    pub fn keyword_only(&self) -> &[String] {
        &self.keyword_only
    }

    /// Defaults of the trailing arguments, in order.
    pub fn defaults(&self) -> &[Value] {
        &self.defaults
    }

    pub fn varargs(&self) -> Option<&str> {
        self.varargs.as_deref()
    }

    pub fn kwargs(&self) -> Option<&str> {
        self.kwargs.as_deref()
    }

    /// Live annotations, including the `"return"` entry if declared.
    pub fn annotations(&self) -> &IndexMap<String, Symbol> {
        &self.annotations
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// Argument names interleaved with the catch-all names, the order type
    /// comments list their types in.
    pub fn annotated_names(&self) -> Vec<String> {
        self.args
            .iter()
            .chain(self.varargs.iter())
            .chain(self.keyword_only.iter())
            .chain(self.kwargs.iter())
            .cloned()
            .collect()
    }

    /// Default for argument `name`. Positional defaults map to the trailing
    /// arguments; keyword-only defaults are looked up by name.
    pub fn default_for(&self, name: &str) -> AnnoDefault {
        let first_default = self.args.len() - self.defaults.len();
        self.args
            .iter()
            .position(|arg| arg == name)
            .filter(|index| *index >= first_default)
            .and_then(|index| self.defaults.get(index - first_default))
            .or_else(|| self.keyword_only_defaults.get(name))
            .map(|value| AnnoDefault::Value(value.clone()))
            .unwrap_or(AnnoDefault::NoDefault)
    }

    /// Each argument paired with its default, positional ones first.
    pub fn arg_spec(&self) -> impl Iterator<Item = (&str, AnnoDefault)> + '_ {
        self.args
            .iter()
            .chain(self.keyword_only.iter())
            .map(move |arg| (arg.as_str(), self.default_for(arg)))
    }
}

#[derive(Debug, Clone)]
struct Param {
    name: String,
    default: Option<Value>,
    keyword_only: bool,
}

/// Builder for [`Callable`].
#[derive(Debug, Clone)]
pub struct CallableBuilder {
    name: String,
    takes_self: bool,
    params: Vec<Param>,
    after_separator: bool,
    varargs: Option<String>,
    kwargs: Option<String>,
    annotations: IndexMap<String, Symbol>,
    source: Option<String>,
}

impl CallableBuilder {
    /// Declare an implicit `self` receiver.
    pub fn method(mut self) -> Self {
        self.takes_self = true;
        self
    }

    pub fn arg(self, name: impl Into<String>) -> Self {
        self.push_param(name.into(), None)
    }

    pub fn arg_with_default(self, name: impl Into<String>, default: impl Into<Value>) -> Self {
        self.push_param(name.into(), Some(default.into()))
    }

    /// Bare `*`: arguments added afterwards are keyword-only.
    pub fn keyword_separator(mut self) -> Self {
        self.after_separator = true;
        self
    }

    /// Catch-all positional parameter. Like `*`, it makes later arguments
    /// keyword-only.
    pub fn varargs(mut self, name: impl Into<String>) -> Self {
        self.varargs = Some(name.into());
        self.after_separator = true;
        self
    }

    pub fn kwargs(mut self, name: impl Into<String>) -> Self {
        self.kwargs = Some(name.into());
        self
    }

    pub fn annotate(mut self, name: impl Into<String>, symbol: impl Into<Symbol>) -> Self {
        self.annotations.insert(name.into(), symbol.into());
        self
    }

    pub fn returns(self, symbol: impl Into<Symbol>) -> Self {
        self.annotate(RETURN_KEY, symbol)
    }

    /// Source text to scan for type comments.
    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    fn push_param(mut self, name: String, default: Option<Value>) -> Self {
        self.params.push(Param {
            name,
            default,
            keyword_only: self.after_separator,
        });
        self
    }

    pub fn build(self) -> Result<Callable> {
        let mut args = Vec::with_capacity(self.params.len());
        let mut defaults = Vec::new();
        let mut keyword_only = Vec::new();
        let mut keyword_only_defaults = IndexMap::new();
        for (index, param) in self.params.into_iter().enumerate() {
            let Param {
                name,
                default,
                keyword_only: is_keyword_only,
            } = param;
            if index == 0 && self.takes_self && name == SELF_PARAM && !is_keyword_only {
                continue;
            }
            if args.contains(&name)
                || keyword_only.contains(&name)
                || self.varargs.as_ref() == Some(&name)
                || self.kwargs.as_ref() == Some(&name)
            {
                return Err(CallTypesError::source_parse(format!(
                    "duplicate argument '{}' in function definition",
                    name
                )));
            }
            if is_keyword_only {
                if let Some(value) = default {
                    keyword_only_defaults.insert(name.clone(), value);
                }
                keyword_only.push(name);
                continue;
            }
            match default {
                Some(value) => defaults.push(value),
                None if !defaults.is_empty() => {
                    return Err(CallTypesError::source_parse(format!(
                        "non-default argument '{}' follows default argument",
                        name
                    )))
                }
                None => {}
            }
            args.push(name);
        }

        Ok(Callable {
            name: self.name,
            takes_self: self.takes_self,
            args,
            defaults,
            varargs: self.varargs,
            keyword_only,
            keyword_only_defaults,
            kwargs: self.kwargs,
            annotations: self.annotations,
            source: self.source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TypeTag;

    #[test]
    fn test_trailing_defaults_map_by_position() {
        let f = Callable::builder("f")
            .arg("a")
            .arg_with_default("b", 1i64)
            .arg_with_default("c", Value::None)
            .build()
            .unwrap();
        assert_eq!(f.default_for("a"), AnnoDefault::NoDefault);
        assert_eq!(f.default_for("b"), AnnoDefault::Value(Value::Int(1)));
        assert_eq!(f.default_for("c"), AnnoDefault::Value(Value::None));
        assert_eq!(f.default_for("missing"), AnnoDefault::NoDefault);
    }

    #[test]
    fn test_non_default_after_default_rejected() {
        let err = Callable::builder("f")
            .arg_with_default("a", 1i64)
            .arg("b")
            .build()
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Source parse error: non-default argument 'b' follows default argument"
        );
    }

    #[test]
    fn test_self_is_implicit() {
        let f = Callable::builder("__init__")
            .method()
            .arg("self")
            .arg("name")
            .build()
            .unwrap();
        assert!(f.takes_self());
        assert_eq!(f.args(), ["name"]);
    }

    #[test]
    fn test_self_only_implicit_in_first_position() {
        let f = Callable::builder("__init__")
            .method()
            .arg("name")
            .arg("self")
            .build()
            .unwrap();
        assert_eq!(f.args(), ["name", "self"]);

        let f = Callable::builder("f").arg("self").build().unwrap();
        assert!(!f.takes_self());
        assert_eq!(f.args(), ["self"]);
    }

    #[test]
    fn test_keyword_only_skips_default_ordering() {
        let f = Callable::builder("f")
            .arg_with_default("a", "x")
            .keyword_separator()
            .arg("b")
            .arg_with_default("c", 1i64)
            .build()
            .unwrap();
        assert_eq!(f.args(), ["a"]);
        assert_eq!(f.keyword_only(), ["b", "c"]);
        assert_eq!(f.default_for("b"), AnnoDefault::NoDefault);
        assert_eq!(f.default_for("c"), AnnoDefault::Value(Value::Int(1)));
        assert_eq!(
            f.arg_spec().map(|(name, _)| name).collect::<Vec<_>>(),
            ["a", "b", "c"]
        );
    }

    #[test]
    fn test_annotated_names_include_catch_alls() {
        let f = Callable::builder("f")
            .arg("v")
            .varargs("args")
            .kwargs("kwargs")
            .returns(Symbol::None)
            .annotate("v", TypeTag::Str)
            .build()
            .unwrap();
        assert_eq!(f.annotated_names(), ["v", "args", "kwargs"]);
        assert!(f.keyword_only().is_empty());
        assert_eq!(f.annotations().get(RETURN_KEY), Some(&Symbol::None));
    }

    #[test]
    fn test_duplicate_argument_rejected() {
        assert!(Callable::builder("f").arg("a").arg("a").build().is_err());
        assert!(Callable::builder("f")
            .arg("a")
            .keyword_separator()
            .arg("a")
            .build()
            .is_err());
    }
}
