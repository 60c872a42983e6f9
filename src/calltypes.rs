//! Signature derivation: from a [`Callable`] to its ordered parameter
//! descriptors and return descriptor.

use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{debug, debug_span, trace};

use crate::anno::{Anno, AnnoDefault};
use crate::errors::{CallTypesError, Result};
use crate::namespace::{Namespace, Symbol};
use crate::signature::{Callable, RETURN_KEY};
use crate::source::scan_type_comments;
use crate::types::TypeTag;
use crate::value::Value;

/// Ordered parameter name to descriptor mapping.
pub type CallTypes = IndexMap<String, Arc<Anno>>;

/// Validated arguments of a call, in declaration order.
pub type BoundArguments = IndexMap<String, Value>;

/// Raw annotations of `callable` recovered from its `# type:` comments.
///
/// Each argument expression is evaluated against `ns`; tuples contribute one
/// type per element. The first comment carrying `->` ends the scan. A
/// callable without type comments has no annotations.
pub fn make_annotations(callable: &Callable, ns: &Namespace) -> Result<IndexMap<String, Symbol>> {
    let Some(source) = callable.source() else {
        return Ok(IndexMap::new());
    };
    let comments = scan_type_comments(source)?;
    if comments.is_empty() {
        return Ok(IndexMap::new());
    }

    let mut types: Vec<Symbol> = Vec::new();
    for comment in comments {
        if !comment.is_continuation() {
            match ns.evaluate(&comment.args_without_splats())? {
                Symbol::Tuple(items) => types.extend(items),
                single => types.push(single),
            }
        }
        if let Some(returns) = &comment.returns {
            let returns = ns.evaluate(returns)?;
            let names = callable.annotated_names();
            if names.len() != types.len() {
                return Err(CallTypesError::ArgumentCountMismatch {
                    args: names,
                    types: types.iter().map(ToString::to_string).collect(),
                });
            }
            trace!(
                callable = %callable.name(),
                line = comment.line,
                "Found return marker"
            );
            let mut annotations: IndexMap<String, Symbol> = names.into_iter().zip(types).collect();
            annotations.insert(RETURN_KEY.to_string(), returns);
            return Ok(annotations);
        }
    }
    Err(CallTypesError::MissingReturnMarker)
}

/// Turn a raw annotation into a parameter descriptor carrying `default`.
///
/// Returns `None` if the symbol does not describe a parameter, e.g. a bare
/// primitive type that was never declared as a descriptor.
pub fn anno_with_default(symbol: &Symbol, default: AnnoDefault) -> Result<Option<Arc<Anno>>> {
    let base = match symbol {
        Symbol::Anno(anno) if default.is_required() => return Ok(Some(anno.clone())),
        Symbol::Anno(anno) => return Ok(Some(Arc::new(anno.with_default(default)?))),
        Symbol::Type(TypeTag::Any) => Anno::any("Any value", "Any"),
        Symbol::Type(TypeTag::Class(key)) => Anno::instance(key.clone()),
        Symbol::Type(TypeTag::Array(element)) => match element.as_ref() {
            TypeTag::Class(key) => Anno::instances(key.clone()),
            _ => return Ok(None),
        },
        _ => return Ok(None),
    };
    Ok(Some(Arc::new(base.with_default(default)?)))
}

/// Derive the parameter descriptors and return descriptor of `callable`.
///
/// Live annotations are used if present; otherwise they are recovered from
/// type comments. Every argument must resolve to a descriptor.
pub fn make_call_types(
    callable: &Callable,
    ns: &Namespace,
) -> Result<(CallTypes, Option<Arc<Anno>>)> {
    let _span = debug_span!("make_call_types", callable = %callable.name()).entered();

    let recovered;
    let annotations = if callable.annotations().is_empty() {
        recovered = make_annotations(callable, ns)?;
        &recovered
    } else {
        callable.annotations()
    };

    let mut call_types = CallTypes::with_capacity(callable.args().len());
    for (arg, default) in callable.arg_spec() {
        let symbol = annotations
            .get(arg)
            .ok_or_else(|| CallTypesError::MissingAnnotation {
                param: arg.to_string(),
                callable: callable.name().to_string(),
            })?;
        let anno = anno_with_default(symbol, default)?.ok_or_else(|| CallTypesError::NotAnAnno {
            param: arg.to_string(),
            found: symbol.to_string(),
        })?;
        call_types.insert(arg.to_string(), anno);
    }

    let return_type = match annotations.get(RETURN_KEY) {
        None | Some(Symbol::None) => None,
        Some(Symbol::Type(TypeTag::Any)) => Some(Arc::new(Anno::any("Any return value", "return"))),
        Some(symbol) => Some(anno_with_default(symbol, AnnoDefault::NoDefault)?.ok_or_else(
            || CallTypesError::ReturnNotAnAnno {
                found: symbol.to_string(),
            },
        )?),
    };

    debug!(
        params = call_types.len(),
        has_return = return_type.is_some(),
        "Derived call types"
    );
    Ok((call_types, return_type))
}

/// Validate a call against `call_types`.
///
/// Positional values bind in declaration order to the first
/// `positional_limit` parameters; the rest are keyword-only. Keyword values
/// bind by name. Each value passes through its descriptor; omitted
/// parameters take their default.
pub fn bind_arguments(
    call_types: &CallTypes,
    positional_limit: usize,
    positional: Vec<Value>,
    keyword: &[(&str, Value)],
) -> Result<BoundArguments> {
    let positional_limit = positional_limit.min(call_types.len());
    if positional.len() > positional_limit {
        return Err(CallTypesError::TooManyArguments {
            expected: positional_limit,
            got: positional.len(),
        });
    }

    let mut supplied: IndexMap<&str, Value> = call_types
        .keys()
        .map(String::as_str)
        .zip(positional)
        .collect();
    for (name, value) in keyword {
        let Some((declared, _)) = call_types.get_key_value(*name) else {
            return Err(CallTypesError::UnexpectedArgument {
                name: name.to_string(),
            });
        };
        if supplied.insert(declared.as_str(), value.clone()).is_some() {
            return Err(CallTypesError::DuplicateArgument {
                name: name.to_string(),
            });
        }
    }

    let mut bound = BoundArguments::with_capacity(call_types.len());
    for (name, anno) in call_types {
        let value = match (supplied.swap_remove(name.as_str()), anno.default()) {
            (Some(Value::None), AnnoDefault::Value(Value::None)) => Value::None,
            (Some(value), _) => anno.call(value)?,
            (None, AnnoDefault::Value(default)) => default.clone(),
            (None, AnnoDefault::NoDefault) => {
                return Err(CallTypesError::MissingArgument { name: name.clone() })
            }
        };
        bound.insert(name.clone(), value);
    }
    Ok(bound)
}

/// Add call types to a function.
pub fn add_call_types(callable: Callable, ns: &Namespace) -> Result<AnnotatedFunction> {
    let (call_types, return_type) = make_call_types(&callable, ns)?;
    Ok(AnnotatedFunction {
        callable,
        call_types: Arc::new(call_types),
        return_type,
    })
}

/// A function together with its derived descriptors.
#[derive(Debug, Clone)]
pub struct AnnotatedFunction {
    callable: Callable,
    call_types: Arc<CallTypes>,
    return_type: Option<Arc<Anno>>,
}

impl AnnotatedFunction {
    pub fn callable(&self) -> &Callable {
        &self.callable
    }

    pub fn name(&self) -> &str {
        self.callable.name()
    }

    pub fn call_types(&self) -> &CallTypes {
        &self.call_types
    }

    pub fn return_type(&self) -> Option<&Arc<Anno>> {
        self.return_type.as_ref()
    }

    /// Validate call arguments, see [`bind_arguments`].
    pub fn bind(&self, positional: Vec<Value>, keyword: &[(&str, Value)]) -> Result<BoundArguments> {
        bind_arguments(
            &self.call_types,
            self.callable.args().len(),
            positional,
            keyword,
        )
    }

    /// Validate a value returned by the function. `None` is always accepted.
    pub fn validate_return(&self, value: Value) -> Result<Value> {
        match (&self.return_type, value) {
            (_, Value::None) => Ok(Value::None),
            (Some(anno), value) => anno.call(value),
            (None, value) => Ok(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ClassKey;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    fn namespace() -> Namespace {
        let mut ns = Namespace::with_builtins();
        ns.declare("Good origin", |block| {
            block.assign("Good", TypeTag::Str);
            Ok(())
        })
        .unwrap();
        ns.declare("The size", |block| {
            block.assign("Size", TypeTag::Int);
            Ok(())
        })
        .unwrap();
        ns
    }

    #[test]
    fn test_any_return() {
        let ns = namespace();
        let f = Callable::from_source(
            indoc! {"
                def any_func(**kwargs):
                    # type: (**Any) -> Any
                    return kwargs
            "},
            &ns,
        )
        .unwrap();
        let (call_types, return_type) = make_call_types(&f, &ns).unwrap();
        assert!(call_types.is_empty());
        let return_type = return_type.unwrap();
        assert_eq!(return_type.typ(), &TypeTag::Any);
        assert_eq!(return_type.description(), "Any return value");
    }

    #[test]
    fn test_kwargs_not_in_call_types() {
        let ns = namespace();
        let f = Callable::from_source(
            indoc! {"
                def f(v, *args, **kwargs):
                    # type: (Good, *Any, **Any) -> None
                    pass
            "},
            &ns,
        )
        .unwrap();
        let (call_types, return_type) = make_call_types(&f, &ns).unwrap();
        assert_eq!(call_types.keys().collect::<Vec<_>>(), ["v"]);
        assert!(return_type.is_none());
    }

    #[test]
    fn test_count_mismatch() {
        let ns = namespace();
        let f = Callable::builder("f")
            .arg("a")
            .arg("b")
            .source("def f(a, b):\n    # type: (Good) -> None\n    pass\n")
            .build()
            .unwrap();
        let err = make_call_types(&f, &ns).unwrap_err();
        assert!(matches!(err, CallTypesError::ArgumentCountMismatch { .. }));
        assert!(err.to_string().starts_with("Args [\"a\", \"b\"] Types"));
    }

    #[test]
    fn test_continuation_comments() {
        let ns = namespace();
        let f = Callable::from_source(
            indoc! {"
                def f(a,  # type: Good
                      b,  # type: Size
                      ):
                    # type: (...) -> None
                    pass
            "},
            &ns,
        )
        .unwrap();
        let (call_types, _) = make_call_types(&f, &ns).unwrap();
        assert_eq!(call_types["a"].typ(), &TypeTag::Str);
        assert_eq!(call_types["b"].typ(), &TypeTag::Int);
    }

    #[test]
    fn test_bare_type_is_not_an_anno() {
        let ns = namespace();
        let f = Callable::from_source("def f(a: str):\n    pass\n", &ns).unwrap();
        assert_eq!(
            make_call_types(&f, &ns).unwrap_err().to_string(),
            "Argument 'a' has type <type str> which is not an Anno"
        );
    }

    #[test]
    fn test_missing_annotation() {
        let ns = namespace();
        let f = Callable::from_source("def f(a: Good, b):\n    pass\n", &ns).unwrap();
        let err = make_call_types(&f, &ns).unwrap_err();
        assert_eq!(err.python_class(), "KeyError");
    }

    #[test]
    fn test_defaults_attached_without_touching_alias() {
        let ns = namespace();
        let f = Callable::from_source("def f(a: Good = 'x', b: Good = None):\n    pass\n", &ns)
            .unwrap();
        let (call_types, _) = make_call_types(&f, &ns).unwrap();
        assert_eq!(call_types["a"].default(), &AnnoDefault::Value(Value::from("x")));
        assert_eq!(call_types["b"].default(), &AnnoDefault::Value(Value::None));
        assert!(ns.anno("Good").unwrap().default().is_required());
    }

    #[test]
    fn test_class_annotation_becomes_instance_descriptor() {
        let key = ClassKey::new("Simple", None);
        let symbol = Symbol::Type(TypeTag::array_of(TypeTag::Class(key.clone())));
        let anno = anno_with_default(&symbol, AnnoDefault::NoDefault)
            .unwrap()
            .unwrap();
        assert!(anno.is_array());
        assert_eq!(anno.typ(), &TypeTag::Class(key));
    }

    #[test]
    fn test_bind_arguments() {
        let ns = namespace();
        let f = add_call_types(
            Callable::from_source("def f(name: Good, size: Size = 3):\n    pass\n", &ns).unwrap(),
            &ns,
        )
        .unwrap();

        let bound = f.bind(vec![Value::Int(32)], &[]).unwrap();
        assert_eq!(bound["name"], Value::from("32"));
        assert_eq!(bound["size"], Value::Int(3));

        let bound = f.bind(vec![], &[("size", Value::Int(4)), ("name", Value::from("x"))]).unwrap();
        assert_eq!(bound.keys().collect::<Vec<_>>(), ["name", "size"]);

        assert!(matches!(
            f.bind(vec![], &[]),
            Err(CallTypesError::MissingArgument { .. })
        ));
        assert!(matches!(
            f.bind(vec![Value::from("a")], &[("name", Value::from("b"))]),
            Err(CallTypesError::DuplicateArgument { .. })
        ));
        assert!(matches!(
            f.bind(vec![], &[("other", Value::None)]),
            Err(CallTypesError::UnexpectedArgument { .. })
        ));
        assert!(matches!(
            f.bind(vec![Value::from("a"), Value::Int(1), Value::Int(2)], &[]),
            Err(CallTypesError::TooManyArguments { expected: 2, got: 3 })
        ));
    }

    #[test]
    fn test_keyword_only_not_bound_by_position() {
        let ns = namespace();
        let f = add_call_types(
            Callable::from_source("def f(a: Good = 'x', *, b: Good):\n    pass\n", &ns).unwrap(),
            &ns,
        )
        .unwrap();
        assert_eq!(f.call_types().keys().collect::<Vec<_>>(), ["a", "b"]);
        assert!(f.call_types()["b"].default().is_required());

        let bound = f.bind(vec![], &[("b", Value::from("y"))]).unwrap();
        assert_eq!(bound["a"], Value::from("x"));
        assert_eq!(bound["b"], Value::from("y"));

        assert!(matches!(
            f.bind(vec![Value::from("p"), Value::from("q")], &[]),
            Err(CallTypesError::TooManyArguments { expected: 1, got: 2 })
        ));
        assert!(matches!(
            f.bind(vec![Value::from("p")], &[]),
            Err(CallTypesError::MissingArgument { .. })
        ));
    }

    #[test]
    fn test_keyword_only_type_comments() {
        let ns = namespace();
        let f = Callable::from_source(
            indoc! {"
                def f(a, *args, b=3, **kwargs):
                    # type: (Good, *Any, Size, **Any) -> None
                    pass
            "},
            &ns,
        )
        .unwrap();
        let (call_types, _) = make_call_types(&f, &ns).unwrap();
        assert_eq!(call_types.keys().collect::<Vec<_>>(), ["a", "b"]);
        assert_eq!(call_types["b"].typ(), &TypeTag::Int);
        assert_eq!(call_types["b"].default(), &AnnoDefault::Value(Value::Int(3)));
    }

    #[test]
    fn test_validate_return() {
        let ns = namespace();
        let f = add_call_types(
            Callable::from_source("def f() -> Size:\n    pass\n", &ns).unwrap(),
            &ns,
        )
        .unwrap();
        assert_eq!(f.validate_return(Value::Float(2.0)).unwrap(), Value::Int(2));
        assert_eq!(f.validate_return(Value::None).unwrap(), Value::None);
        assert!(f.validate_return(Value::from("x")).is_err());
    }
}
