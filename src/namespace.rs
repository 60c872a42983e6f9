//! Closed symbol table that type expressions are resolved against.
//!
//! A [`Namespace`] plays the part of a module's globals: it binds names to
//! descriptors, types and generic origins. Type expressions found in
//! annotations and type comments are parsed and looked up here; nothing is
//! ever executed.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::debug;

use crate::anno::Anno;
use crate::errors::{CallTypesError, Result};
use crate::source::evaluate_expr;
use crate::types::{EnumType, TypeTag};

/// Generic origin that becomes a type when subscripted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GenericOrigin {
    Array,
    Sequence,
    List,
    Mapping,
    Dict,
    Union,
    Optional,
}

impl GenericOrigin {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Array => "Array",
            Self::Sequence => "Sequence",
            Self::List => "List",
            Self::Mapping => "Mapping",
            Self::Dict => "Dict",
            Self::Union => "Union",
            Self::Optional => "Optional",
        }
    }

    /// Apply the origin to its type arguments, e.g. `Mapping[str, int]`.
    pub fn subscript(&self, args: Vec<TypeTag>) -> std::result::Result<TypeTag, String> {
        let expect = |count: usize| {
            if args.len() == count {
                Ok(())
            } else {
                Err(format!(
                    "{} takes {} type argument(s), got {}",
                    self.name(),
                    count,
                    args.len()
                ))
            }
        };
        match self {
            Self::Array | Self::Sequence | Self::List => {
                expect(1)?;
                Ok(TypeTag::array_of(args.into_iter().next().unwrap_or(TypeTag::Any)))
            }
            Self::Mapping | Self::Dict => {
                expect(2)?;
                let mut args = args.into_iter();
                let key = args.next().unwrap_or(TypeTag::Any);
                let value = args.next().unwrap_or(TypeTag::Any);
                Ok(TypeTag::mapping_of(key, value))
            }
            Self::Union => {
                if args.is_empty() {
                    return Err("Union requires at least one type argument".into());
                }
                Ok(union_of(args))
            }
            Self::Optional => {
                expect(1)?;
                let mut members = args;
                members.push(TypeTag::NoneType);
                Ok(union_of(members))
            }
        }
    }
}

/// Flatten nested unions and drop repeated members. A union left with a
/// single member is that member.
fn union_of(args: Vec<TypeTag>) -> TypeTag {
    let mut members: Vec<TypeTag> = Vec::with_capacity(args.len());
    for arg in args {
        let nested = match arg {
            TypeTag::Union(inner) => inner,
            other => vec![other],
        };
        for member in nested {
            if !members.contains(&member) {
                members.push(member);
            }
        }
    }
    if members.len() == 1 {
        members.remove(0)
    } else {
        TypeTag::Union(members)
    }
}

/// Result of resolving a name or expression in a [`Namespace`].
#[derive(Debug, Clone, PartialEq)]
pub enum Symbol {
    Anno(Arc<Anno>),
    Type(TypeTag),
    Generic(GenericOrigin),
    Tuple(Vec<Symbol>),
    None,
    Ellipsis,
}

impl Symbol {
    /// The type this symbol stands for when used as a type argument.
    pub fn to_type(&self) -> std::result::Result<TypeTag, String> {
        match self {
            Self::Type(typ) => Ok(typ.clone()),
            Self::Anno(anno) => Ok(anno.full_type()),
            Self::None => Ok(TypeTag::NoneType),
            Self::Generic(origin) => Err(format!("{} must be subscripted", origin.name())),
            Self::Tuple(_) => Err("a tuple is not a type".into()),
            Self::Ellipsis => Err("'...' is not a type".into()),
        }
    }

    pub fn as_anno(&self) -> Option<&Arc<Anno>> {
        match self {
            Self::Anno(anno) => Some(anno),
            _ => None,
        }
    }
}

impl From<TypeTag> for Symbol {
    fn from(typ: TypeTag) -> Self {
        Self::Type(typ)
    }
}

impl From<Arc<Anno>> for Symbol {
    fn from(anno: Arc<Anno>) -> Self {
        Self::Anno(anno)
    }
}

impl From<Anno> for Symbol {
    fn from(anno: Anno) -> Self {
        Self::Anno(Arc::new(anno))
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Anno(anno) => write!(f, "{}", anno),
            Self::Type(typ) => write!(f, "<type {}>", typ),
            Self::Generic(origin) => write!(f, "{}", origin.name()),
            Self::Tuple(items) => {
                let items: Vec<String> = items.iter().map(ToString::to_string).collect();
                write!(f, "({})", items.join(", "))
            }
            Self::None => write!(f, "None"),
            Self::Ellipsis => write!(f, "Ellipsis"),
        }
    }
}

/// Insertion-ordered symbol table.
#[derive(Debug, Clone, Default)]
pub struct Namespace {
    symbols: IndexMap<String, Symbol>,
}

impl Namespace {
    /// Empty namespace with no names bound at all.
    pub fn new() -> Self {
        Self::default()
    }

    /// Namespace with the primitive types and generic origins bound.
    pub fn with_builtins() -> Self {
        let mut ns = Self::new();
        ns.bind("str", TypeTag::Str);
        ns.bind("int", TypeTag::Int);
        ns.bind("float", TypeTag::Float);
        ns.bind("bool", TypeTag::Bool);
        ns.bind("Any", TypeTag::Any);
        ns.bind("None", Symbol::None);
        for origin in [
            GenericOrigin::Array,
            GenericOrigin::Sequence,
            GenericOrigin::List,
            GenericOrigin::Mapping,
            GenericOrigin::Dict,
            GenericOrigin::Union,
            GenericOrigin::Optional,
        ] {
            ns.bind(origin.name(), Symbol::Generic(origin));
        }
        ns
    }

    /// Bind `name`, replacing any previous binding.
    pub fn bind(&mut self, name: impl Into<String>, symbol: impl Into<Symbol>) -> &mut Self {
        self.symbols.insert(name.into(), symbol.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.symbols.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.symbols.keys().map(String::as_str)
    }

    /// Descriptor bound to `name`, if the binding is one.
    pub fn anno(&self, name: &str) -> Option<&Arc<Anno>> {
        self.get(name).and_then(Symbol::as_anno)
    }

    /// Bind an enumeration under its own name.
    pub fn define_enum(&mut self, enum_type: EnumType) -> Arc<EnumType> {
        let enum_type = Arc::new(enum_type);
        self.bind(enum_type.name.clone(), TypeTag::Enum(enum_type.clone()));
        enum_type
    }

    /// Bind a declared class under its own name.
    pub fn define_class(&mut self, class: &crate::class::ClassSpec) -> TypeTag {
        let typ = TypeTag::Class(class.key().clone());
        self.bind(class.name(), typ.clone());
        typ
    }

    /// Evaluate a type expression against this namespace.
    pub fn evaluate(&self, expr: &str) -> Result<Symbol> {
        evaluate_expr(self, expr)
    }

    /// Scoped declaration block.
    ///
    /// `block` must bind exactly one name. The bound type becomes a
    /// descriptor named after the binding and carrying `description`; the
    /// descriptor is bound under that name and returned.
    pub fn declare<F>(&mut self, description: &str, block: F) -> Result<Arc<Anno>>
    where
        F: FnOnce(&mut DeclarationBlock<'_>) -> Result<()>,
    {
        let mut bindings = {
            let mut scope = DeclarationBlock {
                namespace: &*self,
                bindings: Vec::new(),
            };
            block(&mut scope)?;
            scope.bindings
        };

        if bindings.len() > 1 {
            return Err(CallTypesError::MultipleDeclaration {
                names: bindings.into_iter().map(|(name, _)| name).collect(),
            });
        }
        let Some((name, symbol)) = bindings.pop() else {
            return Err(CallTypesError::EmptyDeclaration {
                description: description.to_string(),
            });
        };

        if description.trim().is_empty() {
            return Err(CallTypesError::EmptyDescription { name });
        }

        let typ = match &symbol {
            Symbol::Generic(origin) => {
                return Err(CallTypesError::BadOrigin {
                    origin: origin.name().to_string(),
                })
            }
            other => other.to_type().map_err(|reason| {
                CallTypesError::evaluation(name.clone(), reason)
            })?,
        };

        let anno = Arc::new(Anno::new(description).with_name(name.clone()).set_typ(typ)?);
        debug!(name = %name, typ = %anno.full_type(), "Declared descriptor");
        self.bind(name, anno.clone());
        Ok(anno)
    }
}

/// The scope handed to [`Namespace::declare`].
pub struct DeclarationBlock<'ns> {
    namespace: &'ns Namespace,
    bindings: Vec<(String, Symbol)>,
}

impl DeclarationBlock<'_> {
    /// Bind `name` to an already resolved symbol.
    pub fn assign(&mut self, name: impl Into<String>, symbol: impl Into<Symbol>) {
        self.bindings.push((name.into(), symbol.into()));
    }

    /// Bind `name` to the value of a type expression.
    pub fn assign_expr(&mut self, name: impl Into<String>, expr: &str) -> Result<()> {
        let symbol = self.namespace.evaluate(expr)?;
        self.assign(name, symbol);
        Ok(())
    }

    /// Evaluate without binding anything.
    pub fn evaluate(&self, expr: &str) -> Result<Symbol> {
        self.namespace.evaluate(expr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_declare_binds_descriptor() {
        let mut ns = Namespace::with_builtins();
        let good = ns
            .declare("Good origin", |block| {
                block.assign("Good", TypeTag::Str);
                Ok(())
            })
            .unwrap();
        assert_eq!(good.name(), Some("Good"));
        assert_eq!(good.typ(), &TypeTag::Str);
        assert_eq!(good.description(), "Good origin");
        assert_eq!(ns.anno("Good"), Some(&good));
    }

    #[test]
    fn test_declare_rejects_union() {
        let mut ns = Namespace::with_builtins();
        let err = ns
            .declare("Bad origin", |block| block.assign_expr("Bad", "Union[str, int]"))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Cannot annotate a type with origin typing.Union"
        );
        assert!(!ns.contains("Bad"));
    }

    #[test]
    fn test_single_member_union_collapses() {
        let mut ns = Namespace::with_builtins();
        let one = ns
            .declare("One", |block| block.assign_expr("One", "Union[str]"))
            .unwrap();
        assert_eq!(one.typ(), &TypeTag::Str);

        assert_eq!(
            GenericOrigin::Union.subscript(vec![TypeTag::Int, TypeTag::Int]),
            Ok(TypeTag::Int)
        );
        assert_eq!(
            GenericOrigin::Optional.subscript(vec![TypeTag::NoneType]),
            Ok(TypeTag::NoneType)
        );
        assert_eq!(
            ns.evaluate("Union[Union[str, int], str]").unwrap(),
            Symbol::Type(TypeTag::Union(vec![TypeTag::Str, TypeTag::Int]))
        );
    }

    #[test]
    fn test_declare_requires_exactly_one_binding() {
        let mut ns = Namespace::with_builtins();
        assert!(matches!(
            ns.declare("Nothing", |_| Ok(())),
            Err(CallTypesError::EmptyDeclaration { .. })
        ));
        assert!(matches!(
            ns.declare("Two", |block| {
                block.assign("A", TypeTag::Int);
                block.assign("B", TypeTag::Int);
                Ok(())
            }),
            Err(CallTypesError::MultipleDeclaration { .. })
        ));
    }

    #[test]
    fn test_declare_propagates_block_error() {
        let mut ns = Namespace::with_builtins();
        let err = ns
            .declare("Bad value", |block| block.assign_expr("Bad", "Missing"))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Error evaluating 'Missing': name 'Missing' is not defined"
        );
    }

    #[test]
    fn test_declare_rejects_empty_description() {
        let mut ns = Namespace::with_builtins();
        let err = ns
            .declare("  ", |block| {
                block.assign("Blank", TypeTag::Int);
                Ok(())
            })
            .unwrap_err();
        assert_eq!(err, CallTypesError::EmptyDescription { name: "Blank".into() });
    }

    #[test]
    fn test_declare_array_alias() {
        let mut ns = Namespace::with_builtins();
        let anno = ns
            .declare("An Array", |block| block.assign_expr("ATestArray", "Array[int]"))
            .unwrap();
        assert!(anno.is_array());
        assert_eq!(anno.typ(), &TypeTag::Int);
    }

    #[test]
    fn test_optional_subscript() {
        assert_eq!(
            GenericOrigin::Optional.subscript(vec![TypeTag::Str]),
            Ok(TypeTag::Union(vec![TypeTag::Str, TypeTag::NoneType]))
        );
        assert!(GenericOrigin::Mapping.subscript(vec![TypeTag::Str]).is_err());
    }

    #[test]
    fn test_define_enum() {
        let mut ns = Namespace::with_builtins();
        let status = ns.define_enum(EnumType::new("Status", [("good", 0), ("bad", 1)]));
        assert_eq!(ns.get("Status"), Some(&Symbol::Type(TypeTag::Enum(status))));
    }
}
