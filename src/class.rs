//! Class registration: per-class call types, inheritance of call types by
//! classes without their own constructor, and descriptor-driven
//! representation of instances.
//!
//! ```rust
//! use calltypes::class::ClassSpec;
//! use calltypes::namespace::Namespace;
//! use calltypes::signature::Callable;
//! use calltypes::types::TypeTag;
//! use calltypes::value::Value;
//!
//! let mut ns = Namespace::with_builtins();
//! ns.declare("The name", |block| {
//!     block.assign("Name", TypeTag::Str);
//!     Ok(())
//! })
//! .unwrap();
//!
//! let root = ClassSpec::builder("Root")
//!     .init(Callable::from_source("def __init__(self, name: Name):\n    pass\n", &ns).unwrap())
//!     .build(&ns)
//!     .unwrap();
//! let sub = ClassSpec::builder("Sub").parent(&root).build(&ns).unwrap();
//!
//! assert!(sub.shares_call_types(&root));
//! let inst = sub.construct(vec![Value::from("x")], &[]).unwrap();
//! assert_eq!(inst.repr(), "Sub(name='x')");
//! ```

use std::sync::Arc;

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use tracing::debug;

use crate::anno::Anno;
use crate::calltypes::{bind_arguments, make_call_types, CallTypes};
use crate::errors::{CallTypesError, Result};
use crate::namespace::Namespace;
use crate::signature::Callable;
use crate::types::{ClassKey, TypeTag};
use crate::value::Value;

/// Name of the base class every declared class derives from.
pub const ROOT_CLASS_NAME: &str = "WithCallTypes";

static ROOT: Lazy<Arc<ClassSpec>> = Lazy::new(|| {
    let key = ClassKey::new(ROOT_CLASS_NAME, None);
    Arc::new(ClassSpec {
        return_type: Some(Arc::new(Anno::instance(key.clone()))),
        key,
        parent: None,
        init: None,
        call_types: Arc::new(CallTypes::new()),
        positional: 0,
        stores: Some(Vec::new()),
    })
});

/// A registered class.
#[derive(Debug)]
pub struct ClassSpec {
    key: ClassKey,
    parent: Option<Arc<ClassSpec>>,
    init: Option<Callable>,
    call_types: Arc<CallTypes>,
    return_type: Option<Arc<Anno>>,
    /// Leading call types that may be bound by position.
    positional: usize,
    /// Representable fields; `None` stores every parameter.
    stores: Option<Vec<String>>,
}

impl ClassSpec {
    /// The base class: no parameters, represented as `WithCallTypes()`.
    pub fn root() -> Arc<ClassSpec> {
        ROOT.clone()
    }

    pub fn builder(name: impl Into<String>) -> ClassBuilder {
        ClassBuilder {
            name: name.into(),
            parent: None,
            init: None,
            stores: None,
        }
    }

    pub fn name(&self) -> &str {
        self.key.name()
    }

    pub fn key(&self) -> &ClassKey {
        &self.key
    }

    pub fn parent(&self) -> Option<&Arc<ClassSpec>> {
        self.parent.as_ref()
    }

    /// The class's own constructor, if it declares one.
    pub fn init(&self) -> Option<&Callable> {
        self.init.as_ref()
    }

    pub fn call_types(&self) -> &Arc<CallTypes> {
        &self.call_types
    }

    pub fn return_type(&self) -> Option<&Arc<Anno>> {
        self.return_type.as_ref()
    }

    /// True if both classes use the same derived mapping.
    pub fn shares_call_types(&self, other: &ClassSpec) -> bool {
        Arc::ptr_eq(&self.call_types, &other.call_types)
    }

    /// Names stored on instances and listed in their representation.
    pub fn representable_fields(&self) -> Vec<&str> {
        match &self.stores {
            Some(stores) => self
                .call_types
                .keys()
                .filter(|name| stores.contains(*name))
                .map(String::as_str)
                .collect(),
            None => self.call_types.keys().map(String::as_str).collect(),
        }
    }

    /// True if `typ` is this class or one of its subclasses.
    pub fn matches_type(&self, typ: &TypeTag) -> bool {
        match typ {
            TypeTag::Class(key) => key.is_subclass_of(&self.key),
            _ => false,
        }
    }

    /// Construct an instance, validating arguments against the call types.
    pub fn construct(
        self: &Arc<Self>,
        positional: Vec<Value>,
        keyword: &[(&str, Value)],
    ) -> Result<Instance> {
        let mut bound = bind_arguments(&self.call_types, self.positional, positional, keyword)?;
        let fields = self.representable_fields();
        bound.retain(|name, _| fields.contains(&name.as_str()));
        Ok(Instance {
            class: self.clone(),
            attributes: bound,
        })
    }
}

/// Builder for [`ClassSpec`].
#[derive(Debug, Clone)]
pub struct ClassBuilder {
    name: String,
    parent: Option<Arc<ClassSpec>>,
    init: Option<Callable>,
    stores: Option<Vec<String>>,
}

impl ClassBuilder {
    /// Derive from `parent` instead of the root class.
    pub fn parent(mut self, parent: &Arc<ClassSpec>) -> Self {
        self.parent = Some(parent.clone());
        self
    }

    /// The class's own constructor.
    pub fn init(mut self, init: Callable) -> Self {
        self.init = Some(init);
        self
    }

    /// Constructor parameters stored as attributes. Defaults to all of them.
    pub fn stores<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stores = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Register the class, deriving call types from its own constructor.
    pub fn build(self, ns: &Namespace) -> Result<Arc<ClassSpec>> {
        let parent = self.parent.unwrap_or_else(ClassSpec::root);
        let key = ClassKey::new(self.name, Some(&parent.key));

        let (call_types, return_type, positional, stores) = match &self.init {
            Some(init) => {
                let (call_types, _) = make_call_types(init, ns)?;
                let return_type = Anno::instance(key.clone());
                (
                    Arc::new(call_types),
                    Some(Arc::new(return_type)),
                    init.args().len(),
                    self.stores,
                )
            }
            None => (
                parent.call_types.clone(),
                parent.return_type.clone(),
                parent.positional,
                self.stores.or_else(|| parent.stores.clone()),
            ),
        };

        if let Some(unknown) = stores
            .iter()
            .flatten()
            .find(|field| !call_types.contains_key(field.as_str()))
        {
            return Err(CallTypesError::UnknownStoredField {
                name: unknown.clone(),
                class: key.name().to_string(),
            });
        }

        debug!(
            class = %key.name(),
            params = call_types.len(),
            own_init = self.init.is_some(),
            "Registered class"
        );

        Ok(Arc::new(ClassSpec {
            key,
            parent: Some(parent),
            init: self.init,
            call_types,
            return_type,
            positional,
            stores,
        }))
    }
}

/// An instance of a registered class.
#[derive(Debug, Clone)]
pub struct Instance {
    class: Arc<ClassSpec>,
    attributes: IndexMap<String, Value>,
}

impl Instance {
    /// Instance with no attributes stored.
    pub fn new(class: Arc<ClassSpec>) -> Self {
        Self {
            class,
            attributes: IndexMap::new(),
        }
    }

    pub fn class(&self) -> &Arc<ClassSpec> {
        &self.class
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// Store an attribute. Declared parameters are validated by their descriptor.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Result<()> {
        let name = name.into();
        let value = match self.class.call_types.get(&name) {
            Some(anno) => anno.call(value.into())?,
            None => value.into(),
        };
        self.attributes.insert(name, value);
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.attributes.shift_remove(name)
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn repr(&self) -> String {
        make_repr(self.class.name(), &self.class.call_types, |name| self.get(name))
    }
}

impl PartialEq for Instance {
    fn eq(&self, other: &Self) -> bool {
        self.class.key == other.class.key && self.attributes == other.attributes
    }
}

/// Descriptor-driven representation: `Name(a=1, b='x')`.
///
/// Parameters are listed in declaration order; those `lookup` does not
/// find are skipped.
pub fn make_repr<'a, F>(class_name: &str, call_types: &CallTypes, lookup: F) -> String
where
    F: Fn(&str) -> Option<&'a Value>,
{
    let fields: Vec<String> = call_types
        .keys()
        .filter_map(|name| lookup(name).map(|value| format!("{}={}", name, value.repr())))
        .collect();
    format!("{}({})", class_name, fields.join(", "))
}

/// Opt-in for plain Rust types described by a registered class.
pub trait WithCallTypes {
    fn class_spec(&self) -> &Arc<ClassSpec>;

    /// Stored attributes by name.
    fn attributes(&self) -> IndexMap<String, Value>;

    fn call_types(&self) -> &CallTypes {
        self.class_spec().call_types()
    }

    fn repr(&self) -> String {
        let attributes = self.attributes();
        make_repr(self.class_spec().name(), self.call_types(), |name| {
            attributes.get(name)
        })
    }
}
