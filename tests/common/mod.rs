// Shared fixtures for calltypes integration tests
#![allow(dead_code)]

use std::sync::Arc;

use calltypes::{
    add_call_types, AnnotatedFunction, Callable, ClassSpec, EnumType, Namespace, Result, TypeTag,
};
use indoc::indoc;

/// Every fixture class and function, registered in one namespace.
pub struct Fixtures {
    pub ns: Namespace,
    pub simple: Arc<ClassSpec>,
    pub many_args: Arc<ClassSpec>,
    pub composition: Arc<ClassSpec>,
    pub composition_func: AnnotatedFunction,
    pub status: Arc<EnumType>,
    pub enum_taker: Arc<ClassSpec>,
    pub layout_table: Arc<ClassSpec>,
    pub manager: Arc<ClassSpec>,
    pub set_layout: AnnotatedFunction,
    pub layout_manager: Arc<ClassSpec>,
    pub reuse: Arc<ClassSpec>,
    pub validate: AnnotatedFunction,
}

/// Declare a descriptor `name` bound to the type expression `expr`.
pub fn declare(ns: &mut Namespace, description: &str, name: &str, expr: &str) {
    ns.declare(description, |block| block.assign_expr(name, expr))
        .unwrap_or_else(|e| panic!("Failed to declare {}: {}", name, e));
}

/// Register a class whose constructor is given as declaration source.
pub fn class_from_source(ns: &mut Namespace, name: &str, init: &str) -> Result<Arc<ClassSpec>> {
    let init = Callable::from_source(init, ns)?;
    let class = ClassSpec::builder(name).init(init).build(ns)?;
    ns.define_class(&class);
    Ok(class)
}

pub fn function_from_source(ns: &Namespace, source: &str) -> Result<AnnotatedFunction> {
    add_call_types(Callable::from_source(source, ns)?, ns)
}

pub fn good_namespace() -> Namespace {
    let mut ns = Namespace::with_builtins();
    declare(&mut ns, "Good origin", "Good", "str");
    ns
}

pub fn fixtures() -> Fixtures {
    let mut ns = Namespace::with_builtins();

    declare(&mut ns, "The exposure to be active for", "Exposure", "float");
    declare(&mut ns, "The path to the file to write", "Path", "str");
    let simple = class_from_source(
        &mut ns,
        "Simple",
        indoc! {r#"
            def __init__(self, exposure, path="/tmp/file.txt"):
                # type: (Exposure, Path) -> None
                self.exposure = exposure
                self.path = path
        "#},
    )
    .expect("Simple");

    declare(&mut ns, "The scannable axes, e.g. ['x', 'y'] or 'x'", "Axes", "Array[str]");
    declare(&mut ns, "The first point to be generated, e.g. [0., 2.4] or 1.", "Start", "Array[float]");
    declare(&mut ns, "The final point to be generated, e.g. [-8., 6.4] or 5.", "Stop", "Array[float]");
    declare(&mut ns, "The number of points to generate, e.g. 5", "Size", "int");
    declare(&mut ns, "The scannable units, e.g. ['mm', 'deg'] or 'mm'", "Units", "Array[str]");
    declare(&mut ns, "Whether to reverse on alternate runs", "Alternate", "bool");
    let many_args = class_from_source(
        &mut ns,
        "ManyArgs",
        indoc! {r#"
            def __init__(self,
                         axes,  # type: Axes
                         start,  # type: Start
                         stop,  # type: Stop
                         size,  # type: Size
                         units="mm",  # type: Units
                         alternate=False,  # type: Alternate
                         ):
                # type: (...) -> None
                self.axes = axes
        "#},
    )
    .expect("ManyArgs");

    declare(&mut ns, "The path prefix for the list of writers", "Prefix", "str");
    let composition = class_from_source(
        &mut ns,
        "CompositionClass",
        indoc! {"
            def __init__(self, exposure, path):
                # type: (Exposure, Path) -> None
                self.exposure = exposure
                self.path = path
        "},
    )
    .expect("CompositionClass");
    let composition_func = function_from_source(
        &ns,
        indoc! {"
            def composition_func(exposure, prefix=None):
                # type: (Exposure, Prefix) -> List[Simple]
                return [Simple(exposure, prefix + suff) for suff in ['/one', '/two']]
        "},
    )
    .expect("composition_func");

    let status = ns.define_enum(EnumType::new("Status", [("good", 0), ("bad", 1)]));
    declare(&mut ns, "The status", "AStatus", "Status");
    let enum_taker = class_from_source(
        &mut ns,
        "EnumTaker",
        indoc! {"
            def __init__(self, status):
                # type: (AStatus) -> None
                self.status = status
        "},
    )
    .expect("EnumTaker");

    declare(&mut ns, "Names of layout parts", "AName", "Array[str]");
    declare(&mut ns, "Malcolm full names of child blocks", "AMri", "Array[str]");
    declare(&mut ns, "X Coordinates of child blocks", "AX", "Array[float]");
    declare(&mut ns, "Y Coordinates of child blocks", "AY", "Array[float]");
    declare(&mut ns, "Whether child blocks are visible", "AVisible", "Array[bool]");
    let layout_table = class_from_source(
        &mut ns,
        "LayoutTable",
        indoc! {"
            def __init__(self, name: AName, mri: AMri, x: AX, y: AY, visible: AVisible):
                pass
        "},
    )
    .expect("LayoutTable");

    declare(&mut ns, "The layout table to act on", "ALayoutTable", "LayoutTable");
    let manager = ClassSpec::builder("Manager").build(&ns).expect("Manager");
    ns.define_class(&manager);
    let set_layout = function_from_source(
        &ns,
        indoc! {"
            def set_layout(self, value):
                # type: (ALayoutTable) -> None
                self.layout = value
        "},
    )
    .expect("set_layout");

    declare(&mut ns, "Layouts for objects", "APartLayout", "Mapping[str, LayoutTable]");
    declare(&mut ns, "Any value at all", "AValue", "Any");
    let layout_manager = class_from_source(
        &mut ns,
        "LayoutManager",
        indoc! {"
            def __init__(self, part_layout: APartLayout, value: AValue) -> None:
                self.part_layout = part_layout
                self.value = value
        "},
    )
    .expect("LayoutManager");

    declare(&mut ns, "Parameters to take", "ASimple", "Simple");
    let reuse = ClassSpec::builder("ReuseCls").build(&ns).expect("ReuseCls");
    ns.define_class(&reuse);
    let validate = function_from_source(
        &ns,
        indoc! {"
            def validate(self, params):
                # type: (ASimple) -> ASimple
                params.exposure = 0.4
                return params
        "},
    )
    .expect("validate");

    Fixtures {
        ns,
        simple,
        many_args,
        composition,
        composition_func,
        status,
        enum_taker,
        layout_table,
        manager,
        set_layout,
        layout_manager,
        reuse,
        validate,
    }
}

pub fn float_array(values: &[f64]) -> calltypes::Value {
    calltypes::Value::from(values.to_vec())
}

pub fn str_array(values: &[&str]) -> calltypes::Value {
    calltypes::Value::from(values.to_vec())
}

pub fn type_of(ns: &Namespace, name: &str) -> TypeTag {
    ns.evaluate(name)
        .and_then(|symbol| {
            symbol
                .to_type()
                .map_err(|reason| calltypes::CallTypesError::evaluation(name, reason))
        })
        .unwrap_or_else(|e| panic!("{} is not a type: {}", name, e))
}
