//! Extraction of a [`Callable`] from a `def` in declaration source.

use tree_sitter::Node;

use super::parser::{dedent, find_first, node_line, node_text, parse_source};
use crate::errors::{CallTypesError, Result};
use crate::namespace::{Namespace, Symbol};
use crate::signature::{Callable, CallableBuilder, SELF_PARAM};
use crate::types::TypeTag;
use crate::value::Value;

/// Build a [`Callable`] from the first function definition in `source`.
pub fn parse_function(source: &str, ns: &Namespace) -> Result<Callable> {
    let source = dedent(source);
    let tree = parse_source(&source)?;
    let def = find_first(tree.root_node(), "function_definition")
        .ok_or_else(|| CallTypesError::source_parse("no function definition found"))?;
    if def.has_error() {
        return Err(CallTypesError::source_parse(format!(
            "invalid syntax in function definition on line {}",
            node_line(&def)
        )));
    }

    let name = def
        .child_by_field_name("name")
        .map(|n| node_text(&n, &source))
        .ok_or_else(|| CallTypesError::source_parse("function definition without a name"))?;
    let mut builder = Callable::builder(name).source(node_text(&def, &source));

    if let Some(parameters) = def.child_by_field_name("parameters") {
        let mut cursor = parameters.walk();
        let params: Vec<Node> = parameters.named_children(&mut cursor).collect();
        for (index, param) in params.into_iter().enumerate() {
            builder = add_parameter(builder, param, index == 0, &source, ns)?;
        }
    }

    if let Some(return_type) = def.child_by_field_name("return_type") {
        builder = builder.returns(evaluate_annotation(return_type, &source, ns)?);
    }

    builder.build()
}

fn add_parameter(
    builder: CallableBuilder,
    param: Node,
    is_first: bool,
    source: &str,
    ns: &Namespace,
) -> Result<CallableBuilder> {
    let field_text = |field: &str| param.child_by_field_name(field).map(|n| node_text(&n, source));

    let builder = match param.kind() {
        "identifier" => plain_parameter(builder, node_text(&param, source), is_first),
        "default_parameter" => {
            let name = field_text("name").unwrap_or_default();
            let default = default_value(param, source, ns)?;
            builder.arg_with_default(name, default)
        }
        "typed_parameter" => {
            let target = param
                .named_child(0)
                .ok_or_else(|| CallTypesError::source_parse("typed parameter without a name"))?;
            let annotation = match param.child_by_field_name("type") {
                Some(typ) => Some(evaluate_annotation(typ, source, ns)?),
                None => None,
            };
            let (builder, name) = match target.kind() {
                "list_splat_pattern" => {
                    let name = splat_name(target, source);
                    (builder.varargs(name.clone()), name)
                }
                "dictionary_splat_pattern" => {
                    let name = splat_name(target, source);
                    (builder.kwargs(name.clone()), name)
                }
                _ => {
                    let name = node_text(&target, source).to_string();
                    (plain_parameter(builder, &name, is_first), name)
                }
            };
            match annotation {
                Some(symbol) if name != SELF_PARAM => builder.annotate(name, symbol),
                _ => builder,
            }
        }
        "typed_default_parameter" => {
            let name = field_text("name").unwrap_or_default().to_string();
            let default = default_value(param, source, ns)?;
            let builder = builder.arg_with_default(name.clone(), default);
            match param.child_by_field_name("type") {
                Some(typ) => builder.annotate(name, evaluate_annotation(typ, source, ns)?),
                None => builder,
            }
        }
        "list_splat_pattern" => builder.varargs(splat_name(param, source)),
        "dictionary_splat_pattern" => builder.kwargs(splat_name(param, source)),
        "keyword_separator" => builder.keyword_separator(),
        // `/` separator, comments
        _ => builder,
    };
    Ok(builder)
}

fn plain_parameter(builder: CallableBuilder, name: &str, is_first: bool) -> CallableBuilder {
    if is_first && name == SELF_PARAM {
        builder.method()
    } else {
        builder.arg(name)
    }
}

fn splat_name(node: Node, source: &str) -> String {
    node_text(&node, source).trim_start_matches('*').trim().to_string()
}

fn evaluate_annotation(node: Node, source: &str, ns: &Namespace) -> Result<Symbol> {
    ns.evaluate(node_text(&node, source).trim())
}

fn default_value(param: Node, source: &str, ns: &Namespace) -> Result<Value> {
    let value = param.child_by_field_name("value").ok_or_else(|| {
        CallTypesError::source_parse(format!(
            "parameter without default value on line {}",
            node_line(&param)
        ))
    })?;
    literal_value(value, source, ns)
}

/// Convert a literal default expression into a value.
fn literal_value(node: Node, source: &str, ns: &Namespace) -> Result<Value> {
    let text = node_text(&node, source);
    let unsupported = || {
        CallTypesError::source_parse(format!("unsupported default value '{}'", text))
    };

    match node.kind() {
        "none" => Ok(Value::None),
        "true" => Ok(Value::Bool(true)),
        "false" => Ok(Value::Bool(false)),
        "integer" => text
            .replace('_', "")
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| unsupported()),
        "float" => text
            .replace('_', "")
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| unsupported()),
        "string" => Ok(Value::Str(string_literal(text))),
        "unary_operator" => {
            let operand = node.child_by_field_name("argument").ok_or_else(unsupported)?;
            match (text.trim_start().chars().next(), literal_value(operand, source, ns)?) {
                (Some('-'), Value::Int(i)) => Ok(Value::Int(-i)),
                (Some('-'), Value::Float(f)) => Ok(Value::Float(-f)),
                (Some('+'), value @ (Value::Int(_) | Value::Float(_))) => Ok(value),
                _ => Err(unsupported()),
            }
        }
        "parenthesized_expression" => {
            let inner = node.named_child(0).ok_or_else(unsupported)?;
            literal_value(inner, source, ns)
        }
        "list" | "tuple" => {
            let mut cursor = node.walk();
            let items: Vec<Node> = node.named_children(&mut cursor).collect();
            items
                .into_iter()
                .map(|item| literal_value(item, source, ns))
                .collect::<Result<Vec<_>>>()
                .map(Value::List)
        }
        "dictionary" => {
            let mut cursor = node.walk();
            let pairs: Vec<Node> = node.named_children(&mut cursor).collect();
            pairs
                .into_iter()
                .map(|pair| -> Result<(Value, Value)> {
                    let key = pair.child_by_field_name("key").ok_or_else(unsupported)?;
                    let value = pair.child_by_field_name("value").ok_or_else(unsupported)?;
                    Ok((
                        literal_value(key, source, ns)?,
                        literal_value(value, source, ns)?,
                    ))
                })
                .collect::<Result<Vec<_>>>()
                .map(Value::Map)
        }
        "attribute" => {
            // Enum member, e.g. `Status.good`
            let object = node.child_by_field_name("object").ok_or_else(unsupported)?;
            let member = node
                .child_by_field_name("attribute")
                .map(|n| node_text(&n, source))
                .ok_or_else(unsupported)?;
            match ns.evaluate(node_text(&object, source))? {
                Symbol::Type(TypeTag::Enum(enum_type)) => enum_type
                    .member(member)
                    .map(Value::Enum)
                    .ok_or_else(unsupported),
                _ => Err(unsupported()),
            }
        }
        _ => Err(unsupported()),
    }
}

fn string_literal(text: &str) -> String {
    let body = text.trim_start_matches(|c: char| c.is_ascii_alphabetic());
    for quote in ["\"\"\"", "'''", "\"", "'"] {
        if let Some(inner) = body
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner.to_string();
        }
    }
    body.to_string()
}
