//! Type expression evaluation.
//!
//! Expressions are parsed with tree-sitter and resolved node by node against
//! a [`Namespace`]. Only names, dotted names, subscripts of generic origins,
//! tuples, `None` and `...` are understood.

use tree_sitter::Node;

use super::parser::{has_parse_errors, node_text, parse_source};
use crate::errors::{CallTypesError, Result};
use crate::namespace::{Namespace, Symbol};

const INVALID_SYNTAX: &str = "invalid syntax";

/// Evaluate `expr` against `ns`.
///
/// Failures are reported as [`CallTypesError::Evaluation`] naming the
/// expression and the reason, e.g. `name 'Foo' is not defined`.
pub fn evaluate_expr(ns: &Namespace, expr: &str) -> Result<Symbol> {
    let tree = parse_source(expr)?;
    if has_parse_errors(&tree) {
        return Err(CallTypesError::evaluation(expr, INVALID_SYNTAX));
    }

    let root = tree.root_node();
    let mut cursor = root.walk();
    let statements: Vec<Node> = root
        .named_children(&mut cursor)
        .filter(|n| n.kind() != "comment")
        .collect();
    let [statement] = statements.as_slice() else {
        return Err(CallTypesError::evaluation(expr, INVALID_SYNTAX));
    };
    if statement.kind() != "expression_statement" {
        return Err(CallTypesError::evaluation(expr, INVALID_SYNTAX));
    }

    let mut cursor = statement.walk();
    let parts: Vec<Node> = statement.named_children(&mut cursor).collect();
    let result = match parts.as_slice() {
        [] => Err(INVALID_SYNTAX.to_string()),
        [single] => eval_node(*single, expr, ns),
        many => many
            .iter()
            .map(|part| eval_node(*part, expr, ns))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map(Symbol::Tuple),
    };
    result.map_err(|reason| CallTypesError::evaluation(expr, reason))
}

fn eval_node(node: Node, source: &str, ns: &Namespace) -> std::result::Result<Symbol, String> {
    let text = node_text(&node, source);
    match node.kind() {
        "identifier" => lookup(ns, text),
        "attribute" => eval_attribute(node, source, ns),
        "none" => Ok(Symbol::None),
        "ellipsis" => Ok(Symbol::Ellipsis),
        "parenthesized_expression" => {
            let mut cursor = node.walk();
            let inner: Vec<Node> = node
                .named_children(&mut cursor)
                .filter(|n| n.kind() != "comment")
                .collect();
            match inner.as_slice() {
                [single] => eval_node(*single, source, ns),
                _ => Err(INVALID_SYNTAX.to_string()),
            }
        }
        "tuple" => {
            let mut cursor = node.walk();
            let items: Vec<Node> = node
                .named_children(&mut cursor)
                .filter(|n| n.kind() != "comment")
                .collect();
            items
                .into_iter()
                .map(|item| eval_node(item, source, ns))
                .collect::<std::result::Result<Vec<_>, _>>()
                .map(Symbol::Tuple)
        }
        "subscript" => eval_subscript(node, source, ns),
        "string" => eval_forward_reference(text, ns),
        kind => Err(format!("unsupported expression '{}' ({})", text, kind)),
    }
}

fn lookup(ns: &Namespace, name: &str) -> std::result::Result<Symbol, String> {
    ns.get(name)
        .cloned()
        .ok_or_else(|| format!("name '{}' is not defined", name))
}

/// Dotted names resolve only if bound under the full dotted name.
fn eval_attribute(node: Node, source: &str, ns: &Namespace) -> std::result::Result<Symbol, String> {
    let dotted: String = node_text(&node, source)
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    if let Some(symbol) = ns.get(&dotted) {
        return Ok(symbol.clone());
    }
    let object = node
        .child_by_field_name("object")
        .ok_or_else(|| INVALID_SYNTAX.to_string())?;
    let attribute = node
        .child_by_field_name("attribute")
        .map(|n| node_text(&n, source))
        .unwrap_or_default();
    eval_node(object, source, ns)?;
    Err(format!(
        "'{}' has no attribute '{}'",
        node_text(&object, source),
        attribute
    ))
}

fn eval_subscript(node: Node, source: &str, ns: &Namespace) -> std::result::Result<Symbol, String> {
    let value = node
        .child_by_field_name("value")
        .ok_or_else(|| INVALID_SYNTAX.to_string())?;
    let origin = match eval_node(value, source, ns)? {
        Symbol::Generic(origin) => origin,
        _ => {
            return Err(format!(
                "'{}' object is not subscriptable",
                node_text(&value, source)
            ))
        }
    };

    let mut cursor = node.walk();
    let subscripts: Vec<Node> = node.children_by_field_name("subscript", &mut cursor).collect();
    let mut args = Vec::with_capacity(subscripts.len());
    for subscript in subscripts {
        match eval_node(subscript, source, ns)? {
            Symbol::Tuple(items) => {
                for item in items {
                    args.push(item.to_type()?);
                }
            }
            other => args.push(other.to_type()?),
        }
    }
    origin.subscript(args).map(Symbol::Type)
}

/// A quoted annotation names a type declared later, e.g. `"Simple"`.
fn eval_forward_reference(text: &str, ns: &Namespace) -> std::result::Result<Symbol, String> {
    let inner = text
        .trim_start_matches(|c: char| c.is_ascii_alphabetic())
        .trim_matches(|c| c == '"' || c == '\'');
    match evaluate_expr(ns, inner) {
        Ok(symbol) => Ok(symbol),
        Err(CallTypesError::Evaluation { reason, .. }) => Err(reason),
        Err(other) => Err(other.to_string()),
    }
}
