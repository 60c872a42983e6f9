//! Tree-sitter parser integration for Python-style declaration source.

use tree_sitter::{Node, Parser, Tree, TreeCursor};

use crate::errors::{CallTypesError, Result};

/// Parse declaration source into a tree-sitter tree.
///
/// The tree is returned even if it contains error nodes; callers that need
/// well-formed input check [`has_parse_errors`].
pub fn parse_source(content: &str) -> Result<Tree> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_python::LANGUAGE.into())
        .map_err(|e| CallTypesError::source_parse(format!("Failed to set language: {}", e)))?;
    parser
        .parse(content, None)
        .ok_or_else(|| CallTypesError::source_parse("Failed to parse source code"))
}

/// Check if a parse tree has errors
pub fn has_parse_errors(tree: &Tree) -> bool {
    tree.root_node().has_error()
}

/// Get text for a tree-sitter node
pub fn node_text<'a>(node: &Node, source: &'a str) -> &'a str {
    &source[node.start_byte()..node.end_byte()]
}

/// Get the line number for a tree-sitter node (1-indexed)
pub fn node_line(node: &Node) -> usize {
    node.start_position().row + 1
}

/// A comment token found in source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub text: String,
    pub line: usize,
}

/// All comments in the tree, in file order.
pub fn collect_comments(tree: &Tree, source: &str) -> Vec<Comment> {
    let mut comments = Vec::new();
    let mut cursor = tree.root_node().walk();
    visit_comments(&mut cursor, source, &mut comments);
    comments
}

fn visit_comments(cursor: &mut TreeCursor, source: &str, comments: &mut Vec<Comment>) {
    let node = cursor.node();
    if node.kind() == "comment" {
        comments.push(Comment {
            text: node_text(&node, source).trim_end().to_string(),
            line: node_line(&node),
        });
    }

    if cursor.goto_first_child() {
        loop {
            visit_comments(cursor, source, comments);
            if !cursor.goto_next_sibling() {
                break;
            }
        }
        cursor.goto_parent();
    }
}

/// First node of `kind` in a pre-order walk.
pub fn find_first<'t>(node: Node<'t>, kind: &str) -> Option<Node<'t>> {
    if node.kind() == kind {
        return Some(node);
    }
    let mut cursor = node.walk();
    let children: Vec<Node<'t>> = node.children(&mut cursor).collect();
    children.into_iter().find_map(|child| find_first(child, kind))
}

/// Remove the indentation common to every non-blank line.
///
/// Methods copied out of a class body parse as top-level definitions.
pub fn dedent(source: &str) -> String {
    let indent = source
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start().len())
        .min()
        .unwrap_or(0);
    source
        .lines()
        .map(|line| line.get(indent..).unwrap_or_else(|| line.trim_start()))
        .collect::<Vec<_>>()
        .join("\n")
}
