//! Scanning of `# type: (T1, T2) -> R` signature comments.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::trace;

use super::parser::{collect_comments, parse_source};
use crate::config::get_comment_config;
use crate::errors::{CallTypesError, Result};
use crate::signature::Callable;

static TYPE_COMMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^# type: ([^-]*)( -> (.*))?$").unwrap());

/// One matching type comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeComment {
    /// Argument expression, e.g. `(Exposure, Path)` or the continuation marker.
    pub args: String,
    /// Return expression, present if the comment carries `->`.
    pub returns: Option<String>,
    pub line: usize,
}

impl TypeComment {
    /// Parse a single comment token.
    pub fn parse(comment: &str, line: usize) -> Option<Self> {
        let captures = TYPE_COMMENT.captures(comment)?;
        Some(Self {
            args: captures.get(1).map(|m| m.as_str().to_string())?,
            returns: captures
                .get(2)
                .and_then(|_| captures.get(3))
                .map(|m| m.as_str().to_string()),
            line,
        })
    }

    /// True if the argument part only continues the group seen so far.
    pub fn is_continuation(&self) -> bool {
        self.args == get_comment_config().continuation_marker
    }

    /// The argument expression with `*` and `**` markers removed.
    pub fn args_without_splats(&self) -> String {
        self.args.replace('*', "")
    }
}

/// Every type comment in `source`, in file order.
pub fn scan_type_comments(source: &str) -> Result<Vec<TypeComment>> {
    let tree = parse_source(source)?;
    let found: Vec<TypeComment> = collect_comments(&tree, source)
        .into_iter()
        .filter_map(|comment| TypeComment::parse(&comment.text, comment.line))
        .collect();
    trace!(count = found.len(), "Scanned type comments");
    Ok(found)
}

/// Type comment annotations as unevaluated expression text.
///
/// Parameters map to `Some(text)`; the `"return"` entry is `None` when the
/// declared return is `None`. The argument tuple is split at top-level
/// commas and runs of whitespace are collapsed. A callable without type
/// comments yields an empty map.
pub fn comment_annotations(callable: &Callable) -> Result<IndexMap<String, Option<String>>> {
    let mut annotations = IndexMap::new();
    let Some(source) = callable.source() else {
        return Ok(annotations);
    };

    let comments = scan_type_comments(source)?;
    if comments.is_empty() {
        return Ok(annotations);
    }

    let mut types: Vec<String> = Vec::new();
    for comment in comments {
        if !comment.is_continuation() {
            types.extend(split_top_level(&strip_parens(&comment.args_without_splats())));
        }
        if let Some(returns) = comment.returns {
            let names = callable.annotated_names();
            if names.len() != types.len() {
                return Err(CallTypesError::ArgumentCountMismatch { args: names, types });
            }
            for (name, typ) in names.into_iter().zip(types) {
                annotations.insert(name, Some(typ));
            }
            let returns = collapse_whitespace(&returns);
            let returns = (returns != "None").then_some(returns);
            annotations.insert("return".to_string(), returns);
            return Ok(annotations);
        }
    }
    Err(CallTypesError::MissingReturnMarker)
}

fn strip_parens(expr: &str) -> String {
    let expr = expr.trim();
    match expr.strip_prefix('(').and_then(|e| e.strip_suffix(')')) {
        Some(inner) if is_balanced(inner) => inner.to_string(),
        _ => expr.to_string(),
    }
}

fn is_balanced(expr: &str) -> bool {
    let mut depth = 0i32;
    for c in expr.chars() {
        match c {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0
}

fn split_top_level(expr: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut current = String::new();
    for c in expr.chars() {
        match c {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(collapse_whitespace(&current));
                current.clear();
                continue;
            }
            _ => {}
        }
        current.push(c);
    }
    if !current.trim().is_empty() {
        parts.push(collapse_whitespace(&current));
    }
    parts
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
