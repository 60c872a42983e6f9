//! Declaration source scanning.
//!
//! Tree-sitter is the tokenizer for everything read from source text:
//! function definitions, `# type:` comments and type expressions.

mod expr;
mod function;
pub mod parser;
mod type_comments;

pub use expr::evaluate_expr;
pub use function::parse_function;
pub use parser::{collect_comments, dedent, node_line, node_text, parse_source, Comment};
pub use type_comments::{comment_annotations, scan_type_comments, TypeComment};
