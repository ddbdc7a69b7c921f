//! RFC 9535 JSONPath: compile a query once, then evaluate it against any
//! number of `serde_json::Value` documents.
//!
//! ```
//! use serde_json::json;
//!
//! let query = jsonpath_interp::compile("$.store.book[?@.price < 10].title").unwrap();
//! let doc = json!({"store": {"book": [
//!     {"title": "Sayings", "price": 8.95},
//!     {"title": "Sword", "price": 12.99}
//! ]}});
//! assert_eq!(query.search(&doc), vec![&json!("Sayings")]);
//! ```
//!
//! A compiled [`Query`] is immutable and can be shared freely; every call to
//! [`Query::search`], [`Query::each`], [`Query::delete`] and friends builds its
//! own short-lived interpreter.

pub mod ast;
pub mod comparison;
pub mod errors;
pub mod filter;
pub mod functions;
pub mod lexer;
pub mod parser;
pub mod path;
pub mod token;

mod context;
mod engine;
mod interpreter;

pub use ast::{BinaryOp, Node, NodeKind, Query, UnaryOp};
pub use errors::{Error, ErrorKind, Result};
pub use interpreter::selectors::slice_indices;
pub use path::{Key, NodeRef, PathElement};

/// Lexes and parses `query` into a [`Query`], rejecting anything that is not
/// well-formed and well-typed.
pub fn compile(query: &str) -> Result<Query> {
    let tokens = lexer::lex(query)?;
    let compiled = parser::parse(query, tokens)?;
    tracing::debug!(query, normalized = %compiled, "compiled query");
    Ok(compiled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn compile_reports_the_failing_stage() {
        assert_eq!(compile("$.a b").unwrap_err().kind, ErrorKind::Parse);
        assert_eq!(compile("$['a").unwrap_err().kind, ErrorKind::Lex);
        assert_eq!(compile("$[?@.* == 1]").unwrap_err().kind, ErrorKind::Type);
    }

    #[test]
    fn queries_parse_from_str() {
        let query: Query = "$.a[0]".parse().unwrap();
        assert_eq!(query, compile("$['a'][0]").unwrap());
        assert_eq!(query.source(), "$.a[0]");
    }
}
