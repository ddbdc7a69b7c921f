use jsonpath_interp::{compile, ErrorKind};
use pretty_assertions::assert_eq;

fn kind(query: &str) -> ErrorKind {
    match compile(query) {
        Ok(q) => panic!("expected {query:?} to be rejected, compiled to {q}"),
        Err(e) => e.kind,
    }
}

// Every malformed query fails in compile; nothing is deferred to evaluation.
#[test]
fn test_invalid_whitespace() {
    assert_eq!(kind(" $"), ErrorKind::Lex);
    assert_eq!(kind("$ "), ErrorKind::Lex);
    assert_eq!(kind("$. a"), ErrorKind::Lex);
    assert_eq!(kind("$.. a"), ErrorKind::Lex);
    assert_eq!(kind("$[- 1]"), ErrorKind::Lex);
    assert_eq!(kind("$[?length (@) == 1]"), ErrorKind::Lex);
}

#[test]
fn test_invalid_strings() {
    assert_eq!(kind("$['abc"), ErrorKind::Lex);
    assert_eq!(kind(r#"$["a\'b"]"#), ErrorKind::Lex);
    assert_eq!(kind(r"$['a\q']"), ErrorKind::Lex);
    assert_eq!(kind(r"$['\uD800']"), ErrorKind::Lex);
    assert_eq!(kind(r"$['\uDC00']"), ErrorKind::Lex);
    assert_eq!(kind(r"$['\u12']"), ErrorKind::Lex);
    assert_eq!(kind("$['a\u{1}']"), ErrorKind::Lex);
}

#[test]
fn test_invalid_numbers() {
    assert_eq!(kind("$[01]"), ErrorKind::Lex);
    assert_eq!(kind("$[?@ == 1e]"), ErrorKind::Lex);
    assert_eq!(kind("$[?@ == 1.]"), ErrorKind::Lex);
    assert_eq!(kind("$[1.5]"), ErrorKind::Parse);
    assert_eq!(kind("$[1:x]"), ErrorKind::Parse);
}

#[test]
fn test_invalid_index_range() {
    assert_eq!(kind("$[9007199254740992]"), ErrorKind::Range);
    assert_eq!(kind("$[-9007199254740992]"), ErrorKind::Range);
    assert_eq!(kind("$[-0]"), ErrorKind::Range);
    assert_eq!(kind("$[::-0]"), ErrorKind::Range);
    assert!(compile("$[9007199254740991]").is_ok());
    assert!(compile("$[-9007199254740991]").is_ok());
    // negative zero is fine as a filter literal
    assert!(compile("$[?@ == -0]").is_ok());
}

#[test]
fn test_invalid_grammar() {
    assert_eq!(kind(""), ErrorKind::Parse);
    assert_eq!(kind("@"), ErrorKind::Parse);
    assert_eq!(kind("$.."), ErrorKind::Parse);
    assert_eq!(kind("$[]"), ErrorKind::Parse);
    assert_eq!(kind("$[1,]"), ErrorKind::Parse);
    assert_eq!(kind("$[1"), ErrorKind::Parse);
    assert_eq!(kind("$[abc]"), ErrorKind::Parse);
    assert_eq!(kind("$[1:2:3:4]"), ErrorKind::Parse);
    assert_eq!(kind("$[?@.a"), ErrorKind::Parse);
    assert_eq!(kind("$[?(@.a]"), ErrorKind::Parse);
}

#[test]
fn test_invalid_types() {
    assert_eq!(kind("$[?@[*] == 0]"), ErrorKind::Type);
    assert_eq!(kind("$[?@..a == 0]"), ErrorKind::Type);
    assert_eq!(kind("$[?search(@, 'a') == true]"), ErrorKind::Type);
    assert_eq!(kind("$[?true == false]"), ErrorKind::Type);
    assert_eq!(kind("$[?1]"), ErrorKind::Type);
    assert_eq!(kind("$[?count(@.*)]"), ErrorKind::Type);
    assert_eq!(kind("$[?@.a == 1 == 2]"), ErrorKind::Type);
}

#[test]
fn test_invalid_parenthesized_operands() {
    assert_eq!(kind("$[?(@.a)==1]"), ErrorKind::Type);
    assert_eq!(kind("$[?(1)==@.a]"), ErrorKind::Type);
    assert_eq!(kind("$[?@.a==(@.b)]"), ErrorKind::Type);
    assert_eq!(kind("$[?length((@.a))==1]"), ErrorKind::Type);
    assert_eq!(kind("$[?value((@..a))==1]"), ErrorKind::Type);
    // a group is still a valid test or negation
    assert!(compile("$[?(@.a)]").is_ok());
    assert!(compile("$[?!(@.a == 1)]").is_ok());
}

#[test]
fn test_invalid_function_calls() {
    assert_eq!(kind("$[?nope(@)]"), ErrorKind::Name);
    assert_eq!(kind("$[?length(@, @) == 1]"), ErrorKind::Type);
    assert_eq!(kind("$[?length() == 1]"), ErrorKind::Type);
    assert_eq!(kind("$[?length(@.*) == 1]"), ErrorKind::Type);
    assert_eq!(kind("$[?count('a') == 1]"), ErrorKind::Type);
    assert_eq!(kind("$[?match(@.*, 'a')]"), ErrorKind::Type);
    assert_eq!(kind("$[?value(1) == 1]"), ErrorKind::Type);
}

#[test]
fn test_errors_carry_query_and_offset() {
    let error = compile("$.a[?@.b == 1 == 2]").unwrap_err();
    assert_eq!(error.query, "$.a[?@.b == 1 == 2]");
    assert!(error.offset().is_some());
    assert!(error.to_string().starts_with("type error:"));

    let error = compile("$['x").unwrap_err();
    assert_eq!(error.offset(), Some(2));
}
