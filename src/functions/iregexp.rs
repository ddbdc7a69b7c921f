//! I-Regexp (RFC 9485) patterns mapped onto the `regex` crate dialect.

use std::cell::RefCell;
use std::collections::HashMap;

use regex::Regex;

const CACHE_LIMIT: usize = 128;

thread_local! {
    static CACHE: RefCell<HashMap<String, Option<Regex>>> = RefCell::new(HashMap::new());
}

/// Rewrites every unescaped `.` outside a character class so it excludes
/// `\n` and `\r`, then optionally anchors the pattern to the whole input.
pub fn translate(pattern: &str, anchored: bool) -> String {
    let mut out = String::with_capacity(pattern.len() + 8);
    if anchored {
        out.push_str("^(?:");
    }
    let mut chars = pattern.chars();
    let mut in_class = false;
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                out.push(c);
                if let Some(escaped) = chars.next() {
                    out.push(escaped);
                }
            }
            '[' if !in_class => {
                in_class = true;
                out.push(c);
            }
            ']' if in_class => {
                in_class = false;
                out.push(c);
            }
            '.' if !in_class => out.push_str(r"[^\n\r]"),
            c => out.push(c),
        }
    }
    if anchored {
        out.push_str(")$");
    }
    out
}

/// Compiles (or fetches from the per-thread cache) the translated pattern.
/// Invalid patterns yield `None`.
pub fn compile(pattern: &str, anchored: bool) -> Option<Regex> {
    let translated = translate(pattern, anchored);
    CACHE.with(|cache| {
        let mut cache = cache.borrow_mut();
        if let Some(found) = cache.get(&translated) {
            return found.clone();
        }
        let compiled = match Regex::new(&translated) {
            Ok(re) => Some(re),
            Err(err) => {
                tracing::debug!(pattern, error = %err, "invalid I-Regexp pattern");
                None
            }
        };
        if cache.len() >= CACHE_LIMIT {
            cache.clear();
        }
        cache.insert(translated, compiled.clone());
        compiled
    })
}

pub fn is_match(input: &str, pattern: &str) -> bool {
    compile(pattern, true).is_some_and(|re| re.is_match(input))
}

pub fn is_search(input: &str, pattern: &str) -> bool {
    compile(pattern, false).is_some_and(|re| re.is_match(input))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn dots_outside_classes_exclude_line_breaks() {
        assert_eq!(translate("a.b", false), r"a[^\n\r]b");
        assert_eq!(translate(r"a\.b", false), r"a\.b");
        assert_eq!(translate("[.]", false), "[.]");
        assert_eq!(translate("a.", true), r"^(?:a[^\n\r])$");
    }

    #[test]
    fn match_is_anchored_search_is_not() {
        assert!(is_match("abc", "a.c"));
        assert!(!is_match("xabcx", "a.c"));
        assert!(is_search("xabcx", "a.c"));
        assert!(!is_match("a\rc", "a.c"));
        assert!(is_match("ab", "a|ab"));
    }

    #[test]
    fn invalid_patterns_never_match() {
        assert!(!is_match("a", "("));
        assert!(!is_search("a", "[a"));
    }
}
