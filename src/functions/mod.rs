use std::borrow::Cow;
use std::fmt;

use serde_json::Value;

use crate::filter::Outcome;

pub mod iregexp;

/// Declared type of a function parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    /// A literal, a singular query, or a value-typed function result.
    Value,
    /// A raw node list produced by any filter query.
    Nodes,
}

/// Declared type of a function result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultType {
    Value,
    Logical,
}

/// A built-in function extension.
pub struct Function {
    pub name: &'static str,
    pub params: &'static [ParamType],
    pub result: ResultType,
    pub eval: for<'a> fn(Vec<Outcome<'a>>) -> Outcome<'a>,
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("result", &self.result)
            .finish()
    }
}

impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

/// The closed set of functions a filter may call.
pub static BUILTINS: [Function; 5] = [
    Function {
        name: "length",
        params: &[ParamType::Value],
        result: ResultType::Value,
        eval: length,
    },
    Function {
        name: "count",
        params: &[ParamType::Nodes],
        result: ResultType::Value,
        eval: count,
    },
    Function {
        name: "match",
        params: &[ParamType::Value, ParamType::Value],
        result: ResultType::Logical,
        eval: match_,
    },
    Function {
        name: "search",
        params: &[ParamType::Value, ParamType::Value],
        result: ResultType::Logical,
        eval: search,
    },
    Function {
        name: "value",
        params: &[ParamType::Nodes],
        result: ResultType::Value,
        eval: value,
    },
];

pub fn lookup(name: &str) -> Option<&'static Function> {
    BUILTINS.iter().find(|f| f.name == name)
}

fn length(args: Vec<Outcome<'_>>) -> Outcome<'_> {
    let Some(Outcome::Value(v)) = args.into_iter().next() else {
        return Outcome::Nothing;
    };
    let len = match v.as_ref() {
        Value::String(s) => s.chars().count(),
        Value::Array(a) => a.len(),
        Value::Object(m) => m.len(),
        _ => return Outcome::Nothing,
    };
    Outcome::Value(Cow::Owned(Value::from(len)))
}

fn count(args: Vec<Outcome<'_>>) -> Outcome<'_> {
    let n = match args.into_iter().next() {
        Some(Outcome::Nodes(nodes)) => nodes.len(),
        Some(Outcome::Value(_)) => 1,
        _ => 0,
    };
    Outcome::Value(Cow::Owned(Value::from(n)))
}

fn string_pair(args: Vec<Outcome<'_>>) -> Option<(String, String)> {
    let mut it = args.into_iter();
    match (it.next(), it.next()) {
        (Some(Outcome::Value(input)), Some(Outcome::Value(pattern))) => {
            match (input.as_ref(), pattern.as_ref()) {
                (Value::String(i), Value::String(p)) => Some((i.clone(), p.clone())),
                _ => None,
            }
        }
        _ => None,
    }
}

fn match_(args: Vec<Outcome<'_>>) -> Outcome<'_> {
    let matched = string_pair(args).is_some_and(|(input, pattern)| iregexp::is_match(&input, &pattern));
    Outcome::Logical(matched)
}

fn search(args: Vec<Outcome<'_>>) -> Outcome<'_> {
    let found = string_pair(args).is_some_and(|(input, pattern)| iregexp::is_search(&input, &pattern));
    Outcome::Logical(found)
}

fn value(args: Vec<Outcome<'_>>) -> Outcome<'_> {
    match args.into_iter().next() {
        Some(Outcome::Nodes(nodes)) if nodes.len() == 1 => Outcome::Value(Cow::Borrowed(nodes[0])),
        Some(v @ Outcome::Value(_)) => v,
        _ => Outcome::Nothing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn call<'a>(name: &str, args: Vec<Outcome<'a>>) -> Outcome<'a> {
        (lookup(name).unwrap().eval)(args)
    }

    fn val(v: Value) -> Outcome<'static> {
        Outcome::Value(Cow::Owned(v))
    }

    #[test]
    fn length_counts_scalars_elements_and_members() {
        assert_eq!(call("length", vec![val(json!("héllo"))]), val(json!(5)));
        assert_eq!(call("length", vec![val(json!([1, 2]))]), val(json!(2)));
        assert_eq!(call("length", vec![val(json!({"a": 1}))]), val(json!(1)));
        assert_eq!(call("length", vec![val(json!(12))]), Outcome::Nothing);
        assert_eq!(call("length", vec![Outcome::Nothing]), Outcome::Nothing);
    }

    #[test]
    fn count_and_value_over_node_lists() {
        let a = json!(1);
        let b = json!(2);
        assert_eq!(call("count", vec![Outcome::Nodes(vec![&a, &b, &a])]), val(json!(3)));
        assert_eq!(call("count", vec![Outcome::Nodes(vec![])]), val(json!(0)));
        assert_eq!(
            call("value", vec![Outcome::Nodes(vec![&a])]),
            Outcome::Value(Cow::Borrowed(&a))
        );
        assert_eq!(call("value", vec![Outcome::Nodes(vec![&a, &b])]), Outcome::Nothing);
        assert_eq!(call("value", vec![Outcome::Nodes(vec![])]), Outcome::Nothing);
    }

    #[test]
    fn match_and_search_ignore_non_strings() {
        assert_eq!(
            call("match", vec![val(json!("1974")), val(json!("19[0-9]{2}"))]),
            Outcome::Logical(true)
        );
        assert_eq!(
            call("search", vec![val(json!("in 1974")), val(json!("19[0-9]{2}"))]),
            Outcome::Logical(true)
        );
        assert_eq!(
            call("match", vec![val(json!(1974)), val(json!("19[0-9]{2}"))]),
            Outcome::Logical(false)
        );
        assert_eq!(
            call("search", vec![Outcome::Nothing, val(json!("a"))]),
            Outcome::Logical(false)
        );
    }

    #[test]
    fn lookup_is_exact() {
        assert!(lookup("length").is_some());
        assert!(lookup("Length").is_none());
        assert!(lookup("foo").is_none());
    }
}
