//! Locations of matched nodes and their normalized path strings.

use std::fmt::{self, Write};
use std::rc::Rc;

use serde_json::Value;

/// One step from a container to a child, borrowing the member name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathElement<'a> {
    Name(&'a str),
    Index(usize),
}

/// Owned form of [`PathElement`], used once the borrow of the input has ended.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Key {
    Name(String),
    Index(usize),
}

impl From<PathElement<'_>> for Key {
    fn from(element: PathElement<'_>) -> Self {
        match element {
            PathElement::Name(name) => Key::Name(name.to_owned()),
            PathElement::Index(index) => Key::Index(index),
        }
    }
}

impl fmt::Display for PathElement<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_char('[')?;
        match self {
            PathElement::Name(name) => write_quoted(f, name)?,
            PathElement::Index(index) => write!(f, "{index}")?,
        }
        f.write_char(']')
    }
}

/// Writes `name` single-quoted with the normalized-path escapes.
pub fn write_quoted<W: Write>(out: &mut W, name: &str) -> fmt::Result {
    out.write_char('\'')?;
    for c in name.chars() {
        match c {
            '\u{8}' => out.write_str(r"\b")?,
            '\u{c}' => out.write_str(r"\f")?,
            '\n' => out.write_str(r"\n")?,
            '\r' => out.write_str(r"\r")?,
            '\t' => out.write_str(r"\t")?,
            '\'' => out.write_str(r"\'")?,
            '\\' => out.write_str(r"\\")?,
            c if c < '\u{20}' => write!(out, "\\u{:04x}", c as u32)?,
            c => out.write_char(c)?,
        }
    }
    out.write_char('\'')
}

#[derive(Debug)]
struct Link<'a> {
    element: PathElement<'a>,
    up: Trail<'a>,
}

/// Persistent list of path elements from the root, shared between siblings.
#[derive(Debug, Clone, Default)]
pub struct Trail<'a>(Option<Rc<Link<'a>>>);

impl<'a> Trail<'a> {
    pub fn push(&self, element: PathElement<'a>) -> Self {
        Trail(Some(Rc::new(Link {
            element,
            up: self.clone(),
        })))
    }

    pub fn last(&self) -> Option<PathElement<'a>> {
        self.0.as_ref().map(|link| link.element)
    }

    /// Elements ordered from the root down.
    pub fn elements(&self) -> Vec<PathElement<'a>> {
        let mut out = Vec::new();
        let mut cursor = &self.0;
        while let Some(link) = cursor {
            out.push(link.element);
            cursor = &link.up.0;
        }
        out.reverse();
        out
    }

    pub fn keys(&self) -> Vec<Key> {
        self.elements().into_iter().map(Key::from).collect()
    }

    pub fn normalized(&self) -> String {
        let mut out = String::from("$");
        for element in self.elements() {
            // writing into a String cannot fail
            let _ = write!(out, "{element}");
        }
        out
    }
}

/// A matched node together with where it was found.
///
/// Handed to [`Query::each`](crate::Query::each) and
/// [`Query::delete_if`](crate::Query::delete_if) callbacks. The normalized
/// path is only rendered when [`NodeRef::path`] is called.
#[derive(Debug, Clone)]
pub struct NodeRef<'a> {
    value: &'a Value,
    parent: Option<&'a Value>,
    trail: Trail<'a>,
}

impl<'a> NodeRef<'a> {
    pub(crate) fn root(value: &'a Value) -> Self {
        NodeRef {
            value,
            parent: None,
            trail: Trail::default(),
        }
    }

    pub(crate) fn child(&self, element: PathElement<'a>, value: &'a Value) -> Self {
        NodeRef {
            value,
            parent: Some(self.value),
            trail: self.trail.push(element),
        }
    }

    pub fn value(&self) -> &'a Value {
        self.value
    }

    /// The containing array or object; `None` for the root.
    pub fn parent(&self) -> Option<&'a Value> {
        self.parent
    }

    /// Member name or array index within the parent; `None` for the root.
    pub fn key(&self) -> Option<PathElement<'a>> {
        self.trail.last()
    }

    /// Normalized path such as `$['a'][0]`.
    pub fn path(&self) -> String {
        self.trail.normalized()
    }

    pub(crate) fn keys(&self) -> Vec<Key> {
        self.trail.keys()
    }
}

/// Mutable access to the node addressed by `keys`.
pub(crate) fn pointer_mut<'v>(mut value: &'v mut Value, keys: &[Key]) -> Option<&'v mut Value> {
    for key in keys {
        value = match (key, value) {
            (Key::Name(name), Value::Object(map)) => map.get_mut(name)?,
            (Key::Index(index), Value::Array(items)) => items.get_mut(*index)?,
            _ => return None,
        };
    }
    Some(value)
}

/// Detaches the node addressed by `keys` from its container.
pub(crate) fn remove(root: &mut Value, keys: &[Key]) -> Option<Value> {
    let (last, parents) = keys.split_last()?;
    match (last, pointer_mut(root, parents)?) {
        (Key::Name(name), Value::Object(map)) => map.remove(name),
        (Key::Index(index), Value::Array(items)) if *index < items.len() => Some(items.remove(*index)),
        _ => None,
    }
}
