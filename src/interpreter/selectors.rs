//! Per-selector semantics over a single input node.

use serde_json::Value;

use crate::path::{NodeRef, PathElement};

pub(crate) fn name<'a>(node: &NodeRef<'a>, name: &str) -> Option<NodeRef<'a>> {
    let Value::Object(map) = node.value() else {
        return None;
    };
    let (key, value) = map.get_key_value(name)?;
    Some(node.child(PathElement::Name(key), value))
}

pub(crate) fn index<'a>(node: &NodeRef<'a>, index: i64) -> Option<NodeRef<'a>> {
    let Value::Array(items) = node.value() else {
        return None;
    };
    let len = items.len() as i64;
    let normalized = if index < 0 { len + index } else { index };
    if !(0..len).contains(&normalized) {
        return None;
    }
    let i = normalized as usize;
    Some(node.child(PathElement::Index(i), &items[i]))
}

/// Array elements in order, or object members in map order; nothing for scalars.
pub(crate) fn children<'a>(node: &NodeRef<'a>) -> Vec<NodeRef<'a>> {
    match node.value() {
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| node.child(PathElement::Index(i), item))
            .collect(),
        Value::Object(map) => map
            .iter()
            .map(|(key, item)| node.child(PathElement::Name(key), item))
            .collect(),
        _ => Vec::new(),
    }
}

pub(crate) fn slice<'a>(
    node: &NodeRef<'a>,
    start: Option<i64>,
    end: Option<i64>,
    step: Option<i64>,
) -> Vec<NodeRef<'a>> {
    let Value::Array(items) = node.value() else {
        return Vec::new();
    };
    slice_indices(items.len(), start, end, step)
        .into_iter()
        .map(|i| node.child(PathElement::Index(i), &items[i]))
        .collect()
}

/// Indices selected by `[start:end:step]` on an array of `len` elements.
///
/// Defaults depend on the sign of `step` and are resolved against `len`
/// here, never at parse time. A zero step selects nothing.
pub fn slice_indices(len: usize, start: Option<i64>, end: Option<i64>, step: Option<i64>) -> Vec<usize> {
    let step = step.unwrap_or(1);
    if step == 0 || len == 0 {
        return Vec::new();
    }
    let len = len as i64;
    let normalize = |i: i64| if i >= 0 { i } else { len + i };

    let mut out = Vec::new();
    if step > 0 {
        let lower = normalize(start.unwrap_or(0)).clamp(0, len);
        let upper = normalize(end.unwrap_or(len)).clamp(0, len);
        let mut i = lower;
        while i < upper {
            out.push(i as usize);
            i += step;
        }
    } else {
        let upper = normalize(start.unwrap_or(len - 1)).clamp(-1, len - 1);
        let lower = normalize(end.unwrap_or(-len - 1)).clamp(-1, len - 1);
        let mut i = upper;
        while lower < i {
            out.push(i as usize);
            i += step;
        }
    }
    out
}
