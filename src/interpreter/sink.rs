//! Terminal strategies for the evaluation modes.
//!
//! The interpreter chain is identical in every mode; what happens to a final
//! match is decided by the [`Sink`] it is handed. Mutating modes only record
//! locations during the read pass and touch the input once it is over.

use std::collections::HashSet;

use serde_json::Value;

use crate::path::{self, Key, NodeRef};

pub(crate) trait Sink<'a> {
    fn accept(&mut self, node: NodeRef<'a>);
}

impl<'a> Sink<'a> for Vec<NodeRef<'a>> {
    fn accept(&mut self, node: NodeRef<'a>) {
        self.push(node);
    }
}

/// Read-only search: collects matched values.
#[derive(Default)]
pub(crate) struct Collect<'a>(pub Vec<&'a Value>);

impl<'a> Sink<'a> for Collect<'a> {
    fn accept(&mut self, node: NodeRef<'a>) {
        self.0.push(node.value());
    }
}

/// Iteration: hands every match to a callback.
pub(crate) struct Visit<F>(pub F);

impl<'a, F> Sink<'a> for Visit<F>
where
    F: FnMut(NodeRef<'a>),
{
    fn accept(&mut self, node: NodeRef<'a>) {
        (self.0)(node);
    }
}

/// Mutation: records the location and value of every match the predicate accepts.
pub(crate) struct Mark<P> {
    predicate: P,
    marks: Vec<(Vec<Key>, Value)>,
}

impl<P> Mark<P>
where
    P: FnMut(&NodeRef<'_>) -> bool,
{
    pub(crate) fn new(predicate: P) -> Self {
        Mark {
            predicate,
            marks: Vec::new(),
        }
    }

    /// Distinct marked locations in match order.
    pub(crate) fn into_marks(self) -> Vec<(Vec<Key>, Value)> {
        let mut seen = HashSet::new();
        self.marks
            .into_iter()
            .filter(|(keys, _)| seen.insert(keys.clone()))
            .collect()
    }
}

impl<'a, P> Sink<'a> for Mark<P>
where
    P: FnMut(&NodeRef<'_>) -> bool,
{
    fn accept(&mut self, node: NodeRef<'a>) {
        if (self.predicate)(&node) {
            self.marks.push((node.keys(), node.value().clone()));
        }
    }
}

// Deepest and highest-index locations first, so earlier removals never shift later ones
fn descending(marks: &[(Vec<Key>, Value)]) -> Vec<&[Key]> {
    let mut order: Vec<&[Key]> = marks.iter().map(|(keys, _)| keys.as_slice()).collect();
    order.sort_unstable_by(|a, b| b.cmp(a));
    order
}

/// Removes every marked node from `input`, returning the removed values in
/// match order. The root has no container and is never removed.
pub(crate) fn remove_marked(input: &mut Value, marks: Vec<(Vec<Key>, Value)>) -> Vec<Value> {
    let marks: Vec<_> = marks.into_iter().filter(|(keys, _)| !keys.is_empty()).collect();
    for keys in descending(&marks) {
        let removed = path::remove(input, keys);
        tracing::trace!(?keys, removed = removed.is_some(), "delete");
    }
    marks.into_iter().map(|(_, value)| value).collect()
}

/// Replaces every marked node with `f(old)`, returning how many were replaced.
pub(crate) fn replace_marked<F>(input: &mut Value, marks: Vec<(Vec<Key>, Value)>, mut f: F) -> usize
where
    F: FnMut(Value) -> Value,
{
    let mut replaced = 0;
    for keys in descending(&marks) {
        if let Some(target) = path::pointer_mut(input, keys) {
            let old = target.take();
            *target = f(old);
            replaced += 1;
        }
    }
    replaced
}

/// Where an inserted value goes inside each container.
pub(crate) enum Slot<'q> {
    Member(&'q str),
    Position(i64),
}

/// Adds a clone of `value` at `slot` in every container addressed by
/// `containers`, deepest first. Returns how many containers took it.
pub(crate) fn insert_marked(input: &mut Value, mut containers: Vec<Vec<Key>>, slot: Slot<'_>, value: &Value) -> usize {
    containers.sort_unstable_by(|a, b| b.cmp(a));
    containers.dedup();
    let mut inserted = 0;
    for keys in &containers {
        let done = match (path::pointer_mut(input, keys), &slot) {
            (Some(Value::Object(map)), Slot::Member(name)) if !map.contains_key(*name) => {
                map.insert((*name).to_owned(), value.clone());
                true
            }
            (Some(Value::Array(items)), Slot::Position(index)) => match position(items.len(), *index) {
                Some(at) => {
                    items.insert(at, value.clone());
                    true
                }
                None => false,
            },
            _ => false,
        };
        tracing::trace!(?keys, inserted = done, "insert");
        inserted += usize::from(done);
    }
    inserted
}

// The index the new item will occupy; negative counts from one past the end
fn position(len: usize, index: i64) -> Option<usize> {
    let len = len as i64;
    let at = if index >= 0 { index } else { len + 1 + index };
    (0..=len).contains(&at).then_some(at as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn key(name: &str) -> Key {
        Key::Name(name.to_owned())
    }

    #[test]
    fn removal_runs_highest_index_first() {
        let mut doc = json!(["a", "b", "c", "d"]);
        let marks = vec![
            (vec![Key::Index(0)], json!("a")),
            (vec![Key::Index(2)], json!("c")),
            (vec![Key::Index(3)], json!("d")),
        ];
        assert_eq!(remove_marked(&mut doc, marks), vec![json!("a"), json!("c"), json!("d")]);
        assert_eq!(doc, json!(["b"]));
    }

    #[test]
    fn descendants_go_before_ancestors() {
        let mut doc = json!({"a": {"b": [1, 2]}});
        let marks = vec![
            (vec![key("a")], json!({"b": [1, 2]})),
            (vec![key("a"), key("b"), Key::Index(1)], json!(2)),
        ];
        remove_marked(&mut doc, marks);
        assert_eq!(doc, json!({}));
    }

    #[test]
    fn duplicate_marks_collapse() {
        let doc = json!([1]);
        let mut mark = Mark::new(|_: &NodeRef<'_>| true);
        let root = NodeRef::root(&doc);
        let child = root.child(crate::path::PathElement::Index(0), &doc[0]);
        mark.accept(child.clone());
        mark.accept(child);
        assert_eq!(mark.into_marks().len(), 1);
    }

    #[test]
    fn root_can_be_replaced_but_not_removed() {
        let mut doc = json!(1);
        assert_eq!(remove_marked(&mut doc, vec![(vec![], json!(1))]), Vec::<Value>::new());
        assert_eq!(replace_marked(&mut doc, vec![(vec![], json!(1))], |_| json!(2)), 1);
        assert_eq!(doc, json!(2));
    }

    #[test]
    fn insert_positions_count_from_either_end() {
        assert_eq!(position(2, 0), Some(0));
        assert_eq!(position(2, 2), Some(2));
        assert_eq!(position(2, 3), None);
        assert_eq!(position(2, -1), Some(2));
        assert_eq!(position(2, -3), Some(0));
        assert_eq!(position(2, -4), None);
    }

    #[test]
    fn nested_containers_are_filled_deepest_first() {
        let mut doc = json!([[1]]);
        let containers = vec![vec![], vec![Key::Index(0)], vec![]];
        assert_eq!(insert_marked(&mut doc, containers, Slot::Position(0), &json!(0)), 2);
        assert_eq!(doc, json!([0, [0, 1]]));
    }

    #[test]
    fn existing_members_are_kept() {
        let mut doc = json!({"a": 1, "b": {}});
        let containers = vec![vec![], vec![key("b")], vec![key("a")]];
        assert_eq!(insert_marked(&mut doc, containers, Slot::Member("a"), &json!(2)), 1);
        assert_eq!(doc, json!({"a": 1, "b": {"a": 2}}));
    }
}
