use serde_json::Value;

use crate::ast::{NodeKind, Query};
use crate::context::Context;
use crate::interpreter::sink::{self, Collect, Mark, Sink, Slot, Visit};
use crate::interpreter::Step;
use crate::path::NodeRef;

/// =========================
/// Read-only evaluation
/// =========================

impl Query {
    // Each call gets a private interpreter tree; the query itself stays shared
    fn run<'a>(&self, input: &'a Value, sink: &mut dyn Sink<'a>) {
        let chain = Step::build(&self.root);
        tracing::trace!(query = %self, "built interpreter");
        chain.run(NodeRef::root(input), &Context::new(input), sink);
    }

    /// Values matched by this query, in match order.
    pub fn search<'a>(&self, input: &'a Value) -> Vec<&'a Value> {
        let mut collect = Collect::default();
        self.run(input, &mut collect);
        collect.0
    }

    /// Calls `f` once per match with the value, its parent, key and path.
    pub fn each<'a, F>(&self, input: &'a Value, f: F)
    where
        F: FnMut(NodeRef<'a>),
    {
        self.run(input, &mut Visit(f));
    }

    /// Matches paired with their normalized paths.
    pub fn locate<'a>(&self, input: &'a Value) -> Vec<(String, &'a Value)> {
        let mut found: Vec<NodeRef<'a>> = Vec::new();
        self.run(input, &mut found);
        found.iter().map(|node| (node.path(), node.value())).collect()
    }
}

/// =========================
/// Mutating evaluation
/// =========================

impl Query {
    /// Removes every match from `input` and returns the removed values.
    pub fn delete(&self, input: &mut Value) -> Vec<Value> {
        self.delete_if(input, |_| true)
    }

    /// Removes the matches `predicate` accepts.
    ///
    /// Matches are gathered in one read pass before anything is removed, so
    /// the predicate always sees the original document. A location matched
    /// twice is removed once.
    pub fn delete_if<P>(&self, input: &mut Value, predicate: P) -> Vec<Value>
    where
        P: FnMut(&NodeRef<'_>) -> bool,
    {
        let marks = {
            let mut mark = Mark::new(predicate);
            self.run(input, &mut mark);
            mark.into_marks()
        };
        sink::remove_marked(input, marks)
    }

    /// Replaces each match with `f(old)`. Returns the number of replaced nodes.
    pub fn replace_with<F>(&self, input: &mut Value, f: F) -> usize
    where
        F: FnMut(Value) -> Value,
    {
        let marks = {
            let mut mark = Mark::new(|_: &NodeRef<'_>| true);
            self.run(input, &mut mark);
            mark.into_marks()
        };
        sink::replace_marked(input, marks, f)
    }

    /// Adds `value` at the location this query names inside every parent it
    /// reaches. Returns the number of insertions.
    ///
    /// Only a query ending in a name or index selector names a location. A
    /// name is added to objects that lack it, leaving existing members alone.
    /// An index is inserted into arrays, shifting later items; `-1` appends.
    /// Parents of the wrong type, and indices past the end, are skipped.
    pub fn insert(&self, input: &mut Value, value: Value) -> usize {
        let slot = match self.root.chain().last().map(|node| &node.kind) {
            Some(NodeKind::Name(name)) => Slot::Member(name),
            Some(NodeKind::Index(index)) => Slot::Position(*index),
            _ => return 0,
        };
        let Some(parent) = self.parent() else {
            return 0;
        };
        let containers = {
            let mut found: Vec<NodeRef<'_>> = Vec::new();
            parent.run(input, &mut found);
            found.iter().map(NodeRef::keys).collect()
        };
        sink::insert_marked(input, containers, slot, &value)
    }
}

#[cfg(test)]
mod tests {
    use crate::compile;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};

    #[test]
    fn search_and_locate_agree() {
        let doc = json!({"a": [10, 20], "b": {"a": 30}});
        let query = compile("$..a").unwrap();
        let values: Vec<&Value> = query.search(&doc);
        let located = query.locate(&doc);
        assert_eq!(values, located.iter().map(|(_, v)| *v).collect::<Vec<_>>());
        assert_eq!(located[0].0, "$['a']");
    }

    #[test]
    fn each_exposes_parent_and_key() {
        let doc = json!({"list": ["x", "y"]});
        let query = compile("$.list[1]").unwrap();
        let mut seen = Vec::new();
        query.each(&doc, |node| {
            seen.push((
                node.value().clone(),
                node.parent().cloned(),
                node.key().map(|k| k.to_string()),
            ));
        });
        assert_eq!(seen, vec![(json!("y"), Some(json!(["x", "y"])), Some("[1]".to_owned()))]);
    }

    #[test]
    fn delete_if_sees_the_original_document() {
        let mut doc = json!([1, 2, 3, 4]);
        let query = compile("$[*]").unwrap();
        let removed = query.delete_if(&mut doc, |node| node.value().as_i64().is_some_and(|n| n % 2 == 0));
        assert_eq!(removed, vec![json!(2), json!(4)]);
        assert_eq!(doc, json!([1, 3]));
    }

    #[test]
    fn replace_with_counts_replacements() {
        let mut doc = json!({"a": 1, "b": {"a": 2}});
        let query = compile("$..a").unwrap();
        let n = query.replace_with(&mut doc, |old| json!(old.as_i64().unwrap_or(0) * 10));
        assert_eq!(n, 2);
        assert_eq!(doc, json!({"a": 10, "b": {"a": 20}}));
    }

    #[test]
    fn insert_needs_a_final_name_or_index() {
        let mut doc = json!({"a": [1]});
        assert_eq!(compile("$").unwrap().insert(&mut doc, json!(0)), 0);
        assert_eq!(compile("$.a[*]").unwrap().insert(&mut doc, json!(0)), 0);
        assert_eq!(compile("$..b").unwrap().insert(&mut doc, json!(0)), 0);
        assert_eq!(doc, json!({"a": [1]}));
        assert_eq!(compile("$.b").unwrap().insert(&mut doc, json!(0)), 1);
        assert_eq!(doc, json!({"a": [1], "b": 0}));
    }
}
