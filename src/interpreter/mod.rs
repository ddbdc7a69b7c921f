//! The interpreter tree evaluated against live data.
//!
//! [`Step::build`] mirrors the AST chain one node at a time. Every child
//! segment with several selectors becomes a [`StepKind::Branch`] whose
//! selectors each own a private copy of the downstream chain, so per-result
//! context (parent, path) flows through each branch independently.

use serde_json::Value;

use crate::ast::{Node, NodeKind};
use crate::context::Context;
use crate::filter::ExprStep;
use crate::path::{NodeRef, PathElement};

pub(crate) mod selectors;
pub(crate) mod sink;

use sink::Sink;

#[derive(Debug, Clone)]
pub(crate) struct Step<'q> {
    kind: StepKind<'q>,
    next: Option<Box<Step<'q>>>,
}

#[derive(Debug, Clone)]
pub(crate) enum StepKind<'q> {
    Root,
    Current,
    Name(&'q str),
    Index(i64),
    Wildcard,
    Slice {
        start: Option<i64>,
        end: Option<i64>,
        step: Option<i64>,
    },
    Filter(ExprStep<'q>),
    Branch(Vec<Step<'q>>),
    Descend(Box<Step<'q>>),
}

impl<'q> Step<'q> {
    /// Builds the interpreter for the chain starting at `head`.
    pub(crate) fn build(head: &'q Node) -> Step<'q> {
        let chain: Vec<&Node> = head.chain().collect();
        let tail = chain
            .iter()
            .skip(1)
            .rev()
            .fold(None, |tail, node| Some(Box::new(Step::link(node, tail))));
        Step::link(head, tail)
    }

    // Attaches `tail` after `node`; a child segment hands each selector its own copy
    fn link(node: &'q Node, tail: Option<Box<Step<'q>>>) -> Step<'q> {
        match &node.kind {
            NodeKind::ChildSegment(selectors) => {
                let branches = selectors
                    .iter()
                    .map(|selector| Step::link(selector, tail.clone()))
                    .collect();
                Step {
                    kind: StepKind::Branch(branches),
                    next: None,
                }
            }
            _ => Step {
                kind: Step::kind_of(node),
                next: tail,
            },
        }
    }

    fn kind_of(node: &'q Node) -> StepKind<'q> {
        match &node.kind {
            NodeKind::Root => StepKind::Root,
            NodeKind::Current => StepKind::Current,
            NodeKind::Name(name) => StepKind::Name(name),
            NodeKind::Index(index) => StepKind::Index(*index),
            NodeKind::Wildcard => StepKind::Wildcard,
            NodeKind::Slice { start, end, step } => StepKind::Slice {
                start: *start,
                end: *end,
                step: *step,
            },
            NodeKind::Filter(condition) => StepKind::Filter(ExprStep::build(condition)),
            NodeKind::Descendant(selector) => {
                StepKind::Descend(Box::new(Step::link(selector, None)))
            }
            NodeKind::ChildSegment(_) => unreachable!("child segments are linked as branches"),
            NodeKind::Binary { .. }
            | NodeKind::Unary { .. }
            | NodeKind::Call { .. }
            | NodeKind::String(_)
            | NodeKind::Number(_)
            | NodeKind::Bool(_)
            | NodeKind::Null => unreachable!("expression node in a selector chain"),
        }
    }

    /// Feeds `node` through this step and everything after it, handing
    /// final results to `sink`.
    pub(crate) fn run<'a>(&self, node: NodeRef<'a>, cx: &Context<'a>, sink: &mut dyn Sink<'a>) {
        match &self.kind {
            StepKind::Root => self.forward(NodeRef::root(cx.root), cx, sink),
            StepKind::Current => self.forward(node, cx, sink),
            StepKind::Branch(branches) => {
                for branch in branches {
                    branch.run(node.clone(), cx, sink);
                }
            }
            StepKind::Descend(selector) => {
                let mut found: Vec<NodeRef<'a>> = Vec::new();
                descend(selector, node, cx, &mut found);
                for matched in found {
                    self.forward(matched, cx, sink);
                }
            }
            StepKind::Name(name) => {
                if let Some(found) = selectors::name(&node, name) {
                    self.forward(found, cx, sink);
                }
            }
            StepKind::Index(index) => {
                if let Some(found) = selectors::index(&node, *index) {
                    self.forward(found, cx, sink);
                }
            }
            StepKind::Wildcard => {
                for child in selectors::children(&node) {
                    self.forward(child, cx, sink);
                }
            }
            StepKind::Slice { start, end, step } => {
                for found in selectors::slice(&node, *start, *end, *step) {
                    self.forward(found, cx, sink);
                }
            }
            StepKind::Filter(condition) => {
                for child in selectors::children(&node) {
                    if condition.test(child.value(), cx) {
                        self.forward(child, cx, sink);
                    }
                }
            }
        }
    }

    fn forward<'a>(&self, node: NodeRef<'a>, cx: &Context<'a>, sink: &mut dyn Sink<'a>) {
        match &self.next {
            Some(next) => next.run(node, cx, sink),
            None => sink.accept(node),
        }
    }
}

// Pre-order: the selector runs at `node` before any of its descendants
fn descend<'a>(selector: &Step<'_>, node: NodeRef<'a>, cx: &Context<'a>, found: &mut Vec<NodeRef<'a>>) {
    selector.run(node.clone(), cx, found);
    match node.value() {
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                descend(selector, node.child(PathElement::Index(i), item), cx, found);
            }
        }
        Value::Object(map) => {
            for (key, item) in map {
                descend(selector, node.child(PathElement::Name(key), item), cx, found);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn branch_count(step: &Step<'_>) -> usize {
        match &step.kind {
            StepKind::Branch(branches) => branches.len(),
            _ => 0,
        }
    }

    fn depth(step: &Step<'_>) -> usize {
        1 + step.next.as_deref().map_or(0, depth)
    }

    #[test]
    fn child_segments_copy_the_suffix_onto_each_branch() {
        let query = compile("$['a','b'][0]['c','d'].e").unwrap();
        let root = Step::build(&query.root);
        let segment = root.next.as_deref().unwrap();
        assert_eq!(branch_count(segment), 2);
        assert!(segment.next.is_none());
        let StepKind::Branch(branches) = &segment.kind else {
            panic!("expected a branch")
        };
        for branch in branches {
            // name, [0], inner branch
            assert_eq!(depth(branch), 3);
            let inner = branch.next.as_deref().and_then(|s| s.next.as_deref()).unwrap();
            assert_eq!(branch_count(inner), 2);
        }
    }

    #[test]
    fn descendant_selector_has_no_continuation() {
        let query = compile("$..['x','y'].z").unwrap();
        let root = Step::build(&query.root);
        let segment = root.next.as_deref().unwrap();
        let StepKind::Descend(selector) = &segment.kind else {
            panic!("expected a descendant step")
        };
        assert_eq!(branch_count(selector), 2);
        assert!(segment.next.is_some());
    }

    #[test]
    fn branches_keep_their_own_paths() {
        let doc = json!({"a": {"e": 1}, "b": {"e": 2}});
        let query = compile("$['a','b'].e").unwrap();
        let mut paths = Vec::new();
        query.each(&doc, |node| paths.push(node.path()));
        assert_eq!(paths, vec!["$['a']['e']", "$['b']['e']"]);
    }
}
