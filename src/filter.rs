use std::borrow::Cow;

use serde_json::Value;

use crate::ast::{BinaryOp, Node, NodeKind};
use crate::comparison::compare;
use crate::context::Context;
use crate::functions::{Function, ParamType};
use crate::interpreter::sink::Collect;
use crate::interpreter::Step;
use crate::path::NodeRef;

/// Result of evaluating one filter sub-expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<'a> {
    Nodes(Vec<&'a Value>),
    Value(Cow<'a, Value>),
    /// Absence of a value, distinct from JSON `null`.
    Nothing,
    Logical(bool),
}

impl<'a> Outcome<'a> {
    pub fn is_truthy(&self) -> bool {
        match self {
            Outcome::Logical(b) => *b,
            Outcome::Nodes(nodes) => !nodes.is_empty(),
            Outcome::Nothing => false,
            Outcome::Value(_) => true,
        }
    }

    /// Reduces a node list to its single value, or NOTHING when empty.
    fn into_value(self) -> Outcome<'a> {
        match self {
            Outcome::Nodes(nodes) => {
                debug_assert!(nodes.len() <= 1, "singular query produced {} nodes", nodes.len());
                match nodes.first() {
                    Some(&node) => Outcome::Value(Cow::Borrowed(node)),
                    None => Outcome::Nothing,
                }
            }
            other => other,
        }
    }

    fn into_comparable(self) -> Option<Cow<'a, Value>> {
        match self.into_value() {
            Outcome::Value(v) => Some(v),
            Outcome::Logical(b) => Some(Cow::Owned(Value::Bool(b))),
            _ => None,
        }
    }
}

/// Interpreter for a filter expression, built once per evaluation session.
#[derive(Debug, Clone)]
pub(crate) enum ExprStep<'q> {
    Literal(Value),
    Query(Box<Step<'q>>),
    Binary {
        op: BinaryOp,
        left: Box<ExprStep<'q>>,
        right: Box<ExprStep<'q>>,
    },
    Not(Box<ExprStep<'q>>),
    Call {
        function: &'static Function,
        args: Vec<ExprStep<'q>>,
    },
}

impl<'q> ExprStep<'q> {
    pub(crate) fn build(node: &'q Node) -> ExprStep<'q> {
        match &node.kind {
            NodeKind::Root | NodeKind::Current => ExprStep::Query(Box::new(Step::build(node))),
            NodeKind::Binary { op, left, right } => ExprStep::Binary {
                op: *op,
                left: Box::new(ExprStep::build(left)),
                right: Box::new(ExprStep::build(right)),
            },
            NodeKind::Unary { operand, .. } => ExprStep::Not(Box::new(ExprStep::build(operand))),
            NodeKind::Call { function, args } => ExprStep::Call {
                function: *function,
                args: args.iter().map(ExprStep::build).collect(),
            },
            NodeKind::String(s) => ExprStep::Literal(Value::String(s.clone())),
            NodeKind::Number(n) => ExprStep::Literal(Value::Number(n.clone())),
            NodeKind::Bool(b) => ExprStep::Literal(Value::Bool(*b)),
            NodeKind::Null => ExprStep::Literal(Value::Null),
            NodeKind::Name(_)
            | NodeKind::Index(_)
            | NodeKind::Wildcard
            | NodeKind::Slice { .. }
            | NodeKind::Filter(_)
            | NodeKind::ChildSegment(_)
            | NodeKind::Descendant(_) => unreachable!("selector outside of a query in a filter"),
        }
    }

    /// Whether `current` passes this filter.
    pub(crate) fn test<'r>(&'r self, current: &'r Value, cx: &Context<'r>) -> bool {
        self.evaluate(current, cx).is_truthy()
    }

    pub(crate) fn evaluate<'r>(&'r self, current: &'r Value, cx: &Context<'r>) -> Outcome<'r> {
        match self {
            ExprStep::Literal(value) => Outcome::Value(Cow::Borrowed(value)),
            ExprStep::Query(chain) => {
                let mut collect = Collect::default();
                chain.run(NodeRef::root(current), cx, &mut collect);
                Outcome::Nodes(collect.0)
            }
            ExprStep::Binary { op: BinaryOp::And, left, right } => {
                Outcome::Logical(left.test(current, cx) && right.test(current, cx))
            }
            ExprStep::Binary { op: BinaryOp::Or, left, right } => {
                Outcome::Logical(left.test(current, cx) || right.test(current, cx))
            }
            ExprStep::Binary { op, left, right } => {
                let l = left.evaluate(current, cx).into_comparable();
                let r = right.evaluate(current, cx).into_comparable();
                Outcome::Logical(compare(*op, l.as_deref(), r.as_deref()))
            }
            ExprStep::Not(operand) => Outcome::Logical(!operand.test(current, cx)),
            ExprStep::Call { function, args } => {
                let values: Vec<Outcome<'r>> = function
                    .params
                    .iter()
                    .zip(args)
                    .map(|(param, arg)| {
                        let outcome = arg.evaluate(current, cx);
                        match param {
                            ParamType::Value => outcome.into_value(),
                            ParamType::Nodes => outcome,
                        }
                    })
                    .collect();
                (function.eval)(values)
            }
        }
    }
}
