//! Abstract syntax tree for compiled queries.
//!
//! Selectors and segments form a singly linked chain through [`Node::next`];
//! filter expressions hang off [`NodeKind::Filter`] as ordinary subtrees.
//! Constructors validate eagerly, so any `Node` that exists is well-typed.

use std::fmt::{self, Write};
use std::iter;
use std::str::FromStr;

use itertools::Itertools;
use serde_json::Number;

use crate::errors::{Error, ErrorKind};
use crate::functions::{Function, ParamType, ResultType};
use crate::path::write_quoted;

/// Largest integer magnitude an index or slice component may have.
pub const MAX_SAFE_INTEGER: i64 = 9_007_199_254_740_991;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl BinaryOp {
    pub fn is_comparison(self) -> bool {
        !matches!(self, BinaryOp::Or | BinaryOp::And)
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Or => "||",
            BinaryOp::And => "&&",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// `$`
    Root,
    /// `@`
    Current,
    Name(String),
    Index(i64),
    Wildcard,
    Slice {
        start: Option<i64>,
        end: Option<i64>,
        step: Option<i64>,
    },
    Filter(Box<Node>),
    /// Two or more selectors in one bracket.
    ChildSegment(Vec<Node>),
    /// `..` with the selector applied at every descendant. The continuation
    /// lives on the segment's own `next`, never on the held selector.
    Descendant(Box<Node>),
    Binary {
        op: BinaryOp,
        left: Box<Node>,
        right: Box<Node>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Node>,
    },
    Call {
        function: &'static Function,
        args: Vec<Node>,
    },
    String(String),
    Number(Number),
    Bool(bool),
    Null,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub next: Option<Box<Node>>,
    /// Written inside `( )` in the query. A group is a logical expression, so
    /// it may be tested or negated but never compared or passed as an argument.
    pub grouped: bool,
}

/// Why a node could not be constructed. The parser attaches query text and position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub kind: ErrorKind,
    pub message: String,
}

impl Rejection {
    fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

type Built = Result<Node, Rejection>;

fn check_safe(value: i64, what: &str) -> Result<i64, Rejection> {
    if (-MAX_SAFE_INTEGER..=MAX_SAFE_INTEGER).contains(&value) {
        Ok(value)
    } else {
        Err(Rejection::new(
            ErrorKind::Range,
            format!("{what} {value} is outside the range -{MAX_SAFE_INTEGER}..={MAX_SAFE_INTEGER}"),
        ))
    }
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Node {
            kind,
            next: None,
            grouped: false,
        }
    }

    pub fn grouped(mut self) -> Self {
        self.grouped = true;
        self
    }

    pub fn then(mut self, next: Option<Box<Node>>) -> Self {
        self.next = next;
        self
    }

    pub fn index(value: i64) -> Built {
        Ok(Node::new(NodeKind::Index(check_safe(value, "index")?)))
    }

    pub fn slice(start: Option<i64>, end: Option<i64>, step: Option<i64>) -> Built {
        let check = |v: Option<i64>| v.map(|v| check_safe(v, "slice bound")).transpose();
        Ok(Node::new(NodeKind::Slice {
            start: check(start)?,
            end: check(end)?,
            step: check(step)?,
        }))
    }

    pub fn filter(condition: Node) -> Built {
        if !condition.is_test_expr() {
            return Err(Rejection::new(
                ErrorKind::Type,
                format!("filter condition `{condition}` must be a comparison, a query or a logical function"),
            ));
        }
        Ok(Node::new(NodeKind::Filter(Box::new(condition))))
    }

    pub fn binary(op: BinaryOp, left: Node, right: Node) -> Built {
        if op.is_comparison() {
            for side in [&left, &right] {
                if !side.is_comparable() {
                    return Err(Rejection::new(
                        ErrorKind::Type,
                        format!("`{side}` cannot be compared, expected a literal, a singular query or a value function"),
                    ));
                }
            }
            if matches!(
                (&left.kind, &right.kind),
                (NodeKind::Bool(_), NodeKind::Bool(_))
            ) {
                return Err(Rejection::new(
                    ErrorKind::Type,
                    "a boolean literal must be compared to an expression",
                ));
            }
        } else {
            for side in [&left, &right] {
                if !side.is_test_expr() {
                    return Err(Rejection::new(
                        ErrorKind::Type,
                        format!("`{side}` is not a logical expression"),
                    ));
                }
            }
        }
        Ok(Node::new(NodeKind::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }))
    }

    pub fn not(operand: Node) -> Built {
        if !operand.is_test_expr() {
            return Err(Rejection::new(
                ErrorKind::Type,
                format!("`{operand}` cannot be negated"),
            ));
        }
        Ok(Node::new(NodeKind::Unary {
            op: UnaryOp::Not,
            operand: Box::new(operand),
        }))
    }

    pub fn call(function: &'static Function, args: Vec<Node>) -> Built {
        let name = function.name;
        if args.len() > function.params.len() {
            return Err(Rejection::new(
                ErrorKind::Type,
                format!("too many parameters for `{name}()`, expected {}", function.params.len()),
            ));
        }
        if args.len() < function.params.len() {
            return Err(Rejection::new(
                ErrorKind::Type,
                format!("not enough parameters for `{name}()`, expected {}", function.params.len()),
            ));
        }
        for (position, (param, arg)) in function.params.iter().zip(&args).enumerate() {
            let accepted = !arg.grouped
                && match param {
                    ParamType::Value => arg.is_comparable(),
                    ParamType::Nodes => arg.is_query(),
                };
            if !accepted {
                let expected = match param {
                    ParamType::Value => "a value",
                    ParamType::Nodes => "a node list",
                };
                return Err(Rejection::new(
                    ErrorKind::Type,
                    format!("argument {} of `{name}()` must be {expected}, found `{arg}`", position + 1),
                ));
            }
        }
        Ok(Node::new(NodeKind::Call { function, args }))
    }

    /// This node followed by every node reachable through `next`.
    pub fn chain(&self) -> impl Iterator<Item = &Node> {
        iter::successors(Some(self), |node| node.next.as_deref())
    }

    pub fn is_literal(&self) -> bool {
        matches!(
            self.kind,
            NodeKind::String(_) | NodeKind::Number(_) | NodeKind::Bool(_) | NodeKind::Null
        )
    }

    /// A `$` or `@` query.
    pub fn is_query(&self) -> bool {
        matches!(self.kind, NodeKind::Root | NodeKind::Current)
    }

    /// A query built from name and index selectors only.
    pub fn is_singular_query(&self) -> bool {
        self.is_query()
            && self
                .chain()
                .skip(1)
                .all(|node| matches!(node.kind, NodeKind::Name(_) | NodeKind::Index(_)))
    }

    fn is_comparable(&self) -> bool {
        if self.grouped {
            return false;
        }
        match &self.kind {
            NodeKind::Call { function, .. } => function.result == ResultType::Value,
            _ => self.is_literal() || self.is_singular_query(),
        }
    }

    fn is_test_expr(&self) -> bool {
        match &self.kind {
            NodeKind::Root | NodeKind::Current => true,
            NodeKind::Call { function, .. } => function.result == ResultType::Logical,
            NodeKind::Binary { .. } | NodeKind::Unary { .. } => true,
            _ => false,
        }
    }

    fn is_logical_op(&self, op: BinaryOp) -> bool {
        matches!(self.kind, NodeKind::Binary { op: o, .. } if o == op)
    }

    fn write_selector(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            NodeKind::Name(name) => write_quoted(f, name),
            NodeKind::Index(index) => write!(f, "{index}"),
            NodeKind::Wildcard => f.write_char('*'),
            NodeKind::Slice { start, end, step } => {
                if let Some(start) = start {
                    write!(f, "{start}")?;
                }
                f.write_char(':')?;
                if let Some(end) = end {
                    write!(f, "{end}")?;
                }
                write!(f, ":{}", step.unwrap_or(1))
            }
            NodeKind::Filter(condition) => write!(f, "?{condition}"),
            NodeKind::ChildSegment(selectors) => {
                for (i, selector) in selectors.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    selector.write_selector(f)?;
                }
                Ok(())
            }
            _ => write!(f, "{self}"),
        }
    }

    fn write_operand(&self, f: &mut fmt::Formatter<'_>, parens: bool) -> fmt::Result {
        if parens {
            write!(f, "({self})")
        } else {
            write!(f, "{self}")
        }
    }
}

/// Renders the canonical form: bracket notation, explicit slice steps,
/// single-quoted names and minimal parentheses.
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            NodeKind::Root => f.write_char('$')?,
            NodeKind::Current => f.write_char('@')?,
            NodeKind::Descendant(selector) => {
                f.write_str("..[")?;
                selector.write_selector(f)?;
                f.write_char(']')?;
            }
            NodeKind::Name(_)
            | NodeKind::Index(_)
            | NodeKind::Wildcard
            | NodeKind::Slice { .. }
            | NodeKind::Filter(_)
            | NodeKind::ChildSegment(_) => {
                f.write_char('[')?;
                self.write_selector(f)?;
                f.write_char(']')?;
            }
            NodeKind::Binary { op, left, right } => {
                // && binds tighter than ||, and both associate to the left
                let (left_parens, right_parens) = match op {
                    BinaryOp::And => (
                        left.is_logical_op(BinaryOp::Or),
                        right.is_logical_op(BinaryOp::Or) || right.is_logical_op(BinaryOp::And),
                    ),
                    BinaryOp::Or => (false, right.is_logical_op(BinaryOp::Or)),
                    _ => (false, false),
                };
                left.write_operand(f, left_parens)?;
                write!(f, " {} ", op.symbol())?;
                right.write_operand(f, right_parens)?;
            }
            NodeKind::Unary { operand, .. } => {
                f.write_char('!')?;
                let parens = matches!(operand.kind, NodeKind::Binary { .. });
                operand.write_operand(f, parens)?;
            }
            NodeKind::Call { function, args } => {
                write!(f, "{}({})", function.name, args.iter().join(", "))?;
            }
            NodeKind::String(s) => write_quoted(f, s)?,
            NodeKind::Number(n) => write!(f, "{n}")?,
            NodeKind::Bool(b) => write!(f, "{b}")?,
            NodeKind::Null => f.write_str("null")?,
        }
        match &self.next {
            Some(next) => write!(f, "{next}"),
            None => Ok(()),
        }
    }
}

/// A compiled query: the `$` node and the text it was compiled from.
#[derive(Debug, Clone)]
pub struct Query {
    pub(crate) root: Node,
    pub(crate) source: String,
}

impl Query {
    pub(crate) fn new(root: Node, source: impl Into<String>) -> Self {
        Query {
            root,
            source: source.into(),
        }
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    /// The text this query was compiled from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The selector chain flattened in application order, starting at `$`.
    pub fn nodes(&self) -> Vec<&Node> {
        self.root.chain().collect()
    }

    pub fn is_singular(&self) -> bool {
        self.root.is_singular_query()
    }

    /// The query with its last segment removed, addressing the parents of
    /// what this query matches. `None` for a bare `$`.
    pub fn parent(&self) -> Option<Query> {
        let mut root = self.root.clone();
        let mut cursor = &mut root;
        loop {
            let has_grandchild = cursor.next.as_ref()?.next.is_some();
            if !has_grandchild {
                cursor.next = None;
                break;
            }
            cursor = cursor.next.as_deref_mut()?;
        }
        let source = root.to_string();
        Some(Query::new(root, source))
    }

    pub fn to_normalized_string(&self) -> String {
        self.root.to_string()
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.root)
    }
}

impl PartialEq for Query {
    fn eq(&self, other: &Self) -> bool {
        self.to_normalized_string() == other.to_normalized_string()
    }
}

impl FromStr for Query {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        crate::compile(s)
    }
}
