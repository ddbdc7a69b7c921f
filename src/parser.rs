//! Recursive-descent parser with precedence climbing for filter expressions.

use serde_json::Number;

use crate::ast::{BinaryOp, Node, NodeKind, Query, Rejection};
use crate::errors::{Error, ErrorKind, Result};
use crate::functions;
use crate::token::{Literal, Token, TokenKind};

/// Binding power of infix operators, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Precedence {
    Lowest,
    Or,
    And,
    Comparison,
    Prefix,
}

fn infix(kind: TokenKind) -> Option<(BinaryOp, Precedence)> {
    let op = match kind {
        TokenKind::Or => BinaryOp::Or,
        TokenKind::And => BinaryOp::And,
        TokenKind::Eq => BinaryOp::Eq,
        TokenKind::Ne => BinaryOp::Ne,
        TokenKind::Lt => BinaryOp::Lt,
        TokenKind::Le => BinaryOp::Le,
        TokenKind::Gt => BinaryOp::Gt,
        TokenKind::Ge => BinaryOp::Ge,
        _ => return None,
    };
    let precedence = match op {
        BinaryOp::Or => Precedence::Or,
        BinaryOp::And => Precedence::And,
        _ => Precedence::Comparison,
    };
    Some((op, precedence))
}

/// Builds a [`Query`] from the token sequence produced by [`crate::lexer::lex`].
pub fn parse<'s>(source: &'s str, tokens: Vec<Token<'s>>) -> Result<Query> {
    let mut parser = Parser::new(source, tokens);
    let root = parser.parse_query()?;
    Ok(Query::new(root, source))
}

pub struct Parser<'s> {
    source: &'s str,
    tokens: Vec<Token<'s>>,
    position: usize,
}

impl<'s> Parser<'s> {
    pub fn new(source: &'s str, mut tokens: Vec<Token<'s>>) -> Self {
        if tokens.last().map(|t| t.kind) != Some(TokenKind::Eof) {
            let end = source.chars().count();
            tokens.push(Token::new(TokenKind::Eof, "", (end, 0)));
        }
        Parser {
            source,
            tokens,
            position: 0,
        }
    }

    fn current(&self) -> &Token<'s> {
        &self.tokens[self.position.min(self.tokens.len() - 1)]
    }

    fn kind(&self) -> TokenKind {
        self.current().kind
    }

    fn previous(&self) -> Option<&Token<'s>> {
        self.position.checked_sub(1).map(|i| &self.tokens[i])
    }

    fn advance(&mut self) -> Token<'s> {
        let token = self.current().clone();
        if self.position < self.tokens.len() - 1 {
            self.position += 1;
        }
        token
    }

    fn error_at(&self, kind: ErrorKind, message: impl Into<String>, token: &Token<'_>) -> Error {
        Error::new(kind, message, self.source).at(token.span.0, token.span.1.max(1))
    }

    fn error(&self, kind: ErrorKind, message: impl Into<String>) -> Error {
        self.error_at(kind, message, self.current())
    }

    fn reject(&self, rejection: Rejection, token: &Token<'_>) -> Error {
        self.error_at(rejection.kind, rejection.message, token)
    }

    fn describe(token: &Token<'_>) -> String {
        match token.kind {
            TokenKind::Eof => "end of query".to_owned(),
            _ => format!("`{}`", token.lexeme),
        }
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<Token<'s>> {
        if self.kind() == kind {
            Ok(self.advance())
        } else {
            let found = Self::describe(self.current());
            Err(self.error(ErrorKind::Parse, format!("expected {what}, found {found}")))
        }
    }

    fn parse_query(&mut self) -> Result<Node> {
        self.expect(TokenKind::Root, "`$` at the start of the query")?;
        let next = self.parse_segments()?;
        if self.kind() != TokenKind::Eof {
            let found = Self::describe(self.current());
            return Err(self.error(ErrorKind::Parse, format!("unexpected {found}")));
        }
        Ok(Node::new(NodeKind::Root).then(next))
    }

    /// Parses the segments following `$` or `@` into a linked chain.
    fn parse_segments(&mut self) -> Result<Option<Box<Node>>> {
        let node = match self.kind() {
            TokenKind::Dot => {
                self.advance();
                match self.kind() {
                    TokenKind::Identifier => {
                        let name = self.advance().text().to_owned();
                        Node::new(NodeKind::Name(name))
                    }
                    TokenKind::Star => {
                        self.advance();
                        Node::new(NodeKind::Wildcard)
                    }
                    _ => {
                        let found = Self::describe(self.current());
                        return Err(self.error(
                            ErrorKind::Parse,
                            format!("expected a member name or `*` after `.`, found {found}"),
                        ));
                    }
                }
            }
            TokenKind::DoubleDot => {
                self.advance();
                let selector = match self.kind() {
                    TokenKind::Identifier => {
                        let name = self.advance().text().to_owned();
                        Node::new(NodeKind::Name(name))
                    }
                    TokenKind::Star => {
                        self.advance();
                        Node::new(NodeKind::Wildcard)
                    }
                    TokenKind::LBracket => self.parse_bracketed()?,
                    _ => {
                        let found = Self::describe(self.current());
                        return Err(self.error(
                            ErrorKind::Parse,
                            format!("expected a selector after `..`, found {found}"),
                        ));
                    }
                };
                Node::new(NodeKind::Descendant(Box::new(selector)))
            }
            TokenKind::LBracket => self.parse_bracketed()?,
            _ => return Ok(None),
        };
        let next = self.parse_segments()?;
        Ok(Some(Box::new(node.then(next))))
    }

    /// `[` selector *( `,` selector ) `]`; a lone selector is returned unwrapped.
    fn parse_bracketed(&mut self) -> Result<Node> {
        let open = self.expect(TokenKind::LBracket, "`[`")?;
        let mut selectors = Vec::new();
        loop {
            if self.kind() == TokenKind::RBracket {
                let message = if selectors.is_empty() {
                    "empty brackets, expected a selector"
                } else {
                    "unexpected trailing comma"
                };
                return Err(self.error(ErrorKind::Parse, message));
            }
            selectors.push(self.parse_selector()?);
            match self.kind() {
                TokenKind::Comma => {
                    self.advance();
                }
                TokenKind::RBracket => {
                    self.advance();
                    break;
                }
                TokenKind::Eof => {
                    return Err(self.error_at(ErrorKind::Parse, "unclosed bracket", &open));
                }
                _ => {
                    let found = Self::describe(self.current());
                    return Err(self.error(
                        ErrorKind::Parse,
                        format!("expected `,` or `]`, found {found}"),
                    ));
                }
            }
        }
        if selectors.len() == 1 {
            Ok(selectors.remove(0))
        } else {
            Ok(Node::new(NodeKind::ChildSegment(selectors)))
        }
    }

    fn parse_selector(&mut self) -> Result<Node> {
        match self.kind() {
            TokenKind::String => {
                let name = self.advance().text().to_owned();
                Ok(Node::new(NodeKind::Name(name)))
            }
            TokenKind::Star => {
                self.advance();
                Ok(Node::new(NodeKind::Wildcard))
            }
            TokenKind::Question => {
                let question = self.advance();
                let condition = self.parse_expression(Precedence::Lowest)?;
                Node::filter(condition).map_err(|r| self.reject(r, &question))
            }
            TokenKind::Number | TokenKind::Minus | TokenKind::Colon => self.parse_index_or_slice(),
            _ => {
                let found = Self::describe(self.current());
                Err(self.error(ErrorKind::Parse, format!("unexpected {found} in brackets")))
            }
        }
    }

    fn parse_index_or_slice(&mut self) -> Result<Node> {
        let first = self.current().clone();
        let start = self.parse_slice_integer()?;
        if self.kind() != TokenKind::Colon {
            let Some(index) = start else {
                return Err(self.error(ErrorKind::Parse, "expected an index"));
            };
            return Node::index(index).map_err(|r| self.reject(r, &first));
        }

        self.advance();
        let end = self.parse_slice_integer()?;
        let mut step = None;
        if self.kind() == TokenKind::Colon {
            self.advance();
            step = self.parse_slice_integer()?;
        }
        if self.kind() == TokenKind::Colon {
            return Err(self.error(ErrorKind::Parse, "too many slice components"));
        }
        Node::slice(start, end, step).map_err(|r| self.reject(r, &first))
    }

    /// An optional `-`? integer inside brackets. Negative zero, fractions and
    /// exponents are rejected here although filter literals allow them.
    fn parse_slice_integer(&mut self) -> Result<Option<i64>> {
        let negative = match self.kind() {
            TokenKind::Minus => {
                self.advance();
                true
            }
            TokenKind::Number => false,
            _ => return Ok(None),
        };
        if self.kind() != TokenKind::Number {
            return Err(self.error(ErrorKind::Parse, "expected a number after `-`"));
        }
        let token = self.advance();
        if !token.lexeme.bytes().all(|b| b.is_ascii_digit()) {
            return Err(self.error_at(
                ErrorKind::Parse,
                format!("expected an integer, found `{}`", token.lexeme),
                &token,
            ));
        }
        if negative && token.lexeme == "0" {
            return Err(self.error_at(ErrorKind::Range, "negative zero is not allowed here", &token));
        }
        let magnitude: i64 = token.lexeme.parse().map_err(|_| {
            self.error_at(
                ErrorKind::Range,
                format!("integer `{}` is out of range", token.lexeme),
                &token,
            )
        })?;
        Ok(Some(if negative { -magnitude } else { magnitude }))
    }

    fn parse_expression(&mut self, min: Precedence) -> Result<Node> {
        let mut left = self.parse_prefix()?;
        while let Some((op, precedence)) = infix(self.kind()) {
            if precedence <= min {
                break;
            }
            let operator = self.advance();
            let right = self.parse_expression(precedence)?;
            left = Node::binary(op, left, right).map_err(|r| self.reject(r, &operator))?;
        }
        Ok(left)
    }

    fn parse_prefix(&mut self) -> Result<Node> {
        match self.kind() {
            TokenKind::LParen => {
                let open = self.advance();
                let inner = self.parse_expression(Precedence::Lowest)?;
                if self.kind() != TokenKind::RParen {
                    let found = Self::describe(self.current());
                    return Err(self.error_at(
                        ErrorKind::Parse,
                        format!("unbalanced parenthesis, found {found}"),
                        &open,
                    ));
                }
                self.advance();
                Ok(inner.grouped())
            }
            TokenKind::Not => {
                let not = self.advance();
                let operand = self.parse_expression(Precedence::Prefix)?;
                Node::not(operand).map_err(|r| self.reject(r, &not))
            }
            TokenKind::Root | TokenKind::Current => {
                let kind = if self.advance().kind == TokenKind::Root {
                    NodeKind::Root
                } else {
                    NodeKind::Current
                };
                let next = self.parse_segments()?;
                Ok(Node::new(kind).then(next))
            }
            TokenKind::String => {
                let value = self.advance().text().to_owned();
                Ok(Node::new(NodeKind::String(value)))
            }
            TokenKind::Number => {
                let number = self.number_literal()?;
                Ok(Node::new(NodeKind::Number(number)))
            }
            TokenKind::Minus => {
                self.advance();
                if self.kind() != TokenKind::Number {
                    return Err(self.error(ErrorKind::Parse, "expected a number after `-`"));
                }
                let number = self.number_literal()?;
                Ok(Node::new(NodeKind::Number(self.negate(number)?)))
            }
            TokenKind::True => {
                self.advance();
                Ok(Node::new(NodeKind::Bool(true)))
            }
            TokenKind::False => {
                self.advance();
                Ok(Node::new(NodeKind::Bool(false)))
            }
            TokenKind::Null => {
                self.advance();
                Ok(Node::new(NodeKind::Null))
            }
            TokenKind::Function => self.parse_call(),
            TokenKind::Identifier => {
                let found = Self::describe(self.current());
                Err(self.error(ErrorKind::Parse, format!("unexpected bare name {found}")))
            }
            _ => {
                let found = Self::describe(self.current());
                Err(self.error(ErrorKind::Parse, format!("expected an expression, found {found}")))
            }
        }
    }

    fn number_literal(&mut self) -> Result<Number> {
        let token = self.advance();
        match &token.literal {
            Some(Literal::Num(n)) => Ok(n.clone()),
            _ => Err(self.error_at(ErrorKind::Internal, "number token without a value", &token)),
        }
    }

    // Folds a preceding `-` into the literal
    fn negate(&self, number: Number) -> Result<Number> {
        if let Some(i) = number.as_i64() {
            return Ok(Number::from(-i));
        }
        number
            .as_f64()
            .and_then(|f| Number::from_f64(-f))
            .ok_or_else(|| {
                let token = self.previous().unwrap_or(self.current());
                self.error_at(ErrorKind::Range, "number out of range", token)
            })
    }

    fn parse_call(&mut self) -> Result<Node> {
        let name = self.advance();
        let function = functions::lookup(name.lexeme).ok_or_else(|| {
            self.error_at(
                ErrorKind::Name,
                format!("unknown function `{}`", name.lexeme),
                &name,
            )
        })?;
        self.expect(TokenKind::LParen, "`(`")?;
        let mut args = Vec::new();
        if self.kind() != TokenKind::RParen {
            loop {
                args.push(self.parse_expression(Precedence::Lowest)?);
                if self.kind() != TokenKind::Comma {
                    break;
                }
                self.advance();
            }
        }
        self.expect(TokenKind::RParen, "`)` to close the argument list")?;
        Node::call(function, args).map_err(|r| self.reject(r, &name))
    }
}
