use serde_json::Number;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// `$`
    Root,
    /// `@`
    Current,
    /// `.`
    Dot,
    /// `..`
    DoubleDot,
    LBracket,
    RBracket,
    LParen,
    RParen,
    Comma,
    Colon,
    /// `?`
    Question,
    /// `*`
    Star,
    /// `!`
    Not,
    And,
    Or,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    /// `-`, only ever directly in front of a number
    Minus,
    String,
    Number,
    True,
    False,
    Null,
    /// Member name shorthand, or a keyword following `.`/`..`
    Identifier,
    /// A name immediately followed by `(`
    Function,
    Eof,
}

/// Decoded value of a string or number token.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Str(String),
    Num(Number),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token<'s> {
    pub kind: TokenKind,
    pub lexeme: &'s str,
    pub literal: Option<Literal>,
    /// `(offset, length)` in characters.
    pub span: (usize, usize),
}

impl<'s> Token<'s> {
    pub fn new(kind: TokenKind, lexeme: &'s str, span: (usize, usize)) -> Self {
        Self {
            kind,
            lexeme,
            literal: None,
            span,
        }
    }

    pub fn with_literal(mut self, literal: Literal) -> Self {
        self.literal = Some(literal);
        self
    }

    /// Decoded string value for `String` and `Identifier` tokens.
    pub fn text(&self) -> &str {
        match &self.literal {
            Some(Literal::Str(s)) => s,
            _ => self.lexeme,
        }
    }
}
