use serde_json::Number;

use crate::errors::{Error, ErrorKind, Result};
use crate::functions;
use crate::token::{Literal, Token, TokenKind};

/// Converts a query string into a flat token sequence terminated by `Eof`.
pub fn lex(source: &str) -> Result<Vec<Token<'_>>> {
    Lexer::new(source).run()
}

pub struct Lexer<'s> {
    source: &'s str,
    chars: Vec<(usize, char)>,
    position: usize,
    tokens: Vec<Token<'s>>,
}

fn is_blank(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r')
}

fn is_name_first(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c >= '\u{80}'
}

fn is_name_char(c: char) -> bool {
    is_name_first(c) || c.is_ascii_digit()
}

impl<'s> Lexer<'s> {
    pub fn new(source: &'s str) -> Self {
        Lexer {
            source,
            chars: source.char_indices().collect(),
            position: 0,
            tokens: Vec::new(),
        }
    }

    fn current_char(&self) -> Option<char> {
        self.chars.get(self.position).map(|&(_, c)| c)
    }

    fn peek_char(&self, offset: usize) -> Option<char> {
        self.chars.get(self.position + offset).map(|&(_, c)| c)
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    fn byte_at(&self, position: usize) -> usize {
        self.chars
            .get(position)
            .map(|&(b, _)| b)
            .unwrap_or(self.source.len())
    }

    fn error(&self, kind: ErrorKind, message: impl Into<String>, start: usize) -> Error {
        Error::new(kind, message, self.source).at(start, self.position.max(start + 1) - start)
    }

    fn push(&mut self, kind: TokenKind, start: usize) {
        let token = self.token(kind, start);
        self.tokens.push(token);
    }

    fn token(&self, kind: TokenKind, start: usize) -> Token<'s> {
        let lexeme = &self.source[self.byte_at(start)..self.byte_at(self.position)];
        Token::new(kind, lexeme, (start, self.position - start))
    }

    fn skip_whitespace(&mut self) {
        while self.current_char().is_some_and(is_blank) {
            self.advance();
        }
    }

    fn previous_kind(&self) -> Option<TokenKind> {
        self.tokens.last().map(|t| t.kind)
    }

    pub fn run(mut self) -> Result<Vec<Token<'s>>> {
        if self.chars.first().is_some_and(|&(_, c)| is_blank(c)) {
            return Err(self.error(ErrorKind::Lex, "leading whitespace is not allowed", 0));
        }
        if let Some(&(_, c)) = self.chars.last() {
            if is_blank(c) {
                let last = self.chars.len() - 1;
                return Err(Error::new(ErrorKind::Lex, "trailing whitespace is not allowed", self.source)
                    .at(last, 1));
            }
        }

        loop {
            self.skip_whitespace();
            let start = self.position;
            let Some(ch) = self.current_char() else {
                self.push(TokenKind::Eof, start);
                return Ok(self.tokens);
            };

            match ch {
                '$' => self.single(TokenKind::Root),
                '@' => self.single(TokenKind::Current),
                '[' => self.single(TokenKind::LBracket),
                ']' => self.single(TokenKind::RBracket),
                '(' => self.single(TokenKind::LParen),
                ')' => self.single(TokenKind::RParen),
                ',' => self.single(TokenKind::Comma),
                ':' => self.single(TokenKind::Colon),
                '?' => self.single(TokenKind::Question),
                '*' => self.single(TokenKind::Star),
                '.' => self.read_dot()?,
                '!' => self.one_or_two('=', TokenKind::Not, TokenKind::Ne),
                '<' => self.one_or_two('=', TokenKind::Lt, TokenKind::Le),
                '>' => self.one_or_two('=', TokenKind::Gt, TokenKind::Ge),
                '=' => self.exactly_two('=', TokenKind::Eq)?,
                '&' => self.exactly_two('&', TokenKind::And)?,
                '|' => self.exactly_two('|', TokenKind::Or)?,
                '-' => self.read_minus()?,
                '"' | '\'' => self.read_string(ch)?,
                c if c.is_ascii_digit() => self.read_number()?,
                c if is_name_first(c) => self.read_word()?,
                c => {
                    return Err(self.error(
                        ErrorKind::Lex,
                        format!("unexpected character {c:?}"),
                        start,
                    ))
                }
            }
        }
    }

    fn single(&mut self, kind: TokenKind) {
        let start = self.position;
        self.advance();
        self.push(kind, start);
    }

    fn one_or_two(&mut self, second: char, one: TokenKind, two: TokenKind) {
        let start = self.position;
        self.advance();
        if self.current_char() == Some(second) {
            self.advance();
            self.push(two, start);
        } else {
            self.push(one, start);
        }
    }

    fn exactly_two(&mut self, second: char, kind: TokenKind) -> Result<()> {
        let start = self.position;
        let first = self.current_char().unwrap_or_default();
        self.advance();
        if self.current_char() != Some(second) {
            return Err(self.error(
                ErrorKind::Lex,
                format!("unknown operator `{first}`, did you mean `{first}{second}`?"),
                start,
            ));
        }
        self.advance();
        self.push(kind, start);
        Ok(())
    }

    fn read_dot(&mut self) -> Result<()> {
        let start = self.position;
        self.advance();
        let kind = if self.current_char() == Some('.') {
            self.advance();
            TokenKind::DoubleDot
        } else {
            TokenKind::Dot
        };
        if self.current_char().is_some_and(is_blank) {
            return Err(self.error(
                ErrorKind::Lex,
                "unexpected whitespace after dot",
                start,
            ));
        }
        self.push(kind, start);
        Ok(())
    }

    fn read_minus(&mut self) -> Result<()> {
        let start = self.position;
        self.advance();
        match self.current_char() {
            Some(c) if c.is_ascii_digit() => {
                self.push(TokenKind::Minus, start);
                Ok(())
            }
            Some(c) if is_blank(c) => Err(self.error(
                ErrorKind::Lex,
                "unexpected whitespace after minus sign",
                start,
            )),
            _ => Err(self.error(
                ErrorKind::Lex,
                "a minus sign must be followed by a number",
                start,
            )),
        }
    }

    fn read_word(&mut self) -> Result<()> {
        let start = self.position;
        while self.current_char().is_some_and(is_name_char) {
            self.advance();
        }
        let token = self.token(TokenKind::Identifier, start);
        let after_dot = matches!(
            self.previous_kind(),
            Some(TokenKind::Dot | TokenKind::DoubleDot)
        );
        if after_dot {
            self.tokens.push(token);
            return Ok(());
        }

        let kind = match token.lexeme {
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "null" => TokenKind::Null,
            _ if self.current_char() == Some('(') => TokenKind::Function,
            name => {
                if functions::lookup(name).is_some() && self.next_non_blank() == Some('(') {
                    return Err(self.error(
                        ErrorKind::Lex,
                        format!("unexpected whitespace between `{name}` and `(`"),
                        start,
                    ));
                }
                TokenKind::Identifier
            }
        };
        self.tokens.push(Token { kind, ..token });
        Ok(())
    }

    fn next_non_blank(&self) -> Option<char> {
        self.chars[self.position..]
            .iter()
            .map(|&(_, c)| c)
            .find(|&c| !is_blank(c))
    }

    fn read_digits(&mut self) -> usize {
        let mut count = 0;
        while self.current_char().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
            count += 1;
        }
        count
    }

    fn read_number(&mut self) -> Result<()> {
        let start = self.position;
        let mut integral = true;

        if self.current_char() == Some('0') {
            self.advance();
            if self.current_char().is_some_and(|c| c.is_ascii_digit()) {
                return Err(self.error(
                    ErrorKind::Lex,
                    "leading zeros are not allowed in numbers",
                    start,
                ));
            }
        } else {
            self.read_digits();
        }

        if self.current_char() == Some('.') {
            self.advance();
            integral = false;
            if self.read_digits() == 0 {
                return Err(self.error(
                    ErrorKind::Lex,
                    "expected a digit after the decimal point",
                    start,
                ));
            }
        }

        if matches!(self.current_char(), Some('e' | 'E')) {
            self.advance();
            integral = false;
            if matches!(self.current_char(), Some('+' | '-')) {
                self.advance();
            }
            if self.read_digits() == 0 {
                return Err(self.error(
                    ErrorKind::Lex,
                    "expected a digit in the exponent",
                    start,
                ));
            }
        }

        let token = self.token(TokenKind::Number, start);
        let number = if integral {
            token.lexeme.parse::<i64>().ok().map(Number::from)
        } else {
            None
        };
        let number = match number {
            Some(n) => n,
            None => token
                .lexeme
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .ok_or_else(|| self.error(ErrorKind::Range, "number out of range", start))?,
        };
        self.tokens.push(token.with_literal(Literal::Num(number)));
        Ok(())
    }

    fn read_hex4(&mut self, start: usize) -> Result<u32> {
        let mut code = 0;
        for _ in 0..4 {
            let digit = self
                .current_char()
                .and_then(|c| c.to_digit(16))
                .ok_or_else(|| self.error(ErrorKind::Lex, "incomplete unicode escape", start))?;
            code = code * 16 + digit;
            self.advance();
        }
        Ok(code)
    }

    fn read_unicode_escape(&mut self, escape_start: usize) -> Result<char> {
        let high = self.read_hex4(escape_start)?;
        let code = match high {
            0xDC00..=0xDFFF => {
                return Err(self.error(
                    ErrorKind::Lex,
                    "unexpected low surrogate without a preceding high surrogate",
                    escape_start,
                ))
            }
            0xD800..=0xDBFF => {
                if self.current_char() != Some('\\') || self.peek_char(1) != Some('u') {
                    return Err(self.error(
                        ErrorKind::Lex,
                        "high surrogate must be followed by a low surrogate escape",
                        escape_start,
                    ));
                }
                self.advance();
                self.advance();
                let low = self.read_hex4(escape_start)?;
                if !(0xDC00..=0xDFFF).contains(&low) {
                    return Err(self.error(
                        ErrorKind::Lex,
                        "high surrogate must be followed by a low surrogate escape",
                        escape_start,
                    ));
                }
                (high - 0xD800) * 0x400 + (low - 0xDC00) + 0x10000
            }
            other => other,
        };
        char::from_u32(code)
            .ok_or_else(|| self.error(ErrorKind::Lex, "invalid unicode escape", escape_start))
    }

    fn read_string(&mut self, quote: char) -> Result<()> {
        let start = self.position;
        let other = if quote == '"' { '\'' } else { '"' };
        let mut result = String::new();
        self.advance();

        loop {
            let Some(ch) = self.current_char() else {
                return Err(self.error(ErrorKind::Lex, "unterminated string literal", start));
            };
            match ch {
                c if c == quote => {
                    self.advance();
                    break;
                }
                '\\' => {
                    let escape_start = self.position;
                    self.advance();
                    let Some(escaped) = self.current_char() else {
                        return Err(self.error(ErrorKind::Lex, "unterminated string literal", start));
                    };
                    self.advance();
                    match escaped {
                        'b' => result.push('\u{8}'),
                        'f' => result.push('\u{c}'),
                        'n' => result.push('\n'),
                        'r' => result.push('\r'),
                        't' => result.push('\t'),
                        '/' => result.push('/'),
                        '\\' => result.push('\\'),
                        'u' => result.push(self.read_unicode_escape(escape_start)?),
                        c if c == quote => result.push(c),
                        c if c == other => {
                            return Err(self.error(
                                ErrorKind::Lex,
                                format!("invalid escape `\\{c}` inside a {quote}-quoted string"),
                                escape_start,
                            ))
                        }
                        c => {
                            return Err(self.error(
                                ErrorKind::Lex,
                                format!("invalid escape sequence `\\{c}`"),
                                escape_start,
                            ))
                        }
                    }
                }
                c if c < '\u{20}' => {
                    return Err(self.error(
                        ErrorKind::Lex,
                        format!("invalid character {c:?} in string literal"),
                        self.position,
                    ))
                }
                c => {
                    result.push(c);
                    self.advance();
                }
            }
        }

        let token = self.token(TokenKind::String, start);
        self.tokens.push(token.with_literal(Literal::Str(result)));
        Ok(())
    }
}
