//! A hand-written lexer walking `&str` source, span-stamping each token
//! (grounded on `logicaffeine_language::lexer`'s token-enum + `Lexer`
//! struct-walking-a-`&str` shape).

use crate::token::{keyword, Token, TokenKind};
use spicy_base::{Diagnostic, Span};

pub struct Lexer<'s> {
    src: &'s str,
    bytes: &'s [u8],
    pos: usize,
}

impl<'s> Lexer<'s> {
    pub fn new(src: &'s str) -> Self {
        Lexer { src, bytes: src.as_bytes(), pos: 0 }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(b) if b.is_ascii_whitespace() => {
                    self.pos += 1;
                }
                Some(b'/') if self.peek_at(1) == Some(b'/') => {
                    while let Some(b) = self.peek() {
                        if b == b'\n' {
                            break;
                        }
                        self.pos += 1;
                    }
                }
                Some(b'/') if self.peek_at(1) == Some(b'*') => {
                    self.pos += 2;
                    while self.pos < self.bytes.len() {
                        if self.peek() == Some(b'*') && self.peek_at(1) == Some(b'/') {
                            self.pos += 2;
                            break;
                        }
                        self.pos += 1;
                    }
                }
                _ => break,
            }
        }
    }

    /// Tokenizes the full source, returning every [`Token`] (terminated by
    /// `TokenKind::Eof`) or the first lexical error encountered.
    pub fn tokenize(mut self) -> Result<Vec<Token>, Diagnostic> {
        let mut tokens = Vec::new();
        loop {
            self.skip_trivia();
            let start = self.pos;
            let Some(c) = self.peek() else {
                tokens.push(Token::new(TokenKind::Eof, Span::new(start, start)));
                break;
            };

            let kind = match c {
                b'"' => self.lex_string()?,
                b'/' => self.lex_regexp()?,
                b'b' if self.peek_at(1) == Some(b'"') => {
                    self.pos += 1;
                    self.lex_bytes()?
                }
                b'$' if self.peek_at(1) == Some(b'$') => {
                    self.pos += 2;
                    TokenKind::DollarDollar
                }
                b'&' if self.peek_at(1).is_some_and(|b| b.is_ascii_alphabetic()) => self.lex_attribute(),
                c if c.is_ascii_digit() => self.lex_number(),
                c if c.is_ascii_alphabetic() || c == b'_' => self.lex_ident_or_keyword(),
                _ => self.lex_punctuation(start)?,
            };

            tokens.push(Token::new(kind, Span::new(start, self.pos)));
        }
        Ok(tokens)
    }

    fn lex_ident_or_keyword(&mut self) -> TokenKind {
        let start = self.pos;
        while self.peek().is_some_and(|b| b.is_ascii_alphanumeric() || b == b'_') {
            self.pos += 1;
        }
        let text = &self.src[start..self.pos];
        keyword(text).unwrap_or_else(|| TokenKind::Ident(text.to_string()))
    }

    fn lex_attribute(&mut self) -> TokenKind {
        self.pos += 1; // consume `&`
        let start = self.pos;
        while self.peek().is_some_and(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-') {
            self.pos += 1;
        }
        TokenKind::Attribute(self.src[start..self.pos].to_string())
    }

    fn lex_number(&mut self) -> TokenKind {
        let start = self.pos;
        while self.peek().is_some_and(|b| b.is_ascii_digit()) {
            self.pos += 1;
        }
        let mut is_real = false;
        if self.peek() == Some(b'.') && self.peek_at(1).is_some_and(|b| b.is_ascii_digit()) {
            is_real = true;
            self.pos += 1;
            while self.peek().is_some_and(|b| b.is_ascii_digit()) {
                self.pos += 1;
            }
        }
        let text = &self.src[start..self.pos];
        if is_real {
            TokenKind::RealLiteral(text.parse().unwrap_or(0.0))
        } else if text.parse::<i64>().is_ok() {
            TokenKind::IntLiteral(text.parse().unwrap())
        } else {
            TokenKind::UintLiteral(text.parse().unwrap_or(0))
        }
    }

    fn lex_string(&mut self) -> Result<TokenKind, Diagnostic> {
        self.pos += 1; // opening quote
        let mut s = String::new();
        loop {
            match self.bump() {
                Some(b'"') => break,
                Some(b'\\') => {
                    let escaped = self.bump().ok_or_else(|| unterminated(self.pos))?;
                    s.push(escape_char(escaped));
                }
                Some(b) => s.push(b as char),
                None => return Err(unterminated(self.pos)),
            }
        }
        Ok(TokenKind::StringLiteral(s))
    }

    fn lex_bytes(&mut self) -> Result<TokenKind, Diagnostic> {
        self.pos += 1; // opening quote
        let mut bytes = Vec::new();
        loop {
            match self.bump() {
                Some(b'"') => break,
                Some(b'\\') if self.peek() == Some(b'x') => {
                    self.pos += 1;
                    let hex: String = (0..2).filter_map(|_| self.bump().map(|b| b as char)).collect();
                    bytes.push(u8::from_str_radix(&hex, 16).map_err(|_| invalid_escape(self.pos))?);
                }
                Some(b) => bytes.push(b),
                None => return Err(unterminated(self.pos)),
            }
        }
        Ok(TokenKind::BytesLiteral(bytes))
    }

    fn lex_regexp(&mut self) -> Result<TokenKind, Diagnostic> {
        self.pos += 1; // opening `/`
        let start = self.pos;
        loop {
            match self.bump() {
                Some(b'/') => break,
                Some(b'\\') => {
                    self.bump();
                }
                Some(_) => {}
                None => return Err(unterminated(self.pos)),
            }
        }
        let pattern = self.src[start..self.pos - 1].to_string();
        Ok(TokenKind::RegexpLiteral(pattern))
    }

    fn lex_punctuation(&mut self, start: usize) -> Result<TokenKind, Diagnostic> {
        let c = self.bump().unwrap();
        macro_rules! two {
            ($next:literal, $double:expr, $single:expr) => {
                if self.peek() == Some($next) {
                    self.pos += 1;
                    $double
                } else {
                    $single
                }
            };
        }
        Ok(match c {
            b'{' => TokenKind::LBrace,
            b'}' => TokenKind::RBrace,
            b'(' => TokenKind::LParen,
            b')' => TokenKind::RParen,
            b'[' => TokenKind::LBracket,
            b']' => TokenKind::RBracket,
            b',' => TokenKind::Comma,
            b';' => TokenKind::Semicolon,
            b'.' => TokenKind::Dot,
            b'?' => TokenKind::Question,
            b':' => two!(b':', TokenKind::DoubleColon, TokenKind::Colon),
            b'=' => two!(b'=', TokenKind::EqEq, TokenKind::Equals),
            b'!' => two!(b'=', TokenKind::Ne, TokenKind::Bang),
            b'<' => {
                if self.peek() == Some(b'<') {
                    self.pos += 1;
                    TokenKind::Shl
                } else {
                    two!(b'=', TokenKind::Le, TokenKind::Lt)
                }
            }
            b'>' => {
                if self.peek() == Some(b'>') {
                    self.pos += 1;
                    TokenKind::Shr
                } else {
                    two!(b'=', TokenKind::Ge, TokenKind::Gt)
                }
            }
            b'&' => two!(b'&', TokenKind::AndAnd, TokenKind::Amp),
            b'|' => two!(b'|', TokenKind::OrOr, TokenKind::Pipe),
            b'^' => TokenKind::Caret,
            b'+' => TokenKind::Plus,
            b'-' => two!(b'>', TokenKind::Arrow, TokenKind::Minus),
            b'*' => TokenKind::Star,
            b'%' => TokenKind::Percent,
            other => {
                return Err(Diagnostic::error(
                    "lex-error",
                    format!("unexpected character {:?}", other as char),
                    Span::new(start, self.pos),
                ))
            }
        })
    }
}

fn unterminated(at: usize) -> Diagnostic {
    Diagnostic::error("lex-error", "unterminated literal", Span::new(at, at))
}

fn invalid_escape(at: usize) -> Diagnostic {
    Diagnostic::error("lex-error", "invalid escape sequence", Span::new(at, at))
}

fn escape_char(c: u8) -> char {
    match c {
        b'n' => '\n',
        b't' => '\t',
        b'r' => '\r',
        b'0' => '\0',
        other => other as char,
    }
}
