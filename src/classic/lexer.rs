//! Lexer for the classic query syntax
//!
//! Tokenizes Lucene-style query strings. Term and phrase text is kept in its
//! raw, still-escaped form so later stages can tell an escaped `\*` from a
//! live wildcard.

use crate::error::CompileError;
use crate::Result;
use std::fmt;

/// Token types for classic query parsing
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// A term (unquoted word, escapes preserved)
    Term(String),
    /// Contents of a quoted phrase, escapes preserved
    Quoted(String),

    /// `AND` or `&&`
    And,
    /// `OR` or `||`
    Or,
    /// `NOT` or `!`
    Not,
    /// `TO` inside ranges
    To,
    /// Colon separator (field:value)
    Colon,

    /// Tilde with optional fuzziness or slop
    Tilde(Option<f32>),
    /// Caret with optional boost value
    Caret(Option<f32>),

    /// Left square bracket (inclusive range start)
    LeftBracket,
    /// Right square bracket (inclusive range end)
    RightBracket,
    /// Left curly brace (exclusive range start)
    LeftBrace,
    /// Right curly brace (exclusive range end)
    RightBrace,

    LeftParen,
    RightParen,

    /// Plus sign (required clause)
    Plus,
    /// Minus sign (prohibited clause)
    Minus,

    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Term(t) => write!(f, "term '{}'", t),
            Token::Quoted(t) => write!(f, "phrase \"{}\"", t),
            Token::And => write!(f, "AND"),
            Token::Or => write!(f, "OR"),
            Token::Not => write!(f, "NOT"),
            Token::To => write!(f, "TO"),
            Token::Colon => write!(f, "':'"),
            Token::Tilde(_) => write!(f, "'~'"),
            Token::Caret(_) => write!(f, "'^'"),
            Token::LeftBracket => write!(f, "'['"),
            Token::RightBracket => write!(f, "']'"),
            Token::LeftBrace => write!(f, "'{{'"),
            Token::RightBrace => write!(f, "'}}'"),
            Token::LeftParen => write!(f, "'('"),
            Token::RightParen => write!(f, "')'"),
            Token::Plus => write!(f, "'+'"),
            Token::Minus => write!(f, "'-'"),
            Token::Eof => write!(f, "end of input"),
        }
    }
}

/// Lexer for tokenizing classic query strings
pub struct Lexer {
    input: Vec<char>,
    position: usize,
    token_start: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
            token_start: 0,
        }
    }

    /// Character offset where the most recently returned token starts
    pub fn token_start(&self) -> usize {
        self.token_start
    }

    /// Get the next token from the input
    pub fn next_token(&mut self) -> Result<Token> {
        self.skip_whitespace();
        self.token_start = self.position;

        if self.position >= self.input.len() {
            return Ok(Token::Eof);
        }

        let ch = self.current_char();

        match ch {
            ':' => self.single(Token::Colon),
            '[' => self.single(Token::LeftBracket),
            ']' => self.single(Token::RightBracket),
            '{' => self.single(Token::LeftBrace),
            '}' => self.single(Token::RightBrace),
            '(' => self.single(Token::LeftParen),
            ')' => self.single(Token::RightParen),
            '+' => self.single(Token::Plus),
            '-' => self.single(Token::Minus),
            '!' => self.single(Token::Not),
            '&' if self.peek() == Some('&') => {
                self.advance();
                self.single(Token::And)
            }
            '|' if self.peek() == Some('|') => {
                self.advance();
                self.single(Token::Or)
            }
            '~' => {
                self.advance();
                Ok(Token::Tilde(self.read_number()))
            }
            '^' => {
                self.advance();
                Ok(Token::Caret(self.read_number()))
            }
            '"' => {
                self.advance();
                self.read_quoted()
            }
            _ if Self::is_term_char(ch) || ch == '\\' => self.read_term(),
            _ => Err(CompileError::syntax(
                self.position,
                "term, phrase or operator",
                format!("'{}'", ch),
            )),
        }
    }

    fn single(&mut self, token: Token) -> Result<Token> {
        self.advance();
        Ok(token)
    }

    fn read_term(&mut self) -> Result<Token> {
        let mut term = String::new();

        while self.position < self.input.len() {
            let ch = self.current_char();
            if ch == '\\' {
                term.push(ch);
                self.advance();
                if self.position < self.input.len() {
                    term.push(self.current_char());
                    self.advance();
                }
            } else if Self::is_term_char(ch) || ((ch == '-' || ch == '+') && !term.is_empty()) {
                term.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        match term.as_str() {
            "AND" => Ok(Token::And),
            "OR" => Ok(Token::Or),
            "NOT" => Ok(Token::Not),
            "TO" => Ok(Token::To),
            _ => Ok(Token::Term(term)),
        }
    }

    fn read_quoted(&mut self) -> Result<Token> {
        let start = self.token_start;
        let mut s = String::new();

        while self.position < self.input.len() {
            let ch = self.current_char();
            if ch == '"' {
                self.advance();
                return Ok(Token::Quoted(s));
            }
            s.push(ch);
            self.advance();
            if ch == '\\' && self.position < self.input.len() {
                s.push(self.current_char());
                self.advance();
            }
        }

        Err(CompileError::syntax(start, "closing '\"'", "end of input"))
    }

    fn read_number(&mut self) -> Option<f32> {
        let mut num_str = String::new();
        let mut has_dot = false;

        while self.position < self.input.len() {
            let ch = self.current_char();
            if ch.is_ascii_digit() {
                num_str.push(ch);
                self.advance();
            } else if ch == '.' && !has_dot {
                has_dot = true;
                num_str.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        num_str.parse().ok()
    }

    fn current_char(&self) -> char {
        self.input[self.position]
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.position + 1).copied()
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    fn skip_whitespace(&mut self) {
        while self.position < self.input.len() && self.current_char().is_whitespace() {
            self.advance();
        }
    }

    /// Check if a character can be part of a term
    fn is_term_char(ch: char) -> bool {
        !ch.is_whitespace()
            && !matches!(
                ch,
                ':' | '[' | ']' | '{' | '}' | '(' | ')' | '"' | '^' | '~' | '+' | '-' | '!' | '\\'
            )
    }
}
