//! Lexer for FTS expressions
//!
//! The whole input is tokenized up front; the parser needs several tokens of
//! lookahead to tell `prefix:local:value` from `field:value`.

use crate::error::CompileError;
use crate::Result;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Unquoted word, escapes preserved
    Word(String),
    /// Contents of a quoted phrase, escapes preserved
    Phrase(String),

    /// `AND` or `&&`, any case
    And,
    /// `OR` or `||`, any case
    Or,
    /// `NOT`, any case
    Not,

    Colon,
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    /// `<`, exclusive range start
    LeftAngle,
    /// `>`, exclusive range end
    RightAngle,
    /// `..` range shorthand
    DotDot,

    Plus,
    Minus,
    /// `|` optional prefix
    Bar,
    /// `!` negation prefix
    Bang,
    /// `=` exact prefix
    Equals,
    /// `%` template placeholder
    Percent,

    /// `~` attached to the preceding word or phrase: fuzziness or slop
    Tilde(Option<f32>),
    /// Free-standing `~` introducing a synonym
    Synonym,
    Caret(Option<f32>),

    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Word(w) => write!(f, "word '{}'", w),
            Token::Phrase(p) => write!(f, "phrase \"{}\"", p),
            Token::And => write!(f, "AND"),
            Token::Or => write!(f, "OR"),
            Token::Not => write!(f, "NOT"),
            Token::Colon => write!(f, "':'"),
            Token::LeftParen => write!(f, "'('"),
            Token::RightParen => write!(f, "')'"),
            Token::LeftBracket => write!(f, "'['"),
            Token::RightBracket => write!(f, "']'"),
            Token::LeftAngle => write!(f, "'<'"),
            Token::RightAngle => write!(f, "'>'"),
            Token::DotDot => write!(f, "'..'"),
            Token::Plus => write!(f, "'+'"),
            Token::Minus => write!(f, "'-'"),
            Token::Bar => write!(f, "'|'"),
            Token::Bang => write!(f, "'!'"),
            Token::Equals => write!(f, "'='"),
            Token::Percent => write!(f, "'%'"),
            Token::Tilde(_) | Token::Synonym => write!(f, "'~'"),
            Token::Caret(_) => write!(f, "'^'"),
            Token::Eof => write!(f, "end of input"),
        }
    }
}

/// A token and the character offset it starts at
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub position: usize,
}

/// Tokenize a whole FTS expression; the last token is always [`Token::Eof`]
pub fn tokenize(input: &str) -> Result<Vec<Spanned>> {
    let mut lexer = Lexer::new(input);
    let mut tokens = Vec::new();
    loop {
        let spanned = lexer.next_token()?;
        let done = spanned.token == Token::Eof;
        tokens.push(spanned);
        if done {
            return Ok(tokens);
        }
    }
}

struct Lexer {
    input: Vec<char>,
    position: usize,
    /// Whether the previous token was a word or phrase with nothing in between
    after_text: bool,
}

impl Lexer {
    fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
            after_text: false,
        }
    }

    fn next_token(&mut self) -> Result<Spanned> {
        if self.skip_whitespace() {
            self.after_text = false;
        }
        let start = self.position;
        let glued = self.after_text;
        self.after_text = false;

        let Some(ch) = self.current() else {
            return Ok(Spanned {
                token: Token::Eof,
                position: start,
            });
        };

        let token = match ch {
            ':' => self.single(Token::Colon),
            '(' => self.single(Token::LeftParen),
            ')' => self.single(Token::RightParen),
            '[' => self.single(Token::LeftBracket),
            ']' => self.single(Token::RightBracket),
            '<' => self.single(Token::LeftAngle),
            '>' => self.single(Token::RightAngle),
            '+' => self.single(Token::Plus),
            '-' => self.single(Token::Minus),
            '!' => self.single(Token::Bang),
            '=' => self.single(Token::Equals),
            '%' => self.single(Token::Percent),
            '.' if self.peek() == Some('.') => {
                self.advance();
                self.single(Token::DotDot)
            }
            '|' if self.peek() == Some('|') => {
                self.advance();
                self.single(Token::Or)
            }
            '|' => self.single(Token::Bar),
            '&' if self.peek() == Some('&') => {
                self.advance();
                self.single(Token::And)
            }
            '~' => {
                self.advance();
                if glued {
                    Token::Tilde(self.read_number())
                } else {
                    Token::Synonym
                }
            }
            '^' => {
                self.advance();
                Token::Caret(self.read_number())
            }
            '"' => {
                self.advance();
                let phrase = self.read_phrase(start)?;
                self.after_text = true;
                phrase
            }
            _ if is_word_start(ch) => {
                let word = self.read_word(start)?;
                self.after_text = true;
                word
            }
            _ => {
                return Err(CompileError::syntax(
                    start,
                    "word, phrase or operator",
                    format!("'{}'", ch),
                ))
            }
        };

        Ok(Spanned {
            token,
            position: start,
        })
    }

    fn single(&mut self, token: Token) -> Token {
        self.advance();
        token
    }

    fn read_word(&mut self, start: usize) -> Result<Token> {
        let mut word = String::new();

        if self.current() == Some('@') && self.peek() == Some('{') {
            word.push('@');
            self.advance();
        }
        if self.current() == Some('{') {
            while let Some(ch) = self.current() {
                word.push(ch);
                self.advance();
                if ch == '}' {
                    break;
                }
            }
            if !word.ends_with('}') {
                return Err(CompileError::syntax(start, "'}'", "end of input"));
            }
        }

        while let Some(ch) = self.current() {
            if ch == '\\' {
                word.push(ch);
                self.advance();
                if let Some(next) = self.current() {
                    word.push(next);
                    self.advance();
                }
            } else if ch == '.' && self.peek() == Some('.') {
                break;
            } else if is_word_char(ch) || ((ch == '-' || ch == '+') && !word.is_empty()) {
                word.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        let token = if word.eq_ignore_ascii_case("AND") {
            Token::And
        } else if word.eq_ignore_ascii_case("OR") {
            Token::Or
        } else if word.eq_ignore_ascii_case("NOT") {
            Token::Not
        } else {
            Token::Word(word)
        };
        Ok(token)
    }

    fn read_phrase(&mut self, start: usize) -> Result<Token> {
        let mut phrase = String::new();
        while let Some(ch) = self.current() {
            self.advance();
            match ch {
                '"' => return Ok(Token::Phrase(phrase)),
                '\\' => {
                    phrase.push(ch);
                    if let Some(next) = self.current() {
                        phrase.push(next);
                        self.advance();
                    }
                }
                _ => phrase.push(ch),
            }
        }
        Err(CompileError::syntax(start, "closing '\"'", "end of input"))
    }

    fn read_number(&mut self) -> Option<f32> {
        let mut number = String::new();
        let mut has_dot = false;
        while let Some(ch) = self.current() {
            if ch.is_ascii_digit() {
                number.push(ch);
            } else if ch == '.' && !has_dot && self.peek().is_some_and(|c| c.is_ascii_digit()) {
                has_dot = true;
                number.push(ch);
            } else {
                break;
            }
            self.advance();
        }
        number.parse().ok()
    }

    fn current(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.position + 1).copied()
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    /// Returns whether any whitespace was skipped
    fn skip_whitespace(&mut self) -> bool {
        let start = self.position;
        while self.current().is_some_and(char::is_whitespace) {
            self.advance();
        }
        self.position > start
    }
}

fn is_word_start(ch: char) -> bool {
    ch == '{' || ch == '\\' || is_word_char(ch)
}

fn is_word_char(ch: char) -> bool {
    !ch.is_whitespace()
        && !matches!(
            ch,
            ':' | '(' | ')' | '[' | ']' | '<' | '>' | '{' | '}' | '"' | '^' | '~' | '=' | '%'
                | '|' | '!' | '+' | '-' | '\\'
        )
}
