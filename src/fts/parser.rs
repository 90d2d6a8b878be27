//! Recursive descent parser for FTS expressions
//!
//! # Grammar
//!
//! ```text
//! query       := disjunction EOF
//! disjunction := conjunction ((OR | juxtaposition) conjunction)*
//! conjunction := clause ((AND | juxtaposition) clause)*
//! clause      := prefix? test ('^' boost)?
//! prefix      := '+' | '-' | '|' | '!' | NOT
//! test        := '(' disjunction ')'
//!              | field ':' '(' disjunction ')'
//!              | field ':' leaf
//!              | '%' field | '%' '(' field+ ')'
//!              | leaf
//! leaf        := '=' (WORD | PHRASE)
//!              | '~' WORD
//!              | PHRASE ('~' slop)?
//!              | ('[' | '<') bound TO bound (']' | '>')
//!              | WORD '..' WORD
//!              | WORD '*' ('(' distance? ')')? WORD
//!              | WORD ('~' similarity?)?
//! field       := WORD (':' WORD)?
//! ```
//!
//! Juxtaposition binds at the conjunction level unless the mode (or, inside
//! a field group, the field connective) makes it a disjunction.

use super::lexer::{tokenize, Spanned, Token};
use super::syntax::{Clause, Connective, Prefix, QueryMode, SyntaxNode, Test};
use crate::error::CompileError;
use crate::Result;

/// Similarity for `term~` without a value
pub const DEFAULT_FUZZY_SIMILARITY: f32 = 0.5;

/// Parser for FTS expressions
pub struct FtsParser {
    tokens: Vec<Spanned>,
    index: usize,
    mode: QueryMode,
    field_connective: Connective,
}

impl FtsParser {
    pub fn new(input: &str, mode: QueryMode) -> Result<Self> {
        Ok(Self {
            tokens: tokenize(input)?,
            index: 0,
            mode,
            field_connective: Connective::And,
        })
    }

    /// Set the connective used between juxtaposed clauses of a field group
    pub fn with_field_connective(mut self, connective: Connective) -> Self {
        self.field_connective = connective;
        self
    }

    /// Parse the whole input
    pub fn parse(mut self) -> Result<SyntaxNode> {
        if *self.current() == Token::Eof {
            return Err(self.error("query"));
        }
        let node = self.parse_disjunction(self.top_level_juxtaposition())?;
        if *self.current() != Token::Eof {
            return Err(self.error("operator or end of input"));
        }
        Ok(node)
    }

    fn top_level_juxtaposition(&self) -> Connective {
        match self.mode {
            QueryMode::DefaultDisjunction => Connective::Or,
            QueryMode::Cmis | QueryMode::DefaultConjunction => Connective::And,
        }
    }

    fn parse_disjunction(&mut self, juxtapose: Connective) -> Result<SyntaxNode> {
        let mut branches = vec![self.parse_conjunction(juxtapose)?];
        loop {
            if *self.current() == Token::Or {
                self.advance();
                branches.push(self.parse_conjunction(juxtapose)?);
            } else if juxtapose == Connective::Or && self.is_start_of_clause() {
                branches.push(self.parse_conjunction(juxtapose)?);
            } else {
                break;
            }
        }
        Ok(collapse(branches, SyntaxNode::Disjunction))
    }

    fn parse_conjunction(&mut self, juxtapose: Connective) -> Result<SyntaxNode> {
        let mut clauses = vec![self.parse_clause()?];
        loop {
            if *self.current() == Token::And {
                self.reject_in_cmis("AND")?;
                self.advance();
                clauses.push(self.parse_clause()?);
            } else if juxtapose == Connective::And && self.is_start_of_clause() {
                clauses.push(self.parse_clause()?);
            } else {
                break;
            }
        }
        Ok(collapse(clauses, SyntaxNode::Conjunction))
    }

    fn parse_clause(&mut self) -> Result<SyntaxNode> {
        let prefix = match self.current() {
            Token::Plus => Prefix::Mandatory,
            Token::Minus => Prefix::Exclude,
            Token::Bar => Prefix::Optional,
            Token::Bang | Token::Not => Prefix::Negation,
            _ => Prefix::Default,
        };
        if prefix != Prefix::Default {
            if prefix != Prefix::Exclude {
                self.reject_in_cmis("clause prefix")?;
            }
            self.advance();
        }

        let test = self.parse_test()?;
        let boost = self.parse_boost()?;
        Ok(SyntaxNode::Clause(Clause {
            prefix,
            test,
            boost,
        }))
    }

    fn parse_test(&mut self) -> Result<Test> {
        match self.current() {
            Token::LeftParen => {
                self.reject_in_cmis("group")?;
                self.advance();
                let body = self.parse_disjunction(self.top_level_juxtaposition())?;
                self.expect(Token::RightParen, "')'")?;
                Ok(Test::Group(Box::new(body)))
            }
            Token::Percent => {
                self.reject_in_cmis("template placeholder")?;
                self.advance();
                self.parse_placeholder()
            }
            Token::Equals
                if matches!(self.peek(1), Token::Word(_)) && *self.peek(2) == Token::Colon =>
            {
                self.reject_in_cmis("'='")?;
                self.advance();
                let field = self.parse_field_reference()?;
                self.expect(Token::Colon, "':'")?;
                match self.current().clone() {
                    Token::Word(text) => {
                        self.advance();
                        Ok(Test::ExactTerm {
                            field: Some(field),
                            text,
                        })
                    }
                    Token::Phrase(text) => {
                        self.advance();
                        Ok(Test::ExactPhrase {
                            field: Some(field),
                            text,
                        })
                    }
                    _ => Err(self.error("word or phrase after exact field")),
                }
            }
            Token::Word(_) if *self.peek(1) == Token::Colon => {
                self.reject_in_cmis("field reference")?;
                let field = self.parse_field_reference()?;
                self.expect(Token::Colon, "':'")?;
                if *self.current() == Token::LeftParen {
                    self.advance();
                    let body = self.parse_disjunction(self.field_connective)?;
                    self.expect(Token::RightParen, "')'")?;
                    return Ok(Test::FieldGroup {
                        field,
                        body: Box::new(body),
                    });
                }
                self.parse_leaf(Some(field))
            }
            _ => self.parse_leaf(None),
        }
    }

    /// `WORD` or `WORD ':' WORD` where the second form is followed by `:`
    fn parse_field_reference(&mut self) -> Result<String> {
        let first = self.expect_word("field name")?;
        if *self.current() == Token::Colon
            && matches!(self.peek(1), Token::Word(_))
            && *self.peek(2) == Token::Colon
        {
            self.advance();
            let local = self.expect_word("local name")?;
            return Ok(format!("{}:{}", first, local));
        }
        Ok(first)
    }

    /// Field name inside a placeholder: `WORD (':' WORD)?`
    fn parse_placeholder_field(&mut self) -> Result<String> {
        let first = self.expect_word("field name")?;
        if *self.current() == Token::Colon && matches!(self.peek(1), Token::Word(_)) {
            self.advance();
            let local = self.expect_word("local name")?;
            return Ok(format!("{}:{}", first, local));
        }
        Ok(first)
    }

    fn parse_placeholder(&mut self) -> Result<Test> {
        if *self.current() != Token::LeftParen {
            let field = self.parse_placeholder_field()?;
            return Ok(Test::Placeholder {
                fields: vec![field],
            });
        }

        self.advance();
        let mut fields = Vec::new();
        while matches!(self.current(), Token::Word(_)) {
            fields.push(self.parse_placeholder_field()?);
        }
        if fields.is_empty() {
            return Err(self.error("field name"));
        }
        self.expect(Token::RightParen, "')'")?;
        Ok(Test::Placeholder { fields })
    }

    fn parse_leaf(&mut self, field: Option<String>) -> Result<Test> {
        match self.current().clone() {
            Token::Equals => {
                self.reject_in_cmis("'='")?;
                self.advance();
                match self.current().clone() {
                    Token::Word(text) => {
                        self.advance();
                        Ok(Test::ExactTerm { field, text })
                    }
                    Token::Phrase(text) => {
                        self.advance();
                        Ok(Test::ExactPhrase { field, text })
                    }
                    _ => Err(self.error("word or phrase after '='")),
                }
            }
            Token::Synonym => {
                self.reject_in_cmis("'~'")?;
                self.advance();
                let text = self.expect_word("word after '~'")?;
                Ok(Test::Synonym { field, text })
            }
            Token::Phrase(text) => {
                self.advance();
                let slop = match *self.current() {
                    Token::Tilde(slop) => {
                        self.reject_in_cmis("phrase slop")?;
                        self.advance();
                        Some(slop.unwrap_or(0.0) as u32)
                    }
                    _ => None,
                };
                Ok(Test::Phrase { field, text, slop })
            }
            Token::LeftBracket | Token::LeftAngle => {
                self.reject_in_cmis("range")?;
                self.parse_range(field)
            }
            Token::Word(text) => {
                self.advance();
                if *self.current() == Token::DotDot {
                    self.reject_in_cmis("range")?;
                    self.advance();
                    let upper = self.expect_word("range upper bound")?;
                    return Ok(Test::Range {
                        field,
                        lower: text,
                        upper,
                        include_lower: true,
                        include_upper: true,
                    });
                }
                if self.is_proximity() {
                    self.reject_in_cmis("proximity")?;
                    return self.parse_proximity(field, text);
                }
                let fuzzy = match *self.current() {
                    Token::Tilde(similarity) => {
                        self.reject_in_cmis("fuzzy match")?;
                        self.advance();
                        Some(similarity.unwrap_or(DEFAULT_FUZZY_SIMILARITY))
                    }
                    _ => None,
                };
                Ok(Test::Term { field, text, fuzzy })
            }
            _ => Err(self.error("term, phrase, range or group")),
        }
    }

    fn is_proximity(&self) -> bool {
        matches!(self.current(), Token::Word(w) if w == "*")
            && matches!(self.peek(1), Token::LeftParen | Token::Word(_))
    }

    fn parse_proximity(&mut self, field: Option<String>, first: String) -> Result<Test> {
        self.advance();
        let mut distance = None;
        if *self.current() == Token::LeftParen {
            self.advance();
            if let Token::Word(n) = self.current().clone() {
                distance = Some(n.parse::<u32>().map_err(|_| self.error("proximity distance"))?);
                self.advance();
            }
            self.expect(Token::RightParen, "')'")?;
        }
        let second = self.expect_word("word after proximity operator")?;
        Ok(Test::Proximity {
            field,
            first,
            second,
            distance,
        })
    }

    fn parse_range(&mut self, field: Option<String>) -> Result<Test> {
        let include_lower = *self.current() == Token::LeftBracket;
        self.advance();

        let lower = self.expect_bound()?;
        match self.current() {
            Token::Word(w) if w.eq_ignore_ascii_case("TO") => self.advance(),
            _ => return Err(self.error("TO")),
        }
        let upper = self.expect_bound()?;

        let include_upper = match self.current() {
            Token::RightBracket => true,
            Token::RightAngle => false,
            _ => return Err(self.error("']' or '>'")),
        };
        self.advance();

        Ok(Test::Range {
            field,
            lower,
            upper,
            include_lower,
            include_upper,
        })
    }

    fn expect_bound(&mut self) -> Result<String> {
        match self.current().clone() {
            Token::Word(bound) | Token::Phrase(bound) => {
                self.advance();
                Ok(bound)
            }
            _ => Err(self.error("range bound")),
        }
    }

    fn parse_boost(&mut self) -> Result<Option<f32>> {
        if let Token::Caret(boost) = *self.current() {
            self.reject_in_cmis("boost")?;
            self.advance();
            return match boost {
                Some(b) => Ok(Some(b)),
                None => Err(self.error("boost value")),
            };
        }
        Ok(None)
    }

    fn is_start_of_clause(&self) -> bool {
        matches!(
            self.current(),
            Token::Word(_)
                | Token::Phrase(_)
                | Token::LeftParen
                | Token::LeftBracket
                | Token::LeftAngle
                | Token::Plus
                | Token::Minus
                | Token::Bar
                | Token::Bang
                | Token::Not
                | Token::Equals
                | Token::Percent
                | Token::Synonym
        )
    }

    fn reject_in_cmis(&self, construct: &str) -> Result<()> {
        if self.mode == QueryMode::Cmis {
            return Err(CompileError::syntax(
                self.position(),
                "term, phrase, '-' or OR",
                construct,
            ));
        }
        Ok(())
    }

    fn expect_word(&mut self, description: &str) -> Result<String> {
        match self.current().clone() {
            Token::Word(word) => {
                self.advance();
                Ok(word)
            }
            _ => Err(self.error(description)),
        }
    }

    fn expect(&mut self, expected: Token, description: &str) -> Result<()> {
        if std::mem::discriminant(self.current()) == std::mem::discriminant(&expected) {
            self.advance();
            Ok(())
        } else {
            Err(self.error(description))
        }
    }

    fn current(&self) -> &Token {
        self.peek(0)
    }

    fn peek(&self, offset: usize) -> &Token {
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[(self.index + offset).min(last)].token
    }

    fn position(&self) -> usize {
        let last = self.tokens.len().saturating_sub(1);
        self.tokens[self.index.min(last)].position
    }

    fn advance(&mut self) {
        if self.index + 1 < self.tokens.len() {
            self.index += 1;
        }
    }

    fn error(&self, expected: &str) -> CompileError {
        CompileError::syntax(self.position(), expected, self.current().to_string())
    }
}

fn collapse(mut nodes: Vec<SyntaxNode>, wrap: fn(Vec<SyntaxNode>) -> SyntaxNode) -> SyntaxNode {
    if nodes.len() == 1 {
        if let Some(node) = nodes.pop() {
            return node;
        }
    }
    wrap(nodes)
}
