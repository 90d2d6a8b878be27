//! Recursive descent parser for classic query strings
//!
//! The parser owns the boolean structure of a query; every leaf is handed to
//! a [`QueryHooks`] implementation that decides what backend query, if any,
//! the leaf becomes. A hook returning `None` drops that clause.
//!
//! # Grammar
//!
//! ```text
//! query       := or_expr EOF
//! or_expr     := and_expr (OR and_expr)*
//! and_expr    := unary (AND? unary)*
//! unary       := (NOT | '-' | '+')? primary
//! primary     := TERM ':' value | value | '(' or_expr ')'
//! value       := range | phrase | term | '(' or_expr ')'
//! range       := ('[' | '{') bound TO bound (']' | '}') boost?
//! phrase      := QUOTED ('~' slop)? boost?
//! term        := TERM ('~' fuzziness?)? boost?
//! ```

use super::escape::{has_unescaped_wildcard, prefix_of};
use super::lexer::{Lexer, Token};
use crate::backend::{BackendQuery, BoolOccur, BooleanClause};
use crate::error::CompileError;
use crate::Result;

/// Default edit distance for `term~`
const DEFAULT_FUZZINESS: f32 = 2.0;

/// Operator between juxtaposed clauses
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DefaultOperator {
    And,
    #[default]
    Or,
}

/// Construction hooks called for every leaf of a classic query
///
/// Text arguments are raw: backslash escapes are still present.
pub trait QueryHooks {
    /// A plain term or quoted phrase; `slop` is only meaningful for phrases
    fn field_query(
        &mut self,
        field: &str,
        text: &str,
        quoted: bool,
        slop: u32,
    ) -> Result<Option<BackendQuery>>;

    fn prefix_query(&mut self, field: &str, prefix: &str) -> Result<Option<BackendQuery>>;

    fn wildcard_query(&mut self, field: &str, pattern: &str) -> Result<Option<BackendQuery>>;

    fn fuzzy_query(
        &mut self,
        field: &str,
        term: &str,
        similarity: f32,
    ) -> Result<Option<BackendQuery>>;

    fn range_query(
        &mut self,
        field: &str,
        lower: Option<&str>,
        upper: Option<&str>,
        include_lower: bool,
        include_upper: bool,
    ) -> Result<Option<BackendQuery>>;
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Modifier {
    None,
    Required,
    Prohibited,
}

/// Parser for classic query strings
pub struct QueryStringParser<'h, H: QueryHooks> {
    lexer: Lexer,
    current_token: Token,
    current_position: usize,
    default_field: String,
    default_operator: DefaultOperator,
    hooks: &'h mut H,
}

impl<'h, H: QueryHooks> QueryStringParser<'h, H> {
    pub fn new(input: &str, default_field: impl Into<String>, hooks: &'h mut H) -> Result<Self> {
        let mut lexer = Lexer::new(input);
        let current_token = lexer.next_token()?;
        let current_position = lexer.token_start();

        Ok(Self {
            lexer,
            current_token,
            current_position,
            default_field: default_field.into(),
            default_operator: DefaultOperator::Or,
            hooks,
        })
    }

    /// Set the operator used between juxtaposed clauses
    pub fn with_default_operator(mut self, operator: DefaultOperator) -> Self {
        self.default_operator = operator;
        self
    }

    /// Parse the whole input; `None` means every clause was dropped
    pub fn parse(mut self) -> Result<Option<BackendQuery>> {
        if self.current_token == Token::Eof {
            return Err(self.error("query"));
        }
        let field = self.default_field.clone();
        let query = self.parse_or_expr(&field)?;

        if self.current_token != Token::Eof {
            return Err(self.error("operator or end of input"));
        }
        Ok(query)
    }

    /// Parse: or_expr := and_expr (OR and_expr)*
    fn parse_or_expr(&mut self, field: &str) -> Result<Option<BackendQuery>> {
        let mut branches = vec![self.parse_and_expr(field)?];

        while self.current_token == Token::Or {
            self.advance()?;
            branches.push(self.parse_and_expr(field)?);
        }

        if branches.len() == 1 {
            return Ok(branches.pop().flatten());
        }
        Ok(BackendQuery::combine(
            branches
                .into_iter()
                .flatten()
                .map(|q| BooleanClause::new(q, BoolOccur::Should))
                .collect(),
        ))
    }

    /// Parse: and_expr := unary (AND? unary)*
    ///
    /// An explicit AND makes both of its neighbours required; juxtaposed
    /// clauses take the default operator.
    fn parse_and_expr(&mut self, field: &str) -> Result<Option<BackendQuery>> {
        let implicit = match self.default_operator {
            DefaultOperator::And => BoolOccur::Must,
            DefaultOperator::Or => BoolOccur::Should,
        };
        let mut clauses: Vec<(Option<BackendQuery>, Modifier, BoolOccur)> = Vec::new();

        let (query, modifier) = self.parse_unary(field)?;
        clauses.push((query, modifier, occur_for(modifier, implicit)));

        loop {
            if self.current_token == Token::And {
                self.advance()?;
                if let Some(last) = clauses.last_mut() {
                    if last.1 == Modifier::None {
                        last.2 = BoolOccur::Must;
                    }
                }
                let (query, modifier) = self.parse_unary(field)?;
                clauses.push((query, modifier, occur_for(modifier, BoolOccur::Must)));
            } else if self.is_start_of_clause() {
                let (query, modifier) = self.parse_unary(field)?;
                clauses.push((query, modifier, occur_for(modifier, implicit)));
            } else {
                break;
            }
        }

        let clauses: Vec<BooleanClause> = clauses
            .into_iter()
            .filter_map(|(query, _, occur)| query.map(|q| BooleanClause::new(q, occur)))
            .collect();
        Ok(BackendQuery::combine(clauses))
    }

    /// Parse: unary := (NOT | '-' | '+')? primary
    fn parse_unary(&mut self, field: &str) -> Result<(Option<BackendQuery>, Modifier)> {
        let modifier = match self.current_token {
            Token::Not | Token::Minus => {
                self.advance()?;
                Modifier::Prohibited
            }
            Token::Plus => {
                self.advance()?;
                Modifier::Required
            }
            _ => Modifier::None,
        };
        let query = self.parse_primary(field)?;
        Ok((query, modifier))
    }

    /// Parse: primary := TERM ':' value | value | '(' or_expr ')'
    fn parse_primary(&mut self, field: &str) -> Result<Option<BackendQuery>> {
        if let Token::Term(term) = &self.current_token {
            let term = term.clone();
            self.advance()?;

            if self.current_token == Token::Colon {
                self.advance()?;
                if term == "*" && self.current_token == Token::Term("*".to_string()) {
                    self.advance()?;
                    return Ok(Some(BackendQuery::MatchAll));
                }
                return self.parse_value(&term);
            }
            return self.parse_term(field, &term);
        }
        self.parse_value(field)
    }

    fn parse_value(&mut self, field: &str) -> Result<Option<BackendQuery>> {
        match &self.current_token {
            Token::LeftParen => {
                self.advance()?;
                let inner = self.parse_or_expr(field)?;
                self.expect(Token::RightParen, "')'")?;
                let boost = self.parse_boost()?;
                Ok(inner.map(|q| q.with_boost(boost)))
            }
            Token::LeftBracket | Token::LeftBrace => self.parse_range(field),
            Token::Quoted(text) => {
                let text = text.clone();
                self.advance()?;
                let slop = match self.current_token {
                    Token::Tilde(slop) => {
                        self.advance()?;
                        slop.unwrap_or(0.0) as u32
                    }
                    _ => 0,
                };
                let boost = self.parse_boost()?;
                let query = self.hooks.field_query(field, &text, true, slop)?;
                Ok(query.map(|q| q.with_boost(boost)))
            }
            Token::Term(term) => {
                let term = term.clone();
                self.advance()?;
                self.parse_term(field, &term)
            }
            _ => Err(self.error("term, phrase, range or group")),
        }
    }

    /// Parse a term with optional fuzzy and boost modifiers
    fn parse_term(&mut self, field: &str, term: &str) -> Result<Option<BackendQuery>> {
        let fuzziness = match self.current_token {
            Token::Tilde(distance) => {
                self.advance()?;
                Some(distance.unwrap_or(DEFAULT_FUZZINESS))
            }
            _ => None,
        };
        let boost = self.parse_boost()?;

        let has_wildcard = has_unescaped_wildcard(term);
        let query = if let Some(similarity) = fuzziness {
            if has_wildcard {
                return Err(CompileError::Unsupported(format!(
                    "fuzzy matching combined with wildcards in '{}'",
                    term
                )));
            }
            self.hooks.fuzzy_query(field, term, similarity)?
        } else if let Some(prefix) = prefix_of(term) {
            self.hooks.prefix_query(field, prefix)?
        } else if has_wildcard {
            self.hooks.wildcard_query(field, term)?
        } else {
            self.hooks.field_query(field, term, false, 0)?
        };

        Ok(query.map(|q| q.with_boost(boost)))
    }

    /// Parse range query: [low TO high] or {low TO high}
    fn parse_range(&mut self, field: &str) -> Result<Option<BackendQuery>> {
        let include_lower = self.current_token == Token::LeftBracket;
        self.advance()?;

        let lower = self.parse_range_bound()?;
        self.expect(Token::To, "TO")?;
        let upper = self.parse_range_bound()?;

        let include_upper = match self.current_token {
            Token::RightBracket => true,
            Token::RightBrace => false,
            _ => return Err(self.error("']' or '}'")),
        };
        self.advance()?;
        let boost = self.parse_boost()?;

        let query = self.hooks.range_query(
            field,
            lower.as_deref(),
            upper.as_deref(),
            include_lower,
            include_upper,
        )?;
        Ok(query.map(|q| q.with_boost(boost)))
    }

    fn parse_range_bound(&mut self) -> Result<Option<String>> {
        let bound = match &self.current_token {
            Token::Term(t) if t == "*" => None,
            Token::Term(t) | Token::Quoted(t) => Some(t.clone()),
            _ => return Err(self.error("range bound")),
        };
        self.advance()?;
        Ok(bound)
    }

    fn parse_boost(&mut self) -> Result<Option<f32>> {
        if let Token::Caret(boost) = self.current_token {
            self.advance()?;
            return match boost {
                Some(b) => Ok(Some(b)),
                None => Err(self.error("boost value")),
            };
        }
        Ok(None)
    }

    fn is_start_of_clause(&self) -> bool {
        matches!(
            self.current_token,
            Token::Term(_)
                | Token::Quoted(_)
                | Token::LeftParen
                | Token::LeftBracket
                | Token::LeftBrace
                | Token::Plus
                | Token::Minus
                | Token::Not
        )
    }

    fn advance(&mut self) -> Result<()> {
        self.current_token = self.lexer.next_token()?;
        self.current_position = self.lexer.token_start();
        Ok(())
    }

    fn expect(&mut self, expected: Token, description: &str) -> Result<()> {
        if std::mem::discriminant(&self.current_token) == std::mem::discriminant(&expected) {
            self.advance()
        } else {
            Err(self.error(description))
        }
    }

    fn error(&self, expected: &str) -> CompileError {
        CompileError::syntax(self.current_position, expected, self.current_token.to_string())
    }
}

fn occur_for(modifier: Modifier, unmodified: BoolOccur) -> BoolOccur {
    match modifier {
        Modifier::Required => BoolOccur::Must,
        Modifier::Prohibited => BoolOccur::MustNot,
        Modifier::None => unmodified,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Hooks that record every call as a plain backend query
    #[derive(Default)]
    struct Recording {
        calls: Vec<String>,
    }

    impl QueryHooks for Recording {
        fn field_query(
            &mut self,
            field: &str,
            text: &str,
            quoted: bool,
            slop: u32,
        ) -> Result<Option<BackendQuery>> {
            self.calls.push(format!("field {} {} {} {}", field, text, quoted, slop));
            if field == "DROP" {
                return Ok(None);
            }
            Ok(Some(BackendQuery::term(field, text)))
        }

        fn prefix_query(&mut self, field: &str, prefix: &str) -> Result<Option<BackendQuery>> {
            self.calls.push(format!("prefix {} {}", field, prefix));
            Ok(Some(BackendQuery::Prefix {
                field: field.to_string(),
                prefix: prefix.to_string(),
            }))
        }

        fn wildcard_query(&mut self, field: &str, pattern: &str) -> Result<Option<BackendQuery>> {
            self.calls.push(format!("wildcard {} {}", field, pattern));
            Ok(Some(BackendQuery::wildcard(field, pattern)))
        }

        fn fuzzy_query(
            &mut self,
            field: &str,
            term: &str,
            similarity: f32,
        ) -> Result<Option<BackendQuery>> {
            self.calls.push(format!("fuzzy {} {} {}", field, term, similarity));
            Ok(Some(BackendQuery::Fuzzy {
                field: field.to_string(),
                term: term.to_string(),
                similarity,
            }))
        }

        fn range_query(
            &mut self,
            field: &str,
            lower: Option<&str>,
            upper: Option<&str>,
            include_lower: bool,
            include_upper: bool,
        ) -> Result<Option<BackendQuery>> {
            self.calls.push(format!(
                "range {} {:?} {:?} {} {}",
                field, lower, upper, include_lower, include_upper
            ));
            Ok(Some(BackendQuery::Range {
                field: field.to_string(),
                lower: lower.map(String::from),
                upper: upper.map(String::from),
                include_lower,
                include_upper,
            }))
        }
    }

    fn parse_with(input: &str, op: DefaultOperator) -> (Result<Option<BackendQuery>>, Vec<String>) {
        let mut hooks = Recording::default();
        let result = QueryStringParser::new(input, "TEXT", &mut hooks)
            .and_then(|p| p.with_default_operator(op).parse());
        (result, hooks.calls)
    }

    fn parse(input: &str) -> Option<BackendQuery> {
        parse_with(input, DefaultOperator::Or).0.unwrap()
    }

    fn occurs(query: &BackendQuery) -> Vec<BoolOccur> {
        match query {
            BackendQuery::Boolean { clauses } => clauses.iter().map(|c| c.occur).collect(),
            _ => panic!("expected boolean, got {:?}", query),
        }
    }

    #[test]
    fn test_single_term_collapses() {
        assert_eq!(parse("rust"), Some(BackendQuery::term("TEXT", "rust")));
    }

    #[test]
    fn test_field_term() {
        assert_eq!(parse("ID:42"), Some(BackendQuery::term("ID", "42")));
    }

    #[test]
    fn test_implicit_or() {
        let q = parse("a b").unwrap();
        assert_eq!(occurs(&q), vec![BoolOccur::Should, BoolOccur::Should]);
    }

    #[test]
    fn test_implicit_and() {
        let q = parse_with("a b", DefaultOperator::And).0.unwrap().unwrap();
        assert_eq!(occurs(&q), vec![BoolOccur::Must, BoolOccur::Must]);
    }

    #[test]
    fn test_explicit_and_upgrades_left() {
        let q = parse("a b AND c").unwrap();
        assert_eq!(
            occurs(&q),
            vec![BoolOccur::Should, BoolOccur::Must, BoolOccur::Must]
        );
    }

    #[test]
    fn test_or_of_ands() {
        let q = parse("a AND b OR c").unwrap();
        match &q {
            BackendQuery::Boolean { clauses } => {
                assert_eq!(clauses.len(), 2);
                assert_eq!(occurs(&clauses[0].query), vec![BoolOccur::Must, BoolOccur::Must]);
                assert_eq!(clauses[1].query, BackendQuery::term("TEXT", "c"));
            }
            _ => panic!("expected boolean"),
        }
    }

    #[test]
    fn test_modifiers() {
        let q = parse("+a -b NOT c").unwrap();
        assert_eq!(
            occurs(&q),
            vec![BoolOccur::Must, BoolOccur::MustNot, BoolOccur::MustNot]
        );
    }

    #[test]
    fn test_lone_negation_is_kept() {
        let q = parse("-draft").unwrap();
        assert_eq!(occurs(&q), vec![BoolOccur::MustNot]);
    }

    #[test]
    fn test_field_group_scopes_terms() {
        let (result, calls) = parse_with("TYPE:(a b)", DefaultOperator::Or);
        assert!(result.unwrap().is_some());
        assert_eq!(calls, vec!["field TYPE a false 0", "field TYPE b false 0"]);
    }

    #[test]
    fn test_unescaped_colon_in_field_is_rejected() {
        let (result, _) = parse_with(r#"cm:title:"big dog"~4"#, DefaultOperator::Or);
        assert!(matches!(result, Err(CompileError::Syntax { .. })));
    }

    #[test]
    fn test_escaped_field_phrase() {
        let (_, calls) = parse_with(r#"cm\:title:"big dog"~4"#, DefaultOperator::Or);
        assert_eq!(calls, vec![r"field cm\:title big dog true 4"]);
    }

    #[test]
    fn test_prefix_wildcard_fuzzy() {
        let (_, calls) = parse_with("ab* a?c* abc~ abc~1", DefaultOperator::Or);
        assert_eq!(
            calls,
            vec![
                "prefix TEXT ab",
                "wildcard TEXT a?c*",
                "fuzzy TEXT abc 2",
                "fuzzy TEXT abc 1"
            ]
        );
    }

    #[test]
    fn test_escaped_star_is_a_term() {
        let (_, calls) = parse_with(r"ab\*", DefaultOperator::Or);
        assert_eq!(calls, vec![r"field TEXT ab\* false 0"]);
    }

    #[test]
    fn test_fuzzy_wildcard_unsupported() {
        let (result, _) = parse_with("ab*~2", DefaultOperator::Or);
        assert!(matches!(result, Err(CompileError::Unsupported(_))));
    }

    #[test]
    fn test_range() {
        let (_, calls) = parse_with(r"cm\:size:[10 TO *}", DefaultOperator::Or);
        assert_eq!(calls, vec![r#"range cm\:size Some("10") None true false"#]);
    }

    #[test]
    fn test_match_all() {
        assert_eq!(parse("*:*"), Some(BackendQuery::MatchAll));
    }

    #[test]
    fn test_boost() {
        let q = parse("ID:1^3").unwrap();
        assert_eq!(
            q,
            BackendQuery::Boost {
                query: Box::new(BackendQuery::term("ID", "1")),
                boost: 3.0
            }
        );
    }

    #[test]
    fn test_dropped_clauses() {
        assert_eq!(parse("DROP:x"), None);
        assert_eq!(parse("DROP:x a"), Some(BackendQuery::term("TEXT", "a")));
    }

    #[test]
    fn test_syntax_errors() {
        let (result, _) = parse_with("(a OR b", DefaultOperator::Or);
        match result {
            Err(CompileError::Syntax { position, expected, found }) => {
                assert_eq!(position, 7);
                assert_eq!(expected, "')'");
                assert_eq!(found, "end of input");
            }
            other => panic!("expected syntax error, got {:?}", other),
        }
        assert!(parse_with("", DefaultOperator::Or).0.is_err());
        assert!(parse_with("a:", DefaultOperator::Or).0.is_err());
        assert!(parse_with("x:[1 2]", DefaultOperator::Or).0.is_err());
    }
}
