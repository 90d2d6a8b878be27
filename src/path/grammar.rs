//! Push-style parser for path expressions
//!
//! The parser walks an XPath-like expression once and reports what it sees to
//! a [`PathHandler`]. Only absolute or relative chains of child steps, joined
//! by `/` or `//`, are meaningful to the compiler; every other XPath feature
//! has a handler event whose default implementation fails immediately.

use crate::error::CompileError;
use crate::Result;

/// Receives parse events for one path expression
pub trait PathHandler {
    fn start_path(&mut self, absolute: bool) -> Result<()>;

    /// A child step; `None` stands for the `*` wildcard
    fn child_step(&mut self, prefix: Option<&str>, local_name: Option<&str>) -> Result<()>;

    /// A `//` separator between steps
    fn descendant(&mut self) -> Result<()>;

    fn end_path(&mut self) -> Result<()>;

    fn self_step(&mut self) -> Result<()> {
        Err(unsupported("self step '.'"))
    }

    fn parent_step(&mut self) -> Result<()> {
        Err(unsupported("parent step '..'"))
    }

    fn axis(&mut self, name: &str) -> Result<()> {
        Err(unsupported(&format!("axis '{}::'", name)))
    }

    fn attribute(&mut self, name: &str) -> Result<()> {
        Err(unsupported(&format!("attribute step '@{}'", name)))
    }

    fn start_predicate(&mut self) -> Result<()> {
        Err(unsupported("predicate"))
    }

    fn function_call(&mut self, name: &str) -> Result<()> {
        Err(unsupported(&format!("function '{}()'", name)))
    }

    fn operator(&mut self, op: char) -> Result<()> {
        Err(unsupported(&format!("operator '{}'", op)))
    }

    fn literal(&mut self, value: &str) -> Result<()> {
        Err(unsupported(&format!("literal '{}'", value)))
    }
}

fn unsupported(what: &str) -> CompileError {
    CompileError::Unsupported(format!("{} in path expression", what))
}

const OPERATORS: [char; 10] = ['|', '+', '=', '<', '>', '!', ',', '$', '#', '%'];

/// Parse `expr`, pushing events into `handler`
pub fn parse_path(expr: &str, handler: &mut impl PathHandler) -> Result<()> {
    PathScanner::new(expr).run(handler)
}

struct PathScanner {
    input: Vec<char>,
    position: usize,
}

impl PathScanner {
    fn new(expr: &str) -> Self {
        Self {
            input: expr.trim().chars().collect(),
            position: 0,
        }
    }

    fn run(&mut self, handler: &mut impl PathHandler) -> Result<()> {
        if self.input.is_empty() {
            return Err(CompileError::syntax(0, "path", "end of input"));
        }

        let absolute = self.current() == Some('/');
        handler.start_path(absolute)?;

        if absolute {
            self.advance();
            if self.current() == Some('/') {
                self.advance();
                handler.descendant()?;
            } else if self.current().is_none() {
                return handler.end_path();
            }
        }

        loop {
            self.step(handler)?;

            match self.current() {
                None => return handler.end_path(),
                Some('/') => {
                    self.advance();
                    if self.current() == Some('/') {
                        self.advance();
                        handler.descendant()?;
                    }
                    if self.current().is_none() {
                        return Err(CompileError::syntax(self.position, "step", "end of input"));
                    }
                }
                Some('[') => {
                    handler.start_predicate()?;
                    return Err(self.unexpected("'/'"));
                }
                Some(c) if OPERATORS.contains(&c) => {
                    handler.operator(c)?;
                    return Err(self.unexpected("'/'"));
                }
                Some(_) => return Err(self.unexpected("'/' or end of path")),
            }
        }
    }

    fn step(&mut self, handler: &mut impl PathHandler) -> Result<()> {
        match self.current() {
            Some('.') => {
                self.advance();
                if self.current() == Some('.') {
                    self.advance();
                    handler.parent_step()
                } else {
                    handler.self_step()
                }
            }
            Some('@') => {
                self.advance();
                let name = self.name();
                handler.attribute(&name)
            }
            Some(q @ ('\'' | '"')) => {
                self.advance();
                let start = self.position;
                while self.current().is_some_and(|c| c != q) {
                    self.advance();
                }
                let value: String = self.input[start..self.position].iter().collect();
                handler.literal(&value)
            }
            Some('*') => {
                self.advance();
                if self.current() == Some(':') {
                    self.advance();
                    let local = self.local_name()?;
                    return handler.child_step(Some("*"), local.as_deref());
                }
                handler.child_step(None, None)
            }
            Some('{') => {
                self.advance();
                let start = self.position;
                while self.current().is_some_and(|c| c != '}') {
                    self.advance();
                }
                if self.current().is_none() {
                    return Err(CompileError::syntax(self.position, "'}'", "end of input"));
                }
                let uri: String = self.input[start..self.position].iter().collect();
                self.advance();
                let local = self.local_name()?;
                handler.child_step(Some(&format!("{{{}}}", uri)), local.as_deref())
            }
            Some(c) if is_name_char(c) => {
                let name = self.name();
                match self.current() {
                    Some(':') if self.peek() == Some(':') => {
                        self.advance();
                        self.advance();
                        handler.axis(&name)
                    }
                    Some(':') => {
                        self.advance();
                        let local = self.local_name()?;
                        handler.child_step(Some(&name), local.as_deref())
                    }
                    Some('(') => handler.function_call(&name),
                    _ => handler.child_step(None, Some(&name)),
                }
            }
            Some(c) if OPERATORS.contains(&c) => handler.operator(c),
            Some('[') => handler.start_predicate(),
            _ => Err(self.unexpected("step")),
        }
    }

    /// Local name after a prefix: a name or `*`
    fn local_name(&mut self) -> Result<Option<String>> {
        match self.current() {
            Some('*') => {
                self.advance();
                Ok(None)
            }
            Some(c) if is_name_char(c) => Ok(Some(self.name())),
            _ => Err(self.unexpected("local name")),
        }
    }

    fn name(&mut self) -> String {
        let start = self.position;
        while self.current().is_some_and(is_name_char) {
            self.advance();
        }
        self.input[start..self.position].iter().collect()
    }

    fn unexpected(&self, expected: &str) -> CompileError {
        let found = match self.current() {
            Some(c) => format!("'{}'", c),
            None => "end of input".to_string(),
        };
        CompileError::syntax(self.position, expected, found)
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
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-' || c == '.'
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records events as strings
    #[derive(Default)]
    struct Events(Vec<String>);

    impl PathHandler for Events {
        fn start_path(&mut self, absolute: bool) -> Result<()> {
            self.0.push(format!("start {}", absolute));
            Ok(())
        }

        fn child_step(&mut self, prefix: Option<&str>, local_name: Option<&str>) -> Result<()> {
            self.0.push(format!(
                "child {}:{}",
                prefix.unwrap_or("-"),
                local_name.unwrap_or("*")
            ));
            Ok(())
        }

        fn descendant(&mut self) -> Result<()> {
            self.0.push("descendant".to_string());
            Ok(())
        }

        fn end_path(&mut self) -> Result<()> {
            self.0.push("end".to_string());
            Ok(())
        }
    }

    fn events(expr: &str) -> Result<Vec<String>> {
        let mut handler = Events::default();
        parse_path(expr, &mut handler)?;
        Ok(handler.0)
    }

    #[test]
    fn test_absolute_path() {
        assert_eq!(
            events("/app:company_home/cm:docs").unwrap(),
            vec!["start true", "child app:company_home", "child cm:docs", "end"]
        );
    }

    #[test]
    fn test_descendant_and_wildcards() {
        assert_eq!(
            events("/a//cm:*/*").unwrap(),
            vec![
                "start true",
                "child -:a",
                "descendant",
                "child cm:*",
                "child -:*",
                "end"
            ]
        );
    }

    #[test]
    fn test_leading_descendant() {
        assert_eq!(
            events("//cm:x").unwrap(),
            vec!["start true", "descendant", "child cm:x", "end"]
        );
    }

    #[test]
    fn test_root_only() {
        assert_eq!(events("/").unwrap(), vec!["start true", "end"]);
    }

    #[test]
    fn test_relative_and_expanded() {
        assert_eq!(
            events("{urn:x}a/b").unwrap(),
            vec!["start false", "child {urn:x}:a", "child -:b", "end"]
        );
    }

    #[test]
    fn test_unsupported_features() {
        for expr in [
            "/a[1]",
            "/a/text()",
            "/a/descendant::b",
            "/a/@cm:name",
            "/a/..",
            "/a/./b",
            "/a | /b",
            "/a/'x'",
        ] {
            let err = events(expr).unwrap_err();
            assert!(
                matches!(err, CompileError::Unsupported(_)),
                "{} gave {:?}",
                expr,
                err
            );
        }
    }

    #[test]
    fn test_syntax_errors() {
        for expr in ["", "/a/", "/a//", "/{urn:x", "/cm:"] {
            let err = events(expr).unwrap_err();
            assert!(matches!(err, CompileError::Syntax { .. }), "{} gave {:?}", expr, err);
        }
    }
}
