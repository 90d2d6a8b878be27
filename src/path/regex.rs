//! Regular-expression compilation of paths
//!
//! Used for relative paths, and for every path when positional matching is
//! disabled. The pattern matches the whole stored path string.

use crate::error::CompileError;
use crate::text;
use crate::Result;
use regex::Regex;

/// Pattern fragment for a `//` separator
const ANY_DESCENDANT: &str = "/(.*/)?";
/// Pattern fragment for a `*` name test
const ANY_NAME: &str = "[^/]+";
/// Prefix letting a relative path start at any depth
const ANY_ANCESTOR: &str = "(.*/)?";

/// Compile a path expression to a regex pattern over stored paths
pub fn compile_path_regex(expr: &str) -> Result<String> {
    let mut path = expr.trim();
    if path.is_empty() {
        return Err(CompileError::syntax(0, "path", "end of input"));
    }
    while let Some(rest) = path.strip_suffix("/.") {
        path = rest;
    }
    if path.is_empty() {
        path = "/";
    }

    let mut pattern = String::with_capacity(path.len() * 2);
    if let Some(rest) = path.strip_prefix("./") {
        path = rest;
        pattern.push_str(ANY_ANCESTOR);
    } else if !path.starts_with('/') {
        pattern.push_str(ANY_ANCESTOR);
    }

    let mut literal = String::new();
    let mut chars = path.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '/' => {
                flush_literal(&mut pattern, &mut literal);
                if chars.peek() == Some(&'/') {
                    chars.next();
                    pattern.push_str(ANY_DESCENDANT);
                } else {
                    pattern.push('/');
                }
            }
            '*' => {
                flush_literal(&mut pattern, &mut literal);
                pattern.push_str(ANY_NAME);
            }
            _ => literal.push(ch),
        }
    }
    flush_literal(&mut pattern, &mut literal);

    Regex::new(&format!("^{}$", pattern)).map_err(|e| {
        CompileError::Internal(format!("path '{}' produced an invalid pattern: {}", expr, e))
    })?;
    Ok(pattern)
}

fn flush_literal(pattern: &mut String, literal: &mut String) {
    if !literal.is_empty() {
        pattern.push_str(&regex::escape(&text::iso9075_decode(literal)));
        literal.clear();
    }
}
