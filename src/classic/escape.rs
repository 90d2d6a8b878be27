//! Two-stage escaping of literal values for the classic query syntax
//!
//! Stage one makes a literal safe from the syntax characters of the query
//! language. Stage two also neutralizes wildcards (unless they are meant),
//! leading `+`/`-` modifiers, whitespace and boolean keywords, so the engine's
//! free-text parser sees exactly the literal value.

/// Characters escaped by stage one
pub const SYNTAX_CHARS: [char; 11] = ['/', '!', '[', ']', '{', '}', '(', ')', '^', '~', ':'];

const KEYWORDS: [&str; 4] = ["AND", "OR", "NOT", "TO"];

fn is_escapable(ch: char) -> bool {
    SYNTAX_CHARS.contains(&ch)
        || ch.is_whitespace()
        || matches!(ch, '"' | '\\' | '*' | '?' | '%' | '+' | '-' | '&' | '|')
}

/// Stage one: escape syntax characters and double lone backslashes
///
/// A backslash already escaping a significant character is kept as a pair.
pub fn escape_syntax(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            match chars.peek() {
                Some(&next) if is_escapable(next) => {
                    out.push('\\');
                    out.push(next);
                    chars.next();
                }
                _ => out.push_str("\\\\"),
            }
        } else {
            if SYNTAX_CHARS.contains(&ch) || ch == '"' {
                out.push('\\');
            }
            out.push(ch);
        }
    }
    out
}

/// Stage one for an already unescaped literal: every backslash is doubled
pub fn escape_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    for ch in text.chars() {
        if ch == '\\' || SYNTAX_CHARS.contains(&ch) || ch == '"' {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Normalize raw query text into a wildcard pattern
///
/// Escapes of `*`, `?`, `%` and `\` survive; every other escape is resolved to
/// its literal character and an unescaped `%` becomes `*`.
pub fn to_wildcard_pattern(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => match chars.next() {
                Some(next @ ('*' | '?' | '%' | '\\')) => {
                    out.push('\\');
                    out.push(next);
                }
                Some(next) => out.push(next),
                None => out.push_str("\\\\"),
            },
            '%' => out.push('*'),
            _ => out.push(ch),
        }
    }
    out
}

/// Stage two: a value safe to embed in free text
///
/// Without `wildcards`, `text` is a literal and every character in it is
/// matched as written. With `wildcards` set, `text` is a wildcard pattern
/// whose escape pairs are kept, `*` and `?` stay live and `%` becomes `*`.
pub fn escape_value(text: &str, wildcards: bool) -> String {
    if KEYWORDS.contains(&text) {
        return text.chars().map(|c| format!("\\{}", c)).collect();
    }

    let staged = if wildcards {
        escape_syntax(text)
    } else {
        escape_literal(text)
    };
    let mut out = String::with_capacity(staged.len() + 4);
    let mut chars = staged.chars().peekable();
    let mut first = true;

    while let Some(ch) = chars.next() {
        match ch {
            '\\' => {
                // already escaped by stage one; copy the pair through
                out.push(ch);
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            }
            '*' | '?' if !wildcards => {
                out.push('\\');
                out.push(ch);
            }
            '%' if wildcards => out.push('*'),
            '%' => out.push_str("\\%"),
            '+' | '-' if first => {
                out.push('\\');
                out.push(ch);
            }
            '&' | '|' => {
                out.push('\\');
                out.push(ch);
            }
            c if c.is_whitespace() => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(ch),
        }
        first = false;
    }

    out
}

/// Escape a field name for use before the `:` separator
pub fn escape_field(field: &str) -> String {
    let mut out = escape_literal(field);
    if out.starts_with('-') || out.starts_with('+') {
        out.insert(0, '\\');
    }
    out
}

/// Whether text holds an unescaped `*`, `?` or `%`
pub fn has_unescaped_wildcard(text: &str) -> bool {
    let mut escaped = false;
    for ch in text.chars() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' => escaped = true,
            '*' | '?' | '%' => return true,
            _ => {}
        }
    }
    false
}

/// The prefix of `text*` when the trailing star is its only wildcard
pub fn prefix_of(text: &str) -> Option<&str> {
    let prefix = text.strip_suffix('*')?;
    if prefix.is_empty() || prefix.ends_with('\\') || has_unescaped_wildcard(prefix) {
        return None;
    }
    Some(prefix)
}
