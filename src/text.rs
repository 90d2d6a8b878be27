//! Literal text helpers shared by the surface parsers
//!
//! Query text reaches the compiler with two layers of encoding: backslash
//! escapes from the surface syntax, and the ISO 9075 `_xHHHH_` encoding used
//! for qualified names that contain characters illegal in XML names.

use regex::{Captures, Regex};
use std::sync::LazyLock;

static ISO9075_ESCAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"_x([0-9A-Fa-f]{4}|[0-9A-Fa-f]{8})_").expect("valid ISO 9075 pattern")
});

/// Remove backslash escapes, including `\uXXXX` unicode escapes
///
/// A trailing lone backslash is kept as-is. Malformed unicode escapes keep
/// the `u` and the following characters literally.
pub fn unescape(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];
        if ch != '\\' {
            out.push(ch);
            i += 1;
            continue;
        }
        match chars.get(i + 1) {
            None => {
                out.push('\\');
                i += 1;
            }
            Some('u') => {
                let hex: String = chars.iter().skip(i + 2).take(4).collect();
                let decoded = if hex.len() == 4 {
                    u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32)
                } else {
                    None
                };
                match decoded {
                    Some(c) => {
                        out.push(c);
                        i += 6;
                    }
                    None => {
                        out.push('u');
                        i += 2;
                    }
                }
            }
            Some(&next) => {
                out.push(next);
                i += 2;
            }
        }
    }

    out
}

/// Decode ISO 9075 `_xHHHH_` sequences
pub fn iso9075_decode(text: &str) -> String {
    if !text.contains("_x") {
        return text.to_string();
    }
    ISO9075_ESCAPE
        .replace_all(text, |caps: &Captures| {
            u32::from_str_radix(&caps[1], 16)
                .ok()
                .and_then(char::from_u32)
                .map(String::from)
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Encode a local name so it is a valid XML name
pub fn iso9075_encode(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());

    for (i, &ch) in chars.iter().enumerate() {
        let valid = if i == 0 {
            is_name_start(ch)
        } else {
            is_name_char(ch)
        };
        // An underscore that would read back as the start of an escape must itself be escaped
        let looks_escaped = ch == '_' && starts_escape(&chars[i..]);
        if valid && !looks_escaped {
            out.push(ch);
        } else {
            push_escaped(&mut out, ch);
        }
    }

    out
}

/// Unescape then ISO 9075 decode
pub fn extract(text: &str) -> String {
    iso9075_decode(&unescape(text))
}

fn push_escaped(out: &mut String, ch: char) {
    let code = ch as u32;
    if code > 0xFFFF {
        out.push_str(&format!("_x{:08X}_", code));
    } else {
        out.push_str(&format!("_x{:04X}_", code));
    }
}

fn starts_escape(chars: &[char]) -> bool {
    let tail: String = chars.iter().take(11).collect();
    ISO9075_ESCAPE
        .find(&tail)
        .map(|m| m.start() == 0)
        .unwrap_or(false)
}

fn is_name_start(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_'
}

fn is_name_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_' || ch == '-' || ch == '.'
}
