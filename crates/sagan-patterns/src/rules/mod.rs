//! Built-in rule tables, one module per language
//!
//! Each module exposes `rules()` returning its rules in evaluation order.
//! Adding a language means adding a module here and one line in
//! [`builtin_rules`].

use crate::error::PatternError;
use crate::language::Language;
use crate::rule::PatternRule;
use regex::{Captures, Regex};

mod abap;
mod go;
mod java;
mod javascript;
mod python;
mod ruby;

/// Every built-in rule table keyed by language tag
///
/// # Errors
/// Returns `PatternError` if any built-in pattern fails to compile.
pub fn builtin_rules() -> Result<Vec<(Language, Vec<PatternRule>)>, PatternError> {
    Ok(vec![
        (Language::python(), python::rules()?),
        (Language::javascript(), javascript::rules()?),
        (Language::abap(), abap::rules()?),
        (Language::java(), java::rules()?),
        (Language::go(), go::rules()?),
        (Language::ruby(), ruby::rules()?),
    ])
}

/// Double-quoted literal, backslash escapes included
pub(crate) const DOUBLE_QUOTED: &str = r#""(?:[^"\\\n]|\\.)*""#;

/// Single-quoted literal, backslash escapes included
pub(crate) const SINGLE_QUOTED: &str = r"'(?:[^'\\\n]|\\.)*'";

/// Backtick literal on one line
pub(crate) const BACKTICK_QUOTED: &str = r"`[^`\n]*`";

/// Byte offset of the `)` closing an argument list that starts at `text[0]`
///
/// Quoted literals are skipped, so parentheses inside strings do not count.
/// Returns `None` when the list is not closed on the same line.
pub(crate) fn closing_paren(text: &str) -> Option<usize> {
    let mut depth = 1_usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (idx, ch) in text.char_indices() {
        if ch == '\n' {
            return None;
        }
        if let Some(open) = quote {
            if escaped {
                escaped = false;
            } else if ch == '\\' && open != '`' {
                escaped = true;
            } else if ch == open {
                quote = None;
            }
            continue;
        }
        match ch {
            '"' | '\'' | '`' => quote = Some(ch),
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(idx);
                }
            }
            _ => {}
        }
    }
    None
}

/// Replace every call whose head matches `head` together with its arguments
///
/// `head` must end right after the opening parenthesis (or inside the list).
/// `render` receives the head captures and the raw argument text up to the
/// balancing `)`, and its output replaces the whole call. Calls whose
/// argument list does not close on the same line are left untouched.
pub(crate) fn replace_with_args<F>(content: &str, head: &Regex, mut render: F) -> String
where
    F: FnMut(&Captures<'_>, &str) -> String,
{
    let mut out = String::with_capacity(content.len());
    let mut last = 0;

    for caps in head.captures_iter(content) {
        let Some(whole) = caps.get(0) else { continue };
        if whole.start() < last {
            continue;
        }
        let rest = &content[whole.end()..];
        let Some(end) = closing_paren(rest) else { continue };

        out.push_str(&content[last..whole.start()]);
        out.push_str(&render(&caps, &rest[..end]));
        last = whole.end() + end + 1;
    }
    out.push_str(&content[last..]);
    out
}

/// Prepend `line` unless some line of `content` already equals it
pub(crate) fn ensure_line(content: &str, line: &str) -> String {
    if content.lines().any(|l| l.trim() == line) {
        content.to_string()
    } else {
        format!("{line}\n{content}")
    }
}
