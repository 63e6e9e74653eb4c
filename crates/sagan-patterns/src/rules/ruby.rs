//! Ruby rules

use super::{DOUBLE_QUOTED, SINGLE_QUOTED};
use crate::error::PatternError;
use crate::rule::{compile, PatternRule};
use regex::Captures;
use std::fmt::Write as _;

const COMMAND_INJECTION: &str = "Command Injection";
const HARDCODED_SECRET: &str = "Hardcoded Secret";

pub(super) fn rules() -> Result<Vec<PatternRule>, PatternError> {
    Ok(vec![command_injection()?, hardcoded_secret()?])
}

/// Shell strings become argv-form `system` calls.
///
/// The command line is split on whitespace. Concatenated variables and
/// `#{...}` interpolations that stand alone become their own argument;
/// ones glued to text stay inside an interpolated word.
fn command_injection() -> Result<PatternRule, PatternError> {
    let operand = format!(r"(?:{DOUBLE_QUOTED}|\w+)");
    let concatenated = compile(
        COMMAND_INJECTION,
        &format!(r"\bsystem\(\s*({operand}(?:\s*\+\s*{operand})+)\s*\)"),
    )?;
    let pieces = compile(COMMAND_INJECTION, &format!(r"{DOUBLE_QUOTED}|\w+"))?;
    let interpolated = compile(
        COMMAND_INJECTION,
        r#"\bsystem\(\s*"((?:[^"\\\n]|\\.)*#\{(?:[^"\\\n]|\\.)*)"\s*\)"#,
    )?;
    let interpolation = compile(COMMAND_INJECTION, r"#\{([^{}\n]+)\}")?;

    PatternRule::builder(COMMAND_INJECTION)
        .any_of(format!(r"\bsystem\(\s*{DOUBLE_QUOTED}\s*\+"))
        .any_of(r#"\bsystem\(\s*"(?:[^"\\\n]|\\.)*#\{"#)
        .transform(move |content| {
            let fixed = concatenated.replace_all(content, |caps: &Captures<'_>| {
                let parts = pieces
                    .find_iter(&caps[1])
                    .map(|m| {
                        let text = m.as_str();
                        match text.strip_prefix('"').and_then(|q| q.strip_suffix('"')) {
                            Some(quoted) => Piece::Text(quoted.to_string()),
                            None => Piece::Expr(text.to_string()),
                        }
                    })
                    .collect::<Vec<_>>();
                argv_call(&parts).unwrap_or_else(|| caps[0].to_string())
            });

            interpolated
                .replace_all(&fixed, |caps: &Captures<'_>| {
                    let body = &caps[1];
                    let mut parts = Vec::new();
                    let mut last = 0;
                    for found in interpolation.captures_iter(body) {
                        let Some(whole) = found.get(0) else { continue };
                        parts.push(Piece::Text(body[last..whole.start()].to_string()));
                        parts.push(Piece::Expr(found[1].trim().to_string()));
                        last = whole.end();
                    }
                    parts.push(Piece::Text(body[last..].to_string()));
                    argv_call(&parts).unwrap_or_else(|| caps[0].to_string())
                })
                .into_owned()
        })
        .build()
}

/// Fragment of a shell command line
enum Piece {
    /// Literal text, escapes kept as written
    Text(String),
    /// Ruby expression spliced into the line
    Expr(String),
}

/// One argv word being assembled
#[derive(Default)]
struct Word {
    body: String,
    lone: Option<String>,
    mixed: bool,
}

impl Word {
    fn push_text(&mut self, ch: char) {
        self.mixed = true;
        self.body.push(ch);
    }

    fn push_expr(&mut self, expr: &str) {
        if self.body.is_empty() {
            self.lone = Some(expr.to_string());
        } else {
            self.mixed = true;
        }
        let _ = write!(self.body, "#{{{expr}}}");
    }

    fn finish(&mut self, args: &mut Vec<String>) {
        if self.body.is_empty() {
            return;
        }
        let word = std::mem::take(self);
        args.push(match word.lone {
            Some(expr) if !word.mixed => expr,
            _ => format!("\"{}\"", word.body),
        });
    }
}

/// Render `system(arg, ...)` from command-line pieces
///
/// Returns `None` for fewer than two words, since a single string would
/// still go through the shell.
fn argv_call(pieces: &[Piece]) -> Option<String> {
    let mut args = Vec::new();
    let mut word = Word::default();
    for piece in pieces {
        match piece {
            Piece::Text(text) => {
                for ch in text.chars() {
                    if ch.is_whitespace() {
                        word.finish(&mut args);
                    } else {
                        word.push_text(ch);
                    }
                }
            }
            Piece::Expr(expr) => word.push_expr(expr),
        }
    }
    word.finish(&mut args);

    (args.len() >= 2).then(|| format!("system({})", args.join(", ")))
}

fn hardcoded_secret() -> Result<PatternRule, PatternError> {
    let literal = compile(
        HARDCODED_SECRET,
        &format!(r"\b([A-Z_]*API_KEY)[ \t]*=[ \t]*(?:{DOUBLE_QUOTED}|{SINGLE_QUOTED})"),
    )?;

    PatternRule::builder(HARDCODED_SECRET)
        .require(r#"\b[A-Z_]*API_KEY[ \t]*=[ \t]*["']"#)
        .forbid("ENV[")
        .forbid("ENV.fetch")
        .marker("ENV.fetch")
        .transform(move |content| {
            literal
                .replace_all(content, r#"${1} = ENV.fetch("${1}")"#)
                .into_owned()
        })
        .build()
}
