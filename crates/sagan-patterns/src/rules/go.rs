//! Go rules

use super::replace_with_args;
use crate::error::PatternError;
use crate::rule::{compile, PatternRule};
use regex::{Captures, Regex};

const SQL_INJECTION: &str = "SQL Injection";
const COMMAND_INJECTION: &str = "Command Injection";

pub(super) fn rules() -> Result<Vec<PatternRule>, PatternError> {
    Ok(vec![sql_injection()?, command_injection()?])
}

/// `fmt.Sprintf` queries become `?` placeholders with driver-bound args.
///
/// `q := fmt.Sprintf("... %s", id)` turns into `q := "... ?"` and the
/// matching `db.Query(q)` call receives `id`. Inline Sprintf calls are
/// rewritten to `"... ?", id` in place.
fn sql_injection() -> Result<PatternRule, PatternError> {
    let assignment = compile(
        SQL_INJECTION,
        r#"(\w+)(\s*:?=\s*)fmt\.Sprintf\(\s*"(SELECT\s+\*\s+FROM(?:[^"\\\n]|\\.)*)"\s*,\s*"#,
    )?;
    let inline = compile(
        SQL_INJECTION,
        r#"fmt\.Sprintf\(\s*"(SELECT\s+\*\s+FROM(?:[^"\\\n]|\\.)*)"\s*,\s*"#,
    )?;
    let call = compile(SQL_INJECTION, r"(\w+)\.(Query|QueryRow|Exec)\(\s*(\w+)\s*\)")?;
    let verb = compile(SQL_INJECTION, r"'?%[sdvq]'?")?;

    PatternRule::builder(SQL_INJECTION)
        .require(r#"fmt\.Sprintf\(\s*"SELECT\s+\*\s+FROM"#)
        .marker("?")
        .transform(move |content| {
            let mut bound: Vec<(String, String)> = Vec::new();
            let step = replace_with_args(content, &assignment, |caps, args| {
                bound.push((caps[1].to_string(), args.trim().to_string()));
                format!("{}{}\"{}\"", &caps[1], &caps[2], placeholders(&verb, &caps[3]))
            });

            let step = call.replace_all(&step, |caps: &Captures<'_>| {
                let (db, method, query) = (&caps[1], &caps[2], &caps[3]);
                match bound.iter().find(|(var, _)| var == query) {
                    Some((_, args)) => format!("{db}.{method}({query}, {args})"),
                    None => caps[0].to_string(),
                }
            });

            replace_with_args(&step, &inline, |caps, args| {
                format!("\"{}\", {}", placeholders(&verb, &caps[1]), args.trim())
            })
        })
        .build()
}

fn placeholders(verb: &Regex, sql: &str) -> String {
    verb.replace_all(sql, "?").into_owned()
}

fn command_injection() -> Result<PatternRule, PatternError> {
    let shell = compile(
        COMMAND_INJECTION,
        r#"exec\.Command\(\s*"(?:ba)?sh"\s*,\s*"-c"\s*,\s*(\w+)\s*\)((?:\.\w+\(\))?)"#,
    )?;

    PatternRule::builder(COMMAND_INJECTION)
        .require(r#"exec\.Command\(\s*"(?:ba)?sh""#)
        .forbid("isValid")
        .marker("isValid")
        .transform(move |content| {
            shell
                .replace_all(content, "if isValid(${1}) { exec.Command(${1})${2} }")
                .into_owned()
        })
        .build()
}
