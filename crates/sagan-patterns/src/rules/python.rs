//! Python rules

use super::{ensure_line, DOUBLE_QUOTED, SINGLE_QUOTED};
use crate::error::PatternError;
use crate::rule::{compile, PatternRule};
use regex::{Captures, Regex};

const HARDCODED_PASSWORD: &str = "Hardcoded Password";
const REMOTE_CODE_EXECUTION: &str = "Remote Code Execution";
const SQL_INJECTION: &str = "SQL Injection";

pub(super) fn rules() -> Result<Vec<PatternRule>, PatternError> {
    Ok(vec![
        hardcoded_password()?,
        remote_code_execution()?,
        sql_injection()?,
    ])
}

fn hardcoded_password() -> Result<PatternRule, PatternError> {
    let literal = compile(
        HARDCODED_PASSWORD,
        &format!(r"password[ \t]*=[ \t]*(?:{DOUBLE_QUOTED}|{SINGLE_QUOTED})"),
    )?;

    PatternRule::builder(HARDCODED_PASSWORD)
        .require(r#"password[ \t]*=[ \t]*["']"#)
        .forbid("os.getenv")
        .marker("os.getenv")
        .transform(move |content| {
            let fixed = literal.replace_all(content, r#"password = os.getenv("PASSWORD")"#);
            ensure_line(&fixed, "import os")
        })
        .build()
}

fn remote_code_execution() -> Result<PatternRule, PatternError> {
    let raw_eval = compile(REMOTE_CODE_EXECUTION, r"\beval\(")?;

    PatternRule::builder(REMOTE_CODE_EXECUTION)
        .require(r"\beval\(")
        .forbid("ast.literal_eval")
        .marker("ast.literal_eval")
        .transform(move |content| {
            let fixed = raw_eval.replace_all(content, "ast.literal_eval(");
            ensure_line(&fixed, "import ast")
        })
        .build()
}

/// f-string queries become `?` placeholders with a params tuple.
///
/// `q = f"... {x}"` turns into `q = "... ?"` plus `q_params = (x,)`, and
/// `.execute(q)` picks the params up. Inline f-strings get the tuple as a
/// second argument directly.
fn sql_injection() -> Result<PatternRule, PatternError> {
    let assignment = compile(
        SQL_INJECTION,
        r#"(?m)^([ \t]*)(\w+)[ \t]*=[ \t]*f"(SELECT\s+\*\s+FROM(?:[^"\\\n]|\\.)*)""#,
    )?;
    let inline = compile(SQL_INJECTION, r#"\bf"(SELECT\s+\*\s+FROM(?:[^"\\\n]|\\.)*)""#)?;
    let execute = compile(SQL_INJECTION, r"\.execute\(\s*(\w+)\s*\)")?;
    let placeholder = compile(SQL_INJECTION, r#"(?:'|\\")?\{([^{}]+)\}(?:'|\\")?"#)?;

    PatternRule::builder(SQL_INJECTION)
        .require(r#"\bf"SELECT\s+\*\s+FROM"#)
        .forbid("?")
        .marker("?")
        .transform(move |content| {
            let mut parameterized = Vec::new();
            let step = assignment.replace_all(content, |caps: &Captures<'_>| {
                let (indent, var) = (&caps[1], &caps[2]);
                let (sql, params) = parameterize(&placeholder, &caps[3]);
                if params.is_empty() {
                    return format!(r#"{indent}{var} = "{sql}""#);
                }
                parameterized.push(var.to_string());
                format!(
                    "{indent}{var} = \"{sql}\"\n{indent}{var}_params = ({},)",
                    params.join(", ")
                )
            });

            let step = execute.replace_all(&step, |caps: &Captures<'_>| {
                let var = &caps[1];
                if parameterized.iter().any(|p| p == var) {
                    format!(".execute({var}, {var}_params)")
                } else {
                    caps[0].to_string()
                }
            });

            inline
                .replace_all(&step, |caps: &Captures<'_>| {
                    let (sql, params) = parameterize(&placeholder, &caps[1]);
                    if params.is_empty() {
                        format!("\"{sql}\"")
                    } else {
                        format!("\"{sql}\", ({},)", params.join(", "))
                    }
                })
                .into_owned()
        })
        .build()
}

fn parameterize(placeholder: &Regex, body: &str) -> (String, Vec<String>) {
    let params = placeholder
        .captures_iter(body)
        .map(|caps| caps[1].trim().to_string())
        .collect();
    (placeholder.replace_all(body, "?").into_owned(), params)
}
