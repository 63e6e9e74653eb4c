//! Java rules

use super::replace_with_args;
use crate::error::PatternError;
use crate::rule::{compile, PatternRule};
use regex::Captures;

const SQL_INJECTION: &str = "SQL Injection";
const LOG_INJECTION: &str = "Log Injection";

pub(super) fn rules() -> Result<Vec<PatternRule>, PatternError> {
    Ok(vec![sql_injection()?, log_injection()?])
}

/// Concatenated queries become JDBC prepared statements.
fn sql_injection() -> Result<PatternRule, PatternError> {
    let concat = compile(
        SQL_INJECTION,
        r#"(\w+)(\s*=\s*)"(SELECT\s+\*\s+FROM(?:[^"\\\n]|\\.)*)"\s*\+\s*(\w+)"#,
    )?;
    let execute = compile(
        SQL_INJECTION,
        r"(?m)^([ \t]*)(\w+)\.executeQuery\(\s*(\w+)\s*\);",
    )?;

    PatternRule::builder(SQL_INJECTION)
        .require(r"SELECT\s+\*\s+FROM")
        .require(r#""\s*\+"#)
        .forbid("?")
        .marker("prepareStatement")
        .transform(move |content| {
            let mut bound: Vec<(String, String)> = Vec::new();
            let step = concat.replace_all(content, |caps: &Captures<'_>| {
                bound.push((caps[1].to_string(), caps[4].to_string()));
                format!("{}{}\"{}?\"", &caps[1], &caps[2], &caps[3])
            });

            execute
                .replace_all(&step, |caps: &Captures<'_>| {
                    let (indent, statement, query) = (&caps[1], &caps[2], &caps[3]);
                    match bound.iter().find(|(var, _)| var == query) {
                        Some((_, arg)) => format!(
                            "{indent}PreparedStatement ps = {statement}.getConnection().prepareStatement({query});\n\
                             {indent}ps.setObject(1, {arg});\n\
                             {indent}ps.executeQuery();"
                        ),
                        None => caps[0].to_string(),
                    }
                })
                .into_owned()
        })
        .build()
}

fn log_injection() -> Result<PatternRule, PatternError> {
    let call = compile(LOG_INJECTION, r"logger\.(info|warn|error|debug)\(")?;

    PatternRule::builder(LOG_INJECTION)
        .require(r"logger\.(?:info|warn|error|debug)\(")
        .forbid("ESAPI")
        .marker("ESAPI")
        .transform(move |content| {
            replace_with_args(content, &call, |caps, args| {
                format!("logger.{}(ESAPI.encoder().encodeForHTML({args}))", &caps[1])
            })
        })
        .build()
}
