//! ABAP rules

use crate::error::PatternError;
use crate::rule::{compile, PatternRule};
use regex::Captures;

const SQL_INJECTION: &str = "SQL Injection";
const MISSING_AUTHORITY_CHECK: &str = "Missing Authority Check";

const NATIVE_SQL_NOTE: &str = "* Native SQL disabled: use Open SQL with host variables";
const AUTHORITY_CHECK: &str = "AUTHORITY-CHECK OBJECT 'S_TCODE' ID 'TCD' FIELD 'Z_AUTH'.";

pub(super) fn rules() -> Result<Vec<PatternRule>, PatternError> {
    Ok(vec![sql_injection()?, missing_authority_check()?])
}

/// Comments out `EXEC SQL ... ENDEXEC.` blocks.
fn sql_injection() -> Result<PatternRule, PatternError> {
    let block = compile(SQL_INJECTION, r"(?ms)^[ \t]*EXEC[ \t]+SQL\b.*?ENDEXEC\.?")?;
    let stray = compile(SQL_INJECTION, r"(?m)^[ \t]*EXEC[ \t]+SQL\b.*$")?;

    PatternRule::builder(SQL_INJECTION)
        .require(r"(?m)^[ \t]*EXEC[ \t]+SQL\b")
        .marker("Open SQL")
        .transform(move |content| {
            let comment_out = |caps: &Captures<'_>| {
                let body: Vec<String> = caps[0].lines().map(|l| format!("* {l}")).collect();
                format!("{NATIVE_SQL_NOTE}\n{}", body.join("\n"))
            };
            let fixed = block.replace_all(content, comment_out);
            stray.replace_all(&fixed, comment_out).into_owned()
        })
        .build()
}

/// Wraps the program body in an authority check.
fn missing_authority_check() -> Result<PatternRule, PatternError> {
    PatternRule::builder(MISSING_AUTHORITY_CHECK)
        .require(r"(?im)^[ \t]*SELECT\b")
        .forbid("AUTHORITY-CHECK")
        .marker("AUTHORITY-CHECK")
        .transform(wrap_in_authority_check)
        .build()
}

fn wrap_in_authority_check(content: &str) -> String {
    let lines: Vec<&str> = content.lines().collect();
    let split = lines
        .iter()
        .position(|l| l.trim_start().to_ascii_uppercase().starts_with("REPORT"))
        .map_or(0, |idx| idx + 1);

    let mut out: Vec<String> = lines[..split].iter().map(|l| (*l).to_string()).collect();
    out.push(AUTHORITY_CHECK.to_string());
    out.push("IF sy-subrc = 0.".to_string());
    out.extend(lines[split..].iter().map(|l| format!("  {l}")));
    out.push("ENDIF.".to_string());
    out.join("\n")
}
