//! JavaScript rules

use super::{ensure_line, BACKTICK_QUOTED, DOUBLE_QUOTED, SINGLE_QUOTED};
use crate::error::PatternError;
use crate::rule::{compile, PatternRule};

const XSS: &str = "Cross-Site Scripting (XSS)";
const HARDCODED_PASSWORD: &str = "Hardcoded Password";
const PATH_TRAVERSAL: &str = "Path Traversal";

const PATH_IMPORT: &str = r#"const path = require("path");"#;

pub(super) fn rules() -> Result<Vec<PatternRule>, PatternError> {
    Ok(vec![xss()?, hardcoded_password()?, path_traversal()?])
}

fn xss() -> Result<PatternRule, PatternError> {
    let assignment = compile(XSS, r"\.innerHTML(\s*)=([^=])")?;

    PatternRule::builder(XSS)
        .require(r"\.innerHTML\s*=[^=]")
        .marker("textContent")
        .transform(move |content| {
            assignment
                .replace_all(content, ".textContent${1}=${2}")
                .into_owned()
        })
        .build()
}

fn hardcoded_password() -> Result<PatternRule, PatternError> {
    let literal = compile(
        HARDCODED_PASSWORD,
        &format!(r"password[ \t]*:[ \t]*(?:{DOUBLE_QUOTED}|{SINGLE_QUOTED}|{BACKTICK_QUOTED})"),
    )?;

    PatternRule::builder(HARDCODED_PASSWORD)
        .require(r#"password[ \t]*:[ \t]*["'`]"#)
        .forbid("process.env")
        .marker("process.env")
        .transform(move |content| {
            literal
                .replace_all(content, "password: process.env.DB_PASSWORD")
                .into_owned()
        })
        .build()
}

fn path_traversal() -> Result<PatternRule, PatternError> {
    let user_input = compile(PATH_TRAVERSAL, r"\breq\.(params|query|body)\.(\w+)")?;

    PatternRule::builder(PATH_TRAVERSAL)
        .require(r"\bres\.sendFile\(")
        .forbid("path.basename")
        .marker("path.basename")
        .transform(move |content| {
            let fixed = user_input.replace_all(content, "path.basename(req.${1}.${2})");
            let imported = ["require(\"path\")", "require('path')", "from \"path\"", "from 'path'"]
                .iter()
                .any(|decl| fixed.contains(decl));
            if imported {
                fixed.into_owned()
            } else {
                ensure_line(&fixed, PATH_IMPORT)
            }
        })
        .build()
}
