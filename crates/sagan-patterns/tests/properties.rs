use proptest::prelude::*;
use sagan_patterns::prelude::*;
use std::sync::Arc;

fn library() -> Arc<PatternLibrary> {
    Arc::new(PatternLibrary::builtin().unwrap())
}

fn ident() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,7}"
}

/// Literal body with backslash-escaped `quote` and stray parentheses
fn body(quote: char) -> BoxedStrategy<String> {
    prop::collection::vec(
        prop_oneof![
            "[a-z0-9 ]{1,5}",
            Just(format!("\\{quote}")),
            Just("(".to_string()),
            Just(")".to_string()),
        ],
        0..4,
    )
    .prop_map(|parts| parts.concat())
    .boxed()
}

/// Call argument, possibly a nested call holding a literal
fn argument() -> BoxedStrategy<String> {
    prop_oneof![
        ident(),
        (ident(), ident()).prop_map(|(f, x)| format!("{f}({x})")),
        (ident(), ident(), body('"')).prop_map(|(f, x, s)| format!("{f}({x}, \"{s}\")")),
    ]
    .boxed()
}

fn python_line() -> BoxedStrategy<String> {
    prop_oneof![
        body('"').prop_map(|s| format!("password = \"{s}\"")),
        body('\'').prop_map(|s| format!("password = '{s}'")),
        (ident(), argument()).prop_map(|(v, a)| format!("{v} = eval({a})")),
        (ident(), ident(), ident(), ident(), body('"')).prop_map(|(v, t, c, x, s)| format!(
            "{v} = f\"SELECT * FROM {t} WHERE {c} = '{{{x}}}' -- {s}\"\ncursor.execute({v})"
        )),
        (ident(), ident(), ident()).prop_map(|(t, c, x)| format!(
            "cursor.execute(f\"SELECT * FROM {t} WHERE {c} = {{{x}}}\")"
        )),
        (ident(), ident(), ident())
            .prop_map(|(f, a, b)| format!("def {f}({a}, {b}):\n    return {a} + {b}")),
        Just("import json".to_string()),
    ]
    .boxed()
}

fn javascript_line() -> BoxedStrategy<String> {
    prop_oneof![
        (ident(), argument()).prop_map(|(el, a)| format!("{el}.innerHTML = {a};")),
        (ident(), body('"')).prop_map(|(v, s)| format!("const {v} = {{ password: \"{s}\" }};")),
        (ident(), body('\'')).prop_map(|(v, s)| format!("const {v} = {{ password: '{s}' }};")),
        ident().prop_map(|v| format!("const {v} = {{ password: `{v}(x)` }};")),
        (prop::sample::select(vec!["params", "query", "body"]), ident())
            .prop_map(|(src, v)| format!("res.sendFile(\"/srv/\" + req.{src}.{v});")),
        (ident(), ident()).prop_map(|(a, b)| format!("const sum = ({a}, {b}) => {a} + {b};")),
    ]
    .boxed()
}

fn abap_line() -> BoxedStrategy<String> {
    prop_oneof![
        (ident(), ident()).prop_map(|(t, v)| format!(
            "EXEC SQL.\n  DELETE FROM {t} WHERE bname = :{v}\nENDEXEC."
        )),
        (ident(), ident()).prop_map(|(t, v)| format!("SELECT * FROM {t} INTO TABLE lt_{v}.")),
        "[a-z ]{0,8}".prop_map(|s| format!("WRITE '{s}'.")),
        ident().prop_map(|v| format!("REPORT z{v}.")),
    ]
    .boxed()
}

fn java_line() -> BoxedStrategy<String> {
    prop_oneof![
        (ident(), ident(), ident(), body('"'), ident()).prop_map(|(v, t, x, s, st)| format!(
            "String {v} = \"SELECT * FROM {t} WHERE note = '{s}' AND id = \" + {x};\n{st}.executeQuery({v});"
        )),
        (
            prop::sample::select(vec!["info", "warn", "error", "debug"]),
            body('"'),
            argument(),
        )
            .prop_map(|(level, s, a)| format!("logger.{level}(\"{s}\" + {a});")),
        (ident(), ident()).prop_map(|(a, b)| format!("int total = {a} + {b};")),
    ]
    .boxed()
}

fn go_argument() -> BoxedStrategy<String> {
    prop_oneof![
        argument(),
        ident().prop_map(|x| format!("strconv.Itoa({x})")),
    ]
    .boxed()
}

fn go_line() -> BoxedStrategy<String> {
    prop_oneof![
        (ident(), ident(), body('"'), go_argument(), ident()).prop_map(|(v, t, s, a, db)| format!(
            "{v} := fmt.Sprintf(\"SELECT * FROM {t} WHERE id = %s -- {s}\", {a})\n{db}.Query({v})"
        )),
        (ident(), ident(), go_argument()).prop_map(|(db, t, a)| format!(
            "{db}.Query(fmt.Sprintf(\"SELECT * FROM {t} WHERE id = '%d'\", {a}))"
        )),
        (prop::sample::select(vec!["sh", "bash"]), ident())
            .prop_map(|(sh, v)| format!("exec.Command(\"{sh}\", \"-c\", {v}).Run()")),
        body('"').prop_map(|s| format!("fmt.Println(\"{s}\")")),
    ]
    .boxed()
}

fn ruby_line() -> BoxedStrategy<String> {
    let command = "[a-z]{1,6}";
    let flag = "-[a-z]{1,3}";
    prop_oneof![
        (command, ident()).prop_map(|(c, v)| format!("system(\"{c} \" + {v})")),
        (command, flag, ident(), "[a-z/]{1,6}")
            .prop_map(|(c, f, v, tail)| format!("system(\"{c} {f} \" + {v} + \" {tail}\")")),
        (command, flag, ident())
            .prop_map(|(c, f, v)| format!("system(\"{c} {f} #{{{v}}}\")")),
        ("([A-Z]{1,4}_)?", body('"'))
            .prop_map(|(prefix, s)| format!("{prefix}API_KEY = \"{s}\"")),
        ("([A-Z]{1,4}_)?", body('\''))
            .prop_map(|(prefix, s)| format!("{prefix}API_KEY = '{s}'")),
        body('"').prop_map(|s| format!("puts \"{s}\"")),
    ]
    .boxed()
}

fn file_of(tag: &'static str, line: BoxedStrategy<String>) -> BoxedStrategy<SourceFile> {
    prop::collection::vec(line, 0..4)
        .prop_map(move |lines| SourceFile::new("fixture", lines.join("\n"), tag))
        .boxed()
}

fn source_file() -> impl Strategy<Value = SourceFile> {
    prop_oneof![
        file_of("python", python_line()),
        file_of("javascript", javascript_line()),
        file_of("abap", abap_line()),
        file_of("java", java_line()),
        file_of("go", go_line()),
        file_of("ruby", ruby_line()),
    ]
}

/// Every line closes its quotes and parentheses
fn balanced(content: &str) -> bool {
    content.lines().all(|line| {
        let mut depth = 0_i32;
        let mut quote: Option<char> = None;
        let mut escaped = false;
        for ch in line.chars() {
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
                    if depth < 0 {
                        return false;
                    }
                }
                _ => {}
            }
        }
        depth == 0 && quote.is_none()
    })
}

proptest! {
    #[test]
    fn prop_detection_is_deterministic(file in source_file()) {
        let detector = Detector::new(library());
        prop_assert_eq!(detector.detect(&file), detector.detect(&file));
    }

    #[test]
    fn prop_detection_ignores_unknown_languages(content in ".*") {
        let detector = Detector::new(library());
        let file = SourceFile::new("x", content, "cobol");
        prop_assert!(detector.detect(&file).is_empty());
    }

    #[test]
    fn prop_remediation_is_idempotent(file in source_file()) {
        let library = library();
        let remediator = Remediator::new(Arc::clone(&library));

        for label in library.labels(file.language()) {
            let once = remediator.remediate(&file, label);
            let twice = remediator.remediate(&file.with_content(once.clone()), label);
            prop_assert_eq!(once, twice);
        }
    }

    #[test]
    fn prop_remediation_never_adds_labels(file in source_file()) {
        let library = library();
        let detector = Detector::new(Arc::clone(&library));
        let remediator = Remediator::new(library);

        let before = detector.detect(&file);
        let fixed = remediator.remediate_all(&file, &before);
        let after = detector.detect(&file.with_content(fixed));

        prop_assert!(after.is_subset(&before));
    }

    #[test]
    fn prop_remediation_keeps_quotes_and_parens_balanced(file in source_file()) {
        prop_assert!(balanced(file.content()), "generated input: {}", file.content());

        let library = library();
        let detector = Detector::new(Arc::clone(&library));
        let remediator = Remediator::new(Arc::clone(&library));

        for label in library.labels(file.language()) {
            let fixed = remediator.remediate(&file, label);
            prop_assert!(balanced(&fixed), "{label}: {}", fixed);
        }

        let fixed = remediator.remediate_all(&file, &detector.detect(&file));
        prop_assert!(balanced(&fixed), "all labels: {}", fixed);
    }

    #[test]
    fn prop_stub_is_pure(label in "[A-Za-z ()-]{1,30}", tag in prop::sample::select(Language::BUILTIN.to_vec())) {
        let remediator = Remediator::new(library());
        let language = Language::new(tag);
        let label = VulnerabilityLabel::new(label);

        prop_assert_eq!(
            remediator.generate_verification_test(&label, &language),
            remediator.generate_verification_test(&label, &language)
        );
    }
}
