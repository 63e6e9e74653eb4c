//! Remediator: apply a label's transform and emit verification stubs

use crate::file::SourceFile;
use crate::language::{Language, VulnerabilityLabel};
use crate::library::PatternLibrary;
use std::sync::Arc;

/// Applies remediation transforms from the pattern library
///
/// Stateless. Multiple labels against one file are applied in sequence, each
/// against the cumulative result; the caller owns the threaded content.
#[derive(Debug, Clone)]
pub struct Remediator {
    library: Arc<PatternLibrary>,
}

impl Remediator {
    /// Create remediator over a library
    #[inline]
    #[must_use]
    pub fn new(library: Arc<PatternLibrary>) -> Self {
        Self { library }
    }

    /// Rewrite a file's content for one label
    ///
    /// A label with no rule in the file's language leaves the content
    /// unchanged.
    #[must_use]
    pub fn remediate(&self, file: &SourceFile, label: &VulnerabilityLabel) -> String {
        self.remediate_content(file.language(), file.content(), label)
    }

    /// Rewrite raw content for one label
    #[must_use]
    pub fn remediate_content(
        &self,
        language: &Language,
        content: &str,
        label: &VulnerabilityLabel,
    ) -> String {
        match self.library.rule(language, label) {
            Some(rule) => rule.remediate(content),
            None => {
                tracing::debug!(%language, %label, "no rule for label, content unchanged");
                content.to_string()
            }
        }
    }

    /// Apply several labels in order, threading content between them
    #[must_use]
    pub fn remediate_all<'a>(
        &self,
        file: &SourceFile,
        labels: impl IntoIterator<Item = &'a VulnerabilityLabel>,
    ) -> String {
        labels.into_iter().fold(file.content().to_string(), |content, label| {
            self.remediate_content(file.language(), &content, label)
        })
    }

    /// Produce a unit-test stub asserting that `label` is mitigated
    ///
    /// Output depends only on the label, the language and the library. When
    /// the rule for the label declares a mitigation marker, the stub asserts
    /// the marker is present in the source under test.
    #[must_use]
    pub fn generate_verification_test(
        &self,
        label: &VulnerabilityLabel,
        language: &Language,
    ) -> String {
        let marker = self
            .library
            .rule(language, label)
            .and_then(|rule| rule.mitigation_marker());
        verification_stub(label.as_str(), language.as_str(), marker)
    }
}

fn verification_stub(label: &str, language: &str, marker: Option<&str>) -> String {
    let snake = snake_ident(label);
    let camel = camel_ident(label);

    match language {
        Language::PYTHON => {
            let check = match marker {
                Some(m) => format!("{m:?} in SOURCE"),
                None => "security_check_passed()".to_string(),
            };
            format!("def test_{snake}_mitigated():\n    assert {check}\n")
        }
        Language::JAVASCRIPT => {
            let check = match marker {
                Some(m) => format!("expect(SOURCE).toContain({m:?});"),
                None => "expect(securityCheckPassed()).toBe(true);".to_string(),
            };
            let title = format!("{label} is mitigated");
            format!("test({title:?}, () => {{\n  {check}\n}});\n")
        }
        Language::JAVA => {
            let check = match marker {
                Some(m) => format!("assertTrue(SOURCE.contains({m:?}));"),
                None => "assertTrue(securityCheckPassed());".to_string(),
            };
            format!("@Test\npublic void test{camel}Mitigated() {{\n    {check}\n}}\n")
        }
        Language::GO => {
            let check = match marker {
                Some(m) => format!("!strings.Contains(source, {m:?})"),
                None => "!securityCheckPassed()".to_string(),
            };
            let failure = format!("{label} not mitigated");
            format!(
                "func Test{camel}Mitigated(t *testing.T) {{\n\tif {check} {{\n\t\tt.Fatal({failure:?})\n\t}}\n}}\n"
            )
        }
        Language::RUBY => {
            let check = match marker {
                Some(m) => format!("expect(SOURCE).to include({m:?})"),
                None => "expect(security_check_passed?).to be(true)".to_string(),
            };
            let title = format!("mitigates {label}");
            format!("it {title:?} do\n  {check}\nend\n")
        }
        Language::ABAP => {
            let check = match marker {
                Some(m) => format!("cl_abap_unit_assert=>assert_char_cp( act = source exp = '*{m}*' )."),
                None => "cl_abap_unit_assert=>assert_true( act = security_check_passed( ) ).".to_string(),
            };
            format!("METHOD test_{snake} FOR TESTING.\n  {check}\nENDMETHOD.\n")
        }
        _ => format!("// Test for {label}\nassert(vulnerability_mitigated);\n"),
    }
}

/// `Cross-Site Scripting (XSS)` → `cross_site_scripting_xss`
fn snake_ident(label: &str) -> String {
    label
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_ascii_lowercase)
        .collect::<Vec<_>>()
        .join("_")
}

/// `Cross-Site Scripting (XSS)` → `CrossSiteScriptingXss`
fn camel_ident(label: &str) -> String {
    label
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(|word| {
            let lower = word.to_ascii_lowercase();
            let mut chars = lower.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}
