//! Fixture factory: randomized changes mixing one vulnerable file with safe ones
//!
//! Snippet tables are fixed; only the choice among them is random, seeded
//! through `StdRng` so a seed reproduces the same change.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sagan_patterns::{Language, SourceFile};

/// (label the snippet exhibits, content)
type Snippet = (&'static str, &'static str);

/// (file name, content)
type SafeFile = (&'static str, &'static str);

const PYTHON_VULNERABLE: &[Snippet] = &[
    (
        "Hardcoded Password",
        "def connect():\n    password = \"supersecret\"\n    db.connect(password)",
    ),
    (
        "Remote Code Execution",
        "def process_input(user_input):\n    result = eval(user_input)\n    return result",
    ),
    (
        "SQL Injection",
        "def get_user(uid):\n    query = f\"SELECT * FROM users WHERE id = {uid}\"\n    cursor.execute(query)",
    ),
];

const JAVASCRIPT_VULNERABLE: &[Snippet] = &[
    (
        "Cross-Site Scripting (XSS)",
        "function showName(name) {\n    document.getElementById(\"output\").innerHTML = name;\n}",
    ),
    (
        "Hardcoded Password",
        "const dbConfig = {\n    password: \"admin_password_123\"\n};",
    ),
    (
        "Path Traversal",
        "app.get(\"/files/:id\", (req, res) => {\n    res.sendFile(\"/var/www/uploads/\" + req.params.id);\n});",
    ),
];

const ABAP_VULNERABLE: &[Snippet] = &[
    (
        "SQL Injection",
        "REPORT z_report.\nEXEC SQL.\n  DELETE FROM usr02 WHERE bname = :user_input\nENDEXEC.",
    ),
    (
        "Missing Authority Check",
        "REPORT z_auth_check.\nSELECT * FROM usr02 INTO TABLE lt_users.\n\" Missing security check",
    ),
];

const JAVA_VULNERABLE: &[Snippet] = &[
    (
        "SQL Injection",
        "public void getUser(String userId) {\n    String query = \"SELECT * FROM users WHERE id = \" + userId;\n    statement.executeQuery(query);\n}",
    ),
    (
        "Log Injection",
        "public void logUser(String user) {\n    logger.info(\"User login: \" + user);\n}",
    ),
];

const GO_VULNERABLE: &[Snippet] = &[
    (
        "SQL Injection",
        "func GetUser(id string) {\n    query := fmt.Sprintf(\"SELECT * FROM users WHERE id = %s\", id)\n    db.Query(query)\n}",
    ),
    (
        "Command Injection",
        "func RunCmd(cmd string) {\n    exec.Command(\"sh\", \"-c\", cmd).Run()\n}",
    ),
];

const RUBY_VULNERABLE: &[Snippet] = &[
    (
        "Command Injection",
        "def run_command(cmd)\n  system(\"echo \" + cmd)\nend",
    ),
    (
        "Hardcoded Secret",
        "class Config\n  API_KEY = \"12345-abcde\"\nend",
    ),
];

const PYTHON_SAFE: &[SafeFile] = &[
    ("utils.py", "def format_date(d):\n    return d.isoformat()"),
    ("config.py", "DEBUG = False\nMAX_RETRIES = 5"),
];

const JAVASCRIPT_SAFE: &[SafeFile] = &[
    ("utils.js", "export const formatDate = (d) => d.toISOString();"),
    ("constants.js", "export const MAX_ITEMS = 100;"),
];

const ABAP_SAFE: &[SafeFile] = &[
    (
        "z_utils.abap",
        "CLASS z_utils DEFINITION.\n  PUBLIC SECTION.\n  METHODS get_date RETURNING VALUE(r_date) TYPE d.\nENDCLASS.",
    ),
    ("z_const.abap", "CONSTANTS: gc_max_rows TYPE i VALUE 100."),
];

const JAVA_SAFE: &[SafeFile] = &[
    (
        "Utils.java",
        "public class Utils {\n    public static String format(Date d) { return d.toString(); }\n}",
    ),
    (
        "Config.java",
        "public class Config {\n    public static final boolean DEBUG = false;\n}",
    ),
];

const GO_SAFE: &[SafeFile] = &[
    (
        "utils.go",
        "package main\n\nfunc Format(s string) string {\n    return strings.ToUpper(s)\n}",
    ),
    ("config.go", "package main\n\nconst Timeout = 30"),
];

const RUBY_SAFE: &[SafeFile] = &[
    ("utils.rb", "def format_string(s)\n  s.upcase\nend"),
    ("config.rb", "TIMEOUT = 30"),
];

/// Vulnerable snippets for a language, with the label each exhibits
#[must_use]
pub fn vulnerable_snippets(language: &Language) -> &'static [Snippet] {
    match language.as_str() {
        Language::PYTHON => PYTHON_VULNERABLE,
        Language::JAVASCRIPT => JAVASCRIPT_VULNERABLE,
        Language::ABAP => ABAP_VULNERABLE,
        Language::JAVA => JAVA_VULNERABLE,
        Language::GO => GO_VULNERABLE,
        Language::RUBY => RUBY_VULNERABLE,
        _ => &[],
    }
}

/// Safe files for a language
#[must_use]
pub fn safe_files(language: &Language) -> &'static [SafeFile] {
    match language.as_str() {
        Language::PYTHON => PYTHON_SAFE,
        Language::JAVASCRIPT => JAVASCRIPT_SAFE,
        Language::ABAP => ABAP_SAFE,
        Language::JAVA => JAVA_SAFE,
        Language::GO => GO_SAFE,
        Language::RUBY => RUBY_SAFE,
        _ => &[],
    }
}

/// Name given to the vulnerable file of a generated change
#[must_use]
pub fn vulnerable_file_name(language: &Language) -> &'static str {
    match language.as_str() {
        Language::PYTHON => "app.py",
        Language::JAVASCRIPT => "app.js",
        Language::ABAP => "z_vuln.abap",
        Language::JAVA => "App.java",
        Language::GO => "main.go",
        Language::RUBY => "app.rb",
        _ => "vulnerable_script.txt",
    }
}

/// Seeded generator of review fixtures
#[derive(Debug, Clone)]
pub struct VulnerabilityFactory {
    rng: StdRng,
}

impl VulnerabilityFactory {
    /// Create factory with a fixed seed
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Create factory seeded from the operating system
    #[must_use]
    pub fn from_os_rng() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    /// Files for one change: a random vulnerable file then 1..=n safe files
    ///
    /// A language without snippets yields a single placeholder file.
    pub fn generate_change_files(&mut self, language: &Language) -> Vec<SourceFile> {
        let vulnerable = vulnerable_snippets(language);
        if vulnerable.is_empty() {
            return vec![SourceFile::new(
                "unknown.txt",
                "No code available",
                language.clone(),
            )];
        }

        let (label, content) = vulnerable[self.rng.random_range(0..vulnerable.len())];
        tracing::debug!(%language, label, "vulnerable fixture chosen");

        let mut files = vec![SourceFile::new(
            vulnerable_file_name(language),
            content,
            language.clone(),
        )];

        let safe = safe_files(language);
        if !safe.is_empty() {
            let count = self.rng.random_range(1..=safe.len());
            for idx in rand::seq::index::sample(&mut self.rng, safe.len(), count) {
                let (name, content) = safe[idx];
                files.push(SourceFile::new(name, content, language.clone()));
            }
        }
        files
    }
}
