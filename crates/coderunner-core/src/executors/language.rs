//! Supported languages as a closed lookup table.
//!
//! A language is pure data: its names, file extension, interpreter candidates,
//! environment, install hint and wrapper template. Adding a runtime means adding an
//! entry to [`LANGUAGES`], not another branch in the executor.

use super::wrapper::{self, WrapOptions};

/// Everything the executor needs to know about one runtime.
pub struct LanguageProfile {
    /// Canonical name reported back to callers
    pub name: &'static str,
    /// Short tag used in scratch file names
    pub tag: &'static str,
    /// Accepted request spellings, lowercase
    pub aliases: &'static [&'static str],
    pub extension: &'static str,
    /// Interpreter binaries to look for, in order of preference
    pub interpreters: &'static [&'static str],
    /// Extra environment for the interpreter process
    pub env: &'static [(&'static str, &'static str)],
    /// Shown when the interpreter binary cannot be found
    pub install_hint: &'static str,
    pub wrap: fn(&str, &str, &WrapOptions) -> String,
}

impl std::fmt::Debug for LanguageProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LanguageProfile")
            .field("name", &self.name)
            .field("extension", &self.extension)
            .field("interpreters", &self.interpreters)
            .finish()
    }
}

impl LanguageProfile {
    pub fn primary_interpreter(&self) -> &'static str {
        self.interpreters[0]
    }

    pub fn wrap_program(&self, code: &str, input: &str, options: &WrapOptions) -> String {
        (self.wrap)(code, input, options)
    }
}

pub static LANGUAGES: &[LanguageProfile] = &[
    LanguageProfile {
        name: "javascript",
        tag: "js",
        aliases: &["javascript", "js", "node", "nodejs"],
        extension: "js",
        interpreters: &["node", "nodejs"],
        env: &[],
        install_hint: "Node.js is not installed. Download it from https://nodejs.org/en/download and make sure `node` is on PATH.",
        wrap: wrapper::wrap_javascript,
    },
    LanguageProfile {
        name: "python",
        tag: "py",
        aliases: &["python", "py", "python3"],
        extension: "py",
        interpreters: &["python3", "python"],
        env: &[("PYTHONUNBUFFERED", "1"), ("PYTHONDONTWRITEBYTECODE", "1")],
        install_hint: "Python is not installed. Download it from https://www.python.org/downloads/ and check \"Add to PATH\" during installation.",
        wrap: wrapper::wrap_python,
    },
];

/// Resolve a request's language field, case-insensitively, against all aliases.
pub fn lookup(language: &str) -> Option<&'static LanguageProfile> {
    let wanted = language.trim().to_lowercase();
    LANGUAGES
        .iter()
        .find(|profile| profile.aliases.contains(&wanted.as_str()))
}

pub fn supported_names() -> Vec<&'static str> {
    LANGUAGES.iter().map(|profile| profile.name).collect()
}
