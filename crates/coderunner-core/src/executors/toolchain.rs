//! Interpreter discovery on the host.

use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;
use which::which;

use super::language::{LanguageProfile, LANGUAGES};
use super::process::Interpreter;
use crate::config::RunnerConfig;

/// Installed-runtime report entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuntimeInfo {
    pub language: String,
    pub extension: String,
    pub available: bool,
    pub path: Option<PathBuf>,
}

/// First interpreter candidate found on PATH.
fn find_tool(profile: &LanguageProfile) -> Option<PathBuf> {
    profile
        .interpreters
        .iter()
        .find_map(|candidate| which(candidate).ok())
}

/// Pick the interpreter for `profile`: configured override, then PATH lookup, then
/// the bare primary name (a launch with that name reports the install hint).
pub fn resolve(profile: &'static LanguageProfile, config: &RunnerConfig) -> Interpreter {
    let program = config
        .runtime_override(profile.name)
        .cloned()
        .or_else(|| find_tool(profile))
        .unwrap_or_else(|| PathBuf::from(profile.primary_interpreter()));

    Interpreter {
        runtime: profile.name,
        program,
        env: profile.env,
        install_hint: profile.install_hint,
    }
}

/// Resolve every supported language once. PATH lookups block, so callers do this
/// at construction time rather than per request.
pub fn resolve_all(config: &RunnerConfig) -> HashMap<&'static str, Interpreter> {
    LANGUAGES
        .iter()
        .map(|profile| (profile.name, resolve(profile, config)))
        .collect()
}

pub fn inventory(config: &RunnerConfig) -> Vec<RuntimeInfo> {
    LANGUAGES
        .iter()
        .map(|profile| {
            let path = match config.runtime_override(profile.name) {
                Some(path) if path.exists() => Some(path.clone()),
                Some(path) => which(path).ok(),
                None => find_tool(profile),
            };
            RuntimeInfo {
                language: profile.name.to_string(),
                extension: profile.extension.to_string(),
                available: path.is_some(),
                path,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuntimeOverride;
    use crate::executors::language;

    #[test]
    fn test_override_wins_over_path_lookup() {
        let mut config = RunnerConfig::default();
        config.runtimes.insert(
            "py".to_string(),
            RuntimeOverride {
                command: PathBuf::from("/opt/custom/python3"),
            },
        );

        let interpreter = resolve(language::lookup("python").unwrap(), &config);
        assert_eq!(interpreter.program, PathBuf::from("/opt/custom/python3"));
        assert_eq!(interpreter.runtime, "python");
        assert!(interpreter.env.contains(&("PYTHONUNBUFFERED", "1")));
    }

    #[test]
    fn test_missing_override_is_reported_unavailable() {
        let mut config = RunnerConfig::default();
        config.runtimes.insert(
            "javascript".to_string(),
            RuntimeOverride {
                command: PathBuf::from("/nonexistent/node"),
            },
        );

        let report = inventory(&config);
        let js = report.iter().find(|r| r.language == "javascript").unwrap();
        assert!(!js.available);
        assert_eq!(js.path, None);
        assert_eq!(report.len(), LANGUAGES.len());
    }

    #[test]
    fn test_resolve_all_covers_every_language() {
        let mut config = RunnerConfig::default();
        config.runtimes.insert(
            "node".to_string(),
            RuntimeOverride {
                command: PathBuf::from("/opt/node/bin/node"),
            },
        );

        let resolved = resolve_all(&config);
        assert_eq!(resolved.len(), LANGUAGES.len());
        assert_eq!(resolved["javascript"].program, PathBuf::from("/opt/node/bin/node"));
        assert_eq!(resolved["python"].runtime, "python");
    }

    #[test]
    fn test_resolution_always_yields_a_program() {
        let config = RunnerConfig::default();
        for profile in LANGUAGES {
            let interpreter = resolve(profile, &config);
            assert!(!interpreter.program.as_os_str().is_empty());
        }
    }
}
