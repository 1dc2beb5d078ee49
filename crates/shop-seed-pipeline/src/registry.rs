//! Coding challenge registry built from annotated source snippets.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use regex_lite::Regex;
use walkdir::WalkDir;

const SNIPPET_MARKER: &str = r"vuln-code-snippet start ([A-Za-z0-9_ ]+)";

/// Challenge keys that have an accompanying coding challenge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodingChallengeRegistry {
    keys: BTreeSet<String>,
}

impl CodingChallengeRegistry {
    /// Collect every key named by a snippet start marker below `dir`.
    ///
    /// A missing directory yields an empty registry; unreadable or non-UTF-8
    /// files are skipped.
    #[must_use]
    pub fn scan(dir: Option<&Path>) -> Self {
        let Some(dir) = dir else {
            return Self::default();
        };
        if !dir.is_dir() {
            tracing::debug!(dir = %dir.display(), "no code snippet directory; coding challenges disabled");
            return Self::default();
        }
        let Ok(marker) = Regex::new(SNIPPET_MARKER) else {
            return Self::default();
        };

        let mut keys = BTreeSet::new();
        for entry in WalkDir::new(dir).into_iter().filter_map(Result::ok) {
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(body) = fs::read_to_string(entry.path()) else {
                continue;
            };
            for captures in marker.captures_iter(&body) {
                if let Some(names) = captures.get(1) {
                    keys.extend(names.as_str().split_whitespace().map(str::to_string));
                }
            }
        }

        tracing::info!(count = keys.len(), "coding challenges discovered");
        Self { keys }
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markers_in_nested_files_are_collected() -> std::io::Result<()> {
        let dir = tempfile::tempdir()?;
        fs::create_dir_all(dir.path().join("routes"))?;
        fs::write(
            dir.path().join("routes/login.ts"),
            "// vuln-code-snippet start loginAdminChallenge loginBenderChallenge\nconst q = 1\n// vuln-code-snippet end loginAdminChallenge\n",
        )?;
        fs::write(dir.path().join("search.ts"), "// vuln-code-snippet start unionSqlInjectionChallenge\n")?;
        fs::write(dir.path().join("logo.png"), [0xff_u8, 0xd8, 0x00, 0x9c])?;

        let registry = CodingChallengeRegistry::scan(Some(dir.path()));
        assert_eq!(registry.len(), 3);
        assert!(registry.contains("loginBenderChallenge"));
        assert!(registry.contains("unionSqlInjectionChallenge"));
        assert!(!registry.contains("scoreBoardChallenge"));
        Ok(())
    }

    #[test]
    fn missing_directory_yields_empty_registry() {
        assert!(CodingChallengeRegistry::scan(Some(Path::new("/no/such/snippets"))).is_empty());
        assert!(CodingChallengeRegistry::scan(None).is_empty());
    }
}
