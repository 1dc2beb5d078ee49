use std::fs;
use std::path::Path;

use serde::Serialize;
use shop_seed_core::rules::{apply_rules, TextRule};
use walkdir::WalkDir;

use crate::error::RewriteError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RewriteSummary {
    pub files_scanned: usize,
    pub files_rewritten: usize,
    pub files_skipped: usize,
}

/// Apply literal text rules to every UTF-8 file below `root`, in place.
///
/// Files that are not valid UTF-8 are counted as skipped and left untouched.
///
/// # Errors
/// Returns [`RewriteError`] when `root` is missing or a file cannot be read or written.
pub fn rewrite_text_in_tree(root: &Path, rules: &[TextRule]) -> Result<RewriteSummary, RewriteError> {
    if !root.is_dir() {
        return Err(RewriteError::MissingRoot(root.display().to_string()));
    }

    let mut summary = RewriteSummary::default();
    for entry in WalkDir::new(root) {
        let entry = entry.map_err(|err| RewriteError::Walk {
            path: root.display().to_string(),
            message: err.to_string(),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let io_error = |source| RewriteError::Io { path: path.display().to_string(), source };
        summary.files_scanned += 1;

        let bytes = fs::read(path).map_err(io_error)?;
        let Ok(text) = String::from_utf8(bytes) else {
            summary.files_skipped += 1;
            continue;
        };

        let rewritten = apply_rules(&text, rules);
        if rewritten != text {
            fs::write(path, rewritten).map_err(io_error)?;
            summary.files_rewritten += 1;
        }
    }

    Ok(summary)
}

/// Run [`rewrite_text_in_tree`] on the blocking pool.
///
/// # Errors
/// Returns the rewrite error, or [`RewriteError::Task`] when the worker panicked.
pub async fn rewrite_text_in_tree_async(
    root: &Path,
    rules: Vec<TextRule>,
) -> Result<RewriteSummary, RewriteError> {
    let root = root.to_path_buf();
    tokio::task::spawn_blocking(move || rewrite_text_in_tree(&root, &rules))
        .await
        .map_err(|err| RewriteError::Task(err.to_string()))?
}
