//! Attention scanning and target discovery.
//!
//! [`scan`] looks for manual-review terms in file content. The remaining
//! helpers turn configured glob patterns into concrete target paths and find
//! backup files left behind by earlier runs.

use crate::error::{MigrateError, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Returns the `terms` present in `content`, in the order they were given.
///
/// Matching is a plain case-sensitive substring search.
pub fn scan(content: &str, terms: &[String]) -> Vec<String> {
    terms
        .iter()
        .filter(|term| !term.is_empty() && content.contains(term.as_str()))
        .cloned()
        .collect()
}

/// Expands glob `patterns` relative to `root` into file paths relative to `root`.
///
/// Results are sorted and deduplicated. Paths matching any of `exclude` are dropped.
pub fn expand_globs(root: &Path, patterns: &[String], exclude: &[String]) -> Result<Vec<PathBuf>> {
    let excludes = compile_patterns(exclude)?;
    let mut files = Vec::new();

    // The root is a literal path, not part of the pattern.
    let base = PathBuf::from(glob::Pattern::escape(&root.to_string_lossy()));

    for pattern in patterns {
        let full = base.join(pattern);
        let full = full.to_string_lossy();
        let entries = glob::glob(&full)
            .map_err(|e| MigrateError::config(format!("Invalid glob '{}': {}", pattern, e)))?;

        for entry in entries {
            let path = entry.map_err(|e| MigrateError::Read {
                path: e.path().to_path_buf(),
                source: e.into_error(),
            })?;
            if !path.is_file() {
                continue;
            }
            let relative = path.strip_prefix(root).unwrap_or(&path).to_path_buf();
            if excludes.iter().any(|p| p.matches_path(&relative)) {
                continue;
            }
            files.push(relative);
        }
    }

    files.sort();
    files.dedup();
    Ok(files)
}

fn compile_patterns(patterns: &[String]) -> Result<Vec<glob::Pattern>> {
    patterns
        .iter()
        .map(|p| {
            glob::Pattern::new(p)
                .map_err(|e| MigrateError::config(format!("Invalid exclude pattern '{}': {}", p, e)))
        })
        .collect()
}

/// A backup file found on disk, paired with the target it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoundBackup {
    /// Target path relative to the walk root.
    pub target: PathBuf,
    pub suffix: String,
}

/// Walks `root` for files ending in one of `suffixes`, skipping hidden entries.
///
/// The longest matching suffix wins, so `.py.ardupilot_backup` is not read as
/// a `.bak`-style suffix of something else.
pub fn find_backups(root: &Path, suffixes: &[String]) -> Result<Vec<FoundBackup>> {
    let mut ordered: Vec<&String> = suffixes.iter().filter(|s| !s.is_empty()).collect();
    ordered.sort_by_key(|s| std::cmp::Reverse(s.len()));
    ordered.dedup();

    let mut found = Vec::new();
    for entry in WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e))
    {
        let entry = entry.map_err(|e| MigrateError::Read {
            path: e.path().unwrap_or(root).to_path_buf(),
            source: e.into(),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let Some(name) = entry.file_name().to_str() else {
            continue;
        };
        let Some(suffix) = ordered
            .iter()
            .find(|s| name.len() > s.len() && name.ends_with(s.as_str()))
        else {
            continue;
        };

        let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
        let as_str = relative.to_string_lossy();
        let target = PathBuf::from(&as_str[..as_str.len() - suffix.len()]);
        found.push(FoundBackup {
            target,
            suffix: suffix.to_string(),
        });
    }

    Ok(found)
}

fn is_hidden(entry: &walkdir::DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|s| s.starts_with('.'))
}
