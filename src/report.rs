//! Run reports and their rendering.
//!
//! Reports are plain serializable values. [`MigrationReport`] is filled in by
//! the run as each file finishes and is not modified afterwards. Rendering is
//! a separate step: [`render_text`] produces the colored human summary and
//! [`to_json`] the machine-readable form.

use crate::backup::BackupOutcome;
use crate::error::MigrateError;
use crate::migrator::{FileResult, FileStatus, Mode};
use crate::rule::RuleMatch;
use colored::Colorize;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    Unchanged,
    Changed,
    Missing,
    Declined,
    Error,
}

/// One requested target and what happened to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileEntry {
    pub path: PathBuf,
    pub category: String,
    pub status: EntryStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup: Option<BackupOutcome>,
}

/// Rules that fired on one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileMatches {
    pub path: PathBuf,
    pub category: String,
    pub matches: Vec<RuleMatch>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileError {
    pub path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub kind: String,
    pub message: String,
}

impl FileError {
    pub fn new(path: &Path, error: &MigrateError) -> Self {
        Self {
            path: path.to_path_buf(),
            category: None,
            kind: error.kind().to_string(),
            message: error.to_string(),
        }
    }

    pub fn with_category(mut self, category: &str) -> Self {
        self.category = Some(category.to_string());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub targets: usize,
    pub changed: usize,
    pub unchanged: usize,
    pub missing: usize,
    pub declined: usize,
    pub errors: usize,
    pub attention: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct MigrationReport {
    pub dry_run: bool,
    pub backups_enabled: bool,
    pub root: PathBuf,
    pub summary: Summary,
    /// Every target in processing order.
    pub files: Vec<FileEntry>,
    /// Changed targets in processing order.
    pub changed: Vec<PathBuf>,
    pub matches: Vec<FileMatches>,
    /// Flagged targets and the terms found in them.
    pub attention: BTreeMap<PathBuf, Vec<String>>,
    pub missing: Vec<PathBuf>,
    pub errors: Vec<FileError>,
    /// Configured review-only paths that exist.
    pub manual_review: Vec<PathBuf>,
}

impl MigrationReport {
    pub fn new(root: &Path, mode: Mode) -> Self {
        Self {
            dry_run: mode.dry_run,
            backups_enabled: mode.backups,
            root: root.to_path_buf(),
            summary: Summary::default(),
            files: Vec::new(),
            changed: Vec::new(),
            matches: Vec::new(),
            attention: BTreeMap::new(),
            missing: Vec::new(),
            errors: Vec::new(),
            manual_review: Vec::new(),
        }
    }

    /// Folds one file outcome into the report buckets.
    pub fn record(&mut self, result: FileResult) {
        let FileResult {
            path,
            category,
            status,
            matches,
            attention,
        } = result;

        if !attention.is_empty() {
            let terms = self.attention.entry(path.clone()).or_default();
            for term in attention {
                if !terms.contains(&term) {
                    terms.push(term);
                }
            }
        }

        if !matches.is_empty() {
            self.matches.push(FileMatches {
                path: path.clone(),
                category: category.clone(),
                matches,
            });
        }

        let (status, backup) = match status {
            FileStatus::Unchanged => (EntryStatus::Unchanged, None),
            FileStatus::Changed { backup } => {
                self.changed.push(path.clone());
                (EntryStatus::Changed, Some(backup))
            }
            FileStatus::Missing => {
                self.missing.push(path.clone());
                (EntryStatus::Missing, None)
            }
            FileStatus::Declined => (EntryStatus::Declined, None),
            FileStatus::Failed(error) => {
                self.errors
                    .push(FileError::new(&path, &error).with_category(&category));
                (EntryStatus::Error, None)
            }
        };

        self.files.push(FileEntry {
            path,
            category,
            status,
            backup,
        });
    }

    /// Seals the report with the manual review list and computes the summary.
    pub fn finish(mut self, manual_review: Vec<PathBuf>) -> Self {
        let count = |status| self.files.iter().filter(|f| f.status == status).count();
        self.summary = Summary {
            targets: self.files.len(),
            changed: count(EntryStatus::Changed),
            unchanged: count(EntryStatus::Unchanged),
            missing: count(EntryStatus::Missing),
            declined: count(EntryStatus::Declined),
            errors: count(EntryStatus::Error),
            attention: self.attention.len(),
        };
        self.manual_review = manual_review;
        self
    }

    fn matches_for(&self, entry: &FileEntry) -> &[RuleMatch] {
        self.matches
            .iter()
            .find(|m| m.path == entry.path && m.category == entry.category)
            .map(|m| m.matches.as_slice())
            .unwrap_or(&[])
    }

    fn error_for(&self, entry: &FileEntry) -> Option<&FileError> {
        self.errors
            .iter()
            .find(|e| e.path == entry.path && e.category.as_deref() == Some(entry.category.as_str()))
    }
}

/// Result of an attention-only scan.
#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    pub root: PathBuf,
    pub flagged: BTreeMap<PathBuf, Vec<String>>,
    pub clean: Vec<PathBuf>,
    pub missing: Vec<PathBuf>,
    pub errors: Vec<FileError>,
}

impl CheckReport {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            flagged: BTreeMap::new(),
            clean: Vec::new(),
            missing: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn record(&mut self, path: &Path, found: Vec<String>) {
        if found.is_empty() {
            self.clean.push(path.to_path_buf());
        } else {
            let terms = self.flagged.entry(path.to_path_buf()).or_default();
            for term in found {
                if !terms.contains(&term) {
                    terms.push(term);
                }
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RestoreReport {
    pub root: PathBuf,
    pub dry_run: bool,
    /// Restored targets, or targets that would be restored in a dry run.
    pub restored: Vec<PathBuf>,
    pub without_backup: Vec<PathBuf>,
    pub errors: Vec<FileError>,
}

impl RestoreReport {
    pub fn new(root: &Path, dry_run: bool) -> Self {
        Self {
            root: root.to_path_buf(),
            dry_run,
            restored: Vec::new(),
            without_backup: Vec::new(),
            errors: Vec::new(),
        }
    }
}

/// Pretty-printed JSON for any report.
pub fn to_json<T: Serialize>(report: &T) -> serde_json::Result<String> {
    serde_json::to_string_pretty(report)
}

/// Renders the human-readable migration summary.
pub fn render_text(report: &MigrationReport) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_migration(&mut out, report);
    out
}

fn write_migration(out: &mut String, report: &MigrationReport) -> std::fmt::Result {
    let mode = if report.dry_run {
        "DRY RUN".yellow().bold()
    } else {
        "LIVE".green().bold()
    };
    writeln!(out, "{} {}", "Mode:".bold(), mode)?;
    writeln!(out, "{} {}", "Root:".bold(), report.root.display())?;
    writeln!(
        out,
        "{} {}",
        "Backups:".bold(),
        if report.backups_enabled { "enabled" } else { "disabled" }
    )?;

    if !report.files.is_empty() {
        writeln!(out)?;
    }
    for entry in &report.files {
        let label = match entry.status {
            EntryStatus::Changed if report.dry_run => format!("{:<12}", "would update").yellow(),
            EntryStatus::Changed => format!("{:<12}", "updated").green(),
            EntryStatus::Unchanged => format!("{:<12}", "unchanged").dimmed(),
            EntryStatus::Missing => format!("{:<12}", "missing").yellow(),
            EntryStatus::Declined => format!("{:<12}", "declined").cyan(),
            EntryStatus::Error => format!("{:<12}", "error").red(),
        };
        let note = match entry.backup {
            Some(BackupOutcome::Created) => " (backup created)",
            Some(BackupOutcome::AlreadyExisted) => " (backup kept)",
            _ => "",
        };
        writeln!(out, "  {} {}{}", label, entry.path.display(), note.dimmed())?;

        for m in report.matches_for(entry) {
            writeln!(out, "      {} -> {}", m.matched.red(), m.replacement.green())?;
        }
        if entry.status == EntryStatus::Error
            && let Some(error) = report.error_for(entry)
        {
            writeln!(out, "      {}", error.message.red())?;
        }
    }

    let s = &report.summary;
    let changed = if report.dry_run {
        format!("{} would be modified", s.changed)
    } else {
        format!("{} modified", s.changed)
    };
    write!(
        out,
        "\n{} {}, {} unchanged, {} missing, {} failed",
        "Summary:".bold(),
        changed,
        s.unchanged,
        s.missing,
        s.errors
    )?;
    if s.declined > 0 {
        write!(out, ", {} declined", s.declined)?;
    }
    writeln!(out)?;

    if !report.attention.is_empty() {
        writeln!(
            out,
            "\n{} ({}):",
            "Needs attention".yellow().bold(),
            report.attention.len()
        )?;
        for (path, terms) in &report.attention {
            writeln!(out, "  {}: {}", path.display(), terms.join(", "))?;
        }
    }

    if !report.manual_review.is_empty() {
        writeln!(
            out,
            "\n{} ({}):",
            "Manual review required".yellow().bold(),
            report.manual_review.len()
        )?;
        for path in &report.manual_review {
            writeln!(out, "  {}", path.display())?;
        }
    }

    if report.dry_run {
        writeln!(
            out,
            "\n{} Dry run, no files were modified. Run without --dry-run to apply changes.",
            "hint:".cyan().bold()
        )?;
    } else if s.errors > 0 {
        writeln!(
            out,
            "\n{} Some files could not be processed, see errors above.",
            "warn:".yellow().bold()
        )?;
    } else {
        writeln!(out, "\n{} Migration complete.", "ok:".green().bold())?;
    }

    Ok(())
}

/// Renders the result of an attention-only scan.
pub fn render_check(report: &CheckReport) -> String {
    let mut out = String::new();
    let _ = write_check(&mut out, report);
    out
}

fn write_check(out: &mut String, report: &CheckReport) -> std::fmt::Result {
    for (path, terms) in &report.flagged {
        writeln!(
            out,
            "  {} {} contains {}",
            "flag".yellow().bold(),
            path.display(),
            terms.join(", ")
        )?;
    }
    for path in &report.clean {
        writeln!(out, "  {} {}", "ok".green().bold(), path.display())?;
    }
    for path in &report.missing {
        writeln!(out, "  {} {} not found", "skip".dimmed(), path.display())?;
    }
    for error in &report.errors {
        writeln!(out, "  {} {}", "error".red().bold(), error.message)?;
    }

    if report.flagged.is_empty() {
        writeln!(out, "\n{} No files need attention", "ok:".green().bold())
    } else {
        writeln!(
            out,
            "\n{} {} file(s) need attention",
            "Found".yellow().bold(),
            report.flagged.len()
        )
    }
}

/// Renders the result of a restore.
pub fn render_restore(report: &RestoreReport) -> String {
    let mut out = String::new();
    let _ = write_restore(&mut out, report);
    out
}

fn write_restore(out: &mut String, report: &RestoreReport) -> std::fmt::Result {
    let verb = if report.dry_run { "Would restore:" } else { "Restored:" };
    for path in &report.restored {
        writeln!(out, "  {} {}", verb.green(), path.display())?;
    }
    for error in &report.errors {
        writeln!(out, "  {} {}", "error".red().bold(), error.message)?;
    }
    writeln!(
        out,
        "\n{} {} restored, {} without backup",
        "Summary:".bold(),
        report.restored.len(),
        report.without_backup.len()
    )
}
