//! Error kinds raised while loading a migration plan or processing a file.
//!
//! Configuration-level variants (`Config`, `Pattern`) abort a run before any
//! file is touched. Everything else is scoped to a single target and ends up
//! in the report instead of stopping the batch.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MigrateError {
    /// Requested target does not exist on disk.
    #[error("File not found: {}", .path.display())]
    FileNotFound { path: PathBuf },

    /// Target exists but could not be read or is not valid UTF-8.
    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A rule pattern failed to compile.
    #[error("Invalid pattern '{pattern}' in category '{category}': {source}")]
    Pattern {
        category: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// The backup copy could not be created, so the target was left alone.
    #[error("Failed to back up {} to {}: {source}", .path.display(), .backup.display())]
    BackupWrite {
        path: PathBuf,
        backup: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing the migrated content failed. A backup exists if backups are enabled.
    #[error("Failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Copying a backup back over its target failed.
    #[error("Failed to restore {} from {}: {source}", .path.display(), .backup.display())]
    Restore {
        path: PathBuf,
        backup: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration document is unreadable or inconsistent.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl MigrateError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Short machine-readable name of the error kind, used in JSON reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::FileNotFound { .. } => "file_not_found",
            Self::Read { .. } => "read_error",
            Self::Pattern { .. } => "pattern_error",
            Self::BackupWrite { .. } => "backup_write_error",
            Self::Write { .. } => "write_error",
            Self::Restore { .. } => "restore_error",
            Self::Config(_) => "config_error",
        }
    }
}

pub type Result<T, E = MigrateError> = std::result::Result<T, E>;
