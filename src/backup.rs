//! Create-once backups of migrated files.
//!
//! The backup for `path` lives next to it at `path` + suffix. It is created
//! with `create_new`, so an existing backup is never replaced: the copy on disk
//! always holds the content from before the first migration that touched the
//! file, across reruns and across different rule sets.

use crate::error::{MigrateError, Result};
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

pub const DEFAULT_SUFFIX: &str = ".bak";

/// What [`BackupGuard::ensure_backup`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BackupOutcome {
    Created,
    AlreadyExisted,
    SkippedDryRun,
    SkippedNoBackupFlag,
}

/// What [`BackupGuard::restore`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RestoreOutcome {
    Restored,
    NoBackup,
    SkippedDryRun,
}

/// Returns the sibling backup path for `path`, e.g. `a/b.py` -> `a/b.py.bak`.
pub fn backup_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

#[derive(Debug, Clone)]
pub struct BackupGuard {
    suffix: String,
    dry_run: bool,
    enabled: bool,
}

impl BackupGuard {
    pub fn new(suffix: impl Into<String>, dry_run: bool, enabled: bool) -> Self {
        Self {
            suffix: suffix.into(),
            dry_run,
            enabled,
        }
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    pub fn path_for(&self, path: &Path) -> PathBuf {
        backup_path(path, &self.suffix)
    }

    /// Copies `path` to its backup location unless a backup already exists.
    ///
    /// Dry runs and disabled backups never touch the filesystem; dry run wins
    /// when both apply.
    pub fn ensure_backup(&self, path: &Path) -> Result<BackupOutcome> {
        if self.dry_run {
            return Ok(BackupOutcome::SkippedDryRun);
        }
        if !self.enabled {
            return Ok(BackupOutcome::SkippedNoBackupFlag);
        }

        let backup = self.path_for(path);
        let wrap = |source: io::Error| MigrateError::BackupWrite {
            path: path.to_path_buf(),
            backup: backup.clone(),
            source,
        };

        let mut target = match OpenOptions::new().write(true).create_new(true).open(&backup) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                if !backup.is_file() {
                    return Err(wrap(io::Error::new(
                        io::ErrorKind::AlreadyExists,
                        "backup path exists but is not a file",
                    )));
                }
                tracing::debug!(backup = %backup.display(), "backup already present");
                return Ok(BackupOutcome::AlreadyExisted);
            }
            Err(e) => return Err(wrap(e)),
        };

        let copied = fs::File::open(path).and_then(|mut source| {
            io::copy(&mut source, &mut target)?;
            target.sync_all()?;
            let permissions = source.metadata()?.permissions();
            fs::set_permissions(&backup, permissions)
        });

        if let Err(e) = copied {
            // A half-written backup would be mistaken for a good one on the next run.
            drop(target);
            let _ = fs::remove_file(&backup);
            return Err(wrap(e));
        }

        tracing::info!(backup = %backup.display(), "created backup");
        Ok(BackupOutcome::Created)
    }

    /// Copies the backup of `path` back over it. With `remove`, the backup is
    /// deleted afterwards.
    pub fn restore(&self, path: &Path, remove: bool) -> Result<RestoreOutcome> {
        let backup = self.path_for(path);
        if !backup.is_file() {
            return Ok(RestoreOutcome::NoBackup);
        }
        if self.dry_run {
            return Ok(RestoreOutcome::SkippedDryRun);
        }

        let wrap = |source: io::Error| MigrateError::Restore {
            path: path.to_path_buf(),
            backup: backup.clone(),
            source,
        };

        fs::copy(&backup, path).map_err(wrap)?;
        if remove {
            fs::remove_file(&backup).map_err(wrap)?;
        }

        tracing::info!(path = %path.display(), "restored from backup");
        Ok(RestoreOutcome::Restored)
    }
}
