//! Per-file migration.
//!
//! One call reads a target, applies its category's rules, scans for attention
//! terms and, if the text changed, backs the file up and writes it back. Dry
//! runs walk the same path and reach the same decision but stop short of the
//! backup and the write.

use crate::backup::{BackupGuard, BackupOutcome};
use crate::config::{AttentionStage, Category};
use crate::error::MigrateError;
use crate::rule::{RuleMatch, apply_rules};
use crate::scanner;
use std::io;
use std::path::{Path, PathBuf};

/// Filesystem behaviour of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mode {
    pub dry_run: bool,
    pub backups: bool,
}

impl Mode {
    pub fn live() -> Self {
        Self {
            dry_run: false,
            backups: true,
        }
    }

    pub fn dry_run() -> Self {
        Self {
            dry_run: true,
            backups: true,
        }
    }
}

/// Decides whether a changed file may be written.
///
/// Only consulted in live mode, after the change has been computed.
pub trait Approver {
    fn approve(&mut self, path: &Path, matches: &[RuleMatch]) -> bool;
}

/// Approves every change.
#[derive(Debug, Default, Clone, Copy)]
pub struct ApproveAll;

impl Approver for ApproveAll {
    fn approve(&mut self, _path: &Path, _matches: &[RuleMatch]) -> bool {
        true
    }
}

#[derive(Debug)]
pub enum FileStatus {
    /// Rules produced no net difference; the file was not touched.
    Unchanged,
    /// Content differs. In dry runs nothing was written.
    Changed { backup: BackupOutcome },
    Missing,
    /// The approver rejected the change.
    Declined,
    Failed(MigrateError),
}

/// Outcome for one target.
#[derive(Debug)]
pub struct FileResult {
    /// Target path as declared, relative to the run root.
    pub path: PathBuf,
    pub category: String,
    pub status: FileStatus,
    pub matches: Vec<RuleMatch>,
    pub attention: Vec<String>,
}

impl FileResult {
    fn new(path: &Path, category: &Category, status: FileStatus) -> Self {
        Self {
            path: path.to_path_buf(),
            category: category.name.clone(),
            status,
            matches: Vec::new(),
            attention: Vec::new(),
        }
    }

    pub fn is_changed(&self) -> bool {
        matches!(self.status, FileStatus::Changed { .. })
    }
}

pub struct FileMigrator<'a> {
    root: &'a Path,
    mode: Mode,
}

impl<'a> FileMigrator<'a> {
    pub fn new(root: &'a Path, mode: Mode) -> Self {
        Self { root, mode }
    }

    pub fn migrate(
        &self,
        target: &Path,
        category: &Category,
        approver: &mut dyn Approver,
    ) -> FileResult {
        let full = self.root.join(target);

        if !full.exists() {
            tracing::debug!(path = %target.display(), "target missing");
            return FileResult::new(target, category, FileStatus::Missing);
        }

        let original = match std::fs::read_to_string(&full) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return FileResult::new(target, category, FileStatus::Missing);
            }
            Err(source) => {
                tracing::warn!(path = %target.display(), error = %source, "could not read target");
                let error = MigrateError::Read { path: full, source };
                return FileResult::new(target, category, FileStatus::Failed(error));
            }
        };

        let applied = apply_rules(&original, &category.rules);
        let scanned = match category.attention_stage {
            AttentionStage::Before => &original,
            AttentionStage::After => &applied.content,
        };
        let attention = scanner::scan(scanned, &category.attention);

        let mut result = FileResult::new(target, category, FileStatus::Unchanged);
        result.attention = attention;

        if applied.content == original {
            tracing::debug!(path = %target.display(), "no changes needed");
            result.matches = applied.matches;
            return result;
        }

        if !self.mode.dry_run && !approver.approve(target, &applied.matches) {
            result.matches = applied.matches;
            result.status = FileStatus::Declined;
            return result;
        }

        result.status = match self.write_back(&full, &applied.content, category) {
            Ok(backup) => FileStatus::Changed { backup },
            Err(error) => FileStatus::Failed(error),
        };
        result.matches = applied.matches;
        result
    }

    fn write_back(
        &self,
        full: &Path,
        content: &str,
        category: &Category,
    ) -> Result<BackupOutcome, MigrateError> {
        let guard = BackupGuard::new(&category.backup_suffix, self.mode.dry_run, self.mode.backups);
        let backup = guard.ensure_backup(full)?;

        if self.mode.dry_run {
            return Ok(backup);
        }

        std::fs::write(full, content).map_err(|source| MigrateError::Write {
            path: full.to_path_buf(),
            source,
        })?;
        tracing::info!(path = %full.display(), "wrote migrated content");
        Ok(backup)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::Rule;
    use std::fs;
    use tempfile::TempDir;

    fn category(rules: Vec<Rule>, attention: &[&str], stage: AttentionStage) -> Category {
        Category {
            name: "python".to_string(),
            rules,
            targets: Vec::new(),
            attention: attention.iter().map(|s| s.to_string()).collect(),
            attention_stage: stage,
            backup_suffix: ".bak".to_string(),
        }
    }

    fn import_rule() -> Rule {
        Rule::new("python", "from old.pkg import", "from new.pkg import").unwrap()
    }

    struct DeclineAll(usize);

    impl Approver for DeclineAll {
        fn approve(&mut self, _path: &Path, _matches: &[RuleMatch]) -> bool {
            self.0 += 1;
            false
        }
    }

    #[test]
    fn migrates_and_backs_up() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("m.py"), "from old.pkg import X").unwrap();
        let cat = category(vec![import_rule()], &[], AttentionStage::After);

        let result = FileMigrator::new(dir.path(), Mode::live()).migrate(
            Path::new("m.py"),
            &cat,
            &mut ApproveAll,
        );

        assert!(matches!(
            result.status,
            FileStatus::Changed {
                backup: BackupOutcome::Created
            }
        ));
        assert_eq!(result.matches.len(), 1);
        assert_eq!(
            fs::read_to_string(dir.path().join("m.py")).unwrap(),
            "from new.pkg import X"
        );
        assert_eq!(
            fs::read_to_string(dir.path().join("m.py.bak")).unwrap(),
            "from old.pkg import X"
        );
    }

    #[test]
    fn unchanged_file_is_left_alone() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("m.py");
        fs::write(&path, "from new.pkg import X").unwrap();
        let before = fs::metadata(&path).unwrap().modified().unwrap();
        let cat = category(vec![import_rule()], &[], AttentionStage::After);

        let result = FileMigrator::new(dir.path(), Mode::live()).migrate(
            Path::new("m.py"),
            &cat,
            &mut ApproveAll,
        );

        assert!(matches!(result.status, FileStatus::Unchanged));
        assert!(!dir.path().join("m.py.bak").exists());
        assert_eq!(fs::metadata(&path).unwrap().modified().unwrap(), before);
    }

    #[test]
    fn dry_run_reports_change_without_writing() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("m.py"), "from old.pkg import X").unwrap();
        let cat = category(vec![import_rule()], &[], AttentionStage::After);
        let mut approver = DeclineAll(0);

        let result = FileMigrator::new(dir.path(), Mode::dry_run()).migrate(
            Path::new("m.py"),
            &cat,
            &mut approver,
        );

        assert!(matches!(
            result.status,
            FileStatus::Changed {
                backup: BackupOutcome::SkippedDryRun
            }
        ));
        assert_eq!(approver.0, 0);
        assert_eq!(
            fs::read_to_string(dir.path().join("m.py")).unwrap(),
            "from old.pkg import X"
        );
        assert!(!dir.path().join("m.py.bak").exists());
    }

    #[test]
    fn missing_target_is_not_an_error() {
        let dir = TempDir::new().unwrap();
        let cat = category(vec![import_rule()], &[], AttentionStage::After);
        let result = FileMigrator::new(dir.path(), Mode::live()).migrate(
            Path::new("nope.py"),
            &cat,
            &mut ApproveAll,
        );
        assert!(matches!(result.status, FileStatus::Missing));
    }

    #[test]
    fn undecodable_file_fails_with_read_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("bin.py"), [0xff, 0xfe, 0x00, 0x80]).unwrap();
        let cat = category(vec![import_rule()], &[], AttentionStage::After);

        let result = FileMigrator::new(dir.path(), Mode::live()).migrate(
            Path::new("bin.py"),
            &cat,
            &mut ApproveAll,
        );
        match result.status {
            FileStatus::Failed(err) => assert_eq!(err.kind(), "read_error"),
            other => panic!("expected read failure, got {:?}", other),
        }
    }

    #[test]
    fn failed_backup_leaves_original_untouched() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("m.py"), "from old.pkg import X").unwrap();
        fs::create_dir(dir.path().join("m.py.bak")).unwrap();
        let cat = category(vec![import_rule()], &[], AttentionStage::After);

        let result = FileMigrator::new(dir.path(), Mode::live()).migrate(
            Path::new("m.py"),
            &cat,
            &mut ApproveAll,
        );

        match result.status {
            FileStatus::Failed(err) => assert_eq!(err.kind(), "backup_write_error"),
            other => panic!("expected backup failure, got {:?}", other),
        }
        assert_eq!(result.matches.len(), 1);
        assert_eq!(
            fs::read_to_string(dir.path().join("m.py")).unwrap(),
            "from old.pkg import X"
        );
    }

    /// Replaces the target with a directory once the change is computed.
    struct ReplaceWithDir(PathBuf);

    impl Approver for ReplaceWithDir {
        fn approve(&mut self, _path: &Path, _matches: &[RuleMatch]) -> bool {
            fs::remove_file(&self.0).unwrap();
            fs::create_dir(&self.0).unwrap();
            true
        }
    }

    #[test]
    fn failed_write_keeps_backup() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("m.py");
        fs::write(&path, "from old.pkg import X").unwrap();
        fs::write(dir.path().join("m.py.bak"), "from old.pkg import X").unwrap();
        let cat = category(vec![import_rule()], &[], AttentionStage::After);

        let result = FileMigrator::new(dir.path(), Mode::live()).migrate(
            Path::new("m.py"),
            &cat,
            &mut ReplaceWithDir(path),
        );

        match result.status {
            FileStatus::Failed(err) => assert_eq!(err.kind(), "write_error"),
            other => panic!("expected write failure, got {:?}", other),
        }
        assert_eq!(result.matches.len(), 1);
        assert_eq!(
            fs::read_to_string(dir.path().join("m.py.bak")).unwrap(),
            "from old.pkg import X"
        );
    }

    #[test]
    fn declined_change_is_not_written() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("m.py"), "from old.pkg import X").unwrap();
        let cat = category(vec![import_rule()], &[], AttentionStage::After);
        let mut approver = DeclineAll(0);

        let result = FileMigrator::new(dir.path(), Mode::live()).migrate(
            Path::new("m.py"),
            &cat,
            &mut approver,
        );

        assert!(matches!(result.status, FileStatus::Declined));
        assert_eq!(approver.0, 1);
        assert_eq!(result.matches.len(), 1);
        assert!(!dir.path().join("m.py.bak").exists());
        assert_eq!(
            fs::read_to_string(dir.path().join("m.py")).unwrap(),
            "from old.pkg import X"
        );
    }

    #[test]
    fn attention_stage_selects_scanned_content() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("m.py"), "from old.pkg import X").unwrap();

        let after = category(vec![import_rule()], &["old.pkg", "new.pkg"], AttentionStage::After);
        let result = FileMigrator::new(dir.path(), Mode::dry_run()).migrate(
            Path::new("m.py"),
            &after,
            &mut ApproveAll,
        );
        assert_eq!(result.attention, vec!["new.pkg"]);

        let before = category(vec![import_rule()], &["old.pkg", "new.pkg"], AttentionStage::Before);
        let result = FileMigrator::new(dir.path(), Mode::dry_run()).migrate(
            Path::new("m.py"),
            &before,
            &mut ApproveAll,
        );
        assert_eq!(result.attention, vec!["old.pkg"]);
    }

    #[test]
    fn attention_is_recorded_without_rule_match() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("backend.py"), "import ArduPilot").unwrap();
        let cat = category(vec![import_rule()], &["ArduPilot"], AttentionStage::After);

        let result = FileMigrator::new(dir.path(), Mode::live()).migrate(
            Path::new("backend.py"),
            &cat,
            &mut ApproveAll,
        );
        assert!(matches!(result.status, FileStatus::Unchanged));
        assert_eq!(result.attention, vec!["ArduPilot"]);
    }
}
