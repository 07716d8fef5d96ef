//! Batch execution over a compiled [`Plan`].
//!
//! Targets are processed one at a time in plan order: categories as
//! configured, targets as resolved. Each file is migrated independently and
//! its outcome folded into the report, so a failure on one file never stops
//! the batch.

use crate::backup::{BackupGuard, RestoreOutcome, backup_path};
use crate::config::Plan;
use crate::error::MigrateError;
use crate::migrator::{ApproveAll, Approver, FileMigrator, Mode};
use crate::report::{CheckReport, FileError, MigrationReport, RestoreReport};
use crate::scanner;
use std::collections::HashSet;
use std::io;
use std::path::PathBuf;

pub struct MigrationRun<'a> {
    plan: &'a Plan,
    mode: Mode,
}

impl<'a> MigrationRun<'a> {
    pub fn new(plan: &'a Plan, mode: Mode) -> Self {
        Self { plan, mode }
    }

    /// Migrates every target and returns the finished report.
    pub fn execute(&self, approver: &mut dyn Approver) -> MigrationReport {
        let migrator = FileMigrator::new(&self.plan.root, self.mode);
        let mut report = MigrationReport::new(&self.plan.root, self.mode);

        for category in &self.plan.categories {
            tracing::debug!(
                category = %category.name,
                targets = category.targets.len(),
                rules = category.rules.len(),
                "processing category"
            );
            for target in &category.targets {
                report.record(migrator.migrate(target, category, approver));
            }
        }

        let review = self
            .plan
            .manual_review
            .iter()
            .filter(|p| self.plan.root.join(p).exists())
            .cloned()
            .collect();
        report.finish(review)
    }
}

/// Runs `plan` with every change approved.
pub fn run(plan: &Plan, mode: Mode) -> MigrationReport {
    MigrationRun::new(plan, mode).execute(&mut ApproveAll)
}

/// Scans every existing target for its category's attention terms without
/// applying any rule.
pub fn check(plan: &Plan) -> CheckReport {
    let mut report = CheckReport::new(&plan.root);

    for category in &plan.categories {
        for target in &category.targets {
            let full = plan.root.join(target);
            match std::fs::read_to_string(&full) {
                Ok(content) => {
                    let found = scanner::scan(&content, &category.attention);
                    report.record(target, found);
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => report.missing.push(target.clone()),
                Err(source) => {
                    let error = MigrateError::Read { path: full, source };
                    report.errors.push(FileError::new(target, &error));
                }
            }
        }
    }

    report
}

/// Copies backups back over their targets.
///
/// With `discover`, backup files found under the root that belong to no
/// configured target are restored too.
pub fn restore(plan: &Plan, dry_run: bool, remove: bool, discover: bool) -> RestoreReport {
    let mut report = RestoreReport::new(&plan.root, dry_run);
    let mut seen: HashSet<PathBuf> = HashSet::new();

    let mut pending: Vec<(PathBuf, String)> = Vec::new();
    for category in &plan.categories {
        for target in &category.targets {
            pending.push((target.clone(), category.backup_suffix.clone()));
        }
    }

    if discover {
        match scanner::find_backups(&plan.root, &plan.backup_suffixes()) {
            Ok(found) => pending.extend(found.into_iter().map(|b| (b.target, b.suffix))),
            Err(error) => report.errors.push(FileError::new(&plan.root, &error)),
        }
    }

    for (target, suffix) in pending {
        if !seen.insert(backup_path(&target, &suffix)) {
            continue;
        }
        let guard = BackupGuard::new(suffix, dry_run, true);
        match guard.restore(&plan.root.join(&target), remove) {
            Ok(RestoreOutcome::Restored) => report.restored.push(target),
            Ok(RestoreOutcome::SkippedDryRun) => report.restored.push(target),
            Ok(RestoreOutcome::NoBackup) => report.without_backup.push(target),
            Err(error) => report.errors.push(FileError::new(&target, &error)),
        }
    }

    report
}
