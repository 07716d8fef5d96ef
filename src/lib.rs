//! tree-migrate library for rule-driven source tree migrations.
//!
//! This library provides programmatic access to the migration engine. A run
//! works in three phases:
//!
//! 1. **Planning**: Load a configuration and compile it into a [`Plan`]. Every
//!    pattern is compiled here, so a bad rule fails before any file is read.
//! 2. **Migration**: For each target, apply the category's rules in order,
//!    scan for attention terms, back the file up once and write it back.
//! 3. **Reporting**: Render the finished [`MigrationReport`] as text or JSON.
//!
//! # Example
//!
//! ```no_run
//! use tree_migrate::{config, migrator::Mode, report, run};
//! use std::path::Path;
//!
//! let file = config::ConfigFile::load(Path::new("migrate.toml")).unwrap();
//! let plan = config::Plan::compile(&file, Path::new("."), &[]).unwrap();
//!
//! // Dry run first: same decisions, no writes
//! let preview = run::run(&plan, Mode::dry_run());
//! println!("{}", report::render_text(&preview));
//!
//! let result = run::run(&plan, Mode::live());
//! println!("{} file(s) migrated", result.changed.len());
//! ```

pub mod backup;
pub mod cli;
pub mod config;
pub mod error;
pub mod migrator;
pub mod report;
pub mod rule;
pub mod run;
pub mod scanner;

// Re-export commonly used types at crate root
pub use config::{ConfigFile, Plan};
pub use error::MigrateError;
pub use migrator::Mode;
pub use report::MigrationReport;
pub use rule::{Rule, RuleMatch, apply_rules};
