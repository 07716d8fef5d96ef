//! tree-migrate: apply ordered text rewrite rules to a source tree.
//!
//! Loads a migration configuration, compiles it into a plan and runs one of
//! the subcommands against the target tree. Per-file problems end up in the
//! printed report; only configuration errors make the process fail.

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use dialoguer::Confirm;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use tree_migrate::cli::{Args, Commands};
use tree_migrate::config::{ConfigFile, Plan};
use tree_migrate::migrator::{ApproveAll, Approver, Mode};
use tree_migrate::report;
use tree_migrate::rule::RuleMatch;
use tree_migrate::run::{self, MigrationRun};

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    match args.command {
        Commands::Run {
            config,
            root,
            dry_run,
            no_backup,
            categories,
            interactive,
            json,
        } => {
            let mode = Mode {
                dry_run,
                backups: !no_backup,
            };
            cmd_run(&config, root, &categories, mode, interactive, json, args.verbose)
        }
        Commands::Check {
            config,
            root,
            categories,
            json,
        } => cmd_check(&config, root, &categories, json),
        Commands::Targets {
            config,
            root,
            categories,
        } => cmd_targets(&config, root, &categories),
        Commands::Restore {
            config,
            root,
            dry_run,
            remove,
            all,
            categories,
            json,
        } => cmd_restore(&config, root, &categories, dry_run, remove, all, json),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "tree_migrate=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_plan(config: &Path, root: Option<PathBuf>, categories: &[String]) -> Result<Plan> {
    let root = root.unwrap_or_else(|| PathBuf::from("."));
    let file = ConfigFile::load(config)
        .with_context(|| format!("Failed to load {}", config.display()))?;
    Plan::compile(&file, &root, categories).context("Invalid migration configuration")
}

/// Asks on the terminal before each changed file is written.
struct PromptApprover;

impl Approver for PromptApprover {
    fn approve(&mut self, path: &Path, matches: &[RuleMatch]) -> bool {
        eprintln!("\n{} {}", "Would update:".yellow().bold(), path.display());
        for m in matches {
            eprintln!("  {} -> {}", m.matched.red(), m.replacement.green());
        }

        match Confirm::new()
            .with_prompt("Apply these changes?")
            .default(true)
            .interact()
        {
            Ok(answer) => answer,
            Err(e) => {
                eprintln!("{} Prompt failed, skipping file: {}", "warn:".yellow().bold(), e);
                false
            }
        }
    }
}

fn cmd_run(
    config: &Path,
    root: Option<PathBuf>,
    categories: &[String],
    mode: Mode,
    interactive: bool,
    json_output: bool,
    verbose: bool,
) -> Result<()> {
    let plan = load_plan(config, root, categories)?;

    if verbose {
        let targets: usize = plan.categories.iter().map(|c| c.targets.len()).sum();
        eprintln!(
            "{} {} target(s) in {} categor{}",
            "info:".blue().bold(),
            targets,
            plan.categories.len(),
            if plan.categories.len() == 1 { "y" } else { "ies" }
        );
    }
    if interactive && mode.dry_run {
        eprintln!(
            "{} --interactive has no effect with --dry-run",
            "warn:".yellow().bold()
        );
    }

    let migration = MigrationRun::new(&plan, mode);
    let result = if interactive {
        migration.execute(&mut PromptApprover)
    } else {
        migration.execute(&mut ApproveAll)
    };

    if json_output {
        println!("{}", report::to_json(&result)?);
    } else {
        print!("{}", report::render_text(&result));
    }

    Ok(())
}

fn cmd_check(
    config: &Path,
    root: Option<PathBuf>,
    categories: &[String],
    json_output: bool,
) -> Result<()> {
    let plan = load_plan(config, root, categories)?;
    let result = run::check(&plan);

    if json_output {
        println!("{}", report::to_json(&result)?);
    } else {
        print!("{}", report::render_check(&result));
    }

    Ok(())
}

fn cmd_targets(config: &Path, root: Option<PathBuf>, categories: &[String]) -> Result<()> {
    let plan = load_plan(config, root, categories)?;

    for category in &plan.categories {
        println!(
            "{} ({} rule(s), {} target(s))",
            category.name.bold(),
            category.rules.len(),
            category.targets.len()
        );
        for target in &category.targets {
            let status = if plan.root.join(target).is_file() {
                "present".green()
            } else {
                "missing".yellow()
            };
            println!("  {} {}", status, target.display());
        }
    }

    if !plan.manual_review.is_empty() {
        println!("{}", "manual review".bold());
        for path in &plan.manual_review {
            println!("  {}", path.display());
        }
    }

    Ok(())
}

fn cmd_restore(
    config: &Path,
    root: Option<PathBuf>,
    categories: &[String],
    dry_run: bool,
    remove: bool,
    all: bool,
    json_output: bool,
) -> Result<()> {
    let plan = load_plan(config, root, categories)?;
    let result = run::restore(&plan, dry_run, remove, all);

    if json_output {
        println!("{}", report::to_json(&result)?);
    } else {
        print!("{}", report::render_restore(&result));
        if dry_run {
            println!("\n{} Use without --dry-run to restore", "hint:".cyan().bold());
        }
    }

    Ok(())
}
