//! Migration configuration.
//!
//! A configuration document declares categories of target files. Each
//! category binds an ordered rule list, the attention terms to look for and
//! the backup suffix to use. [`Plan::compile`] validates the document,
//! compiles every pattern and resolves glob targets, so a bad rule aborts the
//! run before any file is read.
//!
//! ```toml
//! manual_review = ["backends/ardupilot_backend.py"]
//!
//! [[category]]
//! name = "python"
//! targets = ["examples/app.py"]
//! attention = ["ArduPilot"]
//!
//! [[category.rule]]
//! pattern = 'from omni\.isaac\.core import World'
//! replacement = "from isaacsim.core.api import World"
//! ```

use crate::backup::DEFAULT_SUFFIX;
use crate::error::{MigrateError, Result};
use crate::rule::Rule;
use crate::scanner;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Which content the attention terms are searched in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AttentionStage {
    /// The file as it was read.
    Before,
    /// The file after all rules were applied.
    #[default]
    After,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RuleConfig {
    pub pattern: String,
    pub replacement: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Let `.` match newlines.
    #[serde(default)]
    pub dot_all: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CategoryConfig {
    pub name: String,
    #[serde(default)]
    pub targets: Vec<PathBuf>,
    #[serde(default)]
    pub globs: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
    #[serde(default)]
    pub attention: Vec<String>,
    #[serde(default)]
    pub attention_stage: AttentionStage,
    #[serde(default = "default_suffix")]
    pub backup_suffix: String,
    #[serde(rename = "rule", alias = "rules", default)]
    pub rules: Vec<RuleConfig>,
}

fn default_suffix() -> String {
    DEFAULT_SUFFIX.to_string()
}

/// The on-disk configuration document.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Paths always listed for human review when they exist.
    #[serde(default)]
    pub manual_review: Vec<PathBuf>,
    #[serde(rename = "category", alias = "categories", default)]
    pub categories: Vec<CategoryConfig>,
}

impl ConfigFile {
    /// Reads a `.json` file with serde_json and anything else as TOML.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => MigrateError::FileNotFound {
                path: path.to_path_buf(),
            },
            _ => MigrateError::config(format!("Failed to read {}: {}", path.display(), e)),
        })?;

        let parsed = if path.extension().is_some_and(|ext| ext == "json") {
            Self::from_json(&content)
        } else {
            Self::from_toml(&content)
        };
        parsed.map_err(|e| MigrateError::config(format!("{}: {}", path.display(), e)))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| MigrateError::config(e.to_string()))
    }

    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|e| MigrateError::config(e.to_string()))
    }
}

/// A category with compiled rules and resolved targets.
#[derive(Debug, Clone)]
pub struct Category {
    pub name: String,
    pub rules: Vec<Rule>,
    /// Paths relative to the plan root, in processing order.
    pub targets: Vec<PathBuf>,
    pub attention: Vec<String>,
    pub attention_stage: AttentionStage,
    pub backup_suffix: String,
}

/// A validated configuration bound to a root directory.
#[derive(Debug, Clone)]
pub struct Plan {
    pub root: PathBuf,
    pub categories: Vec<Category>,
    pub manual_review: Vec<PathBuf>,
}

impl Plan {
    /// Validates `config` and compiles it against `root`.
    ///
    /// When `only` is non-empty, just the named categories are kept (in
    /// configuration order). Naming an unknown category is an error.
    pub fn compile(config: &ConfigFile, root: &Path, only: &[String]) -> Result<Self> {
        if config.categories.is_empty() {
            return Err(MigrateError::config("no categories defined"));
        }

        let mut names = HashSet::new();
        for category in &config.categories {
            if category.name.trim().is_empty() {
                return Err(MigrateError::config("category name must not be empty"));
            }
            if !names.insert(category.name.as_str()) {
                return Err(MigrateError::config(format!(
                    "duplicate category '{}'",
                    category.name
                )));
            }
            if category.backup_suffix.is_empty() {
                return Err(MigrateError::config(format!(
                    "category '{}' has an empty backup_suffix",
                    category.name
                )));
            }
        }

        if let Some(unknown) = only.iter().find(|name| !names.contains(name.as_str())) {
            return Err(MigrateError::config(format!("unknown category '{}'", unknown)));
        }

        let mut categories = Vec::new();
        for raw in &config.categories {
            if !only.is_empty() && !only.contains(&raw.name) {
                continue;
            }
            categories.push(compile_category(raw, root)?);
        }

        reject_shared_targets(&categories)?;

        Ok(Self {
            root: root.to_path_buf(),
            categories,
            manual_review: config.manual_review.clone(),
        })
    }

    /// Every backup suffix in use, for backup discovery.
    pub fn backup_suffixes(&self) -> Vec<String> {
        let mut suffixes: Vec<String> = self
            .categories
            .iter()
            .map(|c| c.backup_suffix.clone())
            .collect();
        suffixes.sort();
        suffixes.dedup();
        suffixes
    }
}

fn compile_category(raw: &CategoryConfig, root: &Path) -> Result<Category> {
    let rules = raw
        .rules
        .iter()
        .map(|r| {
            let rule = Rule::build(&raw.name, &r.pattern, &r.replacement, r.dot_all)?;
            Ok(match &r.description {
                Some(d) => rule.with_description(d.clone()),
                None => rule,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let mut targets: Vec<PathBuf> = Vec::new();
    for path in &raw.targets {
        if targets.contains(path) {
            tracing::debug!(path = %path.display(), category = %raw.name, "duplicate target ignored");
            continue;
        }
        targets.push(path.clone());
    }
    if !raw.globs.is_empty() {
        for path in scanner::expand_globs(root, &raw.globs, &raw.exclude)? {
            if !targets.contains(&path) {
                targets.push(path);
            }
        }
    }

    Ok(Category {
        name: raw.name.clone(),
        rules,
        targets,
        attention: raw.attention.clone(),
        attention_stage: raw.attention_stage,
        backup_suffix: raw.backup_suffix.clone(),
    })
}

/// Each target may belong to one category only.
fn reject_shared_targets(categories: &[Category]) -> Result<()> {
    let mut owners: HashMap<&Path, &str> = HashMap::new();
    for category in categories {
        for target in &category.targets {
            if let Some(first) = owners.insert(target.as_path(), category.name.as_str()) {
                return Err(MigrateError::config(format!(
                    "target '{}' is listed in both '{}' and '{}'",
                    target.display(),
                    first,
                    category.name
                )));
            }
        }
    }
    Ok(())
}
