//! Rewrite rules and their application to a text buffer.
//!
//! A rule is a compiled regex plus a replacement template. Rules are applied in
//! the caller's order, each against the output of the previous one, so a later
//! rule can build on an earlier rewrite. Every non-overlapping match of a rule
//! is replaced in a single pass; only the first matched text is kept for the
//! report.

use crate::error::{MigrateError, Result};
use regex::{Regex, RegexBuilder};
use serde::Serialize;

/// A compiled pattern/replacement pair.
#[derive(Debug, Clone)]
pub struct Rule {
    pattern: Regex,
    replacement: String,
    description: Option<String>,
}

impl Rule {
    /// Compiles `pattern`. `category` is only used to label the error.
    pub fn new(category: &str, pattern: &str, replacement: &str) -> Result<Self> {
        Self::build(category, pattern, replacement, false)
    }

    /// Like [`Rule::new`], but optionally lets `.` match newlines so a rule can
    /// span a whole multi-line block.
    pub fn build(category: &str, pattern: &str, replacement: &str, dot_all: bool) -> Result<Self> {
        let compiled = RegexBuilder::new(pattern)
            .dot_matches_new_line(dot_all)
            .build()
            .map_err(|source| MigrateError::Pattern {
                category: category.to_string(),
                pattern: pattern.to_string(),
                source,
            })?;

        Ok(Self {
            pattern: compiled,
            replacement: replacement.to_string(),
            description: None,
        })
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn replacement(&self) -> &str {
        &self.replacement
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

/// A rule that fired on a file, with the first text it matched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleMatch {
    /// Position of the rule in its category's rule list.
    pub rule_index: usize,
    pub pattern: String,
    /// First matched substring. Later occurrences were replaced too but are not listed.
    pub matched: String,
    pub replacement: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Output of [`apply_rules`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applied {
    pub content: String,
    pub matches: Vec<RuleMatch>,
}

/// Applies `rules` to `content` in order and returns the rewritten text.
///
/// A rule counts as matched whenever it finds an occurrence, even if the
/// substitution produces identical text.
pub fn apply_rules(content: &str, rules: &[Rule]) -> Applied {
    let mut current = content.to_string();
    let mut matches = Vec::new();

    for (rule_index, rule) in rules.iter().enumerate() {
        let Some(first) = rule.pattern.find(&current) else {
            continue;
        };

        matches.push(RuleMatch {
            rule_index,
            pattern: rule.pattern().to_string(),
            matched: first.as_str().to_string(),
            replacement: rule.replacement.clone(),
            description: rule.description.clone(),
        });

        tracing::debug!(pattern = rule.pattern(), matched = first.as_str(), "rule matched");
        current = rule
            .pattern
            .replace_all(&current, rule.replacement.as_str())
            .into_owned();
    }

    Applied {
        content: current,
        matches,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(pattern: &str, replacement: &str) -> Rule {
        Rule::new("test", pattern, replacement).unwrap()
    }

    #[test]
    fn rules_apply_in_given_order() {
        let forward = [rule("A", "B"), rule("B", "C")];
        assert_eq!(apply_rules("A", &forward).content, "C");

        let reverse = [rule("B", "C"), rule("A", "B")];
        assert_eq!(apply_rules("A", &reverse).content, "B");
    }

    #[test]
    fn later_rules_see_earlier_output() {
        let rules = [rule("A", "B"), rule("B", "C")];
        let applied = apply_rules("A", &rules);
        assert_eq!(applied.matches.len(), 2);
        assert_eq!(applied.matches[1].matched, "B");
    }

    #[test]
    fn replaces_every_occurrence_but_reports_first() {
        let rules = [rule(r"old\.(\w+)", "new.$1")];
        let applied = apply_rules("import old.a\nimport old.b\n", &rules);
        assert_eq!(applied.content, "import new.a\nimport new.b\n");
        assert_eq!(applied.matches.len(), 1);
        assert_eq!(applied.matches[0].matched, "old.a");
        assert_eq!(applied.matches[0].rule_index, 0);
    }

    #[test]
    fn identity_substitution_still_counts_as_match() {
        let rules = [rule("keep", "keep")];
        let applied = apply_rules("keep me", &rules);
        assert_eq!(applied.content, "keep me");
        assert_eq!(applied.matches.len(), 1);
    }

    #[test]
    fn unmatched_rules_are_not_reported() {
        let rules = [rule("absent", "x"), rule("here", "there")];
        let applied = apply_rules("here", &rules);
        assert_eq!(applied.content, "there");
        assert_eq!(applied.matches.len(), 1);
        assert_eq!(applied.matches[0].rule_index, 1);
    }

    #[test]
    fn empty_rule_list_returns_input() {
        let applied = apply_rules("unchanged", &[]);
        assert_eq!(applied.content, "unchanged");
        assert!(applied.matches.is_empty());
    }

    #[test]
    fn invalid_pattern_fails_at_construction() {
        let err = Rule::new("python", "from (unclosed", "x").unwrap_err();
        assert_eq!(err.kind(), "pattern_error");
        assert!(err.to_string().contains("category 'python'"));
    }

    #[test]
    fn dot_all_spans_lines() {
        let source = "def get_xform(prim):\n    x = 1\n    return rotation\nrest";
        let plain = Rule::new("py", r"def get_xform\(prim\):.*?return rotation", "NEW").unwrap();
        assert_eq!(apply_rules(source, &[plain]).content, source);

        let dot_all =
            Rule::build("py", r"def get_xform\(prim\):.*?return rotation", "NEW", true).unwrap();
        assert_eq!(apply_rules(source, &[dot_all]).content, "NEW\nrest");
    }

    #[test]
    fn description_is_carried_into_matches() {
        let rules = [rule("a", "b").with_description("swap a")];
        let applied = apply_rules("a", &rules);
        assert_eq!(applied.matches[0].description.as_deref(), Some("swap a"));
    }
}
