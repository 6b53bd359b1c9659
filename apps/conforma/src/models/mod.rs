//! Shared data models: issues, validator results, and the validation context.

pub mod context;
pub mod diagnostic;

use crate::i18n;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "UPPERCASE")]
/// Issue severity. Declaration order gives `Minor < Major < Critical`.
pub enum Severity {
    Minor,
    Major,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Minor => "MINOR",
            Severity::Major => "MAJOR",
            Severity::Critical => "CRITICAL",
        }
    }

    /// CRITICAL and MAJOR issues make a result invalid.
    pub fn is_blocking(&self) -> bool {
        matches!(self, Severity::Critical | Severity::Major)
    }

    pub fn parse(s: &str) -> Option<Severity> {
        match s.trim().to_ascii_lowercase().as_str() {
            "critical" => Some(Severity::Critical),
            "major" => Some(Severity::Major),
            "minor" => Some(Severity::Minor),
            _ => None,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
/// Remediation text with its localized variant.
pub struct Suggestion {
    pub text: String,
    pub text_local: String,
}

impl Suggestion {
    pub fn new(text: impl Into<String>, text_local: impl Into<String>) -> Self {
        Suggestion {
            text: text.into(),
            text_local: text_local.into(),
        }
    }
}

#[derive(Serialize, Debug, Clone)]
/// A single finding. Built once through the consuming builder methods and
/// read through accessors afterwards.
pub struct Issue {
    severity: Severity,
    category: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    message_local: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    line: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    suggestion: Option<Suggestion>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    references: Vec<String>,
}

impl Issue {
    /// Create an issue. The localized message is synthesized from the
    /// category when the category is known; `localized` overrides it.
    pub fn new(severity: Severity, category: impl Into<String>, message: impl Into<String>) -> Self {
        let category = category.into();
        let message = message.into();
        let message_local = i18n::synthesize(&category, &message);
        Issue {
            severity,
            category,
            message,
            message_local,
            file: None,
            line: None,
            suggestion: None,
            references: Vec::new(),
        }
    }

    pub fn critical(category: impl Into<String>, message: impl Into<String>) -> Self {
        Issue::new(Severity::Critical, category, message)
    }

    pub fn major(category: impl Into<String>, message: impl Into<String>) -> Self {
        Issue::new(Severity::Major, category, message)
    }

    pub fn minor(category: impl Into<String>, message: impl Into<String>) -> Self {
        Issue::new(Severity::Minor, category, message)
    }

    pub fn localized(mut self, text: impl Into<String>) -> Self {
        self.message_local = Some(text.into());
        self
    }

    pub fn in_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    /// Attach a location. Line 0 means unknown and is dropped.
    pub fn at(mut self, file: impl Into<String>, line: u32) -> Self {
        self.file = Some(file.into());
        self.line = (line > 0).then_some(line);
        self
    }

    pub fn suggest(mut self, suggestion: Suggestion) -> Self {
        self.suggestion = Some(suggestion);
        self
    }

    pub fn reference(mut self, reference: impl Into<String>) -> Self {
        self.references.push(reference.into());
        self
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn message_local(&self) -> Option<&str> {
        self.message_local.as_deref()
    }

    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }

    pub fn line(&self) -> Option<u32> {
        self.line
    }

    pub fn suggestion(&self) -> Option<&Suggestion> {
        self.suggestion.as_ref()
    }

    pub fn references(&self) -> &[String] {
        &self.references
    }
}

#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
/// Issue counts per severity, used by printers.
pub struct Summary {
    pub critical: usize,
    pub major: usize,
    pub minor: usize,
}

#[derive(Serialize, Debug, Clone)]
/// Output of one validator, or of the engine's aggregation.
///
/// `valid` is false whenever a CRITICAL or MAJOR issue is present. Issues are
/// only appended through `add_issue`, which updates `valid` in the same step.
pub struct ValidationResult {
    validator: String,
    valid: bool,
    issues: Vec<Issue>,
    metrics: BTreeMap<String, String>,
}

impl ValidationResult {
    pub fn new(validator: impl Into<String>) -> Self {
        ValidationResult {
            validator: validator.into(),
            valid: true,
            issues: Vec::new(),
            metrics: BTreeMap::new(),
        }
    }

    pub fn add_issue(&mut self, issue: Issue) {
        if issue.severity().is_blocking() {
            self.valid = false;
        }
        self.issues.push(issue);
    }

    /// Force the result invalid regardless of issue severities.
    pub fn mark_invalid(&mut self) {
        self.valid = false;
    }

    pub fn set_metric(&mut self, key: impl Into<String>, value: impl ToString) {
        self.metrics.insert(key.into(), value.to_string());
    }

    /// Append `other`'s issues and copy its metrics under `<ns>.<key>`.
    pub fn absorb(&mut self, ns: &str, other: ValidationResult) {
        for (k, v) in other.metrics {
            self.metrics.insert(format!("{}.{}", ns, k), v);
        }
        for issue in other.issues {
            self.add_issue(issue);
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    pub fn metrics(&self) -> &BTreeMap<String, String> {
        &self.metrics
    }

    pub fn metric(&self, key: &str) -> Option<&str> {
        self.metrics.get(key).map(String::as_str)
    }

    pub fn summary(&self) -> Summary {
        let mut s = Summary::default();
        for is in &self.issues {
            match is.severity() {
                Severity::Critical => s.critical += 1,
                Severity::Major => s.major += 1,
                Severity::Minor => s.minor += 1,
            }
        }
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minor_issue_keeps_result_valid() {
        let mut r = ValidationResult::new("v");
        r.add_issue(Issue::minor("STYLE", "trailing whitespace"));
        r.add_issue(Issue::minor("STYLE", "long line"));
        assert!(r.is_valid());
        assert_eq!(r.issues().len(), 2);
    }

    #[test]
    fn test_blocking_issue_invalidates_immediately_and_stays_invalid() {
        let mut r = ValidationResult::new("v");
        r.add_issue(Issue::critical("COMPILATION_ERROR", "boom"));
        assert!(!r.is_valid());
        r.add_issue(Issue::critical("COMPILATION_ERROR", "boom again"));
        r.add_issue(Issue::minor("STYLE", "meh"));
        assert!(!r.is_valid());

        let mut m = ValidationResult::new("v");
        m.add_issue(Issue::major("MEMORY_LEAK", "leak"));
        assert!(!m.is_valid());
    }

    #[test]
    fn test_validity_matches_blocking_presence_for_all_orders() {
        let severities = [Severity::Minor, Severity::Major, Severity::Critical];
        for a in severities {
            for b in severities {
                for c in severities {
                    let mut r = ValidationResult::new("v");
                    for s in [a, b, c] {
                        r.add_issue(Issue::new(s, "X", "x"));
                    }
                    let blocking = r.issues().iter().any(|i| i.severity().is_blocking());
                    assert_eq!(r.is_valid(), !blocking);
                }
            }
        }
    }

    #[test]
    fn test_absorb_namespaces_metrics() {
        let mut child = ValidationResult::new("compilation");
        child.set_metric("errors", 2);
        child.add_issue(Issue::critical("COMPILATION_ERROR", "e"));
        let mut agg = ValidationResult::new("engine");
        agg.absorb("build", child);
        assert_eq!(agg.metric("build.errors"), Some("2"));
        assert_eq!(agg.metric("compilation.errors"), None);
        assert!(!agg.is_valid());
    }

    #[test]
    fn test_issue_builder_and_localized_synthesis() {
        let is = Issue::critical("FILE_READ_ERROR", "cannot open main.c")
            .at("main.c", 0)
            .reference("man 2 open");
        assert_eq!(is.line(), None);
        assert_eq!(is.file(), Some("main.c"));
        assert!(is.message_local().is_some());
        let custom = Issue::minor("WHATEVER_TAG", "x").localized("y");
        assert_eq!(custom.message_local(), Some("y"));
        assert!(Severity::Critical > Severity::Major && Severity::Major > Severity::Minor);
    }
}
