//! Forbidden-feature scan over sanitized source lines.

use super::{Priority, Validator};
use crate::error::ValidationError;
use crate::models::context::{Context, ModuleTag};
use crate::models::{Issue, Suggestion, ValidationResult};
use crate::rules::{self, FeatureRule};
use crate::scan::{LineSanitizer, Matcher};
use std::fs;
use tracing::debug;

const NAME: &str = "forbidden-features";

pub struct FeaturePatternValidator {
    rules: Vec<(FeatureRule, Matcher)>,
}

impl FeaturePatternValidator {
    /// Rules are tested in the given order. Patterns are compiled once here.
    pub fn new(rules: Vec<FeatureRule>) -> Self {
        let rules = rules
            .into_iter()
            .map(|r| {
                let m = Matcher::compile(&r.pattern);
                (r, m)
            })
            .collect();
        FeaturePatternValidator { rules }
    }

    /// The module's table followed by configured `extra` rules.
    pub fn for_module(module: ModuleTag, extra: Vec<FeatureRule>) -> Self {
        let mut all = rules::forbidden_features(module);
        all.extend(extra);
        Self::new(all)
    }

    /// Issues for one file's text; `display` is the path shown in issues.
    fn scan_text(&self, display: &str, text: &str, res: &mut ValidationResult) -> usize {
        let mut sanitizer = LineSanitizer::new();
        let mut matches = 0;
        for (idx, raw) in text.lines().enumerate() {
            let Some(line) = sanitizer.sanitize(raw) else {
                continue;
            };
            for (rule, matcher) in &self.rules {
                let Some(col) = matcher.find_column(&line) else {
                    continue;
                };
                matches += 1;
                res.add_issue(
                    Issue::new(
                        rule.severity,
                        "FORBIDDEN_FEATURE",
                        format!("{} (column {}): {}", rule.name, col, rule.description),
                    )
                    .at(display, idx as u32 + 1)
                    .suggest(Suggestion::new(
                        format!("Remove the use of {}.", rule.name),
                        format!("Supprimez l'utilisation de {}.", rule.name),
                    )),
                );
            }
        }
        matches
    }
}

impl Validator for FeaturePatternValidator {
    fn name(&self) -> &str {
        NAME
    }

    fn priority(&self) -> Priority {
        Priority::High
    }

    fn validate(&self, ctx: &Context) -> Result<ValidationResult, ValidationError> {
        let mut res = ValidationResult::new(NAME);
        let mut files = 0;
        let mut matches = 0;
        for path in ctx.all_files() {
            let display = ctx.display_path(path);
            match fs::read_to_string(path) {
                Ok(text) => {
                    files += 1;
                    matches += self.scan_text(&display, &text, &mut res);
                }
                Err(e) => {
                    res.add_issue(
                        Issue::critical("FILE_READ_ERROR", format!("cannot read {}: {}", display, e))
                            .in_file(display)
                            .suggest(Suggestion::new(
                                "Check that the file exists and is readable.",
                                "Vérifiez que le fichier existe et qu'il est lisible.",
                            )),
                    );
                }
            }
        }
        debug!(files, matches, rules = self.rules.len(), "scanned for forbidden features");
        res.set_metric("files", files);
        res.set_metric("matches", matches);
        res.set_metric("rules", self.rules.len());
        Ok(res)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::context::Platform;
    use crate::models::Severity;
    use std::path::PathBuf;

    fn rule(name: &str, pattern: &str, severity: Severity) -> FeatureRule {
        FeatureRule {
            name: name.into(),
            pattern: pattern.into(),
            description: format!("{} is not allowed", name),
            severity,
        }
    }

    fn scan(v: &FeaturePatternValidator, text: &str) -> ValidationResult {
        let mut r = ValidationResult::new(NAME);
        v.scan_text("main.c", text, &mut r);
        r
    }

    #[test]
    fn test_literals_and_comments_never_match() {
        let v = FeaturePatternValidator::for_module(ModuleTag::Basics, Vec::new());
        let text = "\
int main(void) {
    puts(\"goto fail; gets(buf)\");
    char c = 'g';
    /* goto
       system(\"ls\") */
    // longjmp(env, 1);
    return 0;
}
";
        let r = scan(&v, text);
        assert!(r.issues().is_empty(), "{:?}", r.issues());
    }

    #[test]
    fn test_one_issue_per_matching_rule_on_a_line() {
        let v = FeaturePatternValidator::new(vec![
            rule("goto", r"\bgoto\b", Severity::Major),
            rule("jump-word", r"goto", Severity::Minor),
            rule("never", r"\bnever_used\b", Severity::Critical),
        ]);
        let r = scan(&v, "int f(void) {\n  goto out; /* goto */\n}\n");
        assert_eq!(r.issues().len(), 2);
        assert!(r.issues().iter().all(|i| i.line() == Some(2)));
        assert_eq!(r.issues()[0].severity(), Severity::Major);
        assert_eq!(r.issues()[1].severity(), Severity::Minor);
        assert!(r.issues()[0].message().contains("column 3"));
        assert!(!r.is_valid());
    }

    #[test]
    fn test_malformed_pattern_falls_back_to_substring() {
        let v = FeaturePatternValidator::new(vec![rule("paren", "alloca(", Severity::Minor)]);
        let r = scan(&v, "void *p = alloca(16);\n");
        assert_eq!(r.issues().len(), 1);
        assert!(r.is_valid());
    }

    #[test]
    fn test_module_unlocks_allocation() {
        let text = "int *p = malloc(4); free(p);\n";
        let basics = FeaturePatternValidator::for_module(ModuleTag::Basics, Vec::new());
        assert_eq!(scan(&basics, text).issues().len(), 1);
        let memory = FeaturePatternValidator::for_module(ModuleTag::Memory, Vec::new());
        assert!(scan(&memory, text).issues().is_empty());
    }

    #[test]
    fn test_unreadable_file_is_critical_and_others_still_scanned() {
        let dir = tempfile::tempdir().unwrap();
        let ok = dir.path().join("ok.c");
        fs::write(&ok, "void f(void) { goto x; x: ; }\n").unwrap();
        let ctx = Context::new(dir.path().to_string_lossy(), ModuleTag::Basics, Platform::Linux)
            .with_files(vec![dir.path().join("missing.c"), ok], vec![PathBuf::new()]);
        let v = FeaturePatternValidator::for_module(ModuleTag::Basics, Vec::new());
        let r = v.validate(&ctx).unwrap();
        let cats: Vec<_> = r.issues().iter().map(|i| i.category()).collect();
        assert_eq!(cats.iter().filter(|c| **c == "FILE_READ_ERROR").count(), 2);
        assert!(cats.contains(&"FORBIDDEN_FEATURE"));
        assert_eq!(r.metric("files"), Some("1"));
        assert_eq!(r.issues()[0].file(), Some("missing.c"));
    }
}
