//! Compiles the submission and reports compiler diagnostics as issues.

use super::{Priority, Validator};
use crate::error::ValidationError;
use crate::models::context::Context;
use crate::models::diagnostic::Diagnostic;
use crate::models::{Issue, Severity, Suggestion, ValidationResult};
use crate::tools::{CompileOutcome, CompilerTool};
use std::path::Path;
use tracing::debug;

const NAME: &str = "compilation";

#[derive(Debug, Default)]
pub struct CompilationValidator;

impl CompilationValidator {
    pub fn new() -> Self {
        CompilationValidator
    }
}

impl Validator for CompilationValidator {
    fn name(&self) -> &str {
        NAME
    }

    fn priority(&self) -> Priority {
        Priority::Critical
    }

    fn validate(&self, ctx: &Context) -> Result<ValidationResult, ValidationError> {
        let mut res = ValidationResult::new(NAME);
        res.set_metric("compiler", &ctx.tools.compiler);
        res.set_metric("std", &ctx.tools.std);
        if ctx.sources.is_empty() {
            res.add_issue(
                Issue::critical("NO_SOURCE_FILES", "no .c source files were found in the submission")
                    .in_file(ctx.submission.clone())
                    .suggest(Suggestion::new(
                        "Place the .c files in the submission directory.",
                        "Placez les fichiers .c dans le répertoire de la soumission.",
                    )),
            );
            return Ok(res);
        }

        let dir = tempfile::tempdir().map_err(|e| ValidationError::System(e.to_string()))?;
        let output = dir.path().join("submission");
        let tool = CompilerTool::new(ctx.tools.clone());
        match tool.compile(&ctx.sources, &ctx.headers, &output, &[]) {
            Ok(outcome) => {
                debug!(
                    exit_code = outcome.exit_code,
                    diagnostics = outcome.diagnostics.len(),
                    "compiled submission"
                );
                record_outcome(ctx, &outcome, &mut res);
            }
            Err(e @ ValidationError::Spawn { .. }) => {
                res.add_issue(
                    Issue::critical("COMPILER_UNAVAILABLE", e.to_string()).suggest(Suggestion::new(
                        format!(
                            "Install '{}' or point [compiler].name in conforma.toml at an installed C compiler.",
                            ctx.tools.compiler
                        ),
                        format!(
                            "Installez '{}' ou indiquez un compilateur C installé dans [compiler].name.",
                            ctx.tools.compiler
                        ),
                    )),
                );
            }
            Err(e) => {
                res.add_issue(
                    Issue::critical("COMPILATION_FAILED", e.to_string())
                        .suggest(generic_failure_suggestion()),
                );
            }
        }
        Ok(res)
    }
}

fn generic_failure_suggestion() -> Suggestion {
    Suggestion::new(
        "Run the compiler by hand on the submission to inspect its full output.",
        "Lancez le compilateur à la main sur la soumission pour examiner sa sortie complète.",
    )
}

fn diagnostic_issue(ctx: &Context, d: &Diagnostic, severity: Severity, category: &str) -> Issue {
    let message = match d.column {
        Some(c) => format!("{} (column {})", d.message, c),
        None => d.message.clone(),
    };
    Issue::new(severity, category, message)
        .at(ctx.display_path(Path::new(&d.file)), d.line)
        .suggest(d.suggestion.clone())
}

fn record_outcome(ctx: &Context, outcome: &CompileOutcome, res: &mut ValidationResult) {
    for d in &outcome.diagnostics {
        if d.is_error() {
            res.add_issue(diagnostic_issue(ctx, d, Severity::Critical, "COMPILATION_ERROR"));
        } else if d.is_warning() {
            res.add_issue(diagnostic_issue(ctx, d, Severity::Minor, "COMPILATION_WARNING"));
        }
    }
    if !outcome.success() && outcome.error_count() == 0 {
        res.add_issue(
            Issue::critical(
                "COMPILATION_FAILED",
                format!(
                    "{} and no parseable diagnostic",
                    ValidationError::Compilation {
                        exit_code: outcome.exit_code
                    }
                ),
            )
            .suggest(generic_failure_suggestion()),
        );
    }
    res.set_metric("exit_code", outcome.exit_code);
    res.set_metric("errors", outcome.error_count());
    res.set_metric("warnings", outcome.warning_count());
    res.set_metric(
        "notes",
        outcome.diagnostics.iter().filter(|d| d.category == "note").count(),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::context::{ModuleTag, Platform, ToolConfig};
    use crate::parse::diagnostics::parse_output;
    use std::path::PathBuf;

    fn ctx() -> Context {
        Context::new("/work/sub", ModuleTag::Basics, Platform::Linux)
    }

    #[test]
    fn test_no_sources_is_critical() {
        let r = CompilationValidator::new().validate(&ctx()).unwrap();
        assert!(!r.is_valid());
        assert_eq!(r.issues()[0].category(), "NO_SOURCE_FILES");
    }

    #[test]
    fn test_missing_compiler_becomes_issue_not_error() {
        let c = ctx()
            .with_files(vec![PathBuf::from("/work/sub/main.c")], vec![])
            .with_tools(ToolConfig {
                compiler: "conforma-no-such-cc".into(),
                ..ToolConfig::default()
            });
        let r = CompilationValidator::new().validate(&c).unwrap();
        assert!(!r.is_valid());
        assert_eq!(r.issues()[0].category(), "COMPILER_UNAVAILABLE");
    }

    #[test]
    fn test_outcome_maps_severities_and_metrics() {
        let output = "\
/work/sub/main.c:3:5: warning: unused variable 'n' [-Wunused-variable]
/work/sub/main.c:4:12: error: 'x' undeclared (first use in this function)
/work/sub/main.c:4:12: note: each undeclared identifier is reported only once
";
        let outcome = CompileOutcome {
            exit_code: 1,
            output: output.to_string(),
            diagnostics: parse_output(output),
        };
        let mut r = ValidationResult::new(NAME);
        record_outcome(&ctx(), &outcome, &mut r);
        assert!(!r.is_valid());
        assert_eq!(r.issues().len(), 2);
        assert_eq!(r.issues()[0].severity(), Severity::Minor);
        assert_eq!(r.issues()[1].category(), "COMPILATION_ERROR");
        assert_eq!(r.issues()[1].file(), Some("main.c"));
        assert_eq!(r.issues()[1].line(), Some(4));
        assert_eq!(r.metric("errors"), Some("1"));
        assert_eq!(r.metric("notes"), Some("1"));
    }

    #[test]
    fn test_nonzero_exit_without_diagnostics_is_generic_failure() {
        let outcome = CompileOutcome {
            exit_code: 1,
            output: "collect2: error: ld returned 1 exit status\n".into(),
            diagnostics: Vec::new(),
        };
        let mut r = ValidationResult::new(NAME);
        record_outcome(&ctx(), &outcome, &mut r);
        assert!(!r.is_valid());
        assert_eq!(r.issues().len(), 1);
        assert_eq!(r.issues()[0].category(), "COMPILATION_FAILED");
        assert!(r.issues()[0].message().contains("exit code"));
        assert_eq!(r.metric("errors"), Some("0"));
    }
}
