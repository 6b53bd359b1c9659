//! Builds an instrumented binary, runs it under the best memory tool, and
//! reports leaks and memory errors.

use super::{Priority, Validator};
use crate::error::ValidationError;
use crate::models::context::Context;
use crate::models::diagnostic::{LeakRecord, MemoryReport};
use crate::models::{Issue, Suggestion, ValidationResult};
use crate::platform::PlatformProbe;
use crate::tools::{CompilerTool, MemoryTool, ToolFactory};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

const NAME: &str = "memory";
const MEMCHECK_MANUAL: &str = "https://valgrind.org/docs/manual/mc-manual.html";
const ASAN_MANUAL: &str = "https://clang.llvm.org/docs/AddressSanitizer.html";
/// Metadata key holding whitespace-separated program arguments.
pub const RUN_ARGS_KEY: &str = "run.args";

pub struct MemoryValidator {
    probe: Arc<dyn PlatformProbe>,
    preferred: Option<String>,
    injected: Option<Box<dyn MemoryTool>>,
}

impl MemoryValidator {
    /// `preferred` names a tool to use instead of the best-ranked one.
    pub fn new(probe: Arc<dyn PlatformProbe>, preferred: Option<String>) -> Self {
        MemoryValidator {
            probe,
            preferred,
            injected: None,
        }
    }

    /// Use `tool` unconditionally instead of probing for one.
    pub fn with_tool(probe: Arc<dyn PlatformProbe>, tool: Box<dyn MemoryTool>) -> Self {
        MemoryValidator {
            probe,
            preferred: None,
            injected: Some(tool),
        }
    }

    fn factory(&self, ctx: &Context) -> ToolFactory<'_> {
        ToolFactory::new(self.probe.as_ref(), ctx.platform, ctx.tools.clone())
    }

    fn select(&self, ctx: &Context) -> Result<Box<dyn MemoryTool>, ValidationError> {
        let factory = self.factory(ctx);
        match &self.preferred {
            Some(name) => factory.memory_tool_named(name),
            None => factory.best_memory_tool(),
        }
    }
}

impl Validator for MemoryValidator {
    fn name(&self) -> &str {
        NAME
    }

    fn priority(&self) -> Priority {
        Priority::High
    }

    fn validate(&self, ctx: &Context) -> Result<ValidationResult, ValidationError> {
        let mut res = ValidationResult::new(NAME);
        let selected;
        let tool: &dyn MemoryTool = match &self.injected {
            Some(t) => t.as_ref(),
            None => match self.select(ctx) {
                Ok(t) => {
                    selected = t;
                    selected.as_ref()
                }
                Err(_) => {
                    warn!(platform = %ctx.platform, "no memory analysis tool available");
                    res.add_issue(unavailable_issue(ctx, self.preferred.as_deref()));
                    res.set_metric("tool", "none");
                    return Ok(res);
                }
            },
        };
        res.set_metric("tool", tool.name());
        info!(tool = tool.name(), "running memory analysis");

        if ctx.sources.is_empty() {
            res.add_issue(skipped_issue("there are no sources to build"));
            return Ok(res);
        }
        let dir = tempfile::tempdir().map_err(|e| ValidationError::System(e.to_string()))?;
        let binary = dir.path().join("submission");
        match build(&self.factory(ctx).compiler(), ctx, tool, &binary) {
            Ok(()) => {}
            Err(reason) => {
                debug!(%reason, "instrumented build failed");
                res.add_issue(skipped_issue(&reason));
                return Ok(res);
            }
        }

        let args: Vec<String> = ctx
            .metadata
            .get(RUN_ARGS_KEY)
            .map(|a| a.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();
        match tool.analyze(&binary, &args, ctx.tools.timeout) {
            Ok(report) => record_report(ctx, tool.name(), &report, &mut res),
            Err(e) => {
                res.add_issue(
                    Issue::critical("MEMORY_TOOL_ERROR", format!("{}: {}", tool.name(), e)).suggest(
                        Suggestion::new(
                            "Check that the program terminates and does not wait for input.",
                            "Vérifiez que le programme se termine et n'attend pas de saisie.",
                        ),
                    ),
                );
            }
        }
        Ok(res)
    }
}

/// Compile with the tool's required flags. `Err` carries a one-line reason.
fn build(
    cc: &CompilerTool,
    ctx: &Context,
    tool: &dyn MemoryTool,
    binary: &Path,
) -> Result<(), String> {
    match cc.compile(&ctx.sources, &ctx.headers, binary, &tool.required_flags()) {
        Ok(outcome) if outcome.success() => Ok(()),
        Ok(outcome) => Err(format!(
            "the instrumented build exited with code {}",
            outcome.exit_code
        )),
        Err(e) => Err(e.to_string()),
    }
}

fn unavailable_issue(ctx: &Context, preferred: Option<&str>) -> Issue {
    let message = match preferred {
        Some(name) => format!("memory tool '{}' is not available on {}", name, ctx.platform),
        None => format!("no memory analysis tool is available on {}", ctx.platform),
    };
    Issue::minor("MEMORY_TOOL_UNAVAILABLE", message).suggest(Suggestion::new(
        "Install valgrind, or a compiler with AddressSanitizer support, to enable memory analysis.",
        "Installez valgrind, ou un compilateur prenant en charge AddressSanitizer, pour activer l'analyse mémoire.",
    ))
}

fn skipped_issue(reason: &str) -> Issue {
    Issue::minor(
        "MEMORY_ANALYSIS_SKIPPED",
        format!("memory analysis skipped: {}", reason),
    )
}

/// Documentation for the tool that produced a finding.
fn manual_for(tool: &str) -> &'static str {
    if tool == "valgrind" {
        MEMCHECK_MANUAL
    } else {
        ASAN_MANUAL
    }
}

fn leak_issue(ctx: &Context, tool: &str, leak: &LeakRecord) -> Issue {
    let is = Issue::major(
        "MEMORY_LEAK",
        format!("{} bytes leaked: {}", leak.bytes, leak.description),
    )
    .suggest(Suggestion::new(
        "Free every allocation exactly once before the last pointer to it goes out of scope.",
        "Libérez chaque allocation une seule fois avant de perdre le dernier pointeur vers elle.",
    ))
    .reference(manual_for(tool));
    if leak.file.is_empty() || leak.file == "unknown" {
        is
    } else {
        is.at(ctx.display_path(Path::new(&leak.file)), leak.line)
    }
}

fn record_report(ctx: &Context, tool: &str, report: &MemoryReport, res: &mut ValidationResult) {
    for leak in &report.leaks {
        res.add_issue(leak_issue(ctx, tool, leak));
    }
    for err in &report.errors {
        res.add_issue(
            Issue::critical("MEMORY_ERROR", err.clone())
                .suggest(Suggestion::new(
                    "Check array bounds and pointer lifetimes around the reported access.",
                    "Vérifiez les bornes des tableaux et la durée de vie des pointeurs autour de l'accès signalé.",
                ))
                .reference(manual_for(tool)),
        );
    }
    res.set_metric("leaks", report.leaks.len());
    res.set_metric("leaked_bytes", report.total_leaked_bytes());
    res.set_metric("errors", report.errors.len());
    res.set_metric("exit_code", report.exit_code);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::context::{ModuleTag, Platform};
    use crate::models::Severity;
    use crate::tools::testing::{FakeTool, StubProbe};

    fn ctx() -> Context {
        Context::new("/work/sub", ModuleTag::Memory, Platform::Linux)
    }

    #[test]
    fn test_no_tool_is_minor_and_valid() {
        let probe = Arc::new(StubProbe::new(Platform::Linux, &[]));
        let r = MemoryValidator::new(probe, None).validate(&ctx()).unwrap();
        assert!(r.is_valid());
        assert_eq!(r.issues()[0].category(), "MEMORY_TOOL_UNAVAILABLE");
        assert_eq!(r.issues()[0].severity(), Severity::Minor);
        assert_eq!(r.metric("tool"), Some("none"));
    }

    #[test]
    fn test_injected_tool_without_sources_is_skipped() {
        let probe = Arc::new(StubProbe::new(Platform::Linux, &[]));
        let tool = Box::new(FakeTool {
            name: "fake",
            available: true,
            priority: 1,
            report: MemoryReport::default(),
        });
        let r = MemoryValidator::with_tool(probe, tool).validate(&ctx()).unwrap();
        assert!(r.is_valid());
        assert_eq!(r.issues()[0].category(), "MEMORY_ANALYSIS_SKIPPED");
        assert_eq!(r.metric("tool"), Some("fake"));
    }

    #[test]
    fn test_report_maps_leaks_and_errors() {
        let report = MemoryReport {
            has_leaks: true,
            has_errors: true,
            leaks: vec![
                LeakRecord {
                    file: "/work/sub/list.c".into(),
                    line: 12,
                    bytes: 16,
                    description: "definitely lost in 1 block".into(),
                },
                LeakRecord {
                    file: "unknown".into(),
                    line: 0,
                    bytes: 8,
                    description: "definitely lost".into(),
                },
            ],
            errors: vec!["Invalid read of size 4".into()],
            raw_output: String::new(),
            exit_code: 42,
        };
        let mut r = ValidationResult::new(NAME);
        record_report(&ctx(), "valgrind", &report, &mut r);
        assert!(!r.is_valid());
        assert_eq!(r.summary().major, 2);
        assert_eq!(r.summary().critical, 1);
        assert_eq!(r.issues()[0].file(), Some("list.c"));
        assert_eq!(r.issues()[1].file(), None);
        assert_eq!(r.metric("leaked_bytes"), Some("24"));
        assert_eq!(r.issues()[2].references(), &[MEMCHECK_MANUAL.to_string()]);
    }

    #[test]
    fn test_clean_report_stays_valid() {
        let mut r = ValidationResult::new(NAME);
        record_report(&ctx(), "sanitizer", &MemoryReport::default(), &mut r);
        assert!(r.is_valid());
        assert_eq!(r.metric("leaks"), Some("0"));
    }
}
