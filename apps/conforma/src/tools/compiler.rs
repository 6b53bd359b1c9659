//! C compiler adapter.

use super::ToolAdapter;
use crate::error::ValidationError;
use crate::exec;
use crate::models::context::{Platform, ToolConfig};
use crate::models::diagnostic::Diagnostic;
use crate::parse::diagnostics;
use crate::platform::PlatformProbe;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct CompileOutcome {
    pub exit_code: i32,
    pub output: String,
    pub diagnostics: Vec<Diagnostic>,
}

impl CompileOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_error()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_warning()).count()
    }
}

#[derive(Debug, Clone)]
pub struct CompilerTool {
    config: ToolConfig,
}

impl CompilerTool {
    pub fn new(config: ToolConfig) -> Self {
        CompilerTool { config }
    }

    /// Command line: revision, configured flags, `extra`, one `-I` per header
    /// directory, sources, then `-o output`.
    pub fn build_args(
        &self,
        sources: &[PathBuf],
        headers: &[PathBuf],
        output: &Path,
        extra: &[String],
    ) -> Vec<String> {
        let mut args = self.required_flags();
        args.extend(self.config.flags.iter().cloned());
        args.extend(extra.iter().cloned());
        let mut include_dirs: Vec<&Path> = Vec::new();
        for h in headers {
            if let Some(dir) = h.parent() {
                if !include_dirs.contains(&dir) {
                    include_dirs.push(dir);
                }
            }
        }
        for dir in include_dirs {
            let d = dir.to_string_lossy();
            args.push(if d.is_empty() { "-I.".to_string() } else { format!("-I{}", d) });
        }
        args.extend(sources.iter().map(|s| s.to_string_lossy().to_string()));
        args.push("-o".to_string());
        args.push(output.to_string_lossy().to_string());
        args
    }

    pub fn compile(
        &self,
        sources: &[PathBuf],
        headers: &[PathBuf],
        output: &Path,
        extra: &[String],
    ) -> Result<CompileOutcome, ValidationError> {
        let args = self.build_args(sources, headers, output, extra);
        let out = exec::run(&self.config.compiler, &args, self.config.timeout)?;
        Ok(CompileOutcome {
            exit_code: out.exit_code,
            diagnostics: diagnostics::parse_output(&out.output),
            output: out.output,
        })
    }

    /// Compile a trivial program with `flags` and discard it. Used to probe
    /// whether the compiler supports an instrumentation mode.
    pub fn probe_flags(&self, flags: &[String]) -> bool {
        let dir = match tempfile::tempdir() {
            Ok(d) => d,
            Err(_) => return false,
        };
        let src = dir.path().join("probe.c");
        if std::fs::write(&src, "int main(void) { return 0; }\n").is_err() {
            return false;
        }
        let mut args: Vec<String> = flags.to_vec();
        args.push(src.to_string_lossy().to_string());
        args.push("-o".to_string());
        args.push(dir.path().join("probe").to_string_lossy().to_string());
        exec::run(&self.config.compiler, &args, self.config.timeout)
            .map(|o| o.success())
            .unwrap_or(false)
    }
}

impl ToolAdapter for CompilerTool {
    fn name(&self) -> &str {
        &self.config.compiler
    }

    fn is_available(&self, probe: &dyn PlatformProbe, _platform: Platform) -> bool {
        probe.is_command_available(&self.config.compiler)
    }

    fn required_flags(&self) -> Vec<String> {
        if self.config.std.is_empty() {
            Vec::new()
        } else {
            vec![format!("-std={}", self.config.std)]
        }
    }

    fn priority(&self, _platform: Platform) -> i32 {
        0
    }
}
