//! Valgrind memcheck adapter.

use super::{MemoryTool, ToolAdapter};
use crate::error::ValidationError;
use crate::exec;
use crate::models::context::Platform;
use crate::models::diagnostic::MemoryReport;
use crate::parse::memory::{MemoryOutputParser, ValgrindParser};
use crate::platform::PlatformProbe;
use std::path::Path;
use std::time::Duration;

const PROGRAM: &str = "valgrind";
/// Exit code valgrind uses when it found errors; distinguishes them from the
/// program's own exit status.
pub const ERROR_EXIT_CODE: i32 = 42;

#[derive(Debug, Default, Clone)]
pub struct ValgrindTool;

impl ValgrindTool {
    pub fn new() -> Self {
        ValgrindTool
    }

    pub fn build_args(&self, binary: &Path, args: &[String]) -> Vec<String> {
        let mut v = vec![
            "--leak-check=full".to_string(),
            "--show-leak-kinds=definite,possible".to_string(),
            format!("--error-exitcode={}", ERROR_EXIT_CODE),
            binary.to_string_lossy().to_string(),
        ];
        v.extend(args.iter().cloned());
        v
    }
}

impl ToolAdapter for ValgrindTool {
    fn name(&self) -> &str {
        PROGRAM
    }

    fn is_available(&self, probe: &dyn PlatformProbe, platform: Platform) -> bool {
        matches!(platform, Platform::Linux | Platform::Generic) && probe.is_command_available(PROGRAM)
    }

    fn required_flags(&self) -> Vec<String> {
        vec!["-g".to_string(), "-O0".to_string()]
    }

    fn priority(&self, platform: Platform) -> i32 {
        match platform {
            Platform::Linux => 100,
            Platform::Generic => 40,
            Platform::MacOs | Platform::Unknown => 0,
        }
    }
}

impl MemoryTool for ValgrindTool {
    fn analyze(
        &self,
        binary: &Path,
        args: &[String],
        timeout: Duration,
    ) -> Result<MemoryReport, ValidationError> {
        let out = exec::run(PROGRAM, &self.build_args(binary, args), timeout)?;
        let report = ValgrindParser.parse(&out.output, out.exit_code);
        if report.is_passed() && out.exit_code != 0 && out.output.trim().is_empty() {
            return Err(ValidationError::MemoryTool {
                tool: PROGRAM.to_string(),
                message: format!("exited with code {} and no output", out.exit_code),
            });
        }
        Ok(report)
    }
}
