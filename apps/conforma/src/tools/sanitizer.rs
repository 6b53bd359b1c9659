//! AddressSanitizer (with LeakSanitizer) adapter.
//!
//! The binary is instrumented at compile time, so availability needs a live
//! probe: a trivial program is compiled with the sanitizer flags.

use super::{CompilerTool, MemoryTool, ToolAdapter};
use crate::error::ValidationError;
use crate::exec;
use crate::models::context::{Platform, ToolConfig};
use crate::models::diagnostic::MemoryReport;
use crate::parse::memory::{MemoryOutputParser, SanitizerParser};
use crate::platform::PlatformProbe;
use std::path::Path;
use std::time::Duration;

const NAME: &str = "address-sanitizer";
const ASAN_OPTIONS: &str = "detect_leaks=1:abort_on_error=0:exitcode=23";
const UBSAN_OPTIONS: &str = "print_stacktrace=1";

#[derive(Debug, Clone)]
pub struct SanitizerTool {
    compiler: String,
    timeout: Duration,
}

impl SanitizerTool {
    pub fn new(compiler: &str, timeout: Duration) -> Self {
        SanitizerTool {
            compiler: compiler.to_string(),
            timeout,
        }
    }
}

impl ToolAdapter for SanitizerTool {
    fn name(&self) -> &str {
        NAME
    }

    fn is_available(&self, probe: &dyn PlatformProbe, platform: Platform) -> bool {
        if platform == Platform::Unknown || !probe.is_command_available(&self.compiler) {
            return false;
        }
        let cc = CompilerTool::new(ToolConfig {
            compiler: self.compiler.clone(),
            flags: Vec::new(),
            std: String::new(),
            timeout: self.timeout,
        });
        cc.probe_flags(&self.required_flags())
    }

    fn required_flags(&self) -> Vec<String> {
        vec![
            "-fsanitize=address,undefined".to_string(),
            "-fno-omit-frame-pointer".to_string(),
            "-g".to_string(),
        ]
    }

    fn priority(&self, platform: Platform) -> i32 {
        match platform {
            Platform::MacOs => 100,
            Platform::Linux => 80,
            Platform::Generic => 60,
            Platform::Unknown => 0,
        }
    }
}

impl MemoryTool for SanitizerTool {
    fn analyze(
        &self,
        binary: &Path,
        args: &[String],
        timeout: Duration,
    ) -> Result<MemoryReport, ValidationError> {
        let program = binary.to_string_lossy().to_string();
        let out = exec::run_with_env(
            &program,
            args,
            &[("ASAN_OPTIONS", ASAN_OPTIONS), ("UBSAN_OPTIONS", UBSAN_OPTIONS)],
            timeout,
        )?;
        Ok(SanitizerParser.parse(&out.output, out.exit_code))
    }
}
