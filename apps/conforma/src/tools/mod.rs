//! External tool adapters and best-tool selection.
//!
//! Every adapter exposes the same capability set: a name, an availability
//! check (platform match plus a live probe), the compiler flags a binary must
//! be built with, and a static per-platform selection priority.

pub mod compiler;
pub mod sanitizer;
pub mod valgrind;

use crate::error::ValidationError;
use crate::models::context::{Platform, ToolConfig};
use crate::models::diagnostic::MemoryReport;
use crate::platform::PlatformProbe;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

pub use compiler::{CompileOutcome, CompilerTool};
pub use sanitizer::SanitizerTool;
pub use valgrind::ValgrindTool;

pub trait ToolAdapter: Send + Sync {
    fn name(&self) -> &str;
    fn is_available(&self, probe: &dyn PlatformProbe, platform: Platform) -> bool;
    /// Flags the analyzed binary must be compiled with.
    fn required_flags(&self) -> Vec<String>;
    /// Static selection priority; higher wins.
    fn priority(&self, platform: Platform) -> i32;
}

/// Adapter for a tool that runs a built binary and reports memory findings.
pub trait MemoryTool: ToolAdapter {
    fn analyze(
        &self,
        binary: &Path,
        args: &[String],
        timeout: Duration,
    ) -> Result<MemoryReport, ValidationError>;
}

/// Builds and ranks the known tool adapters for one platform.
pub struct ToolFactory<'a> {
    probe: &'a dyn PlatformProbe,
    platform: Platform,
    tools: ToolConfig,
}

impl<'a> ToolFactory<'a> {
    pub fn new(probe: &'a dyn PlatformProbe, platform: Platform, tools: ToolConfig) -> Self {
        ToolFactory {
            probe,
            platform,
            tools,
        }
    }

    pub fn compiler(&self) -> CompilerTool {
        CompilerTool::new(self.tools.clone())
    }

    /// Every known memory tool, available or not. The caller owns them.
    pub fn all_memory_tools(&self) -> Vec<Box<dyn MemoryTool>> {
        vec![
            Box::new(ValgrindTool::new()),
            Box::new(SanitizerTool::new(&self.tools.compiler, self.tools.timeout)),
        ]
    }

    /// Available memory tools, best first.
    pub fn available_memory_tools(&self) -> Vec<Box<dyn MemoryTool>> {
        rank(self.all_memory_tools(), self.probe, self.platform)
    }

    /// Best available memory tool, or `NoToolAvailable`.
    pub fn best_memory_tool(&self) -> Result<Box<dyn MemoryTool>, ValidationError> {
        self.available_memory_tools()
            .into_iter()
            .next()
            .ok_or(ValidationError::NoToolAvailable)
    }

    /// A specific memory tool by name, if it is available.
    pub fn memory_tool_named(&self, name: &str) -> Result<Box<dyn MemoryTool>, ValidationError> {
        self.available_memory_tools()
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(name))
            .ok_or(ValidationError::NoToolAvailable)
    }
}

/// Drop unavailable tools and stable-sort the rest by descending priority.
pub fn rank<T: ToolAdapter + ?Sized>(
    tools: Vec<Box<T>>,
    probe: &dyn PlatformProbe,
    platform: Platform,
) -> Vec<Box<T>> {
    let mut available: Vec<Box<T>> = tools
        .into_iter()
        .filter(|t| {
            let ok = t.is_available(probe, platform);
            debug!(tool = t.name(), %platform, available = ok, "probed tool");
            ok
        })
        .collect();
    available.sort_by_key(|t| std::cmp::Reverse(t.priority(platform)));
    available
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::HashSet;

    /// Probe with a fixed platform and a fixed set of installed commands.
    pub struct StubProbe {
        pub platform: Platform,
        pub commands: HashSet<String>,
    }

    impl StubProbe {
        pub fn new(platform: Platform, commands: &[&str]) -> Self {
            StubProbe {
                platform,
                commands: commands.iter().map(|c| c.to_string()).collect(),
            }
        }
    }

    impl PlatformProbe for StubProbe {
        fn detect_platform(&self) -> Platform {
            self.platform
        }
        fn is_command_available(&self, name: &str) -> bool {
            self.commands.contains(name)
        }
        fn cpu_core_count(&self) -> usize {
            4
        }
    }

    /// Memory tool returning a canned report.
    pub struct FakeTool {
        pub name: &'static str,
        pub available: bool,
        pub priority: i32,
        pub report: MemoryReport,
    }

    impl ToolAdapter for FakeTool {
        fn name(&self) -> &str {
            self.name
        }
        fn is_available(&self, _: &dyn PlatformProbe, _: Platform) -> bool {
            self.available
        }
        fn required_flags(&self) -> Vec<String> {
            vec!["-g".to_string()]
        }
        fn priority(&self, _: Platform) -> i32 {
            self.priority
        }
    }

    impl MemoryTool for FakeTool {
        fn analyze(&self, _: &Path, _: &[String], _: Duration) -> Result<MemoryReport, ValidationError> {
            Ok(self.report.clone())
        }
    }
}
