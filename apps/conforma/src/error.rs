//! Error taxonomy shared by validators, tool adapters, and the binary.
//!
//! Validators never let these escape to the caller of the engine: they are
//! converted into CRITICAL issues inside the validator's own result. Only
//! configuration errors surface from the binary as a non-zero exit.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("cannot read {}: {source}", path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("compilation failed with exit code {exit_code}")]
    Compilation { exit_code: i32 },
    #[error("memory analysis tool '{tool}' failed: {message}")]
    MemoryTool { tool: String, message: String },
    #[error("no memory analysis tool is available on this platform")]
    NoToolAvailable,
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("'{program}' timed out after {seconds}s")]
    Timeout { program: String, seconds: u64 },
    #[error("invalid validation context: {0}")]
    InvalidContext(String),
    #[error("system error: {0}")]
    System(String),
}

/// Coarse failure domain, used for issue categories and localized fallbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    FileSystem,
    Compilation,
    MemoryTool,
    Configuration,
    ExternalTool,
    ValidationLogic,
    System,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::FileSystem => "FILE_SYSTEM",
            ErrorCategory::Compilation => "COMPILATION",
            ErrorCategory::MemoryTool => "MEMORY_TOOL",
            ErrorCategory::Configuration => "CONFIGURATION",
            ErrorCategory::ExternalTool => "EXTERNAL_TOOL",
            ErrorCategory::ValidationLogic => "VALIDATION_LOGIC",
            ErrorCategory::System => "SYSTEM",
        }
    }
}

impl ValidationError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ValidationError::FileRead { .. } => ErrorCategory::FileSystem,
            ValidationError::Compilation { .. } => ErrorCategory::Compilation,
            ValidationError::MemoryTool { .. } | ValidationError::NoToolAvailable => {
                ErrorCategory::MemoryTool
            }
            ValidationError::Config(_) => ErrorCategory::Configuration,
            ValidationError::Spawn { .. } | ValidationError::Timeout { .. } => {
                ErrorCategory::ExternalTool
            }
            ValidationError::InvalidContext(_) => ErrorCategory::ValidationLogic,
            ValidationError::System(_) => ErrorCategory::System,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories_follow_taxonomy() {
        let spawn = ValidationError::Spawn {
            program: "valgrind".into(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        assert_eq!(spawn.category(), ErrorCategory::ExternalTool);
        assert_eq!(
            ValidationError::NoToolAvailable.category(),
            ErrorCategory::MemoryTool
        );
        assert_eq!(
            ValidationError::Config("bad module".into()).category().as_str(),
            "CONFIGURATION"
        );
        assert!(spawn.to_string().contains("valgrind"));
    }
}
