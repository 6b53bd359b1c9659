//! Structured records recovered from external tool output.

use super::Suggestion;
use serde::Serialize;

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
/// One compiler diagnostic line.
pub struct Diagnostic {
    pub file: String,
    pub line: u32,
    pub column: Option<u32>,
    /// `error`, `warning`, `note`, or `fatal error` as printed by the compiler.
    pub category: String,
    pub message: String,
    pub suggestion: Suggestion,
}

impl Diagnostic {
    pub fn is_error(&self) -> bool {
        self.category == "error" || self.category == "fatal error"
    }

    pub fn is_warning(&self) -> bool {
        self.category == "warning"
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct LeakRecord {
    /// `unknown` when no frame could be attributed.
    pub file: String,
    /// 0 when unknown.
    pub line: u32,
    pub bytes: u64,
    pub description: String,
}

#[derive(Serialize, Debug, Clone, Default)]
/// Classified output of one memory analysis run.
pub struct MemoryReport {
    pub has_leaks: bool,
    pub has_errors: bool,
    pub leaks: Vec<LeakRecord>,
    pub errors: Vec<String>,
    pub raw_output: String,
    pub exit_code: i32,
}

impl MemoryReport {
    pub fn is_passed(&self) -> bool {
        !self.has_leaks && !self.has_errors
    }

    pub fn total_leaked_bytes(&self) -> u64 {
        self.leaks.iter().map(|l| l.bytes).sum()
    }
}
