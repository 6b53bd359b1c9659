//! Heuristic parsers that recover structured findings from tool text.

pub mod diagnostics;
pub mod memory;
