//! conforma core library.
//!
//! This crate exposes programmatic APIs for validating C course submissions:
//! validators run against a read-only context, the engine orders and
//! isolates them, and the merged result is printed by the binary.
//!
//! High-level modules:
//! - `cli`: CLI argument parsing (binary uses this).
//! - `config`: Discovery and effective configuration resolution.
//! - `engine`: Priority ordering, sequential/parallel execution, aggregation.
//! - `validators`: The `Validator` trait and the shipped validators.
//! - `tools`: Compiler and memory-analysis tool adapters plus best-tool selection.
//! - `parse`: Heuristic parsers for compiler and memory-tool output.
//! - `models`: Context, issues, results, and parsed tool records.
//! - `rules`: Per-module forbidden features and required concepts.
//! - `scan`: Comment/literal blanking and pattern matching over source lines.
//! - `discovery`: Source and header discovery.
//! - `platform`: Host platform and command probes.
//! - `exec`: External process execution with timeouts.
//! - `output`: Human/JSON printers.
//! - `run`: End-to-end validation from resolved settings.
pub mod cli;
pub mod config;
pub mod discovery;
pub mod engine;
pub mod error;
pub mod exec;
pub mod i18n;
pub mod models;
pub mod output;
pub mod parse;
pub mod platform;
pub mod rules;
pub mod run;
pub mod scan;
pub mod tools;
pub mod validators;
