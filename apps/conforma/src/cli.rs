//! CLI argument parsing via `clap`.

use clap::{ArgAction, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "conforma",
    version,
    about = "Compliance checks for C course submissions",
    long_about = "conforma compiles a C submission, runs it under a memory analysis tool, and scans its sources for forbidden features, then prints one merged report.\n\nConfiguration precedence: CLI > conforma.toml > defaults.",
    after_help = "Examples:\n  conforma validate submissions/alice --module memory\n  conforma validate main.c --output json --no-memory\n  conforma tools\n  conforma rules --module pointers",
    arg_required_else_help = true
)]
/// Top-level CLI options and subcommands.
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand)]
/// Supported subcommands.
pub enum Commands {
    /// Show version
    #[command(
        about = "Show version",
        long_about = "Print the current conforma version."
    )]
    Version,
    /// Validate a submission
    #[command(
        about = "Validate a submission",
        long_about = "Discover the .c and .h files under PATH, run every validator, and print the merged report. Exits 1 when the submission is invalid and 2 on configuration errors.",
        after_help = "Examples:\n  conforma validate . --module basics\n  conforma validate sub --compiler clang --std c17 --flag=-Werror\n  conforma validate sub --sequential --timeout 10"
    )]
    Validate {
        #[arg(help = "Submission directory or single source file (default: current dir)")]
        path: Option<String>,
        #[arg(long, help = "Curriculum module: basics|pointers|memory|structures|files|capstone")]
        module: Option<String>,
        #[arg(long, help = "Target platform: linux|macos|generic|auto (default: auto)")]
        platform: Option<String>,
        #[arg(long, help = "Output mode: human|json (default: human)")]
        output: Option<String>,
        #[arg(long, action = ArgAction::SetTrue, help = "Run validators one after another")]
        sequential: bool,
        #[arg(long, help = "C compiler executable (default: cc)")]
        compiler: Option<String>,
        #[arg(long = "std", help = "Language revision passed as -std= (default: c11)")]
        std_rev: Option<String>,
        #[arg(long = "flag", allow_hyphen_values = true, help = "Compiler flag; repeat to pass several (replaces configured flags)")]
        flags: Vec<String>,
        #[arg(long, help = "Per-process timeout in seconds (default: 30)")]
        timeout: Option<u64>,
        #[arg(long, action = ArgAction::SetTrue, help = "Skip memory analysis")]
        no_memory: bool,
    },
    /// List memory analysis tools
    #[command(
        about = "List memory analysis tools",
        long_about = "Show every known memory analysis tool with its availability and priority on the platform, marking the one validate would pick."
    )]
    Tools {
        #[arg(long, help = "Platform to probe for (default: detected)")]
        platform: Option<String>,
        #[arg(long, help = "Output mode: human|json (default: human)")]
        output: Option<String>,
    },
    /// Print a module's rule table
    #[command(
        about = "Print module rules",
        long_about = "Print the required concepts, forbidden features, and checks applied to a module."
    )]
    Rules {
        #[arg(long, help = "Curriculum module (default: basics)")]
        module: Option<String>,
        #[arg(long, help = "Output mode: human|json (default: human)")]
        output: Option<String>,
    },
}
