//! conforma CLI binary entry point.
//! Resolves configuration, runs the requested command, and prints results.

use clap::Parser;
use conforma::cli::{Cli, Commands};
use conforma::config::{self, Overrides};
use conforma::error::ValidationError;
use conforma::models::context::{ModuleTag, Platform, ToolConfig};
use conforma::output::{self, ToolRow};
use conforma::platform::{PlatformProbe, SystemProbe};
use conforma::rules;
use conforma::tools::ToolFactory;
use std::process::exit;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    // CONFORMA_LOG wins over -v when set
    let filter = EnvFilter::try_from_env("CONFORMA_LOG")
        .unwrap_or_else(|_| EnvFilter::new(format!("conforma={}", default)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn fail(e: &ValidationError) -> ! {
    tracing::debug!(category = e.category().as_str(), "aborting");
    eprintln!("{} {}", output::error_prefix(), e);
    exit(2);
}

fn output_mode(output: Option<String>) -> String {
    match output.as_deref() {
        None | Some("human") => "human".to_string(),
        Some("json") => "json".to_string(),
        Some(other) => fail(&ValidationError::Config(format!(
            "unknown output '{}' (expected human|json)",
            other
        ))),
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
        }
        Commands::Validate {
            path,
            module,
            platform,
            output,
            sequential,
            compiler,
            std_rev,
            flags,
            timeout,
            no_memory,
        } => {
            let eff = config::resolve_effective(&Overrides {
                path,
                module,
                platform,
                output,
                compiler,
                std: std_rev,
                flags,
                timeout_secs: timeout,
                sequential,
                no_memory,
            })
            .unwrap_or_else(|e| fail(&e));
            // Friendly note if no conforma config was found
            if eff.config_file.is_none() && eff.output != "json" {
                eprintln!(
                    "{} No conforma.toml found; using defaults.",
                    output::note_prefix()
                );
            }
            let probe: Arc<dyn PlatformProbe> = Arc::new(SystemProbe);
            let result =
                conforma::run::validate_submission(&eff, probe).unwrap_or_else(|e| fail(&e));
            output::print_report(&result, &eff.output);
            if !result.is_valid() {
                exit(1);
            }
        }
        Commands::Tools { platform, output } => {
            let out = output_mode(output);
            let probe = SystemProbe;
            let platform: Platform = match platform.as_deref() {
                None | Some("auto") => probe.detect_platform(),
                Some(p) => p.parse().unwrap_or_else(|e| fail(&e)),
            };
            let factory = ToolFactory::new(&probe, platform, ToolConfig::default());
            let best = factory.best_memory_tool().ok().map(|t| t.name().to_string());
            let rows: Vec<ToolRow> = factory
                .all_memory_tools()
                .iter()
                .map(|t| ToolRow {
                    name: t.name().to_string(),
                    available: t.is_available(&probe, platform),
                    priority: t.priority(platform),
                    best: best.as_deref() == Some(t.name()),
                    required_flags: t.required_flags(),
                })
                .collect();
            output::print_tools(platform.as_str(), &rows, &out);
        }
        Commands::Rules { module, output } => {
            let out = output_mode(output);
            let module: ModuleTag = match module.as_deref() {
                None => ModuleTag::Basics,
                Some(m) => m.parse().unwrap_or_else(|e| fail(&e)),
            };
            output::print_rules(&rules::module_rules(module), &out);
        }
    }
}
