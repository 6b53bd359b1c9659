//! Output rendering for the validation report, tool listing, and rule table.
//!
//! Supports `human` (default) and `json` outputs. The JSON report is the
//! serialized aggregated result plus a top-level summary.

use crate::models::{Issue, Severity, ValidationResult};
use crate::rules::ModuleRules;
use owo_colors::OwoColorize;
use serde::Serialize;
use serde_json::json;
use serde_json::Value as JsonVal;

fn use_colors(output: &str) -> bool {
    output != "json" && std::env::var_os("NO_COLOR").is_none()
}

fn paint(color: bool, text: &str, f: impl Fn(&str) -> String) -> String {
    if color {
        f(text)
    } else {
        text.to_string()
    }
}

pub fn error_prefix() -> String {
    paint(use_colors("human"), "error:", |s| s.red().bold().to_string())
}

pub fn note_prefix() -> String {
    paint(use_colors("human"), "note:", |s| s.cyan().bold().to_string())
}

fn location(is: &Issue) -> String {
    match (is.file(), is.line()) {
        (Some(f), Some(l)) => format!("{}:{}", f, l),
        (Some(f), None) => f.to_string(),
        _ => "-".to_string(),
    }
}

/// One human line per issue, without trailing suggestion.
fn issue_line(is: &Issue, color: bool) -> String {
    let (icon, tag) = match is.severity() {
        Severity::Critical => ("✖", "⟦critical⟧"),
        Severity::Major => ("▲", "⟦major⟧"),
        Severity::Minor => ("◆", "⟦minor⟧"),
    };
    let sev = is.severity();
    let pick = move |s: &str| match sev {
        Severity::Critical => s.red().bold().to_string(),
        Severity::Major => s.yellow().bold().to_string(),
        Severity::Minor => s.blue().bold().to_string(),
    };
    format!(
        "{} {} {} ❲{}❳ — {}",
        paint(color, icon, pick),
        paint(color, tag, pick),
        paint(color, &location(is), |s| s.bold().to_string()),
        is.category(),
        is.message()
    )
}

/// Print the aggregated report in the requested format.
pub fn print_report(res: &ValidationResult, output: &str) {
    match output {
        "json" => println!("{:#}", compose_report_json(res)),
        _ => {
            let color = use_colors(output);
            for is in res.issues() {
                println!("{}", issue_line(is, color));
                if let Some(s) = is.suggestion() {
                    println!("    ↳ {}", paint(color, &s.text, |t| t.bright_black().to_string()));
                }
                for r in is.references() {
                    println!("    ⋯ see {}", paint(color, r, |t| t.underline().to_string()));
                }
            }
            let s = res.summary();
            let verdict = if res.is_valid() {
                paint(color, "VALID", |t| t.green().bold().to_string())
            } else {
                paint(color, "INVALID", |t| t.red().bold().to_string())
            };
            let summary = format!(
                "— Summary — {} critical={} major={} minor={} validators={}",
                verdict,
                s.critical,
                s.major,
                s.minor,
                res.metric("validator_count").unwrap_or("0")
            );
            println!("{}", summary);
        }
    }
}

/// Compose report JSON object (pure) for testing/snapshot purposes.
pub fn compose_report_json(res: &ValidationResult) -> JsonVal {
    json!({
        "valid": res.is_valid(),
        "summary": res.summary(),
        "issues": res.issues(),
        "metrics": res.metrics(),
    })
}

#[derive(Serialize, Debug, Clone)]
/// One row of `conforma tools`.
pub struct ToolRow {
    pub name: String,
    pub available: bool,
    pub priority: i32,
    pub best: bool,
    pub required_flags: Vec<String>,
}

pub fn print_tools(platform: &str, rows: &[ToolRow], output: &str) {
    match output {
        "json" => println!("{:#}", json!({"platform": platform, "tools": rows})),
        _ => {
            let color = use_colors(output);
            println!("platform: {}", paint(color, platform, |s| s.bold().to_string()));
            for r in rows {
                let mark = if r.best {
                    paint(color, "★", |s| s.green().bold().to_string())
                } else if r.available {
                    "✔".to_string()
                } else {
                    paint(color, "✖", |s| s.bright_black().to_string())
                };
                println!(
                    "{} {:<18} priority={:<4} flags=[{}]",
                    mark,
                    r.name,
                    r.priority,
                    r.required_flags.join(" ")
                );
            }
            if !rows.iter().any(|r| r.best) {
                println!("{} no memory tool available", note_prefix());
            }
        }
    }
}

pub fn print_rules(rules: &ModuleRules, output: &str) {
    match output {
        "json" => println!("{:#}", json!(rules)),
        _ => {
            let color = use_colors(output);
            println!("module: {}", paint(color, rules.module.as_str(), |s| s.bold().to_string()));
            println!("required concepts: {}", rules.required_concepts.join(", "));
            println!("forbidden features: {}", rules.forbidden_features.join(", "));
            println!("checks:");
            for c in &rules.checks {
                println!("  - {}", c);
            }
        }
    }
}
