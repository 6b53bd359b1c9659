//! Validator abstraction and the shipped validator variants.
//!
//! The engine only depends on the `Validator` trait. Validators convert their
//! own expected failures (unreadable files, missing tools, spawn errors) into
//! issues; an `Err` return is reserved for faults they cannot classify.

pub mod compilation;
pub mod composite;
pub mod concepts;
pub mod features;
pub mod memory;

use crate::error::ValidationError;
use crate::models::context::Context;
use crate::models::{Issue, ValidationResult};
use crate::platform::PlatformProbe;
use crate::rules::FeatureRule;
use serde::Serialize;
use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

pub use compilation::CompilationValidator;
pub use composite::CompositeValidator;
pub use concepts::ConceptValidator;
pub use features::FeaturePatternValidator;
pub use memory::MemoryValidator;

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "UPPERCASE")]
/// Execution ordering only; never gates whether a validator runs.
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Priority::Low => "LOW",
            Priority::Medium => "MEDIUM",
            Priority::High => "HIGH",
            Priority::Critical => "CRITICAL",
        })
    }
}

pub trait Validator: Send + Sync {
    fn name(&self) -> &str;
    fn priority(&self) -> Priority;
    fn validate(&self, ctx: &Context) -> Result<ValidationResult, ValidationError>;
}

/// Run `v`, turning an `Err` return or a panic into failure text.
pub(crate) fn run_guarded(v: &dyn Validator, ctx: &Context) -> Result<ValidationResult, String> {
    match catch_unwind(AssertUnwindSafe(|| v.validate(ctx))) {
        Ok(Ok(r)) => Ok(r),
        Ok(Err(e)) => Err(e.to_string()),
        Err(payload) => Err(format!("panicked: {}", panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Issue reported when a validator fails instead of producing a result.
pub(crate) fn failure_issue(category: &str, validator: &str, error: &str) -> Issue {
    Issue::critical(category, format!("validator '{}' failed: {}", validator, error))
        .suggest(crate::models::Suggestion::new(
            "Re-run with -vv to see the validator's log, and report the failure if it persists.",
            "Relancez avec -vv pour voir le journal du validateur, et signalez l'erreur si elle persiste.",
        ))
}

/// Knobs for the default validator set.
#[derive(Debug, Clone, Default)]
pub struct ValidatorOptions {
    pub memory: bool,
    pub memory_tool: Option<String>,
    pub extra_rules: Vec<FeatureRule>,
}

/// The standard validator set for a submission of `ctx.module`.
pub fn default_validators(
    ctx: &Context,
    probe: Arc<dyn PlatformProbe>,
    opts: &ValidatorOptions,
) -> Vec<Box<dyn Validator>> {
    let mut v: Vec<Box<dyn Validator>> = vec![Box::new(CompilationValidator::new())];
    if opts.memory {
        v.push(Box::new(MemoryValidator::new(probe, opts.memory_tool.clone())));
    }
    let mut source_rules = CompositeValidator::new("source-rules", Priority::High);
    source_rules.push(Box::new(FeaturePatternValidator::for_module(
        ctx.module,
        opts.extra_rules.clone(),
    )));
    source_rules.push(Box::new(ConceptValidator::for_module(ctx.module)));
    v.push(Box::new(source_rules));
    v
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::models::Severity;
    use std::time::Duration;

    /// Validator with scripted behavior for engine tests.
    pub struct Scripted {
        pub name: &'static str,
        pub priority: Priority,
        pub behavior: Behavior,
    }

    pub enum Behavior {
        Issues(Vec<(Severity, &'static str)>),
        /// Valid result, then forced invalid without any blocking issue.
        Invalid,
        Fail(&'static str),
        Panic,
        Sleep(Duration, Vec<(Severity, &'static str)>),
    }

    impl Scripted {
        pub fn boxed(name: &'static str, priority: Priority, behavior: Behavior) -> Box<dyn Validator> {
            Box::new(Scripted {
                name,
                priority,
                behavior,
            })
        }
    }

    fn result_with(name: &str, issues: &[(Severity, &'static str)]) -> ValidationResult {
        let mut r = ValidationResult::new(name);
        for (s, cat) in issues {
            r.add_issue(Issue::new(*s, *cat, format!("{} from {}", cat, name)));
        }
        r.set_metric("checked", 1);
        r
    }

    impl Validator for Scripted {
        fn name(&self) -> &str {
            self.name
        }
        fn priority(&self) -> Priority {
            self.priority
        }
        fn validate(&self, _ctx: &Context) -> Result<ValidationResult, ValidationError> {
            match &self.behavior {
                Behavior::Issues(issues) => Ok(result_with(self.name, issues)),
                Behavior::Invalid => {
                    let mut r = result_with(self.name, &[(Severity::Minor, "STYLE")]);
                    r.mark_invalid();
                    Ok(r)
                }
                Behavior::Fail(msg) => Err(ValidationError::System(msg.to_string())),
                Behavior::Panic => panic!("scripted panic in {}", self.name),
                Behavior::Sleep(d, issues) => {
                    std::thread::sleep(*d);
                    Ok(result_with(self.name, issues))
                }
            }
        }
    }
}
