//! Validation engine: ordering, execution, failure isolation, aggregation.
//!
//! Validators are sorted by descending priority (stable, so registration
//! order breaks ties) and run either one after another or on a dedicated
//! rayon pool with one worker per validator. Both modes yield the same
//! ordered issue sequence. A validator that errors or panics contributes one
//! CRITICAL issue and never stops the others.

use crate::error::ValidationError;
use crate::models::context::Context;
use crate::models::{Issue, ValidationResult};
use crate::validators::{failure_issue, run_guarded, Priority, Validator};
use rayon::prelude::*;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Name of the aggregated result.
pub const ENGINE_NAME: &str = "engine";

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub parallel: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig { parallel: true }
    }
}

/// Result of one validator run: its result or the failure text, plus wall time.
struct Outcome {
    result: Result<ValidationResult, String>,
    duration_ms: u128,
}

pub struct ValidationEngine {
    config: EngineConfig,
    validators: Vec<Box<dyn Validator>>,
}

impl ValidationEngine {
    pub fn new(config: EngineConfig) -> Self {
        ValidationEngine {
            config,
            validators: Vec::new(),
        }
    }

    /// Register a boxed validator. `None` is ignored.
    ///
    /// `Box::new(v)` only converts once it is typed as `Box<dyn Validator>`;
    /// use `add` for a concrete value.
    pub fn add_validator(&mut self, v: impl Into<Option<Box<dyn Validator>>>) {
        if let Some(v) = v.into() {
            self.validators.push(v);
        }
    }

    /// Register a concrete validator.
    pub fn add<V: Validator + 'static>(&mut self, v: V) {
        self.validators.push(Box::new(v));
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }

    /// Drop every registered validator.
    pub fn clear(&mut self) {
        self.validators.clear();
    }

    /// Run every validator against `ctx` and merge the results. Always
    /// returns a well-formed result.
    pub fn validate(&self, ctx: &Context) -> ValidationResult {
        let mut agg = ValidationResult::new(ENGINE_NAME);
        agg.set_metric("submission", &ctx.submission);
        agg.set_metric("module", ctx.module);
        agg.set_metric("platform", ctx.platform);
        agg.set_metric("validator_count", self.validators.len());

        if ctx.submission.trim().is_empty() {
            let err = ValidationError::InvalidContext("the submission identifier is empty".into());
            warn!(category = err.category().as_str(), "rejecting context");
            agg.set_metric("execution_mode", "none");
            agg.add_issue(Issue::critical("INVALID_CONTEXT", err.to_string()));
            return agg;
        }
        if self.validators.is_empty() {
            agg.set_metric("execution_mode", "none");
            agg.add_issue(Issue::critical("NO_VALIDATORS", "no validators are registered"));
            return agg;
        }

        let mut ordered: Vec<&dyn Validator> = self.validators.iter().map(|v| v.as_ref()).collect();
        ordered.sort_by_key(|v| std::cmp::Reverse(v.priority()));

        let parallel = self.config.parallel && ordered.len() > 1;
        agg.set_metric("execution_mode", if parallel { "parallel" } else { "sequential" });
        let started = Instant::now();
        let (outcomes, failure_tag) = if parallel {
            (run_parallel(&ordered, ctx), "VALIDATOR_THREAD_ERROR")
        } else {
            (run_sequential(&ordered, ctx), "VALIDATOR_ERROR")
        };

        for (v, outcome) in ordered.iter().zip(outcomes) {
            agg.set_metric(format!("{}.duration_ms", v.name()), outcome.duration_ms);
            match outcome.result {
                Ok(r) => {
                    if !r.is_valid() && v.priority() >= Priority::High {
                        agg.mark_invalid();
                    }
                    agg.absorb(v.name(), r);
                }
                Err(msg) => {
                    warn!(validator = v.name(), error = %msg, "validator failed");
                    agg.add_issue(failure_issue(failure_tag, v.name(), &msg));
                }
            }
        }
        let summary = agg.summary();
        info!(
            valid = agg.is_valid(),
            critical = summary.critical,
            major = summary.major,
            minor = summary.minor,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "validation finished"
        );
        agg
    }
}

fn run_sequential(ordered: &[&dyn Validator], ctx: &Context) -> Vec<Outcome> {
    ordered.iter().map(|v| run_one(*v, ctx)).collect()
}

fn run_parallel(ordered: &[&dyn Validator], ctx: &Context) -> Vec<Outcome> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(ordered.len())
        .thread_name(|i| format!("conforma-validator-{}", i))
        .build();
    match pool {
        // Indexed collect keeps priority order regardless of completion order
        Ok(pool) => pool.install(|| ordered.par_iter().map(|v| run_one(*v, ctx)).collect()),
        Err(e) => {
            warn!(error = %e, "could not build validator pool");
            ordered
                .iter()
                .map(|_| Outcome {
                    result: Err(format!("could not start a worker: {}", e)),
                    duration_ms: 0,
                })
                .collect()
        }
    }
}

fn run_one(v: &dyn Validator, ctx: &Context) -> Outcome {
    debug!(validator = v.name(), priority = %v.priority(), "dispatching validator");
    let start = Instant::now();
    let result = run_guarded(v, ctx);
    Outcome {
        result,
        duration_ms: start.elapsed().as_millis(),
    }
}
