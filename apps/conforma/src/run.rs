//! End-to-end validation of one submission from resolved settings.

use crate::config::Effective;
use crate::discovery::discover_sources;
use crate::engine::{EngineConfig, ValidationEngine};
use crate::error::ValidationError;
use crate::models::context::Context;
use crate::models::ValidationResult;
use crate::platform::PlatformProbe;
use crate::validators::{default_validators, ValidatorOptions};
use std::sync::Arc;
use tracing::info;

/// Discover files and build the validation context.
pub fn build_context(eff: &Effective, probe: &dyn PlatformProbe) -> Result<Context, ValidationError> {
    let files = discover_sources(&eff.submission)?;
    let platform = eff.platform.unwrap_or_else(|| probe.detect_platform());
    let mut ctx = Context::new(eff.submission.to_string_lossy(), eff.module, platform)
        .with_files(files.sources, files.headers)
        .with_tools(eff.tools.clone());
    ctx.metadata = eff.metadata.clone();
    Ok(ctx)
}

/// Run the default validator set against the submission. Errors only for
/// problems that prevent building a context.
pub fn validate_submission(
    eff: &Effective,
    probe: Arc<dyn PlatformProbe>,
) -> Result<ValidationResult, ValidationError> {
    let ctx = build_context(eff, probe.as_ref())?;
    info!(
        submission = %ctx.submission,
        module = %ctx.module,
        platform = %ctx.platform,
        sources = ctx.sources.len(),
        headers = ctx.headers.len(),
        cores = probe.cpu_core_count(),
        "validating submission"
    );
    let opts = ValidatorOptions {
        memory: eff.memory,
        memory_tool: eff.memory_tool.clone(),
        extra_rules: eff.extra_rules.clone(),
    };
    let mut engine = ValidationEngine::new(EngineConfig {
        parallel: eff.parallel,
    });
    for v in default_validators(&ctx, probe, &opts) {
        engine.add_validator(v);
    }
    Ok(engine.validate(&ctx))
}
