//! Structured observability hooks for validation runs.
//!
//! Events are emitted at `info!` level; the binary controls filtering and
//! format through [`crate::telemetry::init_tracing`].

use tracing::info;

/// RAII guard that enters a scenario-scoped span for the duration of a run.
///
/// # Example
///
/// ```ignore
/// let _span = ValidationSpan::enter("multi-cloud");
/// // every event below is tagged with scenario = "multi-cloud"
/// ```
pub struct ValidationSpan {
    _span: tracing::span::EnteredSpan,
}

impl ValidationSpan {
    pub fn enter(scenario: &str) -> Self {
        let span = tracing::info_span!("infrabench.validate", scenario = %scenario);
        Self {
            _span: span.entered(),
        }
    }
}

/// Emit event: validation started against a results tree.
pub fn emit_validation_started(scenario: &str, results_dir: &std::path::Path, checks: usize) {
    info!(
        event = "validation.started",
        scenario = %scenario,
        results_dir = %results_dir.display(),
        checks = checks,
    );
}

/// Emit event: one check finished.
pub fn emit_check_completed(check: &str, items: usize, passed: bool, errors: usize) {
    info!(
        event = "check.completed",
        check = %check,
        items = items,
        passed = passed,
        errors = errors,
    );
}

/// Emit event: validation finished with verdict and score.
pub fn emit_validation_finished(scenario: &str, duration_ms: u64, score: u32, passed: bool) {
    info!(
        event = "validation.finished",
        scenario = %scenario,
        duration_ms = duration_ms,
        score = score,
        passed = passed,
    );
}

/// Emit event: the execution order could not be resolved (warning level).
pub fn emit_order_unresolved(scenario: &str, error: &dyn std::fmt::Display) {
    tracing::warn!(event = "validation.order_unresolved", scenario = %scenario, error = %error);
}
