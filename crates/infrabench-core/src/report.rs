//! Validation report and the orchestrator that builds it.

use std::collections::BTreeMap;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::checks::{CheckContext, CheckKind, CheckOutcome, CheckRun};
use crate::compare::FileComparisonResult;
use crate::config::ValidatorConfig;
use crate::counts::ResourceCountResult;
use crate::crossref::CrossRefResult;
use crate::error::{Result, VerifyError};
use crate::manifest::OutputManifest;
use crate::obs::{
    emit_check_completed, emit_order_unresolved, emit_validation_finished,
    emit_validation_started, ValidationSpan,
};
use crate::resolver::scenario_order;
use crate::scenario::ScenarioModel;
use crate::score::ScoreBreakdown;

/// Outcome of one validation run. Built fresh per run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub scenario: String,
    pub validated_at: DateTime<Utc>,
    /// Empty when the dependency graph could not be ordered.
    pub execution_order: Vec<String>,
    pub passed: bool,
    pub resource_counts: BTreeMap<String, Vec<ResourceCountResult>>,
    pub cross_domain_refs: Vec<CrossRefResult>,
    pub file_comparisons: Vec<FileComparisonResult>,
    pub errors: Vec<String>,
    /// Checks that could not produce results at all.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed_checks: Vec<CheckKind>,
    pub score: u32,
    pub score_breakdown: ScoreBreakdown,
}

impl ValidationReport {
    fn empty(scenario: &str, execution_order: Vec<String>) -> Self {
        Self {
            scenario: scenario.to_string(),
            validated_at: Utc::now(),
            execution_order,
            passed: true,
            resource_counts: BTreeMap::new(),
            cross_domain_refs: Vec::new(),
            file_comparisons: Vec::new(),
            errors: Vec::new(),
            failed_checks: Vec::new(),
            score: 0,
            score_breakdown: ScoreBreakdown::default(),
        }
    }

    fn absorb(&mut self, run: CheckRun) {
        match run.outcome {
            CheckOutcome::ResourceCounts(results) => self.resource_counts = results,
            CheckOutcome::CrossDomainRefs(results) => self.cross_domain_refs = results,
            CheckOutcome::StructuralComparison(results) => self.file_comparisons = results,
            CheckOutcome::Skipped => {}
            CheckOutcome::Failed => self.failed_checks.push(run.kind),
        }
        self.errors.extend(run.errors);
    }

    /// Recompute `passed` and the score from the collected results.
    fn finalize(&mut self) {
        self.passed = self.resource_counts.values().flatten().all(|r| r.passed)
            && self.cross_domain_refs.iter().all(|r| r.passed)
            && self.file_comparisons.iter().all(|r| r.passed)
            && self.failed_checks.is_empty();
        self.score_breakdown = ScoreBreakdown::compute(
            &self.resource_counts,
            &self.cross_domain_refs,
            &self.file_comparisons,
        );
        for kind in &self.failed_checks {
            self.score_breakdown.zero(*kind);
        }
        self.score = self.score_breakdown.total();
    }

    /// All count results in domain order.
    pub fn count_results(&self) -> impl Iterator<Item = &ResourceCountResult> {
        self.resource_counts.values().flatten()
    }

    pub fn missing_files(&self) -> usize {
        self.file_comparisons.iter().filter(|c| c.missing).count()
    }
}

/// Runs the configured checks against a generated tree.
#[derive(Debug, Clone)]
pub struct Validator {
    config: ValidatorConfig,
}

impl Validator {
    pub fn new(config: ValidatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Validate the results tree against `scenario`.
    ///
    /// Only a scenario without domains is an error; every other problem is
    /// recorded inside the returned report.
    pub fn validate(&self, scenario: &ScenarioModel) -> Result<ValidationReport> {
        if scenario.domains.is_empty() {
            return Err(VerifyError::InvalidScenario(format!(
                "scenario '{}' declares no domains",
                scenario.name
            )));
        }

        let started = Instant::now();
        let _span = ValidationSpan::enter(&scenario.name);
        emit_validation_started(
            &scenario.name,
            &self.config.results_dir,
            self.config.checks.checks.len(),
        );

        let mut preamble_errors = Vec::new();
        let execution_order = match scenario_order(scenario) {
            Ok(order) => order,
            Err(e) => {
                emit_order_unresolved(&scenario.name, &e);
                preamble_errors.push(format!("dependency order: {}", e));
                Vec::new()
            }
        };
        let manifest = self.load_manifest(&mut preamble_errors);

        let mut report = ValidationReport::empty(&scenario.name, execution_order);
        report.errors = preamble_errors;

        let ctx = CheckContext {
            scenario,
            results_dir: &self.config.results_dir,
            expected_dir: self.config.expected_dir.as_deref(),
            manifest: manifest.as_ref(),
            budget: self.config.budget(),
        };
        for check in self.config.checks.iter() {
            let run = check.run(&ctx);
            emit_check_completed(check.name(), run.item_count(), run.passed(), run.errors.len());
            report.absorb(run);
        }
        report.finalize();

        emit_validation_finished(
            &scenario.name,
            started.elapsed().as_millis() as u64,
            report.score,
            report.passed,
        );
        Ok(report)
    }

    /// The configured manifest, if any. A manifest that fails to load is
    /// recorded and replaced by an empty one so every reference fails.
    fn load_manifest(&self, errors: &mut Vec<String>) -> Option<OutputManifest> {
        let path = self.config.manifest_path.as_ref()?;
        match OutputManifest::open(path) {
            Ok(manifest) => Some(manifest),
            Err(e) => {
                warn!(manifest = %path.display(), error = %e, "failed to load output manifest");
                errors.push(format!("output manifest {}: {}", path.display(), e));
                Some(OutputManifest::new())
            }
        }
    }
}
