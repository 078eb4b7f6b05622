//! The validation checks, as one explicit enum with a uniform `run` contract.
//!
//! A [`CheckSet`] is constructed by the caller and travels inside
//! [`crate::config::ValidatorConfig`]; there is no process-wide registry.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::compare::{FileComparisonResult, StructuralComparator};
use crate::counts::{ResourceCountResult, ResourceCountValidator};
use crate::crossref::{validate_against_manifest, CrossDomainValidator, CrossRefResult};
use crate::discovery::WalkBudget;
use crate::manifest::OutputManifest;
use crate::scenario::ScenarioModel;

/// One independent validation check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    ResourceCounts,
    CrossDomainRefs,
    StructuralComparison,
}

impl CheckKind {
    pub fn name(&self) -> &'static str {
        match self {
            CheckKind::ResourceCounts => "resource_counts",
            CheckKind::CrossDomainRefs => "cross_domain_refs",
            CheckKind::StructuralComparison => "structural_comparison",
        }
    }

    /// Run this check. Per-item failures end up in [`CheckRun::errors`].
    pub fn run(&self, ctx: &CheckContext<'_>) -> CheckRun {
        match self {
            CheckKind::ResourceCounts => {
                let (results, errors) = ResourceCountValidator::new(ctx.results_dir)
                    .with_budget(ctx.budget)
                    .check_scenario(ctx.scenario);
                CheckRun::new(*self, CheckOutcome::ResourceCounts(results), errors)
            }
            CheckKind::CrossDomainRefs => match ctx.manifest {
                Some(manifest) => CheckRun::new(
                    *self,
                    CheckOutcome::CrossDomainRefs(validate_against_manifest(manifest, ctx.scenario)),
                    Vec::new(),
                ),
                None => {
                    let (results, errors) = CrossDomainValidator::new(ctx.results_dir)
                        .with_budget(ctx.budget)
                        .validate_scenario(ctx.scenario);
                    CheckRun::new(*self, CheckOutcome::CrossDomainRefs(results), errors)
                }
            },
            CheckKind::StructuralComparison => match ctx.expected_dir {
                None => CheckRun::new(*self, CheckOutcome::Skipped, Vec::new()),
                Some(expected) if !expected.is_dir() => CheckRun::new(
                    *self,
                    CheckOutcome::Skipped,
                    vec![format!(
                        "structural comparison: expected directory not found: {}",
                        expected.display()
                    )],
                ),
                Some(expected) => {
                    let comparator = StructuralComparator::new(expected, ctx.results_dir)
                        .with_budget(ctx.budget);
                    match comparator.compare_all() {
                        Ok(results) => {
                            let errors = results
                                .iter()
                                .filter_map(|r| {
                                    r.error.as_ref().map(|e| {
                                        format!(
                                            "structural comparison {}: {}",
                                            r.expected_file.display(),
                                            e
                                        )
                                    })
                                })
                                .collect();
                            CheckRun::new(*self, CheckOutcome::StructuralComparison(results), errors)
                        }
                        // an unwalkable results tree counts as every expected file missing
                        Err(e) => {
                            let mut errors = vec![format!("structural comparison: {}", e)];
                            let outcome = match comparator.all_missing() {
                                Ok(results) => CheckOutcome::StructuralComparison(results),
                                Err(e) => {
                                    errors.push(format!("structural comparison: {}", e));
                                    CheckOutcome::Failed
                                }
                            };
                            CheckRun::new(*self, outcome, errors)
                        }
                    }
                }
            },
        }
    }
}

/// Inputs shared by every check.
pub struct CheckContext<'a> {
    pub scenario: &'a ScenarioModel,
    pub results_dir: &'a Path,
    pub expected_dir: Option<&'a Path>,
    /// Present when cross-domain references should be resolved exactly.
    pub manifest: Option<&'a OutputManifest>,
    pub budget: WalkBudget,
}

/// Result payload of a check.
#[derive(Debug, Clone)]
pub enum CheckOutcome {
    ResourceCounts(BTreeMap<String, Vec<ResourceCountResult>>),
    CrossDomainRefs(Vec<CrossRefResult>),
    StructuralComparison(Vec<FileComparisonResult>),
    /// Not applicable to this run.
    Skipped,
    /// The check could not produce any results.
    Failed,
}

/// A finished check.
#[derive(Debug, Clone)]
pub struct CheckRun {
    pub kind: CheckKind,
    pub outcome: CheckOutcome,
    pub errors: Vec<String>,
}

impl CheckRun {
    fn new(kind: CheckKind, outcome: CheckOutcome, errors: Vec<String>) -> Self {
        Self {
            kind,
            outcome,
            errors,
        }
    }

    /// Whether every individual result of this check passed.
    pub fn passed(&self) -> bool {
        match &self.outcome {
            CheckOutcome::ResourceCounts(map) => map.values().flatten().all(|r| r.passed),
            CheckOutcome::CrossDomainRefs(results) => results.iter().all(|r| r.passed),
            CheckOutcome::StructuralComparison(results) => results.iter().all(|r| r.passed),
            CheckOutcome::Skipped => true,
            CheckOutcome::Failed => false,
        }
    }

    /// Number of individual results produced.
    pub fn item_count(&self) -> usize {
        match &self.outcome {
            CheckOutcome::ResourceCounts(map) => map.values().map(Vec::len).sum(),
            CheckOutcome::CrossDomainRefs(results) => results.len(),
            CheckOutcome::StructuralComparison(results) => results.len(),
            CheckOutcome::Skipped | CheckOutcome::Failed => 0,
        }
    }
}

/// The checks a validation run executes, in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckSet {
    pub checks: Vec<CheckKind>,
}

impl CheckSet {
    /// All three checks.
    pub fn standard() -> Self {
        Self {
            checks: vec![
                CheckKind::ResourceCounts,
                CheckKind::CrossDomainRefs,
                CheckKind::StructuralComparison,
            ],
        }
    }

    pub fn empty() -> Self {
        Self { checks: Vec::new() }
    }

    /// Add a check (builder pattern). Duplicates are ignored.
    pub fn with_check(mut self, check: CheckKind) -> Self {
        if !self.checks.contains(&check) {
            self.checks.push(check);
        }
        self
    }

    /// Remove a check (builder pattern).
    pub fn without_check(mut self, check: CheckKind) -> Self {
        self.checks.retain(|c| *c != check);
        self
    }

    pub fn contains(&self, check: CheckKind) -> bool {
        self.checks.contains(&check)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CheckKind> {
        self.checks.iter()
    }
}

impl Default for CheckSet {
    fn default() -> Self {
        Self::standard()
    }
}
