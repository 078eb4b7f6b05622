//! Resource count checks: how many files of a kind did a domain produce?

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::discovery::{compile_globset, discover_domain_files, WalkBudget};
use crate::error::Result;
use crate::scenario::{CountConstraint, ResourceKind, ScenarioModel};

/// Why a count check failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountFailure {
    Insufficient,
    TooMany,
    /// Discovery itself failed (missing results directory, walk timeout).
    Unavailable,
}

/// Outcome of one (domain, kind) count check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceCountResult {
    pub domain: String,
    pub resource_type: ResourceKind,
    pub min: u32,
    pub max: u32,
    pub found: usize,
    /// Matched files, relative to the results root.
    pub matched_files: Vec<PathBuf>,
    pub passed: bool,
    pub failure: Option<CountFailure>,
    pub reason: Option<String>,
}

/// Check `found` against a constraint. `max == 0` means unbounded.
pub fn evaluate_count(found: usize, constraint: CountConstraint) -> Option<CountFailure> {
    if found < constraint.min as usize {
        Some(CountFailure::Insufficient)
    } else if constraint.max != 0 && found > constraint.max as usize {
        Some(CountFailure::TooMany)
    } else {
        None
    }
}

fn failure_reason(failure: CountFailure, found: usize, constraint: CountConstraint) -> String {
    match failure {
        CountFailure::Insufficient => format!(
            "insufficient resources: found {}, expected at least {}",
            found, constraint.min
        ),
        CountFailure::TooMany => format!(
            "too many resources: found {}, expected at most {}",
            found, constraint.max
        ),
        CountFailure::Unavailable => "results unavailable".to_string(),
    }
}

/// Classifies generated files and checks count constraints.
pub struct ResourceCountValidator<'a> {
    results_dir: &'a Path,
    budget: WalkBudget,
}

impl<'a> ResourceCountValidator<'a> {
    pub fn new(results_dir: &'a Path) -> Self {
        Self {
            results_dir,
            budget: WalkBudget::unbounded(),
        }
    }

    pub fn with_budget(mut self, budget: WalkBudget) -> Self {
        self.budget = budget;
        self
    }

    /// Count the files of `kind` for `domain` matching `globs`.
    pub fn check(
        &self,
        domain: &str,
        kind: ResourceKind,
        globs: &[String],
        constraint: CountConstraint,
    ) -> Result<ResourceCountResult> {
        let filter = compile_globset(globs)?;
        let files = discover_domain_files(self.results_dir, domain, Some(&filter), &self.budget)?;
        let found = files.len();
        let failure = evaluate_count(found, constraint);

        Ok(ResourceCountResult {
            domain: domain.to_string(),
            resource_type: kind,
            min: constraint.min,
            max: constraint.max,
            found,
            matched_files: files.into_iter().map(|f| f.relative).collect(),
            passed: failure.is_none(),
            failure,
            reason: failure.map(|f| failure_reason(f, found, constraint)),
        })
    }

    /// Run every constraint in the scenario.
    ///
    /// A failing check is recorded as a failed result and its error message
    /// is returned alongside; remaining checks still run.
    pub fn check_scenario(
        &self,
        scenario: &ScenarioModel,
    ) -> (BTreeMap<String, Vec<ResourceCountResult>>, Vec<String>) {
        let mut results: BTreeMap<String, Vec<ResourceCountResult>> = BTreeMap::new();
        let mut errors = Vec::new();

        for (domain_name, constraints) in &scenario.validation {
            let globs_for = |kind: ResourceKind| match scenario.domain(domain_name) {
                Some(domain) => domain.output_globs(kind),
                None => kind.default_globs().iter().map(|g| g.to_string()).collect(),
            };

            for (kind, constraint) in constraints {
                let result = match self.check(domain_name, *kind, &globs_for(*kind), *constraint) {
                    Ok(result) => result,
                    Err(e) => {
                        warn!(domain = %domain_name, kind = %kind, error = %e, "resource count check failed");
                        errors.push(format!("resource count {}/{}: {}", domain_name, kind, e));
                        ResourceCountResult {
                            domain: domain_name.clone(),
                            resource_type: *kind,
                            min: constraint.min,
                            max: constraint.max,
                            found: 0,
                            matched_files: Vec::new(),
                            passed: false,
                            failure: Some(CountFailure::Unavailable),
                            reason: Some(e.to_string()),
                        }
                    }
                };
                info!(
                    domain = %domain_name,
                    kind = %kind,
                    found = result.found,
                    passed = result.passed,
                    "resource count checked"
                );
                results.entry(domain_name.clone()).or_default().push(result);
            }
        }

        (results, errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evaluate_count_bounds() {
        let c = CountConstraint::new(2, 5);
        assert_eq!(evaluate_count(1, c), Some(CountFailure::Insufficient));
        assert_eq!(evaluate_count(2, c), None);
        assert_eq!(evaluate_count(5, c), None);
        assert_eq!(evaluate_count(6, c), Some(CountFailure::TooMany));
    }

    #[test]
    fn test_zero_max_is_unbounded() {
        let c = CountConstraint::new(1, 0);
        assert_eq!(evaluate_count(1000, c), None);
        assert_eq!(evaluate_count(0, c), Some(CountFailure::Insufficient));
    }

    #[test]
    fn test_zero_min_zero_max_always_passes() {
        assert_eq!(evaluate_count(0, CountConstraint::default()), None);
    }

    #[test]
    fn test_failure_reasons_are_distinguishable() {
        let c = CountConstraint::new(2, 5);
        let low = failure_reason(CountFailure::Insufficient, 1, c);
        let high = failure_reason(CountFailure::TooMany, 6, c);
        assert!(low.starts_with("insufficient resources"));
        assert!(high.starts_with("too many resources"));
    }
}
