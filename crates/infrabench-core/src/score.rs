//! Additive score over four dimensions, each worth 0–3 points.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::checks::CheckKind;
use crate::compare::FileComparisonResult;
use crate::counts::ResourceCountResult;
use crate::crossref::CrossRefResult;

/// Points available per dimension.
pub const DIMENSION_MAX: u32 = 3;

/// Points available in total.
pub const MAX_SCORE: u32 = DIMENSION_MAX * 4;

/// Lint quality is judged by each domain's own tooling, outside the engine.
pub const LINT_PLACEHOLDER: u32 = 2;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    /// Resource-count checks that passed.
    pub completeness: u32,
    pub lint_quality: u32,
    /// Cross-domain reference checks that passed.
    pub output_validity: u32,
    /// Penalised per missing expected file.
    pub structural_fidelity: u32,
}

impl ScoreBreakdown {
    pub fn compute(
        resource_counts: &BTreeMap<String, Vec<ResourceCountResult>>,
        cross_refs: &[CrossRefResult],
        comparisons: &[FileComparisonResult],
    ) -> Self {
        let counts: Vec<&ResourceCountResult> = resource_counts.values().flatten().collect();
        let counts_passed = counts.iter().filter(|r| r.passed).count();
        let refs_passed = cross_refs.iter().filter(|r| r.passed).count();
        let missing = comparisons.iter().filter(|c| c.missing).count();

        Self {
            completeness: proportional(counts_passed, counts.len()),
            lint_quality: LINT_PLACEHOLDER,
            output_validity: proportional(refs_passed, cross_refs.len()),
            structural_fidelity: missing_file_score(missing),
        }
    }

    /// Drop the dimension fed by `kind` to zero.
    pub fn zero(&mut self, kind: CheckKind) {
        match kind {
            CheckKind::ResourceCounts => self.completeness = 0,
            CheckKind::CrossDomainRefs => self.output_validity = 0,
            CheckKind::StructuralComparison => self.structural_fidelity = 0,
        }
    }

    pub fn total(&self) -> u32 {
        self.completeness + self.lint_quality + self.output_validity + self.structural_fidelity
    }
}

/// Full marks when every check passed (or there were none), otherwise the
/// passing share of the dimension rounded down.
pub fn proportional(passed: usize, total: usize) -> u32 {
    if total == 0 || passed >= total {
        return DIMENSION_MAX;
    }
    (DIMENSION_MAX as usize * passed / total) as u32
}

/// One point off per missing file; nothing left at three or more.
pub fn missing_file_score(missing: usize) -> u32 {
    if missing >= DIMENSION_MAX as usize {
        0
    } else {
        DIMENSION_MAX - missing as u32
    }
}
