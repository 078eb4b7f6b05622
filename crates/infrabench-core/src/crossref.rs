//! Cross-domain reference checks.
//!
//! Two modes share one result shape:
//! - heuristic: scan the consuming domain's generated files with a
//!   [`PatternSet`] per required reference;
//! - structured: resolve every reference exactly against an
//!   [`OutputManifest`].

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::discovery::{discover_domain_files, DiscoveredFile, WalkBudget};
use crate::error::Result;
use crate::heuristics::PatternSet;
use crate::manifest::OutputManifest;
use crate::reference::{parse_ref, resolve_ref};
use crate::scenario::{CrossDomainRelationship, ScenarioModel};

/// Evidence for one required reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefMatch {
    pub reference: String,
    pub found: bool,
    /// Files the reference matched in, relative to the results root.
    pub files: Vec<PathBuf>,
    /// Manifest value, structured mode only.
    pub resolved: Option<Value>,
    pub error: Option<String>,
}

impl RefMatch {
    fn missing(reference: &str, error: Option<String>) -> Self {
        Self {
            reference: reference.to_string(),
            found: false,
            files: Vec::new(),
            resolved: None,
            error,
        }
    }
}

/// Outcome of checking one relationship.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossRefResult {
    pub from: String,
    pub to: String,
    pub kind: String,
    pub passed: bool,
    pub refs: Vec<RefMatch>,
    pub missing_refs: Vec<String>,
}

impl CrossRefResult {
    fn from_matches(rel: &CrossDomainRelationship, refs: Vec<RefMatch>) -> Self {
        let missing_refs: Vec<String> = refs
            .iter()
            .filter(|r| !r.found)
            .map(|r| r.reference.clone())
            .collect();
        Self {
            from: rel.from.clone(),
            to: rel.to.clone(),
            kind: rel.kind.clone(),
            passed: missing_refs.is_empty(),
            refs,
            missing_refs,
        }
    }
}

/// Heuristic validator over a results tree.
pub struct CrossDomainValidator<'a> {
    results_dir: &'a Path,
    budget: WalkBudget,
}

impl<'a> CrossDomainValidator<'a> {
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

    fn read_candidates(&self, domain: &str) -> Result<Vec<(DiscoveredFile, String)>> {
        let files = discover_domain_files(self.results_dir, domain, None, &self.budget)?;
        let mut out = Vec::with_capacity(files.len());
        for file in files {
            // invalid UTF-8 is replaced, never skipped
            match std::fs::read(&file.path) {
                Ok(bytes) => {
                    let content = String::from_utf8_lossy(&bytes).into_owned();
                    out.push((file, content));
                }
                Err(e) => {
                    warn!(file = %file.path.display(), error = %e, "skipping unreadable file")
                }
            }
        }
        Ok(out)
    }

    /// Check one relationship's required references in the `to` domain's files.
    pub fn validate_relationship(&self, rel: &CrossDomainRelationship) -> Result<CrossRefResult> {
        let candidates = self.read_candidates(&rel.to)?;
        debug!(from = %rel.from, to = %rel.to, candidates = candidates.len(), "scanning for references");

        let refs = rel
            .required_refs()
            .iter()
            .map(|raw| {
                let reference = match parse_ref(raw) {
                    Ok(r) => r,
                    Err(e) => return RefMatch::missing(raw, Some(e.to_string())),
                };
                let patterns = PatternSet::for_reference(&reference);
                let files: Vec<PathBuf> = candidates
                    .iter()
                    .filter_map(|(file, content)| {
                        patterns.find_match(content).map(|label| {
                            debug!(reference = %raw, file = %file.relative.display(), pattern = %label, "reference matched");
                            file.relative.clone()
                        })
                    })
                    .collect();
                RefMatch {
                    reference: raw.clone(),
                    found: !files.is_empty(),
                    files,
                    resolved: None,
                    error: None,
                }
            })
            .collect();

        Ok(CrossRefResult::from_matches(rel, refs))
    }

    /// Check every relationship; per-relationship failures are recorded, not raised.
    pub fn validate_scenario(&self, scenario: &ScenarioModel) -> (Vec<CrossRefResult>, Vec<String>) {
        let mut results = Vec::new();
        let mut errors = Vec::new();

        for rel in &scenario.cross_domain {
            match self.validate_relationship(rel) {
                Ok(result) => {
                    info!(from = %rel.from, to = %rel.to, passed = result.passed, "cross-domain references checked");
                    results.push(result);
                }
                Err(e) => {
                    warn!(from = %rel.from, to = %rel.to, error = %e, "cross-domain check failed");
                    errors.push(format!("cross-domain {} -> {}: {}", rel.from, rel.to, e));
                    let refs = rel
                        .required_refs()
                        .iter()
                        .map(|raw| RefMatch::missing(raw, Some(e.to_string())))
                        .collect();
                    results.push(CrossRefResult::from_matches(rel, refs));
                }
            }
        }

        (results, errors)
    }
}

/// Structured mode: resolve each relationship's references against a manifest.
pub fn validate_against_manifest(
    manifest: &OutputManifest,
    scenario: &ScenarioModel,
) -> Vec<CrossRefResult> {
    scenario
        .cross_domain
        .iter()
        .map(|rel| {
            let refs = rel
                .required_refs()
                .iter()
                .map(|raw| {
                    match parse_ref(raw).and_then(|r| resolve_ref(manifest, &r).cloned()) {
                        Ok(value) => {
                            let files = parse_ref(raw)
                                .ok()
                                .and_then(|r| manifest.domain(r.domain()).map(|d| d.files.clone()))
                                .unwrap_or_default();
                            RefMatch {
                                reference: raw.clone(),
                                found: true,
                                files,
                                resolved: Some(value),
                                error: None,
                            }
                        }
                        Err(e) => RefMatch::missing(raw, Some(e.to_string())),
                    }
                })
                .collect();
            CrossRefResult::from_matches(rel, refs)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::Domain;
    use serde_json::json;
    use std::fs;

    fn rel() -> CrossDomainRelationship {
        CrossDomainRelationship::new("aws", "github", "outputs_to_env")
            .requires("${aws.vpc.outputs.vpc_id}")
            .requires("${aws.s3.outputs.bucket_name}")
    }

    #[test]
    fn test_heuristic_reports_found_and_missing() {
        let dir = tempfile::tempdir().unwrap();
        let wf = dir.path().join(".github/workflows");
        fs::create_dir_all(&wf).unwrap();
        fs::write(wf.join("deploy.yml"), "env:\n  VPC_ID: ${{ vars.VPC }}\n").unwrap();

        let result = CrossDomainValidator::new(dir.path())
            .validate_relationship(&rel())
            .unwrap();
        assert!(!result.passed);
        assert!(result.refs[0].found);
        assert_eq!(
            result.refs[0].files,
            vec![PathBuf::from(".github/workflows/deploy.yml")]
        );
        assert_eq!(result.missing_refs, vec!["${aws.s3.outputs.bucket_name}".to_string()]);
    }

    #[test]
    fn test_non_utf8_file_is_still_scanned() {
        let dir = tempfile::tempdir().unwrap();
        let wf = dir.path().join(".github/workflows");
        fs::create_dir_all(&wf).unwrap();
        let mut bytes = b"# built by \xff\xfe tooling\nenv:\n".to_vec();
        bytes.extend_from_slice(b"  VPC_ID: ${aws.vpc.outputs.vpc_id}\n");
        fs::write(wf.join("deploy.yml"), bytes).unwrap();

        let result = CrossDomainValidator::new(dir.path())
            .validate_relationship(&rel())
            .unwrap();
        assert!(result.refs[0].found);
        assert_eq!(
            result.refs[0].files,
            vec![PathBuf::from(".github/workflows/deploy.yml")]
        );
    }

    #[test]
    fn test_malformed_reference_is_missing_with_error() {
        let dir = tempfile::tempdir().unwrap();
        let relationship =
            CrossDomainRelationship::new("aws", "github", "env").requires("${aws.vpc.vpc_id}");
        let result = CrossDomainValidator::new(dir.path())
            .validate_relationship(&relationship)
            .unwrap();
        assert!(!result.passed);
        assert!(result.refs[0].error.as_deref().unwrap().contains("invalid reference"));
    }

    #[test]
    fn test_missing_results_dir_recorded_per_relationship() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");
        let scenario = ScenarioModel::new("s")
            .with_domain(Domain::new("aws"))
            .with_domain(Domain::new("github"))
            .with_relationship(rel());

        let (results, errors) = CrossDomainValidator::new(&missing).validate_scenario(&scenario);
        assert_eq!(results.len(), 1);
        assert!(!results[0].passed);
        assert_eq!(results[0].missing_refs.len(), 2);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("results directory not found"));
    }

    #[test]
    fn test_structured_mode_resolves_values() {
        let scenario = ScenarioModel::new("s")
            .with_domain(Domain::new("aws"))
            .with_domain(Domain::new("github"))
            .with_relationship(rel());
        let mut manifest = OutputManifest::new();
        manifest.record_output("aws", "vpc", "AWS::EC2::VPC", "vpc_id", "vpc-1");
        manifest.record_file("aws", "aws/vpc.yaml");

        let results = validate_against_manifest(&manifest, &scenario);
        assert_eq!(results.len(), 1);
        let r = &results[0];
        assert!(!r.passed);
        assert_eq!(r.refs[0].resolved, Some(json!("vpc-1")));
        assert_eq!(r.refs[0].files, vec![PathBuf::from("aws/vpc.yaml")]);
        assert!(r.refs[1].error.as_deref().unwrap().contains("resource 's3' not found"));
    }
}
