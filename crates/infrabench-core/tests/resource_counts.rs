use std::fs;
use std::path::{Path, PathBuf};

use infrabench_core::{
    discover_domain_files, CountConstraint, CountFailure, Domain, DiscoverySource,
    ResourceCountValidator, ResourceKind, ScenarioModel, WalkBudget,
};

fn touch(root: &Path, rel: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, "Resources: {}\n").unwrap();
}

fn yaml_globs() -> Vec<String> {
    vec!["*.yaml".to_string(), "*.yml".to_string()]
}

fn stacks(n: usize) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    for i in 0..n {
        touch(dir.path(), &format!("aws/stack-{i}.yaml"));
    }
    dir
}

// ---- bounds ----

#[test]
fn two_files_within_two_to_five_passes() {
    let dir = stacks(2);
    let result = ResourceCountValidator::new(dir.path())
        .check("aws", ResourceKind::Stacks, &yaml_globs(), CountConstraint::new(2, 5))
        .unwrap();
    assert!(result.passed);
    assert_eq!(result.found, 2);
    assert!(result.reason.is_none());
}

#[test]
fn one_and_six_files_fail_for_different_reasons() {
    let low_dir = stacks(1);
    let high_dir = stacks(6);
    let constraint = CountConstraint::new(2, 5);

    let low = ResourceCountValidator::new(low_dir.path())
        .check("aws", ResourceKind::Stacks, &yaml_globs(), constraint)
        .unwrap();
    let high = ResourceCountValidator::new(high_dir.path())
        .check("aws", ResourceKind::Stacks, &yaml_globs(), constraint)
        .unwrap();

    assert!(!low.passed);
    assert!(!high.passed);
    assert_eq!(low.failure, Some(CountFailure::Insufficient));
    assert_eq!(high.failure, Some(CountFailure::TooMany));
    assert!(low.reason.unwrap().contains("insufficient resources"));
    assert!(high.reason.unwrap().contains("too many resources"));
}

#[test]
fn globs_filter_out_other_kinds() {
    let dir = stacks(2);
    touch(dir.path(), "aws/README.md");
    touch(dir.path(), "aws/main.tf");
    let result = ResourceCountValidator::new(dir.path())
        .check("aws", ResourceKind::Stacks, &yaml_globs(), CountConstraint::new(0, 2))
        .unwrap();
    assert!(result.passed);
    assert_eq!(result.found, 2);
}

// ---- discovery sources ----

#[test]
fn found_count_is_deduplicated_union_of_sources() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), "github/release.yml");
    // reachable through both `.github/workflows` and `.github`
    touch(dir.path(), ".github/workflows/ci.yml");
    touch(dir.path(), ".github/workflows/deploy.yml");
    touch(dir.path(), "workflow-lint.yml");
    touch(dir.path(), "unrelated.yml");

    let files = discover_domain_files(dir.path(), "github", None, &WalkBudget::unbounded()).unwrap();
    let relative: Vec<PathBuf> = files.iter().map(|f| f.relative.clone()).collect();
    assert_eq!(
        relative,
        vec![
            PathBuf::from(".github/workflows/ci.yml"),
            PathBuf::from(".github/workflows/deploy.yml"),
            PathBuf::from("github/release.yml"),
            PathBuf::from("workflow-lint.yml"),
        ]
    );
    let sources: Vec<DiscoverySource> = files.iter().map(|f| f.source).collect();
    assert!(sources.contains(&DiscoverySource::DomainDir));
    assert!(sources.contains(&DiscoverySource::KnownSubdir));
    assert!(sources.contains(&DiscoverySource::RootKeyword));

    let result = ResourceCountValidator::new(dir.path())
        .check("github", ResourceKind::Workflows, &yaml_globs(), CountConstraint::new(1, 4))
        .unwrap();
    assert_eq!(result.found, 4);
    assert!(result.passed);
}

#[test]
fn root_keyword_files_count_for_aliased_domain() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), "cfn-network.yaml");
    touch(dir.path(), "cloudformation/storage.yaml");
    let result = ResourceCountValidator::new(dir.path())
        .check("aws", ResourceKind::Stacks, &yaml_globs(), CountConstraint::new(2, 0))
        .unwrap();
    assert_eq!(result.found, 2);
    assert!(result.passed);
}

// ---- scenario runs ----

#[test]
fn scenario_constraints_use_declared_outputs() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), "k8s/deployment.yaml");
    touch(dir.path(), "k8s/service.yaml");
    touch(dir.path(), "k8s/kustomization.json");

    let scenario = ScenarioModel::new("k8s")
        .with_domain(Domain::new("k8s").with_output("*.yaml"))
        .with_constraint("k8s", ResourceKind::Manifests, CountConstraint::new(2, 2));

    let (results, errors) = ResourceCountValidator::new(dir.path()).check_scenario(&scenario);
    assert!(errors.is_empty());
    let k8s = &results["k8s"];
    assert_eq!(k8s.len(), 1);
    assert_eq!(k8s[0].found, 2);
    assert!(k8s[0].passed);
}

#[test]
fn missing_results_dir_is_an_error_not_zero() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("results");
    let scenario = ScenarioModel::new("s")
        .with_domain(Domain::new("aws"))
        .with_constraint("aws", ResourceKind::Stacks, CountConstraint::new(0, 0));

    let (results, errors) = ResourceCountValidator::new(&missing).check_scenario(&scenario);
    assert_eq!(errors.len(), 1);
    let aws = &results["aws"][0];
    assert!(!aws.passed, "min 0 must not pass on a missing tree");
    assert_eq!(aws.failure, Some(CountFailure::Unavailable));
}
