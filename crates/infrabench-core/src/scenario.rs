//! Scenario model: domains, dependency edges, cross-domain relationships and
//! per-domain resource count constraints.
//!
//! A scenario is authored as YAML:
//!
//! ```yaml
//! name: vpc-to-ci
//! domains:
//!   - name: aws
//!     cli: aws
//!     mcp_tools: { generate: cfn_generate }
//!     outputs: ["*.yaml"]
//!   - name: github
//!     cli: gh
//!     depends_on: [aws]
//! cross_domain:
//!   - from: aws
//!     to: github
//!     type: outputs_to_env
//!     validation:
//!       required_refs: ["${aws.vpc.outputs.vpc_id}"]
//! validation:
//!   aws:
//!     stacks: { min: 1, max: 3 }
//! ```

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, VerifyError};

/// A named unit of infrastructure generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Domain {
    pub name: String,

    /// CLI or tool binding used to generate and lint this domain.
    #[serde(default)]
    pub cli: String,

    /// Purpose → tool-name map exposed by the domain's tool server.
    #[serde(default, rename = "mcp_tools")]
    pub tools: BTreeMap<String, String>,

    #[serde(default)]
    pub depends_on: BTreeSet<String>,

    /// Glob patterns describing the files this domain is expected to emit.
    #[serde(default)]
    pub outputs: Vec<String>,
}

impl Domain {
    /// Create a domain with no bindings, dependencies or output globs.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cli: String::new(),
            tools: BTreeMap::new(),
            depends_on: BTreeSet::new(),
            outputs: Vec::new(),
        }
    }

    /// Add a dependency edge (builder pattern).
    pub fn depends_on(mut self, dependency: impl Into<String>) -> Self {
        self.depends_on.insert(dependency.into());
        self
    }

    /// Add an output glob (builder pattern).
    pub fn with_output(mut self, glob: impl Into<String>) -> Self {
        self.outputs.push(glob.into());
        self
    }

    /// Globs used to classify files of `kind` for this domain.
    ///
    /// Declared `outputs` win; otherwise the resource kind's defaults apply.
    pub fn output_globs(&self, kind: ResourceKind) -> Vec<String> {
        if self.outputs.is_empty() {
            kind.default_globs().iter().map(|g| g.to_string()).collect()
        } else {
            self.outputs.clone()
        }
    }
}

/// Validation block of a cross-domain relationship.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipValidation {
    #[serde(default)]
    pub required_refs: Vec<String>,
}

/// Declares that `to` consumes outputs produced by `from`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossDomainRelationship {
    pub from: String,
    pub to: String,

    #[serde(default, rename = "type")]
    pub kind: String,

    #[serde(default)]
    pub validation: RelationshipValidation,
}

impl CrossDomainRelationship {
    pub fn new(from: impl Into<String>, to: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            kind: kind.into(),
            validation: RelationshipValidation::default(),
        }
    }

    /// Add a required reference (builder pattern).
    pub fn requires(mut self, reference: impl Into<String>) -> Self {
        self.validation.required_refs.push(reference.into());
        self
    }

    pub fn required_refs(&self) -> &[String] {
        &self.validation.required_refs
    }
}

/// Resource-type tag a count constraint is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Stacks,
    Pipelines,
    Workflows,
    Manifests,
    Resources,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Stacks => "stacks",
            ResourceKind::Pipelines => "pipelines",
            ResourceKind::Workflows => "workflows",
            ResourceKind::Manifests => "manifests",
            ResourceKind::Resources => "resources",
        }
    }

    /// File globs assumed for this kind when a domain declares none.
    pub fn default_globs(&self) -> &'static [&'static str] {
        match self {
            ResourceKind::Stacks => &["*.yaml", "*.yml", "*.json", "*.template"],
            ResourceKind::Pipelines | ResourceKind::Workflows => &["*.yml", "*.yaml"],
            ResourceKind::Manifests => &["*.yaml", "*.yml", "*.json"],
            ResourceKind::Resources => &["*.tf", "*.yaml", "*.yml", "*.json"],
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Minimum/maximum number of files of one kind. `0` means unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountConstraint {
    #[serde(default)]
    pub min: u32,
    #[serde(default)]
    pub max: u32,
}

impl CountConstraint {
    pub fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }
}

/// Constraints attached to one domain, keyed by resource kind.
pub type DomainConstraints = BTreeMap<ResourceKind, CountConstraint>;

/// In-memory scenario.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioModel {
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub domains: Vec<Domain>,

    #[serde(default)]
    pub cross_domain: Vec<CrossDomainRelationship>,

    /// Domain name → per-kind count constraints.
    #[serde(default)]
    pub validation: BTreeMap<String, DomainConstraints>,
}

impl ScenarioModel {
    /// Create an empty scenario.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Add a domain (builder pattern).
    pub fn with_domain(mut self, domain: Domain) -> Self {
        self.domains.push(domain);
        self
    }

    /// Add a cross-domain relationship (builder pattern).
    pub fn with_relationship(mut self, relationship: CrossDomainRelationship) -> Self {
        self.cross_domain.push(relationship);
        self
    }

    /// Attach a count constraint (builder pattern).
    pub fn with_constraint(
        mut self,
        domain: impl Into<String>,
        kind: ResourceKind,
        constraint: CountConstraint,
    ) -> Self {
        self.validation
            .entry(domain.into())
            .or_default()
            .insert(kind, constraint);
        self
    }

    /// Parse a scenario document and check its invariants.
    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        let scenario: ScenarioModel = serde_yaml::from_str(raw)?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Load a scenario document from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let scenario: ScenarioModel =
            serde_yaml::from_str(&raw).map_err(|e| VerifyError::Parse {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn domain(&self, name: &str) -> Option<&Domain> {
        self.domains.iter().find(|d| d.name == name)
    }

    pub fn domain_names(&self) -> Vec<&str> {
        self.domains.iter().map(|d| d.name.as_str()).collect()
    }

    /// Check the scenario invariants, returning the first violation.
    ///
    /// Dependency cycles are not detected here; see
    /// [`crate::resolver::resolve_order`].
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for domain in &self.domains {
            if !seen.insert(domain.name.as_str()) {
                return Err(VerifyError::DuplicateDomain {
                    name: domain.name.clone(),
                });
            }
        }

        for domain in &self.domains {
            for dep in &domain.depends_on {
                if dep == &domain.name {
                    return Err(VerifyError::SelfDependency {
                        domain: domain.name.clone(),
                    });
                }
                if !seen.contains(dep.as_str()) {
                    return Err(VerifyError::UnknownDependency {
                        domain: domain.name.clone(),
                        dependency: dep.clone(),
                    });
                }
            }
        }

        for rel in &self.cross_domain {
            for endpoint in [&rel.from, &rel.to] {
                if !seen.contains(endpoint.as_str()) {
                    return Err(VerifyError::UnknownRelationshipDomain {
                        from: rel.from.clone(),
                        to: rel.to.clone(),
                        domain: endpoint.clone(),
                    });
                }
            }
        }

        for domain in self.validation.keys() {
            if !seen.contains(domain.as_str()) {
                return Err(VerifyError::UnknownConstraintDomain {
                    domain: domain.clone(),
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
name: vpc-to-ci
description: VPC stack consumed by a CI pipeline
domains:
  - name: aws
    cli: aws
    mcp_tools:
      generate: cfn_generate
      lint: cfn_lint
    outputs: ["*.yaml"]
  - name: github
    cli: gh
    depends_on: [aws]
cross_domain:
  - from: aws
    to: github
    type: outputs_to_env
    validation:
      required_refs:
        - "${aws.vpc.outputs.vpc_id}"
validation:
  aws:
    stacks: { min: 1, max: 3 }
  github:
    workflows: { min: 1 }
"#;

    #[test]
    fn test_parse_sample_scenario() {
        let scenario = ScenarioModel::from_yaml_str(SAMPLE).expect("parse scenario");
        assert_eq!(scenario.name, "vpc-to-ci");
        assert_eq!(scenario.domains.len(), 2);

        let aws = scenario.domain("aws").expect("aws domain");
        assert_eq!(aws.cli, "aws");
        assert_eq!(aws.tools.get("lint").map(String::as_str), Some("cfn_lint"));

        let github = scenario.domain("github").expect("github domain");
        assert!(github.depends_on.contains("aws"));

        assert_eq!(scenario.cross_domain[0].kind, "outputs_to_env");
        assert_eq!(
            scenario.cross_domain[0].required_refs(),
            &["${aws.vpc.outputs.vpc_id}".to_string()]
        );

        let stacks = scenario.validation["aws"][&ResourceKind::Stacks];
        assert_eq!(stacks, CountConstraint::new(1, 3));
        let workflows = scenario.validation["github"][&ResourceKind::Workflows];
        assert_eq!(workflows.max, 0);
    }

    #[test]
    fn test_duplicate_domain_rejected() {
        let scenario = ScenarioModel::new("dup")
            .with_domain(Domain::new("aws"))
            .with_domain(Domain::new("aws"));
        assert!(matches!(
            scenario.validate(),
            Err(VerifyError::DuplicateDomain { .. })
        ));
    }

    #[test]
    fn test_self_dependency_rejected() {
        let scenario = ScenarioModel::new("self").with_domain(Domain::new("a").depends_on("a"));
        assert!(matches!(
            scenario.validate(),
            Err(VerifyError::SelfDependency { .. })
        ));
    }

    #[test]
    fn test_unknown_dependency_rejected() {
        let scenario = ScenarioModel::new("x").with_domain(Domain::new("a").depends_on("ghost"));
        let err = scenario.validate().unwrap_err();
        assert!(err.to_string().contains("unknown"));
    }

    #[test]
    fn test_relationship_endpoints_must_exist() {
        let scenario = ScenarioModel::new("x")
            .with_domain(Domain::new("aws"))
            .with_relationship(CrossDomainRelationship::new("aws", "gitlab", "env"));
        assert!(matches!(
            scenario.validate(),
            Err(VerifyError::UnknownRelationshipDomain { .. })
        ));
    }

    #[test]
    fn test_constraint_domain_must_exist() {
        let scenario = ScenarioModel::new("x")
            .with_domain(Domain::new("aws"))
            .with_constraint("k8s", ResourceKind::Manifests, CountConstraint::new(1, 0));
        assert!(matches!(
            scenario.validate(),
            Err(VerifyError::UnknownConstraintDomain { .. })
        ));
    }

    #[test]
    fn test_output_globs_fall_back_to_kind_defaults() {
        let bare = Domain::new("k8s");
        assert_eq!(
            bare.output_globs(ResourceKind::Manifests),
            vec!["*.yaml", "*.yml", "*.json"]
        );

        let declared = Domain::new("aws").with_output("*.template");
        assert_eq!(declared.output_globs(ResourceKind::Stacks), vec!["*.template"]);
    }

    #[test]
    fn test_invalid_yaml_is_an_error() {
        assert!(ScenarioModel::from_yaml_str("domains: [unterminated").is_err());
    }
}
