//! Static naming heuristics for well-known domain tags.
//!
//! Generated trees are not always laid out one directory per domain. A
//! [`DomainProfile`] lists the alternate subdirectories and root-level file
//! name keywords that identify a domain's files, and [`patterns`] holds the
//! tables used to spot a reference's value in free-form text.

pub mod patterns;

pub use patterns::{case_variants, PatternSet};

/// Discovery hints for one well-known domain tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DomainProfile {
    /// Canonical tag, used as the key of the extra-pattern table.
    pub tag: &'static str,
    /// Domain names (or name tokens) that map onto this profile.
    pub aliases: &'static [&'static str],
    /// Subdirectories of the results root that commonly hold this domain's files.
    pub subdirs: &'static [&'static str],
    /// Lowercase substrings identifying root-level files of this domain.
    pub keywords: &'static [&'static str],
}

pub static DOMAIN_PROFILES: &[DomainProfile] = &[
    DomainProfile {
        tag: "aws",
        aliases: &["aws", "cloudformation", "cfn", "sam"],
        subdirs: &["cloudformation", "cfn", "templates", "infrastructure", "infra"],
        keywords: &["cfn", "cloudformation", "stack", "template"],
    },
    DomainProfile {
        tag: "kubernetes",
        aliases: &["kubernetes", "k8s", "kube", "kubectl", "eks", "gke", "aks"],
        subdirs: &["k8s", "kubernetes", "manifests", "kube"],
        keywords: &["namespace", "deployment", "service", "configmap", "ingress", "k8s", "kube"],
    },
    DomainProfile {
        tag: "github",
        aliases: &["github", "gh", "github-actions", "gha", "actions"],
        subdirs: &[".github/workflows", "workflows", ".github"],
        keywords: &["workflow", "github", "actions"],
    },
    DomainProfile {
        tag: "gitlab",
        aliases: &["gitlab", "gitlab-ci", "glab"],
        subdirs: &[".gitlab", "gitlab", "ci"],
        keywords: &["gitlab", "pipeline"],
    },
    DomainProfile {
        tag: "terraform",
        aliases: &["terraform", "tf", "opentofu", "tofu"],
        subdirs: &["terraform", "tf", "modules"],
        keywords: &["terraform", ".tf"],
    },
    DomainProfile {
        tag: "azure",
        aliases: &["azure", "az", "bicep"],
        subdirs: &["azure", "arm", "bicep"],
        keywords: &["azure", "azuredeploy", "bicep"],
    },
    DomainProfile {
        tag: "gcp",
        aliases: &["gcp", "gcloud", "google"],
        subdirs: &["gcp", "gcloud", "deployment-manager"],
        keywords: &["gcp", "gcloud"],
    },
    DomainProfile {
        tag: "helm",
        aliases: &["helm"],
        subdirs: &["charts", "helm"],
        keywords: &["chart", "values"],
    },
    DomainProfile {
        tag: "docker",
        aliases: &["docker", "compose", "docker-compose"],
        subdirs: &["docker"],
        keywords: &["dockerfile", "compose"],
    },
];

/// Find the profile for a domain name.
///
/// An exact alias match wins; otherwise any `-`/`_`/`.` separated token of
/// the name may match an alias (`aws-network` → `aws`).
pub fn profile_for(domain: &str) -> Option<&'static DomainProfile> {
    let lower = domain.to_ascii_lowercase();
    DOMAIN_PROFILES
        .iter()
        .find(|p| p.aliases.contains(&lower.as_str()))
        .or_else(|| {
            lower
                .split(['-', '_', '.'])
                .filter(|t| !t.is_empty())
                .find_map(|token| DOMAIN_PROFILES.iter().find(|p| p.aliases.contains(&token)))
        })
}

/// Tag used to key per-domain tables: the profile tag, or the lowercased name.
pub fn domain_tag(domain: &str) -> String {
    profile_for(domain)
        .map(|p| p.tag.to_string())
        .unwrap_or_else(|| domain.to_ascii_lowercase())
}

/// Alternate subdirectories for `domain` (empty for unknown domains).
pub fn known_subdirs(domain: &str) -> &'static [&'static str] {
    profile_for(domain).map(|p| p.subdirs).unwrap_or(&[])
}

/// Root file name keywords for `domain`; always includes the domain name itself.
pub fn root_keywords(domain: &str) -> Vec<String> {
    let mut keywords = vec![domain.to_ascii_lowercase()];
    if let Some(profile) = profile_for(domain) {
        for kw in profile.keywords {
            if !keywords.iter().any(|k| k == kw) {
                keywords.push(kw.to_string());
            }
        }
    }
    keywords
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_for_exact_alias() {
        assert_eq!(profile_for("k8s").map(|p| p.tag), Some("kubernetes"));
        assert_eq!(profile_for("GitHub").map(|p| p.tag), Some("github"));
    }

    #[test]
    fn test_profile_for_token_alias() {
        assert_eq!(profile_for("aws-network").map(|p| p.tag), Some("aws"));
        assert_eq!(profile_for("ci_gitlab").map(|p| p.tag), Some("gitlab"));
        assert!(profile_for("ansible").is_none());
    }

    #[test]
    fn test_domain_tag_falls_back_to_name() {
        assert_eq!(domain_tag("eks"), "kubernetes");
        assert_eq!(domain_tag("Ansible"), "ansible");
    }

    #[test]
    fn test_root_keywords_include_domain_name() {
        let kws = root_keywords("aws");
        assert_eq!(kws[0], "aws");
        assert!(kws.contains(&"cloudformation".to_string()));

        assert_eq!(root_keywords("ansible"), vec!["ansible".to_string()]);
    }

    #[test]
    fn test_known_subdirs() {
        assert!(known_subdirs("github").contains(&".github/workflows"));
        assert!(known_subdirs("unknown").is_empty());
    }
}
