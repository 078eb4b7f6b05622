//! Captured resource outputs, keyed domain → resource → field.
//!
//! Serialized form (JSON or YAML):
//!
//! ```json
//! {"domains": {"aws": {"resources": {"vpc": {"type": "AWS::EC2::VPC",
//!   "outputs": {"vpc_id": "vpc-123"}}}, "files": ["aws/vpc.yaml"]}}}
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::error::{Result, VerifyError};

/// Outputs captured for one resource.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceOutput {
    #[serde(default, rename = "type")]
    pub resource_type: String,

    #[serde(default)]
    pub outputs: BTreeMap<String, Value>,
}

/// Everything captured for one domain.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DomainOutput {
    #[serde(default)]
    pub resources: BTreeMap<String, ResourceOutput>,

    #[serde(default)]
    pub files: Vec<PathBuf>,
}

/// Record of resource outputs per domain.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputManifest {
    #[serde(default)]
    pub domains: BTreeMap<String, DomainOutput>,
}

impl OutputManifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one output field, creating the domain and resource as needed.
    ///
    /// An empty `resource_type` leaves an existing type untouched.
    pub fn record_output(
        &mut self,
        domain: &str,
        resource: &str,
        resource_type: &str,
        field: &str,
        value: impl Into<Value>,
    ) {
        let entry = self
            .domains
            .entry(domain.to_string())
            .or_default()
            .resources
            .entry(resource.to_string())
            .or_default();
        if !resource_type.is_empty() {
            entry.resource_type = resource_type.to_string();
        }
        entry.outputs.insert(field.to_string(), value.into());
    }

    /// Register a resource with no outputs yet.
    pub fn record_resource(&mut self, domain: &str, resource: &str, resource_type: &str) {
        let entry = self
            .domains
            .entry(domain.to_string())
            .or_default()
            .resources
            .entry(resource.to_string())
            .or_default();
        entry.resource_type = resource_type.to_string();
    }

    /// Record a generated file for `domain`. Duplicates are ignored.
    pub fn record_file(&mut self, domain: &str, path: impl Into<PathBuf>) {
        let files = &mut self.domains.entry(domain.to_string()).or_default().files;
        let path = path.into();
        if !files.contains(&path) {
            files.push(path);
        }
    }

    pub fn domain(&self, name: &str) -> Option<&DomainOutput> {
        self.domains.get(name)
    }

    pub fn resource(&self, domain: &str, resource: &str) -> Option<&ResourceOutput> {
        self.domains.get(domain)?.resources.get(resource)
    }

    /// Drop a domain, returning what was recorded for it.
    pub fn remove_domain(&mut self, name: &str) -> Option<DomainOutput> {
        self.domains.remove(name)
    }

    /// Parse a manifest, choosing YAML for `.yaml`/`.yml` paths and JSON otherwise.
    pub fn from_str_for_path(raw: &str, path: &Path) -> Result<Self> {
        let parsed = if is_yaml_path(path) {
            serde_yaml::from_str(raw).map_err(|e| e.to_string())
        } else {
            serde_json::from_str(raw).map_err(|e| e.to_string())
        };
        parsed.map_err(|reason| VerifyError::Parse {
            path: path.to_path_buf(),
            reason,
        })
    }

    /// Load a manifest from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_str_for_path(&raw, path)
    }

    /// Persist as pretty JSON plus a `<path>.digest` sidecar.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_vec_pretty(self)?;
        std::fs::write(path, &json)?;
        std::fs::write(digest_path(path), content_digest(&json))?;
        Ok(())
    }

    /// Load a manifest written by [`OutputManifest::save`], verifying its digest.
    pub fn load_verified(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let expected = std::fs::read_to_string(digest_path(path))?;
        let actual = content_digest(&bytes);
        if expected.trim() != actual {
            return Err(VerifyError::DigestMismatch {
                expected: expected.trim().to_string(),
                actual,
            });
        }
        let raw = String::from_utf8_lossy(&bytes);
        Self::from_str_for_path(&raw, path)
    }

    /// Verified load when a digest sidecar sits next to `path`, plain load otherwise.
    pub fn open(path: &Path) -> Result<Self> {
        if digest_path(path).is_file() {
            Self::load_verified(path)
        } else {
            Self::load(path)
        }
    }
}

fn is_yaml_path(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}

fn digest_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".digest");
    PathBuf::from(name)
}

fn content_digest(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> OutputManifest {
        let mut manifest = OutputManifest::new();
        manifest.record_output("aws", "vpc", "AWS::EC2::VPC", "vpc_id", "vpc-123");
        manifest.record_output("aws", "s3", "AWS::S3::Bucket", "bucket_name", "artifacts");
        manifest.record_file("aws", "aws/vpc.yaml");
        manifest
    }

    #[test]
    fn test_record_output_builds_nested_entries() {
        let manifest = sample();
        let vpc = manifest.resource("aws", "vpc").expect("vpc resource");
        assert_eq!(vpc.resource_type, "AWS::EC2::VPC");
        assert_eq!(vpc.outputs["vpc_id"], json!("vpc-123"));
        assert_eq!(manifest.domain("aws").unwrap().files.len(), 1);
    }

    #[test]
    fn test_record_file_ignores_duplicates() {
        let mut manifest = sample();
        manifest.record_file("aws", "aws/vpc.yaml");
        assert_eq!(manifest.domain("aws").unwrap().files.len(), 1);
    }

    #[test]
    fn test_json_shape_uses_type_key() {
        let value = serde_json::to_value(sample()).unwrap();
        assert_eq!(
            value["domains"]["aws"]["resources"]["vpc"]["type"],
            json!("AWS::EC2::VPC")
        );
        assert_eq!(value["domains"]["aws"]["files"][0], json!("aws/vpc.yaml"));
    }

    #[test]
    fn test_parse_yaml_manifest() {
        let raw = r#"
domains:
  k8s:
    resources:
      cluster:
        type: eks
        outputs:
          endpoint: https://example.invalid
"#;
        let manifest = OutputManifest::from_str_for_path(raw, Path::new("outputs.yaml")).unwrap();
        let cluster = manifest.resource("k8s", "cluster").unwrap();
        assert_eq!(cluster.outputs["endpoint"], json!("https://example.invalid"));
        assert!(manifest.domain("k8s").unwrap().files.is_empty());
    }

    #[test]
    fn test_save_and_verified_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run").join("outputs.json");
        let manifest = sample();
        manifest.save(&path).unwrap();

        assert!(dir.path().join("run").join("outputs.json.digest").exists());
        let loaded = OutputManifest::load_verified(&path).unwrap();
        assert_eq!(loaded, manifest);
    }

    #[test]
    fn test_tampered_manifest_fails_digest_check() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("outputs.json");
        sample().save(&path).unwrap();

        let mut tampered = sample();
        tampered.record_output("aws", "vpc", "", "vpc_id", "vpc-999");
        std::fs::write(&path, serde_json::to_vec_pretty(&tampered).unwrap()).unwrap();

        assert!(matches!(
            OutputManifest::load_verified(&path),
            Err(VerifyError::DigestMismatch { .. })
        ));
    }

    #[test]
    fn test_open_without_sidecar_skips_verification() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("outputs.yaml");
        std::fs::write(&path, "domains: {}\n").unwrap();
        let manifest = OutputManifest::open(&path).unwrap();
        assert!(manifest.domains.is_empty());
    }

    #[test]
    fn test_invalid_json_reports_path() {
        let err = OutputManifest::from_str_for_path("{", Path::new("broken.json")).unwrap_err();
        assert!(err.to_string().contains("broken.json"));
    }
}
