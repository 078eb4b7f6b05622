//! Validator configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::checks::{CheckKind, CheckSet};
use crate::discovery::WalkBudget;
use crate::error::{Result, VerifyError};

/// Everything a validation run needs besides the scenario itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorConfig {
    /// Root of the generated tree.
    pub results_dir: PathBuf,
    /// Expected templates; structural comparison is skipped when absent.
    #[serde(default)]
    pub expected_dir: Option<PathBuf>,
    /// Captured outputs; switches cross-domain checks to exact resolution.
    #[serde(default)]
    pub manifest_path: Option<PathBuf>,
    /// Upper bound on the file walks of one run, in seconds.
    #[serde(default)]
    pub walk_timeout_secs: Option<u64>,
    #[serde(default)]
    pub checks: CheckSet,
}

impl ValidatorConfig {
    pub fn new(results_dir: impl Into<PathBuf>) -> Self {
        Self {
            results_dir: results_dir.into(),
            expected_dir: None,
            manifest_path: None,
            walk_timeout_secs: None,
            checks: CheckSet::standard(),
        }
    }

    pub fn with_expected_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.expected_dir = Some(dir.into());
        self
    }

    pub fn with_manifest(mut self, path: impl Into<PathBuf>) -> Self {
        self.manifest_path = Some(path.into());
        self
    }

    pub fn with_walk_timeout(mut self, timeout: Duration) -> Self {
        self.walk_timeout_secs = Some(timeout.as_secs().max(1));
        self
    }

    pub fn with_checks(mut self, checks: CheckSet) -> Self {
        self.checks = checks;
        self
    }

    /// Drop one check from the run.
    pub fn without_check(mut self, check: CheckKind) -> Self {
        self.checks = self.checks.without_check(check);
        self
    }

    pub fn walk_timeout(&self) -> Option<Duration> {
        self.walk_timeout_secs.map(Duration::from_secs)
    }

    /// A fresh budget; the clock starts when this is called.
    pub fn budget(&self) -> WalkBudget {
        WalkBudget::from_option(self.walk_timeout())
    }

    /// Read a YAML or JSON config file (by extension).
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let parsed = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => serde_json::from_str(&raw).map_err(|e| e.to_string()),
            _ => serde_yaml::from_str(&raw).map_err(|e| e.to_string()),
        };
        parsed.map_err(|reason| VerifyError::Parse {
            path: path.to_path_buf(),
            reason,
        })
    }
}
