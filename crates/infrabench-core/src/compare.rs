//! Structural comparison of generated artifacts against expected templates.
//!
//! Only shape is compared: missing keys, array length shortfalls and
//! composite type mismatches. Leaf values are never compared because
//! expected templates usually hold placeholders. A generated file that
//! exists passes regardless of differences; only a missing file fails.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::discovery::{ensure_results_dir, walk_files, WalkBudget};
use crate::error::{Result, VerifyError};

/// Minimum token overlap for a name-similarity match.
pub const SIMILARITY_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DifferenceKind {
    MissingKey,
    /// Informational only.
    ExtraKey,
    LengthMismatch,
    TypeMismatch,
}

/// One structural difference at a path such as `$.spec.containers[0]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Difference {
    pub path: String,
    pub kind: DifferenceKind,
    pub message: String,
}

impl Difference {
    /// Whether this is a real difference rather than an allowed extra.
    pub fn is_violation(&self) -> bool {
        self.kind != DifferenceKind::ExtraKey
    }
}

/// How the generated counterpart of an expected file was located.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    ExactPath,
    RootBaseName,
    NameSimilarity,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileComparisonResult {
    /// Expected template path, relative to the expected root.
    pub expected_file: PathBuf,
    /// Generated counterpart, relative to the results root.
    pub generated_file: Option<PathBuf>,
    pub matched_by: Option<MatchStrategy>,
    pub missing: bool,
    pub passed: bool,
    pub differences: Vec<Difference>,
    /// Parse failure that stopped the structural diff for this file.
    pub error: Option<String>,
}

impl FileComparisonResult {
    /// A failed result for an expected file with no generated counterpart.
    pub fn missing(expected_file: PathBuf) -> Self {
        Self {
            expected_file,
            generated_file: None,
            matched_by: None,
            missing: true,
            passed: false,
            differences: Vec::new(),
            error: None,
        }
    }

    pub fn violation_count(&self) -> usize {
        self.differences.iter().filter(|d| d.is_violation()).count()
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn is_composite(value: &Value) -> bool {
    matches!(value, Value::Array(_) | Value::Object(_))
}

/// Recursively diff `generated` against `expected`.
pub fn diff_values(expected: &Value, generated: &Value) -> Vec<Difference> {
    let mut out = Vec::new();
    diff_at("$", expected, generated, &mut out);
    out
}

fn diff_at(path: &str, expected: &Value, generated: &Value, out: &mut Vec<Difference>) {
    match (expected, generated) {
        (Value::Null, Value::Null) => {}
        (Value::Object(exp), Value::Object(got)) => {
            for (key, exp_child) in exp {
                let child = format!("{}.{}", path, key);
                match got.get(key) {
                    Some(got_child) => diff_at(&child, exp_child, got_child, out),
                    None => out.push(Difference {
                        message: format!("missing key '{}'", key),
                        path: child,
                        kind: DifferenceKind::MissingKey,
                    }),
                }
            }
            for key in got.keys().filter(|k| !exp.contains_key(*k)) {
                out.push(Difference {
                    path: format!("{}.{}", path, key),
                    kind: DifferenceKind::ExtraKey,
                    message: format!("extra key '{}' (allowed)", key),
                });
            }
        }
        (Value::Array(exp), Value::Array(got)) => {
            if got.len() < exp.len() {
                out.push(Difference {
                    path: path.to_string(),
                    kind: DifferenceKind::LengthMismatch,
                    message: format!(
                        "array has {} elements, expected at least {}",
                        got.len(),
                        exp.len()
                    ),
                });
            }
            for (i, (e, g)) in exp.iter().zip(got.iter()).enumerate() {
                diff_at(&format!("{}[{}]", path, i), e, g, out);
            }
        }
        (e, g) if is_composite(e) || is_composite(g) => out.push(Difference {
            path: path.to_string(),
            kind: DifferenceKind::TypeMismatch,
            message: format!("type mismatch: expected {}, got {}", type_name(e), type_name(g)),
        }),
        // leaf scalars are never compared
        _ => {}
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DocumentFormat {
    Yaml,
    Json,
}

fn document_format(path: &Path) -> Option<DocumentFormat> {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("yaml") | Some("yml") => Some(DocumentFormat::Yaml),
        Some("json") => Some(DocumentFormat::Json),
        _ => None,
    }
}

/// Parse a YAML or JSON document into a generic value tree.
///
/// Returns `Ok(None)` for extensions that are not structurally comparable.
pub fn parse_document(path: &Path) -> Result<Option<Value>> {
    let Some(format) = document_format(path) else {
        return Ok(None);
    };
    let raw = std::fs::read_to_string(path)?;
    let parsed = match format {
        DocumentFormat::Yaml => serde_yaml::from_str::<Value>(&raw).map_err(|e| e.to_string()),
        DocumentFormat::Json => serde_json::from_str::<Value>(&raw).map_err(|e| e.to_string()),
    };
    parsed.map(Some).map_err(|reason| VerifyError::Parse {
        path: path.to_path_buf(),
        reason,
    })
}

/// Lowercased tokens of the file stem split on `_`, `-` and `.`. The
/// extension is not a token.
pub fn name_tokens(name: &str) -> HashSet<String> {
    let stem = Path::new(name)
        .file_stem()
        .map(|s| s.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    stem.split(['_', '-', '.'])
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Share of the expected name's tokens present in the candidate name.
pub fn name_similarity(expected: &str, candidate: &str) -> f64 {
    let exp = name_tokens(expected);
    if exp.is_empty() {
        return 0.0;
    }
    let cand = name_tokens(candidate);
    exp.intersection(&cand).count() as f64 / exp.len() as f64
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Compares every file under an expected-template root with the results tree.
pub struct StructuralComparator<'a> {
    expected_dir: &'a Path,
    results_dir: &'a Path,
    budget: WalkBudget,
}

impl<'a> StructuralComparator<'a> {
    pub fn new(expected_dir: &'a Path, results_dir: &'a Path) -> Self {
        Self {
            expected_dir,
            results_dir,
            budget: WalkBudget::unbounded(),
        }
    }

    pub fn with_budget(mut self, budget: WalkBudget) -> Self {
        self.budget = budget;
        self
    }

    /// Locate the generated counterpart of `relative` (an expected-root path).
    fn locate(&self, relative: &Path, generated: &[PathBuf]) -> Option<(PathBuf, MatchStrategy)> {
        let exact = self.results_dir.join(relative);
        if exact.is_file() {
            return Some((exact, MatchStrategy::ExactPath));
        }

        let name = file_name(relative);
        let at_root = self.results_dir.join(&name);
        if at_root.is_file() {
            return Some((at_root, MatchStrategy::RootBaseName));
        }

        generated
            .iter()
            .map(|p| (p, name_similarity(&name, &file_name(p))))
            .filter(|(_, score)| *score >= SIMILARITY_THRESHOLD)
            .max_by(|(pa, sa), (pb, sb)| {
                sa.total_cmp(sb)
                    // prefer shallower, then lexically smaller paths
                    .then_with(|| pb.components().count().cmp(&pa.components().count()))
                    .then_with(|| pb.cmp(pa))
            })
            .map(|(p, _)| (p.clone(), MatchStrategy::NameSimilarity))
    }

    fn compare_file(&self, expected: &Path, generated: &[PathBuf]) -> FileComparisonResult {
        let relative = expected
            .strip_prefix(self.expected_dir)
            .unwrap_or(expected)
            .to_path_buf();

        let Some((found, strategy)) = self.locate(&relative, generated) else {
            debug!(expected = %relative.display(), "no generated counterpart");
            return FileComparisonResult::missing(relative);
        };

        let generated_rel = found
            .strip_prefix(self.results_dir)
            .unwrap_or(&found)
            .to_path_buf();

        let (differences, error) = match (parse_document(expected), parse_document(&found)) {
            (Ok(Some(exp)), Ok(Some(got))) => (diff_values(&exp, &got), None),
            (Ok(_), Ok(_)) => (Vec::new(), None),
            (Err(e), _) | (_, Err(e)) => {
                warn!(expected = %relative.display(), error = %e, "structural comparison skipped");
                (Vec::new(), Some(e.to_string()))
            }
        };

        FileComparisonResult {
            expected_file: relative,
            generated_file: Some(generated_rel),
            matched_by: Some(strategy),
            missing: false,
            passed: true,
            differences,
            error,
        }
    }

    /// Compare every expected file. A missing results root is an error.
    pub fn compare_all(&self) -> Result<Vec<FileComparisonResult>> {
        ensure_results_dir(self.results_dir)?;
        let expected_files = walk_files(self.expected_dir, &self.budget)?;
        let generated = walk_files(self.results_dir, &self.budget)?;

        let results: Vec<FileComparisonResult> = expected_files
            .iter()
            .map(|expected| self.compare_file(expected, &generated))
            .collect();

        info!(
            expected = results.len(),
            missing = results.iter().filter(|r| r.missing).count(),
            "structural comparison complete"
        );
        Ok(results)
    }

    /// Every expected file reported missing, for a results tree that could
    /// not be walked. The expected tree is walked without a deadline.
    pub fn all_missing(&self) -> Result<Vec<FileComparisonResult>> {
        let expected_files = walk_files(self.expected_dir, &WalkBudget::unbounded())?;
        Ok(expected_files
            .into_iter()
            .map(|expected| {
                let relative = expected
                    .strip_prefix(self.expected_dir)
                    .map(Path::to_path_buf)
                    .unwrap_or(expected);
                FileComparisonResult::missing(relative)
            })
            .collect())
    }
}
