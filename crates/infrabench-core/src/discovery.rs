//! Locating a domain's files in a generated results tree.
//!
//! Three sources are merged and de-duplicated by absolute path:
//! 1. `<results>/<domain>/**`
//! 2. `<results>/<alt>/**` for each well-known alternate subdirectory
//! 3. files directly under `<results>` whose lowercase name contains a
//!    domain keyword

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{Result, VerifyError};
use crate::heuristics::{known_subdirs, root_keywords};

/// Time budget for file-system walks. Unbounded by default.
#[derive(Debug, Clone, Copy, Default)]
pub struct WalkBudget {
    deadline: Option<Instant>,
}

impl WalkBudget {
    pub fn unbounded() -> Self {
        Self { deadline: None }
    }

    /// Budget expiring `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            deadline: Some(Instant::now() + timeout),
        }
    }

    pub fn from_option(timeout: Option<Duration>) -> Self {
        timeout.map(Self::with_timeout).unwrap_or_default()
    }

    pub fn expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    fn check(&self, root: &Path) -> Result<()> {
        if self.expired() {
            return Err(VerifyError::WalkTimedOut {
                root: root.to_path_buf(),
            });
        }
        Ok(())
    }
}

/// Which discovery source produced a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DiscoverySource {
    DomainDir,
    KnownSubdir,
    RootKeyword,
}

/// A discovered file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredFile {
    pub path: PathBuf,
    /// Path relative to the results root.
    pub relative: PathBuf,
    pub source: DiscoverySource,
}

/// Compile glob patterns into one set.
pub fn compile_globset(globs: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for g in globs {
        builder.add(Glob::new(g)?);
    }
    Ok(builder.build()?)
}

/// Fail unless `results_dir` is an existing directory.
pub fn ensure_results_dir(results_dir: &Path) -> Result<()> {
    if results_dir.is_dir() {
        Ok(())
    } else {
        Err(VerifyError::ResultsDirMissing {
            path: results_dir.to_path_buf(),
        })
    }
}

/// Every regular file below `root`, sorted. Unreadable entries are skipped.
pub fn walk_files(root: &Path, budget: &WalkBudget) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(false) {
        budget.check(root)?;
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(root = %root.display(), error = %e, "skipping unreadable entry");
                continue;
            }
        };
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

/// Regular files directly inside `dir`, sorted.
fn root_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "skipping unreadable entry");
                continue;
            }
        };
        if entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

fn accepts(filter: Option<&GlobSet>, relative: &Path) -> bool {
    match filter {
        None => true,
        Some(set) => {
            set.is_match(relative)
                || relative
                    .file_name()
                    .map(|name| set.is_match(Path::new(name)))
                    .unwrap_or(false)
        }
    }
}

fn dedup_key(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

/// Discover the files belonging to `domain`, optionally filtered by globs.
///
/// A missing results root is an error, never an empty result.
pub fn discover_domain_files(
    results_dir: &Path,
    domain: &str,
    filter: Option<&GlobSet>,
    budget: &WalkBudget,
) -> Result<Vec<DiscoveredFile>> {
    ensure_results_dir(results_dir)?;

    // keyed by canonical path; first source to see a file wins
    let mut found: BTreeMap<PathBuf, DiscoveredFile> = BTreeMap::new();
    let mut add = |path: PathBuf, source: DiscoverySource| {
        let relative = path
            .strip_prefix(results_dir)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| path.clone());
        if !accepts(filter, &relative) {
            return;
        }
        found.entry(dedup_key(&path)).or_insert(DiscoveredFile {
            path,
            relative,
            source,
        });
    };

    let domain_dir = results_dir.join(domain);
    if domain_dir.is_dir() {
        for path in walk_files(&domain_dir, budget)? {
            add(path, DiscoverySource::DomainDir);
        }
    }

    for subdir in known_subdirs(domain) {
        let dir = results_dir.join(subdir);
        if dir.is_dir() && dir != domain_dir {
            for path in walk_files(&dir, budget)? {
                add(path, DiscoverySource::KnownSubdir);
            }
        }
    }

    let keywords = root_keywords(domain);
    for path in root_files(results_dir)? {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        if keywords.iter().any(|kw| name.contains(kw.as_str())) {
            add(path, DiscoverySource::RootKeyword);
        }
    }

    let mut files: Vec<DiscoveredFile> = found.into_values().collect();
    files.sort_by(|a, b| a.relative.cmp(&b.relative));
    debug!(domain = %domain, count = files.len(), "discovered domain files");
    Ok(files)
}
