//! InfraBench verification engine.
//!
//! Given a scenario and a tree of generated infrastructure files, decides
//! whether generation succeeded and produces a reproducible score.

pub mod checks;
pub mod compare;
pub mod config;
pub mod counts;
pub mod crossref;
pub mod discovery;
pub mod error;
pub mod heuristics;
pub mod manifest;
pub mod obs;
pub mod reference;
pub mod render;
pub mod report;
pub mod resolver;
pub mod scenario;
pub mod score;
pub mod telemetry;

pub use checks::{CheckContext, CheckKind, CheckOutcome, CheckRun, CheckSet};
pub use compare::{
    diff_values, Difference, DifferenceKind, FileComparisonResult, MatchStrategy,
    StructuralComparator, SIMILARITY_THRESHOLD,
};
pub use config::ValidatorConfig;
pub use counts::{CountFailure, ResourceCountResult, ResourceCountValidator};
pub use crossref::{validate_against_manifest, CrossDomainValidator, CrossRefResult, RefMatch};
pub use discovery::{discover_domain_files, DiscoveredFile, DiscoverySource, WalkBudget};
pub use error::{ReferenceError, Result, VerifyError};
pub use heuristics::PatternSet;
pub use manifest::{DomainOutput, OutputManifest, ResourceOutput};
pub use reference::{find_refs_in_string, parse_ref, resolve_ref, validate_refs, CrossDomainRef};
pub use render::{render_json, render_markdown, render_text, write_report, ReportFormat};
pub use report::{ValidationReport, Validator};
pub use resolver::{dependencies_of, dependents_of, resolve_order, scenario_order};
pub use scenario::{
    CountConstraint, CrossDomainRelationship, Domain, ResourceKind, ScenarioModel,
};
pub use score::{ScoreBreakdown, MAX_SCORE};
pub use telemetry::init_tracing;

/// Crate version, reported by the CLI.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
