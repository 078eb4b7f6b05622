//! Cross-domain output references: `${domain.resource.outputs.field}`.
//!
//! [`CrossDomainRef`] values can only be obtained by parsing, so every value
//! in circulation denotes a syntactically valid reference.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::ReferenceError;
use crate::manifest::OutputManifest;
use crate::scenario::ScenarioModel;

fn exact_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\$\{([^.]+)\.([^.]+)\.outputs\.([^}]+)\}$").expect("valid reference regex")
    })
}

// Segments may not span another `${` or whitespace when scanning free text.
fn scan_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\$\{([^.{}$\s]+)\.([^.{}$\s]+)\.outputs\.([^}]+)\}")
            .expect("valid reference scan regex")
    })
}

/// A parsed cross-domain reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CrossDomainRef {
    domain: String,
    resource: String,
    field: String,
    raw: String,
}

impl CrossDomainRef {
    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    /// The exact string the reference was parsed from.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    fn from_captures(caps: &regex::Captures<'_>) -> Self {
        Self {
            domain: caps[1].to_string(),
            resource: caps[2].to_string(),
            field: caps[3].to_string(),
            raw: caps[0].to_string(),
        }
    }
}

impl fmt::Display for CrossDomainRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for CrossDomainRef {
    type Err = ReferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_ref(s)
    }
}

impl Serialize for CrossDomainRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for CrossDomainRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_ref(&raw).map_err(serde::de::Error::custom)
    }
}

/// Parse a single reference of the exact shape `${d.r.outputs.f}`.
pub fn parse_ref(text: &str) -> Result<CrossDomainRef, ReferenceError> {
    exact_pattern()
        .captures(text)
        .map(|caps| CrossDomainRef::from_captures(&caps))
        .ok_or_else(|| ReferenceError::InvalidSyntax {
            raw: text.to_string(),
        })
}

/// Every non-overlapping reference in `text`, in order of occurrence.
pub fn find_refs_in_string(text: &str) -> Vec<CrossDomainRef> {
    scan_pattern()
        .captures_iter(text)
        .map(|caps| CrossDomainRef::from_captures(&caps))
        .collect()
}

/// Look up `reference` in `manifest`.
pub fn resolve_ref<'m>(
    manifest: &'m OutputManifest,
    reference: &CrossDomainRef,
) -> Result<&'m Value, ReferenceError> {
    let domain = manifest
        .domains
        .get(reference.domain())
        .ok_or_else(|| ReferenceError::DomainNotFound {
            reference: reference.raw.clone(),
            domain: reference.domain.clone(),
        })?;

    let resource = domain
        .resources
        .get(reference.resource())
        .ok_or_else(|| ReferenceError::ResourceNotFound {
            reference: reference.raw.clone(),
            domain: reference.domain.clone(),
            resource: reference.resource.clone(),
        })?;

    if resource.outputs.is_empty() {
        return Err(ReferenceError::NoOutputs {
            reference: reference.raw.clone(),
            resource: reference.resource.clone(),
        });
    }

    resource
        .outputs
        .get(reference.field())
        .ok_or_else(|| ReferenceError::FieldNotFound {
            reference: reference.raw.clone(),
            resource: reference.resource.clone(),
            field: reference.field.clone(),
        })
}

/// Parse and resolve every required reference of every relationship.
///
/// Failures are accumulated, never short-circuited.
pub fn validate_refs(manifest: &OutputManifest, scenario: &ScenarioModel) -> Vec<ReferenceError> {
    let mut errors = Vec::new();
    for rel in &scenario.cross_domain {
        for raw in rel.required_refs() {
            let outcome = parse_ref(raw).and_then(|r| resolve_ref(manifest, &r).map(|_| ()));
            if let Err(e) = outcome {
                errors.push(e);
            }
        }
    }
    errors
}
