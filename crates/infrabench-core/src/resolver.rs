//! Domain execution ordering.
//!
//! An edge `D depends_on E` means E must be generated before D. Ordering is
//! computed with Kahn's algorithm; the relative order of independent domains
//! is whatever the queue yields and callers must not rely on it.

use std::collections::{HashMap, VecDeque};

use tracing::debug;

use crate::error::{Result, VerifyError};
use crate::scenario::{Domain, ScenarioModel};

/// Return domain names so that every dependency precedes its dependents.
///
/// Fails fast with [`VerifyError::UnknownDependency`] when an edge names an
/// undeclared domain, and with [`VerifyError::CircularDependency`] when not
/// every domain could be scheduled.
pub fn resolve_order(domains: &[Domain]) -> Result<Vec<String>> {
    let declared: HashMap<&str, &Domain> = domains.iter().map(|d| (d.name.as_str(), d)).collect();

    for domain in domains {
        for dep in &domain.depends_on {
            if !declared.contains_key(dep.as_str()) {
                return Err(VerifyError::UnknownDependency {
                    domain: domain.name.clone(),
                    dependency: dep.clone(),
                });
            }
        }
    }

    // in-degree = number of dependencies still unscheduled
    let mut in_degree: HashMap<&str, usize> = domains
        .iter()
        .map(|d| (d.name.as_str(), d.depends_on.len()))
        .collect();

    let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();
    for domain in domains {
        for dep in &domain.depends_on {
            dependents
                .entry(dep.as_str())
                .or_default()
                .push(domain.name.as_str());
        }
    }

    let mut queue: VecDeque<&str> = domains
        .iter()
        .filter(|d| d.depends_on.is_empty())
        .map(|d| d.name.as_str())
        .collect();

    let mut sorted = Vec::with_capacity(domains.len());

    while let Some(name) = queue.pop_front() {
        sorted.push(name.to_string());
        for dependent in dependents.get(name).into_iter().flatten() {
            if let Some(deg) = in_degree.get_mut(dependent) {
                *deg -= 1;
                if *deg == 0 {
                    queue.push_back(*dependent);
                }
            }
        }
    }

    if sorted.len() < domains.len() {
        let mut unresolved: Vec<String> = in_degree
            .into_iter()
            .filter(|(_, deg)| *deg > 0)
            .map(|(name, _)| name.to_string())
            .collect();
        unresolved.sort();
        return Err(VerifyError::CircularDependency {
            domains: unresolved,
        });
    }

    debug!(order = ?sorted, "resolved domain order");
    Ok(sorted)
}

/// Resolve the execution order of a scenario's domains.
pub fn scenario_order(scenario: &ScenarioModel) -> Result<Vec<String>> {
    resolve_order(&scenario.domains)
}

/// Direct dependencies of `name`, sorted.
pub fn dependencies_of<'a>(scenario: &'a ScenarioModel, name: &str) -> Vec<&'a str> {
    scenario
        .domain(name)
        .map(|d| d.depends_on.iter().map(String::as_str).collect())
        .unwrap_or_default()
}

/// Domains that directly depend on `name`, in declaration order.
pub fn dependents_of<'a>(scenario: &'a ScenarioModel, name: &str) -> Vec<&'a str> {
    scenario
        .domains
        .iter()
        .filter(|d| d.depends_on.contains(name))
        .map(|d| d.name.as_str())
        .collect()
}
