// SPDX-FileCopyrightText: 2026 Docsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lifecycle hooks exposed to the external dispatcher.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::runtime::Handle;

use crate::error::DocsyncError;

/// A `dependent` component that requires `dependency` to be running first.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Dependency {
    pub dependent: String,
    pub dependency: String,
}

impl Dependency {
    pub fn new(dependent: impl Into<String>, dependency: impl Into<String>) -> Self {
        Self {
            dependent: dependent.into(),
            dependency: dependency.into(),
        }
    }
}

/// A component whose lifecycle is driven by the dispatcher.
///
/// Sequence: `attach` → `start` → (items) → `join` → `detach`. Loop attachment
/// and liveness are managed independently.
#[async_trait]
pub trait Component: Send + Sync {
    /// Identity used for dependency wiring and as the producer on `send`.
    fn name(&self) -> &str;

    /// Bind the component to the running event loop.
    fn attach(&self, handle: Handle);

    /// Release the event-loop binding.
    fn detach(&self);

    /// Bring the component up. Dependencies are already started.
    async fn start(&self) -> Result<(), DocsyncError>;

    /// Shut the component down. Dependents are already joined.
    async fn join(&self) -> Result<(), DocsyncError>;

    /// Components this one must start after and stop before.
    fn dependencies(&self) -> Vec<Dependency> {
        Vec::new()
    }
}

/// Order component names so that every dependency precedes its dependents.
///
/// Components without ordering constraints keep their input order. Shutdown
/// should walk the result in reverse. Duplicate or unknown names and
/// dependency cycles are rejected.
pub fn startup_order(
    names: &[&str],
    dependencies: &[Dependency],
) -> Result<Vec<String>, DocsyncError> {
    let mut known: HashSet<&str> = HashSet::with_capacity(names.len());
    for name in names {
        if !known.insert(*name) {
            return Err(DocsyncError::misuse(format!(
                "component `{name}` is listed more than once"
            )));
        }
    }
    let mut pending: HashMap<&str, usize> = names.iter().map(|n| (*n, 0)).collect();
    let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();

    for dep in dependencies {
        for name in [dep.dependent.as_str(), dep.dependency.as_str()] {
            if !known.contains(name) {
                return Err(DocsyncError::misuse(format!(
                    "dependency references unknown component `{name}`"
                )));
            }
        }
        if let Some(count) = pending.get_mut(dep.dependent.as_str()) {
            *count += 1;
        }
        dependents
            .entry(dep.dependency.as_str())
            .or_default()
            .push(dep.dependent.as_str());
    }

    let mut order = Vec::with_capacity(names.len());
    let mut placed: HashSet<&str> = HashSet::new();
    while order.len() < names.len() {
        let next = names
            .iter()
            .copied()
            .find(|n| !placed.contains(n) && pending.get(n) == Some(&0))
            .ok_or_else(|| {
                let stuck: Vec<&str> = names
                    .iter()
                    .copied()
                    .filter(|n| !placed.contains(n))
                    .collect();
                DocsyncError::misuse(format!(
                    "dependency cycle among components: {}",
                    stuck.join(", ")
                ))
            })?;
        placed.insert(next);
        order.push(next.to_string());
        for dependent in dependents.get(next).into_iter().flatten() {
            if let Some(count) = pending.get_mut(dependent) {
                *count -= 1;
            }
        }
    }

    Ok(order)
}
