//! Build plan (modules.plan)
//!
//! Records a build order together with a checksum of every descriptor, so a
//! later invocation can tell which modules need rebuilding.

use crate::descriptor::PchUsageMode;
use crate::graph::{GraphError, ModuleGraph};
use crate::registry::ModuleRegistry;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during plan operations
#[derive(Debug, Error)]
pub enum PlanError {
    /// Failed to read or write the plan file
    #[error("Failed to access plan file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse plan: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Failed to serialize the plan
    #[error("Failed to serialize plan: {0}")]
    SerializeError(#[from] toml::ser::Error),

    /// Graph could not be ordered
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// Validation error
    #[error("Invalid plan: {0}")]
    ValidationError(String),
}

/// Plan format version
pub const PLAN_VERSION: u32 = 1;

/// An ordered, checksummed build plan
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BuildPlan {
    /// Plan format version
    pub version: u32,

    /// Module the plan was computed for; `None` covers the whole registry
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,

    /// Modules in build order
    #[serde(default)]
    pub modules: Vec<PlannedModule>,
}

/// One step of a build plan
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct PlannedModule {
    /// Module name
    pub name: String,

    /// PCH policy at planning time
    pub pch_usage: PchUsageMode,

    /// Descriptor checksum (SHA-256, hex)
    pub checksum: String,

    /// Direct dependencies, repeats removed
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,
}

impl BuildPlan {
    /// Compute a plan for the whole graph or for one target
    pub fn from_graph(graph: &ModuleGraph<'_>, target: Option<&str>) -> Result<Self, PlanError> {
        let order = match target {
            Some(t) => graph.build_order(t)?,
            None => graph.topological_order()?,
        };

        let modules = order
            .into_iter()
            .map(|desc| PlannedModule {
                name: desc.name.clone(),
                pch_usage: desc.pch_usage,
                checksum: desc.checksum(),
                dependencies: desc.unique_dependencies().into_iter().map(String::from).collect(),
            })
            .collect();

        Ok(Self {
            version: PLAN_VERSION,
            target: target.map(String::from),
            modules,
        })
    }

    /// Parse a plan from a file
    pub fn from_file(path: &Path) -> Result<Self, PlanError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parse a plan from a string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, PlanError> {
        let plan: BuildPlan = toml::from_str(content)?;
        plan.validate()?;
        Ok(plan)
    }

    /// Validate the plan
    pub fn validate(&self) -> Result<(), PlanError> {
        // Check version
        if self.version != PLAN_VERSION {
            return Err(PlanError::ValidationError(format!(
                "Unsupported plan version: {} (expected {})",
                self.version, PLAN_VERSION
            )));
        }

        // Validate each module
        let mut earlier = HashSet::new();
        for module in &self.modules {
            if module.name.is_empty() {
                return Err(PlanError::ValidationError(
                    "Module name cannot be empty".to_string(),
                ));
            }

            if module.checksum.len() != 64 || !module.checksum.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(PlanError::ValidationError(format!(
                    "Module '{}' has invalid checksum (must be 64 hex characters)",
                    module.name
                )));
            }

            // Dependencies must be planned first
            for dep in &module.dependencies {
                if !earlier.contains(dep.as_str()) {
                    return Err(PlanError::ValidationError(format!(
                        "Module '{}' is planned before its dependency '{}'",
                        module.name, dep
                    )));
                }
            }

            if !earlier.insert(module.name.as_str()) {
                return Err(PlanError::ValidationError(format!(
                    "Module '{}' appears more than once",
                    module.name
                )));
            }
        }

        Ok(())
    }

    /// Write the plan to a file
    pub fn to_file(&self, path: &Path) -> Result<(), PlanError> {
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Get a planned module by name
    pub fn get_module(&self, name: &str) -> Option<&PlannedModule> {
        self.modules.iter().find(|m| m.name == name)
    }

    /// Module names in plan order
    pub fn module_names(&self) -> Vec<&str> {
        self.modules.iter().map(|m| m.name.as_str()).collect()
    }

    /// Modules that need rebuilding against the current registry.
    ///
    /// A planned module is stale when its descriptor is gone or changed, or
    /// when any of its planned dependencies is stale. Registered modules the
    /// plan does not cover are reported after the planned ones, in name
    /// order; for a targeted plan only those the target now reaches count.
    pub fn stale_modules(&self, registry: &ModuleRegistry) -> Vec<String> {
        let mut stale: Vec<String> = Vec::new();
        let mut stale_set: HashSet<&str> = HashSet::new();

        // Changed or removed descriptors, and everything downstream of them
        for module in &self.modules {
            let changed = match registry.get(&module.name) {
                Some(desc) => desc.checksum() != module.checksum,
                None => true,
            };
            let upstream = module
                .dependencies
                .iter()
                .any(|d| stale_set.contains(d.as_str()));

            if changed || upstream {
                stale_set.insert(module.name.as_str());
                stale.push(module.name.clone());
            }
        }

        // Modules the plan should cover today
        let covered: Vec<&str> = match &self.target {
            None => registry.names().collect(),
            Some(target) => ModuleGraph::new(registry)
                .dependency_closure(target)
                .map(|closure| {
                    closure
                        .into_iter()
                        .filter(|name| registry.contains(name))
                        .collect()
                })
                .unwrap_or_default(),
        };

        // New modules
        for name in covered {
            if self.get_module(name).is_none() {
                stale.push(name.to_string());
            }
        }

        stale
    }
}
