//! Module dependency graph
//!
//! Validates a registry (dangling names, cycles) and derives build orders
//! and visibility closures from it. Edges point from a module to the
//! modules it depends on; public and private dependencies are both edges.

use crate::descriptor::ModuleDescriptor;
use crate::registry::ModuleRegistry;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors reported while validating or ordering the graph
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GraphError {
    /// Requested module is not registered
    #[error("Module not found: {0}")]
    UnknownModule(String),

    /// Module lists itself as a dependency
    #[error("Module '{0}' depends on itself")]
    SelfDependency(String),

    /// Dependency name does not resolve to a registered module
    #[error("Module '{module}' depends on unknown module '{dependency}'")]
    UnresolvedDependency { module: String, dependency: String },

    /// Circular dependency detected; the path starts and ends on the same module
    #[error("Circular dependency detected: {}", .0.join(" -> "))]
    CircularDependency(Vec<String>),
}

/// A dependency entry that names no registered module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedDependency {
    pub module: String,
    pub dependency: String,
    /// Descriptor file of `module`, when it was loaded from disk
    pub source: Option<PathBuf>,
}

impl From<UnresolvedDependency> for GraphError {
    fn from(u: UnresolvedDependency) -> Self {
        GraphError::UnresolvedDependency {
            module: u.module,
            dependency: u.dependency,
        }
    }
}

/// Read-only graph view over a registry
#[derive(Debug, Clone, Copy)]
pub struct ModuleGraph<'a> {
    registry: &'a ModuleRegistry,
}

impl<'a> ModuleGraph<'a> {
    /// Create a graph over `registry`
    pub fn new(registry: &'a ModuleRegistry) -> Self {
        Self { registry }
    }

    /// Every dependency entry that does not resolve, in registry order
    pub fn unresolved(&self) -> Vec<UnresolvedDependency> {
        let mut missing = Vec::new();
        for desc in self.registry.iter() {
            for dep in desc.unique_dependencies() {
                if !self.registry.contains(dep) {
                    missing.push(UnresolvedDependency {
                        module: desc.name.clone(),
                        dependency: dep.to_string(),
                        source: self.registry.source_path(&desc.name).map(Path::to_path_buf),
                    });
                }
            }
        }
        missing
    }

    /// Validate the whole registry
    pub fn validate(&self) -> Result<(), GraphError> {
        let all: BTreeSet<&'a str> = self.registry.names().collect();
        self.validate_modules(&all)
    }

    /// Find one cycle of two or more modules in the whole registry, if any.
    ///
    /// Self edges are not followed; `validate` reports them separately.
    pub fn find_cycle(&self) -> Option<Vec<String>> {
        let all: BTreeSet<&'a str> = self.registry.names().collect();
        self.find_cycle_in(&all)
    }

    /// All modules, dependencies before dependents.
    ///
    /// Among modules that are ready at the same time, names are taken in
    /// lexical order so the result is stable.
    pub fn topological_order(&self) -> Result<Vec<&'a ModuleDescriptor>, GraphError> {
        let all: BTreeSet<&'a str> = self.registry.names().collect();
        self.order_modules(&all)
    }

    /// `target` and everything it depends on, dependencies first
    pub fn build_order(&self, target: &str) -> Result<Vec<&'a ModuleDescriptor>, GraphError> {
        let closure = self.dependency_closure(target)?;
        self.order_modules(&closure)
    }

    /// Modules visible to consumers of `name`: its public dependencies and,
    /// recursively, theirs. First occurrence order, no repeats.
    pub fn public_closure(&self, name: &str) -> Result<Vec<&'a str>, GraphError> {
        let desc = self.lookup(name)?;
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        seen.insert(desc.name.as_str());
        self.collect_public(desc, &mut seen, &mut out);
        Ok(out)
    }

    /// Modules `name` links against: direct public and private dependencies
    /// plus the public closure of each.
    pub fn link_closure(&self, name: &str) -> Result<Vec<&'a str>, GraphError> {
        let desc = self.lookup(name)?;
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        seen.insert(desc.name.as_str());
        for dep in desc.unique_dependencies() {
            if seen.insert(dep) {
                out.push(dep);
            }
            if let Some(dep_desc) = self.registry.get(dep) {
                self.collect_public(dep_desc, &mut seen, &mut out);
            }
        }
        Ok(out)
    }

    /// Modules that list `name` directly, in name order
    pub fn dependents(&self, name: &str) -> Result<Vec<&'a str>, GraphError> {
        self.lookup(name)?;
        Ok(self
            .registry
            .iter()
            .filter(|desc| desc.dependencies().any(|d| d == name))
            .map(|desc| desc.name.as_str())
            .collect())
    }

    fn lookup(&self, name: &str) -> Result<&'a ModuleDescriptor, GraphError> {
        self.registry
            .get(name)
            .ok_or_else(|| GraphError::UnknownModule(name.to_string()))
    }

    fn collect_public(
        &self,
        desc: &'a ModuleDescriptor,
        seen: &mut HashSet<&'a str>,
        out: &mut Vec<&'a str>,
    ) {
        for dep in &desc.public_dependencies {
            if !seen.insert(dep.as_str()) {
                continue;
            }
            out.push(dep.as_str());
            if let Some(dep_desc) = self.registry.get(dep) {
                self.collect_public(dep_desc, seen, out);
            }
        }
    }

    /// `target` plus every module reachable from it. Unresolved names are
    /// kept so validation reports them.
    pub fn dependency_closure(&self, target: &str) -> Result<BTreeSet<&'a str>, GraphError> {
        let root = self.lookup(target)?;
        let mut closure = BTreeSet::new();
        let mut stack = vec![root.name.as_str()];

        while let Some(name) = stack.pop() {
            if !closure.insert(name) {
                continue;
            }
            if let Some(desc) = self.registry.get(name) {
                stack.extend(desc.unique_dependencies());
            }
        }

        Ok(closure)
    }

    fn validate_modules(&self, names: &BTreeSet<&'a str>) -> Result<(), GraphError> {
        for &name in names {
            let desc = match self.registry.get(name) {
                Some(desc) => desc,
                None => continue,
            };

            for dep in desc.unique_dependencies() {
                if dep == name {
                    return Err(GraphError::SelfDependency(name.to_string()));
                }
                if !self.registry.contains(dep) {
                    return Err(GraphError::UnresolvedDependency {
                        module: name.to_string(),
                        dependency: dep.to_string(),
                    });
                }
            }
        }

        if let Some(cycle) = self.find_cycle_in(names) {
            return Err(GraphError::CircularDependency(cycle));
        }

        Ok(())
    }

    fn find_cycle_in(&self, names: &BTreeSet<&'a str>) -> Option<Vec<String>> {
        let mut visited = HashSet::new();
        let mut path = Vec::new();

        for &name in names {
            if !visited.contains(name) {
                if let Some(cycle) = self.visit(name, &mut visited, &mut path) {
                    return Some(cycle);
                }
            }
        }

        None
    }

    /// Depth-first search keeping the current path so a cycle can be reported whole
    fn visit(
        &self,
        name: &'a str,
        visited: &mut HashSet<&'a str>,
        path: &mut Vec<&'a str>,
    ) -> Option<Vec<String>> {
        visited.insert(name);
        path.push(name);

        if let Some(desc) = self.registry.get(name) {
            for dep in desc.unique_dependencies() {
                // self edges are reported as SelfDependency
                if dep == name {
                    continue;
                }
                if let Some(pos) = path.iter().position(|p| *p == dep) {
                    let mut cycle: Vec<String> = path[pos..].iter().map(|s| s.to_string()).collect();
                    cycle.push(dep.to_string());
                    return Some(cycle);
                }
                if !visited.contains(dep) {
                    if let Some(cycle) = self.visit(dep, visited, path) {
                        return Some(cycle);
                    }
                }
            }
        }

        path.pop();
        None
    }

    /// Kahn's algorithm over `names`, which must be closed under dependencies
    fn order_modules(
        &self,
        names: &BTreeSet<&'a str>,
    ) -> Result<Vec<&'a ModuleDescriptor>, GraphError> {
        self.validate_modules(names)?;

        let mut pending: HashMap<&'a str, usize> = HashMap::new();
        let mut dependents: HashMap<&'a str, Vec<&'a str>> = HashMap::new();
        let mut ready = BTreeSet::new();

        for &name in names {
            let desc = self.lookup(name)?;
            let deps = desc.unique_dependencies();
            if deps.is_empty() {
                ready.insert(name);
            }
            pending.insert(name, deps.len());
            for dep in deps {
                dependents.entry(dep).or_default().push(name);
            }
        }

        let mut order = Vec::with_capacity(names.len());
        while let Some(name) = ready.pop_first() {
            order.push(self.lookup(name)?);
            for &dependent in dependents.get(name).into_iter().flatten() {
                if let Some(count) = pending.get_mut(dependent) {
                    *count -= 1;
                    if *count == 0 {
                        ready.insert(dependent);
                    }
                }
            }
        }

        if order.len() != names.len() {
            let stuck: Vec<String> = names
                .iter()
                .filter(|n| pending.get(*n).is_some_and(|c| *c > 0))
                .map(|n| n.to_string())
                .collect();
            return Err(GraphError::CircularDependency(stuck));
        }

        tracing::debug!(modules = order.len(), "computed build order");
        Ok(order)
    }
}
