//! `modrules check` — report every problem in a registry at once.

use crate::graph::{ModuleGraph, UnresolvedDependency};
use crate::registry::ModuleRegistry;
use std::fmt;

/// Outcome of checking a registry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckReport {
    /// Number of modules checked
    pub modules: usize,

    /// Modules listing themselves as a dependency
    pub self_dependencies: Vec<String>,

    /// Dependency entries naming no registered module
    pub unresolved: Vec<UnresolvedDependency>,

    /// First cycle found, if any
    pub cycle: Option<Vec<String>>,
}

impl CheckReport {
    /// True when the registry can be ordered
    pub fn is_ok(&self) -> bool {
        self.self_dependencies.is_empty() && self.unresolved.is_empty() && self.cycle.is_none()
    }

    /// Number of problems found
    pub fn problem_count(&self) -> usize {
        self.self_dependencies.len() + self.unresolved.len() + usize::from(self.cycle.is_some())
    }
}

impl fmt::Display for CheckReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for name in &self.self_dependencies {
            writeln!(f, "error: module '{}' depends on itself", name)?;
        }
        for u in &self.unresolved {
            write!(
                f,
                "error: module '{}' depends on unknown module '{}'",
                u.module, u.dependency
            )?;
            match &u.source {
                Some(path) => writeln!(f, " ({})", path.display())?,
                None => writeln!(f)?,
            }
        }
        if let Some(cycle) = &self.cycle {
            writeln!(f, "error: circular dependency: {}", cycle.join(" -> "))?;
        }
        if self.is_ok() {
            write!(f, "{} modules, no problems found", self.modules)
        } else {
            write!(
                f,
                "{} modules, {} problem(s) found",
                self.modules,
                self.problem_count()
            )
        }
    }
}

/// Check a registry for self dependencies, dangling names and cycles
pub fn check_registry(registry: &ModuleRegistry) -> CheckReport {
    let graph = ModuleGraph::new(registry);

    let self_dependencies = registry
        .iter()
        .filter(|desc| desc.dependencies().any(|d| d == desc.name))
        .map(|desc| desc.name.clone())
        .collect();

    CheckReport {
        modules: registry.len(),
        self_dependencies,
        unresolved: graph.unresolved(),
        cycle: graph.find_cycle(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{ModuleDescriptor, PchUsageMode};

    #[test]
    fn test_clean_registry() {
        let reg = ModuleRegistry::from_descriptors([
            ModuleDescriptor::new("Core", PchUsageMode::Default),
            ModuleDescriptor::new("Engine", PchUsageMode::Default).with_public_dependencies(["Core"]),
        ])
        .unwrap();

        let report = check_registry(&reg);
        assert!(report.is_ok());
        assert_eq!(report.to_string(), "2 modules, no problems found");
    }

    #[test]
    fn test_reports_all_unresolved() {
        let reg = ModuleRegistry::from_descriptors([
            ModuleDescriptor::new("Editor", PchUsageMode::Default)
                .with_public_dependencies(["Core", "UnrealEd"]),
            ModuleDescriptor::new("Self", PchUsageMode::Default).with_public_dependencies(["Self"]),
        ])
        .unwrap();

        let report = check_registry(&reg);
        assert!(!report.is_ok());
        assert_eq!(report.unresolved.len(), 2);
        assert_eq!(report.self_dependencies, vec!["Self"]);
        assert!(report.cycle.is_none());
        assert_eq!(report.problem_count(), 3);
    }

    #[test]
    fn test_self_dependency_and_separate_cycle_both_reported() {
        let reg = ModuleRegistry::from_descriptors([
            ModuleDescriptor::new("Aself", PchUsageMode::Default).with_public_dependencies(["Aself"]),
            ModuleDescriptor::new("B", PchUsageMode::Default).with_public_dependencies(["C"]),
            ModuleDescriptor::new("C", PchUsageMode::Default).with_public_dependencies(["B"]),
        ])
        .unwrap();

        let report = check_registry(&reg);
        assert_eq!(report.self_dependencies, vec!["Aself"]);
        assert_eq!(
            report.cycle,
            Some(vec!["B".to_string(), "C".to_string(), "B".to_string()])
        );
        assert_eq!(report.problem_count(), 2);
        assert!(report.to_string().contains("circular dependency: B -> C -> B"));
    }

    #[test]
    fn test_unresolved_shows_descriptor_path() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path().join("Source/Editor");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("Editor.module.toml"),
            "name = \"Editor\"\npublic-dependencies = [\"UnrealEd\"]\n",
        )
        .unwrap();

        let reg =
            ModuleRegistry::load(temp.path(), &crate::config::WorkspaceConfig::default()).unwrap();
        let report = check_registry(&reg);

        assert_eq!(report.unresolved.len(), 1);
        assert!(report.unresolved[0]
            .source
            .as_deref()
            .unwrap()
            .ends_with("Source/Editor/Editor.module.toml"));
        assert!(report.to_string().contains("Editor.module.toml)"));
    }
}
