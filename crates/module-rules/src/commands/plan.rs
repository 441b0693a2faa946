//! `modrules plan` — write or check the build plan.

use crate::config::WorkspaceConfig;
use crate::graph::ModuleGraph;
use crate::plan::{BuildPlan, PlanError};
use crate::registry::ModuleRegistry;
use std::path::Path;

/// Compute a plan and write it to the configured plan file
pub fn write_plan(
    root: &Path,
    config: &WorkspaceConfig,
    registry: &ModuleRegistry,
    target: Option<&str>,
) -> Result<BuildPlan, PlanError> {
    let plan = BuildPlan::from_graph(&ModuleGraph::new(registry), target)?;
    let path = config.plan_path(root);
    plan.to_file(&path)?;

    tracing::info!(modules = plan.modules.len(), path = %path.display(), "wrote build plan");
    Ok(plan)
}

/// Modules that changed since the plan file was written.
///
/// Without a plan file every registered module is stale.
pub fn stale_against_plan(
    root: &Path,
    config: &WorkspaceConfig,
    registry: &ModuleRegistry,
) -> Result<Vec<String>, PlanError> {
    let path = config.plan_path(root);
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no build plan yet");
        return Ok(registry.names().map(String::from).collect());
    }

    let plan = BuildPlan::from_file(&path)?;
    Ok(plan.stale_modules(registry))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{ModuleDescriptor, PchUsageMode};

    #[test]
    fn test_write_then_check() {
        let temp = tempfile::tempdir().unwrap();
        let config = WorkspaceConfig::default();
        let reg = ModuleRegistry::from_descriptors([
            ModuleDescriptor::new("Core", PchUsageMode::Default),
            ModuleDescriptor::new("Engine", PchUsageMode::Default).with_public_dependencies(["Core"]),
        ])
        .unwrap();

        assert_eq!(
            stale_against_plan(temp.path(), &config, &reg).unwrap(),
            vec!["Core", "Engine"]
        );

        write_plan(temp.path(), &config, &reg, None).unwrap();
        assert!(temp.path().join("modules.plan").exists());
        assert!(stale_against_plan(temp.path(), &config, &reg)
            .unwrap()
            .is_empty());
    }
}
