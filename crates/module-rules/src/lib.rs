//! Build module rules
//!
//! This crate models the module descriptors of an engine build, including:
//! - Module descriptors (`<Name>.module.toml`): PCH policy and dependency lists
//! - A registry of descriptors keyed by unique name
//! - Dependency graph validation (dangling names, cycles)
//! - Build ordering and public/link visibility closures
//! - Checksummed build plans (modules.plan) for change detection
//! - Project configuration (modules.toml)

pub mod commands;
pub mod config;
pub mod descriptor;
pub mod graph;
pub mod plan;
pub mod registry;

pub use config::{find_project_root, ConfigError, WorkspaceConfig, CONFIG_FILE};
pub use descriptor::{DescriptorError, ModuleDescriptor, PchUsageMode, DESCRIPTOR_SUFFIX};
pub use graph::{GraphError, ModuleGraph, UnresolvedDependency};
pub use plan::{BuildPlan, PlanError, PlannedModule, PLAN_VERSION};
pub use registry::{is_valid_module_name, ModuleRegistry, RegistryError};
