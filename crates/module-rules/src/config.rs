//! Project configuration (modules.toml)
//!
//! Locates the project root and describes where descriptors live.

use crate::descriptor::DESCRIPTOR_SUFFIX;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the project configuration file
pub const CONFIG_FILE: &str = "modules.toml";

/// Errors that can occur while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read modules.toml: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse modules.toml: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Validation error
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    workspace: WorkspaceConfig,
}

/// `[workspace]` table of modules.toml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct WorkspaceConfig {
    /// Directories (relative to the root) searched for descriptors
    #[serde(default = "default_source_dirs")]
    pub source_dirs: Vec<String>,

    /// Suffix identifying descriptor files
    #[serde(default = "default_descriptor_suffix")]
    pub descriptor_suffix: String,

    /// Build plan location (relative to the root)
    #[serde(default = "default_plan_file")]
    pub plan_file: String,
}

fn default_source_dirs() -> Vec<String> {
    vec!["Source".to_string()]
}

fn default_descriptor_suffix() -> String {
    DESCRIPTOR_SUFFIX.to_string()
}

fn default_plan_file() -> String {
    "modules.plan".to_string()
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            source_dirs: default_source_dirs(),
            descriptor_suffix: default_descriptor_suffix(),
            plan_file: default_plan_file(),
        }
    }
}

impl WorkspaceConfig {
    /// Load the configuration for a project root.
    ///
    /// A missing modules.toml yields the defaults.
    pub fn load(root: &Path) -> Result<Self, ConfigError> {
        let path = root.join(CONFIG_FILE);
        if !path.exists() {
            tracing::debug!(root = %root.display(), "no modules.toml, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path)?;
        Self::from_str(&content)
    }

    /// Parse configuration from the contents of modules.toml
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(content)?;
        file.workspace.validate()?;
        Ok(file.workspace)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.source_dirs.is_empty() {
            return Err(ConfigError::ValidationError(
                "source-dirs cannot be empty".to_string(),
            ));
        }

        for dir in &self.source_dirs {
            if Path::new(dir).is_absolute() {
                return Err(ConfigError::ValidationError(format!(
                    "source dir '{}' must be relative to the project root",
                    dir
                )));
            }
        }

        if self.descriptor_suffix.is_empty() {
            return Err(ConfigError::ValidationError(
                "descriptor-suffix cannot be empty".to_string(),
            ));
        }

        if self.plan_file.is_empty() {
            return Err(ConfigError::ValidationError(
                "plan-file cannot be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Absolute source directories for a root
    pub fn source_paths(&self, root: &Path) -> Vec<PathBuf> {
        self.source_dirs.iter().map(|d| root.join(d)).collect()
    }

    /// Absolute plan file path for a root
    pub fn plan_path(&self, root: &Path) -> PathBuf {
        root.join(&self.plan_file)
    }
}

/// Find the project root by looking for modules.toml upwards from `start_dir`
pub fn find_project_root(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir;

    loop {
        if current.join(CONFIG_FILE).exists() {
            return Some(current.to_path_buf());
        }

        current = current.parent()?;
    }
}
