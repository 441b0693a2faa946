//! Module registry
//!
//! The set of descriptors known to one build invocation, keyed by name.

use crate::config::{ConfigError, WorkspaceConfig};
use crate::descriptor::{DescriptorError, ModuleDescriptor};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while building a registry
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Two descriptors declare the same name
    #[error("Duplicate module name: {0}")]
    DuplicateModule(String),

    /// Name is empty or not an identifier
    #[error("Invalid module name: '{0}'. Must start with a letter or underscore and contain only alphanumeric characters and underscores")]
    InvalidName(String),

    /// Declared name differs from the descriptor's file name
    #[error("Module '{declared}' is declared in {}, expected {declared}{suffix}", path.display())]
    NameMismatch {
        path: PathBuf,
        declared: String,
        suffix: String,
    },

    /// A descriptor file could not be read or parsed
    #[error("{}: {source}", path.display())]
    Descriptor {
        path: PathBuf,
        #[source]
        source: DescriptorError,
    },

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Invalid search pattern
    #[error("Invalid search pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    /// Failed to walk a source directory
    #[error("Failed to scan source directory: {0}")]
    Glob(#[from] glob::GlobError),
}

/// Descriptors keyed by unique module name
#[derive(Debug, Clone, Default)]
pub struct ModuleRegistry {
    modules: BTreeMap<String, ModuleDescriptor>,
    sources: HashMap<String, PathBuf>,
}

impl ModuleRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from in-memory descriptors
    pub fn from_descriptors<I>(descriptors: I) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = ModuleDescriptor>,
    {
        let mut registry = Self::new();
        for desc in descriptors {
            registry.insert(desc)?;
        }
        Ok(registry)
    }

    /// Load every descriptor below the configured source directories of `root`
    pub fn load(root: &Path, config: &WorkspaceConfig) -> Result<Self, RegistryError> {
        config.validate()?;

        let mut registry = Self::new();
        for dir in config.source_paths(root) {
            if !dir.is_dir() {
                tracing::warn!(dir = %dir.display(), "source directory does not exist, skipping");
                continue;
            }

            let pattern = format!(
                "{}/**/*{}",
                glob::Pattern::escape(&dir.to_string_lossy()),
                glob::Pattern::escape(&config.descriptor_suffix)
            );
            for entry in glob::glob(&pattern)? {
                let path = entry?;
                registry.load_file(&path, &config.descriptor_suffix)?;
            }
        }

        tracing::info!(modules = registry.len(), root = %root.display(), "loaded module registry");
        Ok(registry)
    }

    /// Parse one descriptor file and insert it
    pub fn load_file(&mut self, path: &Path, suffix: &str) -> Result<(), RegistryError> {
        let desc = ModuleDescriptor::from_file(path).map_err(|source| RegistryError::Descriptor {
            path: path.to_path_buf(),
            source,
        })?;

        let stem = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| n.strip_suffix(suffix));
        if stem != Some(desc.name.as_str()) {
            return Err(RegistryError::NameMismatch {
                path: path.to_path_buf(),
                declared: desc.name,
                suffix: suffix.to_string(),
            });
        }

        tracing::debug!(module = %desc.name, path = %path.display(), "loaded descriptor");
        let name = desc.name.clone();
        self.insert(desc)?;
        self.sources.insert(name, path.to_path_buf());
        Ok(())
    }

    /// Add a descriptor. Fails on an invalid or already registered name.
    pub fn insert(&mut self, desc: ModuleDescriptor) -> Result<(), RegistryError> {
        if !is_valid_module_name(&desc.name) {
            return Err(RegistryError::InvalidName(desc.name));
        }

        if self.modules.contains_key(&desc.name) {
            return Err(RegistryError::DuplicateModule(desc.name));
        }

        for dep in desc.repeated_dependencies() {
            tracing::warn!(module = %desc.name, dependency = dep, "dependency listed more than once");
        }

        self.modules.insert(desc.name.clone(), desc);
        Ok(())
    }

    /// Look up a descriptor by name
    pub fn get(&self, name: &str) -> Option<&ModuleDescriptor> {
        self.modules.get(name)
    }

    /// Check whether a module is registered
    pub fn contains(&self, name: &str) -> bool {
        self.modules.contains_key(name)
    }

    /// File a descriptor was loaded from, if it came from disk
    pub fn source_path(&self, name: &str) -> Option<&Path> {
        self.sources.get(name).map(PathBuf::as_path)
    }

    /// Number of registered modules
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Descriptors in name order
    pub fn iter(&self) -> impl Iterator<Item = &ModuleDescriptor> {
        self.modules.values()
    }

    /// Module names in name order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().map(String::as_str)
    }
}

/// Identifier rule for module names
pub fn is_valid_module_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
