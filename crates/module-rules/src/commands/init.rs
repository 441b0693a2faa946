//! Module initialization command
//!
//! Creates `<source-dir>/<Name>/<Name>.module.toml`.

use crate::config::WorkspaceConfig;
use crate::descriptor::{DescriptorError, ModuleDescriptor};
use crate::registry::is_valid_module_name;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during module initialization
#[derive(Debug, Error)]
pub enum InitError {
    /// Descriptor already exists
    #[error("Module already exists: {0}")]
    AlreadyExists(PathBuf),

    /// Name is not a valid module name
    #[error("Invalid module name: '{0}'")]
    InvalidName(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Descriptor error
    #[error("Descriptor error: {0}")]
    DescriptorError(#[from] DescriptorError),
}

/// Write a new descriptor into the first configured source directory.
///
/// Returns the path of the created file.
pub fn init_module(
    root: &Path,
    config: &WorkspaceConfig,
    desc: &ModuleDescriptor,
) -> Result<PathBuf, InitError> {
    // Validate module name
    if !is_valid_module_name(&desc.name) {
        return Err(InitError::InvalidName(desc.name.clone()));
    }

    // Descriptors go into the first source directory
    let source_dir = config
        .source_paths(root)
        .into_iter()
        .next()
        .unwrap_or_else(|| root.to_path_buf());
    let module_dir = source_dir.join(&desc.name);
    let path = module_dir.join(format!("{}{}", desc.name, config.descriptor_suffix));

    // Check if module already exists
    if path.exists() {
        return Err(InitError::AlreadyExists(path));
    }

    // Create module directory and write descriptor
    fs::create_dir_all(&module_dir)?;
    desc.to_file(&path)?;

    tracing::info!(module = %desc.name, path = %path.display(), "created module descriptor");
    Ok(path)
}
