//! Module descriptors (`<Name>.module.toml`)
//!
//! A descriptor names one build module, selects its precompiled-header
//! policy and lists the modules it links against. Descriptors never
//! validate themselves; the registry and graph layers do.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// File suffix used for descriptor files on disk
pub const DESCRIPTOR_SUFFIX: &str = ".module.toml";

/// Errors that can occur while reading or writing a descriptor
#[derive(Debug, Error)]
pub enum DescriptorError {
    /// Failed to read or write the descriptor file
    #[error("Failed to access descriptor file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse descriptor: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Failed to serialize TOML
    #[error("Failed to serialize descriptor: {0}")]
    SerializeError(#[from] toml::ser::Error),

    /// PCH usage value not recognized
    #[error("Unknown PCH usage mode: {0}")]
    UnknownPchUsage(String),
}

/// Precompiled-header usage policy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PchUsageMode {
    /// Let the build pick its default policy
    #[default]
    #[serde(rename = "default", alias = "Default")]
    Default,

    /// Use a shared PCH when one is available
    #[serde(rename = "use-shared-pchs", alias = "UseSharedPCHs")]
    UseSharedPchs,

    /// Never use shared PCHs, only a private one
    #[serde(rename = "no-shared-pchs", alias = "NoSharedPCHs")]
    NoSharedPchs,

    /// Use an explicitly configured PCH, falling back to a shared one
    #[serde(rename = "use-explicit-or-shared-pchs", alias = "UseExplicitOrSharedPCHs")]
    UseExplicitOrSharedPchs,

    /// Disable PCHs for this module
    #[serde(rename = "no-pchs", alias = "NoPCHs")]
    NoPchs,
}

impl PchUsageMode {
    /// All modes, in declaration order
    pub const ALL: [PchUsageMode; 5] = [
        PchUsageMode::Default,
        PchUsageMode::UseSharedPchs,
        PchUsageMode::NoSharedPchs,
        PchUsageMode::UseExplicitOrSharedPchs,
        PchUsageMode::NoPchs,
    ];

    /// Canonical (file format) name
    pub fn as_str(&self) -> &'static str {
        match self {
            PchUsageMode::Default => "default",
            PchUsageMode::UseSharedPchs => "use-shared-pchs",
            PchUsageMode::NoSharedPchs => "no-shared-pchs",
            PchUsageMode::UseExplicitOrSharedPchs => "use-explicit-or-shared-pchs",
            PchUsageMode::NoPchs => "no-pchs",
        }
    }

    /// Engine spelling of the mode
    pub fn engine_name(&self) -> &'static str {
        match self {
            PchUsageMode::Default => "Default",
            PchUsageMode::UseSharedPchs => "UseSharedPCHs",
            PchUsageMode::NoSharedPchs => "NoSharedPCHs",
            PchUsageMode::UseExplicitOrSharedPchs => "UseExplicitOrSharedPCHs",
            PchUsageMode::NoPchs => "NoPCHs",
        }
    }
}

impl fmt::Display for PchUsageMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PchUsageMode {
    type Err = DescriptorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PchUsageMode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s || mode.engine_name() == s)
            .ok_or_else(|| DescriptorError::UnknownPchUsage(s.to_string()))
    }
}

/// A single build module
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct ModuleDescriptor {
    /// Module name (unique within a registry)
    pub name: String,

    /// Precompiled-header policy
    #[serde(default)]
    pub pch_usage: PchUsageMode,

    /// Modules linked against and re-exposed to dependents
    #[serde(default)]
    pub public_dependencies: Vec<String>,

    /// Modules linked against but not re-exposed
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub private_dependencies: Vec<String>,
}

/// On-disk shape of a descriptor, before the PCH value is checked
#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct DescriptorFile {
    name: String,
    #[serde(default)]
    pch_usage: Option<String>,
    #[serde(default)]
    public_dependencies: Vec<String>,
    #[serde(default)]
    private_dependencies: Vec<String>,
}

impl ModuleDescriptor {
    /// Create a descriptor with no dependencies
    pub fn new(name: impl Into<String>, pch_usage: PchUsageMode) -> Self {
        Self {
            name: name.into(),
            pch_usage,
            public_dependencies: Vec::new(),
            private_dependencies: Vec::new(),
        }
    }

    /// Append a public dependency. Order is kept and repeats are not removed.
    pub fn add_public_dependency(&mut self, module: impl Into<String>) {
        self.public_dependencies.push(module.into());
    }

    /// Append several public dependencies in order
    pub fn add_public_dependencies<I, S>(&mut self, modules: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.public_dependencies
            .extend(modules.into_iter().map(Into::into));
    }

    /// Append a private dependency. Order is kept and repeats are not removed.
    pub fn add_private_dependency(&mut self, module: impl Into<String>) {
        self.private_dependencies.push(module.into());
    }

    /// Append several private dependencies in order
    pub fn add_private_dependencies<I, S>(&mut self, modules: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.private_dependencies
            .extend(modules.into_iter().map(Into::into));
    }

    /// Builder form of [`add_public_dependencies`](Self::add_public_dependencies)
    pub fn with_public_dependencies<I, S>(mut self, modules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.add_public_dependencies(modules);
        self
    }

    /// Builder form of [`add_private_dependencies`](Self::add_private_dependencies)
    pub fn with_private_dependencies<I, S>(mut self, modules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.add_private_dependencies(modules);
        self
    }

    /// All direct dependencies (public first, then private), as declared
    pub fn dependencies(&self) -> impl Iterator<Item = &str> {
        self.public_dependencies
            .iter()
            .chain(self.private_dependencies.iter())
            .map(String::as_str)
    }

    /// Direct dependencies with repeats removed, first occurrence wins
    pub fn unique_dependencies(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.dependencies().filter(|d| seen.insert(*d)).collect()
    }

    /// Dependency names listed more than once across both lists
    pub fn repeated_dependencies(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        let mut repeated = Vec::new();
        for dep in self.dependencies() {
            if !seen.insert(dep) && !repeated.contains(&dep) {
                repeated.push(dep);
            }
        }
        repeated
    }

    /// Parse a descriptor from a file
    pub fn from_file(path: &Path) -> Result<Self, DescriptorError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parse a descriptor from a string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, DescriptorError> {
        let raw: DescriptorFile = toml::from_str(content)?;

        // Unknown PCH names are a DescriptorError, not a TOML error
        let pch_usage = match raw.pch_usage {
            Some(value) => value.parse()?,
            None => PchUsageMode::default(),
        };

        Ok(Self {
            name: raw.name,
            pch_usage,
            public_dependencies: raw.public_dependencies,
            private_dependencies: raw.private_dependencies,
        })
    }

    /// Render the descriptor in its declarative TOML form
    pub fn to_toml_string(&self) -> Result<String, DescriptorError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Write the descriptor to a file
    pub fn to_file(&self, path: &Path) -> Result<(), DescriptorError> {
        std::fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }

    /// File name this descriptor is stored under
    pub fn file_name(&self) -> String {
        format!("{}{}", self.name, DESCRIPTOR_SUFFIX)
    }

    /// SHA-256 (hex) over the descriptor's fields.
    ///
    /// Two descriptors hash equal exactly when they are equal, independent of
    /// how the source file was formatted.
    pub fn checksum(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.name.as_bytes());
        hasher.update([0u8]);
        hasher.update(self.pch_usage.as_str().as_bytes());
        for (tag, list) in [
            (b'+', &self.public_dependencies),
            (b'-', &self.private_dependencies),
        ] {
            for dep in list {
                hasher.update([0, tag]);
                hasher.update(dep.as_bytes());
            }
        }
        hex::encode(hasher.finalize())
    }
}
