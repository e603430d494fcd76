//! Generator options and their optional TOML configuration file.
//!
//! ```toml
//! version_major = 1
//! version_minor = 0
//! include = "src/libmfxvplsw_caps.h"
//! banner = "/* generated, do not edit */"
//! ```

#[cfg(feature = "serde")]
use std::path::Path;

use thiserror::Error;

use crate::format::{DEFAULT_INCLUDE, STRUCT_VERSION_MAJOR, STRUCT_VERSION_MINOR};

/// Errors produced while loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[cfg(feature = "serde")]
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Options for rendering a capability table.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct GenOptions {
    /// Descriptor major version.
    pub version_major: u16,
    /// Descriptor minor version.
    pub version_minor: u16,
    /// Header named in the `#include` line.
    pub include: String,
    /// Text emitted verbatim at the very top (license block, "generated" notice).
    pub banner: Option<String>,
}

impl Default for GenOptions {
    fn default() -> Self {
        Self {
            version_major: STRUCT_VERSION_MAJOR,
            version_minor: STRUCT_VERSION_MINOR,
            include: DEFAULT_INCLUDE.to_string(),
            banner: None,
        }
    }
}

#[cfg(feature = "serde")]
impl GenOptions {
    /// Parse options from TOML text; missing keys keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Load options from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
}
