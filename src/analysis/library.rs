//! Component libraries
//!
//! A library is a YAML manifest that adds named components to a registry.
//! Every entry is an alias for an existing component of the same role,
//! optionally with preset options:
//!
//! ```text
//! dependencies: ["org.example:base:1.0"]
//! components:
//!   - role: tokenfilter
//!     name: shout
//!     target: uppercase
//!   - role: tokenfilter
//!     name: short
//!     target: length
//!     options: { max: 3 }
//! ```

use crate::analysis::error::ResolutionError;
use crate::analysis::registry::{ComponentRegistry, ComponentRole};
use crate::analysis::spec::{deserialize_options, ComponentOptions, ComponentSpec};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LibraryManifest {
    /// Coordinates of libraries this one builds on
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub components: Vec<ComponentAlias>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ComponentAlias {
    pub role: ComponentRole,
    pub name: String,
    pub target: String,
    #[serde(default, deserialize_with = "deserialize_options")]
    pub options: ComponentOptions,
}

impl LibraryManifest {
    /// Parse a manifest. A document with no content is an empty library.
    pub fn from_yaml_str(source: &str) -> Result<Self, serde_yaml::Error> {
        let blank = source.lines().all(|line| {
            let line = line.trim();
            line.is_empty() || line.starts_with('#')
        });
        if blank {
            return Ok(Self::default());
        }
        serde_yaml::from_str(source)
    }

    pub fn from_file(path: &Path) -> Result<Self, ResolutionError> {
        let source = fs::read_to_string(path).map_err(|e| ResolutionError::io(path, e))?;
        Self::from_yaml_str(&source).map_err(|e| ResolutionError::InvalidManifest {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Register every component as an alias.
    pub fn register(&self, registry: &mut ComponentRegistry) {
        for alias in &self.components {
            debug!(role = %alias.role, name = %alias.name, target = %alias.target, "registering alias");
            registry.register_alias(
                alias.role,
                &alias.name,
                ComponentSpec::new(alias.target.clone(), alias.options.clone()),
            );
        }
    }
}

/// Load libraries in order into `registry`. Later libraries win on name
/// clashes, so pass dependencies first.
pub fn load_libraries(
    registry: &mut ComponentRegistry,
    paths: &[PathBuf],
) -> Result<usize, ResolutionError> {
    let mut components = 0;
    for path in paths {
        let manifest = LibraryManifest::from_file(path)?;
        manifest.register(registry);
        info!(
            path = %path.display(),
            components = manifest.components.len(),
            "loaded component library"
        );
        components += manifest.components.len();
    }
    Ok(components)
}
