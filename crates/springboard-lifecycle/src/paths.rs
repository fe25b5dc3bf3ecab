//! Component path building and source-tree probing
//!
//! Every filesystem location for a component is derived here from a
//! [`ComponentName`], which can only be constructed from a single safe path
//! segment. Nothing else in the crate joins operator-supplied names onto
//! paths.

use crate::error::{LifecycleError, Result};
use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use springboard_core::types::ComponentKind;
use springboard_core::SpringboardConfig;
use std::fmt;
use tracing::{debug, info};
use walkdir::WalkDir;

/// Validated component name: one path segment, safe to embed in a directive
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ComponentName(String);

impl ComponentName {
    /// Validate an operator-supplied name
    ///
    /// Accepts ASCII letters, digits, `_`, `-` and `.`, starting with a letter
    /// or digit, with no `..` sequence.
    pub fn parse(name: &str) -> Result<Self> {
        if name.is_empty() {
            return Err(LifecycleError::path_validation(name, "name is empty"));
        }
        if name.contains(['/', '\\']) {
            return Err(LifecycleError::path_validation(
                name,
                "name contains a path separator",
            ));
        }
        if name.contains("..") {
            return Err(LifecycleError::path_validation(
                name,
                "name contains a parent-directory reference",
            ));
        }
        if let Some(c) = name
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')))
        {
            return Err(LifecycleError::path_validation(
                name,
                format!("character {:?} is not allowed", c),
            ));
        }
        if !name.starts_with(|c: char| c.is_ascii_alphanumeric()) {
            return Err(LifecycleError::path_validation(
                name,
                "name must start with a letter or digit",
            ));
        }

        let mut components = Utf8Path::new(name).components();
        match (components.next(), components.next()) {
            (Some(Utf8Component::Normal(_)), None) => Ok(Self(name.to_string())),
            _ => Err(LifecycleError::path_validation(
                name,
                "name is not a single path segment",
            )),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ComponentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ComponentName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Component roots and the directories derived from them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentPaths {
    extensions_dir: Utf8PathBuf,
    skins_dir: Utf8PathBuf,
}

impl ComponentPaths {
    pub fn new(extensions_dir: impl Into<Utf8PathBuf>, skins_dir: impl Into<Utf8PathBuf>) -> Self {
        Self {
            extensions_dir: extensions_dir.into(),
            skins_dir: skins_dir.into(),
        }
    }

    pub fn from_config(config: &SpringboardConfig) -> Self {
        Self::new(config.extensions_dir(), config.skins_dir())
    }

    /// Root directory for components of the given kind
    pub fn root(&self, kind: ComponentKind) -> &Utf8Path {
        match kind {
            ComponentKind::Extension => &self.extensions_dir,
            ComponentKind::Skin => &self.skins_dir,
        }
    }

    /// Expected source-tree location of a component
    pub fn component_dir(&self, kind: ComponentKind, name: &ComponentName) -> Utf8PathBuf {
        self.root(kind).join(name.as_str())
    }

    /// Whether the component's source tree is present
    pub fn exists(&self, kind: ComponentKind, name: &ComponentName) -> bool {
        self.component_dir(kind, name).exists()
    }

    /// Recursively delete a component's source tree, children before parents.
    ///
    /// A missing tree is not an error. A symlinked component directory is
    /// unlinked without touching its target.
    pub fn remove_tree(&self, kind: ComponentKind, name: &ComponentName) -> Result<()> {
        let root = self.root(kind);
        let target = self.component_dir(kind, name);
        self.ensure_contained(root, &target, name)?;

        let cleanup_err = |source: std::io::Error| LifecycleError::CleanupFailed {
            name: name.to_string(),
            path: target.to_string(),
            source,
        };

        let metadata = match std::fs::symlink_metadata(&target) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Nothing to remove at {}", target);
                return Ok(());
            }
            Err(e) => return Err(cleanup_err(e)),
        };

        if !metadata.is_dir() {
            info!("Unlinking {}", target);
            return std::fs::remove_file(&target).map_err(cleanup_err);
        }

        info!("Removing source tree {}", target);
        for entry in WalkDir::new(&target).follow_links(false).contents_first(true) {
            let entry = entry.map_err(|e| cleanup_err(e.into()))?;
            if entry.file_type().is_dir() {
                std::fs::remove_dir(entry.path()).map_err(cleanup_err)?;
            } else {
                std::fs::remove_file(entry.path()).map_err(cleanup_err)?;
            }
        }

        Ok(())
    }

    /// Refuse any target that is not a direct child of the component root
    fn ensure_contained(
        &self,
        root: &Utf8Path,
        target: &Utf8Path,
        name: &ComponentName,
    ) -> Result<()> {
        let contained = target
            .strip_prefix(root)
            .map(|rest| {
                let mut parts = rest.components();
                matches!(
                    (parts.next(), parts.next()),
                    (Some(Utf8Component::Normal(_)), None)
                )
            })
            .unwrap_or(false);

        if contained {
            Ok(())
        } else {
            Err(LifecycleError::path_validation(
                name.as_str(),
                format!("{} is outside {}", target, root),
            ))
        }
    }
}
