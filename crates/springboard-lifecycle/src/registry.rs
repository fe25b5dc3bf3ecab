//! Read-only view of the host's live module table

use crate::error::{LifecycleError, Result};
use crate::process::{CommandSpec, ProcessRunner};
use camino::Utf8Path;
use serde_json::Value;
use springboard_core::SpringboardConfig;
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Whether a module is active in the running host, regardless of who enabled it
pub trait RegistryAdapter: Send + Sync {
    fn is_active(&self, name: &str) -> bool;
}

/// Snapshot of the host's active module names
///
/// Names are matched case-insensitively with spaces ignored, so a display
/// name like "Page Forms" matches the `PageForms` directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostRegistry {
    active: BTreeSet<String>,
}

impl HostRegistry {
    /// Registry with nothing active
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            active: names.into_iter().map(|n| normalize(n.as_ref())).collect(),
        }
    }

    /// Parse a JSON snapshot: an array of names or an object keyed by name
    pub fn from_snapshot_json(content: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(content)
            .map_err(|e| LifecycleError::registry(format!("invalid JSON snapshot: {}", e)))?;

        match value {
            Value::Array(items) => {
                let names = items
                    .iter()
                    .map(|item| {
                        item.as_str().map(str::to_string).ok_or_else(|| {
                            LifecycleError::registry("snapshot array must contain only strings")
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(Self::from_names(names))
            }
            Value::Object(map) => Ok(Self::from_names(map.keys())),
            _ => Err(LifecycleError::registry(
                "snapshot must be a JSON array of names or an object keyed by name",
            )),
        }
    }

    pub fn from_snapshot_file(path: &Utf8Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| LifecycleError::registry(format!("{}: {}", path, e)))?;
        let registry = Self::from_snapshot_json(&content)?;
        debug!("Loaded {} active modules from {}", registry.len(), path);
        Ok(registry)
    }

    /// Run a command that prints the snapshot JSON on stdout
    pub async fn from_command(runner: &dyn ProcessRunner, argv: &[String]) -> Result<Self> {
        let spec = CommandSpec::from_argv(argv)
            .ok_or_else(|| LifecycleError::registry("registry command is empty"))?;
        let output = runner.run(&spec).await?;
        if !output.success() {
            return Err(LifecycleError::registry(format!(
                "`{}` failed: {}",
                spec,
                output.failure_message()
            )));
        }
        let registry = Self::from_snapshot_json(&output.stdout)?;
        debug!("Loaded {} active modules from `{}`", registry.len(), spec);
        Ok(registry)
    }

    /// Build from the configured source; no source means nothing is active
    pub async fn from_config(
        config: &SpringboardConfig,
        runner: &dyn ProcessRunner,
    ) -> Result<Self> {
        if let Some(snapshot) = config.registry_snapshot() {
            return Self::from_snapshot_file(&snapshot);
        }
        if !config.config.registry.command.is_empty() {
            return Self::from_command(runner, &config.config.registry.command).await;
        }
        info!("No host registry source configured; treating every module as inactive");
        Ok(Self::empty())
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}

impl RegistryAdapter for HostRegistry {
    fn is_active(&self, name: &str) -> bool {
        self.active.contains(&normalize(name))
    }
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| *c != ' ')
        .flat_map(char::to_lowercase)
        .collect()
}
