//! Configuration file loading and parsing

use crate::error::{Error, Result};
use crate::types::{ComponentKind, DirectiveStyle, SpringboardConfigFile, FALLBACK_BRANCH};
use camino::{Utf8Path, Utf8PathBuf};
use semver::Version;
use std::fs;
use tracing::debug;

/// Configuration file names to search for
pub const CONFIG_FILE_NAMES: &[&str] = &["springboard.yaml", "springboard.yml"];

/// Loader file of the Springboard host extension, relative to the host root
const DEFAULT_MANIFEST_RELATIVE: &str = "extensions/Springboard/includes/CustomLoader.php";

/// Schema migration entry point, relative to the host root
const DEFAULT_MIGRATION_RELATIVE: &str = "maintenance/update.php";

/// Loaded and validated Springboard configuration
#[derive(Debug, Clone)]
pub struct SpringboardConfig {
    /// The parsed configuration
    pub config: SpringboardConfigFile,

    /// Path to the configuration file, if one was read
    pub config_path: Option<Utf8PathBuf>,

    /// Directory relative config paths are resolved against
    pub working_dir: Utf8PathBuf,
}

impl SpringboardConfig {
    /// Load configuration from the specified path or search for it
    pub fn load(path: Option<&Utf8Path>) -> Result<Self> {
        let (config_path, content) = if let Some(p) = path {
            let content = fs::read_to_string(p).map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    Error::config_not_found(p.as_str())
                } else {
                    Error::Io(e)
                }
            })?;
            (p.to_owned(), content)
        } else {
            Self::find_config()?
        };

        let working_dir = config_path
            .parent()
            .map(|p| p.to_owned())
            .unwrap_or_else(|| Utf8PathBuf::from("."));

        let config: SpringboardConfigFile = serde_yaml_ng::from_str(&content)?;
        debug!("Loaded configuration from {}", config_path);

        let loaded = Self {
            config,
            config_path: Some(config_path),
            working_dir,
        };
        loaded.validate()?;
        Ok(loaded)
    }

    /// Configuration with defaults for everything but the host root
    pub fn for_host_root(host_root: impl Into<Utf8PathBuf>) -> Result<Self> {
        let host_root = host_root.into();
        let working_dir = host_root.clone();
        let loaded = Self {
            config: SpringboardConfigFile::for_host_root(host_root),
            config_path: None,
            working_dir,
        };
        loaded.validate()?;
        Ok(loaded)
    }

    /// Find configuration file in current directory or parent directories
    fn find_config() -> Result<(Utf8PathBuf, String)> {
        let cwd = std::env::current_dir().map_err(Error::Io)?;
        let cwd = Utf8PathBuf::try_from(cwd)
            .map_err(|_| Error::invalid_config("Current directory path is not valid UTF-8"))?;

        let mut current = cwd.as_path();

        loop {
            for name in CONFIG_FILE_NAMES {
                let path = current.join(name);
                if path.exists() {
                    let content = fs::read_to_string(&path)?;
                    return Ok((path, content));
                }
            }

            match current.parent() {
                Some(parent) => current = parent,
                None => break,
            }
        }

        Err(Error::config_not_found(
            "springboard.yaml (searched current and parent directories)",
        ))
    }

    fn validate(&self) -> Result<()> {
        if self.config.host_root.as_str().trim().is_empty() {
            return Err(Error::invalid_config("host_root must not be empty"));
        }
        if self.config.registry.snapshot.is_some() && !self.config.registry.command.is_empty() {
            return Err(Error::invalid_config(
                "registry: set either `snapshot` or `command`, not both",
            ));
        }
        if self.config.repository_base.trim().is_empty() {
            return Err(Error::invalid_config("repository_base must not be empty"));
        }
        if let Some(version) = &self.config.host_version {
            release_branch_for_version(version)?;
        }
        Ok(())
    }

    /// Resolve a configured path against the config file's directory
    fn resolve(&self, path: &Utf8Path) -> Utf8PathBuf {
        if path.is_absolute() {
            path.to_owned()
        } else {
            self.working_dir.join(path)
        }
    }

    pub fn host_root(&self) -> Utf8PathBuf {
        self.resolve(&self.config.host_root)
    }

    pub fn extensions_dir(&self) -> Utf8PathBuf {
        match &self.config.extensions_dir {
            Some(dir) => self.resolve(dir),
            None => self.host_root().join(ComponentKind::Extension.dir_name()),
        }
    }

    pub fn skins_dir(&self) -> Utf8PathBuf {
        match &self.config.skins_dir {
            Some(dir) => self.resolve(dir),
            None => self.host_root().join(ComponentKind::Skin.dir_name()),
        }
    }

    pub fn manifest_path(&self) -> Utf8PathBuf {
        match &self.config.manifest_path {
            Some(path) => self.resolve(path),
            None => self.host_root().join(DEFAULT_MANIFEST_RELATIVE),
        }
    }

    pub fn migration_script(&self) -> Utf8PathBuf {
        match &self.config.migration_script {
            Some(path) => self.resolve(path),
            None => self.host_root().join(DEFAULT_MIGRATION_RELATIVE),
        }
    }

    /// Registry snapshot file, resolved
    pub fn registry_snapshot(&self) -> Option<Utf8PathBuf> {
        self.config
            .registry
            .snapshot
            .as_deref()
            .map(|p| self.resolve(p))
    }

    pub fn directive_style(&self) -> DirectiveStyle {
        self.config.directive_style
    }

    /// Branch fetched when a request names none
    ///
    /// Explicit `release_branch`, else derived from `host_version`, else "master".
    pub fn default_branch(&self) -> Result<String> {
        if let Some(branch) = self
            .config
            .release_branch
            .as_deref()
            .filter(|b| !b.trim().is_empty())
        {
            return Ok(branch.trim().to_string());
        }
        match &self.config.host_version {
            Some(version) => release_branch_for_version(version),
            None => Ok(FALLBACK_BRANCH.to_string()),
        }
    }

    /// Convention-based repository URL for a component
    pub fn default_repository(&self, kind: ComponentKind, name: &str) -> String {
        repository_url(&self.config.repository_base, kind, name)
    }
}

/// Convention-based repository URL: `<base>/<kind prefix><Name>`
pub fn repository_url(base: &str, kind: ComponentKind, name: &str) -> String {
    format!(
        "{}/{}{}",
        base.trim_end_matches('/'),
        kind.repository_prefix(),
        name
    )
}

/// Release branch for a host version: "1.43.1" -> "REL1_43"
///
/// Two-part versions ("1.43") and prerelease suffixes ("1.44.0-alpha") are accepted.
pub fn release_branch_for_version(version: &str) -> Result<String> {
    let trimmed = version.trim();
    let parsed = Version::parse(trimmed)
        .or_else(|_| Version::parse(&format!("{}.0", trimmed)))
        .map_err(|_| Error::invalid_version(trimmed))?;
    Ok(format!("REL{}_{}", parsed.major, parsed.minor))
}
