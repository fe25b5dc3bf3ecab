//! springboard.yaml file types

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

/// Default base for convention-based repository URLs
pub const DEFAULT_REPOSITORY_BASE: &str = "https://github.com/wikimedia";

/// Branch used when neither the request, the config nor the host version names one
pub const FALLBACK_BRANCH: &str = "master";

/// Parsed springboard.yaml
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SpringboardConfigFile {
    /// Host application install root
    pub host_root: Utf8PathBuf,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions_dir: Option<Utf8PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skins_dir: Option<Utf8PathBuf>,

    /// Tool-owned loader file holding the load directives
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manifest_path: Option<Utf8PathBuf>,

    /// Host version, e.g. "1.43.1"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_version: Option<String>,

    /// Explicit default source branch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_branch: Option<String>,

    #[serde(default = "default_repository_base")]
    pub repository_base: String,

    #[serde(default)]
    pub directive_style: DirectiveStyle,

    #[serde(default)]
    pub registry: RegistryConfig,

    #[serde(default)]
    pub tools: ToolsConfig,

    /// Host schema migration script
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub migration_script: Option<Utf8PathBuf>,
}

impl SpringboardConfigFile {
    /// Config with every optional field at its default
    pub fn for_host_root(host_root: impl Into<Utf8PathBuf>) -> Self {
        Self {
            host_root: host_root.into(),
            extensions_dir: None,
            skins_dir: None,
            manifest_path: None,
            host_version: None,
            release_branch: None,
            repository_base: default_repository_base(),
            directive_style: DirectiveStyle::default(),
            registry: RegistryConfig::default(),
            tools: ToolsConfig::default(),
            migration_script: None,
        }
    }
}

fn default_repository_base() -> String {
    DEFAULT_REPOSITORY_BASE.to_string()
}

/// Shape of the load directives written to the manifest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DirectiveStyle {
    /// `wfLoadExtension( 'Name' );`
    #[default]
    Short,
    /// `wfLoadExtension( 'Name', '<dir>/Name/extension.json' );`
    ExplicitPath,
}

/// Where the host's live module table is read from
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegistryConfig {
    /// JSON file with the active module names
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<Utf8PathBuf>,

    /// Command printing the active module names as JSON
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub command: Vec<String>,
}

/// External program names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolsConfig {
    #[serde(default = "default_git")]
    pub git: String,

    #[serde(default = "default_composer")]
    pub composer: String,

    #[serde(default = "default_php")]
    pub php: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            git: default_git(),
            composer: default_composer(),
            php: default_php(),
        }
    }
}

fn default_git() -> String {
    "git".to_string()
}

fn default_composer() -> String {
    "composer".to_string()
}

fn default_php() -> String {
    "php".to_string()
}
