//! Component identity, load directives and lifecycle states

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Kind of pluggable component managed by the host application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentKind {
    Extension,
    Skin,
}

impl ComponentKind {
    /// Lowercase identifier used on the command surface
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentKind::Extension => "extension",
            ComponentKind::Skin => "skin",
        }
    }

    /// Host loader function that activates a component of this kind
    pub fn loader_function(&self) -> &'static str {
        match self {
            ComponentKind::Extension => "wfLoadExtension",
            ComponentKind::Skin => "wfLoadSkin",
        }
    }

    /// Directory under the host root holding components of this kind
    pub fn dir_name(&self) -> &'static str {
        match self {
            ComponentKind::Extension => "extensions",
            ComponentKind::Skin => "skins",
        }
    }

    /// Descriptor file the host reads from the component directory
    pub fn descriptor_file(&self) -> &'static str {
        match self {
            ComponentKind::Extension => "extension.json",
            ComponentKind::Skin => "skin.json",
        }
    }

    /// Repository name prefix used by the convention-based URL
    pub fn repository_prefix(&self) -> &'static str {
        match self {
            ComponentKind::Extension => "mediawiki-extensions-",
            ComponentKind::Skin => "mediawiki-skins-",
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComponentKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "extension" | "extensions" => Ok(ComponentKind::Extension),
            "skin" | "skins" => Ok(ComponentKind::Skin),
            other => Err(Error::invalid_component_kind(other)),
        }
    }
}

/// Requested lifecycle transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleAction {
    Install,
    Uninstall,
}

impl fmt::Display for LifecycleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleAction::Install => write!(f, "install"),
            LifecycleAction::Uninstall => write!(f, "uninstall"),
        }
    }
}

impl FromStr for LifecycleAction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "install" => Ok(LifecycleAction::Install),
            "uninstall" => Ok(LifecycleAction::Uninstall),
            other => Err(Error::invalid_action(other)),
        }
    }
}

/// Optional action run after a successful install
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PostInstallStep {
    /// Dependency-manager install scoped to the component's own manifest
    DependencyInstall,
    /// Host schema migration entry point
    SchemaMigration,
}

impl fmt::Display for PostInstallStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PostInstallStep::DependencyInstall => write!(f, "dependency-install"),
            PostInstallStep::SchemaMigration => write!(f, "schema-migration"),
        }
    }
}

/// Lifecycle status derived from the filesystem, the manifest and the host registry.
///
/// Never persisted; recomputed on every query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LifecycleStatus {
    /// Not on disk, not in manifest, not active
    NotFound,
    /// In manifest but the host reports it inactive
    InstalledDisabled,
    /// In manifest and active
    Enabled,
    /// Active, but enabled by something other than the manifest
    LoadedElsewhere,
    /// On disk and in manifest but inactive where an enable was expected.
    ///
    /// Reserved for reporting; status resolution classifies every inactive
    /// manifest entry as `InstalledDisabled`.
    Conflict,
}

impl LifecycleStatus {
    /// Whether the manifest owns this component
    pub fn is_installed(&self) -> bool {
        matches!(
            self,
            LifecycleStatus::InstalledDisabled | LifecycleStatus::Enabled
        )
    }
}

impl fmt::Display for LifecycleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleStatus::NotFound => write!(f, "not-found"),
            LifecycleStatus::InstalledDisabled => write!(f, "installed-disabled"),
            LifecycleStatus::Enabled => write!(f, "enabled"),
            LifecycleStatus::LoadedElsewhere => write!(f, "loaded-elsewhere"),
            LifecycleStatus::Conflict => write!(f, "conflict"),
        }
    }
}

/// A single manifest line that makes the host activate a component.
///
/// Compared by exact string equality, never by parsed meaning, so that
/// hand edits to the manifest keep working.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LoadDirective(String);

impl LoadDirective {
    pub fn new(line: impl Into<String>) -> Self {
        Self(line.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LoadDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for LoadDirective {
    fn from(line: String) -> Self {
        Self(line)
    }
}

impl From<&str> for LoadDirective {
    fn from(line: &str) -> Self {
        Self(line.to_string())
    }
}

/// A component requested for install or uninstall
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    pub kind: ComponentKind,

    pub name: String,

    /// Source URL; the convention-based URL is used when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,

    /// Source branch; the host release branch is used when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,

    /// Pinned revision; empty or "HEAD" means latest fetched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,

    /// Code already present on disk; never fetched or deleted
    #[serde(default)]
    pub bundled: bool,

    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub post_install: BTreeSet<PostInstallStep>,
}

impl Component {
    pub fn new(kind: ComponentKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            repository: None,
            branch: None,
            commit: None,
            bundled: false,
            post_install: BTreeSet::new(),
        }
    }

    pub fn with_repository(mut self, repository: impl Into<String>) -> Self {
        self.repository = Some(repository.into());
        self
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    pub fn with_commit(mut self, commit: impl Into<String>) -> Self {
        self.commit = Some(commit.into());
        self
    }

    pub fn bundled(mut self, bundled: bool) -> Self {
        self.bundled = bundled;
        self
    }

    pub fn with_step(mut self, step: PostInstallStep) -> Self {
        self.post_install.insert(step);
        self
    }

    /// Commit to check out after cloning, if one is pinned
    pub fn pinned_commit(&self) -> Option<&str> {
        self.commit
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty() && *c != "HEAD")
    }

    /// Whether a post-install step was requested
    pub fn wants(&self, step: PostInstallStep) -> bool {
        self.post_install.contains(&step)
    }
}
