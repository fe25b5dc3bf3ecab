//! Error types for springboard-lifecycle

use springboard_core::types::{ComponentKind, PostInstallStep};
use thiserror::Error;

/// Result type alias using springboard-lifecycle's Error type
pub type Result<T> = std::result::Result<T, LifecycleError>;

/// Lifecycle error types
#[derive(Error, Debug)]
pub enum LifecycleError {
    /// Component name is not a single safe path segment
    #[error("Invalid component name '{name}': {reason}")]
    PathValidation { name: String, reason: String },

    /// Install requested for a component the manifest already owns
    #[error("{kind} '{name}' is already installed")]
    AlreadyInstalled { kind: ComponentKind, name: String },

    /// Uninstall requested for a component the manifest does not own
    #[error("{kind} '{name}' is not installed")]
    NotInstalled { kind: ComponentKind, name: String },

    /// Component is active through a mechanism outside the manifest
    #[error("{kind} '{name}' is loaded elsewhere (not via the Springboard manifest); refusing to change it")]
    ConflictExternallyLoaded { kind: ComponentKind, name: String },

    /// Version-control operation failed; the manifest was left unchanged
    #[error("Failed to fetch {kind} '{name}': {message} (manifest unchanged)")]
    FetchFailed {
        kind: ComponentKind,
        name: String,
        message: String,
    },

    /// Dependency install or schema migration failed
    #[error("Post-install step {step} failed: {message}")]
    PostInstallStepFailed {
        step: PostInstallStep,
        message: String,
    },

    /// Read, write or lock failure on the manifest file
    #[error("Manifest I/O failed on {path}: {source}")]
    ManifestIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Source tree removal failed after the manifest entry was removed
    #[error("Removed '{name}' from the manifest, but deleting {path} failed: {source}")]
    CleanupFailed {
        name: String,
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Host registry snapshot could not be read
    #[error("Failed to read host registry: {message}")]
    Registry { message: String },

    /// External program not on PATH
    #[error("Required command not found: {command}")]
    ToolNotFound { command: String },

    /// External program could not be spawned or awaited
    #[error("Process execution failed: {0}")]
    Process(String),

    /// Configuration error from springboard-core
    #[error("Configuration error: {0}")]
    Config(#[from] springboard_core::Error),
}

impl LifecycleError {
    /// Create a path validation error
    pub fn path_validation(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::PathValidation {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create an already installed error
    pub fn already_installed(kind: ComponentKind, name: impl Into<String>) -> Self {
        Self::AlreadyInstalled {
            kind,
            name: name.into(),
        }
    }

    /// Create a not installed error
    pub fn not_installed(kind: ComponentKind, name: impl Into<String>) -> Self {
        Self::NotInstalled {
            kind,
            name: name.into(),
        }
    }

    /// Create an externally loaded conflict error
    pub fn conflict_externally_loaded(kind: ComponentKind, name: impl Into<String>) -> Self {
        Self::ConflictExternallyLoaded {
            kind,
            name: name.into(),
        }
    }

    /// Create a fetch failed error
    pub fn fetch_failed(
        kind: ComponentKind,
        name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::FetchFailed {
            kind,
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create a post-install step error
    pub fn post_install_failed(step: PostInstallStep, message: impl Into<String>) -> Self {
        Self::PostInstallStepFailed {
            step,
            message: message.into(),
        }
    }

    /// Create a manifest I/O error
    pub fn manifest_io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::ManifestIo {
            path: path.into(),
            source,
        }
    }

    /// Create a registry error
    pub fn registry(message: impl Into<String>) -> Self {
        Self::Registry {
            message: message.into(),
        }
    }

    /// Create a tool not found error
    pub fn tool_not_found(command: impl Into<String>) -> Self {
        Self::ToolNotFound {
            command: command.into(),
        }
    }

    /// Stable machine-readable identifier
    pub fn kind(&self) -> &'static str {
        match self {
            Self::PathValidation { .. } => "path-validation-failed",
            Self::AlreadyInstalled { .. } => "already-installed",
            Self::NotInstalled { .. } => "not-installed",
            Self::ConflictExternallyLoaded { .. } => "conflict-externally-loaded",
            Self::FetchFailed { .. } => "fetch-failed",
            Self::PostInstallStepFailed { .. } => "post-install-step-failed",
            Self::ManifestIo { .. } => "manifest-io-failed",
            Self::CleanupFailed { .. } => "cleanup-failed",
            Self::Registry { .. } => "registry-failed",
            Self::ToolNotFound { .. } => "tool-not-found",
            Self::Process(_) => "process-failed",
            Self::Config(_) => "config-invalid",
        }
    }

    /// Whether a manifest change had already been committed when this error occurred
    pub fn manifest_committed(&self) -> bool {
        matches!(self, Self::CleanupFailed { .. })
    }

    /// Guard rejections: the request was refused before any side effect
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::PathValidation { .. }
                | Self::AlreadyInstalled { .. }
                | Self::NotInstalled { .. }
                | Self::ConflictExternallyLoaded { .. }
        )
    }
}
