//! Component lifecycle management for Springboard
//!
//! This crate handles:
//! - The tool-owned manifest of load directives (locked, atomic rewrite)
//! - Component path building and source-tree removal
//! - The host registry view (which modules are active right now)
//! - Source retrieval via git plus best-effort post-install steps
//! - Status resolution across manifest, filesystem and registry
//! - Guarded install/uninstall orchestration with structured reports

pub mod directive;
pub mod error;
pub mod fetcher;
pub mod manifest;
pub mod orchestrator;
pub mod paths;
pub mod process;
pub mod registry;
pub mod report;
pub mod resolver;

pub use directive::DirectiveRenderer;
pub use error::{LifecycleError, Result};
pub use fetcher::{FetchOutcome, FetchSettings, SourceFetcher};
pub use manifest::{ManifestStore, MANIFEST_HEADER};
pub use orchestrator::{LifecycleOrchestrator, LifecycleRequest};
pub use paths::{ComponentName, ComponentPaths};
pub use process::{CommandSpec, ProcessOutput, ProcessRunner, SystemProcessRunner};
pub use registry::{HostRegistry, RegistryAdapter};
pub use report::{BatchEntry, BatchReport, Outcome, RequestReport, StepWarning, WarningKind};
pub use resolver::{classify, Resolution, StatusResolver};
