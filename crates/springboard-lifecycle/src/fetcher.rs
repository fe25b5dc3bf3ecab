//! Source retrieval and post-install steps
//!
//! Cloning runs through the injected [`ProcessRunner`]; the fetcher never
//! names a binary directly beyond the configured tool names.

use crate::error::{LifecycleError, Result};
use crate::paths::{ComponentName, ComponentPaths};
use crate::process::{CommandSpec, ProcessRunner};
use camino::Utf8PathBuf;
use springboard_core::config::repository_url;
use springboard_core::types::{Component, PostInstallStep};
use springboard_core::SpringboardConfig;
use std::sync::Arc;
use tracing::{info, warn};

/// Dependency manifest a component must ship for the dependency-install step
const DEPENDENCY_MANIFEST: &str = "composer.json";

/// Tool names and defaults the fetcher resolves requests against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchSettings {
    pub git: String,
    pub composer: String,
    pub php: String,
    /// Branch used when a request names none
    pub default_branch: String,
    pub repository_base: String,
    pub host_root: Utf8PathBuf,
    pub migration_script: Utf8PathBuf,
}

impl FetchSettings {
    pub fn from_config(config: &SpringboardConfig) -> Result<Self> {
        let tools = &config.config.tools;
        Ok(Self {
            git: tools.git.clone(),
            composer: tools.composer.clone(),
            php: tools.php.clone(),
            default_branch: config.default_branch()?,
            repository_base: config.config.repository_base.clone(),
            host_root: config.host_root(),
            migration_script: config.migration_script(),
        })
    }

    /// Explicit repository, else the convention-based URL
    pub fn repository_for(&self, component: &Component, name: &ComponentName) -> String {
        component
            .repository
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| repository_url(&self.repository_base, component.kind, name.as_str()))
    }

    /// Explicit branch, else the configured default
    pub fn branch_for(&self, component: &Component) -> String {
        component
            .branch
            .as_deref()
            .map(str::trim)
            .filter(|b| !b.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| self.default_branch.clone())
    }
}

/// What a successful fetch did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Code already present; nothing was fetched
    Bundled,
    /// Repository cloned into `target`
    Cloned {
        repository: String,
        branch: String,
        target: Utf8PathBuf,
        /// Set when the pinned commit could not be checked out; the clone is kept
        checkout_warning: Option<String>,
    },
}

/// Clones component sources and runs post-install steps
#[derive(Clone)]
pub struct SourceFetcher {
    runner: Arc<dyn ProcessRunner>,
    paths: ComponentPaths,
    settings: FetchSettings,
}

impl SourceFetcher {
    pub fn new(
        runner: Arc<dyn ProcessRunner>,
        paths: ComponentPaths,
        settings: FetchSettings,
    ) -> Self {
        Self {
            runner,
            paths,
            settings,
        }
    }

    pub fn from_config(config: &SpringboardConfig, runner: Arc<dyn ProcessRunner>) -> Result<Self> {
        Ok(Self::new(
            runner,
            ComponentPaths::from_config(config),
            FetchSettings::from_config(config)?,
        ))
    }

    pub fn settings(&self) -> &FetchSettings {
        &self.settings
    }

    pub fn paths(&self) -> &ComponentPaths {
        &self.paths
    }

    /// Retrieve a component's source tree
    ///
    /// Bundled components return immediately. Every failure before the clone
    /// completes is a `FetchFailed`; a partial clone is left in place.
    pub async fn fetch(&self, component: &Component, name: &ComponentName) -> Result<FetchOutcome> {
        if component.bundled {
            info!("{} '{}' is bundled, skipping fetch", component.kind, name);
            return Ok(FetchOutcome::Bundled);
        }

        let kind = component.kind;
        let fetch_err =
            |message: String| LifecycleError::fetch_failed(kind, name.as_str(), message);

        let repository = self.settings.repository_for(component, name);
        let branch = self.settings.branch_for(component);
        let target = self.paths.component_dir(kind, name);

        if branch.starts_with('-') {
            return Err(fetch_err(format!("refusing branch name '{}'", branch)));
        }
        if std::fs::symlink_metadata(&target).is_ok() {
            return Err(fetch_err(format!("target directory {} already exists", target)));
        }

        info!("Cloning {} ({}) into {}", repository, branch, target);
        let clone = CommandSpec::new(&self.settings.git)
            .args(["clone", "--branch", branch.as_str(), "--"])
            .arg(repository.as_str())
            .arg(target.as_str())
            .env("GIT_TERMINAL_PROMPT", "0");

        let output = self
            .runner
            .run(&clone)
            .await
            .map_err(|e| fetch_err(e.to_string()))?;
        if !output.success() {
            return Err(fetch_err(output.failure_message()));
        }

        let checkout_warning = match component.pinned_commit() {
            Some(commit) => self.checkout(&target, commit).await,
            None => None,
        };

        Ok(FetchOutcome::Cloned {
            repository,
            branch,
            target,
            checkout_warning,
        })
    }

    /// Check out a pinned commit; failures come back as a warning message
    async fn checkout(&self, target: &Utf8PathBuf, commit: &str) -> Option<String> {
        if commit.starts_with('-') {
            let message = format!("refusing commit '{}'", commit);
            warn!("{}", message);
            return Some(message);
        }

        info!("Checking out {} in {}", commit, target);
        let spec = CommandSpec::new(&self.settings.git)
            .args(["checkout", commit])
            .current_dir(target.clone())
            .env("GIT_TERMINAL_PROMPT", "0");

        let message = match self.runner.run(&spec).await {
            Ok(output) if output.success() => return None,
            Ok(output) => output.failure_message(),
            Err(e) => e.to_string(),
        };
        let message = format!("checkout of {} failed: {}", commit, message);
        warn!("{}", message);
        Some(message)
    }

    /// Install the component's own PHP dependencies
    pub async fn run_dependency_install(
        &self,
        component: &Component,
        name: &ComponentName,
    ) -> Result<()> {
        let step = PostInstallStep::DependencyInstall;
        let dir = self.paths.component_dir(component.kind, name);
        let manifest = dir.join(DEPENDENCY_MANIFEST);
        if !manifest.is_file() {
            return Err(LifecycleError::post_install_failed(
                step,
                format!("{} not found", manifest),
            ));
        }

        info!("Installing dependencies for {}", name);
        let spec = CommandSpec::new(&self.settings.composer)
            .args(["install", "--no-interaction", "--no-dev", "--working-dir"])
            .arg(dir.as_str())
            .current_dir(dir.clone());
        self.run_step(step, &spec).await
    }

    /// Run the host's schema migration entry point once
    pub async fn run_schema_migration(&self) -> Result<()> {
        let step = PostInstallStep::SchemaMigration;
        let script = &self.settings.migration_script;
        if !script.is_file() {
            return Err(LifecycleError::post_install_failed(
                step,
                format!("{} not found", script),
            ));
        }

        info!("Running schema migration {}", script);
        let spec = CommandSpec::new(&self.settings.php)
            .arg(script.as_str())
            .arg("--quick")
            .current_dir(self.settings.host_root.clone());
        self.run_step(step, &spec).await
    }

    async fn run_step(&self, step: PostInstallStep, spec: &CommandSpec) -> Result<()> {
        let output = self
            .runner
            .run(spec)
            .await
            .map_err(|e| LifecycleError::post_install_failed(step, e.to_string()))?;
        if output.success() {
            Ok(())
        } else {
            Err(LifecycleError::post_install_failed(
                step,
                output.failure_message(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::ProcessOutput;
    use async_trait::async_trait;
    use springboard_core::types::ComponentKind;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Records invocations and answers each with a fixed exit code
    struct Recorder {
        exit_code: i32,
        calls: Mutex<Vec<CommandSpec>>,
    }

    impl Recorder {
        fn new(exit_code: i32) -> Arc<Self> {
            Arc::new(Self {
                exit_code,
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<CommandSpec> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ProcessRunner for Recorder {
        async fn run(&self, spec: &CommandSpec) -> Result<ProcessOutput> {
            self.calls.lock().unwrap().push(spec.clone());
            Ok(ProcessOutput {
                exit_code: self.exit_code,
                stdout: String::new(),
                stderr: if self.exit_code == 0 {
                    String::new()
                } else {
                    "fatal: repository not found".to_string()
                },
            })
        }
    }

    fn setup(runner: Arc<Recorder>) -> (TempDir, SourceFetcher) {
        let temp = TempDir::new().unwrap();
        let root = Utf8PathBuf::try_from(temp.path().to_path_buf()).unwrap();
        let config = SpringboardConfig::for_host_root(root).unwrap();
        let fetcher = SourceFetcher::from_config(&config, runner).unwrap();
        (temp, fetcher)
    }

    #[tokio::test]
    async fn test_bundled_skips_runner() {
        let runner = Recorder::new(0);
        let (_temp, fetcher) = setup(runner.clone());
        let component = Component::new(ComponentKind::Extension, "Cite").bundled(true);
        let name = ComponentName::parse("Cite").unwrap();

        let outcome = fetcher.fetch(&component, &name).await.unwrap();
        assert_eq!(outcome, FetchOutcome::Bundled);
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn test_clone_uses_defaults() {
        let runner = Recorder::new(0);
        let (_temp, fetcher) = setup(runner.clone());
        let component = Component::new(ComponentKind::Skin, "Timeless");
        let name = ComponentName::parse("Timeless").unwrap();

        fetcher.fetch(&component, &name).await.unwrap();
        let calls = runner.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].program, "git");
        assert_eq!(
            &calls[0].args[..5],
            &[
                "clone",
                "--branch",
                "master",
                "--",
                "https://github.com/wikimedia/mediawiki-skins-Timeless"
            ]
        );
        assert!(calls[0].args[5].ends_with("skins/Timeless"));
    }

    #[tokio::test]
    async fn test_clone_failure_is_fetch_failed() {
        let runner = Recorder::new(128);
        let (_temp, fetcher) = setup(runner);
        let component = Component::new(ComponentKind::Extension, "Cite");
        let name = ComponentName::parse("Cite").unwrap();

        let err = fetcher.fetch(&component, &name).await.unwrap_err();
        match err {
            LifecycleError::FetchFailed { message, .. } => {
                assert_eq!(message, "fatal: repository not found")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_existing_target_fails_before_clone() {
        let runner = Recorder::new(0);
        let (_temp, fetcher) = setup(runner.clone());
        let name = ComponentName::parse("Cite").unwrap();
        std::fs::create_dir_all(fetcher.paths().component_dir(ComponentKind::Extension, &name))
            .unwrap();

        let err = fetcher
            .fetch(&Component::new(ComponentKind::Extension, "Cite"), &name)
            .await
            .unwrap_err();
        assert!(matches!(err, LifecycleError::FetchFailed { .. }));
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn test_option_like_commit_becomes_warning() {
        let runner = Recorder::new(0);
        let (_temp, fetcher) = setup(runner.clone());
        let component = Component::new(ComponentKind::Extension, "Cite").with_commit("--force");
        let name = ComponentName::parse("Cite").unwrap();

        match fetcher.fetch(&component, &name).await.unwrap() {
            FetchOutcome::Cloned {
                checkout_warning, ..
            } => assert!(checkout_warning.is_some()),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(runner.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_dependency_install_requires_manifest() {
        let runner = Recorder::new(0);
        let (_temp, fetcher) = setup(runner.clone());
        let component = Component::new(ComponentKind::Extension, "Cite");
        let name = ComponentName::parse("Cite").unwrap();

        let err = fetcher
            .run_dependency_install(&component, &name)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LifecycleError::PostInstallStepFailed {
                step: PostInstallStep::DependencyInstall,
                ..
            }
        ));
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn test_schema_migration_runs_script() {
        let runner = Recorder::new(0);
        let (_temp, fetcher) = setup(runner.clone());
        let script = fetcher.settings().migration_script.clone();
        std::fs::create_dir_all(script.parent().unwrap()).unwrap();
        std::fs::write(&script, "<?php\n").unwrap();

        fetcher.run_schema_migration().await.unwrap();
        let calls = runner.calls();
        assert_eq!(calls[0].program, "php");
        assert_eq!(calls[0].args, vec![script.to_string(), "--quick".to_string()]);
        assert_eq!(calls[0].cwd.as_ref(), Some(&fetcher.settings().host_root));
    }
}
