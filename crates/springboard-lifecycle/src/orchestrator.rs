//! Guarded install and uninstall transitions
//!
//! Every request follows the same sequence:
//! 1. Validate the name (no I/O before this succeeds)
//! 2. Take the manifest lock and resolve the current status
//! 3. Check the guards for the requested action
//! 4. Mutate the manifest, fetch or remove the source tree, commit
//! 5. Run requested post-install steps, downgrading failures to warnings

use crate::directive::DirectiveRenderer;
use crate::error::{LifecycleError, Result};
use crate::fetcher::{FetchOutcome, SourceFetcher};
use crate::manifest::ManifestStore;
use crate::paths::{ComponentName, ComponentPaths};
use crate::process::ProcessRunner;
use crate::registry::RegistryAdapter;
use crate::report::{BatchEntry, BatchReport, RequestReport, StepWarning};
use crate::resolver::{Resolution, StatusResolver};
use camino::{Utf8Path, Utf8PathBuf};
use springboard_core::types::{
    Component, ComponentKind, LifecycleAction, LifecycleStatus, PostInstallStep,
};
use springboard_core::SpringboardConfig;
use std::sync::Arc;
use tracing::{info, warn};

/// One requested transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleRequest {
    pub component: Component,
    pub action: LifecycleAction,
}

impl LifecycleRequest {
    pub fn install(component: Component) -> Self {
        Self {
            component,
            action: LifecycleAction::Install,
        }
    }

    pub fn uninstall(component: Component) -> Self {
        Self {
            component,
            action: LifecycleAction::Uninstall,
        }
    }
}

/// Public entry point for lifecycle transitions
#[derive(Clone)]
pub struct LifecycleOrchestrator {
    manifest_path: Utf8PathBuf,
    resolver: StatusResolver,
    fetcher: SourceFetcher,
}

impl LifecycleOrchestrator {
    pub fn new(
        manifest_path: impl Into<Utf8PathBuf>,
        resolver: StatusResolver,
        fetcher: SourceFetcher,
    ) -> Self {
        Self {
            manifest_path: manifest_path.into(),
            resolver,
            fetcher,
        }
    }

    pub fn from_config(
        config: &SpringboardConfig,
        registry: Arc<dyn RegistryAdapter>,
        runner: Arc<dyn ProcessRunner>,
    ) -> Result<Self> {
        let paths = ComponentPaths::from_config(config);
        let renderer = DirectiveRenderer::new(config.directive_style(), paths.clone());
        let resolver = StatusResolver::new(paths, renderer, registry);
        let fetcher = SourceFetcher::from_config(config, runner)?;
        Ok(Self::new(config.manifest_path(), resolver, fetcher))
    }

    pub fn manifest_path(&self) -> &Utf8Path {
        &self.manifest_path
    }

    pub fn resolver(&self) -> &StatusResolver {
        &self.resolver
    }

    /// Dispatch a request to install or uninstall
    pub async fn request(&self, request: &LifecycleRequest) -> Result<RequestReport> {
        match request.action {
            LifecycleAction::Install => self.install(&request.component).await,
            LifecycleAction::Uninstall => self.uninstall(&request.component).await,
        }
    }

    /// Install a component, running a requested schema migration immediately
    pub async fn install(&self, component: &Component) -> Result<RequestReport> {
        let (mut report, wants_migration) = self.install_one(component).await?;
        if wants_migration {
            if let Err(e) = self.fetcher.run_schema_migration().await {
                warn!("{}", e);
                report.warn(StepWarning::post_install(
                    PostInstallStep::SchemaMigration,
                    e.to_string(),
                ));
            }
        }
        Ok(report)
    }

    /// Install several components in order, migrating the schema at most once
    ///
    /// A failed entry does not stop the batch. The migration runs after the
    /// last entry if any successful install asked for it.
    pub async fn install_batch(&self, components: &[Component]) -> BatchReport {
        let mut batch = BatchReport::default();
        let mut wants_migration = false;

        for component in components {
            let result = match self.install_one(component).await {
                Ok((report, wants)) => {
                    wants_migration |= wants;
                    Ok(report)
                }
                Err(e) => {
                    warn!("Install of {} '{}' failed: {}", component.kind, component.name, e);
                    Err(e)
                }
            };
            batch.entries.push(BatchEntry {
                kind: component.kind,
                name: component.name.clone(),
                result,
            });
        }

        if wants_migration {
            batch.migration_ran = true;
            if let Err(e) = self.fetcher.run_schema_migration().await {
                warn!("{}", e);
                batch.migration_warning = Some(StepWarning::post_install(
                    PostInstallStep::SchemaMigration,
                    e.to_string(),
                ));
            }
        }

        info!(
            "Batch install finished: {} succeeded, {} failed",
            batch.succeeded(),
            batch.failed()
        );
        batch
    }

    /// Install without running the schema migration
    ///
    /// Returns whether the caller should run the migration.
    async fn install_one(&self, component: &Component) -> Result<(RequestReport, bool)> {
        let name = ComponentName::parse(&component.name)?;
        let kind = component.kind;

        let mut manifest = ManifestStore::open_locked(&self.manifest_path)?;
        let resolution = self.resolver.resolve(&manifest, kind, &name);
        match resolution.status {
            LifecycleStatus::Enabled
            | LifecycleStatus::InstalledDisabled
            | LifecycleStatus::Conflict => {
                return Err(LifecycleError::already_installed(kind, name.as_str()));
            }
            LifecycleStatus::LoadedElsewhere => {
                return Err(LifecycleError::conflict_externally_loaded(kind, name.as_str()));
            }
            LifecycleStatus::NotFound => {}
        }

        info!("Installing {} '{}'", kind, name);
        let mut report = RequestReport::new(
            LifecycleAction::Install,
            kind,
            name.as_str(),
            resolution.status,
        );
        manifest.add(resolution.directive.clone());

        // On failure the store is dropped uncommitted, so the file keeps its prior bytes
        match self.fetcher.fetch(component, &name).await {
            Ok(FetchOutcome::Cloned {
                checkout_warning: Some(message),
                ..
            }) => report.warn(StepWarning::checkout(message)),
            Ok(_) => {}
            Err(e) => {
                manifest.remove(&resolution.directive);
                warn!("Install of {} '{}' rolled back: {}", kind, name, e);
                return Err(e);
            }
        }

        manifest.commit()?;
        report.manifest_committed = true;
        report.directives = directive_lines(&manifest);
        drop(manifest);

        if component.wants(PostInstallStep::DependencyInstall) {
            if let Err(e) = self.fetcher.run_dependency_install(component, &name).await {
                warn!("{}", e);
                report.warn(StepWarning::post_install(
                    PostInstallStep::DependencyInstall,
                    e.to_string(),
                ));
            }
        }

        info!("Installed {} '{}'", kind, name);
        Ok((report, component.wants(PostInstallStep::SchemaMigration)))
    }

    /// Remove a component's directive, then its source tree unless bundled
    pub async fn uninstall(&self, component: &Component) -> Result<RequestReport> {
        let name = ComponentName::parse(&component.name)?;
        let kind = component.kind;

        let mut manifest = ManifestStore::open_locked(&self.manifest_path)?;
        let resolution = self.resolver.resolve(&manifest, kind, &name);
        match resolution.status {
            LifecycleStatus::LoadedElsewhere => {
                return Err(LifecycleError::conflict_externally_loaded(kind, name.as_str()));
            }
            LifecycleStatus::NotFound => {
                return Err(LifecycleError::not_installed(kind, name.as_str()));
            }
            _ => {}
        }

        info!("Uninstalling {} '{}'", kind, name);
        let mut report = RequestReport::new(
            LifecycleAction::Uninstall,
            kind,
            name.as_str(),
            resolution.status,
        );

        manifest.remove(&resolution.directive);
        manifest.commit()?;
        report.manifest_committed = true;
        report.directives = directive_lines(&manifest);

        if component.bundled {
            info!("{} '{}' is bundled, leaving its source tree", kind, name);
        } else {
            self.resolver.paths().remove_tree(kind, &name)?;
        }

        info!("Uninstalled {} '{}'", kind, name);
        Ok(report)
    }

    /// Resolve the status of named components without taking the lock
    pub fn status(&self, kind: ComponentKind, names: &[String]) -> Result<Vec<Resolution>> {
        let manifest = self.manifest()?;
        let names = names
            .iter()
            .map(|n| ComponentName::parse(n))
            .collect::<Result<Vec<_>>>()?;
        Ok(self
            .resolver
            .resolve_many(&manifest, names.iter().map(|n| (kind, n))))
    }

    /// Resolve every component of a kind the manifest currently loads
    pub fn status_of_manifest(&self, kind: ComponentKind) -> Result<Vec<Resolution>> {
        let manifest = self.manifest()?;
        let names: Vec<ComponentName> = manifest
            .directives()
            .iter()
            .filter_map(|d| DirectiveRenderer::component_name(kind, d))
            .filter_map(|n| match ComponentName::parse(&n) {
                Ok(name) => Some(name),
                Err(e) => {
                    warn!("Skipping manifest entry: {}", e);
                    None
                }
            })
            .collect();
        Ok(self
            .resolver
            .resolve_many(&manifest, names.iter().map(|n| (kind, n))))
    }

    /// Unlocked snapshot of the manifest
    pub fn manifest(&self) -> Result<ManifestStore> {
        ManifestStore::load(&self.manifest_path)
    }
}

fn directive_lines(manifest: &ManifestStore) -> Vec<String> {
    manifest
        .directives()
        .iter()
        .map(|d| d.as_str().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{CommandSpec, ProcessOutput};
    use crate::registry::HostRegistry;
    use async_trait::async_trait;
    use tempfile::TempDir;

    /// Succeeds at everything and creates the clone target
    struct CloningRunner;

    #[async_trait]
    impl ProcessRunner for CloningRunner {
        async fn run(&self, spec: &CommandSpec) -> Result<ProcessOutput> {
            if spec.args.first().map(String::as_str) == Some("clone") {
                if let Some(target) = spec.args.last() {
                    std::fs::create_dir_all(target).unwrap();
                }
            }
            Ok(ProcessOutput::default())
        }
    }

    fn orchestrator(temp: &TempDir, active: &[&str]) -> LifecycleOrchestrator {
        let root = Utf8PathBuf::try_from(temp.path().to_path_buf()).unwrap();
        let config = SpringboardConfig::for_host_root(root).unwrap();
        LifecycleOrchestrator::from_config(
            &config,
            Arc::new(HostRegistry::from_names(active.iter().copied())),
            Arc::new(CloningRunner),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_install_then_uninstall() {
        let temp = TempDir::new().unwrap();
        let orch = orchestrator(&temp, &[]);
        let cite = Component::new(ComponentKind::Extension, "Cite");

        let report = orch.install(&cite).await.unwrap();
        assert_eq!(report.status_before, LifecycleStatus::NotFound);
        assert!(report.manifest_committed);
        assert_eq!(report.directives, vec!["wfLoadExtension( 'Cite' );"]);

        let statuses = orch.status(ComponentKind::Extension, &["Cite".to_string()]).unwrap();
        assert_eq!(statuses[0].status, LifecycleStatus::InstalledDisabled);

        let report = orch.uninstall(&cite).await.unwrap();
        assert!(report.directives.is_empty());
        assert!(!orch.resolver().paths().exists(
            ComponentKind::Extension,
            &ComponentName::parse("Cite").unwrap()
        ));
    }

    #[tokio::test]
    async fn test_request_dispatch() {
        let temp = TempDir::new().unwrap();
        let orch = orchestrator(&temp, &[]);
        let skin = Component::new(ComponentKind::Skin, "Timeless").bundled(true);
        std::fs::create_dir_all(temp.path().join("skins/Timeless")).unwrap();

        let report = orch.request(&LifecycleRequest::install(skin.clone())).await.unwrap();
        assert_eq!(report.action, LifecycleAction::Install);
        let err = orch
            .request(&LifecycleRequest::install(skin))
            .await
            .unwrap_err();
        assert!(matches!(err, LifecycleError::AlreadyInstalled { .. }));
    }

    #[tokio::test]
    async fn test_status_of_manifest_lists_kind() {
        let temp = TempDir::new().unwrap();
        let orch = orchestrator(&temp, &[]);
        orch.install(&Component::new(ComponentKind::Skin, "Vector").bundled(true))
            .await
            .unwrap();
        orch.install(&Component::new(ComponentKind::Extension, "Cite").bundled(true))
            .await
            .unwrap();

        // The host picks up the new directive on its next request
        let orch = orchestrator(&temp, &["Vector"]);
        let skins = orch.status_of_manifest(ComponentKind::Skin).unwrap();
        assert_eq!(skins.len(), 1);
        assert_eq!(skins[0].name, "Vector");
        assert_eq!(skins[0].status, LifecycleStatus::Enabled);
    }
}
