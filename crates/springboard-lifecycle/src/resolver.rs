//! Status resolution across filesystem, manifest and host registry

use crate::directive::DirectiveRenderer;
use crate::manifest::ManifestStore;
use crate::paths::{ComponentName, ComponentPaths};
use crate::registry::RegistryAdapter;
use serde::Serialize;
use springboard_core::types::{ComponentKind, LifecycleStatus, LoadDirective};
use std::sync::Arc;
use tracing::debug;

/// Classify the three observations into a lifecycle status
///
/// A component active without a manifest entry is `LoadedElsewhere` before
/// anything else is considered. A manifest entry decides the rest whatever is
/// on disk, so the tree's presence is reported but never changes the status.
pub fn classify(_on_disk: bool, in_manifest: bool, active: bool) -> LifecycleStatus {
    match (in_manifest, active) {
        (false, true) => LifecycleStatus::LoadedElsewhere,
        (true, true) => LifecycleStatus::Enabled,
        (true, false) => LifecycleStatus::InstalledDisabled,
        (false, false) => LifecycleStatus::NotFound,
    }
}

/// Observations and derived status for one component
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub kind: ComponentKind,
    pub name: String,
    pub directive: LoadDirective,
    pub on_disk: bool,
    pub in_manifest: bool,
    pub active: bool,
    pub status: LifecycleStatus,
}

#[derive(Clone)]
pub struct StatusResolver {
    paths: ComponentPaths,
    renderer: DirectiveRenderer,
    registry: Arc<dyn RegistryAdapter>,
}

impl StatusResolver {
    pub fn new(
        paths: ComponentPaths,
        renderer: DirectiveRenderer,
        registry: Arc<dyn RegistryAdapter>,
    ) -> Self {
        Self {
            paths,
            renderer,
            registry,
        }
    }

    pub fn paths(&self) -> &ComponentPaths {
        &self.paths
    }

    pub fn resolve(
        &self,
        manifest: &ManifestStore,
        kind: ComponentKind,
        name: &ComponentName,
    ) -> Resolution {
        let on_disk = self.paths.exists(kind, name);
        let directive = self.renderer.render(kind, name);
        let in_manifest = manifest.contains(&directive);
        let active = self.registry.is_active(name.as_str());
        let status = classify(on_disk, in_manifest, active);

        debug!(
            "{} '{}': on_disk={} in_manifest={} active={} -> {}",
            kind, name, on_disk, in_manifest, active, status
        );

        Resolution {
            kind,
            name: name.to_string(),
            directive,
            on_disk,
            in_manifest,
            active,
            status,
        }
    }

    /// Resolve a list of components against one manifest snapshot
    pub fn resolve_many<'a, I>(&self, manifest: &ManifestStore, components: I) -> Vec<Resolution>
    where
        I: IntoIterator<Item = (ComponentKind, &'a ComponentName)>,
    {
        components
            .into_iter()
            .map(|(kind, name)| self.resolve(manifest, kind, name))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::HostRegistry;
    use springboard_core::types::DirectiveStyle;
    use test_case::test_case;

    #[test_case(false, false, false => LifecycleStatus::NotFound; "absent everywhere")]
    #[test_case(true, false, false => LifecycleStatus::NotFound; "dropped in place")]
    #[test_case(false, false, true => LifecycleStatus::LoadedElsewhere; "active without tree")]
    #[test_case(true, false, true => LifecycleStatus::LoadedElsewhere; "active from static config")]
    #[test_case(true, true, true => LifecycleStatus::Enabled; "enabled")]
    #[test_case(false, true, true => LifecycleStatus::Enabled; "enabled without tree")]
    #[test_case(true, true, false => LifecycleStatus::InstalledDisabled; "inactive")]
    #[test_case(false, true, false => LifecycleStatus::InstalledDisabled; "tree missing")]
    fn test_classify(on_disk: bool, in_manifest: bool, active: bool) -> LifecycleStatus {
        classify(on_disk, in_manifest, active)
    }

    #[test]
    fn test_resolve_reads_manifest_and_registry() {
        let temp = tempfile::TempDir::new().unwrap();
        let base = camino::Utf8PathBuf::try_from(temp.path().to_path_buf()).unwrap();
        let paths = ComponentPaths::new(base.join("extensions"), base.join("skins"));
        let manifest_path = base.join("CustomLoader.php");
        std::fs::write(&manifest_path, "<?php\nwfLoadExtension( 'Foo' );\n").unwrap();

        let resolver = StatusResolver::new(
            paths.clone(),
            DirectiveRenderer::new(DirectiveStyle::Short, paths),
            Arc::new(HostRegistry::from_names(["Foo", "Bar"])),
        );
        let manifest = ManifestStore::load(&manifest_path).unwrap();
        let foo = ComponentName::parse("Foo").unwrap();
        let bar = ComponentName::parse("Bar").unwrap();

        let resolved = resolver.resolve_many(
            &manifest,
            [
                (ComponentKind::Extension, &foo),
                (ComponentKind::Extension, &bar),
            ],
        );
        assert_eq!(resolved[0].status, LifecycleStatus::Enabled);
        assert_eq!(resolved[1].status, LifecycleStatus::LoadedElsewhere);
        assert_eq!(resolved[1].directive.as_str(), "wfLoadExtension( 'Bar' );");
    }
}
