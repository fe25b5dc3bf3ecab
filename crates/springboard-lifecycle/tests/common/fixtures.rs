//! Temporary host layout for lifecycle tests

#![allow(dead_code)]

use camino::{Utf8Path, Utf8PathBuf};
use springboard_core::types::ComponentKind;
use springboard_core::SpringboardConfig;
use springboard_lifecycle::{HostRegistry, LifecycleOrchestrator, ManifestStore, ProcessRunner};
use std::collections::BTreeMap;
use std::sync::Arc;
use tempfile::TempDir;
use walkdir::WalkDir;

/// A host root in a temp directory: `extensions/`, `skins/`,
/// `maintenance/update.php` and the manifest location
pub struct TestHost {
    temp_dir: TempDir,
    root: Utf8PathBuf,
}

impl TestHost {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let root = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
        std::fs::create_dir_all(root.join("extensions")).unwrap();
        std::fs::create_dir_all(root.join("skins")).unwrap();
        std::fs::create_dir_all(root.join("maintenance")).unwrap();
        std::fs::write(root.join("maintenance/update.php"), "<?php\n").unwrap();
        Self { temp_dir, root }
    }

    /// An empty host root with no component or manifest directories
    pub fn bare() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let root = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
        Self { temp_dir, root }
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub fn config(&self) -> SpringboardConfig {
        SpringboardConfig::for_host_root(self.root.clone()).unwrap()
    }

    pub fn manifest_path(&self) -> Utf8PathBuf {
        self.config().manifest_path()
    }

    /// Write a manifest with the header and the given lines
    pub fn write_manifest(&self, lines: &[&str]) {
        let path = self.manifest_path();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        let mut content = String::from("<?php\n");
        for line in lines {
            content.push_str(line);
            content.push('\n');
        }
        std::fs::write(path, content).unwrap();
    }

    pub fn manifest_bytes(&self) -> Option<Vec<u8>> {
        std::fs::read(self.manifest_path()).ok()
    }

    pub fn manifest_lines(&self) -> Vec<String> {
        ManifestStore::load(self.manifest_path())
            .unwrap()
            .directives()
            .iter()
            .map(|d| d.to_string())
            .collect()
    }

    pub fn component_dir(&self, kind: ComponentKind, name: &str) -> Utf8PathBuf {
        self.root.join(kind.dir_name()).join(name)
    }

    /// Create a component source tree with a descriptor and a nested file
    pub fn add_component_dir(&self, kind: ComponentKind, name: &str) -> Utf8PathBuf {
        let dir = self.component_dir(kind, name);
        std::fs::create_dir_all(dir.join("includes")).unwrap();
        std::fs::write(dir.join(kind.descriptor_file()), "{}").unwrap();
        std::fs::write(dir.join("includes/Hooks.php"), "<?php\n").unwrap();
        dir
    }

    /// Every file under the host root with its bytes, lock files excluded
    pub fn snapshot(&self) -> BTreeMap<String, Vec<u8>> {
        WalkDir::new(&self.root)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| e.path().extension().map_or(true, |ext| ext != "lock"))
            .map(|e| {
                (
                    e.path().to_string_lossy().to_string(),
                    std::fs::read(e.path()).unwrap(),
                )
            })
            .collect()
    }

    /// Every path under the host root, directories and lock files included
    pub fn entries(&self) -> Vec<String> {
        WalkDir::new(&self.root)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .map(|e| {
                e.path()
                    .strip_prefix(&self.root)
                    .unwrap()
                    .to_string_lossy()
                    .to_string()
            })
            .collect()
    }

    pub fn orchestrator(
        &self,
        active: &[&str],
        runner: Arc<dyn ProcessRunner>,
    ) -> LifecycleOrchestrator {
        LifecycleOrchestrator::from_config(
            &self.config(),
            Arc::new(HostRegistry::from_names(active.iter().copied())),
            runner,
        )
        .unwrap()
    }
}

impl Default for TestHost {
    fn default() -> Self {
        Self::new()
    }
}
