//! Tool-owned manifest of load directives
//!
//! The manifest is the loader file the host includes on every request. It
//! starts with a fixed header line followed by one directive per line:
//! ```text
//! <?php
//! wfLoadExtension( 'Cite' );
//! wfLoadSkin( 'Timeless' );
//! ```
//!
//! Membership is exact string equality on whole lines. Writers hold an
//! exclusive lock on a sidecar `<manifest>.lock` file for the whole
//! read-modify-write, and commits go through a temp file plus rename so
//! readers never observe a partial file.

use crate::error::{LifecycleError, Result};
use camino::{Utf8Path, Utf8PathBuf};
use fs4::fs_std::FileExt;
use springboard_core::types::LoadDirective;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// First line of every manifest file
pub const MANIFEST_HEADER: &str = "<?php";

/// Reopen attempts when the lock directory vanishes between creation and open
const MAX_LOCK_RETRIES: u32 = 8;

/// Exclusive advisory lock, released on drop
///
/// When a request ends without committing, the lock file and any directories
/// created to hold it are removed again. Unlinking happens while the lock is
/// still held, and acquirers re-check that the file they locked is still the
/// one at the lock path.
#[derive(Debug)]
struct ManifestLock {
    _file: File,
    path: Utf8PathBuf,
    /// Directories created by this acquisition, deepest first
    created_dirs: Vec<Utf8PathBuf>,
    created_file: bool,
    retain: bool,
}

impl ManifestLock {
    fn acquire(manifest_path: &Utf8Path) -> Result<Self> {
        let lock_path = lock_path_for(manifest_path);
        let io_err = |e| LifecycleError::manifest_io(lock_path.as_str(), e);

        let mut vanished = 0;
        loop {
            let created_dirs = create_missing_parents(&lock_path).map_err(io_err)?;
            let created_file = fs::symlink_metadata(&lock_path).is_err();

            let file = match OpenOptions::new()
                .create(true)
                .truncate(false)
                .write(true)
                .open(&lock_path)
            {
                Ok(file) => file,
                // Parent removed by a request that released without committing
                Err(e)
                    if e.kind() == std::io::ErrorKind::NotFound && vanished < MAX_LOCK_RETRIES =>
                {
                    vanished += 1;
                    continue;
                }
                Err(e) => return Err(io_err(e)),
            };

            debug!("Waiting for manifest lock {}", lock_path);
            file.lock_exclusive().map_err(io_err)?;

            if !still_linked(&file, &lock_path) {
                debug!("Lock file {} was removed while waiting, retrying", lock_path);
                continue;
            }
            debug!("Acquired manifest lock {}", lock_path);

            return Ok(Self {
                _file: file,
                path: lock_path.clone(),
                created_dirs,
                created_file,
                retain: false,
            });
        }
    }

    fn retain(&mut self) {
        self.retain = true;
    }
}

impl Drop for ManifestLock {
    fn drop(&mut self) {
        if self.retain || !cfg!(unix) || !self.created_file {
            return;
        }
        if let Err(e) = fs::remove_file(&self.path) {
            debug!("Could not remove lock file {}: {}", self.path, e);
            return;
        }
        for dir in &self.created_dirs {
            if fs::remove_dir(dir).is_err() {
                break;
            }
        }
        debug!("Released uncommitted manifest lock {}", self.path);
    }
}

fn lock_path_for(manifest_path: &Utf8Path) -> Utf8PathBuf {
    Utf8PathBuf::from(format!("{}.lock", manifest_path))
}

/// Create the missing ancestors of `path`, returning them deepest first
fn create_missing_parents(path: &Utf8Path) -> std::io::Result<Vec<Utf8PathBuf>> {
    let mut missing = Vec::new();
    let mut current = path.parent();
    while let Some(dir) = current {
        if dir.as_str().is_empty() || fs::symlink_metadata(dir).is_ok() {
            break;
        }
        missing.push(dir.to_owned());
        current = dir.parent();
    }
    if let Some(deepest) = missing.first() {
        fs::create_dir_all(deepest)?;
    }
    Ok(missing)
}

#[cfg(unix)]
fn still_linked(file: &File, path: &Utf8Path) -> bool {
    use std::os::unix::fs::MetadataExt;

    match (file.metadata(), fs::metadata(path)) {
        (Ok(held), Ok(current)) => held.dev() == current.dev() && held.ino() == current.ino(),
        _ => false,
    }
}

#[cfg(not(unix))]
fn still_linked(_file: &File, _path: &Utf8Path) -> bool {
    true
}

/// Ordered set of load directives backed by the manifest file
#[derive(Debug)]
pub struct ManifestStore {
    path: Utf8PathBuf,
    directives: Vec<LoadDirective>,
    lock: Option<ManifestLock>,
}

impl ManifestStore {
    /// Load a read-only snapshot without taking the lock
    ///
    /// A missing file is an empty manifest.
    pub fn load(path: impl Into<Utf8PathBuf>) -> Result<Self> {
        let path = path.into();
        let directives = read_directives(&path)?;
        Ok(Self {
            path,
            directives,
            lock: None,
        })
    }

    /// Take the exclusive lock, then load
    ///
    /// The lock is held until the store is dropped, so a request's
    /// read-modify-write cannot interleave with another writer's.
    pub fn open_locked(path: impl Into<Utf8PathBuf>) -> Result<Self> {
        let path = path.into();
        let lock = ManifestLock::acquire(&path)?;
        let directives = read_directives(&path)?;
        Ok(Self {
            path,
            directives,
            lock: Some(lock),
        })
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    pub fn directives(&self) -> &[LoadDirective] {
        &self.directives
    }

    pub fn len(&self) -> usize {
        self.directives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }

    pub fn contains(&self, directive: &LoadDirective) -> bool {
        self.directives.iter().any(|d| d == directive)
    }

    /// Append if absent; returns whether the directive was inserted
    pub fn add(&mut self, directive: LoadDirective) -> bool {
        if self.contains(&directive) {
            debug!("Directive already present: {}", directive);
            return false;
        }
        debug!("Adding directive: {}", directive);
        self.directives.push(directive);
        true
    }

    /// Remove every exact match; returns whether anything was removed
    pub fn remove(&mut self, directive: &LoadDirective) -> bool {
        let before = self.directives.len();
        self.directives.retain(|d| d != directive);
        let removed = self.directives.len() != before;
        if removed {
            debug!("Removed directive: {}", directive);
        }
        removed
    }

    /// Serialize the header and directives and atomically replace the file
    ///
    /// A committed request keeps its lock file and directories.
    pub fn commit(&mut self) -> Result<()> {
        let io_err = |e| LifecycleError::manifest_io(self.path.as_str(), e);

        let parent = match self.path.parent() {
            Some(p) if !p.as_str().is_empty() => p.to_owned(),
            _ => Utf8PathBuf::from("."),
        };
        fs::create_dir_all(&parent).map_err(io_err)?;

        let mut temp = NamedTempFile::new_in(&parent).map_err(io_err)?;
        temp.write_all(self.render().as_bytes()).map_err(io_err)?;
        temp.as_file().sync_all().map_err(io_err)?;

        // Temp files are created owner-only; the host process must be able to read the manifest
        let permissions = match fs::metadata(&self.path) {
            Ok(metadata) => Some(metadata.permissions()),
            Err(_) => default_permissions(),
        };
        if let Some(permissions) = permissions {
            fs::set_permissions(temp.path(), permissions).map_err(io_err)?;
        }

        temp.persist(&self.path).map_err(|e| io_err(e.error))?;
        if let Some(lock) = self.lock.as_mut() {
            lock.retain();
        }
        info!(
            "Committed manifest {} ({} directives)",
            self.path,
            self.directives.len()
        );
        Ok(())
    }

    /// File content as committed
    pub fn render(&self) -> String {
        let mut content = String::with_capacity(64 * (self.directives.len() + 1));
        content.push_str(MANIFEST_HEADER);
        content.push('\n');
        for directive in &self.directives {
            content.push_str(directive.as_str());
            content.push('\n');
        }
        content
    }
}

#[cfg(unix)]
fn default_permissions() -> Option<fs::Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn default_permissions() -> Option<fs::Permissions> {
    None
}

/// Parse manifest lines, skipping the header and blank lines
fn read_directives(path: &Utf8Path) -> Result<Vec<LoadDirective>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("Manifest {} does not exist yet, treating as empty", path);
            return Ok(Vec::new());
        }
        Err(e) => return Err(LifecycleError::manifest_io(path.as_str(), e)),
    };

    let mut directives: Vec<LoadDirective> = Vec::new();
    for line in content.lines() {
        if line.trim().is_empty() || line.trim() == MANIFEST_HEADER {
            continue;
        }
        let directive = LoadDirective::new(line);
        if directives.contains(&directive) {
            debug!("Skipping duplicate manifest line: {}", line);
            continue;
        }
        directives.push(directive);
    }

    debug!("Loaded manifest {} with {} directives", path, directives.len());
    Ok(directives)
}
