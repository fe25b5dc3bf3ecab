//! Configuration loading and management

mod loader;

pub use loader::{
    release_branch_for_version, repository_url, SpringboardConfig, CONFIG_FILE_NAMES,
};
