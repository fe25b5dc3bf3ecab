//! Command implementations
//!
//! - install: fetch components and add their directives
//! - uninstall: remove a directive and the component's code
//! - status: resolve lifecycle status
//! - manifest: print the manifest

pub mod common;
pub mod install;
pub mod manifest;
pub mod status;
pub mod uninstall;
