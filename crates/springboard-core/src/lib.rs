//! # springboard-core
//!
//! Core library for the Springboard CLI providing:
//! - Component identity and lifecycle types (extensions and skins)
//! - Configuration file parsing (springboard.yaml)
//! - Release branch and repository URL conventions

pub mod config;
pub mod error;
pub mod types;

pub use config::SpringboardConfig;
pub use error::{Error, Result};
