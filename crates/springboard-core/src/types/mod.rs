//! Type definitions for Springboard configuration and components

mod component_types;
mod config_types;

pub use component_types::*;
pub use config_types::*;
