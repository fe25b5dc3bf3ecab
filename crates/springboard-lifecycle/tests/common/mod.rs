//! Common test utilities for springboard-lifecycle
//!
//! This module provides shared test infrastructure including:
//! - A scripted process runner that records invocations
//! - A temporary host layout with manifest and component helpers

#![allow(dead_code)]
#![allow(unused_imports)]

pub mod fixtures;
pub mod mocks;

pub use fixtures::*;
pub use mocks::*;
