//! Manifest command

use std::process::ExitCode;

use anyhow::{Context, Result};
use serde_json::json;

use super::common::{load_config, print_json};
use crate::cli::GlobalArgs;
use crate::output;
use springboard_lifecycle::ManifestStore;

/// Print the manifest path and its directives
pub fn run(global: &GlobalArgs) -> Result<ExitCode> {
    let config = load_config(global)?;
    let path = config.manifest_path();
    let manifest = ManifestStore::load(&path)
        .with_context(|| format!("Failed to read manifest {}", path))?;

    if global.json {
        print_json(&json!({
            "path": path,
            "directives": manifest.directives(),
        }))?;
        return Ok(ExitCode::SUCCESS);
    }

    output::header(&format!("Manifest {}", path));
    if manifest.is_empty() {
        output::info("No directives");
    }
    for directive in manifest.directives() {
        println!("  {}", directive);
    }
    Ok(ExitCode::SUCCESS)
}
