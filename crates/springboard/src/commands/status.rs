//! Status command

use std::process::ExitCode;

use anyhow::{Context, Result};
use springboard_lifecycle::Resolution;
use tabled::{settings::Style, Table, Tabled};

use super::common::{load_config, open_orchestrator, print_json};
use crate::cli::{GlobalArgs, StatusArgs};
use crate::output;

#[derive(Tabled)]
struct StatusRow {
    name: String,
    status: String,
    #[tabled(rename = "on disk")]
    on_disk: String,
    #[tabled(rename = "in manifest")]
    in_manifest: String,
    active: String,
}

impl From<&Resolution> for StatusRow {
    fn from(r: &Resolution) -> Self {
        let flag = |b: bool| String::from(if b { "yes" } else { "no" });
        Self {
            name: r.name.clone(),
            status: r.status.to_string(),
            on_disk: flag(r.on_disk),
            in_manifest: flag(r.in_manifest),
            active: flag(r.active),
        }
    }
}

/// Show lifecycle status
///
/// Supports:
/// - Named: `springboard status extension Cite ParserFunctions`
/// - Manifest entries: `springboard status skin`
/// - JSON output: `springboard status extension --json`
pub async fn run(args: StatusArgs, global: &GlobalArgs) -> Result<ExitCode> {
    let config = load_config(global)?;
    let orchestrator = open_orchestrator(&config).await?;

    let resolved = if args.names.is_empty() {
        orchestrator.status_of_manifest(args.kind)
    } else {
        orchestrator.status(args.kind, &args.names)
    };
    let resolutions = resolved.context("Failed to resolve status")?;

    if global.json {
        let value = serde_json::to_value(&resolutions).context("Failed to serialize status")?;
        print_json(&value)?;
        return Ok(ExitCode::SUCCESS);
    }

    if resolutions.is_empty() {
        output::info(&format!("No {}s in the manifest", args.kind));
        return Ok(ExitCode::SUCCESS);
    }

    let rows: Vec<StatusRow> = resolutions.iter().map(StatusRow::from).collect();
    let mut table = Table::new(&rows);
    table.with(Style::sharp());
    println!("{}", table);

    Ok(ExitCode::SUCCESS)
}
