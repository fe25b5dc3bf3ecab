//! Uninstall command

use std::process::ExitCode;

use anyhow::Result;
use springboard_core::types::{Component, LifecycleAction};

use super::common::{
    failure_json, load_config, open_orchestrator, print_failure, print_json, print_report,
    report_json,
};
use crate::cli::{GlobalArgs, UninstallArgs};

/// Remove a component's directive and, unless bundled, its directory
pub async fn run(args: UninstallArgs, global: &GlobalArgs) -> Result<ExitCode> {
    let config = load_config(global)?;
    let orchestrator = open_orchestrator(&config).await?;
    let component = Component::new(args.kind, args.name.as_str()).bundled(args.bundled);

    match orchestrator.uninstall(&component).await {
        Ok(report) => {
            if global.json {
                print_json(&report_json(&report))?;
            } else {
                print_report(&report);
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            if global.json {
                print_json(&failure_json(
                    LifecycleAction::Uninstall,
                    args.kind,
                    &args.name,
                    &err,
                ))?;
            } else {
                print_failure(&err);
            }
            Ok(ExitCode::FAILURE)
        }
    }
}
