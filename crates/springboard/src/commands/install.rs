//! Install command

use std::process::ExitCode;

use anyhow::{bail, Result};
use serde_json::json;
use springboard_core::types::{Component, LifecycleAction, PostInstallStep};

use super::common::{
    failure_json, load_config, open_orchestrator, print_failure, print_json, print_report,
    report_json,
};
use crate::cli::{GlobalArgs, InstallArgs};
use crate::output;

/// Install one or more components
///
/// Supports:
/// - Single: `springboard install extension Cite --branch REL1_43`
/// - Pinned: `springboard install skin Citizen --repository <url> --commit <sha>`
/// - Batch: `springboard install extension Cite ParserFunctions --db-update`
///   (the schema migration runs once for the whole batch)
pub async fn run(args: InstallArgs, global: &GlobalArgs) -> Result<ExitCode> {
    if args.names.len() > 1 && (args.repository.is_some() || args.commit.is_some()) {
        bail!("--repository and --commit can only be used with a single component");
    }

    let config = load_config(global)?;
    let orchestrator = open_orchestrator(&config).await?;
    let components: Vec<Component> = args.names.iter().map(|n| build_component(&args, n)).collect();

    let spinner = (!global.json && !global.quiet).then(|| {
        output::spinner(&format!(
            "Installing {} {}",
            args.kind,
            args.names.join(", ")
        ))
    });

    if let [component] = components.as_slice() {
        let result = orchestrator.install(component).await;
        if let Some(pb) = spinner {
            pb.finish_and_clear();
        }

        return match result {
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
                        LifecycleAction::Install,
                        component.kind,
                        &component.name,
                        &err,
                    ))?;
                } else {
                    print_failure(&err);
                }
                Ok(ExitCode::FAILURE)
            }
        };
    }

    let batch = orchestrator.install_batch(&components).await;
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    if global.json {
        let results: Vec<_> = batch
            .entries
            .iter()
            .map(|entry| match &entry.result {
                Ok(report) => report_json(report),
                Err(err) => failure_json(LifecycleAction::Install, entry.kind, &entry.name, err),
            })
            .collect();
        print_json(&json!({
            "results": results,
            "schema_migration": {
                "ran": batch.migration_ran,
                "warning": batch.migration_warning,
            },
        }))?;
    } else {
        for entry in &batch.entries {
            match &entry.result {
                Ok(report) => print_report(report),
                Err(err) => print_failure(err),
            }
        }
        if let Some(warning) = &batch.migration_warning {
            output::warning(&format!("schema-migration: {}", warning.message));
        } else if batch.migration_ran {
            output::success("Schema migration completed");
        }
        output::info(&format!(
            "{} installed, {} failed",
            batch.succeeded(),
            batch.failed()
        ));
    }

    Ok(if batch.all_succeeded() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn build_component(args: &InstallArgs, name: &str) -> Component {
    let mut component = Component::new(args.kind, name).bundled(args.bundled);
    if let Some(repository) = &args.repository {
        component = component.with_repository(repository.as_str());
    }
    if let Some(branch) = &args.branch {
        component = component.with_branch(branch.as_str());
    }
    if let Some(commit) = &args.commit {
        component = component.with_commit(commit.as_str());
    }
    if args.composer {
        component = component.with_step(PostInstallStep::DependencyInstall);
    }
    if args.db_update {
        component = component.with_step(PostInstallStep::SchemaMigration);
    }
    component
}
