//! Shared command plumbing: configuration, orchestrator wiring and report rendering

use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::{json, Value};
use springboard_core::types::{ComponentKind, LifecycleAction};
use springboard_core::SpringboardConfig;
use springboard_lifecycle::{
    HostRegistry, LifecycleError, LifecycleOrchestrator, ProcessRunner, RequestReport,
    SystemProcessRunner, WarningKind,
};
use tracing::debug;

use crate::cli::GlobalArgs;
use crate::output;

/// Resolve configuration from `--config`, `--host-root` or a file search
pub fn load_config(global: &GlobalArgs) -> Result<SpringboardConfig> {
    if let Some(path) = &global.config {
        return SpringboardConfig::load(Some(path.as_path()))
            .with_context(|| format!("Failed to load configuration from {}", path));
    }
    if let Some(root) = &global.host_root {
        return SpringboardConfig::for_host_root(root.clone())
            .with_context(|| format!("Invalid host root {}", root));
    }
    SpringboardConfig::load(None)
        .context("No configuration found; pass --config or --host-root")
}

/// Wire the orchestrator to the real process runner and host registry
pub async fn open_orchestrator(config: &SpringboardConfig) -> Result<LifecycleOrchestrator> {
    let runner: Arc<dyn ProcessRunner> = Arc::new(SystemProcessRunner);
    let registry = HostRegistry::from_config(config, runner.as_ref())
        .await
        .context("Failed to read the host registry")?;
    debug!("Host registry reports {} active modules", registry.len());

    LifecycleOrchestrator::from_config(config, Arc::new(registry), runner)
        .context("Failed to set up the lifecycle orchestrator")
}

pub fn report_json(report: &RequestReport) -> Value {
    json!({
        "action": report.action,
        "outcome": report.outcome,
        "component": { "kind": report.kind, "name": report.name },
        "status_before": report.status_before,
        "directives": report.directives,
        "warnings": report.warnings,
        "manifest_committed": report.manifest_committed,
    })
}

pub fn failure_json(
    action: LifecycleAction,
    kind: ComponentKind,
    name: &str,
    err: &LifecycleError,
) -> Value {
    json!({
        "action": action,
        "outcome": "failed",
        "component": { "kind": kind, "name": name },
        "error": { "kind": err.kind(), "message": err.to_string() },
        "manifest_committed": err.manifest_committed(),
    })
}

pub fn print_json(value: &Value) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output to JSON")?;
    println!("{}", json);
    Ok(())
}

/// Human-readable rendering of a successful request
pub fn print_report(report: &RequestReport) {
    let verb = match report.action {
        LifecycleAction::Install => "Installed",
        LifecycleAction::Uninstall => "Uninstalled",
    };
    output::success(&format!("{} {} '{}'", verb, report.kind, report.name));
    output::kv("status before", &report.status_before.to_string());
    output::kv(
        "manifest",
        if report.manifest_committed {
            "updated"
        } else {
            "unchanged"
        },
    );

    for warning in &report.warnings {
        let label = match (warning.kind, warning.step) {
            (WarningKind::CheckoutFailed, _) => "checkout".to_string(),
            (WarningKind::PostInstallStepFailed, Some(step)) => step.to_string(),
            (WarningKind::PostInstallStepFailed, None) => "post-install".to_string(),
        };
        output::warning(&format!("{}: {}", label, warning.message));
    }
}

/// Human-readable rendering of a rejected or failed request
pub fn print_failure(err: &LifecycleError) {
    output::error(&err.to_string());
    if err.manifest_committed() {
        output::warning("The manifest change was already committed");
    } else if !err.is_rejection() {
        output::info("No manifest changes were committed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use springboard_core::types::{LifecycleStatus, PostInstallStep};

    #[test]
    fn test_failure_json_shape() {
        let err = LifecycleError::conflict_externally_loaded(ComponentKind::Extension, "Bar");
        let value = failure_json(LifecycleAction::Uninstall, ComponentKind::Extension, "Bar", &err);

        assert_eq!(value["action"], "uninstall");
        assert_eq!(value["outcome"], "failed");
        assert_eq!(value["error"]["kind"], "conflict-externally-loaded");
        assert_eq!(value["manifest_committed"], false);
        assert_eq!(value["component"]["kind"], "extension");
    }

    #[test]
    fn test_load_config_from_host_root() {
        let global = GlobalArgs {
            host_root: Some("/srv/wiki".into()),
            ..Default::default()
        };
        let config = load_config(&global).unwrap();
        assert_eq!(config.skins_dir(), "/srv/wiki/skins");
    }

    #[test]
    fn test_load_config_file_wins() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = camino::Utf8PathBuf::try_from(temp.path().join("springboard.yaml")).unwrap();
        std::fs::write(&path, "host_root: /opt/mediawiki\n").unwrap();

        let global = GlobalArgs {
            config: Some(path),
            host_root: Some("/srv/wiki".into()),
            ..Default::default()
        };
        assert_eq!(load_config(&global).unwrap().host_root(), "/opt/mediawiki");
    }

    #[tokio::test]
    async fn test_report_json_shape() {
        let temp = tempfile::TempDir::new().unwrap();
        let root = camino::Utf8PathBuf::try_from(temp.path().to_path_buf()).unwrap();
        std::fs::create_dir_all(root.join("skins/Vector")).unwrap();
        let config = SpringboardConfig::for_host_root(root).unwrap();
        let orchestrator = open_orchestrator(&config).await.unwrap();

        let report = orchestrator
            .install(
                &springboard_core::types::Component::new(ComponentKind::Skin, "Vector")
                    .bundled(true)
                    .with_step(PostInstallStep::DependencyInstall),
            )
            .await
            .unwrap();
        let value = report_json(&report);

        assert_eq!(value["outcome"], "success-with-warnings");
        assert_eq!(
            value["status_before"],
            serde_json::to_value(LifecycleStatus::NotFound).unwrap()
        );
        assert_eq!(value["directives"][0], "wfLoadSkin( 'Vector' );");
        assert_eq!(value["warnings"][0]["step"], "dependency-install");
        assert_eq!(value["manifest_committed"], true);
    }
}
