//! Structured results of lifecycle requests

use serde::Serialize;
use springboard_core::types::{ComponentKind, LifecycleAction, LifecycleStatus, PostInstallStep};

/// Terminal outcome of a request that was not rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Outcome {
    Success,
    SuccessWithWarnings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum WarningKind {
    /// Pinned commit could not be checked out; the branch head is installed
    CheckoutFailed,
    PostInstallStepFailed,
}

/// A best-effort step that failed without undoing the install
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepWarning {
    pub kind: WarningKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<PostInstallStep>,
    pub message: String,
}

impl StepWarning {
    pub fn checkout(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::CheckoutFailed,
            step: None,
            message: message.into(),
        }
    }

    pub fn post_install(step: PostInstallStep, message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::PostInstallStepFailed,
            step: Some(step),
            message: message.into(),
        }
    }
}

/// Result of one successful install or uninstall
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestReport {
    pub action: LifecycleAction,
    pub kind: ComponentKind,
    pub name: String,
    pub status_before: LifecycleStatus,
    pub outcome: Outcome,
    /// Manifest directives after the request
    pub directives: Vec<String>,
    pub warnings: Vec<StepWarning>,
    pub manifest_committed: bool,
}

impl RequestReport {
    pub(crate) fn new(
        action: LifecycleAction,
        kind: ComponentKind,
        name: impl Into<String>,
        status_before: LifecycleStatus,
    ) -> Self {
        Self {
            action,
            kind,
            name: name.into(),
            status_before,
            outcome: Outcome::Success,
            directives: Vec::new(),
            warnings: Vec::new(),
            manifest_committed: false,
        }
    }

    pub(crate) fn warn(&mut self, warning: StepWarning) {
        self.warnings.push(warning);
        self.outcome = Outcome::SuccessWithWarnings;
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// One request of a batch: its report, or the error that stopped it
#[derive(Debug)]
pub struct BatchEntry {
    pub kind: ComponentKind,
    pub name: String,
    pub result: crate::Result<RequestReport>,
}

/// Results of a batch install
#[derive(Debug, Default)]
pub struct BatchReport {
    pub entries: Vec<BatchEntry>,
    /// Whether the schema migration ran for the batch
    pub migration_ran: bool,
    /// Set when the shared migration failed
    pub migration_warning: Option<StepWarning>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.entries.iter().filter(|e| e.result.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.entries.len() - self.succeeded()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warning_downgrades_outcome() {
        let mut report = RequestReport::new(
            LifecycleAction::Install,
            ComponentKind::Extension,
            "Cite",
            LifecycleStatus::NotFound,
        );
        assert_eq!(report.outcome, Outcome::Success);

        report.warn(StepWarning::post_install(
            PostInstallStep::SchemaMigration,
            "update.php exited with code 1",
        ));
        assert_eq!(report.outcome, Outcome::SuccessWithWarnings);
        assert!(report.has_warnings());
    }

    #[test]
    fn test_report_json_shape() {
        let mut report = RequestReport::new(
            LifecycleAction::Install,
            ComponentKind::Skin,
            "Timeless",
            LifecycleStatus::NotFound,
        );
        report.warn(StepWarning::checkout("checkout of abc123 failed"));

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["action"], "install");
        assert_eq!(json["status_before"], "not-found");
        assert_eq!(json["outcome"], "success-with-warnings");
        assert_eq!(json["warnings"][0]["kind"], "checkout-failed");
        assert!(json["warnings"][0].get("step").is_none());
    }
}
