//! User-visible workflow status.

use std::fmt;

/// The single active status message of a workflow.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum WorkflowStatus {
    #[default]
    Idle,
    Info(String),
    Warning(String),
    Error(String),
    Success(String),
}

/// Display severity of a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    None,
    Info,
    Warning,
    Error,
    Success,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::None => "none",
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Success => "success",
        };
        f.write_str(label)
    }
}

/// Map a status to what the UI shows: a severity and a message.
///
/// `Idle` has no message.
pub fn report(status: &WorkflowStatus) -> (Severity, &str) {
    match status {
        WorkflowStatus::Idle => (Severity::None, ""),
        WorkflowStatus::Info(message) => (Severity::Info, message),
        WorkflowStatus::Warning(message) => (Severity::Warning, message),
        WorkflowStatus::Error(message) => (Severity::Error, message),
        WorkflowStatus::Success(message) => (Severity::Success, message),
    }
}

impl WorkflowStatus {
    pub fn severity(&self) -> Severity {
        report(self).0
    }

    pub fn message(&self) -> &str {
        report(self).1
    }
}

impl fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match report(self) {
            (Severity::None, _) => f.write_str("idle"),
            (severity, message) => write!(f, "{}: {}", severity, message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report() {
        assert_eq!(report(&WorkflowStatus::Idle), (Severity::None, ""));
        assert_eq!(
            report(&WorkflowStatus::Error("network timeout".into())),
            (Severity::Error, "network timeout")
        );
        assert_eq!(
            WorkflowStatus::Warning("signing cancelled".into()).severity(),
            Severity::Warning
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(WorkflowStatus::Idle.to_string(), "idle");
        assert_eq!(
            WorkflowStatus::Success("submitted".into()).to_string(),
            "success: submitted"
        );
    }
}
