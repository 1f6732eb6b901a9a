// Recovery data models

use chrono::{DateTime, Local};
use std::fmt;

/// Why a workflow ended without success while the connection stayed healthy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The remote command itself reported an error
    CommandFailed {
        command: String,
        exit_status: i32,
        stderr: String,
    },
    /// The check never passed within its budget
    NotConfirmed(String),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::CommandFailed {
                command,
                exit_status,
                stderr,
            } => {
                write!(f, "'{}' exited with status {}", command, exit_status)?;
                if !stderr.is_empty() {
                    write!(f, ": {}", stderr)?;
                }
                Ok(())
            }
            FailureReason::NotConfirmed(reason) => f.write_str(reason),
        }
    }
}

/// Terminal result of one workflow run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowOutcome {
    Success,
    Failure(FailureReason),
    TransportError(String),
}

impl WorkflowOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, WorkflowOutcome::Success)
    }

    pub fn not_confirmed(reason: impl Into<String>) -> Self {
        WorkflowOutcome::Failure(FailureReason::NotConfirmed(reason.into()))
    }
}

/// The two fixed recovery procedures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryKind {
    /// CASE 1: the DCV server crashed
    ServiceRestart,
    /// CASE 2: black screen on first connect
    RunlevelCycle,
}

impl RecoveryKind {
    pub fn label(&self) -> &'static str {
        match self {
            RecoveryKind::ServiceRestart => "CASE 1: DCV service restart",
            RecoveryKind::RunlevelCycle => "CASE 2: black screen recovery",
        }
    }

    pub fn symptom(&self) -> &'static str {
        match self {
            RecoveryKind::ServiceRestart => "DCV session drops while in use",
            RecoveryKind::RunlevelCycle => "Black screen on first DCV connect",
        }
    }
}

/// Exactly one report per workflow run
#[derive(Debug, Clone)]
pub struct RecoveryReport {
    pub kind: RecoveryKind,
    pub outcome: WorkflowOutcome,
    pub finished_at: DateTime<Local>,
}

impl RecoveryReport {
    pub fn new(kind: RecoveryKind, outcome: WorkflowOutcome) -> Self {
        Self {
            kind,
            outcome,
            finished_at: Local::now(),
        }
    }

    /// Operator-facing message; each kind of failure asks for a different next step
    pub fn message(&self) -> String {
        let label = self.kind.label();
        match &self.outcome {
            WorkflowOutcome::Success => format!(
                "✓ {} completed at {}",
                label,
                self.finished_at.format("%H:%M:%S")
            ),
            WorkflowOutcome::Failure(reason @ FailureReason::CommandFailed { .. }) => format!(
                "✗ {} failed: command failed ({}). Escalate to support.",
                label, reason
            ),
            WorkflowOutcome::Failure(reason) => format!(
                "✗ {} failed: could not confirm the fix ({}). Escalate to support.",
                label, reason
            ),
            WorkflowOutcome::TransportError(reason) => format!(
                "✗ {} aborted: could not reach the host ({}). Log in again.",
                label, reason
            ),
        }
    }
}
