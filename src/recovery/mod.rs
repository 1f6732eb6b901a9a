// Recovery engine: polling, workflows and orchestration

pub mod models;
pub mod orchestrator;
pub mod poller;
pub mod progress;
pub mod runlevel;
pub mod service_restart;
pub mod steps;

#[cfg(test)]
pub(crate) mod testing;

pub use models::{FailureReason, RecoveryKind, RecoveryReport, WorkflowOutcome};
pub use orchestrator::RecoveryOrchestrator;
pub use poller::{poll, PollOutcome, PollStep, RetryBudget, RetryPoller};
pub use progress::{ProgressReporter, RecoveryEvent};
pub use runlevel::{RunlevelPhase, RunlevelRecoveryWorkflow};
pub use service_restart::{RestartState, ServiceRestartWorkflow};
