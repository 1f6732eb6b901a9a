// CASE 2: cycle the system target to clear a black screen

use crate::error::TransportError;
use crate::recovery::poller::{poll, PollOutcome, RetryBudget};
use crate::recovery::progress::{
    ProgressReporter, PROGRESS_COMMAND_ISSUED, PROGRESS_DONE, PROGRESS_FIRST_CHECK,
    PROGRESS_TARGET_RAISED,
};
use crate::recovery::steps::{issue_privileged, settle};
use crate::recovery::WorkflowOutcome;
use crate::remote::commands::{self, CURRENT_RUNLEVEL};
use crate::remote::{PrivilegeResolver, RemoteCommand, RemoteShell};
use std::time::Duration;

pub const LOWER_SETTLE: Duration = Duration::from_secs(2);
pub const RAISE_SETTLE: Duration = Duration::from_secs(3);

// Tearing down the graphical session is slower than bringing it back
pub const CONFIRM_LOWERED_BUDGET: RetryBudget =
    RetryBudget::new("multi-user target reached", 20, Duration::from_secs(1));
pub const CONFIRM_RAISED_BUDGET: RetryBudget =
    RetryBudget::new("graphical target reached", 3, Duration::from_secs(1));

/// Phases of the target cycle, in order. Never moves backwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RunlevelPhase {
    LoweringTarget,
    ConfirmingLowered,
    RaisingTarget,
    ConfirmingRaised,
}

impl RunlevelPhase {
    pub fn label(&self) -> &'static str {
        match self {
            RunlevelPhase::LoweringTarget => "Switching to multi-user target",
            RunlevelPhase::ConfirmingLowered => "Waiting for runlevel 3",
            RunlevelPhase::RaisingTarget => "Switching back to graphical target",
            RunlevelPhase::ConfirmingRaised => "Waiting for runlevel 5",
        }
    }
}

enum Transition {
    Advance(RunlevelPhase),
    Finish(WorkflowOutcome),
}

/// Query the runlevel afresh and compare it with `expected`
pub async fn check_runlevel(
    shell: &dyn RemoteShell,
    expected: &str,
) -> Result<PollOutcome, TransportError> {
    let output = shell
        .execute(&RemoteCommand::plain(CURRENT_RUNLEVEL))
        .await?;
    let current = commands::parse_runlevel(&output.stdout).unwrap_or("unknown");
    tracing::debug!("Runlevel is {} (want {})", current, expected);

    Ok(if current == expected {
        PollOutcome::Succeed
    } else {
        PollOutcome::Continue
    })
}

/// Drop to the non-graphical target, confirm, return to graphical, confirm
pub struct RunlevelRecoveryWorkflow<'a> {
    shell: &'a dyn RemoteShell,
    privilege: PrivilegeResolver,
    progress: &'a ProgressReporter,
    phase: RunlevelPhase,
}

impl<'a> RunlevelRecoveryWorkflow<'a> {
    pub fn new(shell: &'a dyn RemoteShell, password: &str, progress: &'a ProgressReporter) -> Self {
        Self {
            shell,
            privilege: PrivilegeResolver::new(password),
            progress,
            phase: RunlevelPhase::LoweringTarget,
        }
    }

    pub fn phase(&self) -> RunlevelPhase {
        self.phase
    }

    pub async fn run(&mut self) -> WorkflowOutcome {
        self.progress.phase(self.phase);

        let outcome = loop {
            match self.advance().await {
                Transition::Advance(next) => {
                    debug_assert!(next > self.phase);
                    tracing::info!("Runlevel recovery: {:?} -> {:?}", self.phase, next);
                    self.phase = next;
                    self.progress.phase(next);
                }
                Transition::Finish(outcome) => break outcome,
            }
        };

        if outcome.is_success() {
            self.progress.checkpoint(PROGRESS_DONE);
        } else {
            tracing::warn!("Runlevel recovery ended in {:?}: {:?}", self.phase, outcome);
            self.progress.reset();
        }
        outcome
    }

    /// Run the current phase and decide where to go next
    async fn advance(&mut self) -> Transition {
        match self.phase {
            RunlevelPhase::LoweringTarget => {
                let lower = commands::isolate(commands::LOWER_TARGET);
                if let Err(outcome) = issue_privileged(self.shell, &mut self.privilege, &lower).await {
                    return Transition::Finish(outcome);
                }
                self.progress.checkpoint(PROGRESS_COMMAND_ISSUED);
                settle(LOWER_SETTLE).await;
                Transition::Advance(RunlevelPhase::ConfirmingLowered)
            }
            RunlevelPhase::ConfirmingLowered => {
                match self
                    .confirm(CONFIRM_LOWERED_BUDGET, commands::LOWER_RUNLEVEL)
                    .await
                {
                    WorkflowOutcome::Success => Transition::Advance(RunlevelPhase::RaisingTarget),
                    other => Transition::Finish(other),
                }
            }
            RunlevelPhase::RaisingTarget => {
                let raise = commands::isolate(commands::RAISE_TARGET);
                if let Err(outcome) = issue_privileged(self.shell, &mut self.privilege, &raise).await {
                    return Transition::Finish(outcome);
                }
                self.progress.checkpoint(PROGRESS_TARGET_RAISED);
                settle(RAISE_SETTLE).await;
                Transition::Advance(RunlevelPhase::ConfirmingRaised)
            }
            RunlevelPhase::ConfirmingRaised => Transition::Finish(
                self.confirm(CONFIRM_RAISED_BUDGET, commands::RAISE_RUNLEVEL)
                    .await,
            ),
        }
    }

    async fn confirm(&self, budget: RetryBudget, expected: &'static str) -> WorkflowOutcome {
        let shell = self.shell;
        let progress = self.progress;
        poll(budget, |attempt| async move {
            progress.attempt(budget.label, attempt, budget.max_attempts);
            let verdict = check_runlevel(shell, expected).await;
            progress.checkpoint(PROGRESS_FIRST_CHECK);
            verdict
        })
        .await
    }
}
