// CASE 1: restart the DCV server and confirm it came back

use crate::error::TransportError;
use crate::recovery::poller::{poll, PollOutcome, RetryBudget};
use crate::recovery::progress::{
    ProgressReporter, PROGRESS_COMMAND_ISSUED, PROGRESS_DONE, PROGRESS_FIRST_CHECK,
};
use crate::recovery::steps::{issue_privileged, settle};
use crate::recovery::WorkflowOutcome;
use crate::remote::commands::{self, HOST_EPOCH};
use crate::remote::{PrivilegeResolver, RemoteCommand, RemoteShell};
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

pub const RESTART_SETTLE: Duration = Duration::from_secs(5);
pub const RESTART_VERIFY_BUDGET: RetryBudget =
    RetryBudget::new("dcvserver active and recently restarted", 2, Duration::from_secs(5));
/// Activation no older than this counts as our restart
pub const RESTART_WINDOW_SECS: i64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RestartState {
    Idle,
    Executing,
    Verifying,
    Retrying,
    Succeeded,
    Failed,
}

impl RestartState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => RestartState::Executing,
            2 => RestartState::Verifying,
            3 => RestartState::Retrying,
            4 => RestartState::Succeeded,
            5 => RestartState::Failed,
            _ => RestartState::Idle,
        }
    }
}

/// When the service last entered the active state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivationTime {
    /// Epoch seconds
    Known(i64),
    /// systemd reported an empty timestamp
    NeverActivated,
    /// A timestamp came back but the host could not convert it
    Unparseable(String),
}

/// One reading of the service state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSample {
    pub active_state: String,
    pub activation: ActivationTime,
    pub host_now: Option<i64>,
}

impl ServiceSample {
    pub fn recently_restarted(&self) -> bool {
        match (&self.activation, self.host_now) {
            (ActivationTime::Known(started), Some(now)) => now - started <= RESTART_WINDOW_SECS,
            _ => false,
        }
    }

    pub fn verdict(&self) -> PollOutcome {
        if self.active_state == "active" && self.recently_restarted() {
            PollOutcome::Succeed
        } else {
            PollOutcome::Continue
        }
    }
}

/// Query active state, activation time and the host clock
pub async fn sample_service(
    shell: &dyn RemoteShell,
    progress: &ProgressReporter,
) -> Result<ServiceSample, TransportError> {
    let active_state = shell
        .execute(&RemoteCommand::plain(commands::service_is_active()))
        .await?
        .stdout;
    let timestamp = shell
        .execute(&RemoteCommand::plain(commands::service_activation_timestamp()))
        .await?
        .stdout;
    progress.checkpoint(PROGRESS_FIRST_CHECK);

    let host_now = shell
        .execute(&RemoteCommand::plain(HOST_EPOCH))
        .await?
        .stdout
        .parse::<i64>()
        .ok();

    let activation = match commands::parse_property_value(&timestamp) {
        None => ActivationTime::NeverActivated,
        Some(value) => {
            let converted = shell
                .execute(&RemoteCommand::plain(commands::timestamp_to_epoch(value)))
                .await?;
            match converted.stdout.parse::<i64>() {
                Ok(epoch) => ActivationTime::Known(epoch),
                Err(_) => ActivationTime::Unparseable(value.to_string()),
            }
        }
    };

    match &activation {
        ActivationTime::NeverActivated => tracing::debug!("dcvserver has no activation timestamp"),
        ActivationTime::Unparseable(raw) => {
            tracing::warn!("Could not convert activation timestamp '{}'", raw)
        }
        ActivationTime::Known(_) => {}
    }

    Ok(ServiceSample {
        active_state,
        activation,
        host_now,
    })
}

/// Restart `dcvserver` and poll until it is active with a fresh activation time
pub struct ServiceRestartWorkflow<'a> {
    shell: &'a dyn RemoteShell,
    privilege: PrivilegeResolver,
    progress: &'a ProgressReporter,
    state: AtomicU8,
}

impl<'a> ServiceRestartWorkflow<'a> {
    pub fn new(shell: &'a dyn RemoteShell, password: &str, progress: &'a ProgressReporter) -> Self {
        Self {
            shell,
            privilege: PrivilegeResolver::new(password),
            progress,
            state: AtomicU8::new(RestartState::Idle as u8),
        }
    }

    pub fn state(&self) -> RestartState {
        RestartState::from_u8(self.state.load(Ordering::SeqCst))
    }

    fn transition(&self, next: RestartState) {
        let previous = RestartState::from_u8(self.state.swap(next as u8, Ordering::SeqCst));
        if previous != next {
            tracing::debug!("Service restart: {:?} -> {:?}", previous, next);
        }
    }

    pub async fn run(&mut self) -> WorkflowOutcome {
        let outcome = self.execute().await;

        if outcome.is_success() {
            self.transition(RestartState::Succeeded);
            self.progress.checkpoint(PROGRESS_DONE);
        } else {
            self.transition(RestartState::Failed);
            self.progress.reset();
        }
        outcome
    }

    async fn execute(&mut self) -> WorkflowOutcome {
        self.transition(RestartState::Executing);
        if let Err(outcome) =
            issue_privileged(self.shell, &mut self.privilege, &commands::restart_service()).await
        {
            return outcome;
        }
        self.progress.checkpoint(PROGRESS_COMMAND_ISSUED);

        settle(RESTART_SETTLE).await;

        let shell = self.shell;
        let progress = self.progress;
        let this = &*self;
        poll(RESTART_VERIFY_BUDGET, |attempt| async move {
            if attempt > 1 {
                this.transition(RestartState::Retrying);
            }
            this.transition(RestartState::Verifying);
            progress.attempt(
                RESTART_VERIFY_BUDGET.label,
                attempt,
                RESTART_VERIFY_BUDGET.max_attempts,
            );

            let sample = sample_service(shell, progress).await?;
            tracing::info!(
                "dcvserver is '{}', recently restarted: {}",
                sample.active_state,
                sample.recently_restarted()
            );
            Ok(sample.verdict())
        })
        .await
    }
}
