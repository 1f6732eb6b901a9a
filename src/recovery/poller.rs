// Budgeted polling of remote state

use crate::error::TransportError;
use crate::recovery::WorkflowOutcome;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Verdict of one predicate evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Continue,
    Succeed,
}

/// How many times, and how far apart, a check may run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryBudget {
    pub max_attempts: u32,
    pub interval: Duration,
    pub label: &'static str,
}

impl RetryBudget {
    pub const fn new(label: &'static str, max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
            label,
        }
    }
}

/// What the driver should do next
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollStep {
    /// Evaluate again after this delay
    Wait(Duration),
    Done(WorkflowOutcome),
}

/// Attempt bookkeeping for one polling loop, independent of any timer
#[derive(Debug, Clone)]
pub struct RetryPoller {
    budget: RetryBudget,
    attempts: u32,
}

impl RetryPoller {
    pub fn new(budget: RetryBudget) -> Self {
        Self {
            budget,
            attempts: 0,
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn remaining(&self) -> u32 {
        self.budget.max_attempts.saturating_sub(self.attempts)
    }

    /// Feed the result of one evaluation
    pub fn advance(&mut self, result: Result<PollOutcome, TransportError>) -> PollStep {
        self.attempts += 1;

        match result {
            Ok(PollOutcome::Succeed) => {
                if self.attempts > 1 {
                    tracing::info!(
                        "Check '{}' succeeded on attempt {}",
                        self.budget.label,
                        self.attempts
                    );
                }
                PollStep::Done(WorkflowOutcome::Success)
            }
            Ok(PollOutcome::Continue) if self.remaining() == 0 => {
                tracing::warn!(
                    "Check '{}' gave up after {} attempts",
                    self.budget.label,
                    self.attempts
                );
                PollStep::Done(WorkflowOutcome::not_confirmed(format!(
                    "retry budget exhausted ({}: {} attempts)",
                    self.budget.label, self.budget.max_attempts
                )))
            }
            Ok(PollOutcome::Continue) => {
                tracing::debug!(
                    "Check '{}' not satisfied on attempt {}/{}, retrying in {:?}",
                    self.budget.label,
                    self.attempts,
                    self.budget.max_attempts,
                    self.budget.interval
                );
                PollStep::Wait(self.budget.interval)
            }
            // a broken connection cannot be retried through
            Err(error) => {
                tracing::warn!(
                    "Check '{}' aborted on attempt {}: {}",
                    self.budget.label,
                    self.attempts,
                    error
                );
                PollStep::Done(WorkflowOutcome::TransportError(error.to_string()))
            }
        }
    }
}

/// Evaluate `predicate` until it succeeds, the budget runs out or the
/// transport fails. Waits are tokio timers, never thread sleeps.
pub async fn poll<F, Fut>(budget: RetryBudget, mut predicate: F) -> WorkflowOutcome
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<PollOutcome, TransportError>>,
{
    let mut poller = RetryPoller::new(budget);

    loop {
        let attempt = poller.attempts() + 1;
        match poller.advance(predicate(attempt).await) {
            PollStep::Wait(delay) => sleep(delay).await,
            PollStep::Done(outcome) => return outcome,
        }
    }
}
