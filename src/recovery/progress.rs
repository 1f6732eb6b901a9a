// Progress checkpoints sent to the presentation layer

use crate::recovery::RunlevelPhase;
use std::sync::atomic::{AtomicU8, Ordering};
use tokio::sync::mpsc;

/// Progress checkpoints shared by both workflows
pub const PROGRESS_COMMAND_ISSUED: u8 = 20;
pub const PROGRESS_FIRST_CHECK: u8 = 50;
pub const PROGRESS_TARGET_RAISED: u8 = 75;
pub const PROGRESS_DONE: u8 = 100;

/// Notifications emitted while a workflow runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryEvent {
    Progress(u8),
    Phase(RunlevelPhase),
    Attempt {
        label: &'static str,
        attempt: u32,
        max_attempts: u32,
    },
}

/// Sends progress that never moves backwards, except for the reset on failure
#[derive(Debug)]
pub struct ProgressReporter {
    tx: mpsc::UnboundedSender<RecoveryEvent>,
    last: AtomicU8,
}

impl ProgressReporter {
    pub fn new(tx: mpsc::UnboundedSender<RecoveryEvent>) -> Self {
        Self {
            tx,
            last: AtomicU8::new(0),
        }
    }

    pub fn current(&self) -> u8 {
        self.last.load(Ordering::SeqCst)
    }

    pub fn checkpoint(&self, percent: u8) {
        let percent = percent.min(PROGRESS_DONE);
        let previous = self.last.fetch_max(percent, Ordering::SeqCst);
        if percent > previous {
            self.send(RecoveryEvent::Progress(percent));
        }
    }

    pub fn reset(&self) {
        self.last.store(0, Ordering::SeqCst);
        self.send(RecoveryEvent::Progress(0));
    }

    pub fn phase(&self, phase: RunlevelPhase) {
        self.send(RecoveryEvent::Phase(phase));
    }

    pub fn attempt(&self, label: &'static str, attempt: u32, max_attempts: u32) {
        self.send(RecoveryEvent::Attempt {
            label,
            attempt,
            max_attempts,
        });
    }

    fn send(&self, event: RecoveryEvent) {
        // the UI may already be gone on quit
        if self.tx.send(event).is_err() {
            tracing::debug!("Progress receiver dropped");
        }
    }
}
