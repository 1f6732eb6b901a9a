// Owns the credentials and session for one run and runs one workflow at a time

use crate::error::{AuthError, DcvfixError};
use crate::recovery::progress::{ProgressReporter, RecoveryEvent};
use crate::recovery::{
    RecoveryKind, RecoveryReport, RunlevelRecoveryWorkflow, ServiceRestartWorkflow,
    WorkflowOutcome,
};
use crate::remote::{Credentials, LoginProbe, RemoteShell, SessionConnector, LOGIN_TIMEOUT};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};

#[derive(Default)]
struct RunState {
    credentials: Option<Credentials>,
    /// Session handed over by the login probe, used by the next workflow
    session: Option<Box<dyn RemoteShell>>,
    authenticated: bool,
}

/// Entry point of the recovery engine.
///
/// Cloning shares the same run. While a workflow is active every other
/// call to [`RecoveryOrchestrator::run`] is refused with `Busy`.
#[derive(Clone)]
pub struct RecoveryOrchestrator {
    connector: Arc<dyn SessionConnector>,
    port: u16,
    connect_timeout: Duration,
    state: Arc<Mutex<RunState>>,
}

impl RecoveryOrchestrator {
    pub fn new(connector: Arc<dyn SessionConnector>) -> Self {
        Self {
            connector,
            port: 22,
            connect_timeout: LOGIN_TIMEOUT,
            state: Arc::new(Mutex::new(RunState::default())),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub async fn is_authenticated(&self) -> bool {
        self.state.lock().await.authenticated
    }

    /// Probe the login; on success keep the credentials and the live session
    pub async fn login(&self, host: &str, username: &str, password: &str) -> Result<(), AuthError> {
        let (credentials, shell) = LoginProbe::new(self.connector.as_ref())
            .with_port(self.port)
            .with_timeout(self.connect_timeout)
            .probe(host, username, password)
            .await?;

        let mut state = self.state.lock().await;
        if let Some(previous) = state.session.take() {
            previous.close().await;
        }
        tracing::info!("Logged in as {}", credentials.target());
        state.credentials = Some(credentials);
        state.session = Some(shell);
        state.authenticated = true;
        Ok(())
    }

    /// Forget the credentials and close any session kept from the probe
    pub async fn logout(&self) {
        let mut state = self.state.lock().await;
        if let Some(session) = state.session.take() {
            session.close().await;
        }
        state.credentials = None;
        state.authenticated = false;
        tracing::info!("Logged out");
    }

    /// Run one recovery to its terminal outcome. The session is always closed
    /// afterwards; a transport error also drops the login.
    pub async fn run(
        &self,
        kind: RecoveryKind,
        events: mpsc::UnboundedSender<RecoveryEvent>,
    ) -> Result<RecoveryReport, DcvfixError> {
        let mut state = self.state.try_lock().map_err(|_| DcvfixError::Busy)?;
        if !state.authenticated {
            return Err(DcvfixError::NotAuthenticated);
        }
        let credentials = state
            .credentials
            .clone()
            .ok_or(DcvfixError::NotAuthenticated)?;

        tracing::info!("Starting {} on {}", kind.label(), credentials.target());
        let progress = ProgressReporter::new(events);

        let shell = match state.session.take() {
            Some(shell) if shell.is_usable() => shell,
            stale => {
                if let Some(shell) = stale {
                    shell.close().await;
                }
                match self.connector.connect(&credentials, self.connect_timeout).await {
                    Ok(shell) => shell,
                    Err(e) => {
                        state.authenticated = false;
                        progress.reset();
                        let report =
                            RecoveryReport::new(kind, WorkflowOutcome::TransportError(e.to_string()));
                        tracing::warn!("{}", report.message());
                        return Ok(report);
                    }
                }
            }
        };

        let outcome = match kind {
            RecoveryKind::ServiceRestart => {
                ServiceRestartWorkflow::new(shell.as_ref(), credentials.password(), &progress)
                    .run()
                    .await
            }
            RecoveryKind::RunlevelCycle => {
                RunlevelRecoveryWorkflow::new(shell.as_ref(), credentials.password(), &progress)
                    .run()
                    .await
            }
        };

        shell.close().await;
        if matches!(outcome, WorkflowOutcome::TransportError(_)) {
            state.authenticated = false;
        }

        let report = RecoveryReport::new(kind, outcome);
        tracing::info!("{}", report.message());
        Ok(report)
    }
}
