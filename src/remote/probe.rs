// One-shot login check

use crate::error::AuthError;
use crate::remote::{Credentials, RemoteShell, SessionConnector};
use std::time::Duration;

pub const LOGIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Validates the login form and makes exactly one connection attempt.
/// Retrying is left to the operator.
pub struct LoginProbe<'a> {
    connector: &'a dyn SessionConnector,
    port: u16,
    timeout: Duration,
}

impl<'a> LoginProbe<'a> {
    pub fn new(connector: &'a dyn SessionConnector) -> Self {
        Self {
            connector,
            port: 22,
            timeout: LOGIN_TIMEOUT,
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Invalid input returns before any network activity
    pub async fn probe(
        &self,
        host: &str,
        username: &str,
        password: &str,
    ) -> Result<(Credentials, Box<dyn RemoteShell>), AuthError> {
        let credentials = Credentials::new(host, username, password)?.with_port(self.port);

        tracing::info!("Login attempt for {}", credentials.target());
        match self.connector.connect(&credentials, self.timeout).await {
            Ok(shell) => Ok((credentials, shell)),
            Err(e) => {
                tracing::warn!("Login failed for {}: {}", credentials.target(), e);
                Err(e)
            }
        }
    }
}
