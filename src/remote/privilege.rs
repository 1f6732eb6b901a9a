// Privilege escalation for remote commands

use crate::error::TransportError;
use crate::remote::commands::{SUDO_PREFIX, SUPERUSER, WHOAMI};
use crate::remote::{RemoteCommand, RemoteShell};

/// Shape `command` for `identity`: unchanged for root, sudo-wrapped otherwise.
/// The escalated form reads the password from stdin.
pub fn wrap(command: &str, identity: &str, password: &str) -> RemoteCommand {
    if identity == SUPERUSER {
        RemoteCommand::plain(command)
    } else {
        RemoteCommand::with_stdin(format!("{} {}", SUDO_PREFIX, command), password)
    }
}

/// Remembers who we are logged in as for the length of one workflow run.
/// Create a fresh resolver per run; the identity is never carried over.
pub struct PrivilegeResolver {
    password: String,
    identity: Option<String>,
}

impl PrivilegeResolver {
    pub fn new(password: impl Into<String>) -> Self {
        Self {
            password: password.into(),
            identity: None,
        }
    }

    /// Query `whoami` on first use, then answer from the cache
    pub async fn current_identity(
        &mut self,
        shell: &dyn RemoteShell,
    ) -> Result<&str, TransportError> {
        if self.identity.is_none() {
            let output = shell.execute(&RemoteCommand::plain(WHOAMI)).await?;
            tracing::info!("Remote identity: {}", output.stdout);
            self.identity = Some(output.stdout);
        }
        Ok(self.identity.as_deref().unwrap_or_default())
    }

    /// Wrap using the cached identity. Before resolution, escalate.
    pub fn wrap(&self, command: &str) -> RemoteCommand {
        wrap(
            command,
            self.identity.as_deref().unwrap_or_default(),
            &self.password,
        )
    }

    pub fn is_superuser(&self) -> bool {
        self.identity.as_deref() == Some(SUPERUSER)
    }
}
