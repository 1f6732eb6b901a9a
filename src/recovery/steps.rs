// Steps shared by both workflows

use crate::recovery::{FailureReason, WorkflowOutcome};
use crate::remote::{CommandResult, PrivilegeResolver, RemoteShell};
use std::time::Duration;

/// Resolve the identity, then run `command` with escalation if needed.
/// A non-zero exit ends the workflow as a command failure.
pub async fn issue_privileged(
    shell: &dyn RemoteShell,
    privilege: &mut PrivilegeResolver,
    command: &str,
) -> Result<CommandResult, WorkflowOutcome> {
    privilege
        .current_identity(shell)
        .await
        .map_err(|e| WorkflowOutcome::TransportError(e.to_string()))?;
    if !privilege.is_superuser() {
        tracing::debug!("Escalating '{}' with sudo", command);
    }

    let wrapped = privilege.wrap(command);
    let output = shell
        .execute(&wrapped)
        .await
        .map_err(|e| WorkflowOutcome::TransportError(e.to_string()))?;

    if !output.success() {
        tracing::warn!(
            "'{}' exited with {}: {}",
            command,
            output.exit_status,
            output.stderr
        );
        return Err(WorkflowOutcome::Failure(FailureReason::CommandFailed {
            command: command.to_string(),
            exit_status: output.exit_status,
            stderr: output.stderr,
        }));
    }

    tracing::info!("Issued '{}'", command);
    Ok(output)
}

/// Give the remote action time to take effect
pub async fn settle(delay: Duration) {
    tracing::debug!("Settling for {:?}", delay);
    tokio::time::sleep(delay).await;
}
