// SSH session handling over libssh2

use crate::error::{AuthError, TransportError};
use crate::remote::Credentials;
use async_trait::async_trait;
use ssh2::{HashType, Session};
use std::fmt;
use std::io::{Read, Write};
use std::net::{Ipv4Addr, SocketAddr, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Upper bound for a single remote command; `systemctl isolate` waits for its job
const COMMAND_TIMEOUT: Duration = Duration::from_secs(120);

/// Output of one remote command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_status: i32,
}

impl CommandResult {
    pub fn success(&self) -> bool {
        self.exit_status == 0
    }
}

/// A command line plus optional stdin (the sudo password for escalated commands)
#[derive(Clone, PartialEq, Eq)]
pub struct RemoteCommand {
    pub line: String,
    pub stdin: Option<String>,
}

impl RemoteCommand {
    pub fn plain(line: impl Into<String>) -> Self {
        Self {
            line: line.into(),
            stdin: None,
        }
    }

    pub fn with_stdin(line: impl Into<String>, stdin: impl Into<String>) -> Self {
        Self {
            line: line.into(),
            stdin: Some(stdin.into()),
        }
    }
}

// stdin may carry a password, keep it out of logs
impl fmt::Debug for RemoteCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteCommand")
            .field("line", &self.line)
            .field("stdin", &self.stdin.as_ref().map(|_| "***"))
            .finish()
    }
}

impl fmt::Display for RemoteCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.line)
    }
}

/// One authenticated shell on the remote host.
///
/// Commands run strictly one after another. Once `execute` reports a
/// transport error the shell is unusable and every later call fails fast.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RemoteShell: Send + Sync {
    async fn execute(&self, command: &RemoteCommand) -> Result<CommandResult, TransportError>;

    fn is_usable(&self) -> bool;

    /// Release the transport. Safe to call more than once.
    async fn close(&self);
}

/// Opens authenticated shells
#[async_trait]
pub trait SessionConnector: Send + Sync {
    async fn connect(
        &self,
        credentials: &Credentials,
        timeout: Duration,
    ) -> Result<Box<dyn RemoteShell>, AuthError>;
}

/// Connector backed by libssh2 with password authentication
#[derive(Debug, Clone, Copy, Default)]
pub struct SshConnector;

#[async_trait]
impl SessionConnector for SshConnector {
    async fn connect(
        &self,
        credentials: &Credentials,
        timeout: Duration,
    ) -> Result<Box<dyn RemoteShell>, AuthError> {
        let session = RemoteSession::connect(credentials, timeout).await?;
        Ok(Box::new(session))
    }
}

/// Live SSH connection to a single host
pub struct RemoteSession {
    target: String,
    inner: Arc<Mutex<Option<Session>>>,
    connected: AtomicBool,
}

impl RemoteSession {
    /// One handshake and password login; never retries
    pub async fn connect(credentials: &Credentials, timeout: Duration) -> Result<Self, AuthError> {
        let creds = credentials.clone();
        let host = credentials.host().to_string();

        let session = tokio::task::spawn_blocking(move || connect_blocking(&creds, timeout))
            .await
            .map_err(|e| AuthError::Unreachable {
                host,
                message: format!("connection worker failed: {}", e),
            })??;

        tracing::info!("SSH session established to {}", credentials.target());

        Ok(Self {
            target: credentials.target(),
            inner: Arc::new(Mutex::new(Some(session))),
            connected: AtomicBool::new(true),
        })
    }
}

#[async_trait]
impl RemoteShell for RemoteSession {
    async fn execute(&self, command: &RemoteCommand) -> Result<CommandResult, TransportError> {
        if !self.is_usable() {
            return Err(TransportError::new(&command.line, "session is closed"));
        }

        tracing::debug!("[{}] $ {}", self.target, command.line);

        let inner = Arc::clone(&self.inner);
        let owned = command.clone();
        let result = tokio::task::spawn_blocking(move || {
            let guard = inner
                .lock()
                .map_err(|_| "session lock poisoned".to_string())?;
            let session = guard.as_ref().ok_or_else(|| "session is closed".to_string())?;
            run_blocking(session, &owned)
        })
        .await
        .map_err(|e| TransportError::new(&command.line, format!("command worker failed: {}", e)))
        .and_then(|r| r.map_err(|message| TransportError::new(&command.line, message)));

        match &result {
            Ok(output) => {
                tracing::debug!(
                    "[{}] exit={} stdout={:?} stderr={:?}",
                    self.target,
                    output.exit_status,
                    output.stdout,
                    output.stderr
                );
            }
            Err(e) => {
                tracing::warn!("[{}] {}", self.target, e);
                self.connected.store(false, Ordering::SeqCst);
            }
        }

        result
    }

    fn is_usable(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn close(&self) {
        self.connected.store(false, Ordering::SeqCst);

        let inner = Arc::clone(&self.inner);
        let target = self.target.clone();
        let _ = tokio::task::spawn_blocking(move || {
            let taken = inner.lock().ok().and_then(|mut guard| guard.take());
            if let Some(session) = taken {
                if let Err(e) = session.disconnect(None, "dcvfix finished", None) {
                    tracing::debug!("[{}] disconnect: {}", target, e);
                }
                tracing::info!("SSH session to {} closed", target);
            }
        })
        .await;
    }
}

fn connect_blocking(credentials: &Credentials, timeout: Duration) -> Result<Session, AuthError> {
    let host = credentials.host().to_string();
    let unreachable = |message: String| AuthError::Unreachable {
        host: host.clone(),
        message,
    };

    let octets = credentials
        .host()
        .split('.')
        .map(|octet| octet.parse::<u8>())
        .collect::<std::result::Result<Vec<u8>, _>>()
        .map_err(|e| unreachable(format!("invalid address: {}", e)))?;
    let [a, b, c, d]: [u8; 4] = octets
        .try_into()
        .map_err(|_| unreachable("invalid address".to_string()))?;
    let addr = SocketAddr::from((Ipv4Addr::new(a, b, c, d), credentials.port()));

    let tcp = TcpStream::connect_timeout(&addr, timeout).map_err(|e| {
        if e.kind() == std::io::ErrorKind::TimedOut {
            AuthError::Timeout {
                host: host.clone(),
                secs: timeout.as_secs(),
            }
        } else {
            unreachable(e.to_string())
        }
    })?;

    let mut session = Session::new().map_err(|e| unreachable(e.to_string()))?;
    session.set_tcp_stream(tcp);
    session.set_timeout(timeout.as_millis().min(u32::MAX as u128) as u32);
    session.handshake().map_err(|e| AuthError::Handshake {
        host: host.clone(),
        message: e.to_string(),
    })?;

    if let Some(hash) = session.host_key_hash(HashType::Sha256) {
        let fingerprint: Vec<String> = hash.iter().map(|b| format!("{:02x}", b)).collect();
        tracing::debug!("Host key for {} (accepted): {}", host, fingerprint.join(":"));
    }

    let rejected = |message: String| AuthError::Rejected {
        username: credentials.username().to_string(),
        host: host.clone(),
        message,
    };
    session
        .userauth_password(credentials.username(), credentials.password())
        .map_err(|e| rejected(e.to_string()))?;
    if !session.authenticated() {
        return Err(rejected("server did not accept the password".to_string()));
    }

    session.set_timeout(COMMAND_TIMEOUT.as_millis() as u32);
    Ok(session)
}

fn run_blocking(session: &Session, command: &RemoteCommand) -> Result<CommandResult, String> {
    let mut channel = session
        .channel_session()
        .map_err(|e| format!("Failed to open SSH channel: {}", e))?;
    channel
        .exec(&command.line)
        .map_err(|e| format!("Failed to execute remote command: {}", e))?;

    if let Some(input) = &command.stdin {
        channel
            .write_all(format!("{}\n", input).as_bytes())
            .map_err(|e| format!("Failed to write to remote stdin: {}", e))?;
        channel
            .flush()
            .map_err(|e| format!("Failed to flush remote stdin: {}", e))?;
    }
    channel
        .send_eof()
        .map_err(|e| format!("Failed to close remote stdin: {}", e))?;

    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    channel
        .read_to_end(&mut stdout)
        .map_err(|e| format!("Failed to read SSH stdout: {}", e))?;
    channel
        .stderr()
        .read_to_end(&mut stderr)
        .map_err(|e| format!("Failed to read SSH stderr: {}", e))?;
    channel
        .wait_close()
        .map_err(|e| format!("Failed while waiting for SSH command close: {}", e))?;
    let exit_status = channel
        .exit_status()
        .map_err(|e| format!("Failed to obtain SSH exit status: {}", e))?;

    Ok(CommandResult {
        stdout: String::from_utf8_lossy(&stdout).trim().to_string(),
        stderr: String::from_utf8_lossy(&stderr).trim().to_string(),
        exit_status,
    })
}
