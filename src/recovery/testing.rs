// Scripted remote host for workflow tests

use crate::error::{AuthError, TransportError};
use crate::remote::{CommandResult, Credentials, RemoteCommand, RemoteShell, SessionConnector};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone)]
pub enum Reply {
    Out(String),
    Exit(i32, String),
    Drop,
}

pub fn out(stdout: &str) -> Reply {
    Reply::Out(stdout.to_string())
}

/// Answers commands from per-command queues. The last reply of a queue
/// repeats once the queue runs dry; unknown commands succeed silently.
#[derive(Default)]
pub struct ScriptedShell {
    replies: Mutex<HashMap<String, VecDeque<Reply>>>,
    log: Mutex<Vec<RemoteCommand>>,
    dropped: AtomicBool,
    closed: AtomicUsize,
}

impl ScriptedShell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(self, command: &str, replies: impl IntoIterator<Item = Reply>) -> Self {
        self.replies
            .lock()
            .unwrap()
            .insert(command.to_string(), replies.into_iter().collect());
        self
    }

    /// Lines executed so far, in order
    pub fn lines(&self) -> Vec<String> {
        self.log.lock().unwrap().iter().map(|c| c.line.clone()).collect()
    }

    pub fn commands(&self) -> Vec<RemoteCommand> {
        self.log.lock().unwrap().clone()
    }

    pub fn count(&self, line: &str) -> usize {
        self.lines().iter().filter(|l| l.as_str() == line).count()
    }

    pub fn was_dropped(&self) -> bool {
        self.dropped.load(Ordering::SeqCst)
    }

    pub fn close_calls(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    fn next_reply(&self, line: &str) -> Reply {
        let mut replies = self.replies.lock().unwrap();
        let key = if replies.contains_key(line) {
            Some(line.to_string())
        } else {
            replies.keys().find(|k| line.starts_with(k.as_str())).cloned()
        };

        match key.and_then(|k| replies.get_mut(&k)) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) => queue.front().cloned().unwrap_or_else(|| out("")),
            None => out(""),
        }
    }
}

#[async_trait]
impl RemoteShell for ScriptedShell {
    async fn execute(&self, command: &RemoteCommand) -> Result<CommandResult, TransportError> {
        if !self.is_usable() {
            return Err(TransportError::new(&command.line, "session is closed"));
        }
        self.log.lock().unwrap().push(command.clone());

        match self.next_reply(&command.line) {
            Reply::Out(stdout) => Ok(CommandResult {
                stdout,
                stderr: String::new(),
                exit_status: 0,
            }),
            Reply::Exit(exit_status, stderr) => Ok(CommandResult {
                stdout: String::new(),
                stderr,
                exit_status,
            }),
            Reply::Drop => {
                self.dropped.store(true, Ordering::SeqCst);
                Err(TransportError::new(&command.line, "connection reset by peer"))
            }
        }
    }

    fn is_usable(&self) -> bool {
        !self.dropped.load(Ordering::SeqCst) && self.closed.load(Ordering::SeqCst) == 0
    }

    async fn close(&self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

/// Lets a test keep a handle on the shell after the orchestrator takes it
pub struct SharedShell(pub Arc<ScriptedShell>);

#[async_trait]
impl RemoteShell for SharedShell {
    async fn execute(&self, command: &RemoteCommand) -> Result<CommandResult, TransportError> {
        self.0.execute(command).await
    }

    fn is_usable(&self) -> bool {
        self.0.is_usable()
    }

    async fn close(&self) {
        self.0.close().await
    }
}

/// Hands out prepared shells in order, or a fixed error
#[derive(Default)]
pub struct ScriptedConnector {
    shells: Mutex<VecDeque<Arc<ScriptedShell>>>,
    error: Option<AuthError>,
    attempts: AtomicUsize,
}

impl ScriptedConnector {
    pub fn with_shells(shells: impl IntoIterator<Item = Arc<ScriptedShell>>) -> Self {
        Self {
            shells: Mutex::new(shells.into_iter().collect()),
            ..Self::default()
        }
    }

    pub fn failing(error: AuthError) -> Self {
        Self {
            error: Some(error),
            ..Self::default()
        }
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionConnector for ScriptedConnector {
    async fn connect(
        &self,
        credentials: &Credentials,
        _timeout: Duration,
    ) -> Result<Box<dyn RemoteShell>, AuthError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = &self.error {
            return Err(error.clone());
        }
        match self.shells.lock().unwrap().pop_front() {
            Some(shell) => Ok(Box::new(SharedShell(shell))),
            None => Err(AuthError::Unreachable {
                host: credentials.host().to_string(),
                message: "no route to host".to_string(),
            }),
        }
    }
}
