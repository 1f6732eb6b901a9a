// Remote host access over SSH

pub mod commands;
pub mod credentials;
pub mod privilege;
pub mod probe;
pub mod session;

#[cfg(test)]
mod tests;

pub use credentials::{validate_host, Credentials};
pub use privilege::{wrap, PrivilegeResolver};
pub use probe::{LoginProbe, LOGIN_TIMEOUT};
pub use session::{
    CommandResult, RemoteCommand, RemoteSession, RemoteShell, SessionConnector, SshConnector,
};

#[cfg(test)]
pub use session::MockRemoteShell;
