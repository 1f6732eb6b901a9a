// Login credentials for one run

use crate::error::ValidationError;
use std::fmt;

/// Host, username and password for a single recovery run
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    host: String,
    username: String,
    password: String,
    port: u16,
}

impl Credentials {
    /// Build credentials, validating the host and username first
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let host = host.into().trim().to_string();
        let username = username.into().trim().to_string();

        validate_host(&host)?;
        if username.is_empty() {
            return Err(ValidationError::EmptyUsername);
        }

        Ok(Self {
            host,
            username,
            password: password.into(),
            port: 22,
        })
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// `user@host:port`, safe for logs
    pub fn target(&self) -> String {
        format!("{}@{}:{}", self.username, self.host, self.port)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("host", &self.host)
            .field("username", &self.username)
            .field("password", &"***")
            .field("port", &self.port)
            .finish()
    }
}

/// Accept only dotted-quad IPv4: four groups of 1-3 digits, each in 0..=255
pub fn validate_host(host: &str) -> Result<(), ValidationError> {
    let octets: Vec<&str> = host.split('.').collect();
    let valid = octets.len() == 4
        && octets.iter().all(|octet| {
            !octet.is_empty()
                && octet.len() <= 3
                && octet.bytes().all(|b| b.is_ascii_digit())
                && octet.parse::<u16>().map_or(false, |value| value <= 255)
        });

    if valid {
        Ok(())
    } else {
        Err(ValidationError::InvalidHost(host.to_string()))
    }
}
