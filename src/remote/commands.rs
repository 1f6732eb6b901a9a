// Fixed remote command surface. Nothing here is built from operator input.

/// The display-virtualization service unit
pub const DCV_SERVICE: &str = "dcvserver";

/// Non-graphical target and the runlevel it reports
pub const LOWER_TARGET: &str = "multi-user.target";
pub const LOWER_RUNLEVEL: &str = "3";

/// Graphical target and the runlevel it reports
pub const RAISE_TARGET: &str = "graphical.target";
pub const RAISE_RUNLEVEL: &str = "5";

pub const SUPERUSER: &str = "root";

pub const WHOAMI: &str = "whoami";
pub const CURRENT_RUNLEVEL: &str = "runlevel";
pub const HOST_EPOCH: &str = "date +%s";

/// Prefix for escalated commands; the password is fed on stdin
pub const SUDO_PREFIX: &str = "sudo -S -p ''";

pub fn restart_service() -> String {
    format!("systemctl restart {}", DCV_SERVICE)
}

pub fn service_is_active() -> String {
    format!("systemctl is-active {}", DCV_SERVICE)
}

pub fn service_activation_timestamp() -> String {
    format!("systemctl show {} --property=ActiveEnterTimestamp", DCV_SERVICE)
}

pub fn isolate(target: &str) -> String {
    format!("systemctl isolate {}", target)
}

/// Convert a timestamp printed by systemd into epoch seconds on the host.
/// The value comes from the host itself; quotes are stripped so it stays a
/// single shell word.
pub fn timestamp_to_epoch(timestamp: &str) -> String {
    let cleaned: String = timestamp
        .chars()
        .filter(|c| !matches!(c, '\'' | '"' | '\\' | '`' | '$'))
        .collect();
    format!("date -d '{}' +%s", cleaned)
}

/// Pick the current level out of `runlevel` output (`N 5` -> `5`)
pub fn parse_runlevel(output: &str) -> Option<&str> {
    output.split_whitespace().last()
}

/// Pick the value out of `ActiveEnterTimestamp=...`; empty means never activated
pub fn parse_property_value(output: &str) -> Option<&str> {
    output
        .split_once('=')
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
}
