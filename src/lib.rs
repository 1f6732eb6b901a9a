// dcvfix - DCV remote recovery TUI
// Library root

pub mod app;
pub mod config;
pub mod error;
pub mod events;
pub mod recovery;
pub mod remote;
pub mod ui;
pub mod version;

// Test modules (only compiled during tests)
#[cfg(test)]
mod app_tests;
