// Event handling for the TUI application

use crate::error::AuthError;
use crate::recovery::{RecoveryEvent, RecoveryReport};
use crossterm::event::{Event as CrosstermEvent, KeyCode, KeyEvent, KeyModifiers};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Application events
#[derive(Debug)]
pub enum AppEvent {
    /// Periodic tick, drives the progress animation
    Tick,

    /// User input event
    Input(CrosstermEvent),

    /// Request to quit
    Quit,

    /// Login probe finished; carries user@host:port on success
    LoginFinished(Result<String, AuthError>),

    /// Progress, phase or attempt notification from a running workflow
    Recovery(RecoveryEvent),

    /// Terminal outcome of a workflow run
    RecoveryFinished(RecoveryReport),

    /// The orchestrator refused to start a run (busy or logged out)
    RecoveryRefused(String),

    /// Cooldown after a lost connection is over
    InitiatorsReady,
}

/// User actions derived from input events
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Quit,
    Submit,
    NextField,
    PrevField,
    GoBack,
    ShowHelp,

    // Recovery initiators
    RestartService,
    CycleRunlevel,

    Logout,

    None,
}

/// Convert keyboard input to actions
pub fn key_event_to_action(key: KeyEvent) -> Action {
    match (key.code, key.modifiers) {
        // Quit
        (KeyCode::Char('q'), KeyModifiers::NONE) => Action::Quit,
        (KeyCode::Char('c'), KeyModifiers::CONTROL) => Action::Quit,

        // Form navigation
        (KeyCode::Enter, _) => Action::Submit,
        (KeyCode::Tab, _) | (KeyCode::Down, _) => Action::NextField,
        (KeyCode::BackTab, _) | (KeyCode::Up, _) => Action::PrevField,
        (KeyCode::Esc, _) => Action::GoBack,

        // Recovery
        (KeyCode::Char('1'), KeyModifiers::NONE) => Action::RestartService,
        (KeyCode::Char('2'), KeyModifiers::NONE) => Action::CycleRunlevel,
        (KeyCode::Char('L'), KeyModifiers::SHIFT) => Action::Logout,

        (KeyCode::Char('?'), KeyModifiers::NONE) => Action::ShowHelp,

        _ => Action::None,
    }
}

/// Spawn input event handler task
pub async fn spawn_input_handler(tx: mpsc::Sender<AppEvent>) {
    tokio::spawn(async move {
        loop {
            if crossterm::event::poll(Duration::from_millis(100)).unwrap_or(false) {
                if let Ok(event) = crossterm::event::read() {
                    if tx.send(AppEvent::Input(event)).await.is_err() {
                        break;
                    }
                }
            }
        }
    });
}

/// Spawn periodic tick task
pub async fn spawn_ticker(tx: mpsc::Sender<AppEvent>, interval: Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(interval);
        loop {
            interval.tick().await;
            if tx.send(AppEvent::Tick).await.is_err() {
                break;
            }
        }
    });
}

/// Forward workflow notifications into the app channel. The task ends once
/// every sender is dropped, so awaiting it flushes the run's events.
pub fn spawn_recovery_forwarder(
    mut events: mpsc::UnboundedReceiver<RecoveryEvent>,
    tx: mpsc::Sender<AppEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            if tx.send(AppEvent::Recovery(event)).await.is_err() {
                break;
            }
        }
    })
}
