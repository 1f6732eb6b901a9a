// Main application state and view routing

use crate::config::Config;
use crate::error::{DcvfixError, Result};
use crate::events::{key_event_to_action, spawn_recovery_forwarder, Action, AppEvent};
use crate::recovery::{FailureReason, RecoveryKind, RecoveryOrchestrator, RecoveryReport, WorkflowOutcome};
use crate::remote::SshConnector;
use crate::ui::{status_color, HelpState, LoginForm, RecoveryView};
use crossterm::event::{Event as CrosstermEvent, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Application views
#[derive(Debug)]
pub enum View {
    Login(LoginForm),
    Recovery(RecoveryView),
    Help(HelpState),
}

/// Main application state
pub struct App {
    pub view: View,
    /// View hidden behind the help screen
    parked: Option<View>,
    pub should_quit: bool,
    pub orchestrator: RecoveryOrchestrator,
    pub config: Config,
    pub tx: mpsc::Sender<AppEvent>,
    pub initiators_enabled: bool,
    pub cooling_down: bool,
    pub status_message: Option<String>,
    pub needs_full_redraw: bool,
    /// host and username of the last submitted login
    last_login: Option<(String, String)>,
    cooldown: Option<JoinHandle<()>>,
}

impl App {
    pub fn new(tx: mpsc::Sender<AppEvent>, config: Config, host: Option<String>) -> Self {
        let orchestrator = RecoveryOrchestrator::new(Arc::new(SshConnector))
            .with_port(config.ssh_port)
            .with_connect_timeout(config.connect_timeout());
        Self::with_orchestrator(tx, config, orchestrator, host)
    }

    pub fn with_orchestrator(
        tx: mpsc::Sender<AppEvent>,
        config: Config,
        orchestrator: RecoveryOrchestrator,
        host: Option<String>,
    ) -> Self {
        let form = LoginForm::new(host, config.default_username.clone());
        Self {
            view: View::Login(form),
            parked: None,
            should_quit: false,
            orchestrator,
            config,
            tx,
            initiators_enabled: false,
            cooling_down: false,
            status_message: None,
            needs_full_redraw: true,
            last_login: None,
            cooldown: None,
        }
    }

    /// The recovery view, also while help is shown on top of it
    fn recovery_view_mut(&mut self) -> Option<&mut RecoveryView> {
        match (&mut self.view, &mut self.parked) {
            (View::Recovery(view), _) => Some(view),
            (_, Some(View::Recovery(view))) => Some(view),
            _ => None,
        }
    }

    fn is_running(&self) -> bool {
        let running = |view: &View| matches!(view, View::Recovery(v) if v.running.is_some());
        running(&self.view) || self.parked.as_ref().is_some_and(running)
    }

    pub async fn handle_event(&mut self, event: AppEvent) -> Result<()> {
        match event {
            AppEvent::Input(crossterm_event) => {
                self.handle_input(crossterm_event)?;
            }
            AppEvent::Tick => {
                let step = self.config.progress_step;
                if let Some(view) = self.recovery_view_mut() {
                    view.tick(step);
                }
            }
            AppEvent::Quit => {
                self.should_quit = true;
            }
            AppEvent::LoginFinished(Ok(target)) => {
                tracing::info!("Login succeeded for {}", target);
                self.needs_full_redraw = true;
                self.parked = None;
                self.view = View::Recovery(RecoveryView::new(target.clone()));
                self.initiators_enabled = !self.cooling_down;
                self.status_message = Some(format!("✓ Logged in to {}", target));
            }
            AppEvent::LoginFinished(Err(err)) => {
                tracing::warn!("Login failed: {}", err);
                if let View::Login(form) = &mut self.view {
                    form.set_error(err.to_string());
                }
            }
            AppEvent::Recovery(event) => {
                if let Some(view) = self.recovery_view_mut() {
                    view.apply(event);
                }
            }
            AppEvent::RecoveryFinished(report) => {
                self.finish_recovery(report);
            }
            AppEvent::RecoveryRefused(message) => {
                tracing::warn!("Recovery refused: {}", message);
                if let Some(view) = self.recovery_view_mut() {
                    view.running = None;
                }
                self.initiators_enabled = !self.cooling_down;
                self.status_message = Some(format!("✗ {}", message));
            }
            AppEvent::InitiatorsReady => {
                self.cooling_down = false;
                self.cooldown = None;
                if !self.is_running() && self.recovery_view_mut().is_some() {
                    self.initiators_enabled = true;
                }
            }
        }

        Ok(())
    }

    fn handle_input(&mut self, event: CrosstermEvent) -> Result<()> {
        let CrosstermEvent::Key(key_event) = event else {
            return Ok(());
        };
        if key_event.kind != KeyEventKind::Press {
            return Ok(());
        }

        // Text editing keys belong to the focused login field
        if let View::Login(form) = &mut self.view {
            let editing = match key_event.code {
                KeyCode::Char(_) => !key_event.modifiers.contains(KeyModifiers::CONTROL),
                KeyCode::Backspace
                | KeyCode::Delete
                | KeyCode::Left
                | KeyCode::Right
                | KeyCode::Home
                | KeyCode::End => true,
                _ => false,
            };
            if editing {
                form.handle_input(&event);
                return Ok(());
            }
        }

        let action = key_event_to_action(key_event);

        match action {
            Action::Quit => {
                self.should_quit = true;
            }
            Action::ShowHelp if !matches!(self.view, View::Help(_)) => {
                self.show_help();
            }
            _ => match &mut self.view {
                View::Login(form) => match action {
                    Action::Submit => self.submit_login(),
                    Action::NextField => form.next_field(),
                    Action::PrevField => form.prev_field(),
                    Action::GoBack => self.should_quit = true,
                    _ => {}
                },
                View::Recovery(_) => match action {
                    Action::RestartService => self.start_recovery(RecoveryKind::ServiceRestart),
                    Action::CycleRunlevel => self.start_recovery(RecoveryKind::RunlevelCycle),
                    Action::Logout => self.logout(),
                    _ => {}
                },
                View::Help(_) => {
                    if matches!(action, Action::GoBack | Action::ShowHelp) {
                        self.close_help();
                    }
                }
            },
        }

        Ok(())
    }

    fn show_help(&mut self) {
        self.needs_full_redraw = true;
        let previous = std::mem::replace(&mut self.view, View::Help(HelpState::new()));
        self.parked = Some(previous);
    }

    fn close_help(&mut self) {
        if let Some(previous) = self.parked.take() {
            self.needs_full_redraw = true;
            self.view = previous;
        }
    }

    fn submit_login(&mut self) {
        let View::Login(form) = &mut self.view else {
            return;
        };
        if form.pending {
            return;
        }

        let (host, username, password) = form.values();
        form.set_pending();
        self.status_message = None;
        self.last_login = Some((host.clone(), username.clone()));

        let orchestrator = self.orchestrator.clone();
        let port = self.config.ssh_port;
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = orchestrator
                .login(&host, &username, &password)
                .await
                .map(|()| format!("{}@{}:{}", username, host, port));
            tx.send(AppEvent::LoginFinished(result)).await.ok();
        });
    }

    fn start_recovery(&mut self, kind: RecoveryKind) {
        if !self.initiators_enabled {
            return;
        }
        let Some(view) = self.recovery_view_mut() else {
            return;
        };
        view.start(kind);
        self.initiators_enabled = false;
        self.status_message = Some(format!("ℹ {} started", kind.label()));

        let orchestrator = self.orchestrator.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let (events_tx, events_rx) = mpsc::unbounded_channel();
            let forwarder = spawn_recovery_forwarder(events_rx, tx.clone());
            let result = orchestrator.run(kind, events_tx).await;
            // every progress event reaches the app before the outcome
            forwarder.await.ok();

            let event = match result {
                Ok(report) => AppEvent::RecoveryFinished(report),
                Err(e @ (DcvfixError::Busy | DcvfixError::NotAuthenticated)) => {
                    AppEvent::RecoveryRefused(e.to_string())
                }
                Err(e) => AppEvent::RecoveryRefused(format!("Recovery could not start: {}", e)),
            };
            tx.send(event).await.ok();
        });
    }

    fn finish_recovery(&mut self, report: RecoveryReport) {
        let message = report.message();
        let connection_lost = matches!(report.outcome, WorkflowOutcome::TransportError(_));
        let command_failed = matches!(
            report.outcome,
            WorkflowOutcome::Failure(FailureReason::CommandFailed { .. })
        );

        if connection_lost {
            // the session is gone; a fresh login is required
            let (host, username) = self.last_login.clone().unwrap_or_default();
            let mut form = LoginForm::new(Some(host), username);
            form.set_error(message.clone());
            self.needs_full_redraw = true;
            self.parked = None;
            self.view = View::Login(form);
        } else if let Some(view) = self.recovery_view_mut() {
            view.finish(report);
        }

        if connection_lost || command_failed {
            self.initiators_enabled = false;
            self.start_cooldown();
        } else {
            self.initiators_enabled = !self.cooling_down;
        }
        self.status_message = Some(message);
    }

    /// Keep the initiators disabled for the configured cooldown
    fn start_cooldown(&mut self) {
        if let Some(previous) = self.cooldown.take() {
            previous.abort();
        }
        self.cooling_down = true;
        let delay = self.config.initiator_cooldown();
        let tx = self.tx.clone();
        self.cooldown = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            tx.send(AppEvent::InitiatorsReady).await.ok();
        }));
    }

    fn logout(&mut self) {
        if self.is_running() {
            self.status_message = Some("✗ Wait for the running recovery to finish".to_string());
            return;
        }
        let (host, username) = self.last_login.clone().unwrap_or_default();
        self.needs_full_redraw = true;
        self.view = View::Login(LoginForm::new(Some(host), username));
        self.initiators_enabled = false;
        self.status_message = None;

        let orchestrator = self.orchestrator.clone();
        tokio::spawn(async move {
            orchestrator.logout().await;
        });
    }

    pub fn render(&mut self, frame: &mut Frame) {
        let area = frame.area();

        // Reserve space for status message if present
        let (content_area, status_area) = if self.status_message.is_some() {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Min(0),
                    Constraint::Length(4), // Status bar height: 1 top border + 2 content lines + 1 bottom border
                ])
                .split(area);
            (chunks[0], Some(chunks[1]))
        } else {
            (area, None)
        };

        match &mut self.view {
            View::Login(form) => {
                form.render(frame, content_area);
            }
            View::Recovery(view) => {
                view.render(frame, content_area, self.initiators_enabled);
            }
            View::Help(help) => {
                help.render(frame, content_area);
            }
        }

        if let (Some(status_area), Some(message)) = (status_area, &self.status_message) {
            let (color, prefix) = status_color(message);

            let status_line = Line::from(vec![
                Span::styled(prefix, Style::default().fg(color).add_modifier(Modifier::BOLD)),
                Span::raw(" "),
                Span::styled(
                    message
                        .trim_start_matches("✓ ")
                        .trim_start_matches("✗ ")
                        .trim_start_matches("ℹ "),
                    Style::default().fg(color),
                ),
            ]);

            let status_bar = Paragraph::new(status_line)
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .title(" Status ")
                        .border_style(Style::default().fg(color)),
                )
                .wrap(Wrap { trim: true });

            frame.render_widget(status_bar, status_area);
        }
    }
}
