#[cfg(test)]
mod tests {
    use crate::app::*;
    use crate::config::Config;
    use crate::error::{AuthError, Result};
    use crate::events::{key_event_to_action, Action, AppEvent};
    use crate::recovery::testing::{out, Reply, ScriptedConnector, ScriptedShell};
    use crate::recovery::{RecoveryEvent, RecoveryKind, RecoveryOrchestrator};
    use crossterm::event::{Event as CrosstermEvent, KeyCode, KeyEvent, KeyModifiers};
    use std::sync::Arc;
    use tokio::sync::mpsc;

    fn key(code: KeyCode) -> AppEvent {
        AppEvent::Input(CrosstermEvent::Key(KeyEvent::new(code, KeyModifiers::NONE)))
    }

    fn test_app(connector: Arc<ScriptedConnector>) -> (App, mpsc::Receiver<AppEvent>) {
        let (tx, rx) = mpsc::channel(100);
        let orchestrator = RecoveryOrchestrator::new(connector);
        (App::with_orchestrator(tx, Config::default(), orchestrator, None), rx)
    }

    async fn type_text(app: &mut App, text: &str) -> Result<()> {
        for c in text.chars() {
            app.handle_event(key(KeyCode::Char(c))).await?;
        }
        Ok(())
    }

    async fn fill_login(app: &mut App, host: &str, username: &str, password: &str) -> Result<()> {
        type_text(app, host).await?;
        app.handle_event(key(KeyCode::Tab)).await?;
        type_text(app, username).await?;
        app.handle_event(key(KeyCode::Tab)).await?;
        type_text(app, password).await?;
        app.handle_event(key(KeyCode::Enter)).await
    }

    /// Feed events into the app until `stop` matches; returns the progress values seen
    async fn pump_until(
        app: &mut App,
        rx: &mut mpsc::Receiver<AppEvent>,
        stop: impl Fn(&AppEvent) -> bool,
    ) -> Result<Vec<u8>> {
        let mut progress = Vec::new();
        while let Some(event) = rx.recv().await {
            if let AppEvent::Recovery(RecoveryEvent::Progress(p)) = &event {
                progress.push(*p);
            }
            let done = stop(&event);
            app.handle_event(event).await?;
            if done {
                return Ok(progress);
            }
        }
        anyhow::bail!("event channel closed")
    }

    fn recovery_view(app: &App) -> &crate::ui::RecoveryView {
        match &app.view {
            View::Recovery(view) => view,
            other => panic!("expected recovery view, got {:?}", other),
        }
    }

    fn restarting_host() -> ScriptedShell {
        ScriptedShell::new()
            .on("whoami", [out("root")])
            .on("systemctl is-active dcvserver", [out("activating"), out("active")])
            .on(
                "systemctl show dcvserver --property=ActiveEnterTimestamp",
                [out("ActiveEnterTimestamp=Thu 2024-01-04 10:00:05 UTC")],
            )
            .on("date +%s", [out("1704362410")])
            .on("date -d", [out("1704362405")])
    }

    #[test]
    fn test_action_conversions() {
        let action = |code, modifiers| key_event_to_action(KeyEvent::new(code, modifiers));

        assert_eq!(action(KeyCode::Char('q'), KeyModifiers::NONE), Action::Quit);
        assert_eq!(action(KeyCode::Char('c'), KeyModifiers::CONTROL), Action::Quit);
        assert_eq!(action(KeyCode::Enter, KeyModifiers::NONE), Action::Submit);
        assert_eq!(action(KeyCode::Tab, KeyModifiers::NONE), Action::NextField);
        assert_eq!(action(KeyCode::BackTab, KeyModifiers::SHIFT), Action::PrevField);
        assert_eq!(action(KeyCode::Char('1'), KeyModifiers::NONE), Action::RestartService);
        assert_eq!(action(KeyCode::Char('2'), KeyModifiers::NONE), Action::CycleRunlevel);
        assert_eq!(action(KeyCode::Char('L'), KeyModifiers::SHIFT), Action::Logout);
        assert_eq!(action(KeyCode::Char('?'), KeyModifiers::NONE), Action::ShowHelp);
        assert_eq!(action(KeyCode::Char('x'), KeyModifiers::NONE), Action::None);
    }

    #[tokio::test]
    async fn test_app_starts_on_login_form() {
        let (app, _rx) = test_app(Arc::new(ScriptedConnector::default()));
        assert!(!app.should_quit);
        assert!(!app.initiators_enabled);
        assert!(matches!(app.view, View::Login(_)));
    }

    #[tokio::test]
    async fn test_typing_fills_login_fields() -> Result<()> {
        let (mut app, _rx) = test_app(Arc::new(ScriptedConnector::default()));

        // 'q' is text here, not quit
        type_text(&mut app, "10.0.0.5").await?;
        app.handle_event(key(KeyCode::Tab)).await?;
        type_text(&mut app, "dcvq").await?;
        app.handle_event(key(KeyCode::Backspace)).await?;
        app.handle_event(key(KeyCode::Tab)).await?;
        type_text(&mut app, "pw").await?;

        let View::Login(form) = &app.view else {
            panic!("expected login view");
        };
        assert_eq!(
            form.values(),
            ("10.0.0.5".to_string(), "dcv".to_string(), "pw".to_string())
        );
        assert!(!app.should_quit);
        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_host_is_rejected_without_connecting() -> Result<()> {
        let connector = Arc::new(ScriptedConnector::default());
        let (mut app, mut rx) = test_app(connector.clone());

        fill_login(&mut app, "10.0.0.300", "root", "pw").await?;
        pump_until(&mut app, &mut rx, |e| matches!(e, AppEvent::LoginFinished(_))).await?;

        let View::Login(form) = &app.view else {
            panic!("expected login view");
        };
        assert!(form.error.as_deref().unwrap_or_default().contains("Invalid host"));
        assert!(!form.pending);
        assert_eq!(connector.attempts(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_rejected_login_keeps_form_and_clears_password() -> Result<()> {
        let connector = Arc::new(ScriptedConnector::failing(AuthError::Rejected {
            username: "root".to_string(),
            host: "10.0.0.5".to_string(),
            message: "Authentication failed".to_string(),
        }));
        let (mut app, mut rx) = test_app(connector);

        fill_login(&mut app, "10.0.0.5", "root", "wrong").await?;
        pump_until(&mut app, &mut rx, |e| matches!(e, AppEvent::LoginFinished(_))).await?;

        let View::Login(form) = &app.view else {
            panic!("expected login view");
        };
        assert!(form.error.as_deref().unwrap_or_default().contains("Authentication failed"));
        assert_eq!(form.values().2, "");
        assert_eq!(form.values().0, "10.0.0.5");
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_login_and_restart_end_to_end() -> Result<()> {
        let shell = Arc::new(restarting_host());
        let connector = Arc::new(ScriptedConnector::with_shells([shell.clone()]));
        let (mut app, mut rx) = test_app(connector);

        fill_login(&mut app, "10.0.0.5", "root", "pw").await?;
        pump_until(&mut app, &mut rx, |e| matches!(e, AppEvent::LoginFinished(_))).await?;
        assert_eq!(recovery_view(&app).target, "root@10.0.0.5:22");
        assert!(app.initiators_enabled);

        app.handle_event(key(KeyCode::Char('1'))).await?;
        assert!(!app.initiators_enabled);
        assert_eq!(recovery_view(&app).running, Some(RecoveryKind::ServiceRestart));

        // a second press while running is ignored
        app.handle_event(key(KeyCode::Char('2'))).await?;
        assert_eq!(recovery_view(&app).running, Some(RecoveryKind::ServiceRestart));

        let progress =
            pump_until(&mut app, &mut rx, |e| matches!(e, AppEvent::RecoveryFinished(_))).await?;
        assert_eq!(progress, vec![20, 50, 100]);
        assert!(app.initiators_enabled);
        assert!(app.status_message.as_deref().unwrap_or_default().starts_with('✓'));

        let view = recovery_view(&app);
        assert_eq!(view.running, None);
        assert_eq!(view.reported, 100);
        assert!(view.last_report.as_ref().is_some_and(|r| r.outcome.is_success()));

        for _ in 0..60 {
            app.handle_event(AppEvent::Tick).await?;
        }
        assert_eq!(recovery_view(&app).displayed, 100);
        assert_eq!(shell.count("systemctl restart dcvserver"), 1);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_connection_drop_returns_to_login_after_cooldown() -> Result<()> {
        let shell = Arc::new(
            ScriptedShell::new()
                .on("whoami", [out("root")])
                .on("runlevel", [out("N 5"), Reply::Drop]),
        );
        let connector = Arc::new(ScriptedConnector::with_shells([shell.clone()]));
        let (mut app, mut rx) = test_app(connector);

        fill_login(&mut app, "10.0.0.5", "root", "pw").await?;
        pump_until(&mut app, &mut rx, |e| matches!(e, AppEvent::LoginFinished(_))).await?;
        app.handle_event(key(KeyCode::Char('2'))).await?;
        pump_until(&mut app, &mut rx, |e| matches!(e, AppEvent::RecoveryFinished(_))).await?;

        let View::Login(form) = &app.view else {
            panic!("expected login view after a lost connection");
        };
        assert!(form.error.as_deref().unwrap_or_default().contains("Log in again"));
        assert_eq!(form.values().0, "10.0.0.5");
        assert!(shell.was_dropped());
        assert!(!app.orchestrator.is_authenticated().await);
        assert!(app.cooling_down);
        assert!(!app.initiators_enabled);

        let started = tokio::time::Instant::now();
        pump_until(&mut app, &mut rx, |e| matches!(e, AppEvent::InitiatorsReady)).await?;
        assert!(started.elapsed() >= Config::default().initiator_cooldown());
        assert!(!app.cooling_down);
        // still logged out, nothing to enable yet
        assert!(!app.initiators_enabled);
        Ok(())
    }

    #[tokio::test]
    async fn test_help_keeps_recovery_state() -> Result<()> {
        let (mut app, _rx) = test_app(Arc::new(ScriptedConnector::default()));
        app.handle_event(AppEvent::LoginFinished(Ok("root@10.0.0.5:22".to_string())))
            .await?;
        app.handle_event(AppEvent::Recovery(RecoveryEvent::Progress(50)))
            .await?;

        app.handle_event(key(KeyCode::Char('?'))).await?;
        assert!(matches!(app.view, View::Help(_)));
        // progress keeps flowing into the hidden view
        app.handle_event(AppEvent::Recovery(RecoveryEvent::Progress(75)))
            .await?;

        app.handle_event(key(KeyCode::Esc)).await?;
        assert_eq!(recovery_view(&app).reported, 75);
        assert_eq!(recovery_view(&app).target, "root@10.0.0.5:22");
        Ok(())
    }

    #[tokio::test]
    async fn test_refused_run_reenables_initiators() -> Result<()> {
        // the orchestrator never logged in, so the run is refused
        let (mut app, mut rx) = test_app(Arc::new(ScriptedConnector::default()));
        app.handle_event(AppEvent::LoginFinished(Ok("root@10.0.0.5:22".to_string())))
            .await?;

        app.handle_event(key(KeyCode::Char('1'))).await?;
        pump_until(&mut app, &mut rx, |e| matches!(e, AppEvent::RecoveryRefused(_))).await?;

        assert!(app.initiators_enabled);
        assert_eq!(recovery_view(&app).running, None);
        assert!(app.status_message.as_deref().unwrap_or_default().contains("Not logged in"));
        Ok(())
    }

    #[tokio::test]
    async fn test_logout_returns_to_prefilled_login() -> Result<()> {
        let shell = Arc::new(ScriptedShell::new());
        let connector = Arc::new(ScriptedConnector::with_shells([shell]));
        let (mut app, mut rx) = test_app(connector);

        fill_login(&mut app, "10.0.0.5", "dcvadmin", "pw").await?;
        pump_until(&mut app, &mut rx, |e| matches!(e, AppEvent::LoginFinished(_))).await?;

        app.handle_event(AppEvent::Input(CrosstermEvent::Key(KeyEvent::new(
            KeyCode::Char('L'),
            KeyModifiers::SHIFT,
        ))))
        .await?;

        let View::Login(form) = &app.view else {
            panic!("expected login view");
        };
        assert_eq!(form.values().0, "10.0.0.5");
        assert_eq!(form.values().1, "dcvadmin");
        assert!(!app.initiators_enabled);
        Ok(())
    }

    #[tokio::test]
    async fn test_quit() -> Result<()> {
        let (mut app, _rx) = test_app(Arc::new(ScriptedConnector::default()));
        app.handle_event(AppEvent::Quit).await?;
        assert!(app.should_quit);

        let (mut app, _rx) = test_app(Arc::new(ScriptedConnector::default()));
        app.handle_event(AppEvent::Input(CrosstermEvent::Key(KeyEvent::new(
            KeyCode::Char('c'),
            KeyModifiers::CONTROL,
        ))))
        .await?;
        assert!(app.should_quit);
        Ok(())
    }
}
