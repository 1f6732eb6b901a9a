// Help view implementation

use crate::recovery::RecoveryKind;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

#[derive(Debug)]
pub struct HelpState;

impl Default for HelpState {
    fn default() -> Self {
        Self::new()
    }
}

impl HelpState {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&mut self, frame: &mut Frame, area: Rect) {
        frame.render_widget(Clear, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),  // Header
                Constraint::Min(0),    // Content
                Constraint::Length(1),  // Footer
            ])
            .split(area);

        let header = Paragraph::new("dcvfix Help")
            .style(
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )
            .alignment(ratatui::layout::Alignment::Center)
            .block(Block::default().borders(Borders::ALL));

        frame.render_widget(header, chunks[0]);

        let section = |title: &'static str| {
            Line::from(vec![
                Span::styled(title, Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
                Span::raw(": "),
            ])
        };

        let help_content = vec![
            section("Login"),
            Line::from("  Tab/↓ Shift+Tab/↑ - Move between fields"),
            Line::from("  Enter             - Log in"),
            Line::from("  Esc               - Quit"),
            Line::from(""),
            section("Recovery"),
            Line::from(format!(
                "  1             - {} ({})",
                RecoveryKind::ServiceRestart.label(),
                RecoveryKind::ServiceRestart.symptom()
            )),
            Line::from(format!(
                "  2             - {} ({})",
                RecoveryKind::RunlevelCycle.label(),
                RecoveryKind::RunlevelCycle.symptom()
            )),
            Line::from("  Shift+L       - Log out and return to the login form"),
            Line::from(""),
            section("Outcomes"),
            Line::from("  could not confirm the fix - the host answered but the check never passed"),
            Line::from("  command failed            - the host refused the command, escalate"),
            Line::from("  could not reach the host  - connection lost, log in again"),
            Line::from(""),
            section("General"),
            Line::from("  ?             - Show this help"),
            Line::from("  q/Ctrl+C      - Quit"),
        ];

        let help_paragraph = Paragraph::new(help_content)
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Keyboard Shortcuts"),
            );

        frame.render_widget(help_paragraph, chunks[1]);

        let footer = Paragraph::new("Esc to return")
            .style(Style::default().fg(Color::DarkGray))
            .alignment(ratatui::layout::Alignment::Center);

        frame.render_widget(footer, chunks[2]);
    }
}
