// Login form: host, username and password for the remote DCV host

use crate::ui::styles::{help_style, title_style, ERROR, PRIMARY, WARNING};
use crossterm::event::Event as CrosstermEvent;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Position, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};
use tui_input::backend::crossterm::EventHandler;
use tui_input::Input;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoginField {
    #[default]
    Host,
    Username,
    Password,
}

impl LoginField {
    pub fn next(self) -> Self {
        match self {
            LoginField::Host => LoginField::Username,
            LoginField::Username => LoginField::Password,
            LoginField::Password => LoginField::Host,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            LoginField::Host => LoginField::Password,
            LoginField::Username => LoginField::Host,
            LoginField::Password => LoginField::Username,
        }
    }

    fn label(self) -> &'static str {
        match self {
            LoginField::Host => "Host (IPv4):",
            LoginField::Username => "Username:",
            LoginField::Password => "Password:",
        }
    }
}

#[derive(Debug, Default)]
pub struct LoginForm {
    pub host: Input,
    pub username: Input,
    pub password: Input,
    pub focus: LoginField,
    pub error: Option<String>,
    /// A login probe is in flight
    pub pending: bool,
}

impl LoginForm {
    pub fn new(host: Option<String>, username: String) -> Self {
        let mut form = Self {
            host: Input::new(host.unwrap_or_default()),
            username: Input::new(username),
            ..Self::default()
        };
        // skip fields that are already filled in
        if !form.host.value().is_empty() {
            form.focus = LoginField::Username;
            if !form.username.value().is_empty() {
                form.focus = LoginField::Password;
            }
        }
        form
    }

    fn focused_mut(&mut self) -> &mut Input {
        match self.focus {
            LoginField::Host => &mut self.host,
            LoginField::Username => &mut self.username,
            LoginField::Password => &mut self.password,
        }
    }

    fn field(&self, field: LoginField) -> &Input {
        match field {
            LoginField::Host => &self.host,
            LoginField::Username => &self.username,
            LoginField::Password => &self.password,
        }
    }

    /// Feed a key press to the focused field
    pub fn handle_input(&mut self, event: &CrosstermEvent) {
        if self.pending {
            return;
        }
        if self.focused_mut().handle_event(event).is_some() {
            self.error = None;
        }
    }

    pub fn next_field(&mut self) {
        self.focus = self.focus.next();
    }

    pub fn prev_field(&mut self) {
        self.focus = self.focus.prev();
    }

    pub fn values(&self) -> (String, String, String) {
        (
            self.host.value().trim().to_string(),
            self.username.value().trim().to_string(),
            self.password.value().to_string(),
        )
    }

    pub fn set_pending(&mut self) {
        self.pending = true;
        self.error = None;
    }

    /// Show a rejected login and ask for the password again
    pub fn set_error(&mut self, message: String) {
        self.pending = false;
        self.error = Some(message);
        self.password.reset();
        self.focus = LoginField::Password;
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let vertical = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Percentage(25),
                Constraint::Min(14),
                Constraint::Percentage(25),
            ])
            .split(area);

        let horizontal = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(20),
                Constraint::Percentage(60),
                Constraint::Percentage(20),
            ])
            .split(vertical[1]);

        let dialog_area = horizontal[1];
        frame.render_widget(Clear, dialog_area);

        let block = Block::default()
            .title(" DCV Host Login ")
            .title_style(title_style())
            .borders(Borders::ALL)
            .border_style(Style::default().fg(PRIMARY));

        let inner = block.inner(dialog_area);
        frame.render_widget(block, dialog_area);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2), // Intro
                Constraint::Length(1), // Host label
                Constraint::Length(1), // Host input
                Constraint::Length(1), // Username label
                Constraint::Length(1), // Username input
                Constraint::Length(1), // Password label
                Constraint::Length(1), // Password input
                Constraint::Length(1), // Spacer
                Constraint::Length(2), // Error or progress
                Constraint::Length(1), // Help text
            ])
            .split(inner);

        let intro = Paragraph::new("Log in to the DCV host you want to recover")
            .style(Style::default().fg(Color::White))
            .alignment(Alignment::Center);
        frame.render_widget(intro, rows[0]);

        let fields = [
            (LoginField::Host, rows[1], rows[2]),
            (LoginField::Username, rows[3], rows[4]),
            (LoginField::Password, rows[5], rows[6]),
        ];
        for (field, label_area, input_area) in fields {
            self.render_field(frame, field, label_area, input_area);
        }

        if let Some(error) = &self.error {
            let error = Paragraph::new(Line::from(vec![
                Span::styled("✗ ", Style::default().fg(ERROR).add_modifier(Modifier::BOLD)),
                Span::styled(error.as_str(), Style::default().fg(ERROR)),
            ]))
            .alignment(Alignment::Center)
            .wrap(ratatui::widgets::Wrap { trim: true });
            frame.render_widget(error, rows[8]);
        } else if self.pending {
            let connecting = Paragraph::new("Connecting...")
                .style(Style::default().fg(WARNING))
                .alignment(Alignment::Center);
            frame.render_widget(connecting, rows[8]);
        }

        let help = Paragraph::new("[Tab] Next field | [Enter] Log in | [Esc] Quit")
            .style(help_style())
            .alignment(Alignment::Center);
        frame.render_widget(help, rows[9]);
    }

    fn render_field(&self, frame: &mut Frame, field: LoginField, label_area: Rect, input_area: Rect) {
        let focused = field == self.focus;
        let label_style = if focused {
            Style::default().fg(PRIMARY).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        frame.render_widget(Paragraph::new(field.label()).style(label_style), label_area);

        let input = self.field(field);
        let width = input_area.width.max(1) as usize;
        let scroll = input.visual_scroll(width);
        let text = match field {
            LoginField::Password => "*".repeat(input.value().chars().count()),
            _ => input.value().to_string(),
        };
        let widget = Paragraph::new(text)
            .style(Style::default().fg(Color::White).bg(Color::DarkGray))
            .scroll((0, scroll as u16));
        frame.render_widget(widget, input_area);

        if focused && !self.pending {
            let offset = input.visual_cursor().saturating_sub(scroll) as u16;
            frame.set_cursor_position(Position::new(input_area.x + offset, input_area.y));
        }
    }
}
