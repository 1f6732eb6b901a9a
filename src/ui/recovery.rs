// Recovery view: the two initiators, progress gauge and run details

use crate::recovery::{RecoveryEvent, RecoveryKind, RecoveryReport, RunlevelPhase};
use crate::ui::styles::{help_style, outcome_color, title_style, MUTED, PRIMARY, SUCCESS, WARNING};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Wrap},
    Frame,
};

const INITIATORS: [(char, RecoveryKind); 2] = [
    ('1', RecoveryKind::ServiceRestart),
    ('2', RecoveryKind::RunlevelCycle),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptInfo {
    pub label: &'static str,
    pub attempt: u32,
    pub max_attempts: u32,
}

#[derive(Debug)]
pub struct RecoveryView {
    /// user@host:port of the logged in session
    pub target: String,
    /// Value drawn by the gauge, animated towards `reported`
    pub displayed: u8,
    pub reported: u8,
    pub running: Option<RecoveryKind>,
    pub phase: Option<RunlevelPhase>,
    pub attempt: Option<AttemptInfo>,
    pub last_report: Option<RecoveryReport>,
}

impl RecoveryView {
    pub fn new(target: String) -> Self {
        Self {
            target,
            displayed: 0,
            reported: 0,
            running: None,
            phase: None,
            attempt: None,
            last_report: None,
        }
    }

    pub fn start(&mut self, kind: RecoveryKind) {
        self.running = Some(kind);
        self.displayed = 0;
        self.reported = 0;
        self.phase = None;
        self.attempt = None;
    }

    pub fn apply(&mut self, event: RecoveryEvent) {
        match event {
            RecoveryEvent::Progress(0) => {
                self.reported = 0;
                self.displayed = 0;
            }
            RecoveryEvent::Progress(percent) => {
                self.reported = self.reported.max(percent.min(100));
            }
            RecoveryEvent::Phase(phase) => {
                self.phase = Some(phase);
                self.attempt = None;
            }
            RecoveryEvent::Attempt {
                label,
                attempt,
                max_attempts,
            } => {
                self.attempt = Some(AttemptInfo {
                    label,
                    attempt,
                    max_attempts,
                });
            }
        }
    }

    pub fn finish(&mut self, report: RecoveryReport) {
        self.running = None;
        if report.outcome.is_success() {
            self.reported = 100;
        } else {
            self.reported = 0;
            self.displayed = 0;
        }
        self.last_report = Some(report);
    }

    /// Move the gauge one step towards the last reported value
    pub fn tick(&mut self, step: u8) {
        if self.displayed < self.reported {
            self.displayed = self.displayed.saturating_add(step).min(self.reported);
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, initiators_enabled: bool) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Header
                Constraint::Length(6), // Initiators
                Constraint::Length(3), // Gauge
                Constraint::Min(3),    // Details
                Constraint::Length(1), // Footer
            ])
            .split(area);

        let header = Paragraph::new(Line::from(vec![
            Span::styled("dcvfix", title_style()),
            Span::raw(" - connected to "),
            Span::styled(self.target.as_str(), Style::default().fg(SUCCESS)),
        ]))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
        frame.render_widget(header, chunks[0]);

        self.render_initiators(frame, chunks[1], initiators_enabled);

        let gauge_color = match &self.last_report {
            Some(report) if self.running.is_none() => outcome_color(&report.outcome),
            _ => PRIMARY,
        };
        let gauge = Gauge::default()
            .block(Block::default().borders(Borders::ALL).title(" Progress "))
            .gauge_style(Style::default().fg(gauge_color))
            .label(format!("{}%", self.displayed))
            .ratio(f64::from(self.displayed.min(100)) / 100.0);
        frame.render_widget(gauge, chunks[2]);

        self.render_details(frame, chunks[3]);

        let footer = Paragraph::new("[1] Restart DCV | [2] Black screen fix | [Shift+L] Log out | [?] Help | [q] Quit")
            .style(help_style())
            .alignment(Alignment::Center);
        frame.render_widget(footer, chunks[4]);
    }

    fn render_initiators(&self, frame: &mut Frame, area: Rect, enabled: bool) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(area);

        for ((key, kind), column) in INITIATORS.iter().zip(columns.iter()) {
            let active = self.running == Some(*kind);
            let (border, text) = if active {
                (WARNING, Style::default().fg(WARNING).add_modifier(Modifier::BOLD))
            } else if enabled {
                (PRIMARY, Style::default().fg(Color::White))
            } else {
                (MUTED, Style::default().fg(MUTED))
            };

            let lines = vec![
                Line::from(Span::styled(kind.label(), text.add_modifier(Modifier::BOLD))),
                Line::from(Span::styled(kind.symptom(), text)),
                Line::from(""),
                Line::from(Span::styled(
                    if active {
                        "Running...".to_string()
                    } else if enabled {
                        format!("Press [{}] to start", key)
                    } else {
                        "Unavailable".to_string()
                    },
                    help_style(),
                )),
            ];

            let widget = Paragraph::new(lines)
                .alignment(Alignment::Center)
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_style(Style::default().fg(border)),
                );
            frame.render_widget(widget, *column);
        }
    }

    fn render_details(&self, frame: &mut Frame, area: Rect) {
        let mut lines = Vec::new();

        if let Some(kind) = self.running {
            lines.push(Line::from(vec![
                Span::styled("Running: ", Style::default().fg(WARNING).add_modifier(Modifier::BOLD)),
                Span::raw(kind.label()),
            ]));
        }
        if let Some(phase) = self.phase.filter(|_| self.running.is_some()) {
            lines.push(Line::from(vec![
                Span::styled("Phase: ", Style::default().fg(PRIMARY)),
                Span::raw(phase.label()),
            ]));
        }
        if let Some(attempt) = self.attempt.as_ref().filter(|_| self.running.is_some()) {
            lines.push(Line::from(vec![
                Span::styled("Check: ", Style::default().fg(PRIMARY)),
                Span::raw(format!(
                    "{} (attempt {}/{})",
                    attempt.label, attempt.attempt, attempt.max_attempts
                )),
            ]));
        }
        if self.running.is_none() {
            match &self.last_report {
                Some(report) => lines.push(Line::from(Span::styled(
                    report.message(),
                    Style::default().fg(outcome_color(&report.outcome)),
                ))),
                None => lines.push(Line::from(Span::styled(
                    "Pick the recovery that matches the symptom.",
                    help_style(),
                ))),
            }
        }

        let details = Paragraph::new(lines)
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL).title(" Details "));
        frame.render_widget(details, area);
    }
}
