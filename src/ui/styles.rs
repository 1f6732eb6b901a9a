// Ratatui styling and color palette

use crate::recovery::{FailureReason, WorkflowOutcome};
use ratatui::style::{Color, Modifier, Style};

// Color palette
pub const PRIMARY: Color = Color::Cyan;
pub const SUCCESS: Color = Color::Green;
pub const WARNING: Color = Color::Yellow;
pub const ERROR: Color = Color::Red;
pub const MUTED: Color = Color::Gray;

// Common styles
pub fn title_style() -> Style {
    Style::default()
        .fg(PRIMARY)
        .add_modifier(Modifier::BOLD)
}

pub fn help_style() -> Style {
    Style::default().fg(MUTED)
}

/// Color for a finished run
pub fn outcome_color(outcome: &WorkflowOutcome) -> Color {
    match outcome {
        WorkflowOutcome::Success => SUCCESS,
        // the fix may still have worked, the check just never passed
        WorkflowOutcome::Failure(FailureReason::NotConfirmed(_)) => WARNING,
        WorkflowOutcome::Failure(FailureReason::CommandFailed { .. }) => ERROR,
        WorkflowOutcome::TransportError(_) => ERROR,
    }
}

/// Color and icon for a status bar message
pub fn status_color(message: &str) -> (Color, &'static str) {
    if message.starts_with('✓') {
        (SUCCESS, "✓")
    } else if message.starts_with('✗') {
        (ERROR, "✗")
    } else {
        (WARNING, "ℹ")
    }
}
