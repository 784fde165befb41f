pub mod widgets;

use crate::app::{App, Screen};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    Frame,
};

pub fn render(frame: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),    // Screen body
            Constraint::Length(1), // Bottom keymap bar
        ])
        .split(frame.area());

    match app.screen {
        Screen::Setup => widgets::render_setup(frame, app, chunks[0]),
        Screen::Generating => widgets::render_generating(frame, app, chunks[0]),
        Screen::Preview => widgets::render_preview(frame, app, chunks[0]),
        Screen::Failed => widgets::render_failure(frame, app, chunks[0]),
    }

    widgets::render_bottom_bar(frame, app, chunks[1]);
}
