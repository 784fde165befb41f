use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Gauge, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, Screen, SetupField};
use crate::console::LogLevel;
use crate::models::QuizKind;
use crate::progress::Stage;

/// Map a config color name to a terminal color. Unknown names fall back to
/// the terminal default.
fn parse_color(name: &str) -> Color {
    match name.to_ascii_lowercase().as_str() {
        "black" => Color::Black,
        "red" => Color::Red,
        "green" => Color::Green,
        "yellow" => Color::Yellow,
        "blue" => Color::Blue,
        "magenta" => Color::Magenta,
        "cyan" => Color::Cyan,
        "gray" | "grey" => Color::Gray,
        "white" => Color::White,
        _ => Color::Reset,
    }
}

fn accent(app: &App) -> Color {
    parse_color(&app.theme.accent_color)
}

fn success(app: &App) -> Color {
    parse_color(&app.theme.success_color)
}

fn error_color(app: &App) -> Color {
    parse_color(&app.theme.error_color)
}

fn centered_rect(area: Rect, width: u16, height: u16) -> Rect {
    let x = (area.width.saturating_sub(width)) / 2;
    let y = (area.height.saturating_sub(height)) / 2;
    Rect {
        x: area.x + x,
        y: area.y + y,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

pub fn render_setup(frame: &mut Frame, app: &App, area: Rect) {
    let accent = accent(app);

    let kind_label = match app.kind {
        QuizKind::Quick => "Quick quiz (topic)",
        QuizKind::Pdf => "PDF quiz (document)",
    };

    let mut lines = vec![
        Line::from(Span::styled(
            "New Quiz",
            Style::default().fg(accent).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(vec![
            Span::raw("Mode: "),
            Span::styled(kind_label, Style::default().fg(Color::Yellow)),
            Span::styled("  (Ctrl+T to switch)", Style::default().fg(Color::DarkGray)),
        ]),
        Line::from(""),
    ];

    for field in SetupField::order(app.kind) {
        let value = field_value(app, *field);
        let focused = app.focus == *field;
        let marker = if focused { "> " } else { "  " };
        let label_style = if focused {
            Style::default().fg(accent).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        let value_span = if value.is_empty() && focused {
            Span::styled("_", Style::default().fg(Color::DarkGray))
        } else if value.is_empty() {
            Span::styled(placeholder(*field), Style::default().fg(Color::DarkGray))
        } else {
            Span::styled(value, Style::default().fg(Color::White))
        };
        lines.push(Line::from(vec![
            Span::styled(marker, label_style),
            Span::styled(format!("{:<16}", field.label()), label_style),
            value_span,
        ]));
    }

    lines.push(Line::from(""));
    if let Some(err) = &app.form_error {
        lines.push(Line::from(Span::styled(
            format!("Error: {err}"),
            Style::default().fg(error_color(app)),
        )));
    } else {
        lines.push(Line::from(Span::styled(
            "Enter: Generate | Tab: Next field | Space: Cycle difficulty",
            Style::default().fg(Color::DarkGray),
        )));
    }

    let form = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" QuizForge ")
                .border_style(Style::default().fg(accent)),
        )
        .wrap(Wrap { trim: false });

    frame.render_widget(form, area);
}

fn field_value(app: &App, field: SetupField) -> String {
    match field {
        SetupField::Topic => app.topic.clone(),
        SetupField::FilePath => app.file_path.clone(),
        SetupField::Title => app.title.clone(),
        SetupField::Keywords => app.keywords.clone(),
        SetupField::QuestionCount => app.question_count.to_string(),
        SetupField::ChunkSize => app.chunk_size.to_string(),
        SetupField::Difficulty => app.difficulty.to_string(),
    }
}

const fn placeholder(field: SetupField) -> &'static str {
    match field {
        SetupField::Topic => "e.g. The French Revolution",
        SetupField::FilePath => "/path/to/document.pdf",
        SetupField::Title => "(optional)",
        SetupField::Keywords => "(optional, comma separated)",
        SetupField::QuestionCount | SetupField::ChunkSize | SetupField::Difficulty => "",
    }
}

pub fn render_generating(frame: &mut Frame, app: &mut App, area: Rect) {
    #[allow(clippy::cast_possible_truncation)]
    let steps_height = (Stage::ALL.len() + 2) as u16;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),            // Progress gauge
            Constraint::Length(steps_height), // Step list
            Constraint::Min(3),               // Console
        ])
        .split(area);

    render_progress_gauge(frame, app, chunks[0]);
    render_step_list(frame, app, chunks[1]);
    render_console(frame, app, chunks[2]);
}

fn render_progress_gauge(frame: &mut Frame, app: &App, area: Rect) {
    let gauge = Gauge::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Progress ")
                .border_style(Style::default().fg(accent(app))),
        )
        .gauge_style(Style::default().fg(success(app)))
        .percent(u16::from(app.progress.percent))
        .label(format!("{}% - {}", app.progress.percent, app.progress.status));

    frame.render_widget(gauge, area);
}

fn render_step_list(frame: &mut Frame, app: &App, area: Rect) {
    let percent = app.progress.percent;
    let mut lines = Vec::with_capacity(Stage::ALL.len());

    for stage in Stage::ALL {
        let (lo, hi) = stage.band();
        let (marker, style) = if percent >= hi {
            ("[x]", Style::default().fg(success(app)))
        } else if percent >= lo {
            ("[>]", Style::default().fg(accent(app)).add_modifier(Modifier::BOLD))
        } else {
            ("[ ]", Style::default().fg(Color::DarkGray))
        };
        lines.push(Line::from(Span::styled(
            format!(" {marker} {}", stage.label()),
            style,
        )));
    }

    let steps = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Steps ")
            .border_style(Style::default().fg(Color::DarkGray)),
    );

    frame.render_widget(steps, area);
}

fn render_console(frame: &mut Frame, app: &mut App, area: Rect) {
    let lines: Vec<Line> = app
        .console
        .lines()
        .iter()
        .map(|entry| {
            let color = match entry.level {
                LogLevel::Info => Color::Gray,
                LogLevel::Success => success(app),
                LogLevel::Warning => Color::Yellow,
                LogLevel::Error => error_color(app),
            };
            Line::from(Span::styled(entry.display_text(), Style::default().fg(color)))
        })
        .collect();

    let visible_height = area.height.saturating_sub(2) as usize;
    app.console_viewport = visible_height;
    let max_scroll = lines.len().saturating_sub(visible_height);
    let actual_scroll = app.console_scroll.min(max_scroll);

    // Sync the clamp back so scrolling stays anchored.
    if app.console_scroll != usize::MAX && app.console_scroll != actual_scroll {
        app.console_scroll = actual_scroll;
    }

    let console = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Console ")
                .border_style(Style::default().fg(Color::DarkGray)),
        )
        .scroll((u16::try_from(actual_scroll).unwrap_or(u16::MAX), 0));

    frame.render_widget(console, area);
}

pub fn render_preview(frame: &mut Frame, app: &App, area: Rect) {
    let accent = accent(app);
    let Some(draft) = &app.draft else {
        let empty = Paragraph::new("No quiz to preview")
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, area);
        return;
    };

    let total = draft.questions.len();
    let index = app.preview_index.min(total.saturating_sub(1));

    let mut lines = vec![
        Line::from(Span::styled(
            &draft.title,
            Style::default().fg(accent).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            format!("Topic: {} | Difficulty: {}", draft.topic, draft.difficulty),
            Style::default().fg(Color::DarkGray),
        )),
        Line::from(""),
    ];

    if let Some(question) = draft.questions.get(index) {
        lines.push(Line::from(Span::styled(
            format!("Question {}/{}", index + 1, total),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::from(""));
        lines.push(Line::from(question.question.as_str()));
        lines.push(Line::from(""));

        for (key, text) in &question.options {
            let is_correct = *key == question.correct_answer;
            let style = if app.show_answer && is_correct {
                Style::default().fg(success(app)).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            let marker = if app.show_answer && is_correct { ">" } else { " " };
            lines.push(Line::from(Span::styled(
                format!(" {marker} {key}) {text}"),
                style,
            )));
        }

        if let Some(notice) = &app.preview_notice {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                notice.clone(),
                Style::default().fg(success(app)),
            )));
        }

        if app.show_answer {
            if let Some(explanation) = &question.explanation {
                lines.push(Line::from(""));
                lines.push(Line::from(Span::styled(
                    format!("Explanation: {explanation}"),
                    Style::default().fg(Color::Gray),
                )));
            }
        } else {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                "Press A to reveal the answer",
                Style::default().fg(Color::DarkGray),
            )));
        }
    }

    let preview = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Preview ")
                .border_style(Style::default().fg(accent)),
        )
        .wrap(Wrap { trim: false });

    frame.render_widget(preview, area);
}

pub fn render_failure(frame: &mut Frame, app: &App, area: Rect) {
    let Some(reason) = &app.failure else {
        return;
    };
    let error_color = error_color(app);

    let text = vec![
        Line::from(Span::styled(
            "Quiz generation failed",
            Style::default().fg(error_color).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(reason.to_string()),
        Line::from(""),
        Line::from(Span::styled(reason.hint(), Style::default().fg(Color::Yellow))),
        Line::from(""),
        Line::from(Span::styled(
            "R: Retry | Esc: Back to setup | Ctrl+C: Quit",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let popup = Paragraph::new(text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Error ")
                .border_style(Style::default().fg(error_color)),
        )
        .wrap(Wrap { trim: false });

    let popup_area = centered_rect(area, 60, 10);
    frame.render_widget(Clear, popup_area);
    frame.render_widget(popup, popup_area);
}

pub fn render_bottom_bar(frame: &mut Frame, app: &App, area: Rect) {
    let (text, style) = if app.exit_pending {
        (
            "Press Ctrl+C again to exit, Esc to cancel",
            Style::default().fg(error_color(app)).add_modifier(Modifier::BOLD),
        )
    } else {
        let text = match app.screen {
            Screen::Setup => "Enter: Generate | Tab: Next | Ctrl+T: Mode | Ctrl+C: Quit",
            Screen::Generating => "Up/Down: Scroll console | Ctrl+C: Quit",
            Screen::Preview => "Left/Right: Questions | A: Answer | S: Save | N: New | Ctrl+C: Quit",
            Screen::Failed => "R: Retry | Esc: Back | Ctrl+C: Quit",
        };
        (text, Style::default().fg(Color::DarkGray))
    };

    let bar = Paragraph::new(text).alignment(Alignment::Center).style(style);

    frame.render_widget(bar, area);
}
