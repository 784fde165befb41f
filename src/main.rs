mod api;
mod app;
mod config;
mod console;
mod error;
mod events;
mod models;
mod pipeline;
mod progress;
mod storage;
mod ui;

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::Backend, prelude::*};
use std::io;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use api::QuizApiClient;
use app::{App, Screen, SetupField};
use console::LogLevel;
use events::AppEvent;
use models::GenerationRequest;
use pipeline::{Pipeline, PipelinePolicy};
use storage::Storage;

#[tokio::main]
async fn main() -> Result<()> {
    let app_config = config::load_config()?;
    let storage = Storage::new()?;
    let client = QuizApiClient::from_config(&app_config)?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(&app_config);
    let policy = PipelinePolicy::from_config(&app_config);

    // Channel for pipeline-to-UI events
    let (tx, mut rx) = mpsc::unbounded_channel::<AppEvent>();

    let res = run_app(
        &mut terminal,
        &mut app,
        &client,
        &storage,
        &policy,
        &tx,
        &mut rx,
    );

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("Error: {err:?}");
    }

    Ok(())
}

struct RunContext<'a> {
    client: &'a QuizApiClient,
    storage: &'a Storage,
    policy: &'a PipelinePolicy,
    event_tx: &'a mpsc::UnboundedSender<AppEvent>,
    task: Option<JoinHandle<()>>,
    last_request: Option<GenerationRequest>,
}

impl RunContext<'_> {
    fn spawn_generation(&mut self, app: &mut App, request: GenerationRequest) {
        self.abort_task();
        app.start_generation();

        let pipeline = Pipeline::new(
            self.client.clone(),
            self.policy.clone(),
            self.storage.handoff(),
            self.event_tx.clone(),
        );
        self.last_request = Some(request.clone());
        self.task = Some(tokio::spawn(pipeline.run(request)));
    }

    fn abort_task(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[allow(clippy::too_many_lines)]
fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    client: &QuizApiClient,
    storage: &Storage,
    policy: &PipelinePolicy,
    event_tx: &mpsc::UnboundedSender<AppEvent>,
    event_rx: &mut mpsc::UnboundedReceiver<AppEvent>,
) -> Result<()> {
    let mut ctx = RunContext {
        client,
        storage,
        policy,
        event_tx,
        task: None,
        last_request: None,
    };

    loop {
        terminal.draw(|f| ui::render(f, app))?;

        // Drain pipeline events before handling input
        while let Ok(app_event) = event_rx.try_recv() {
            app.apply_event(app_event);
        }

        // ~60fps poll for smooth progress updates
        if event::poll(Duration::from_millis(16))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    handle_key(app, &mut ctx, key.code, key.modifiers);
                }
            }
        }

        if app.should_quit {
            ctx.abort_task();
            break;
        }
    }
    Ok(())
}

fn handle_key(app: &mut App, ctx: &mut RunContext<'_>, key: KeyCode, modifiers: KeyModifiers) {
    // Exit confirmation runs above every screen.
    match key {
        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
            if app.exit_pending {
                app.quit();
            } else {
                app.exit_pending = true;
            }
            return;
        }
        KeyCode::Esc if app.exit_pending => {
            app.exit_pending = false;
            return;
        }
        _ if app.exit_pending => {
            // Any other key cancels the pending exit
            app.exit_pending = false;
        }
        _ => {}
    }

    match app.screen {
        Screen::Setup => handle_setup_key(app, ctx, key, modifiers),
        Screen::Generating => handle_generating_key(app, ctx, key),
        Screen::Preview => handle_preview_key(app, ctx, key),
        Screen::Failed => handle_failure_key(app, ctx, key),
    }
}

fn handle_setup_key(app: &mut App, ctx: &mut RunContext<'_>, key: KeyCode, modifiers: KeyModifiers) {
    match key {
        KeyCode::Char('t') if modifiers.contains(KeyModifiers::CONTROL) => app.toggle_kind(),
        KeyCode::Tab => app.focus_next(),
        KeyCode::BackTab => app.focus_prev(),
        KeyCode::Backspace => app.backspace(),
        KeyCode::Enter => {
            if let Some(request) = app.build_request() {
                ctx.spawn_generation(app, request);
            }
        }
        KeyCode::Char(' ') if app.focus == SetupField::Difficulty => app.cycle_difficulty(),
        KeyCode::Char(c) => app.input_char(c),
        _ => {}
    }
}

fn handle_generating_key(app: &mut App, ctx: &mut RunContext<'_>, key: KeyCode) {
    match key {
        KeyCode::Up => app.console_scroll_up(),
        KeyCode::Down => app.console_scroll_down(),
        KeyCode::Esc => {
            // Cancel the run and go back to the form
            ctx.abort_task();
            app.log_local(LogLevel::Warning, "Generation cancelled");
            app.return_to_setup();
        }
        _ => {}
    }
}

fn handle_preview_key(app: &mut App, ctx: &mut RunContext<'_>, key: KeyCode) {
    match key {
        KeyCode::Left => app.preview_prev(),
        KeyCode::Right => app.preview_next(),
        KeyCode::Char('a' | 'A') => app.toggle_answer(),
        KeyCode::Char('s' | 'S') => {
            if let Some(draft) = &app.draft {
                app.preview_notice = Some(match ctx.storage.save_quiz(draft) {
                    Ok(saved) => format!("Saved as {}", saved.id),
                    Err(e) => format!("Save failed: {e}"),
                });
            }
        }
        KeyCode::Char('n' | 'N') | KeyCode::Esc => app.return_to_setup(),
        _ => {}
    }
}

fn handle_failure_key(app: &mut App, ctx: &mut RunContext<'_>, key: KeyCode) {
    match key {
        KeyCode::Char('r' | 'R') => {
            if let Some(request) = ctx.last_request.clone() {
                ctx.spawn_generation(app, request);
            } else {
                app.return_to_setup();
            }
        }
        KeyCode::Esc => app.return_to_setup(),
        _ => {}
    }
}
