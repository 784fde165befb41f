use crate::console::{ConsoleLog, LogLevel};
use crate::error::{FailureReason, ValidationError};
use crate::events::AppEvent;
use crate::models::{
    AppConfig, Difficulty, GenerationRequest, PipelineProgress, QuizDraft, QuizKind, QuizSource,
    ThemeConfig,
};
use crate::pipeline::PipelineState;

use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    Setup,
    Generating,
    Preview,
    Failed,
}

/// Focusable fields of the setup form. The visible set depends on the
/// selected quiz kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupField {
    Topic,
    FilePath,
    Title,
    QuestionCount,
    ChunkSize,
    Keywords,
    Difficulty,
}

impl SetupField {
    /// Focus traversal order for the given quiz kind.
    #[must_use]
    pub const fn order(kind: QuizKind) -> &'static [Self] {
        match kind {
            QuizKind::Quick => &[Self::Topic, Self::QuestionCount, Self::Difficulty],
            QuizKind::Pdf => &[
                Self::FilePath,
                Self::Title,
                Self::QuestionCount,
                Self::ChunkSize,
                Self::Keywords,
                Self::Difficulty,
            ],
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Topic => "Topic",
            Self::FilePath => "PDF file",
            Self::Title => "Quiz title",
            Self::QuestionCount => "Questions",
            Self::ChunkSize => "Segment size",
            Self::Keywords => "Topic keywords",
            Self::Difficulty => "Difficulty",
        }
    }
}

#[derive(Debug)]
pub struct App {
    pub screen: Screen,
    pub should_quit: bool,
    pub exit_pending: bool,
    pub theme: ThemeConfig,

    // Setup form
    pub kind: QuizKind,
    pub focus: SetupField,
    pub topic: String,
    pub file_path: String,
    pub title: String,
    pub question_count: u32,
    pub chunk_size: u32,
    pub keywords: String,
    pub difficulty: Difficulty,
    pub form_error: Option<ValidationError>,

    // Generation screen
    pub console: ConsoleLog,
    pub progress: PipelineProgress,
    pub pipeline_state: PipelineState,
    pub console_scroll: usize,
    /// Visible line count of the console panel, written back by the renderer
    /// so scrolling up from the pinned tail starts at the right line.
    pub console_viewport: usize,

    // Preview screen
    pub draft: Option<QuizDraft>,
    pub preview_index: usize,
    pub show_answer: bool,
    pub preview_notice: Option<String>,

    // Failure screen
    pub failure: Option<FailureReason>,
}

impl App {
    #[must_use]
    pub fn new(config: &AppConfig) -> Self {
        Self {
            screen: Screen::Setup,
            should_quit: false,
            exit_pending: false,
            theme: config.theme.clone(),
            kind: QuizKind::Quick,
            focus: SetupField::Topic,
            topic: String::new(),
            file_path: String::new(),
            title: String::new(),
            question_count: config.default_question_count,
            chunk_size: config.default_chunk_size,
            keywords: String::new(),
            difficulty: config.default_difficulty,
            form_error: None,
            console: ConsoleLog::new(),
            progress: PipelineProgress::default(),
            pipeline_state: PipelineState::Idle,
            console_scroll: 0,
            console_viewport: 0,
            draft: None,
            preview_index: 0,
            show_answer: false,
            preview_notice: None,
            failure: None,
        }
    }

    pub const fn quit(&mut self) {
        self.should_quit = true;
    }

    // Form navigation

    pub fn focus_next(&mut self) {
        self.step_focus(1);
    }

    pub fn focus_prev(&mut self) {
        self.step_focus(-1);
    }

    #[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
    fn step_focus(&mut self, delta: isize) {
        let order = SetupField::order(self.kind);
        let current = order
            .iter()
            .position(|f| *f == self.focus)
            .unwrap_or(0);
        let next = (current as isize + delta).rem_euclid(order.len() as isize) as usize;
        self.focus = order[next];
    }

    pub fn toggle_kind(&mut self) {
        self.kind = match self.kind {
            QuizKind::Quick => QuizKind::Pdf,
            QuizKind::Pdf => QuizKind::Quick,
        };
        // Keep focus valid for the new field set.
        if !SetupField::order(self.kind).contains(&self.focus) {
            self.focus = SetupField::order(self.kind)[0];
        }
        self.form_error = None;
    }

    pub fn input_char(&mut self, c: char) {
        self.form_error = None;
        match self.focus {
            SetupField::Topic => self.topic.push(c),
            SetupField::FilePath => self.file_path.push(c),
            SetupField::Title => self.title.push(c),
            SetupField::Keywords => self.keywords.push(c),
            SetupField::QuestionCount => {
                if let Some(d) = c.to_digit(10) {
                    self.question_count = (self.question_count * 10 + d).min(50);
                }
            }
            SetupField::ChunkSize => {
                if let Some(d) = c.to_digit(10) {
                    self.chunk_size = (self.chunk_size * 10 + d).min(10_000);
                }
            }
            SetupField::Difficulty => {}
        }
    }

    pub fn backspace(&mut self) {
        self.form_error = None;
        match self.focus {
            SetupField::Topic => {
                self.topic.pop();
            }
            SetupField::FilePath => {
                self.file_path.pop();
            }
            SetupField::Title => {
                self.title.pop();
            }
            SetupField::Keywords => {
                self.keywords.pop();
            }
            SetupField::QuestionCount => self.question_count /= 10,
            SetupField::ChunkSize => self.chunk_size /= 10,
            SetupField::Difficulty => {}
        }
    }

    pub fn cycle_difficulty(&mut self) {
        self.difficulty = self.difficulty.next();
    }

    /// Build and validate a request from the form. On error the form stays
    /// put and the error is shown inline.
    pub fn build_request(&mut self) -> Option<GenerationRequest> {
        let source = match self.kind {
            QuizKind::Quick => QuizSource::Topic(self.topic.trim().to_string()),
            QuizKind::Pdf => QuizSource::Document(PathBuf::from(self.file_path.trim())),
        };
        let request = GenerationRequest {
            title: self.title.trim().to_string(),
            source,
            question_count: self.question_count,
            difficulty: self.difficulty,
            chunk_size: self.chunk_size,
            keywords: self.keywords.trim().to_string(),
        };
        match request.validate() {
            Ok(()) => {
                self.form_error = None;
                Some(request)
            }
            Err(e) => {
                self.form_error = Some(e);
                None
            }
        }
    }

    /// Reset transient run state and switch to the generation screen.
    pub fn start_generation(&mut self) {
        self.console.clear();
        self.progress = PipelineProgress::default();
        self.pipeline_state = PipelineState::Idle;
        self.console_scroll = usize::MAX;
        self.draft = None;
        self.failure = None;
        self.screen = Screen::Generating;
    }

    /// Fold one pipeline event into the UI state.
    pub fn apply_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Log(level, message) => {
                self.console.push(level, message);
                // Follow the tail unless the user scrolled up.
                if self.console_scroll == usize::MAX
                    || self.console_scroll + 1 >= self.console.len()
                {
                    self.console_scroll = usize::MAX;
                }
            }
            AppEvent::Progress(progress) => self.progress = progress,
            AppEvent::StateChanged(state) => self.pipeline_state = state,
            AppEvent::Finished(draft) => {
                self.draft = Some(draft);
                self.preview_index = 0;
                self.show_answer = false;
                self.preview_notice = None;
                self.screen = Screen::Preview;
            }
            AppEvent::Failed(reason) => {
                self.failure = Some(reason);
                self.screen = Screen::Failed;
            }
        }
    }

    pub fn console_scroll_up(&mut self) {
        let pinned = if self.console_scroll == usize::MAX {
            self.console.len().saturating_sub(self.console_viewport)
        } else {
            self.console_scroll
        };
        self.console_scroll = pinned.saturating_sub(1);
    }

    pub fn console_scroll_down(&mut self) {
        if self.console_scroll != usize::MAX {
            self.console_scroll = self.console_scroll.saturating_add(1);
            if self.console_scroll + 1 >= self.console.len() {
                self.console_scroll = usize::MAX;
            }
        }
    }

    // Preview navigation

    pub fn preview_next(&mut self) {
        if let Some(draft) = &self.draft {
            if self.preview_index + 1 < draft.questions.len() {
                self.preview_index += 1;
                self.show_answer = false;
            }
        }
    }

    pub const fn preview_prev(&mut self) {
        if self.preview_index > 0 {
            self.preview_index -= 1;
            self.show_answer = false;
        }
    }

    pub const fn toggle_answer(&mut self) {
        self.show_answer = !self.show_answer;
    }

    /// Back to a clean setup form, keeping the entered values so a failed run
    /// can be retried with one keypress.
    pub fn return_to_setup(&mut self) {
        self.screen = Screen::Setup;
        self.failure = None;
        self.form_error = None;
    }

    pub fn log_local(&mut self, level: LogLevel, message: impl Into<String>) {
        self.console.push(level, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::LogLevel;
    use crate::models::Question;
    use std::collections::BTreeMap;

    fn app() -> App {
        App::new(&AppConfig::default())
    }

    fn draft_with_questions(n: usize) -> QuizDraft {
        let request = GenerationRequest {
            title: String::new(),
            source: QuizSource::Topic("Rust".to_string()),
            question_count: n as u32,
            difficulty: Difficulty::Medium,
            chunk_size: 1000,
            keywords: String::new(),
        };
        let mut draft = QuizDraft::for_request(&request);
        for i in 0..n {
            let mut options = BTreeMap::new();
            options.insert("A".to_string(), "yes".to_string());
            options.insert("B".to_string(), "no".to_string());
            draft.push_question(Question {
                question: format!("Q{i}?"),
                options,
                correct_answer: "A".to_string(),
                explanation: None,
            });
        }
        draft
    }

    #[test]
    fn test_app_new_uses_config_defaults() {
        let app = app();
        assert_eq!(app.screen, Screen::Setup);
        assert_eq!(app.question_count, 5);
        assert_eq!(app.chunk_size, 1000);
        assert!(!app.should_quit);
    }

    #[test]
    fn test_focus_cycles_through_quick_fields() {
        let mut app = app();
        assert_eq!(app.focus, SetupField::Topic);
        app.focus_next();
        assert_eq!(app.focus, SetupField::QuestionCount);
        app.focus_next();
        assert_eq!(app.focus, SetupField::Difficulty);
        app.focus_next();
        assert_eq!(app.focus, SetupField::Topic);
        app.focus_prev();
        assert_eq!(app.focus, SetupField::Difficulty);
    }

    #[test]
    fn test_toggle_kind_fixes_focus() {
        let mut app = app();
        app.toggle_kind();
        assert_eq!(app.kind, QuizKind::Pdf);
        assert_eq!(app.focus, SetupField::FilePath);
        app.toggle_kind();
        assert_eq!(app.kind, QuizKind::Quick);
        assert_eq!(app.focus, SetupField::Topic);
    }

    #[test]
    fn test_numeric_fields_reject_letters_and_cap() {
        let mut app = app();
        app.focus = SetupField::QuestionCount;
        app.question_count = 0;
        app.input_char('x');
        assert_eq!(app.question_count, 0);
        app.input_char('7');
        assert_eq!(app.question_count, 7);
        app.input_char('9');
        assert_eq!(app.question_count, 50); // capped
        app.backspace();
        assert_eq!(app.question_count, 5);
    }

    #[test]
    fn test_build_request_requires_topic() {
        let mut app = app();
        assert!(app.build_request().is_none());
        assert!(matches!(
            app.form_error,
            Some(ValidationError::MissingField("topic"))
        ));

        app.topic = "Rust ownership".to_string();
        let request = app.build_request().expect("valid form");
        assert!(matches!(request.source, QuizSource::Topic(ref t) if t == "Rust ownership"));
        assert!(app.form_error.is_none());
    }

    #[test]
    fn test_build_request_rejects_zero_questions() {
        let mut app = app();
        app.topic = "Rust".to_string();
        app.question_count = 0;
        assert!(app.build_request().is_none());
        assert!(matches!(
            app.form_error,
            Some(ValidationError::OutOfRange { field: "question count", .. })
        ));
    }

    #[test]
    fn test_finished_event_switches_to_preview() {
        let mut app = app();
        app.start_generation();
        assert_eq!(app.screen, Screen::Generating);

        app.apply_event(AppEvent::Finished(draft_with_questions(2)));
        assert_eq!(app.screen, Screen::Preview);
        assert_eq!(app.preview_index, 0);
    }

    #[test]
    fn test_failed_event_switches_to_failure_screen() {
        let mut app = app();
        app.start_generation();
        app.apply_event(AppEvent::Failed(FailureReason::NoQuestionsGenerated));
        assert_eq!(app.screen, Screen::Failed);
        assert!(app.failure.is_some());
    }

    #[test]
    fn test_log_events_append_to_console() {
        let mut app = app();
        app.start_generation();
        app.apply_event(AppEvent::Log(LogLevel::Info, "starting".to_string()));
        app.apply_event(AppEvent::Log(LogLevel::Success, "done".to_string()));
        assert_eq!(app.console.len(), 2);
        assert_eq!(app.console_scroll, usize::MAX); // pinned to tail
    }

    #[test]
    fn test_console_scroll_up_unpins_using_viewport_height() {
        let mut app = app();
        app.start_generation();
        for i in 0..10 {
            app.apply_event(AppEvent::Log(LogLevel::Info, format!("line {i}")));
        }
        app.console_viewport = 4;
        assert_eq!(app.console_scroll, usize::MAX);

        // First Up lands one line above the pinned tail view, whatever the
        // panel height is.
        app.console_scroll_up();
        assert_eq!(app.console_scroll, 5);
        app.console_scroll_up();
        assert_eq!(app.console_scroll, 4);

        app.console_scroll_down();
        assert_eq!(app.console_scroll, 5);

        // Scrolling past the last line re-pins to the tail.
        while app.console_scroll != usize::MAX {
            app.console_scroll_down();
        }
        assert_eq!(app.console_scroll, usize::MAX);
    }

    #[test]
    fn test_preview_navigation_clamps() {
        let mut app = app();
        app.apply_event(AppEvent::Finished(draft_with_questions(2)));

        app.preview_prev();
        assert_eq!(app.preview_index, 0);
        app.preview_next();
        assert_eq!(app.preview_index, 1);
        app.preview_next();
        assert_eq!(app.preview_index, 1);
    }

    #[test]
    fn test_preview_navigation_hides_answer() {
        let mut app = app();
        app.apply_event(AppEvent::Finished(draft_with_questions(3)));
        app.toggle_answer();
        assert!(app.show_answer);
        app.preview_next();
        assert!(!app.show_answer);
    }

    #[test]
    fn test_return_to_setup_keeps_form_values() {
        let mut app = app();
        app.topic = "Biology".to_string();
        app.start_generation();
        app.apply_event(AppEvent::Failed(FailureReason::NoQuestionsGenerated));

        app.return_to_setup();
        assert_eq!(app.screen, Screen::Setup);
        assert!(app.failure.is_none());
        assert_eq!(app.topic, "Biology");
    }
}
