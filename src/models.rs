use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use uuid::Uuid;

use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }

    /// Next value in form-cycling order.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::Easy => Self::Medium,
            Self::Medium => Self::Hard,
            Self::Hard => Self::Easy,
        }
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum QuizKind {
    Quick,
    Pdf,
}

/// One multiple-choice question as returned by the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Question {
    pub question: String,
    pub options: BTreeMap<String, String>,
    pub correct_answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl Question {
    /// Client-side acceptance check applied before a question enters a draft.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.question.trim().is_empty() {
            return Err(ValidationError::MissingField("question"));
        }
        if self.options.is_empty() {
            return Err(ValidationError::MissingField("options"));
        }
        if !self.options.contains_key(&self.correct_answer) {
            return Err(ValidationError::Inconsistent {
                field: "correct_answer",
                detail: format!("label \"{}\" is not among the options", self.correct_answer),
            });
        }
        Ok(())
    }
}

/// Where the quiz content comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizSource {
    Topic(String),
    Document(PathBuf),
}

/// Validated form input, immutable once the pipeline starts.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub title: String,
    pub source: QuizSource,
    pub question_count: u32,
    pub difficulty: Difficulty,
    pub chunk_size: u32,
    pub keywords: String,
}

impl GenerationRequest {
    #[must_use]
    pub const fn kind(&self) -> QuizKind {
        match self.source {
            QuizSource::Topic(_) => QuizKind::Quick,
            QuizSource::Document(_) => QuizKind::Pdf,
        }
    }

    #[must_use]
    pub fn topic(&self) -> &str {
        match &self.source {
            QuizSource::Topic(topic) => topic,
            QuizSource::Document(_) => &self.keywords,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        match &self.source {
            QuizSource::Topic(topic) => {
                if topic.trim().is_empty() {
                    return Err(ValidationError::MissingField("topic"));
                }
            }
            QuizSource::Document(path) => {
                if path.as_os_str().is_empty() {
                    return Err(ValidationError::MissingField("pdf file"));
                }
                if self.chunk_size == 0 {
                    return Err(ValidationError::OutOfRange {
                        field: "chunk size",
                        value: 0,
                        expected: "at least 1",
                    });
                }
            }
        }
        if self.question_count < 1 {
            return Err(ValidationError::OutOfRange {
                field: "question count",
                value: i64::from(self.question_count),
                expected: "at least 1",
            });
        }
        Ok(())
    }
}

/// The quiz being assembled by the orchestrator. Append-only during
/// generation; handed off whole on completion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuizDraft {
    pub title: String,
    pub topic: String,
    pub difficulty: Difficulty,
    #[serde(rename = "type")]
    pub kind: QuizKind,
    pub questions: Vec<Question>,
}

impl QuizDraft {
    #[must_use]
    pub fn for_request(request: &GenerationRequest) -> Self {
        let title = if request.title.trim().is_empty() {
            format!("Quiz: {}", request.topic())
        } else {
            request.title.clone()
        };
        Self {
            title,
            topic: request.topic().to_string(),
            difficulty: request.difficulty,
            kind: request.kind(),
            questions: Vec::new(),
        }
    }

    pub fn push_question(&mut self, question: Question) {
        self.questions.push(question);
    }
}

/// A draft persisted to the local quiz library.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedQuiz {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub draft: QuizDraft,
}

impl SavedQuiz {
    #[must_use]
    pub fn new(draft: QuizDraft) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            draft,
        }
    }
}

/// Presentational progress state, last-write-wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineProgress {
    pub percent: u8,
    pub status: String,
}

impl Default for PipelineProgress {
    fn default() -> Self {
        Self {
            percent: 0,
            status: "Initializing...".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub api_base_url: String,
    #[serde(default = "default_health_timeout")]
    pub health_timeout_secs: u64,
    #[serde(default = "default_question_timeout")]
    pub question_timeout_secs: u64,
    #[serde(default = "default_pacing_ms")]
    pub question_pacing_ms: u64,
    #[serde(default = "default_error_backoff_ms")]
    pub error_backoff_ms: u64,
    #[serde(default = "default_max_retries")]
    pub max_question_retries: u32,
    #[serde(default = "default_question_count")]
    pub default_question_count: u32,
    #[serde(default = "default_chunk_size")]
    pub default_chunk_size: u32,
    #[serde(default)]
    pub default_difficulty: Difficulty,
    #[serde(default)]
    pub theme: ThemeConfig,
}

const fn default_health_timeout() -> u64 {
    10
}

const fn default_question_timeout() -> u64 {
    90
}

const fn default_pacing_ms() -> u64 {
    800
}

const fn default_error_backoff_ms() -> u64 {
    1000
}

const fn default_max_retries() -> u32 {
    3
}

const fn default_question_count() -> u32 {
    5
}

const fn default_chunk_size() -> u32 {
    1000
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:5000".to_string(),
            health_timeout_secs: default_health_timeout(),
            question_timeout_secs: default_question_timeout(),
            question_pacing_ms: default_pacing_ms(),
            error_backoff_ms: default_error_backoff_ms(),
            max_question_retries: default_max_retries(),
            default_question_count: default_question_count(),
            default_chunk_size: default_chunk_size(),
            default_difficulty: Difficulty::default(),
            theme: ThemeConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThemeConfig {
    pub accent_color: String,
    pub success_color: String,
    pub error_color: String,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            accent_color: "cyan".to_string(),
            success_color: "green".to_string(),
            error_color: "red".to_string(),
        }
    }
}
