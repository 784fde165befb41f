// Generation pipeline orchestrator

use futures::StreamExt;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::sleep;

use crate::api::stream::{ParsePhase, StageEvent, StageProgress, UploadSummary};
use crate::api::{ChunkQuestionRequest, QuizBackend, TopicQuestionRequest, UploadRequest};
use crate::console::LogLevel;
use crate::error::{FailureReason, TransportError};
use crate::events::AppEvent;
use crate::models::{AppConfig, GenerationRequest, QuizDraft, QuizSource};
use crate::progress::{self, Stage};
use crate::storage::HandoffSlot;

/// States of the generation state machine. Failure is terminal and reachable
/// from anywhere; retry means a fresh run from `Idle`.
#[derive(Debug, Clone)]
pub enum PipelineState {
    Idle,
    HealthCheck,
    Uploading,
    Chunking,
    Filtering,
    Generating(u32),
    Finalizing,
    Done,
    Failed(FailureReason),
}

impl PipelineState {
    const fn discriminant(&self) -> u8 {
        match self {
            Self::Idle => 0,
            Self::HealthCheck => 1,
            Self::Uploading => 2,
            Self::Chunking => 3,
            Self::Filtering => 4,
            Self::Generating(_) => 5,
            Self::Finalizing => 6,
            Self::Done => 7,
            Self::Failed(_) => 8,
        }
    }
}

/// Pacing and retry policy, all knobs from config so tests can zero the
/// delays.
#[derive(Debug, Clone)]
pub struct PipelinePolicy {
    /// Delay after each successfully generated question
    pub question_pacing: Duration,
    /// Delay before retrying a failed question, longer than the pacing delay
    pub error_backoff: Duration,
    /// Retry cap per question; the original front end retried without bound
    pub max_question_retries: u32,
    /// Short fixed delays between stages, purely presentational
    pub stage_pause: Duration,
}

impl PipelinePolicy {
    #[must_use]
    pub const fn from_config(config: &AppConfig) -> Self {
        Self {
            question_pacing: Duration::from_millis(config.question_pacing_ms),
            error_backoff: Duration::from_millis(config.error_backoff_ms),
            max_question_retries: config.max_question_retries,
            stage_pause: Duration::from_millis(500),
        }
    }

    #[cfg(test)]
    #[must_use]
    pub const fn immediate(max_question_retries: u32) -> Self {
        Self {
            question_pacing: Duration::ZERO,
            error_backoff: Duration::ZERO,
            max_question_retries,
            stage_pause: Duration::ZERO,
        }
    }
}

pub struct Pipeline<B> {
    backend: B,
    policy: PipelinePolicy,
    handoff: HandoffSlot,
    events: UnboundedSender<AppEvent>,
    state: PipelineState,
}

impl<B: QuizBackend> Pipeline<B> {
    pub const fn new(
        backend: B,
        policy: PipelinePolicy,
        handoff: HandoffSlot,
        events: UnboundedSender<AppEvent>,
    ) -> Self {
        Self {
            backend,
            policy,
            handoff,
            events,
            state: PipelineState::Idle,
        }
    }

    /// Drive the whole pipeline for one request. All outcomes are reported
    /// through the event channel; the caller only spawns and forgets.
    pub async fn run(mut self, request: GenerationRequest) {
        self.log(LogLevel::Info, "System initialized. Starting quiz generation...");
        if let Err(reason) = self.execute(&request).await {
            self.log(LogLevel::Error, format!("FATAL ERROR: {reason}"));
            self.log(LogLevel::Error, reason.hint());
            self.log(LogLevel::Error, "Quiz generation stopped.");
            self.set_state(PipelineState::Failed(reason.clone()));
            let _ = self.events.send(AppEvent::Failed(reason));
        }
    }

    async fn execute(&mut self, request: &GenerationRequest) -> Result<(), FailureReason> {
        self.health_check().await?;

        let chunks = match &request.source {
            QuizSource::Document(path) => self.upload(request, path).await?,
            QuizSource::Topic(_) => Vec::new(),
        };

        let draft = self.generate(request, &chunks).await?;
        self.finalize(draft)
    }

    async fn health_check(&mut self) -> Result<(), FailureReason> {
        self.set_state(PipelineState::HealthCheck);
        self.progress(Stage::Connect, 0.5, "Checking API connection...");
        self.log(LogLevel::Info, "Connecting to the API server...");

        match self.backend.health().await {
            Ok(report) => {
                self.log(LogLevel::Success, "API server is reachable");
                if report.api_key_valid {
                    self.log(LogLevel::Success, "API key is valid");
                } else {
                    // Not fatal, the backend may still serve cached models.
                    self.log(
                        LogLevel::Warning,
                        "Warning: the backend reports an invalid API key",
                    );
                }
                self.progress(Stage::Connect, 1.0, "Connected");
                Ok(())
            }
            Err(e) => {
                self.log(
                    LogLevel::Error,
                    format!("Could not reach the API server: {e}"),
                );
                Err(FailureReason::ServerUnreachable(e.to_string()))
            }
        }
    }

    async fn upload(
        &mut self,
        request: &GenerationRequest,
        path: &std::path::Path,
    ) -> Result<Vec<String>, FailureReason> {
        self.set_state(PipelineState::Uploading);
        self.progress(Stage::PageParse, 0.0, "Loading PDF file...");
        self.log(LogLevel::Info, "Loading PDF file...");

        let file_bytes = tokio::fs::read(path).await.map_err(|e| {
            FailureReason::UploadFailed(format!("could not read {}: {e}", path.display()))
        })?;
        let file_name = path
            .file_name()
            .map_or_else(|| "document.pdf".to_string(), |n| n.to_string_lossy().into_owned());

        #[allow(clippy::cast_precision_loss)]
        let size_mb = file_bytes.len() as f64 / 1024.0 / 1024.0;
        self.log(
            LogLevel::Info,
            format!("Sending {file_name} ({size_mb:.2} MB) for parsing..."),
        );

        let upload = UploadRequest {
            file_name,
            file_bytes,
            title: request.title.clone(),
            question_count: request.question_count,
            chunk_size: request.chunk_size,
            keywords: request.keywords.clone(),
        };

        let mut events = self.backend.upload_source(upload).await.map_err(|e| {
            if e.is_fatal() {
                FailureReason::Transport(e)
            } else {
                FailureReason::UploadFailed(e.to_string())
            }
        })?;

        self.log(
            LogLevel::Success,
            "Connected to the server. Waiting for parse progress...",
        );

        let mut summary: Option<UploadSummary> = None;
        while let Some(item) = events.next().await {
            match item {
                Ok(StageEvent::Progress(progress)) => self.upload_progress(&progress),
                Ok(StageEvent::Heartbeat) => {}
                Ok(StageEvent::Completed(s)) => {
                    self.log(LogLevel::Success, s.message.clone());
                    summary = Some(s);
                    break;
                }
                Ok(StageEvent::Errored(message)) => {
                    self.log(LogLevel::Error, format!("Error: {message}"));
                    return Err(FailureReason::UploadFailed(message));
                }
                Err(e) => {
                    self.log(LogLevel::Error, format!("Error reading the stream: {e}"));
                    return Err(FailureReason::UploadFailed(e.to_string()));
                }
            }
        }

        let Some(summary) = summary else {
            return Err(FailureReason::IncompleteResponse);
        };
        if !summary.success {
            return Err(FailureReason::UploadFailed(summary.message));
        }

        if summary.chunks.is_empty() {
            self.log(LogLevel::Warning, "No segments to process");
        } else {
            self.log(
                LogLevel::Success,
                format!("Segmentation finished, {} segments created", summary.chunks.len()),
            );
        }

        self.progress(Stage::Prepare, 0.5, "Preparing segments...");
        sleep(self.policy.stage_pause).await;
        self.progress(Stage::Prepare, 1.0, "Segmentation complete");

        Ok(summary.chunks)
    }

    /// Stage events move the recorded state through Chunking/Filtering, but
    /// only stream completion advances the machine past the upload.
    fn upload_progress(&mut self, progress: &StageProgress) {
        let ratio = progress.ratio().unwrap_or(0.0);
        match progress.phase {
            ParsePhase::Pages => {
                self.progress(Stage::PageParse, ratio, progress.status.clone());
            }
            ParsePhase::Chunking => {
                self.set_state(PipelineState::Chunking);
                self.progress(Stage::Chunking, ratio, progress.status.clone());
            }
            ParsePhase::Filtering => {
                self.set_state(PipelineState::Filtering);
                self.progress(Stage::Filtering, ratio, progress.status.clone());
            }
            ParsePhase::Other => {}
        }
        if !progress.status.is_empty() {
            self.log(LogLevel::Info, progress.status.clone());
        }
    }

    async fn generate(
        &mut self,
        request: &GenerationRequest,
        chunks: &[String],
    ) -> Result<QuizDraft, FailureReason> {
        self.set_state(PipelineState::Generating(0));
        self.progress(Stage::Generate, 0.0, "Connecting to the model...");
        self.log(
            LogLevel::Info,
            format!("Generating {} questions...", request.question_count),
        );
        sleep(self.policy.stage_pause).await;

        let mut draft = QuizDraft::for_request(request);
        let total = request.question_count;

        for index in 0..total {
            self.set_state(PipelineState::Generating(index));
            let number = index + 1;
            let ratio = f64::from(number) / f64::from(total);
            self.log(
                LogLevel::Info,
                format!("Generating question {number}/{total}..."),
            );
            self.progress(Stage::Generate, ratio, format!("Generating question {number}..."));

            if let Some(question) = self.generate_one(request, chunks, index).await? {
                draft.push_question(question);
                self.log(
                    LogLevel::Success,
                    format!("Question {number} generated successfully"),
                );
                sleep(self.policy.question_pacing).await;
            }
        }

        if draft.questions.is_empty() {
            return Err(FailureReason::NoQuestionsGenerated);
        }

        self.log(
            LogLevel::Success,
            format!(
                "All questions generated! ({}/{})",
                draft.questions.len(),
                total
            ),
        );
        self.progress(Stage::Generate, 1.0, "Questions generated");

        Ok(draft)
    }

    /// One slot of the generation loop: retry transient failures with backoff
    /// up to the policy cap, abort the whole pipeline on fatal ones, and skip
    /// the slot when the cap is exhausted.
    async fn generate_one(
        &mut self,
        request: &GenerationRequest,
        chunks: &[String],
        index: u32,
    ) -> Result<Option<crate::models::Question>, FailureReason> {
        let number = index + 1;
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            match self.request_question(request, chunks, number, index).await {
                Ok(question) => match question.validate() {
                    Ok(()) => return Ok(Some(question)),
                    Err(e) => {
                        self.log(
                            LogLevel::Error,
                            format!("Question {number} has an invalid format: {e}"),
                        );
                    }
                },
                Err(e) if e.is_fatal() => {
                    self.log(
                        LogLevel::Error,
                        format!("Error generating question {number}: {e}"),
                    );
                    self.log(
                        LogLevel::Error,
                        "Stopping generation: check your API key and model access.",
                    );
                    return Err(FailureReason::Transport(e));
                }
                Err(e) => {
                    self.log(
                        LogLevel::Error,
                        format!("Error generating question {number}: {e}"),
                    );
                }
            }

            if attempts > self.policy.max_question_retries {
                self.log(
                    LogLevel::Warning,
                    format!("Skipping question {number} after {attempts} failed attempts"),
                );
                return Ok(None);
            }
            sleep(self.policy.error_backoff).await;
        }
    }

    async fn request_question(
        &self,
        request: &GenerationRequest,
        chunks: &[String],
        number: u32,
        index: u32,
    ) -> Result<crate::models::Question, TransportError> {
        match &request.source {
            QuizSource::Topic(topic) => {
                self.backend
                    .quick_question(TopicQuestionRequest {
                        topic: topic.clone(),
                        difficulty: request.difficulty,
                        question_number: number,
                    })
                    .await
            }
            QuizSource::Document(_) => {
                // Round-robin over the parsed segments.
                let chunk = if chunks.is_empty() {
                    String::new()
                } else {
                    chunks[index as usize % chunks.len()].clone()
                };
                self.backend
                    .question_from_chunk(ChunkQuestionRequest {
                        chunk,
                        question_number: number,
                        difficulty: request.difficulty,
                    })
                    .await
            }
        }
    }

    fn finalize(&mut self, draft: QuizDraft) -> Result<(), FailureReason> {
        self.set_state(PipelineState::Finalizing);
        self.progress(Stage::Finalize, 0.5, "Preparing quiz...");

        self.handoff
            .put(&draft)
            .map_err(|e| FailureReason::HandoffFailed(e.to_string()))?;

        self.progress(Stage::Finalize, 1.0, "Quiz is ready!");
        self.log(LogLevel::Success, "Quiz data saved. Opening preview...");
        self.set_state(PipelineState::Done);
        let _ = self.events.send(AppEvent::Finished(draft));
        Ok(())
    }

    fn set_state(&mut self, state: PipelineState) {
        if state.discriminant() == self.state.discriminant() {
            return;
        }
        self.state = state.clone();
        let _ = self.events.send(AppEvent::StateChanged(state));
    }

    fn progress(&self, stage: Stage, ratio: f64, status: impl Into<String>) {
        let _ = self
            .events
            .send(AppEvent::Progress(progress::report(stage, ratio, status)));
    }

    fn log(&self, level: LogLevel, message: impl Into<String>) {
        let _ = self.events.send(AppEvent::Log(level, message.into()));
    }
}
