// Event types for pipeline-to-UI communication

use crate::console::LogLevel;
use crate::error::FailureReason;
use crate::models::{PipelineProgress, QuizDraft};
use crate::pipeline::PipelineState;

#[derive(Debug, Clone)]
pub enum AppEvent {
    /// One console line emitted by the pipeline
    Log(LogLevel, String),
    /// Progress bar update
    Progress(PipelineProgress),
    /// The orchestrator moved to a new state
    StateChanged(PipelineState),
    /// The pipeline finished and the draft was handed off
    Finished(QuizDraft),
    /// The pipeline reached a terminal failure
    Failed(FailureReason),
}
