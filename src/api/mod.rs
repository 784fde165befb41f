// HTTP client for the quiz generation backend

pub mod stream;

use anyhow::{Context, Result};
use futures::stream::{Stream, StreamExt};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use crate::error::TransportError;
use crate::models::{AppConfig, Difficulty, Question};
use stream::{StageEvent, StreamDecoder};

/// Decoded upload events, lazily produced from the response body. The stream
/// ends after the first terminal event; ending without one means the server
/// never sent a complete response.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<StageEvent, TransportError>> + Send>>;

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct HealthReport {
    #[serde(default)]
    pub api_key_valid: bool,
}

#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub file_name: String,
    pub file_bytes: Vec<u8>,
    pub title: String,
    pub question_count: u32,
    pub chunk_size: u32,
    pub keywords: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChunkQuestionRequest {
    pub chunk: String,
    pub question_number: u32,
    pub difficulty: Difficulty,
}

#[derive(Debug, Clone, Serialize)]
pub struct TopicQuestionRequest {
    pub topic: String,
    pub difficulty: Difficulty,
    pub question_number: u32,
}

/// The seam the orchestrator depends on. `QuizApiClient` is the production
/// implementation; tests substitute fakes.
pub trait QuizBackend {
    fn health(&self) -> impl Future<Output = Result<HealthReport, TransportError>> + Send;

    fn upload_source(
        &self,
        request: UploadRequest,
    ) -> impl Future<Output = Result<EventStream, TransportError>> + Send;

    fn question_from_chunk(
        &self,
        request: ChunkQuestionRequest,
    ) -> impl Future<Output = Result<Question, TransportError>> + Send;

    fn quick_question(
        &self,
        request: TopicQuestionRequest,
    ) -> impl Future<Output = Result<Question, TransportError>> + Send;
}

#[derive(Debug, Clone)]
pub struct QuizApiClient {
    base_url: String,
    health_timeout: Duration,
    question_timeout: Duration,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
}

impl QuizApiClient {
    pub fn new(
        base_url: String,
        health_timeout_secs: u64,
        question_timeout_secs: u64,
    ) -> Result<Self> {
        let client = Client::builder()
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            base_url,
            health_timeout: Duration::from_secs(health_timeout_secs),
            question_timeout: Duration::from_secs(question_timeout_secs),
            client,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(
            config.api_base_url.clone(),
            config.health_timeout_secs,
            config.question_timeout_secs,
        )
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn parse_question(response: Response) -> Result<Question, TransportError> {
        if !response.status().is_success() {
            return Err(classify_response(response).await);
        }
        response
            .json::<Question>()
            .await
            .map_err(|e| TransportError::Remote(format!("malformed question response: {e}")))
    }
}

impl QuizBackend for QuizApiClient {
    async fn health(&self) -> Result<HealthReport, TransportError> {
        let response = self
            .client
            .get(self.endpoint("/api/health"))
            .timeout(self.health_timeout)
            .send()
            .await
            .map_err(|e| classify_send_error(&e, self.health_timeout))?;

        if !response.status().is_success() {
            return Err(classify_response(response).await);
        }

        response
            .json::<HealthReport>()
            .await
            .map_err(|e| TransportError::Remote(format!("malformed health response: {e}")))
    }

    async fn upload_source(&self, request: UploadRequest) -> Result<EventStream, TransportError> {
        let part = reqwest::multipart::Part::bytes(request.file_bytes)
            .file_name(request.file_name)
            .mime_str("application/pdf")
            .map_err(|e| TransportError::Remote(e.to_string()))?;
        let form = reqwest::multipart::Form::new()
            .part("pdf_file", part)
            .text("quiz_title", request.title)
            .text("num_questions", request.question_count.to_string())
            .text("chunk_size", request.chunk_size.to_string())
            .text("topic_keywords", request.keywords);

        // No request timeout here: the parse stream legitimately runs for
        // minutes and heartbeats keep it alive.
        let response = self
            .client
            .post(self.endpoint("/api/upload_pdf"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| classify_send_error(&e, self.question_timeout))?;

        if !response.status().is_success() {
            return Err(classify_response(response).await);
        }

        // Buffered line decoding over the byte stream, one event out at a time.
        let stream = futures::stream::unfold(
            (
                response.bytes_stream(),
                StreamDecoder::new(),
                VecDeque::new(),
            ),
            |(mut bytes, mut decoder, mut pending)| async move {
                loop {
                    if let Some(event) = pending.pop_front() {
                        return Some((Ok(event), (bytes, decoder, pending)));
                    }
                    if decoder.is_finished() {
                        return None;
                    }
                    match bytes.next().await {
                        Some(Ok(chunk)) => pending.extend(decoder.push(&chunk)),
                        Some(Err(e)) => {
                            return Some((
                                Err(TransportError::NetworkFailure(e.to_string())),
                                (bytes, decoder, pending),
                            ));
                        }
                        None => return None,
                    }
                }
            },
        );

        Ok(Box::pin(stream))
    }

    async fn question_from_chunk(
        &self,
        request: ChunkQuestionRequest,
    ) -> Result<Question, TransportError> {
        let response = self
            .client
            .post(self.endpoint("/api/generate_question_from_chunk"))
            .json(&request)
            .timeout(self.question_timeout)
            .send()
            .await
            .map_err(|e| classify_send_error(&e, self.question_timeout))?;

        Self::parse_question(response).await
    }

    async fn quick_question(
        &self,
        request: TopicQuestionRequest,
    ) -> Result<Question, TransportError> {
        let response = self
            .client
            .post(self.endpoint("/api/generate_quick_question"))
            .json(&request)
            .timeout(self.question_timeout)
            .send()
            .await
            .map_err(|e| classify_send_error(&e, self.question_timeout))?;

        Self::parse_question(response).await
    }
}

fn classify_send_error(error: &reqwest::Error, timeout: Duration) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout(timeout.as_secs())
    } else {
        TransportError::NetworkFailure(error.to_string())
    }
}

/// Map a non-2xx response to the transport taxonomy. The 400 + "API key"
/// marker is how the backend reports a rejected credential.
async fn classify_response(response: Response) -> TransportError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(|b| b.error)
        .unwrap_or_else(|| format!("HTTP {status}"));

    match status {
        StatusCode::BAD_REQUEST if message.contains("API key") => {
            TransportError::InvalidCredential(message)
        }
        StatusCode::TOO_MANY_REQUESTS => TransportError::RateLimited,
        StatusCode::NOT_FOUND => TransportError::ModelUnavailable,
        _ => TransportError::Remote(message),
    }
}
