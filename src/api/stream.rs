// Decoder for the streamed `data: <json>` events of the upload endpoint

use serde::Deserialize;

/// Which phase of server-side parsing a progress event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsePhase {
    Pages,
    Chunking,
    Filtering,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageProgress {
    pub phase: ParsePhase,
    pub status: String,
    /// `(current, total)` when the server reports per-unit progress.
    pub units: Option<(u64, u64)>,
}

impl StageProgress {
    /// Fraction of the phase completed, if unit counts were reported.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn ratio(&self) -> Option<f64> {
        self.units
            .filter(|(_, total)| *total > 0)
            .map(|(current, total)| current as f64 / total as f64)
    }
}

/// Terminal payload of a successful upload stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSummary {
    pub success: bool,
    pub chunks: Vec<String>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageEvent {
    Progress(StageProgress),
    Completed(UploadSummary),
    Errored(String),
    Heartbeat,
}

impl StageEvent {
    /// Completion and error events end the sequence.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed(_) | Self::Errored(_))
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    stage: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    current_page: Option<u64>,
    #[serde(default)]
    total_pages: Option<u64>,
    #[serde(default)]
    current_chunk: Option<u64>,
    #[serde(default)]
    total_chunks: Option<u64>,
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    chunks: Option<Vec<String>>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

const EVENT_PREFIX: &str = "data: ";

/// Incremental decoder over the line-delimited event protocol.
///
/// Bytes are buffered until a full line arrives, so events come out the same
/// no matter how the transport splits its chunks. Lines that are not valid
/// event envelopes are skipped. After the first terminal event the decoder
/// ignores the rest of the stream.
#[derive(Debug, Default)]
pub struct StreamDecoder {
    buffer: Vec<u8>,
    finished: bool,
}

impl StreamDecoder {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buffer: Vec::new(),
            finished: false,
        }
    }

    /// Feed one transport chunk, returning every event completed by it.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<StageEvent> {
        if self.finished {
            return Vec::new();
        }
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(newline) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=newline).collect();
            let text = String::from_utf8_lossy(&line);
            if let Some(event) = parse_line(text.trim()) {
                let terminal = event.is_terminal();
                events.push(event);
                if terminal {
                    self.finished = true;
                    break;
                }
            }
        }
        events
    }

    /// Whether a terminal event has been seen. A transport stream that ends
    /// while this is still false never produced a complete response; the
    /// orchestrator reports that as an incomplete-response failure.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.finished
    }
}

fn parse_line(line: &str) -> Option<StageEvent> {
    let payload = line.strip_prefix(EVENT_PREFIX)?;
    let envelope: Envelope = serde_json::from_str(payload).ok()?;
    classify(envelope)
}

fn classify(envelope: Envelope) -> Option<StageEvent> {
    match envelope.kind.as_str() {
        "progress" => {
            let (phase, units) = if let (Some(current), Some(total)) =
                (envelope.current_page, envelope.total_pages)
            {
                (ParsePhase::Pages, Some((current, total)))
            } else {
                let phase = match envelope.stage.as_deref() {
                    Some("chunking") => ParsePhase::Chunking,
                    Some("filtering") => ParsePhase::Filtering,
                    _ => ParsePhase::Other,
                };
                let units = envelope.current_chunk.zip(envelope.total_chunks);
                (phase, units)
            };
            Some(StageEvent::Progress(StageProgress {
                phase,
                status: envelope.status.unwrap_or_default(),
                units,
            }))
        }
        "complete" => {
            if let Some(error) = envelope.error {
                return Some(StageEvent::Errored(error));
            }
            Some(StageEvent::Completed(UploadSummary {
                success: envelope.success.unwrap_or(true),
                chunks: envelope.chunks.unwrap_or_default(),
                message: envelope.message.unwrap_or_default(),
            }))
        }
        "error" => Some(StageEvent::Errored(
            envelope
                .message
                .or(envelope.error)
                .unwrap_or_else(|| "unknown server error".to_string()),
        )),
        "heartbeat" => Some(StageEvent::Heartbeat),
        _ => None,
    }
}
