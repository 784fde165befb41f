// Append-only console log shown while the pipeline runs

use chrono::{DateTime, Local};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
pub struct ConsoleLine {
    pub timestamp: DateTime<Local>,
    pub level: LogLevel,
    pub message: String,
}

impl ConsoleLine {
    #[must_use]
    pub fn new(level: LogLevel, message: String) -> Self {
        Self {
            timestamp: Local::now(),
            level,
            message,
        }
    }

    /// `[HH:MM:SS] message`, the format the console panel renders.
    #[must_use]
    pub fn display_text(&self) -> String {
        format!("[{}] {}", self.timestamp.format("%H:%M:%S"), self.message)
    }
}

/// Lines are only ever appended and render in arrival order; the panel
/// auto-scrolls to the newest entry. No eviction for the life of the run.
#[derive(Debug, Default)]
pub struct ConsoleLog {
    lines: Vec<ConsoleLine>,
}

impl ConsoleLog {
    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    pub fn push(&mut self, level: LogLevel, message: impl Into<String>) {
        self.lines.push(ConsoleLine::new(level, message.into()));
    }

    #[must_use]
    pub fn lines(&self) -> &[ConsoleLine] {
        &self.lines
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[allow(dead_code)]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_preserves_arrival_order() {
        let mut log = ConsoleLog::new();
        log.push(LogLevel::Info, "first");
        log.push(LogLevel::Success, "second");
        log.push(LogLevel::Error, "third");

        let messages: Vec<&str> = log.lines().iter().map(|l| l.message.as_str()).collect();
        assert_eq!(messages, vec!["first", "second", "third"]);
        assert_eq!(log.len(), 3);
    }

    #[test]
    fn test_display_text_carries_timestamp_and_message() {
        let line = ConsoleLine::new(LogLevel::Warning, "no chunks to process".to_string());
        let text = line.display_text();
        assert!(text.starts_with('['));
        assert!(text.ends_with("no chunks to process"));
    }

    #[test]
    fn test_clear_resets_log() {
        let mut log = ConsoleLog::new();
        log.push(LogLevel::Info, "stale");
        log.clear();
        assert!(log.is_empty());
    }
}
