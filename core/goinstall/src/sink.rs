//! User-facing progress output.
//!
//! Install progress is reported as plain text lines to a [`LogSink`], kept
//! separate from `tracing` diagnostics so a caller can show it in a build log
//! or terminal regardless of the tracing filter.

use std::sync::Mutex;

/// Receives progress lines from an install attempt.
pub trait LogSink: Send + Sync {
    /// Emits one line of text.
    fn line(&self, text: &str);
}

/// Writes lines to standard error.
#[derive(Debug, Clone, Copy, Default)]
pub struct StderrSink;

impl LogSink for StderrSink {
    fn line(&self, text: &str) {
        eprintln!("{text}");
    }
}

/// Collects lines in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the lines collected so far.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .map(|lines| lines.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

impl LogSink for MemorySink {
    fn line(&self, text: &str) {
        let mut lines = self
            .lines
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        lines.push(text.to_string());
    }
}
