//! Operator-visible audit trail. Append-only and unbounded for the session lifetime.

use std::fmt;

use chrono::{DateTime, Local};
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub at: DateTime<Local>,
    pub level: LogLevel,
    pub message: String,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.at.format("%H:%M:%S"), self.message)
    }
}

#[derive(Debug, Default)]
pub struct ActionLog {
    entries: Vec<LogEntry>,
}

impl ActionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.append(LogLevel::Info, message.into());
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.append(LogLevel::Warn, message.into());
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.append(LogLevel::Error, message.into());
    }

    fn append(&mut self, level: LogLevel, message: String) {
        match level {
            LogLevel::Info => info!(target: "action_log", "{message}"),
            LogLevel::Warn => warn!(target: "action_log", "{message}"),
            LogLevel::Error => error!(target: "action_log", "{message}"),
        }
        self.entries.push(LogEntry {
            at: Local::now(),
            level,
            message,
        });
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Entries appended after the first `seen` ones.
    pub fn since(&self, seen: usize) -> &[LogEntry] {
        self.entries.get(seen..).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn count(&self, level: LogLevel) -> usize {
        self.entries.iter().filter(|entry| entry.level == level).count()
    }

    pub fn last(&self) -> Option<&LogEntry> {
        self.entries.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_are_timestamped_and_ordered() {
        let mut log = ActionLog::new();
        log.info("first");
        log.error("second");

        assert_eq!(log.len(), 2);
        assert_eq!(log.count(LogLevel::Error), 1);
        let rendered = log.entries()[0].to_string();
        assert!(rendered.starts_with('['));
        assert!(rendered.ends_with("] first"));
        assert_eq!(log.since(1)[0].message, "second");
        assert!(log.since(5).is_empty());
    }
}
