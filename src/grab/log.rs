use std::collections::VecDeque;

/// Separator between an operation and its result message.
const SEPARATOR: &str = "...";

/// Most-recent-first text log shown to the user.
///
/// Each line is also emitted through `tracing`. Once `capacity` lines are
/// held, the oldest line is dropped for every new one.
#[derive(Debug, Clone)]
pub struct LogSink {
    lines: VecDeque<String>,
    capacity: usize,
}

impl LogSink {
    /// A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            lines: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
        }
    }

    /// Log an informational line.
    pub fn info(&mut self, line: impl Into<String>) {
        let line = line.into();
        tracing::info!("{line}");
        self.push(line);
    }

    /// Log a failure line.
    pub fn warn(&mut self, line: impl Into<String>) {
        let line = line.into();
        tracing::warn!("{line}");
        self.push(line);
    }

    /// Log `"<operation>...<message>"`, as a warning unless `success`.
    pub fn result(&mut self, operation: &str, message: &str, success: bool) {
        let line = format!("{operation}{SEPARATOR}{message}");
        if success {
            self.info(line);
        } else {
            self.warn(line);
        }
    }

    fn push(&mut self, line: String) {
        self.lines.push_front(line);
        self.lines.truncate(self.capacity);
    }

    /// Lines, most recent first.
    pub fn entries(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    /// Lines in the order they were logged.
    pub fn oldest_first(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().rev().map(String::as_str)
    }

    /// The most recent line.
    pub fn latest(&self) -> Option<&str> {
        self.lines.front().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for LogSink {
    fn default() -> Self {
        Self::new(crate::settings::types::DEFAULT_LOG_CAPACITY)
    }
}
