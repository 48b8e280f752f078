//! The player-facing message log.
//!
//! Distinct from diagnostics: these are the lines a renderer shows in its
//! message panel. Each appended line is also emitted at `debug` level so a
//! `RUST_LOG=maleficer_engine=debug` run reads like a transcript.

use std::collections::VecDeque;

/// Lines kept before the oldest are discarded.
pub const DEFAULT_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
pub struct MessageLog {
    lines: VecDeque<String>,
    capacity: usize,
}

impl Default for MessageLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(capacity.min(DEFAULT_CAPACITY)),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&mut self, line: impl Into<String>) {
        let line = line.into();
        tracing::debug!(target: "maleficer_engine::log", "{line}");
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line);
    }

    pub fn lines(&self) -> impl DoubleEndedIterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    /// The newest `count` lines, oldest first.
    pub fn tail(&self, count: usize) -> impl Iterator<Item = &str> {
        self.lines
            .iter()
            .skip(self.lines.len().saturating_sub(count))
            .map(String::as_str)
    }

    pub fn last(&self) -> Option<&str> {
        self.lines.back().map(String::as_str)
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines.iter().any(|line| line.contains(needle))
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

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
    fn oldest_lines_are_dropped_at_capacity() {
        let mut log = MessageLog::with_capacity(2);
        log.push("one");
        log.push("two");
        log.push("three");
        assert_eq!(log.lines().collect::<Vec<_>>(), vec!["two", "three"]);
        assert_eq!(log.last(), Some("three"));
    }

    #[test]
    fn tail_returns_newest_in_order() {
        let mut log = MessageLog::new();
        for line in ["a", "b", "c", "d"] {
            log.push(line);
        }
        assert_eq!(log.tail(2).collect::<Vec<_>>(), vec!["c", "d"]);
        assert_eq!(log.tail(10).count(), 4);
        assert!(log.contains("c"));
    }
}
