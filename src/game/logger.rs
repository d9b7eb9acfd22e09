//! Round logger with verbosity levels, in-memory capture and an optional sink
//!
//! The caller of a round may hand in an append-only line consumer; every line
//! the logger accepts is forwarded to it in addition to stdout/capture.

use serde::{Deserialize, Serialize};
use std::cell::{Ref, RefCell};
use std::ops::Deref;

/// Verbosity level for round output
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub enum VerbosityLevel {
    /// Silent - no output during the round
    Silent = 0,
    /// Minimal - only the round outcome
    Minimal = 1,
    /// Normal - phases and casts (default)
    #[default]
    Normal = 2,
    /// Verbose - every damage, heal and effect change
    Verbose = 3,
}

/// Output destination for log messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum OutputMode {
    /// Output only to stdout (default)
    #[default]
    Stdout,
    /// Capture only to in-memory buffer (no stdout)
    Memory,
    /// Both stdout and in-memory buffer
    Both,
}

/// Append-only line consumer supplied by the round caller
pub type LogSink = Box<dyn FnMut(&str) + Send>;

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub level: VerbosityLevel,
    pub message: String,
}

/// Read-only access to captured log entries
pub struct LogGuard<'a> {
    guard: Ref<'a, Vec<LogEntry>>,
}

impl<'a> LogGuard<'a> {
    pub fn iter(&self) -> std::slice::Iter<'_, LogEntry> {
        self.guard.iter()
    }

    pub fn len(&self) -> usize {
        self.guard.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guard.is_empty()
    }
}

impl<'a> Deref for LogGuard<'a> {
    type Target = [LogEntry];

    fn deref(&self) -> &Self::Target {
        &self.guard
    }
}

pub struct RoundLogger {
    verbosity: VerbosityLevel,
    output_mode: OutputMode,
    log_buffer: RefCell<Vec<LogEntry>>,
    sink: RefCell<Option<LogSink>>,
}

impl RoundLogger {
    pub fn new() -> Self {
        Self::with_verbosity(VerbosityLevel::default())
    }

    pub fn with_verbosity(verbosity: VerbosityLevel) -> Self {
        RoundLogger {
            verbosity,
            output_mode: OutputMode::default(),
            log_buffer: RefCell::new(Vec::new()),
            sink: RefCell::new(None),
        }
    }

    /// Logger that writes nothing anywhere
    pub fn silent() -> Self {
        Self::with_verbosity(VerbosityLevel::Silent)
    }

    pub fn set_sink(&mut self, sink: Option<LogSink>) {
        *self.sink.get_mut() = sink;
    }

    pub fn set_output_mode(&mut self, mode: OutputMode) {
        self.output_mode = mode;
    }

    pub fn output_mode(&self) -> OutputMode {
        self.output_mode
    }

    /// Capture to memory only (suppresses stdout)
    pub fn enable_capture(&mut self) {
        self.output_mode = OutputMode::Memory;
    }

    pub fn is_capturing(&self) -> bool {
        matches!(self.output_mode, OutputMode::Memory | OutputMode::Both)
    }

    pub fn verbosity(&self) -> VerbosityLevel {
        self.verbosity
    }

    pub fn set_verbosity(&mut self, verbosity: VerbosityLevel) {
        self.verbosity = verbosity;
    }

    pub fn logs(&self) -> LogGuard<'_> {
        LogGuard {
            guard: self.log_buffer.borrow(),
        }
    }

    /// Drain the capture buffer
    pub fn take_logs(&mut self) -> Vec<LogEntry> {
        std::mem::take(self.log_buffer.get_mut())
    }

    #[inline]
    pub fn minimal(&self, message: &str) {
        self.log(VerbosityLevel::Minimal, message);
    }

    #[inline]
    pub fn normal(&self, message: &str) {
        self.log(VerbosityLevel::Normal, message);
    }

    #[inline]
    pub fn verbose(&self, message: &str) {
        self.log(VerbosityLevel::Verbose, message);
    }

    fn log(&self, level: VerbosityLevel, message: &str) {
        if level > self.verbosity {
            return;
        }

        if self.is_capturing() {
            self.log_buffer.borrow_mut().push(LogEntry {
                level,
                message: message.to_string(),
            });
        }

        if matches!(self.output_mode, OutputMode::Stdout | OutputMode::Both) {
            if level == VerbosityLevel::Minimal {
                println!("{message}");
            } else {
                println!("  {message}");
            }
        }

        if let Some(sink) = self.sink.borrow_mut().as_mut() {
            sink(message);
        }
    }
}

impl Default for RoundLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RoundLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoundLogger")
            .field("verbosity", &self.verbosity)
            .field("output_mode", &self.output_mode)
            .field("log_count", &self.log_buffer.borrow().len())
            .field("has_sink", &self.sink.borrow().is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_logger_creation() {
        let logger = RoundLogger::new();
        assert_eq!(logger.verbosity(), VerbosityLevel::Normal);
    }

    #[test]
    fn test_log_capture_respects_verbosity() {
        let mut logger = RoundLogger::with_verbosity(VerbosityLevel::Normal);
        logger.enable_capture();

        logger.normal("cast resolved");
        logger.minimal("player1 wins");
        logger.verbose("3 damage to p2-4");

        let logs = logger.logs();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].message, "cast resolved");
        assert_eq!(logs[1].level, VerbosityLevel::Minimal);
    }

    #[test]
    fn test_sink_receives_lines() {
        let lines = Arc::new(Mutex::new(Vec::new()));
        let captured = Arc::clone(&lines);

        let mut logger = RoundLogger::new();
        logger.set_output_mode(OutputMode::Memory);
        logger.set_sink(Some(Box::new(move |line: &str| {
            captured.lock().unwrap().push(line.to_string());
        })));

        logger.normal("round 1 begins");
        logger.verbose("dropped at normal verbosity");

        assert_eq!(*lines.lock().unwrap(), vec!["round 1 begins".to_string()]);
    }

    #[test]
    fn test_silent_logger_drops_everything() {
        let mut logger = RoundLogger::silent();
        logger.enable_capture();
        logger.minimal("nothing");
        assert!(logger.logs().is_empty());
    }
}
