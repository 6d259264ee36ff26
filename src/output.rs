// ABOUTME: Output formatting for CLI feedback.
// ABOUTME: Human text, quiet CI output, or JSON line events for scripting.

use serde::Serialize;
use std::io::Write;
use std::time::Instant;

/// Output mode for CLI feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-friendly output with progress messages
    Normal,
    /// Minimal output for CI (only final result)
    Quiet,
    /// JSON lines for scripting
    Json,
}

#[derive(Debug, Clone, Copy)]
enum Stream {
    Stdout,
    Stderr,
}

/// Handles CLI output based on the configured mode.
pub struct Output {
    mode: OutputMode,
    start_time: Option<Instant>,
}

impl Output {
    pub fn new(mode: OutputMode) -> Self {
        Self {
            mode,
            start_time: None,
        }
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    /// Start timing an operation.
    pub fn start_timer(&mut self) {
        self.start_time = Some(Instant::now());
    }

    fn duration(&self) -> Option<f64> {
        self.start_time.map(|t| t.elapsed().as_secs_f64())
    }

    /// Print a progress message (suppressed in quiet/json mode).
    pub fn progress(&self, message: &str) {
        if self.mode == OutputMode::Normal {
            println!("{message}");
        }
    }

    /// Print a warning. Quiet mode drops warnings entirely.
    pub fn warning(&self, message: &str) {
        match self.mode {
            OutputMode::Normal => eprintln!("Warning: {message}"),
            OutputMode::Quiet => {}
            OutputMode::Json => self.event(Stream::Stderr, "warning", message, None::<&()>),
        }
    }

    /// Print a success message, with timing when a timer was started.
    pub fn success(&self, message: &str) {
        match (self.mode, self.duration()) {
            (OutputMode::Normal, Some(secs)) => println!("{message} ({secs:.1}s)"),
            (OutputMode::Normal | OutputMode::Quiet, _) => println!("{message}"),
            (OutputMode::Json, _) => self.event(Stream::Stdout, "success", message, None::<&()>),
        }
    }

    /// Print a structured result. Only JSON mode prints the payload; the
    /// other modes print `summary`.
    pub fn result<T: Serialize>(&self, summary: &str, data: &T) {
        match self.mode {
            OutputMode::Normal | OutputMode::Quiet => self.success(summary),
            OutputMode::Json => self.event(Stream::Stdout, "result", summary, Some(data)),
        }
    }

    /// Print an error message.
    pub fn error(&self, message: &str) {
        match self.mode {
            OutputMode::Normal | OutputMode::Quiet => eprintln!("Error: {message}"),
            OutputMode::Json => self.event(Stream::Stderr, "error", message, None::<&()>),
        }
    }

    fn event<T: Serialize>(&self, stream: Stream, event: &str, message: &str, data: Option<&T>) {
        let event = JsonEvent {
            event,
            message,
            duration_secs: self.duration(),
            data,
        };
        let line = match serde_json::to_string(&event) {
            Ok(line) => line,
            Err(e) => {
                tracing::error!(error = %e, "failed to encode output event");
                return;
            }
        };
        // write errors, e.g. a closed pipe, are ignored
        let _ = match stream {
            Stream::Stdout => writeln!(std::io::stdout().lock(), "{line}"),
            Stream::Stderr => writeln!(std::io::stderr().lock(), "{line}"),
        };
    }
}

#[derive(Serialize)]
struct JsonEvent<'a, T: Serialize> {
    event: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration_secs: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a T>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_omits_empty_fields() {
        let event = JsonEvent {
            event: "success",
            message: "done",
            duration_secs: None,
            data: None::<&()>,
        };
        assert_eq!(
            serde_json::to_string(&event).unwrap(),
            r#"{"event":"success","message":"done"}"#
        );
    }

    #[test]
    fn event_carries_payload() {
        let plans = vec!["a", "b"];
        let event = JsonEvent {
            event: "result",
            message: "2 build plan(s)",
            duration_secs: Some(1.5),
            data: Some(&plans),
        };
        let value: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&event).unwrap()).unwrap();
        assert_eq!(value["data"][1], "b");
        assert_eq!(value["duration_secs"], 1.5);
    }
}
