//! Diagnostic sinks: where displayed warnings go.
//!
//! | Sink | Output |
//! |------|--------|
//! | [`StderrSink`] | One text line per warning on standard error |
//! | [`WriterSink`] | One text line per warning on any `io::Write` |
//! | [`TracingSink`] | A `WARN` level `tracing` event with structured fields |
//! | [`CaptureSink`] | Kept in memory, for tests |
//! | [`NoOpSink`] | Discarded |

use std::io::Write;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::types::Emission;

/// Destination for warnings the router decided to display.
pub trait DiagnosticSink: Send + Sync {
    /// Write one warning.
    fn write(&self, emission: &Emission);
}

impl<S: DiagnosticSink + ?Sized> DiagnosticSink for Arc<S> {
    fn write(&self, emission: &Emission) {
        (**self).write(emission)
    }
}

impl<S: DiagnosticSink + ?Sized> DiagnosticSink for Box<S> {
    fn write(&self, emission: &Emission) {
        (**self).write(emission)
    }
}

/// Writes `file:line: category: message` lines to standard error.
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrSink;

impl DiagnosticSink for StderrSink {
    fn write(&self, emission: &Emission) {
        let stderr = std::io::stderr();
        let mut handle = stderr.lock();
        // A closed stderr is not worth failing the caller over.
        let _ = writeln!(handle, "{}", emission);
    }
}

/// Writes text lines to an arbitrary writer.
#[derive(Debug)]
pub struct WriterSink<W> {
    writer: Mutex<W>,
}

impl<W: Write + Send> WriterSink<W> {
    /// Wrap a writer.
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Recover the writer.
    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

impl<W: Write + Send> DiagnosticSink for WriterSink<W> {
    fn write(&self, emission: &Emission) {
        let mut writer = self.writer.lock();
        if let Err(e) = writeln!(writer, "{}", emission) {
            tracing::debug!(error = %e, "failed to write warning to sink");
        }
    }
}

/// Emits each warning as a structured `tracing` event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn write(&self, emission: &Emission) {
        tracing::warn!(
            target: "mdao_warnings::emission",
            category = %emission.category,
            prefix = ?emission.prefix,
            file = %emission.location.file,
            line = emission.location.line,
            "{}",
            emission.message
        );
    }
}

/// Discards every warning.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpSink;

impl DiagnosticSink for NoOpSink {
    fn write(&self, _emission: &Emission) {
        // No-op
    }
}

/// Keeps displayed warnings in memory.
#[derive(Debug, Default)]
pub struct CaptureSink {
    emissions: Mutex<Vec<Emission>>,
}

impl CaptureSink {
    /// Create an empty capture sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything written so far.
    pub fn emissions(&self) -> Vec<Emission> {
        self.emissions.lock().clone()
    }

    /// Rendered text lines of everything written so far.
    pub fn lines(&self) -> Vec<String> {
        self.emissions.lock().iter().map(|e| e.to_string()).collect()
    }

    /// Number of warnings written.
    pub fn len(&self) -> usize {
        self.emissions.lock().len()
    }

    /// Whether nothing was written.
    pub fn is_empty(&self) -> bool {
        self.emissions.lock().is_empty()
    }

    /// Number of warnings written for one category.
    pub fn count_for(&self, category: &str) -> usize {
        self.emissions
            .lock()
            .iter()
            .filter(|e| e.category == category)
            .count()
    }

    /// Drop everything captured.
    pub fn clear(&self) {
        self.emissions.lock().clear();
    }
}

impl DiagnosticSink for CaptureSink {
    fn write(&self, emission: &Emission) {
        self.emissions.lock().push(emission.clone());
    }
}

/// Built-in sink selection, as named in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputTarget {
    /// [`StderrSink`].
    #[default]
    Stderr,
    /// [`TracingSink`].
    Tracing,
    /// [`NoOpSink`].
    Silent,
}

impl OutputTarget {
    /// Build the sink this target names.
    pub fn into_sink(self) -> Box<dyn DiagnosticSink> {
        match self {
            Self::Stderr => Box::new(StderrSink),
            Self::Tracing => Box::new(TracingSink),
            Self::Silent => Box::new(NoOpSink),
        }
    }
}

/// Error returned when parsing an unrecognized output target name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown warning output target: {0:?} (expected stderr, tracing or silent)")]
pub struct ParseOutputError(pub String);

impl std::str::FromStr for OutputTarget {
    type Err = ParseOutputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stderr" => Ok(Self::Stderr),
            "tracing" | "log" => Ok(Self::Tracing),
            "silent" | "none" => Ok(Self::Silent),
            _ => Err(ParseOutputError(s.to_string())),
        }
    }
}
