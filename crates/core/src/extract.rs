use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::{Duration, Instant},
};

use crate::{
    CatalogError, DialectKind,
    error::ExtractError,
    model::DatabaseMetadata,
};

/// Extraction phase, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Tables,
    Columns,
    Constraints,
    Indexes,
    Sequences,
    Functions,
    Triggers,
}

impl Phase {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tables => "tables",
            Self::Columns => "columns",
            Self::Constraints => "constraints",
            Self::Indexes => "indexes",
            Self::Sequences => "sequences",
            Self::Functions => "functions",
            Self::Triggers => "triggers",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event stream observed by a progress sink. Warnings are never fatal.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    PhaseStarted {
        phase: Phase,
    },
    PhaseCompleted {
        phase: Phase,
        items: usize,
        elapsed: Duration,
    },
    Warning {
        message: String,
    },
}

/// The single point of side-effectful observation during an extraction.
/// Events within one extraction arrive in strict phase order; across two
/// parallel extractions the interleaving is undefined.
pub trait ProgressSink: Send + Sync {
    fn on_event(&self, event: &ProgressEvent);
}

/// Discards every event.
#[derive(Debug, Default)]
pub struct NullProgress;

impl ProgressSink for NullProgress {
    fn on_event(&self, _event: &ProgressEvent) {}
}

/// Cooperative cancellation flag shared between the two extraction tasks.
/// Checked at phase boundaries and during retry backoff.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Options fixed at connect time.
#[derive(Clone)]
pub struct ExtractorOptions {
    /// Target schema/owner. `None` means the session default (`DATABASE()`,
    /// `public`, `dbo`, `USER`, `CURRENT SCHEMA` depending on dialect).
    pub schema: Option<String>,
    pub retry: bool,
    pub progress: Arc<dyn ProgressSink>,
    pub cancel: CancelToken,
}

impl Default for ExtractorOptions {
    fn default() -> Self {
        Self {
            schema: None,
            retry: true,
            progress: Arc::new(NullProgress),
            cancel: CancelToken::new(),
        }
    }
}

impl fmt::Debug for ExtractorOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractorOptions")
            .field("schema", &self.schema)
            .field("retry", &self.retry)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}

/// One side of a comparison: a live connection able to yield its metadata,
/// execute DDL, and answer a readiness probe.
pub trait SchemaSource {
    fn dialect(&self) -> DialectKind;
    fn extract(&mut self) -> Result<DatabaseMetadata, ExtractError>;
    fn execute(&mut self, sql: &str) -> Result<(), CatalogError>;
    fn ping(&mut self) -> Result<(), CatalogError>;
}

/// Shared phase bookkeeping for the dialect extractors: emits progress
/// events, logs, and times each phase.
pub struct PhaseReporter<'a> {
    options: &'a ExtractorOptions,
}

impl<'a> PhaseReporter<'a> {
    #[must_use]
    pub fn new(options: &'a ExtractorOptions) -> Self {
        Self { options }
    }

    /// Checks the cancel flag, then announces the phase.
    pub fn begin(&self, phase: Phase) -> Result<StartedPhase<'a>, ExtractError> {
        if self.options.cancel.is_cancelled() {
            return Err(ExtractError::Cancelled { phase });
        }
        tracing::info!(phase = phase.as_str(), "extracting");
        self.options
            .progress
            .on_event(&ProgressEvent::PhaseStarted { phase });
        Ok(StartedPhase {
            options: self.options,
            phase,
            started: Instant::now(),
        })
    }

    pub fn warn(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!("{message}");
        self.options
            .progress
            .on_event(&ProgressEvent::Warning { message });
    }
}

pub struct StartedPhase<'a> {
    options: &'a ExtractorOptions,
    phase: Phase,
    started: Instant,
}

impl StartedPhase<'_> {
    pub fn complete(self, items: usize) {
        let elapsed = self.started.elapsed();
        tracing::debug!(
            phase = self.phase.as_str(),
            items,
            ?elapsed,
            "phase complete"
        );
        self.options.progress.on_event(&ProgressEvent::PhaseCompleted {
            phase: self.phase,
            items,
            elapsed,
        });
    }
}
