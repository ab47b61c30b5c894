//! Error reporting channel
//!
//! Per-asset and per-entry failures are reported exactly once, at the stage
//! where they happen, through an explicit [`Reporter`]. The host decides
//! whether any of them is fatal.

use parking_lot::Mutex;
use std::fmt;

use crate::error::{ErrorKind, ImageminError};

/// Pipeline stage an error originated from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Read,
    Transform,
    Write,
    Scan,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Read => "read",
            Stage::Transform => "transform",
            Stage::Write => "write",
            Stage::Scan => "scan",
        })
    }
}

/// Where a reported error happened
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportContext {
    pub stage: Stage,
    /// Source path, output path or glob pattern being processed
    pub subject: String,
}

impl ReportContext {
    pub fn new(stage: Stage, subject: impl Into<String>) -> Self {
        Self {
            stage,
            subject: subject.into(),
        }
    }
}

/// Sink for per-asset failures
pub trait Reporter: Send + Sync + fmt::Debug {
    fn report(&self, error: &ImageminError, context: &ReportContext);
}

/// Default reporter: logs every failure with `tracing::error!`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn report(&self, error: &ImageminError, context: &ReportContext) {
        tracing::error!(
            stage = %context.stage,
            subject = %context.subject,
            kind = %error.kind(),
            "imagemin: {}",
            error
        );
    }
}

/// One failure captured by [`CollectingReporter`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportedError {
    pub kind: ErrorKind,
    pub stage: Stage,
    pub subject: String,
    pub message: String,
}

/// Keeps every reported failure for later inspection.
#[derive(Debug, Default)]
pub struct CollectingReporter {
    errors: Mutex<Vec<ReportedError>>,
}

impl CollectingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn errors(&self) -> Vec<ReportedError> {
        self.errors.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.errors.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.lock().is_empty()
    }

    pub fn clear(&self) {
        self.errors.lock().clear();
    }
}

impl Reporter for CollectingReporter {
    fn report(&self, error: &ImageminError, context: &ReportContext) {
        self.errors.lock().push(ReportedError {
            kind: error.kind(),
            stage: context.stage,
            subject: context.subject.clone(),
            message: error.to_string(),
        });
    }
}
