//! Job progress reporting
//!
//! Defines the observer trait the pipeline reports to.

use std::fmt;
use tracing::debug;

/// Pipeline phase a progress update belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobPhase {
    Slice,
    Prepare,
    Pack,
    Render,
}

impl fmt::Display for JobPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Slice => write!(f, "slice"),
            Self::Prepare => write!(f, "prepare"),
            Self::Pack => write!(f, "pack"),
            Self::Render => write!(f, "render"),
        }
    }
}

/// Listener trait for job progress
///
/// Implement this trait to receive progress and completion notifications.
/// Fractions are job-global and never decrease within a run.
pub trait JobObserver: Send + Sync {
    /// Called as work advances
    fn on_update(&self, _fraction: f64, _phase: JobPhase, _extra: Option<&str>) {}

    /// Called once when the job ends, with the error message on failure
    fn on_complete(&self, _error: Option<&str>) {}
}

/// Observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl JobObserver for NoopObserver {}

/// Observer that forwards updates to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl JobObserver for TracingObserver {
    fn on_update(&self, fraction: f64, phase: JobPhase, extra: Option<&str>) {
        match extra {
            Some(extra) => debug!("{} {:.1}% ({})", phase, fraction * 100.0, extra),
            None => debug!("{} {:.1}%", phase, fraction * 100.0),
        }
    }

    fn on_complete(&self, error: Option<&str>) {
        match error {
            Some(error) => tracing::error!("job failed: {}", error),
            None => tracing::info!("job complete"),
        }
    }
}

/// Maps a phase-local fraction onto a slice of the job-global range.
pub struct PhaseProgress<'a> {
    observer: &'a dyn JobObserver,
    phase: JobPhase,
    start: f64,
    span: f64,
    last: f64,
}

impl<'a> PhaseProgress<'a> {
    /// Map this phase onto `[start, start + span]` of the job.
    pub fn new(observer: &'a dyn JobObserver, phase: JobPhase, start: f64, span: f64) -> Self {
        Self {
            observer,
            phase,
            start,
            span,
            last: start,
        }
    }

    /// Report `local` in `[0, 1]`; values that would move backwards are clamped.
    pub fn report(&mut self, local: f64, extra: Option<&str>) {
        let global = (self.start + self.span * local.clamp(0.0, 1.0)).max(self.last);
        self.last = global;
        self.observer.on_update(global, self.phase, extra);
    }
}
