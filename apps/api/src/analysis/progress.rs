use std::sync::atomic::{AtomicU8, Ordering};

use serde::Serialize;

/// One observable step of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressUpdate {
    pub percent_complete: u8,
    pub step_label: String,
}

type ProgressSink = Box<dyn Fn(ProgressUpdate) + Send + Sync>;

/// Purely observational progress signal. Reported percentages never go backwards,
/// even when concurrent steps report out of order.
pub struct ProgressReporter {
    last: AtomicU8,
    sink: Option<ProgressSink>,
}

impl ProgressReporter {
    pub fn new(sink: impl Fn(ProgressUpdate) + Send + Sync + 'static) -> Self {
        Self {
            last: AtomicU8::new(0),
            sink: Some(Box::new(sink)),
        }
    }

    /// Reporter without a sink. Still tracks the current percentage.
    pub fn silent() -> Self {
        Self {
            last: AtomicU8::new(0),
            sink: None,
        }
    }

    pub fn report(&self, percent: u8, step: &str) {
        let requested = percent.min(100);
        let previous = self.last.fetch_max(requested, Ordering::SeqCst);
        let percent_complete = previous.max(requested);
        if let Some(sink) = &self.sink {
            sink(ProgressUpdate {
                percent_complete,
                step_label: step.to_string(),
            });
        }
    }

    #[cfg(test)]
    pub fn current(&self) -> u8 {
        self.last.load(Ordering::SeqCst)
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::silent()
    }
}
