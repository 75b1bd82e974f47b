//! Progress sink implementations.
//!
//! | Use Case | Implementation |
//! |----------|----------------|
//! | Library callers, CI | [`SilentProgressSink`] |
//! | Tests | [`RecordingProgressSink`] |
//! | CLI | [`BarProgressSink`] |

use super::traits::ProgressSink;
use super::{ProgressConfig, TEMPLATE_CHUNKS};
use indicatif::{ProgressBar, ProgressStyle};
use parking_lot::Mutex;
use std::sync::Arc;

/// No-op sink.
#[derive(Clone, Copy, Debug, Default)]
pub struct SilentProgressSink;

impl ProgressSink for SilentProgressSink {
    #[inline]
    fn report(&self, _stage: &str, _current: usize, _total: usize) {}

    #[inline]
    fn start_stage(&self, _name: &str) {}

    #[inline]
    fn complete_stage(&self, _name: &str) {}

    #[inline]
    fn warn(&self, _message: &str) {}
}

/// Progress bar on stderr, one bar per stage.
///
/// Hidden bars are used when progress is disabled (quiet mode, non-TTY), so
/// callers never branch on visibility. Warnings are routed through the `log`
/// facade, suspended around the bar so they do not tear it.
pub struct BarProgressSink {
    config: ProgressConfig,
    bar: Mutex<Option<ProgressBar>>,
}

impl BarProgressSink {
    pub fn new(config: ProgressConfig) -> Self {
        Self {
            config,
            bar: Mutex::new(None),
        }
    }

    fn create_bar(&self, name: &str) -> ProgressBar {
        if !self.config.should_show_progress() {
            return ProgressBar::hidden();
        }

        let style = ProgressStyle::default_bar()
            .template(TEMPLATE_CHUNKS)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓▒░  ");
        let bar = ProgressBar::new(0).with_style(style);
        bar.set_message(name.to_string());
        bar
    }
}

impl ProgressSink for BarProgressSink {
    fn report(&self, _stage: &str, current: usize, total: usize) {
        if let Some(bar) = self.bar.lock().as_ref() {
            bar.set_length(total as u64);
            bar.set_position(current.min(total) as u64);
        }
    }

    fn start_stage(&self, name: &str) {
        log::debug!("Starting stage: {name}");
        let bar = self.create_bar(name);
        if let Some(previous) = self.bar.lock().replace(bar) {
            previous.finish_and_clear();
        }
    }

    fn complete_stage(&self, name: &str) {
        if let Some(bar) = self.bar.lock().take() {
            bar.finish_and_clear();
        }
        log::debug!("Completed stage: {name}");
    }

    fn warn(&self, message: &str) {
        match self.bar.lock().as_ref() {
            Some(bar) => bar.suspend(|| log::warn!("{message}")),
            None => log::warn!("{message}"),
        }
    }
}

/// Progress event recorded by [`RecordingProgressSink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    Report {
        stage: String,
        current: usize,
        total: usize,
    },
    StartStage {
        name: String,
    },
    CompleteStage {
        name: String,
    },
    Warn {
        message: String,
    },
}

/// Captures events so tests can assert on what a run reported.
#[derive(Clone, Debug, Default)]
pub struct RecordingProgressSink {
    events: Arc<Mutex<Vec<ProgressEvent>>>,
}

impl RecordingProgressSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().clone()
    }

    /// Names of started stages, in order.
    pub fn stages(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ProgressEvent::StartStage { name } => Some(name),
                _ => None,
            })
            .collect()
    }

    pub fn completed_stages(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ProgressEvent::CompleteStage { name } => Some(name),
                _ => None,
            })
            .collect()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ProgressEvent::Warn { message } => Some(message),
                _ => None,
            })
            .collect()
    }

    /// `(current, total)` pairs reported for one stage.
    pub fn reports(&self, stage: &str) -> Vec<(usize, usize)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ProgressEvent::Report {
                    stage: s,
                    current,
                    total,
                } if s == stage => Some((current, total)),
                _ => None,
            })
            .collect()
    }
}

impl ProgressSink for RecordingProgressSink {
    fn report(&self, stage: &str, current: usize, total: usize) {
        self.events.lock().push(ProgressEvent::Report {
            stage: stage.to_string(),
            current,
            total,
        });
    }

    fn start_stage(&self, name: &str) {
        self.events.lock().push(ProgressEvent::StartStage {
            name: name.to_string(),
        });
    }

    fn complete_stage(&self, name: &str) {
        self.events.lock().push(ProgressEvent::CompleteStage {
            name: name.to_string(),
        });
    }

    fn warn(&self, message: &str) {
        self.events.lock().push(ProgressEvent::Warn {
            message: message.to_string(),
        });
    }
}
