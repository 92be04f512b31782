//! Progress and timing hooks wrapped around long-running phases.
//!
//! The engine never performs IO of its own; the only external call-outs are
//! `start`/`stop` notifications surrounding the transpose, defragmentation
//! and SCC phases. Callers that do not care pass [`NoopTimer`] (or `None`
//! where the hook is optional).

use std::cell::{Cell, RefCell};
use std::time::Instant;

use indicatif::{ProgressBar, ProgressStyle};

/// Instrumentation capability invoked around long phases.
///
/// Implementations are expected to tolerate unbalanced calls gracefully:
/// a `stop` without a preceding `start` must be a no-op.
pub trait PhaseTimer {
    /// Called when a phase begins, with a human-readable label.
    fn start(&self, label: &str);

    /// Called when the most recently started phase completes.
    fn stop(&self);
}

/// Hook that ignores all notifications.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTimer;

impl PhaseTimer for NoopTimer {
    fn start(&self, _label: &str) {}
    fn stop(&self) {}
}

/// Hook that displays an elapsed-time spinner for the running phase.
#[derive(Default)]
pub struct SpinnerTimer {
    bar: RefCell<Option<ProgressBar>>,
}

impl SpinnerTimer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PhaseTimer for SpinnerTimer {
    fn start(&self, label: &str) {
        let bar = ProgressBar::new_spinner();
        bar.set_style(ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap());
        bar.set_message(label.to_string());
        bar.enable_steady_tick(std::time::Duration::from_millis(100));

        // Replacing an unfinished spinner abandons it silently.
        *self.bar.borrow_mut() = Some(bar);
    }

    fn stop(&self) {
        if let Some(bar) = self.bar.borrow_mut().take() {
            bar.finish_and_clear();
        }
    }
}

/// Hook that prints the wall-clock duration of each phase on completion.
#[derive(Default)]
pub struct StopwatchTimer {
    started: Cell<Option<Instant>>,
    label: RefCell<String>,
}

impl StopwatchTimer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PhaseTimer for StopwatchTimer {
    fn start(&self, label: &str) {
        *self.label.borrow_mut() = label.to_string();
        self.started.set(Some(Instant::now()));
    }

    fn stop(&self) {
        if let Some(started) = self.started.take() {
            let duration = started.elapsed();
            println!("{} Elapsed Time: {:?} us", self.label.borrow(), duration.as_micros());
        }
    }
}

/// Starts `label` on the hook if one is present. Pairs with [`stop_phase`].
pub(crate) fn start_phase(timer: Option<&dyn PhaseTimer>, label: &str) {
    if let Some(timer) = timer {
        timer.start(label);
    }
}

/// Stops the running phase on the hook if one is present.
pub(crate) fn stop_phase(timer: Option<&dyn PhaseTimer>) {
    if let Some(timer) = timer {
        timer.stop();
    }
}

#[cfg(test)]
mod test_timer {
    use super::*;

    /// An unbalanced stop on the stopwatch must not print or panic.
    #[test]
    fn test_stopwatch_unbalanced_stop() {
        let timer = StopwatchTimer::new();
        timer.stop();
        timer.start("phase");
        timer.stop();
        timer.stop();
    }

    /// The no-op hook accepts any call sequence.
    #[test]
    fn test_noop_timer() {
        let timer = NoopTimer;
        timer.start("anything");
        timer.stop();
        timer.stop();
    }
}
