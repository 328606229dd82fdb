// THEORY:
// Progress is the only state the workers share. `ProgressCounter` is a cloneable
// handle around one atomic integer: workers call `increment` as they begin each
// file and the reporter only ever calls `get`. A `ProgressSink` is whatever turns
// `(current, total)` into output; the console sink redraws a single line.

use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

pub const BAR_LENGTH: usize = 20;

/// Shared, monotonically increasing count of files that have begun processing.
#[derive(Debug, Clone, Default)]
pub struct ProgressCounter {
    started: Arc<AtomicUsize>,
}

impl ProgressCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value after the increment.
    pub fn increment(&self) -> usize {
        self.started.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub fn get(&self) -> usize {
        self.started.load(Ordering::Acquire)
    }
}

/// Receives progress snapshots from the batch reporter.
pub trait ProgressSink: Send + 'static {
    fn update(&mut self, current: usize, total: usize);

    fn finish(&mut self, _current: usize, _total: usize) {}
}

/// Discards every update.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentProgress;

impl ProgressSink for SilentProgress {
    fn update(&mut self, _current: usize, _total: usize) {}
}

/// Redraws `Percent: [###   ] 45% | 9/20 |` on one terminal line.
#[derive(Debug, Default)]
pub struct ConsoleProgress {
    last: Option<(usize, usize)>,
}

impl ConsoleProgress {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressSink for ConsoleProgress {
    fn update(&mut self, current: usize, total: usize) {
        if self.last == Some((current, total)) {
            return;
        }
        self.last = Some((current, total));
        let mut stdout = std::io::stdout().lock();
        // A broken stdout must not stop the batch.
        let _ = write!(stdout, "\r{}", render_bar(current, total, BAR_LENGTH));
        let _ = stdout.flush();
    }

    fn finish(&mut self, current: usize, total: usize) {
        self.update(current, total);
        let _ = writeln!(std::io::stdout());
    }
}

/// Text of one progress line. An empty batch renders as complete.
pub fn render_bar(current: usize, total: usize, bar_length: usize) -> String {
    let fraction = if total == 0 {
        1.0
    } else {
        (current as f64 / total as f64).clamp(0.0, 1.0)
    };
    let hashes = ((fraction * bar_length as f64).round_ties_even() as usize).min(bar_length);
    format!(
        "Percent: [{}{}] {}% | {}/{} |",
        "#".repeat(hashes),
        " ".repeat(bar_length - hashes),
        (fraction * 100.0).round_ties_even() as usize,
        current,
        total
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_partial_bar() {
        assert_eq!(
            render_bar(9, 20, BAR_LENGTH),
            "Percent: [#########           ] 45% | 9/20 |"
        );
    }

    #[test]
    fn renders_empty_and_full_bars() {
        assert_eq!(render_bar(0, 4, 4), "Percent: [    ] 0% | 0/4 |");
        assert_eq!(render_bar(4, 4, 4), "Percent: [####] 100% | 4/4 |");
        assert_eq!(render_bar(0, 0, 4), "Percent: [####] 100% | 0/0 |");
    }

    #[test]
    fn counter_increments_are_not_lost_across_threads() {
        let counter = ProgressCounter::new();
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let counter = counter.clone();
                std::thread::spawn(move || {
                    for _ in 0..1_000 {
                        counter.increment();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(counter.get(), 8_000);
    }

    #[test]
    fn increment_returns_new_value() {
        let counter = ProgressCounter::new();
        assert_eq!(counter.increment(), 1);
        assert_eq!(counter.increment(), 2);
        assert_eq!(counter.get(), 2);
    }
}
