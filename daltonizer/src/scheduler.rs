// THEORY:
// The `BatchScheduler` fans a file list out over independent workers and waits
// for all of them. It moves through four states:
//
//   Idle -> Dispatched -> Running -> Joined
//
// 1.  **Partitioning**: the list is cut into `WorkGroup`s of at most
//     `group_size` files (`ceil(N / group_size)` groups). Each group becomes one
//     blocking task on the tokio runtime; the decode/transform/encode work is
//     synchronous, so it belongs on the blocking pool and not on the async
//     executor.
// 2.  **Independence**: workers share nothing but the `ProgressCounter` and a
//     copy of the run's `CorrectionMatrices`. Each file is owned by one worker.
//     Partition order therefore affects progress timing, never output.
// 3.  **Reporting**: a lightweight async task polls the counter, sleeping between
//     reads, and forwards snapshots to a `ProgressSink` until the counter reaches
//     the file count or every worker has joined.
// 4.  **Failure isolation**: a file that fails to decode or write is recorded in
//     the `BatchReport` and its worker moves on to the next file. A worker that
//     panics marks its whole group as failed; other groups are unaffected.
//
// The state lives in a `watch` channel so another task can follow a run in
// progress through `subscribe_state`. `Dispatched` is only held between
// spawning the workers and spawning the reporter, so watchers usually see it
// collapse into `Running`.
//
// The number of groups is not capped. Very large trees create many blocking
// tasks; tokio's blocking pool bounds how many run at once.

use crate::config::{BatchConfig, DaltonizeConfig};
use crate::core_modules::deficiency::deficiency::CorrectionMatrices;
use crate::core_modules::image_job::{ImageCodec, ImageJob, JobOutcome, PngCodec};
use crate::core_modules::progress::{ProgressCounter, ProgressSink};
use crate::error::DaltonizeError;
use futures::future::join_all;
use log::{debug, info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Dispatched,
    Running,
    Joined,
}

/// One worker's share of the batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkGroup {
    pub index: usize,
    pub files: Vec<PathBuf>,
}

/// Splits `files` into consecutive groups of at most `group_size` entries.
pub fn partition(files: &[PathBuf], group_size: usize) -> Vec<WorkGroup> {
    files
        .chunks(group_size.max(1))
        .enumerate()
        .map(|(index, chunk)| WorkGroup {
            index,
            files: chunk.to_vec(),
        })
        .collect()
}

#[derive(Debug)]
pub enum FileOutcome {
    Transformed,
    Skipped,
    Failed(DaltonizeError),
}

#[derive(Debug)]
pub struct FileReport {
    pub path: PathBuf,
    pub outcome: FileOutcome,
}

/// Result of a joined batch, one entry per input file.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub groups: usize,
    pub files: Vec<FileReport>,
}

impl BatchReport {
    pub fn processed(&self) -> usize {
        self.files.len()
    }

    pub fn transformed(&self) -> usize {
        self.count(|outcome| matches!(outcome, FileOutcome::Transformed))
    }

    pub fn skipped(&self) -> usize {
        self.count(|outcome| matches!(outcome, FileOutcome::Skipped))
    }

    pub fn failed(&self) -> usize {
        self.count(|outcome| matches!(outcome, FileOutcome::Failed(_)))
    }

    pub fn failures(&self) -> impl Iterator<Item = (&PathBuf, &DaltonizeError)> {
        self.files.iter().filter_map(|report| match &report.outcome {
            FileOutcome::Failed(error) => Some((&report.path, error)),
            _ => None,
        })
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    fn count(&self, predicate: impl Fn(&FileOutcome) -> bool) -> usize {
        self.files.iter().filter(|report| predicate(&report.outcome)).count()
    }
}

pub struct BatchScheduler {
    files: Vec<PathBuf>,
    config: DaltonizeConfig,
    batch: BatchConfig,
    counter: ProgressCounter,
    codec: Arc<dyn ImageCodec>,
    state: watch::Sender<SchedulerState>,
}

impl BatchScheduler {
    pub fn new(files: Vec<PathBuf>, config: DaltonizeConfig, batch: BatchConfig) -> Self {
        Self {
            files,
            config,
            batch,
            counter: ProgressCounter::new(),
            codec: Arc::new(PngCodec),
            state: watch::Sender::new(SchedulerState::Idle),
        }
    }

    pub fn with_codec(mut self, codec: Arc<dyn ImageCodec>) -> Self {
        self.codec = codec;
        self
    }

    pub fn state(&self) -> SchedulerState {
        *self.state.borrow()
    }

    /// Receiver that sees every later state change, usable from another task
    /// while `run` is in flight.
    pub fn subscribe_state(&self) -> watch::Receiver<SchedulerState> {
        self.state.subscribe()
    }

    /// Handle to the shared counter; clones observe the same value.
    pub fn counter(&self) -> ProgressCounter {
        self.counter.clone()
    }

    pub fn total(&self) -> usize {
        self.files.len()
    }

    /// The groups `run` would dispatch.
    pub fn groups(&self) -> Vec<WorkGroup> {
        partition(&self.files, self.batch.group_size)
    }

    /// Runs the whole batch and blocks until every worker and the reporter are done.
    /// Must be called from within a tokio runtime.
    pub async fn run<S: ProgressSink>(&mut self, sink: S) -> BatchReport {
        let total = self.total();
        let matrices = self.config.matrices();
        let groups = self.groups();
        let group_count = groups.len();

        info!(
            "correcting {} files for {} at strength {} across {} workers",
            total, self.config.kind, self.config.strength, group_count
        );

        let mut group_files = Vec::with_capacity(group_count);
        let mut workers = Vec::with_capacity(group_count);
        for group in groups {
            group_files.push(group.files.clone());
            let counter = self.counter.clone();
            let codec = Arc::clone(&self.codec);
            workers.push(tokio::task::spawn_blocking(move || {
                run_group(group, &matrices, codec.as_ref(), &counter)
            }));
        }
        self.state.send_replace(SchedulerState::Dispatched);

        let (done_tx, done_rx) = watch::channel(false);
        let reporter = tokio::spawn(report_progress(
            self.counter.clone(),
            total,
            self.batch.report_interval,
            sink,
            done_rx,
        ));
        self.state.send_replace(SchedulerState::Running);

        let results = join_all(workers).await;
        let _ = done_tx.send(true);
        if let Err(e) = reporter.await {
            warn!("progress reporter stopped early: {e}");
        }

        let report = BatchReport {
            groups: group_count,
            files: fold_group_results(results, group_files),
        };
        self.state.send_replace(SchedulerState::Joined);

        info!(
            "batch finished: {} corrected, {} skipped, {} failed",
            report.transformed(),
            report.skipped(),
            report.failed()
        );
        report
    }
}

/// Flattens joined worker results in group order. A group whose task did not
/// finish reports each of its files as a `Worker` failure.
fn fold_group_results(
    results: Vec<Result<Vec<FileReport>, JoinError>>,
    group_files: Vec<Vec<PathBuf>>,
) -> Vec<FileReport> {
    let mut files = Vec::new();
    for (index, (result, paths)) in results.into_iter().zip(group_files).enumerate() {
        match result {
            Ok(reports) => files.extend(reports),
            Err(e) => {
                warn!("worker {index} did not finish: {e}");
                let reason = e.to_string();
                files.extend(paths.into_iter().map(|path| FileReport {
                    path,
                    outcome: FileOutcome::Failed(DaltonizeError::Worker {
                        group: index,
                        reason: reason.clone(),
                    }),
                }));
            }
        }
    }
    files
}

/// Worker body: one group, one file at a time, counting each file as it begins.
fn run_group(
    group: WorkGroup,
    matrices: &CorrectionMatrices,
    codec: &dyn ImageCodec,
    counter: &ProgressCounter,
) -> Vec<FileReport> {
    debug!("worker {} starting with {} files", group.index, group.files.len());
    group
        .files
        .into_iter()
        .map(|path| {
            counter.increment();
            let outcome = match ImageJob::new(&path).run_with(matrices, codec) {
                Ok(JobOutcome::Transformed { .. }) => FileOutcome::Transformed,
                Ok(JobOutcome::Skipped) => FileOutcome::Skipped,
                Err(e) => {
                    warn!("{e}");
                    FileOutcome::Failed(e)
                }
            };
            FileReport { path, outcome }
        })
        .collect()
}

async fn report_progress<S: ProgressSink>(
    counter: ProgressCounter,
    total: usize,
    interval: Duration,
    mut sink: S,
    mut done: watch::Receiver<bool>,
) {
    loop {
        let current = counter.get();
        sink.update(current, total);
        if current >= total || *done.borrow() {
            break;
        }
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            changed = done.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }
    sink.finish(counter.get(), total);
}
