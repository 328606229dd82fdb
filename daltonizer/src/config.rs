use std::time::Duration;

pub use crate::core_modules::deficiency::deficiency::{DaltonizeConfig, Deficiency, Strength};

/// Files handed to a single worker.
pub const DEFAULT_GROUP_SIZE: usize = 20;
/// Pause between two reads of the progress counter.
pub const DEFAULT_REPORT_INTERVAL: Duration = Duration::from_millis(50);

/// Tunables for how a batch is split up and reported, independent of the color math.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Maximum number of files per worker group. Values below 1 are treated as 1.
    pub group_size: usize,
    /// How long the reporter sleeps between counter polls.
    pub report_interval: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            group_size: DEFAULT_GROUP_SIZE,
            report_interval: DEFAULT_REPORT_INTERVAL,
        }
    }
}

impl BatchConfig {
    pub fn with_group_size(mut self, group_size: usize) -> Self {
        self.group_size = group_size;
        self
    }

    pub fn with_report_interval(mut self, report_interval: Duration) -> Self {
        self.report_interval = report_interval;
        self
    }
}
