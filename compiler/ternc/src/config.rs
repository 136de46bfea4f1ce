//! Batch configuration.

use tern_demangle::DemangleConfig;
use tern_layout::TargetConfig;

/// Settings for one [`BatchDriver`](crate::BatchDriver) run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchConfig {
    /// Worker threads; `0` lets rayon pick one per core.
    pub num_threads: usize,
    /// Platform the library was built for.
    pub target: TargetConfig,
    /// Limits applied to every symbol.
    pub demangle: DemangleConfig,
}

impl Default for BatchConfig {
    fn default() -> Self {
        BatchConfig {
            num_threads: 0,
            target: TargetConfig::host_64(),
            demangle: DemangleConfig::default(),
        }
    }
}

impl BatchConfig {
    /// Run every symbol on the calling thread's pool with one worker.
    pub fn single_threaded() -> Self {
        Self::with_threads(1)
    }

    pub fn with_threads(num_threads: usize) -> Self {
        BatchConfig {
            num_threads,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn target(mut self, target: TargetConfig) -> Self {
        self.target = target;
        self
    }
}
