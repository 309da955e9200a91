//! Execution configuration for node graphs.
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::error::{Error, Result};

/// Configuration for evaluating a [`NodeGraph`](crate::graph::NodeGraph).
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionConfig {
    /// Worker threads used to process independent nodes. `None` uses one per core.
    pub threads: Option<usize>,
    /// Prefix for worker thread names.
    pub thread_name_prefix: String,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            threads: None,
            thread_name_prefix: "terrain-graph".into(),
        }
    }
}

impl ExecutionConfig {
    /// Creates a new [`ExecutionConfig`] with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of worker threads.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    /// Sets the worker thread name prefix.
    pub fn with_thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    /// Validates the configuration, returning an error if invalid.
    pub fn validate(&self) -> Result<()> {
        if self.threads == Some(0) {
            return Err(Error::Precondition("threads must be > 0".into()));
        }
        Ok(())
    }

    pub(crate) fn build_pool(&self) -> Result<ThreadPool> {
        self.validate()?;
        let prefix = self.thread_name_prefix.clone();
        let mut builder =
            ThreadPoolBuilder::new().thread_name(move |i| format!("{prefix}-{i}"));
        if let Some(threads) = self.threads {
            builder = builder.num_threads(threads);
        }
        Ok(builder.build()?)
    }
}
