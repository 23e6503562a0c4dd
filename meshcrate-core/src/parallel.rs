//! Fork-join parallelism for per-face and per-vertex work
//!
//! Every parallel region is a pure map from an index range to an output
//! vector; results come back in index order, so a parallel run and a
//! sequential run produce the same output. Pool configuration is passed per
//! call rather than stored globally.

use crate::error::Result;
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use serde::{Deserialize, Serialize};

/// Thread pool configuration for parallel processing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParallelConfig {
    /// Enable parallel processing (can be disabled for debugging)
    pub enabled: bool,
    /// Number of threads to use (None = rayon's global pool)
    pub num_threads: Option<usize>,
    /// Inputs shorter than this run sequentially
    pub min_parallel_len: usize,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            num_threads: None,
            min_parallel_len: 256,
        }
    }
}

impl ParallelConfig {
    /// Configuration that never spawns work onto other threads
    pub fn sequential() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Set number of threads
    pub fn with_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = Some(num_threads);
        self
    }

    /// Enable or disable parallel processing
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_min_parallel_len(mut self, len: usize) -> Self {
        self.min_parallel_len = len;
        self
    }

    fn runs_parallel(&self, len: usize) -> bool {
        self.enabled && len >= self.min_parallel_len
    }

    /// Run `op` inside a dedicated pool when `num_threads` is set
    ///
    /// The pool lives only for the duration of the call.
    pub fn install<F, R>(&self, op: F) -> Result<R>
    where
        F: FnOnce() -> R + Send,
        R: Send,
    {
        match self.num_threads {
            Some(num_threads) if self.enabled => {
                log::debug!("Building a {}-thread pool for this call", num_threads);
                let pool = ThreadPoolBuilder::new()
                    .num_threads(num_threads)
                    .thread_name(|index| format!("meshcrate-{}", index))
                    .build()?;
                Ok(pool.install(op))
            }
            _ => Ok(op()),
        }
    }

    /// Map every index in `0..len` through `f`, preserving order
    pub fn map_range<U, F>(&self, len: usize, f: F) -> Vec<U>
    where
        U: Send,
        F: Fn(usize) -> U + Sync + Send,
    {
        if !self.runs_parallel(len) {
            return (0..len).map(f).collect();
        }
        (0..len).into_par_iter().map(f).collect()
    }

    /// Parallel map over a slice, preserving order
    pub fn map<T, U, F>(&self, data: &[T], f: F) -> Vec<U>
    where
        T: Sync,
        U: Send,
        F: Fn(&T) -> U + Sync + Send,
    {
        if !self.runs_parallel(data.len()) {
            return data.iter().map(f).collect();
        }
        data.par_iter().map(f).collect()
    }
}
