//! Parallel processing strategies

use geomoran_core::{Error, Result};
#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Processing mode for algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProcessingMode {
    /// Single-threaded processing
    Sequential,
    /// Parallel processing using all available cores
    #[default]
    Parallel,
    /// Parallel on a dedicated pool with the given number of threads
    ParallelWith(usize),
}

impl ProcessingMode {
    /// Reject a fixed pool of zero threads.
    pub fn validate(&self) -> Result<()> {
        if let ProcessingMode::ParallelWith(0) = self {
            return Err(Error::invalid_parameter(
                "threads",
                0,
                "worker pool needs at least one thread",
            ));
        }
        Ok(())
    }

    /// Mode for an optional thread count: `None` uses all cores,
    /// `Some(1)` runs sequentially.
    pub fn from_threads(threads: Option<usize>) -> Self {
        match threads {
            None => ProcessingMode::Parallel,
            Some(1) => ProcessingMode::Sequential,
            Some(n) => ProcessingMode::ParallelWith(n),
        }
    }
}

/// Strategy for parallel execution
pub trait ParallelStrategy {
    /// Map a function over indices and collect results in index order
    fn par_map<T, F>(&self, range: std::ops::Range<usize>, f: F) -> Result<Vec<T>>
    where
        T: Send,
        F: Fn(usize) -> T + Sync + Send;
}

#[cfg(feature = "parallel")]
fn build_pool(threads: usize) -> Result<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .map_err(|e| Error::Other(format!("failed to build thread pool: {e}")))
}

impl ParallelStrategy for ProcessingMode {
    fn par_map<T, F>(&self, range: std::ops::Range<usize>, f: F) -> Result<Vec<T>>
    where
        T: Send,
        F: Fn(usize) -> T + Sync + Send,
    {
        self.validate()?;
        let out = match self {
            #[cfg(feature = "parallel")]
            ProcessingMode::Parallel => range.into_par_iter().map(f).collect(),
            #[cfg(feature = "parallel")]
            ProcessingMode::ParallelWith(threads) => {
                let pool = build_pool(*threads)?;
                pool.install(|| range.into_par_iter().map(f).collect())
            }
            _ => range.map(f).collect(),
        };
        Ok(out)
    }
}
