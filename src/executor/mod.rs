//! Executors that run independent page sequences.
//!
//! ## Available Executors
//!
//! - [`SyncExecutor`]: Sequential execution, no threading
//! - [`RayonExecutor`]: Work-stealing thread pool (feature: `rayon-executor`)
//!
//! Every executor returns results in input order, so the document's sequence order
//! never depends on scheduling.

#[cfg(feature = "rayon-executor")]
mod rayon;

#[cfg(feature = "rayon-executor")]
pub use self::rayon::RayonExecutor;

use std::fmt::Debug;

/// Runs a batch of work items, potentially in parallel.
pub trait Executor: Send + Sync + Debug {
    /// Applies `f` to every item. Results come back in the same order as `items`.
    fn execute_all<T, R, F>(&self, items: Vec<T>, f: F) -> Vec<R>
    where
        T: Send,
        R: Send,
        F: Fn(T) -> R + Send + Sync;

    /// Returns 1 for sequential executors.
    fn parallelism(&self) -> usize;

    /// Returns a human-readable name for this executor (for logging/debugging).
    fn name(&self) -> &'static str;
}

/// Processes items one after another on the calling thread.
#[derive(Debug, Clone, Default)]
pub struct SyncExecutor;

impl SyncExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl Executor for SyncExecutor {
    fn execute_all<T, R, F>(&self, items: Vec<T>, f: F) -> Vec<R>
    where
        T: Send,
        R: Send,
        F: Fn(T) -> R + Send + Sync,
    {
        items.into_iter().map(f).collect()
    }

    fn parallelism(&self) -> usize {
        1
    }

    fn name(&self) -> &'static str {
        "SyncExecutor"
    }
}

/// A type-erased executor that wraps concrete executor implementations.
///
/// Since the `Executor` trait has generic methods, it cannot be used as a trait object
/// (`dyn Executor`). This enum holds the concrete types and delegates to them.
#[derive(Clone, Debug)]
pub enum ExecutorImpl {
    /// Sequential executor (no parallelism)
    Sync(SyncExecutor),

    /// Rayon work-stealing thread pool executor
    #[cfg(feature = "rayon-executor")]
    Rayon(RayonExecutor),
}

impl ExecutorImpl {
    /// The parallel executor when it is compiled in and requested, else sequential.
    pub fn for_parallelism(parallel: bool) -> Self {
        if parallel {
            Self::parallel()
        } else {
            ExecutorImpl::Sync(SyncExecutor::new())
        }
    }

    #[cfg(feature = "rayon-executor")]
    fn parallel() -> Self {
        ExecutorImpl::Rayon(RayonExecutor::new())
    }

    #[cfg(not(feature = "rayon-executor"))]
    fn parallel() -> Self {
        log::warn!("Parallel execution requested but the rayon executor is not compiled in");
        ExecutorImpl::Sync(SyncExecutor::new())
    }
}

impl Default for ExecutorImpl {
    fn default() -> Self {
        ExecutorImpl::Sync(SyncExecutor::new())
    }
}

impl Executor for ExecutorImpl {
    fn execute_all<T, R, F>(&self, items: Vec<T>, f: F) -> Vec<R>
    where
        T: Send,
        R: Send,
        F: Fn(T) -> R + Send + Sync,
    {
        match self {
            ExecutorImpl::Sync(exec) => exec.execute_all(items, f),
            #[cfg(feature = "rayon-executor")]
            ExecutorImpl::Rayon(exec) => exec.execute_all(items, f),
        }
    }

    fn parallelism(&self) -> usize {
        match self {
            ExecutorImpl::Sync(exec) => exec.parallelism(),
            #[cfg(feature = "rayon-executor")]
            ExecutorImpl::Rayon(exec) => exec.parallelism(),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            ExecutorImpl::Sync(exec) => exec.name(),
            #[cfg(feature = "rayon-executor")]
            ExecutorImpl::Rayon(exec) => exec.name(),
        }
    }
}
