//! Rayon-based parallel executor.

use super::Executor;
use rayon::prelude::*;

/// A parallel executor using rayon's global work-stealing thread pool.
///
/// To configure the number of threads, use `rayon::ThreadPoolBuilder` before
/// creating any `RayonExecutor`:
///
/// ```ignore
/// rayon::ThreadPoolBuilder::new()
///     .num_threads(4)
///     .build_global()
///     .unwrap();
///
/// let executor = RayonExecutor::new();
/// ```
#[derive(Debug, Clone)]
pub struct RayonExecutor {
    /// Cached size of rayon's global pool, reported via `parallelism()`.
    num_threads: usize,
}

impl RayonExecutor {
    pub fn new() -> Self {
        Self {
            num_threads: rayon::current_num_threads(),
        }
    }
}

impl Default for RayonExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl Executor for RayonExecutor {
    fn execute_all<T, R, F>(&self, items: Vec<T>, f: F) -> Vec<R>
    where
        T: Send,
        R: Send,
        F: Fn(T) -> R + Send + Sync,
    {
        // Indexed parallel iterators collect in input order.
        items.into_par_iter().map(f).collect()
    }

    fn parallelism(&self) -> usize {
        self.num_threads
    }

    fn name(&self) -> &'static str {
        "RayonExecutor"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_rayon_executor_keeps_input_order() {
        let executor = RayonExecutor::new();
        let items: Vec<usize> = (0..200).collect();
        let results = executor.execute_all(items, |x| x * 3);
        let expected: Vec<usize> = (0..200).map(|x| x * 3).collect();
        assert_eq!(results, expected);
    }

    #[test]
    fn test_rayon_executor_runs_every_item() {
        let executor = RayonExecutor::new();
        assert!(executor.parallelism() > 0);

        let counter = Arc::new(AtomicUsize::new(0));
        let items: Vec<usize> = (0..100).collect();
        executor.execute_all(items, |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(counter.load(Ordering::SeqCst), 100);
    }
}
