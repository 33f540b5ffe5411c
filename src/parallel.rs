//! Parallel driver.
//!
//! The worker pool is an injected [`Executor`], defaulting to
//! [`RayonExecutor`] — a `rayon`-backed
//! implementation sized to [`crate::config::real_cores`] — so a caller can
//! substitute a different pool (a single-threaded one for determinism in
//! tests, say) without changing any family kernel's call site.

use crate::error::{Error, Result};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// A capability record with one method: step-strided parallel-for over
/// `[0, len)`.
pub trait Executor: Send + Sync {
    /// Calls `f(i)` once per `i` in `(0..len).step_by(step)`, across worker
    /// threads, then blocks until every call returns. `f` must not write
    /// overlapping output ranges across distinct `i` (the family kernels
    /// guarantee this by construction). If `f` panics for some `i`, every
    /// other dispatched `i` still runs to completion and the first captured
    /// panic payload is resumed after the join.
    fn parallel_for(&self, len: usize, step: usize, f: &(dyn Fn(usize) + Send + Sync)) -> Result<()>;

    /// As [`Executor::parallel_for`], plus `progress` is invoked once per
    /// completed chunk with the running completed-chunk count. Invocations
    /// may interleave and are not ordered.
    fn parallel_for_with_progress(
        &self,
        len: usize,
        step: usize,
        f: &(dyn Fn(usize) + Send + Sync),
        progress: &(dyn Fn(usize) + Send + Sync),
    ) -> Result<()> {
        let completed = AtomicUsize::new(0);
        self.parallel_for(len, step, &|i| {
            f(i);
            let n = completed.fetch_add(1, Ordering::Relaxed) + 1;
            progress(n);
        })
    }
}

/// Default executor: a dedicated `rayon` thread pool sized to
/// [`crate::config::real_cores`] unless overridden.
pub struct RayonExecutor {
    pool: rayon::ThreadPool,
}

impl RayonExecutor {
    pub fn new(threads: usize) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads.max(1))
            .build()
            .map_err(|_| Error::invalid("parallel_for", "failed to build thread pool"))?;
        Ok(RayonExecutor { pool })
    }

    pub fn with_default_threads() -> Result<Self> {
        Self::new(crate::config::real_cores())
    }
}

impl Executor for RayonExecutor {
    fn parallel_for(&self, len: usize, step: usize, f: &(dyn Fn(usize) + Send + Sync)) -> Result<()> {
        if step == 0 {
            return Err(Error::invalid("parallel_for", "step must be >= 1"));
        }
        let indices: Vec<usize> = (0..len).step_by(step).collect();
        let first_panic: Mutex<Option<Box<dyn std::any::Any + Send>>> = Mutex::new(None);

        self.pool.install(|| {
            use rayon::prelude::*;
            indices.par_iter().for_each(|&i| {
                let result = catch_unwind(AssertUnwindSafe(|| f(i)));
                if let Err(payload) = result {
                    let mut slot = first_panic.lock().unwrap();
                    if slot.is_none() {
                        *slot = Some(payload);
                    }
                }
            });
        });

        if let Some(payload) = first_panic.into_inner().unwrap() {
            std::panic::resume_unwind(payload);
        }
        Ok(())
    }
}

/// Runs `f` on the calling thread for every stepped index, in order. Used
/// for `threads = 1` and for the edge/scalar fallback paths, where spinning
/// up a pool would only add overhead.
pub struct SequentialExecutor;

impl Executor for SequentialExecutor {
    fn parallel_for(&self, len: usize, step: usize, f: &(dyn Fn(usize) + Send + Sync)) -> Result<()> {
        if step == 0 {
            return Err(Error::invalid("parallel_for", "step must be >= 1"));
        }
        for i in (0..len).step_by(step) {
            f(i);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicI64;

    #[test]
    fn rejects_zero_step() {
        let exec = SequentialExecutor;
        let r = exec.parallel_for(10, 0, &|_| {});
        assert!(matches!(r, Err(Error::InvalidArgument { .. })));
    }

    #[test]
    fn visits_every_stepped_index() {
        let exec = RayonExecutor::new(2).unwrap();
        let sum = AtomicI64::new(0);
        exec.parallel_for(10, 2, &|i| {
            sum.fetch_add(i as i64, Ordering::Relaxed);
        })
        .unwrap();
        assert_eq!(sum.load(Ordering::Relaxed), 0 + 2 + 4 + 6 + 8);
    }

    #[test]
    fn progress_counts_every_chunk() {
        let exec = RayonExecutor::new(2).unwrap();
        let count = AtomicUsize::new(0);
        exec.parallel_for_with_progress(8, 2, &|_| {}, &|_n| {
            count.fetch_add(1, Ordering::Relaxed);
        })
        .unwrap();
        assert_eq!(count.load(Ordering::Relaxed), 4);
    }

    #[test]
    #[should_panic]
    fn first_panic_resumed_after_join() {
        let exec = RayonExecutor::new(4).unwrap();
        exec.parallel_for(8, 1, &|i| {
            if i == 3 {
                panic!("boom");
            }
        })
        .unwrap();
    }
}
