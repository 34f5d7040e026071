//! Dedicated rayon pool for pairwise divergences, bandwidth search and bootstrap.
//!
//! Threads get an 8 MB stack since user-supplied growth models are evaluated
//! inside quadrature inside rayon jobs. `KULGAP_THREADS` caps the thread
//! count; unset or unparseable means one thread per logical CPU.

#[cfg(feature = "parallel")]
use std::sync::OnceLock;

#[cfg(feature = "parallel")]
use rayon::ThreadPool;

#[cfg(feature = "parallel")]
const STACK_SIZE: usize = 8 * 1024 * 1024;

#[cfg(feature = "parallel")]
static POOL: OnceLock<Option<ThreadPool>> = OnceLock::new();

#[cfg(feature = "parallel")]
fn configured_threads() -> Option<usize> {
    std::env::var("KULGAP_THREADS")
        .ok()?
        .parse()
        .ok()
        .filter(|&n: &usize| n > 0)
}

/// The crate's pool, built on first use.
///
/// `None` if the pool could not be built; callers then run on rayon's
/// global pool.
#[cfg(feature = "parallel")]
fn pool() -> Option<&'static ThreadPool> {
    POOL.get_or_init(|| {
        let mut builder = rayon::ThreadPoolBuilder::new()
            .stack_size(STACK_SIZE)
            .thread_name(|i| format!("kulgap-{i}"));
        if let Some(threads) = configured_threads() {
            builder = builder.num_threads(threads);
        }
        match builder.build() {
            Ok(pool) => {
                tracing::debug!(threads = pool.current_num_threads(), "thread pool ready");
                Some(pool)
            }
            Err(e) => {
                tracing::warn!(error = %e, "could not build thread pool, using rayon's global pool");
                None
            }
        }
    })
    .as_ref()
}

/// Run `op` inside the crate's pool.
#[cfg(feature = "parallel")]
pub fn install<OP, R>(op: OP) -> R
where
    OP: FnOnce() -> R + Send,
    R: Send,
{
    match pool() {
        Some(pool) => pool.install(op),
        None => op(),
    }
}

/// Run `op` on the current thread.
#[cfg(not(feature = "parallel"))]
pub fn install<OP, R>(op: OP) -> R
where
    OP: FnOnce() -> R,
{
    op()
}

#[cfg(all(test, feature = "parallel"))]
mod tests {
    use super::*;
    use rayon::prelude::*;

    #[test]
    fn install_runs_parallel_work() {
        let total: u64 = install(|| (1..=1000u64).into_par_iter().sum());
        assert_eq!(total, 500_500);
    }

    #[test]
    fn pool_is_shared() {
        let a = pool().map(|p| p as *const ThreadPool);
        let b = pool().map(|p| p as *const ThreadPool);
        assert_eq!(a, b);
    }
}
