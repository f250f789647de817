//! Worker pool used by the parallel stepper.
//!
//! A pool is either owned by the engine (built from a `ThreadPoolBuilder`
//! and shut down on `finish`) or shared with the caller (never shut down
//! here). Owned pools report each worker exit through a channel so shutdown
//! can wait for real thread termination with a deadline.

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::{debug, warn};

use crate::error::{LifeError, Result};

/// Upper bound on how long `finish` waits for owned workers to exit.
pub const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

pub struct OwnedPool {
    /// `None` once shut down.
    pool: Option<ThreadPool>,
    threads: usize,
    exits: Mutex<Receiver<usize>>,
}

pub enum WorkerPool {
    Owned(OwnedPool),
    Shared(Arc<ThreadPool>),
}

/// Default pool size: one worker per logical CPU.
pub fn default_threads() -> usize {
    num_cpus::get().max(1)
}

impl WorkerPool {
    /// Build an owned pool with `threads` workers.
    pub fn owned(threads: usize) -> Result<Self> {
        let builder = ThreadPoolBuilder::new()
            .num_threads(threads.max(1))
            .thread_name(|i| format!("bounded-life-{i}"));
        Self::adopt(builder)
    }

    /// Build an owned pool from a caller-configured builder. The engine takes
    /// ownership and shuts the pool down on `finish`.
    pub fn adopt(builder: ThreadPoolBuilder) -> Result<Self> {
        let (tx, rx) = mpsc::channel();
        let pool = builder
            .exit_handler(move |index| {
                let _ = tx.send(index);
            })
            .build()?;
        let threads = pool.current_num_threads();
        debug!(threads, "worker pool started");
        Ok(WorkerPool::Owned(OwnedPool {
            pool: Some(pool),
            threads,
            exits: Mutex::new(rx),
        }))
    }

    /// Borrow a caller-managed pool.
    pub fn shared(pool: Arc<ThreadPool>) -> Self {
        WorkerPool::Shared(pool)
    }

    #[inline]
    pub fn is_owned(&self) -> bool {
        matches!(self, WorkerPool::Owned(_))
    }

    pub fn threads(&self) -> usize {
        match self {
            WorkerPool::Owned(owned) => owned.threads,
            WorkerPool::Shared(pool) => pool.current_num_threads(),
        }
    }

    /// Whether an owned pool was already shut down.
    pub fn is_shut_down(&self) -> bool {
        matches!(self, WorkerPool::Owned(OwnedPool { pool: None, .. }))
    }

    /// Run `op` inside the pool so nested rayon work uses its workers.
    /// After shutdown `op` runs on the calling thread.
    pub fn install<R, OP>(&self, op: OP) -> R
    where
        OP: FnOnce() -> R + Send,
        R: Send,
    {
        match self {
            WorkerPool::Owned(OwnedPool { pool: Some(pool), .. }) => pool.install(op),
            WorkerPool::Owned(OwnedPool { pool: None, .. }) => op(),
            WorkerPool::Shared(pool) => pool.install(op),
        }
    }

    /// Stop an owned pool and wait up to `timeout` for every worker to exit.
    /// Shared pools are left running. Calling this again is a no-op.
    pub fn shutdown(&mut self, timeout: Duration) -> Result<()> {
        let owned = match self {
            WorkerPool::Owned(owned) => owned,
            WorkerPool::Shared(_) => return Ok(()),
        };
        let Some(pool) = owned.pool.take() else {
            return Ok(());
        };
        drop(pool);

        let deadline = Instant::now() + timeout;
        let exits = owned.exits.get_mut();
        for exited in 0..owned.threads {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match exits.recv_timeout(remaining) {
                Ok(index) => debug!(worker = index, "worker exited"),
                Err(RecvTimeoutError::Timeout) => {
                    warn!(
                        exited,
                        threads = owned.threads,
                        "worker pool did not terminate in time"
                    );
                    return Err(LifeError::ShutdownTimeout(timeout));
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(LifeError::ShutdownInterrupted);
                }
            }
        }
        debug!(threads = owned.threads, "worker pool shut down");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owned_pool_runs_work_and_shuts_down() {
        let mut pool = WorkerPool::owned(3).unwrap();
        assert!(pool.is_owned());
        assert_eq!(pool.threads(), 3);
        let name = pool.install(|| std::thread::current().name().map(str::to_owned));
        assert!(name.is_some_and(|n| n.starts_with("bounded-life-")));

        pool.shutdown(SHUTDOWN_TIMEOUT).unwrap();
        assert!(pool.is_shut_down());
        pool.shutdown(SHUTDOWN_TIMEOUT).unwrap();
        assert_eq!(pool.install(|| 7), 7);
    }

    #[test]
    fn shared_pool_is_left_running() {
        let shared = Arc::new(ThreadPoolBuilder::new().num_threads(2).build().unwrap());
        let mut pool = WorkerPool::shared(Arc::clone(&shared));
        pool.shutdown(SHUTDOWN_TIMEOUT).unwrap();
        assert!(!pool.is_shut_down());
        assert_eq!(shared.install(|| 1 + 1), 2);
    }

    #[test]
    fn busy_worker_times_out_shutdown() {
        let mut pool = WorkerPool::owned(1).unwrap();
        let (started_tx, started_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();
        if let WorkerPool::Owned(OwnedPool { pool: Some(inner), .. }) = &pool {
            inner.spawn(move || {
                started_tx.send(()).unwrap();
                let _ = release_rx.recv();
            });
        }
        started_rx.recv().unwrap();
        let err = pool.shutdown(Duration::from_millis(50)).unwrap_err();
        assert!(matches!(err, LifeError::ShutdownTimeout(_)));
        release_tx.send(()).unwrap();
    }
}
