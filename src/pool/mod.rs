//! Admission-controlled FIFO queue drained by lazily spawned workers.
//!
//! A [`Pool`] holds a single queue of type-erased jobs behind one mutex, plus
//! the counters that gate admission and teardown. Worker threads are not
//! created up front: pushes and workers alike add one worker at a time while
//! queued work remains, capped at `max_workers` (see [`worker`]).

mod worker;

use crate::config::{PoolConfig, MAX_TASKS};
use crate::error::{Error, Result};
use crate::task::{Job, Task};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

pub(crate) struct PoolState {
    pub(crate) queue: VecDeque<Arc<dyn Job>>,
    /// Queued tasks plus tasks executing but not yet finished.
    pub(crate) pending: usize,
    pub(crate) active_workers: usize,
    pub(crate) next_worker_id: usize,
}

pub(crate) struct PoolShared {
    pub(crate) max_workers: usize,
    pub(crate) thread_name_prefix: String,
    pub(crate) stack_size: Option<usize>,
    pub(crate) state: Mutex<PoolState>,
}

/// A bounded pool of worker threads executing submitted [`Task`]s.
///
/// Workers hold their own references to the shared state, so destroying the
/// pool handle never joins or cancels a live worker; idle workers exit on
/// their own once they observe an empty queue.
pub struct Pool {
    shared: Arc<PoolShared>,
}

impl Pool {
    /// Creates a pool that will run at most `max_workers` threads.
    ///
    /// Fails with [`Error::InvalidArgument`] for zero or anything above
    /// [`MAX_THREADS`](crate::config::MAX_THREADS). No thread is spawned
    /// until the first push.
    pub fn new(max_workers: usize) -> Result<Self> {
        Self::with_config(PoolConfig {
            max_workers,
            ..PoolConfig::default()
        })
    }

    /// Creates a pool from a validated [`PoolConfig`].
    pub fn with_config(config: PoolConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            shared: Arc::new(PoolShared {
                max_workers: config.max_workers,
                thread_name_prefix: config.thread_name_prefix,
                stack_size: config.stack_size,
                state: Mutex::new(PoolState {
                    queue: VecDeque::new(),
                    pending: 0,
                    active_workers: 0,
                    next_worker_id: 0,
                }),
            }),
        })
    }

    /// Appends `task` to the tail of the queue.
    ///
    /// Fails with [`Error::TooManyTasks`] once
    /// [`MAX_TASKS`](crate::config::MAX_TASKS) tasks are outstanding, and
    /// with [`Error::TaskAlreadyPushed`] if the task was submitted before.
    /// On failure nothing is mutated. Spawns at most one worker, governed by
    /// the same policy workers use to replicate themselves, so a push never
    /// leaves queued work behind a full set of busy workers unserved.
    pub fn push<R: Send + 'static>(&self, task: &Task<R>) -> Result<()> {
        let spawn_id = {
            let mut state = self.shared.state.lock();
            if state.pending == MAX_TASKS {
                tracing::debug!("push rejected, queue at capacity");
                return Err(Error::TooManyTasks);
            }
            let job = task.as_job();
            job.mark_queued()?;
            state.queue.push_back(job);
            state.pending += 1;
            if worker::should_spawn(state.active_workers, self.shared.max_workers, state.queue.len())
            {
                state.active_workers += 1;
                let id = state.next_worker_id;
                state.next_worker_id += 1;
                Some(id)
            } else {
                None
            }
        };
        if let Some(id) = spawn_id {
            // On spawn failure the task stays queued; a later push retries.
            worker::spawn_worker(&self.shared, id)?;
        }
        Ok(())
    }

    /// Creates a task from `function` and `argument` and pushes it.
    pub fn spawn<F, A, R>(&self, function: F, argument: A) -> Result<Task<R>>
    where
        F: FnOnce(A) -> R + Send + 'static,
        A: Send + 'static,
        R: Send + 'static,
    {
        let task = Task::new(function, argument);
        self.push(&task)?;
        Ok(task)
    }

    /// Snapshot of the number of live worker threads.
    pub fn worker_count(&self) -> usize {
        self.shared.state.lock().active_workers
    }

    /// Snapshot of the number of queued or running tasks.
    pub fn pending_tasks(&self) -> usize {
        self.shared.state.lock().pending
    }

    /// Releases the pool handle.
    ///
    /// Fails while any task is queued or running, handing the pool back so
    /// the caller can drain it first. Success does not block on worker exit.
    pub fn destroy(self) -> std::result::Result<(), HasPending> {
        if self.shared.state.lock().pending != 0 {
            return Err(HasPending(self));
        }
        Ok(())
    }
}

impl fmt::Debug for Pool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.lock();
        f.debug_struct("Pool")
            .field("max_workers", &self.shared.max_workers)
            .field("active_workers", &state.active_workers)
            .field("pending", &state.pending)
            .finish()
    }
}

/// Error returned by [`Pool::destroy`] while tasks are queued or running.
///
/// Carries the pool handle back to the caller.
pub struct HasPending(pub Pool);

impl From<HasPending> for Error {
    fn from(_: HasPending) -> Self {
        Error::HasPendingTasks
    }
}

impl fmt::Debug for HasPending {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("HasPending").field(&self.0).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MAX_THREADS;

    #[test]
    fn create_validates_worker_bounds() {
        assert!(matches!(Pool::new(0), Err(Error::InvalidArgument(_))));
        assert!(matches!(
            Pool::new(MAX_THREADS + 1),
            Err(Error::InvalidArgument(_))
        ));
        assert!(Pool::new(1).is_ok());
        assert!(Pool::new(MAX_THREADS).is_ok());
    }

    #[test]
    fn fresh_pool_has_no_workers() {
        let pool = Pool::new(4).unwrap();
        assert_eq!(pool.worker_count(), 0);
        assert_eq!(pool.pending_tasks(), 0);
    }

    #[test]
    fn destroy_empty_pool_succeeds() {
        let pool = Pool::new(2).unwrap();
        assert!(pool.destroy().is_ok());
    }

    #[test]
    fn pushing_same_task_twice_fails() {
        let pool = Pool::new(2).unwrap();
        let task = Task::new(|x: i32| x, 1);
        pool.push(&task).unwrap();
        assert!(matches!(pool.push(&task), Err(Error::TaskAlreadyPushed)));
        task.join().unwrap();
    }
}
