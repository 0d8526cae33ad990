//! Task handles and lifecycle tracking.
//!
//! A [`Task`] pairs a user function with its single argument and tracks the
//! unit of work through `Created -> Queued -> Running -> Finished`. The state
//! never regresses. Completion is signaled through a per-task mutex and
//! condition variable, so [`Task::join`] blocks without spinning and is safe
//! to call from any number of threads once the task has been pushed.

use crate::error::{Error, Result};
use parking_lot::{Condvar, Mutex};
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};

type TaskFn<R> = Box<dyn FnOnce() -> R + Send>;

enum TaskState<R> {
    Created(TaskFn<R>),
    Queued(TaskFn<R>),
    Running,
    Finished(R),
    Panicked(String),
}

impl<R> TaskState<R> {
    fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Finished(_) | TaskState::Panicked(_))
    }

    fn name(&self) -> &'static str {
        match self {
            TaskState::Created(_) => "created",
            TaskState::Queued(_) => "queued",
            TaskState::Running => "running",
            TaskState::Finished(_) => "finished",
            TaskState::Panicked(_) => "panicked",
        }
    }
}

pub(crate) struct TaskInner<R> {
    state: Mutex<TaskState<R>>,
    done: Condvar,
}

/// Type-erased view of a task held by a pool's queue.
pub(crate) trait Job: Send + Sync {
    /// `Created -> Queued`; fails if the task was pushed before.
    fn mark_queued(&self) -> Result<()>;

    /// Executes the job to completion. `settle` runs after the user function
    /// returns but before the result is published and joiners are woken,
    /// letting the pool retire the task from its pending count first.
    fn run(&self, settle: &dyn Fn());
}

impl<R: Send> Job for TaskInner<R> {
    fn mark_queued(&self) -> Result<()> {
        let mut state = self.state.lock();
        match std::mem::replace(&mut *state, TaskState::Running) {
            TaskState::Created(f) => {
                *state = TaskState::Queued(f);
                Ok(())
            }
            other => {
                *state = other;
                Err(Error::TaskAlreadyPushed)
            }
        }
    }

    fn run(&self, settle: &dyn Fn()) {
        let f = {
            let mut state = self.state.lock();
            match std::mem::replace(&mut *state, TaskState::Running) {
                TaskState::Queued(f) => f,
                // Queue entries are always `Queued`; keep whatever was there.
                other => {
                    *state = other;
                    settle();
                    return;
                }
            }
        };

        // The task lock is not held while the user function runs.
        let outcome = catch_unwind(AssertUnwindSafe(|| f()));
        settle();

        let mut state = self.state.lock();
        *state = match outcome {
            Ok(value) => TaskState::Finished(value),
            Err(payload) => {
                let msg = panic_message(payload);
                tracing::error!(panic = %msg, "task panicked");
                TaskState::Panicked(msg)
            }
        };
        self.done.notify_all();
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// A unit of work submitted to a [`Pool`](crate::pool::Pool).
///
/// Created with a function and its argument, pushed into a pool, then joined
/// for the result. The handle is the caller's side; the pool keeps its own
/// reference to the work until execution completes.
pub struct Task<R> {
    inner: Arc<TaskInner<R>>,
}

impl<R: Send + 'static> Task<R> {
    /// Creates a task from `function` and its single `argument`.
    ///
    /// Always succeeds; the task does nothing until pushed into a pool.
    pub fn new<F, A>(function: F, argument: A) -> Self
    where
        F: FnOnce(A) -> R + Send + 'static,
        A: Send + 'static,
    {
        Task {
            inner: Arc::new(TaskInner {
                state: Mutex::new(TaskState::Created(Box::new(move || function(argument)))),
                done: Condvar::new(),
            }),
        }
    }

    /// Blocks until the task finishes and returns its result.
    ///
    /// Fails immediately with [`Error::TaskNotPushed`] if the task was never
    /// submitted to a pool, since nothing would ever complete it. May be
    /// called from multiple threads; every caller observes the identical
    /// result. A panic inside the task function surfaces as
    /// [`Error::TaskPanicked`].
    pub fn join(&self) -> Result<R>
    where
        R: Clone,
    {
        let mut state = self.inner.state.lock();
        if matches!(*state, TaskState::Created(_)) {
            return Err(Error::TaskNotPushed);
        }
        loop {
            match &*state {
                TaskState::Finished(value) => return Ok(value.clone()),
                TaskState::Panicked(msg) => return Err(Error::TaskPanicked(msg.clone())),
                _ => self.inner.done.wait(&mut state),
            }
        }
    }

    /// Bounded-wait variant of [`join`](Task::join).
    ///
    /// Returns [`Error::Timeout`] if the task has not finished within
    /// `timeout`. The task's state is unaffected; a later `join` still works.
    pub fn join_timeout(&self, timeout: Duration) -> Result<R>
    where
        R: Clone,
    {
        let deadline = Instant::now() + timeout;
        let mut state = self.inner.state.lock();
        if matches!(*state, TaskState::Created(_)) {
            return Err(Error::TaskNotPushed);
        }
        loop {
            match &*state {
                TaskState::Finished(value) => return Ok(value.clone()),
                TaskState::Panicked(msg) => return Err(Error::TaskPanicked(msg.clone())),
                _ => {
                    if self.inner.done.wait_until(&mut state, deadline).timed_out() {
                        // Completion may have raced the deadline.
                        return match &*state {
                            TaskState::Finished(value) => Ok(value.clone()),
                            TaskState::Panicked(msg) => Err(Error::TaskPanicked(msg.clone())),
                            _ => Err(Error::Timeout),
                        };
                    }
                }
            }
        }
    }

    pub(crate) fn as_job(&self) -> Arc<dyn Job> {
        self.inner.clone()
    }
}

impl<R> Task<R> {
    /// True while a worker is executing the task's function.
    pub fn is_running(&self) -> bool {
        matches!(*self.inner.state.lock(), TaskState::Running)
    }

    /// True once the task has a result (or panicked).
    pub fn is_finished(&self) -> bool {
        self.inner.state.lock().is_terminal()
    }

    /// Releases the task handle.
    ///
    /// Fails while the task is queued or running, handing the handle back so
    /// the caller can `join` and retry. Succeeds for never-pushed and
    /// finished tasks.
    pub fn destroy(self) -> std::result::Result<(), StillPending<R>> {
        let in_pool = matches!(
            *self.inner.state.lock(),
            TaskState::Queued(_) | TaskState::Running
        );
        if in_pool {
            Err(StillPending(self))
        } else {
            Ok(())
        }
    }

    /// Drops the handle without waiting for completion.
    ///
    /// Valid in any state: the pool keeps its own reference, so a queued or
    /// running task still executes and its result is discarded once done.
    pub fn detach(self) {
        drop(self);
    }

    fn state_name(&self) -> &'static str {
        self.inner.state.lock().name()
    }
}

impl<R> fmt::Debug for Task<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("state", &self.state_name())
            .finish()
    }
}

/// Error returned by [`Task::destroy`] while the task is owned by a pool.
///
/// Carries the task handle back to the caller.
pub struct StillPending<R>(pub Task<R>);

impl<R> From<StillPending<R>> for Error {
    fn from(_: StillPending<R>) -> Self {
        Error::TaskStillQueued
    }
}

impl<R> fmt::Debug for StillPending<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("StillPending").field(&self.0).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_task_is_neither_running_nor_finished() {
        let task = Task::new(|x: i32| x + 1, 1);
        assert!(!task.is_running());
        assert!(!task.is_finished());
        assert_eq!(task.state_name(), "created");
    }

    #[test]
    fn join_before_push_fails() {
        let task = Task::new(|x: i32| x, 7);
        assert!(matches!(task.join(), Err(Error::TaskNotPushed)));
        assert!(matches!(
            task.join_timeout(Duration::from_millis(1)),
            Err(Error::TaskNotPushed)
        ));
    }

    #[test]
    fn destroy_before_push_succeeds() {
        let task = Task::new(|x: i32| x, 7);
        assert!(task.destroy().is_ok());
    }

    #[test]
    fn run_publishes_result_and_wakes_joiners() {
        let task = Task::new(|x: u64| x * x, 9);
        let job = task.as_job();
        job.mark_queued().unwrap();
        job.run(&|| {});
        assert!(task.is_finished());
        assert_eq!(task.join().unwrap(), 81);
        // join is idempotent
        assert_eq!(task.join().unwrap(), 81);
    }

    #[test]
    fn double_mark_queued_fails() {
        let task = Task::new(|x: i32| x, 0);
        let job = task.as_job();
        job.mark_queued().unwrap();
        assert!(matches!(job.mark_queued(), Err(Error::TaskAlreadyPushed)));
    }

    #[test]
    fn panic_is_captured_as_result() {
        let task: Task<()> = Task::new(|_: ()| panic!("boom"), ());
        let job = task.as_job();
        job.mark_queued().unwrap();
        job.run(&|| {});
        assert!(task.is_finished());
        match task.join() {
            Err(Error::TaskPanicked(msg)) => assert_eq!(msg, "boom"),
            other => panic!("unexpected join outcome: {:?}", other.err()),
        }
    }

    #[test]
    fn settle_runs_before_publication() {
        use std::sync::atomic::{AtomicBool, Ordering};

        let task = Task::new(|x: i32| x, 5);
        let job = task.as_job();
        job.mark_queued().unwrap();

        let settled = AtomicBool::new(false);
        job.run(&|| settled.store(true, Ordering::SeqCst));
        assert!(settled.load(Ordering::SeqCst));
        assert!(task.is_finished());
    }
}
