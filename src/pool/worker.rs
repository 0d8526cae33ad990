// worker loop and scaling policy

use super::PoolShared;
use crate::error::{Error, Result};
use std::sync::Arc;
use std::thread;

/// Scaling decision, taken under the pool lock right after a pop: add one
/// worker only while queued work remains and capacity is left. Checking the
/// depth after the pop avoids spawn/exit churn where a fresh worker would
/// find the queue already empty.
pub(crate) fn should_spawn(active: usize, max: usize, queue_depth: usize) -> bool {
    queue_depth > 0 && active < max
}

/// Spawns one worker thread. The caller must already have incremented
/// `active_workers` under the lock; on spawn failure the count is rolled
/// back here.
pub(crate) fn spawn_worker(shared: &Arc<PoolShared>, id: usize) -> Result<()> {
    let name = format!("{}-{}", shared.thread_name_prefix, id);
    let mut builder = thread::Builder::new().name(name);
    if let Some(stack_size) = shared.stack_size {
        builder = builder.stack_size(stack_size);
    }

    let pool = Arc::clone(shared);
    match builder.spawn(move || worker_loop(pool)) {
        Ok(_) => Ok(()),
        Err(e) => {
            shared.state.lock().active_workers -= 1;
            tracing::error!(worker = id, error = %e, "failed to spawn worker");
            Err(Error::Io(e))
        }
    }
}

// One iteration: pop under the lock, maybe replicate, execute outside the
// lock, retire the task from the pending count. Exit when the queue is empty.
fn worker_loop(shared: Arc<PoolShared>) {
    tracing::debug!(worker = %thread_name(), "worker started");

    loop {
        let (job, replicate) = {
            let mut state = shared.state.lock();
            match state.queue.pop_front() {
                Some(job) => {
                    let replicate =
                        if should_spawn(state.active_workers, shared.max_workers, state.queue.len())
                        {
                            state.active_workers += 1;
                            let id = state.next_worker_id;
                            state.next_worker_id += 1;
                            Some(id)
                        } else {
                            None
                        };
                    (job, replicate)
                }
                None => {
                    state.active_workers -= 1;
                    tracing::debug!(
                        worker = %thread_name(),
                        remaining = state.active_workers,
                        "worker exiting on empty queue"
                    );
                    return;
                }
            }
        };

        if let Some(id) = replicate {
            // Thread creation happens outside the critical section; the
            // failure path already rolled the worker count back.
            let _ = spawn_worker(&shared, id);
        }

        job.run(&|| {
            shared.state.lock().pending -= 1;
        });
    }
}

fn thread_name() -> String {
    thread::current().name().unwrap_or("unnamed").to_string()
}
