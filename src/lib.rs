//! lazypool - a lazily scaling, bounded worker-thread pool.
//!
//! Tasks are created from a function plus its single argument, pushed into a
//! [`Pool`], and joined for their result. The pool spawns no threads up
//! front: workers are added one at a time while queued work remains, up to
//! the configured `max_workers`, and exit once the queue runs dry.
//!
//! # Quick start
//!
//! ```
//! use lazypool::{Pool, Task};
//!
//! let pool = Pool::new(4).unwrap();
//!
//! let tasks: Vec<Task<u64>> = (0..10)
//!     .map(|x| pool.spawn(|x: u64| x * x, x).unwrap())
//!     .collect();
//!
//! let mut results: Vec<u64> = tasks.iter().map(|t| t.join().unwrap()).collect();
//! results.sort_unstable();
//! assert_eq!(results, vec![0, 1, 4, 9, 16, 25, 36, 49, 64, 81]);
//! ```
//!
//! # Guarantees
//!
//! - Tasks are dequeued in FIFO submission order per pool.
//! - At most `max_workers` tasks run concurrently; idle workers exit.
//! - `join` blocks cooperatively and is idempotent across threads.
//! - Admission is bounded: at most [`MAX_TASKS`] outstanding tasks, at most
//!   [`MAX_THREADS`] configured workers.

#![warn(missing_docs, missing_debug_implementations)]

pub mod config;
pub mod error;
pub mod pool;
pub mod task;

pub use config::{PoolConfig, PoolConfigBuilder, MAX_TASKS, MAX_THREADS};
pub use error::{Error, Result};
pub use pool::{HasPending, Pool};
pub use task::{StillPending, Task};
