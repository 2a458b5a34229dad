//! Mainstay Core
//!
//! Concurrency utility for plugins embedded in a host application that owns
//! a single privileged main thread:
//! - **Scheduler**: queue work from any thread, execute it on the host's
//!   main thread during its idle cycles (`dispatch` module)
//! - **Result bridge**: block on, poll, or time-bound the eventual result
//!   of a dispatched task
//! - **Host seam**: pluggable hook for the host's "run idle routines soon"
//!   primitive
//!
//! # Example
//!
//! ```rust,ignore
//! use mainstay_core::{IdleNotifier, TaskScheduler};
//! use std::sync::Arc;
//!
//! struct HostIdleHook;
//!
//! impl IdleNotifier for HostIdleHook {
//!     fn request_idle(&self) {
//!         // call the host's cause-idle primitive
//!     }
//! }
//!
//! let scheduler = Arc::new(TaskScheduler::new(Arc::new(HostIdleHook)));
//!
//! // Background thread: ask for work on the main thread.
//! let future = scheduler.schedule_for_result(|| 21 * 2);
//!
//! // Host idle callback (main thread): run one queued task.
//! scheduler.pump();
//!
//! assert_eq!(future.wait(), Ok(42));
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

/// Dispatch module: scheduler, result bridge, and host seam
pub mod dispatch;

pub use dispatch::{
    DispatchStats, ExecutionMode, IdleNotifier, NoopIdleNotifier, TaskError, TaskFuture,
    TaskResult, TaskScheduler,
};
