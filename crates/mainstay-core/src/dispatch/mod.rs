//! Main-thread task dispatch
//!
//! Producers on arbitrary threads enqueue closures; the host's main thread
//! drains exactly one per idle cycle through [`TaskScheduler::pump`]. Tasks
//! that need to hand a value back get a [`TaskFuture`] the producer can
//! block on, poll, or wait on with a timeout.

mod bridge;
mod host;
mod scheduler;

pub use bridge::TaskFuture;
pub use host::{IdleNotifier, NoopIdleNotifier};
pub use scheduler::{DispatchStats, ExecutionMode, TaskScheduler};

/// Errors a dispatched task can surface through its result bridge
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaskError {
    /// The task panicked while executing
    #[error("task panicked: {0}")]
    Panicked(String),

    /// The task was dropped before it ever ran
    #[error("task dropped before it ran")]
    Abandoned,
}

/// Outcome of a dispatched task
pub type TaskResult<T> = Result<T, TaskError>;
