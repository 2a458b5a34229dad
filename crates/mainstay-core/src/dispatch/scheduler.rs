//! Task scheduler bridging producer threads and the host's main thread
//!
//! Single-consumer, multi-producer: any thread may submit work, and the
//! host's main thread (the only context allowed to touch the host SDK)
//! drains one task per idle cycle through [`TaskScheduler::pump`]. The
//! queue mutex is held only for the O(1) enqueue/dequeue, never across task
//! execution, so a running task may safely schedule more work.

use crate::dispatch::bridge::{bridge, BridgeWriter};
use crate::dispatch::host::{IdleNotifier, NoopIdleNotifier};
use crate::dispatch::{TaskError, TaskFuture};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Boxed unit of work owned by the queue
type Job = Box<dyn FnOnce() + Send + 'static>;

/// How submitted work is executed
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExecutionMode {
    /// Queue tasks; the host's main thread runs one per [`TaskScheduler::pump`]
    Deferred,

    /// Run tasks synchronously on the submitting thread.
    ///
    /// Degraded mode for contexts with no host idle loop. Submission blocks
    /// for the duration of the task, and the idle notifier is never invoked.
    Immediate,
}

/// Scheduler statistics
#[derive(Debug, Clone, Default)]
pub struct DispatchStats {
    /// Total tasks accepted by the scheduler
    pub tasks_scheduled: u64,

    /// Total tasks that finished executing (panicked ones included)
    pub tasks_executed: u64,

    /// Tasks whose execution panicked
    pub tasks_panicked: u64,

    /// Tasks currently waiting in the queue
    pub queued_now: usize,
}

/// Single-consumer, multi-producer task scheduler.
///
/// Owned by the host-integration layer and handed (usually as an
/// `Arc<TaskScheduler>`) to any code that needs main-thread work done. The
/// host must be wired, outside this crate, to call [`TaskScheduler::pump`]
/// once per idle cycle.
///
/// Tasks run in FIFO order relative to their submitting thread. Tasks
/// submitted concurrently by different threads are serialized in lock
/// acquisition order; no stronger cross-thread ordering is promised.
///
/// Dropping the scheduler discards queued tasks unrun; their futures
/// resolve to [`TaskError::Abandoned`].
pub struct TaskScheduler {
    /// Pending tasks, oldest first
    queue: Mutex<VecDeque<Job>>,

    /// Hook used to nudge the host out of its busy state
    notifier: Arc<dyn IdleNotifier>,

    /// Execution mode, fixed at construction
    mode: ExecutionMode,

    /// Tasks accepted
    scheduled: AtomicU64,

    /// Tasks that finished executing
    executed: AtomicU64,

    /// Tasks that panicked while executing
    panicked: AtomicU64,
}

impl TaskScheduler {
    /// Create a deferred-mode scheduler wired to the host's idle nudge.
    pub fn new(notifier: Arc<dyn IdleNotifier>) -> Self {
        Self::with_mode(notifier, ExecutionMode::Deferred)
    }

    /// Create an immediate-mode scheduler for contexts with no idle loop.
    pub fn immediate() -> Self {
        Self::with_mode(Arc::new(NoopIdleNotifier), ExecutionMode::Immediate)
    }

    /// Create a scheduler with an explicit execution mode.
    pub fn with_mode(notifier: Arc<dyn IdleNotifier>, mode: ExecutionMode) -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            notifier,
            mode,
            scheduled: AtomicU64::new(0),
            executed: AtomicU64::new(0),
            panicked: AtomicU64::new(0),
        }
    }

    /// Submit a fire-and-forget task and nudge the host.
    ///
    /// Never blocks in deferred mode; the enqueue is O(1) under the queue
    /// lock. If the task panics when it eventually runs, the panic is
    /// contained at the pump boundary and reported on stderr.
    pub fn schedule(&self, task: impl FnOnce() + Send + 'static) {
        self.schedule_with(task, true);
    }

    /// Submit a fire-and-forget task, controlling the idle nudge.
    ///
    /// `notify_host = false` defers execution until the host next goes idle
    /// on its own. Use this from contexts where forcing idle processing is
    /// unsafe (e.g. inside another host callback).
    pub fn schedule_with(&self, task: impl FnOnce() + Send + 'static, notify_host: bool) {
        self.submit(Box::new(task), notify_host);
    }

    /// Submit a task whose value is handed back through a [`TaskFuture`].
    pub fn schedule_for_result<T, F>(&self, task: F) -> TaskFuture<T>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        self.schedule_for_result_with(task, true)
    }

    /// Submit a result-bearing task, controlling the idle nudge.
    ///
    /// Exactly one of the following reaches the future: the task's return
    /// value, [`TaskError::Panicked`] if it panics, or
    /// [`TaskError::Abandoned`] if it is discarded before running.
    pub fn schedule_for_result_with<T, F>(&self, task: F, notify_host: bool) -> TaskFuture<T>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        let (writer, future) = bridge();
        self.submit(Box::new(move || deliver(writer, task)), notify_host);
        future
    }

    /// Submit a task that runs wherever the current mode executes work.
    ///
    /// Deferred mode: queued for the main thread, idle nudge enabled.
    /// Immediate mode: runs synchronously on the calling thread and the
    /// returned future is already resolved. Failures reach the future in
    /// both modes.
    pub fn run_now_or_schedule<T, F>(&self, task: F) -> TaskFuture<T>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        self.schedule_for_result(task)
    }

    /// Run at most one queued task. Returns whether a task ran.
    ///
    /// Intended to be called by the host exactly once per idle cycle; the
    /// one-task bound keeps each idle tick short so the host stays
    /// responsive. A panicking task never propagates out of this call.
    pub fn pump(&self) -> bool {
        // Pop before running: the lock must be released while the task
        // executes so the task itself can schedule without deadlocking.
        let job = self.queue.lock().pop_front();
        match job {
            Some(job) => {
                self.run_contained(job);
                true
            }
            None => false,
        }
    }

    /// Number of tasks currently queued.
    pub fn queued_len(&self) -> usize {
        self.queue.lock().len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }

    /// The execution mode this scheduler was constructed with.
    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    /// Snapshot of the scheduler's counters.
    pub fn stats(&self) -> DispatchStats {
        DispatchStats {
            tasks_scheduled: self.scheduled.load(Ordering::Relaxed),
            tasks_executed: self.executed.load(Ordering::Relaxed),
            tasks_panicked: self.panicked.load(Ordering::Relaxed),
            queued_now: self.queued_len(),
        }
    }

    /// Route a job through the current execution mode.
    fn submit(&self, job: Job, notify_host: bool) {
        self.scheduled.fetch_add(1, Ordering::Relaxed);
        match self.mode {
            ExecutionMode::Deferred => {
                self.queue.lock().push_back(job);
                // The nudge is an external host call and runs outside the
                // queue lock.
                if notify_host {
                    self.notifier.request_idle();
                }
            }
            ExecutionMode::Immediate => self.run_contained(job),
        }
    }

    /// Execute a job with panic containment.
    fn run_contained(&self, job: Job) {
        let outcome = panic::catch_unwind(AssertUnwindSafe(job));
        self.executed.fetch_add(1, Ordering::Relaxed);
        if let Err(payload) = outcome {
            self.panicked.fetch_add(1, Ordering::Relaxed);
            eprintln!("[dispatch] task panicked: {}", panic_message(&payload));
        }
    }
}

/// Run a result-bearing task and route its outcome into the bridge.
fn deliver<T, F>(writer: BridgeWriter<T>, task: F)
where
    T: Send + 'static,
    F: FnOnce() -> T,
{
    match panic::catch_unwind(AssertUnwindSafe(task)) {
        Ok(value) => writer.fulfill(Ok(value)),
        Err(payload) => writer.fulfill(Err(TaskError::Panicked(panic_message(&payload)))),
    }
}

/// Best-effort extraction of a message from a panic payload.
fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
