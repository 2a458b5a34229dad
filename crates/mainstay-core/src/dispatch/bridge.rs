//! One-shot result bridge between a dispatched task and its producer
//!
//! The write side travels into the queue with the task; the read side stays
//! with the producer as a [`TaskFuture`]. The two run on different call
//! stacks entirely, so the outcome crosses as an explicit value, never by
//! unwinding.

use crate::dispatch::{TaskError, TaskResult};
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Slot contents as seen under the bridge lock
enum SlotState<T> {
    /// No outcome delivered yet (also the resting state after a take)
    Pending,

    /// Outcome delivered, not yet taken by the reader
    Ready(TaskResult<T>),
}

impl<T> SlotState<T> {
    /// Take the outcome out of a ready slot.
    fn take_ready(&mut self) -> Option<TaskResult<T>> {
        match std::mem::replace(self, SlotState::Pending) {
            SlotState::Ready(result) => Some(result),
            SlotState::Pending => None,
        }
    }
}

/// State shared by the write guard and the future
struct Slot<T> {
    state: Mutex<SlotState<T>>,
    fulfilled: Condvar,
}

impl<T> Slot<T> {
    /// Publish the outcome and wake the reader. First write wins.
    fn publish(&self, result: TaskResult<T>) {
        let mut state = self.state.lock();
        if matches!(*state, SlotState::Pending) {
            *state = SlotState::Ready(result);
            self.fulfilled.notify_all();
        }
    }
}

/// Create a connected write-guard/future pair.
pub(crate) fn bridge<T>() -> (BridgeWriter<T>, TaskFuture<T>) {
    let slot = Arc::new(Slot {
        state: Mutex::new(SlotState::Pending),
        fulfilled: Condvar::new(),
    });
    let writer = BridgeWriter {
        slot: Some(Arc::clone(&slot)),
    };
    (writer, TaskFuture { slot })
}

/// Write side of the bridge.
///
/// Fulfills the slot exactly once. Dropping the guard without fulfilling
/// (the task was discarded before it ran) delivers [`TaskError::Abandoned`]
/// so a blocked producer wakes instead of waiting forever.
pub(crate) struct BridgeWriter<T> {
    slot: Option<Arc<Slot<T>>>,
}

impl<T> BridgeWriter<T> {
    /// Deliver the task outcome to the reader.
    pub(crate) fn fulfill(mut self, result: TaskResult<T>) {
        if let Some(slot) = self.slot.take() {
            slot.publish(result);
        }
    }
}

impl<T> Drop for BridgeWriter<T> {
    fn drop(&mut self) {
        if let Some(slot) = self.slot.take() {
            slot.publish(Err(TaskError::Abandoned));
        }
    }
}

/// Producer-side handle for the eventual outcome of a dispatched task.
///
/// The slot is read-once: [`TaskFuture::wait`] consumes the handle and
/// returns the outcome. Retrieval blocks until the consumer runs the task,
/// which is unbounded if the host never goes idle. Producers that need
/// bounded latency should submit with the idle nudge enabled and use
/// [`TaskFuture::wait_timeout`].
pub struct TaskFuture<T> {
    slot: Arc<Slot<T>>,
}

impl<T> TaskFuture<T> {
    /// Whether the outcome has been delivered.
    pub fn is_ready(&self) -> bool {
        matches!(*self.slot.state.lock(), SlotState::Ready(_))
    }

    /// Block until the task has run (or been discarded) and take the outcome.
    pub fn wait(self) -> TaskResult<T> {
        let mut state = self.slot.state.lock();
        loop {
            if let Some(result) = state.take_ready() {
                return result;
            }
            self.slot.fulfilled.wait(&mut state);
        }
    }

    /// Block for at most `timeout`.
    ///
    /// Returns the outcome, or the handle back on timeout so the caller can
    /// retry later.
    pub fn wait_timeout(self, timeout: Duration) -> Result<TaskResult<T>, Self> {
        let deadline = Instant::now() + timeout;
        let mut state = self.slot.state.lock();
        loop {
            if let Some(result) = state.take_ready() {
                return Ok(result);
            }
            let now = Instant::now();
            if now >= deadline {
                drop(state);
                return Err(self);
            }
            self.slot.fulfilled.wait_for(&mut state, deadline - now);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_fulfill_then_wait() {
        let (writer, future) = bridge::<i32>();
        writer.fulfill(Ok(42));

        assert!(future.is_ready());
        assert_eq!(future.wait(), Ok(42));
    }

    #[test]
    fn test_wait_blocks_until_fulfilled() {
        let (writer, future) = bridge::<&'static str>();

        let fulfiller = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            writer.fulfill(Ok("done"));
        });

        assert_eq!(future.wait(), Ok("done"));
        fulfiller.join().unwrap();
    }

    #[test]
    fn test_error_passes_through() {
        let (writer, future) = bridge::<i32>();
        writer.fulfill(Err(TaskError::Panicked("boom".to_string())));

        assert_eq!(future.wait(), Err(TaskError::Panicked("boom".to_string())));
    }

    #[test]
    fn test_dropped_writer_delivers_abandoned() {
        let (writer, future) = bridge::<i32>();
        drop(writer);

        assert_eq!(future.wait(), Err(TaskError::Abandoned));
    }

    #[test]
    fn test_fulfill_wins_over_drop() {
        // fulfill() consumes the guard; the Drop path must not overwrite
        // the delivered value with Abandoned.
        let (writer, future) = bridge::<i32>();
        writer.fulfill(Ok(7));

        assert_eq!(future.wait(), Ok(7));
    }

    #[test]
    fn test_not_ready_before_fulfill() {
        let (writer, future) = bridge::<i32>();
        assert!(!future.is_ready());

        writer.fulfill(Ok(1));
        assert!(future.is_ready());
    }

    #[test]
    fn test_wait_timeout_returns_handle() {
        let (writer, future) = bridge::<i32>();

        let future = match future.wait_timeout(Duration::from_millis(10)) {
            Ok(result) => panic!("unexpected outcome before fulfill: {:?}", result),
            Err(future) => future,
        };

        writer.fulfill(Ok(99));
        assert_eq!(future.wait(), Ok(99));
    }

    #[test]
    fn test_wait_timeout_resolved() {
        let (writer, future) = bridge::<i32>();
        writer.fulfill(Ok(5));

        match future.wait_timeout(Duration::from_secs(1)) {
            Ok(result) => assert_eq!(result, Ok(5)),
            Err(_) => panic!("fulfilled future should not time out"),
        }
    }

    #[test]
    fn test_dropped_future_is_harmless() {
        let (writer, future) = bridge::<i32>();
        drop(future);

        // Nobody is listening; publishing must not panic or block.
        writer.fulfill(Ok(1));
    }
}
