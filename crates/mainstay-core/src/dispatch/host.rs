//! Host idle-notification seam
//!
//! The scheduler stays decoupled from any concrete host SDK: when a
//! producer wants its work picked up promptly, the scheduler calls this
//! trait instead of a host function directly. The host-integration layer
//! wraps the real "cause idle routines to be called" primitive.

/// Hook the scheduler uses to nudge the host out of its busy state.
///
/// Implementations wrap the host's request-idle primitive. The contract is
/// fire-and-forget: the call may come from any thread and must be harmless
/// to invoke repeatedly, since the scheduler may fire it once per enqueued
/// task.
pub trait IdleNotifier: Send + Sync {
    /// Ask the host to run its idle routines soon.
    fn request_idle(&self);
}

/// A notifier that does nothing, for hosts that pump on their own cadence.
pub struct NoopIdleNotifier;

impl IdleNotifier for NoopIdleNotifier {
    fn request_idle(&self) {}
}
