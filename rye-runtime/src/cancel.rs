//! A cooperative cancel signal threaded through a thread's loop (spec
//! §4.H "Cancellation"). The orchestrator holds the [`CancelSource`];
//! the runtime loop polls the [`CancelToken`] between suspension
//! points.

use tokio::sync::watch;

/// The orchestrator's handle to request cancellation.
#[derive(Clone)]
pub struct CancelSource(watch::Sender<bool>);

impl CancelSource {
    /// Signal cancellation to every clone of the paired [`CancelToken`].
    pub fn cancel(&self) {
        let _ = self.0.send(true);
    }
}

/// The runtime loop's handle to observe cancellation.
#[derive(Clone)]
pub struct CancelToken(watch::Receiver<bool>);

impl CancelToken {
    /// `true` once [`CancelSource::cancel`] has been called.
    pub fn is_cancelled(&self) -> bool {
        *self.0.borrow()
    }
}

/// Build a fresh, uncancelled source/token pair.
pub fn channel() -> (CancelSource, CancelToken) {
    let (tx, rx) = watch::channel(false);
    (CancelSource(tx), CancelToken(rx))
}

/// The orchestrator's handle to request a graceful handoff
/// (spec §4.I `handoff_thread`): suspend the loop at its next
/// suspension point instead of tearing it down.
#[derive(Clone)]
pub struct HandoffSource(watch::Sender<Option<String>>);

impl HandoffSource {
    /// Request a handoff, carrying the message to inject once the loop
    /// suspends.
    pub fn request(&self, message: impl Into<String>) {
        let _ = self.0.send(Some(message.into()));
    }
}

/// The runtime loop's handle to observe a requested handoff.
#[derive(Clone)]
pub struct HandoffToken(watch::Receiver<Option<String>>);

impl HandoffToken {
    /// The pending handoff message, if one has been requested.
    pub fn requested(&self) -> Option<String> {
        self.0.borrow().clone()
    }
}

/// Build a fresh, unrequested handoff source/token pair.
pub fn handoff_channel() -> (HandoffSource, HandoffToken) {
    let (tx, rx) = watch::channel(None);
    (HandoffSource(tx), HandoffToken(rx))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_propagates_to_cloned_tokens() {
        let (source, token) = channel();
        let cloned = token.clone();
        assert!(!token.is_cancelled());
        source.cancel();
        assert!(token.is_cancelled());
        assert!(cloned.is_cancelled());
    }

    #[test]
    fn handoff_carries_the_injected_message() {
        let (source, token) = handoff_channel();
        assert_eq!(token.requested(), None);
        source.request("please pause here");
        assert_eq!(token.requested(), Some("please pause here".to_string()));
    }
}
