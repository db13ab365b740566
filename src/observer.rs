//! Observer trait for session events.
//!
//! Inject an [`Arc<dyn SessionObserver>`] via
//! [`crate::session::Session::with_observer`] to mirror the session into a
//! view: a terminal spinner, a websocket, a GUI model. The session calls the
//! observer from its own task and from the status-announcer task, so
//! implementations must be `Send + Sync`.
//!
//! # Example
//!
//! ```rust
//! use doc_translate::{SessionObserver, SessionState};
//! use std::sync::Mutex;
//!
//! #[derive(Default)]
//! struct StateLog(Mutex<Vec<&'static str>>);
//!
//! impl SessionObserver for StateLog {
//!     fn on_state_change(&self, state: &SessionState) {
//!         self.0.lock().unwrap().push(state.name());
//!     }
//! }
//!
//! let log = StateLog::default();
//! log.on_state_change(&SessionState::Idle);
//! log.on_status("Scanning document for text...");
//! assert_eq!(*log.0.lock().unwrap(), vec!["idle"]);
//! ```

use crate::error::SessionError;
use crate::workflow::SessionState;
use std::sync::Arc;

/// Receives session events. Every method defaults to a no-op.
pub trait SessionObserver: Send + Sync {
    /// The session moved to a new state (including a variant switch).
    fn on_state_change(&self, state: &SessionState) {
        let _ = state;
    }

    /// A new progress phrase is showing.
    fn on_status(&self, phrase: &str) {
        let _ = phrase;
    }

    /// An inline notice was raised: validation, sample download or export
    /// failure. State is unaffected.
    fn on_notice(&self, notice: &SessionError) {
        let _ = notice;
    }
}

/// Observer that ignores everything. Used when none is configured.
pub struct NoopObserver;

impl SessionObserver for NoopObserver {}

pub type SharedObserver = Arc<dyn SessionObserver>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counting {
        states: AtomicUsize,
        statuses: AtomicUsize,
        notices: AtomicUsize,
    }

    impl SessionObserver for Counting {
        fn on_state_change(&self, _state: &SessionState) {
            self.states.fetch_add(1, Ordering::SeqCst);
        }

        fn on_status(&self, _phrase: &str) {
            self.statuses.fetch_add(1, Ordering::SeqCst);
        }

        fn on_notice(&self, _notice: &SessionError) {
            self.notices.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_observer_does_not_panic() {
        let obs: SharedObserver = Arc::new(NoopObserver);
        obs.on_state_change(&SessionState::Idle);
        obs.on_status("Finalizing your results...");
        obs.on_notice(&SessionError::NoDocumentSelected);
    }

    #[test]
    fn overridden_methods_receive_events() {
        let obs = Counting::default();
        obs.on_state_change(&SessionState::Idle);
        obs.on_status("a");
        obs.on_status("b");
        obs.on_notice(&SessionError::NoDocumentSelected);
        assert_eq!(obs.states.load(Ordering::SeqCst), 1);
        assert_eq!(obs.statuses.load(Ordering::SeqCst), 2);
        assert_eq!(obs.notices.load(Ordering::SeqCst), 1);
    }
}
