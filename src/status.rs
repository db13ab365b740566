//! StatusAnnouncer: cycle progress phrases while a submission is in flight.
//!
//! [`StatusAnnouncer::start`] spawns a ticking task and hands back an
//! [`AnnouncerGuard`]. The task lives exactly as long as the guard: dropping
//! it (or calling [`AnnouncerGuard::stop`]) aborts the task on every exit
//! path, including a session torn down mid-submission.
//!
//! The announcer is purely observational. Nothing in the workflow waits on it.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_stream::wrappers::WatchStream;
use tokio_stream::StreamExt;
use tracing::debug;

pub struct StatusAnnouncer;

impl StatusAnnouncer {
    /// Start cycling through `phrases`, advancing every `interval`.
    ///
    /// The first phrase is current immediately. An empty phrase list yields a
    /// guard whose [`current`](AnnouncerGuard::current) is always `None`.
    pub fn start(phrases: Vec<String>, interval: Duration) -> AnnouncerGuard {
        let phrases: Arc<[String]> = phrases.into();
        let (tx, rx) = watch::channel(0usize);

        let len = phrases.len();
        let task = tokio::spawn(async move {
            if len < 2 {
                // Nothing to rotate; keep the sender alive until aborted.
                std::future::pending::<()>().await;
            }
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            ticker.tick().await;
            let mut index = 0usize;
            loop {
                ticker.tick().await;
                index = (index + 1) % len;
                if tx.send(index).is_err() {
                    break;
                }
            }
        });

        debug!("Status announcer started ({} phrases, {:?})", len, interval);
        AnnouncerGuard {
            phrases,
            rx,
            task: Some(task),
        }
    }
}

/// Owns the running announcer task. Dropping it stops the task.
pub struct AnnouncerGuard {
    phrases: Arc<[String]>,
    rx: watch::Receiver<usize>,
    task: Option<JoinHandle<()>>,
}

impl AnnouncerGuard {
    pub fn index(&self) -> usize {
        *self.rx.borrow()
    }

    /// The phrase currently showing.
    pub fn current(&self) -> Option<&str> {
        self.phrases.get(self.index()).map(String::as_str)
    }

    /// Raw index channel.
    pub fn subscribe(&self) -> watch::Receiver<usize> {
        self.rx.clone()
    }

    /// Stream of phrases, starting with the current one. Ends when the
    /// announcer stops.
    pub fn updates(&self) -> impl tokio_stream::Stream<Item = String> + Send + 'static {
        let phrases = Arc::clone(&self.phrases);
        WatchStream::new(self.rx.clone())
            .filter_map(move |i| phrases.get(i).cloned())
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Stop the announcer now.
    pub fn stop(mut self) {
        self.abort();
    }

    fn abort(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            debug!("Status announcer stopped");
        }
    }
}

impl Drop for AnnouncerGuard {
    fn drop(&mut self) {
        self.abort();
    }
}

impl std::fmt::Debug for AnnouncerGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnnouncerGuard")
            .field("index", &self.index())
            .field("phrases", &self.phrases.len())
            .field("running", &self.is_running())
            .finish()
    }
}
