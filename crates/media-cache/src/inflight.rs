//! Single-flight bookkeeping for downloads.
//!
//! At most one download runs per URL. The first caller claims the key and
//! performs the download; concurrent callers either skip the kickoff or wait
//! on the claimant's completion channel.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;

type FlightMap = Arc<Mutex<HashMap<String, watch::Receiver<bool>>>>;

/// Per-key single-flight registry. Clones share one table.
#[derive(Clone, Default)]
pub(crate) struct InFlight {
    map: FlightMap,
}

/// Outcome of trying to claim a key.
pub(crate) enum Claim {
    /// The caller owns the download and must perform it.
    Claimed(Ticket),
    /// Another task already owns it; the receiver resolves on completion.
    Joined(watch::Receiver<bool>),
}

/// Held by the task performing a download. Dropping it signals completion
/// and releases the key, even if the download task panicked.
pub(crate) struct Ticket {
    key: String,
    done: watch::Sender<bool>,
    map: FlightMap,
}

impl InFlight {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Claim `key` for download, or join the download already running.
    pub(crate) fn claim(&self, key: &str) -> Claim {
        let mut map = self.map.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(rx) = map.get(key) {
            return Claim::Joined(rx.clone());
        }
        let (done, rx) = watch::channel(false);
        map.insert(key.to_string(), rx);
        Claim::Claimed(Ticket {
            key: key.to_string(),
            done,
            map: Arc::clone(&self.map),
        })
    }

    #[cfg(test)]
    pub(crate) fn contains(&self, key: &str) -> bool {
        self.map
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }
}

impl Drop for Ticket {
    fn drop(&mut self) {
        let _ = self.done.send(true);
        self.map
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}

/// Wait until the download behind `rx` finishes. Returns normally even if
/// the downloading task died without signalling.
pub(crate) async fn wait(mut rx: watch::Receiver<bool>) {
    let _ = rx.wait_for(|done| *done).await;
}
