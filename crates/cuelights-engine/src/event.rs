use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex, PoisonError};

use cuelights_frame::StatusUpdate;
use tracing::warn;

/// What the engine delivers to its consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    /// The device reported a channel's status.
    Status(StatusUpdate),
    /// The link failed; no further events follow.
    LinkLost(String),
}

/// Shared marker that the link has been lost.
///
/// Every handle that touches the link (listener, engine, cloned writers)
/// holds one. Whichever side notices first reports it to the consumer
/// queue; later failures stay quiet so the consumer sees exactly one
/// [`LinkEvent::LinkLost`].
#[derive(Debug, Clone, Default)]
pub(crate) struct LostFlag {
    tripped: Arc<AtomicBool>,
    notify: Arc<Mutex<Option<Sender<LinkEvent>>>>,
}

impl LostFlag {
    /// Route future link-lost reports into the consumer queue.
    pub(crate) fn attach(&self, events: Sender<LinkEvent>) {
        *self.notify.lock().unwrap_or_else(PoisonError::into_inner) = Some(events);
    }

    /// Drop the queue handle so the dispatcher can drain and exit.
    pub(crate) fn detach(&self) {
        self.notify
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }

    /// Mark the link lost and tell the consumer. Returns true only for the
    /// first report.
    pub(crate) fn report(&self, reason: &str) -> bool {
        if !self.trip() {
            return false;
        }
        warn!(%reason, "link lost");
        let notify = self.notify.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(events) = notify.as_ref() {
            let _ = events.send(LinkEvent::LinkLost(reason.to_string()));
        }
        true
    }

    /// Mark the link lost without notifying anyone. Returns true only for
    /// the first caller.
    pub(crate) fn trip(&self) -> bool {
        !self.tripped.swap(true, Ordering::AcqRel)
    }

    pub(crate) fn is_set(&self) -> bool {
        self.tripped.load(Ordering::Acquire)
    }
}
