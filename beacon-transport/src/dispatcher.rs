use crate::transport::TransportError;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

/// Spawns the long-lived delivery worker and returns the writing end of its
/// line channel.
///
/// Injected into the [`Dispatcher`] so tests can substitute an instrumented
/// factory for the real HTTP worker.
pub trait WorkerFactory: Send + Sync + fmt::Debug {
    fn spawn(&self) -> UnboundedSender<String>;
}

/// Handle to the current background worker.
///
/// The generation id distinguishes this handle from any successor, making
/// stale disposal a no-op.
#[derive(Debug, Clone)]
pub struct WorkerHandle {
    id: u64,
    tx: UnboundedSender<String>,
}

impl WorkerHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Write one newline-terminated request line into the worker channel.
    ///
    /// Success means "accepted into the channel buffer", nothing more. A
    /// closed channel is reported as a value, not a panic or a swallowed
    /// exception, so the dispatcher can branch on it explicitly.
    pub fn write_line(&self, url: &str) -> Result<(), TransportError> {
        let mut line = String::with_capacity(url.len() + 1);
        line.push_str(url);
        line.push('\n');
        self.tx
            .send(line)
            .map_err(|_| TransportError::ChannelClosed)
    }
}

/// Owns the lifecycle of the single background delivery worker.
///
/// The worker is created lazily on first dispatch, shared by every caller,
/// and torn down the moment a channel write fails so that the next dispatch
/// transparently recreates it. The lock covers only handle read/create/clear;
/// it is never held across a channel write or an await point, so one slow
/// delivery never blocks other callers.
#[derive(Debug)]
pub struct Dispatcher {
    factory: Arc<dyn WorkerFactory>,
    slot: Mutex<Option<WorkerHandle>>,
    next_id: AtomicU64,
}

impl Dispatcher {
    pub fn new(factory: Arc<dyn WorkerFactory>) -> Self {
        Dispatcher {
            factory,
            slot: Mutex::new(None),
            next_id: AtomicU64::new(1),
        }
    }

    /// Return the live worker handle, spawning a worker if none exists.
    pub fn acquire_or_create(&self) -> WorkerHandle {
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(handle) = slot.as_ref() {
            return handle.clone();
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        debug!(worker_id = id, "spawning delivery worker");
        let handle = WorkerHandle {
            id,
            tx: self.factory.spawn(),
        };
        *slot = Some(handle.clone());
        handle
    }

    /// Drop the stored worker handle, but only if `handle` is still the
    /// current one. Disposing a superseded handle is a no-op, so concurrent
    /// failures tear the worker down exactly once.
    pub fn dispose_if_current(&self, handle: &WorkerHandle) {
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        if slot.as_ref().map(WorkerHandle::id) == Some(handle.id) {
            debug!(worker_id = handle.id, "disposing delivery worker handle");
            *slot = None;
        }
    }

    /// Hand one request line to the worker, best-effort.
    ///
    /// On a broken channel the stale handle is disposed and the event is
    /// dropped; nothing surfaces to the caller. The next dispatch acquires a
    /// fresh worker.
    pub fn dispatch(&self, url: &str) {
        let worker = self.acquire_or_create();
        if worker.write_line(url).is_err() {
            debug!(
                worker_id = worker.id,
                "worker channel broken, dropping event"
            );
            self.dispose_if_current(&worker);
        }
    }
}
