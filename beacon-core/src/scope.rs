use crate::event::Endpoint;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::trace;

/// Metadata key carrying the proxied client address chain.
pub const FORWARDED_FOR_KEY: &str = "x-forwarded-for";
/// Metadata key carrying the direct peer address.
pub const REMOTE_ADDR_KEY: &str = "remote-addr";

/// An event recorded into the request-scoped queue instead of being sent.
///
/// `args` holds pre-serialized JSON documents so the queue can be flushed by
/// an integration that never sees the original Rust values.
#[derive(Debug, Clone, PartialEq)]
pub struct QueuedEvent {
    pub endpoint: Endpoint,
    pub args: Vec<String>,
}

/// Per-request collaborator owned by the surrounding framework.
///
/// The client borrows this for the duration of one logical request: it reads
/// connection metadata for IP extraction and appends queued events. Creation
/// and final flush are the host's responsibility; `drain` exists for that
/// flush and clears the queue.
#[derive(Debug, Default)]
pub struct RequestScope {
    metadata: HashMap<String, String>,
    events: Mutex<Vec<QueuedEvent>>,
}

impl RequestScope {
    pub fn new(metadata: HashMap<String, String>) -> Self {
        RequestScope {
            metadata,
            events: Mutex::new(Vec::new()),
        }
    }

    /// Client IP for outgoing event payloads.
    ///
    /// Takes the last entry of the forwarded-for chain when present (the hop
    /// added by the closest trusted proxy), falling back to the peer address,
    /// then to the empty string.
    pub fn client_ip(&self) -> String {
        if let Some(chain) = self.metadata.get(FORWARDED_FOR_KEY) {
            return chain
                .rsplit(',')
                .next()
                .map(|ip| ip.trim().to_string())
                .unwrap_or_default();
        }
        self.metadata
            .get(REMOTE_ADDR_KEY)
            .cloned()
            .unwrap_or_default()
    }

    pub fn append(&self, endpoint: Endpoint, args: Vec<String>) {
        trace!(endpoint = %endpoint, "queueing event in request scope");
        let mut events = self.events.lock().unwrap_or_else(|e| e.into_inner());
        events.push(QueuedEvent { endpoint, args });
    }

    /// Take every queued event, leaving the queue empty.
    pub fn drain(&self) -> Vec<QueuedEvent> {
        let mut events = self.events.lock().unwrap_or_else(|e| e.into_inner());
        std::mem::take(&mut *events)
    }

    pub fn is_empty(&self) -> bool {
        let events = self.events.lock().unwrap_or_else(|e| e.into_inner());
        events.is_empty()
    }
}
