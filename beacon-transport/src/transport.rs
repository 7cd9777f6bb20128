use crate::dispatcher::{Dispatcher, WorkerFactory};
use crate::sender::HttpSender;
use crate::worker::HttpWorkerFactory;
use beacon_core::EncodedRequest;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    /// The worker channel's receiving end is gone; the handle must be
    /// disposed and recreated.
    #[error("worker channel closed")]
    ChannelClosed,
}

/// Delivery mode, fixed per client instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeliveryMode {
    #[default]
    Sync,
    Async,
}

/// Outcome of handing one request to the transport.
///
/// `Acknowledged` carries the collector's verdict from a blocking round trip.
/// `Dispatched` only means the request was accepted into the worker channel;
/// delivery confirmation is never surfaced in async mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Acknowledged(bool),
    Dispatched,
}

/// Routes encoded requests either through a blocking HTTP round trip or into
/// the background worker, according to the configured mode.
///
/// A process runs ONE transport, shared (via `Arc`) by every request-scoped
/// client; the dispatcher inside it is what guarantees at most one live
/// worker handle per process.
#[derive(Debug)]
pub struct Transport {
    mode: DeliveryMode,
    sender: Arc<HttpSender>,
    dispatcher: Dispatcher,
}

impl Transport {
    pub fn new(mode: DeliveryMode, sender: Arc<HttpSender>, factory: Arc<dyn WorkerFactory>) -> Self {
        Transport {
            mode,
            sender,
            dispatcher: Dispatcher::new(factory),
        }
    }

    /// Transport backed by the real HTTP sender and worker.
    pub fn http(mode: DeliveryMode, timeout: Duration) -> Result<Self, reqwest::Error> {
        let sender = Arc::new(HttpSender::new(timeout)?);
        let factory = Arc::new(HttpWorkerFactory::new(Arc::clone(&sender)));
        Ok(Transport::new(mode, sender, factory))
    }

    pub fn mode(&self) -> DeliveryMode {
        self.mode
    }

    pub async fn deliver(&self, request: &EncodedRequest) -> Delivery {
        match self.mode {
            DeliveryMode::Sync => Delivery::Acknowledged(self.sender.deliver(request).await),
            DeliveryMode::Async => {
                self.dispatcher.dispatch(request.url());
                Delivery::Dispatched
            }
        }
    }
}
