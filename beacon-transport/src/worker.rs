use crate::dispatcher::WorkerFactory;
use crate::sender::HttpSender;
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedSender};
use tracing::debug;

/// Spawns the real delivery worker: a long-lived task that drains
/// newline-terminated URL lines from its channel in FIFO order and performs
/// one synchronous delivery per line.
///
/// The task runs until every sender is dropped, which is how the dispatcher's
/// disposal closes the channel. Delivery failures are logged and dropped;
/// acceptance into the channel never implied delivery in the first place.
#[derive(Debug)]
pub struct HttpWorkerFactory {
    sender: Arc<HttpSender>,
}

impl HttpWorkerFactory {
    pub fn new(sender: Arc<HttpSender>) -> Self {
        HttpWorkerFactory { sender }
    }
}

impl WorkerFactory for HttpWorkerFactory {
    fn spawn(&self) -> UnboundedSender<String> {
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();
        let sender = Arc::clone(&self.sender);

        tokio::spawn(async move {
            debug!("delivery worker started");
            while let Some(line) = rx.recv().await {
                let url = line.trim_end_matches('\n');
                if !sender.deliver_url(url).await {
                    debug!("background delivery rejected or failed, event dropped");
                }
            }
            debug!("delivery worker channel closed, exiting");
        });

        tx
    }
}
