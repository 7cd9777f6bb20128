pub mod dispatcher;
pub mod sender;
pub mod transport;
pub mod worker;

pub use dispatcher::{Dispatcher, WorkerFactory, WorkerHandle};
pub use sender::HttpSender;
pub use transport::{Delivery, DeliveryMode, Transport, TransportError};
pub use worker::HttpWorkerFactory;
