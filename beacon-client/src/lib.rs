//! Best-effort analytics event client.
//!
//! Application code records events (tracked actions, person property updates)
//! which are delivered to a remote collector without blocking the caller's
//! request path. Delivery mode is fixed per client: synchronous callers get
//! the collector's verdict as a boolean; asynchronous callers hand the
//! encoded request to a shared background worker and return immediately. An
//! event may be silently lost when the collector or the worker is
//! unavailable; that trade is deliberate.
//!
//! A process keeps at most one background worker: hosts serving concurrent
//! requests build one [`beacon_transport::Transport`] and create a
//! [`Client`] per request over it with [`Client::with_transport`], each bound
//! to that request's [`RequestScope`].
//!
//! ```rust,no_run
//! use beacon_client::{Client, ClientConfig};
//! use beacon_core::RequestScope;
//! use beacon_transport::DeliveryMode;
//! use serde_json::{json, Map};
//! use std::collections::HashMap;
//! use std::sync::Arc;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let scope = Arc::new(RequestScope::new(HashMap::new()));
//! let config = ClientConfig {
//!     token: Some("T1".to_string()),
//!     base_url: "https://collector.example.com/".to_string(),
//!     mode: DeliveryMode::Async,
//!     ..Default::default()
//! };
//! let client = Client::new(config, scope)?;
//!
//! let mut props = Map::new();
//! props.insert("plan".to_string(), json!("pro"));
//! client.track_event("signup", props).await?;
//! # Ok(())
//! # }
//! ```

pub mod client;

pub use client::{Client, ClientConfig};
pub use beacon_core::{EncodeError, Endpoint, QueuedEvent, RequestScope};
pub use beacon_transport::{Delivery, DeliveryMode};
