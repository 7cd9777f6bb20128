use anyhow::{Context, Result};
use beacon_core::{encode, rewrite_person_properties, EncodeError, Endpoint, Event, RequestScope};
use beacon_transport::{Delivery, DeliveryMode, HttpSender, Transport, WorkerFactory};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API token stamped into every payload, if configured.
    pub token: Option<String>,
    /// Base URL of the collector; a trailing slash is added when missing.
    pub base_url: String,
    /// Delivery mode, fixed for the lifetime of the client.
    pub mode: DeliveryMode,
    /// Request timeout for synchronous and worker-side delivery.
    pub timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            token: None,
            base_url: "http://127.0.0.1:8080/".to_string(),
            mode: DeliveryMode::Sync,
            timeout_ms: 30000,
        }
    }
}

/// Public entry point for recording analytics events.
///
/// Holds a borrowed view of the surrounding request's scope (connection
/// metadata and the queued-event list) and a shared, process-wide transport.
/// A host serving concurrent requests builds ONE transport and hands it to a
/// fresh `Client` per request via [`Client::with_transport`]; the clients
/// come and go with their requests while the transport, and therefore the
/// single background worker, outlives them all. Direct operations encode and
/// deliver immediately; `append`-style operations only push onto the request
/// scope for the host framework to flush.
#[derive(Debug)]
pub struct Client {
    config: ClientConfig,
    transport: Arc<Transport>,
    scope: Arc<RequestScope>,
}

impl Client {
    /// Create a client owning a fresh transport backed by the real HTTP
    /// worker. Suitable for a single-client program; hosts serving many
    /// requests should build the transport once and use
    /// [`Client::with_transport`] for each request.
    pub fn new(config: ClientConfig, scope: Arc<RequestScope>) -> Result<Self> {
        let transport = Transport::http(config.mode, Duration::from_millis(config.timeout_ms))
            .context("Failed to build HTTP client")?;
        Ok(Self::assemble(config, scope, Arc::new(transport)))
    }

    /// Create a request-scoped client over an existing process-wide
    /// transport. The transport's delivery mode governs delivery.
    pub fn with_transport(
        config: ClientConfig,
        scope: Arc<RequestScope>,
        transport: Arc<Transport>,
    ) -> Self {
        Self::assemble(config, scope, transport)
    }

    /// Create a client with an injected worker factory. Intended for tests
    /// that need to observe or break the background worker.
    pub fn with_factory(
        config: ClientConfig,
        scope: Arc<RequestScope>,
        factory: Arc<dyn WorkerFactory>,
    ) -> Result<Self> {
        let sender = Arc::new(
            HttpSender::new(Duration::from_millis(config.timeout_ms))
                .context("Failed to build HTTP client")?,
        );
        let transport = Arc::new(Transport::new(config.mode, sender, factory));
        Ok(Self::assemble(config, scope, transport))
    }

    fn assemble(
        mut config: ClientConfig,
        scope: Arc<RequestScope>,
        transport: Arc<Transport>,
    ) -> Self {
        if !config.base_url.ends_with('/') {
            config.base_url.push('/');
        }
        Client {
            config,
            transport,
            scope,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The process-wide transport this client delivers through; clone the
    /// `Arc` to hand it to further request-scoped clients.
    pub fn transport(&self) -> Arc<Transport> {
        Arc::clone(&self.transport)
    }

    /// Record a tracked action.
    ///
    /// Injects the current unix timestamp, the request's client IP, and the
    /// configured token; caller-supplied properties override any of them. In
    /// sync mode the returned `Delivery::Acknowledged` carries the
    /// collector's verdict; in async mode `Delivery::Dispatched` only means
    /// the request was handed to the worker.
    pub async fn track_event(
        &self,
        event: &str,
        properties: Map<String, Value>,
    ) -> Result<Delivery, EncodeError> {
        let payload = self.track_payload(event, properties);
        let request = encode(&self.config.base_url, Endpoint::Track, &payload)?;
        debug!(event = event, mode = ?self.transport.mode(), "tracking event");
        Ok(self.transport.deliver(&request).await)
    }

    /// Overwrite person properties for `distinct_id` (engage `$set`).
    pub async fn set_person_properties(
        &self,
        distinct_id: &str,
        properties: Map<String, Value>,
    ) -> Result<Delivery, EncodeError> {
        self.engage(distinct_id, "$set", properties).await
    }

    /// Increment numeric person properties for `distinct_id` (engage `$add`).
    pub async fn increment_person_properties(
        &self,
        distinct_id: &str,
        properties: Map<String, Value>,
    ) -> Result<Delivery, EncodeError> {
        self.engage(distinct_id, "$add", properties).await
    }

    /// Queue a tracked action on the request scope instead of delivering it.
    pub fn append_event(
        &self,
        event: &str,
        properties: Map<String, Value>,
    ) -> Result<(), EncodeError> {
        self.append(
            Endpoint::Track,
            vec![
                serde_json::to_string(event)?,
                serde_json::to_string(&properties)?,
            ],
        )
    }

    /// Queue a person-property update, applying the reserved-name rewrite.
    pub fn append_person_properties(
        &self,
        properties: Map<String, Value>,
    ) -> Result<(), EncodeError> {
        let properties = rewrite_person_properties(properties);
        self.append(
            Endpoint::PeopleSet,
            vec![serde_json::to_string(&properties)?],
        )
    }

    /// Queue an identity association for the current user.
    pub fn identify(&self, distinct_id: &str) -> Result<(), EncodeError> {
        self.append(Endpoint::Identify, vec![serde_json::to_string(distinct_id)?])
    }

    /// Queue a single-property numeric increment.
    pub fn increment_property(&self, property: &str, by: i64) -> Result<(), EncodeError> {
        self.append(
            Endpoint::PeopleIncrement,
            vec![serde_json::to_string(property)?, serde_json::to_string(&by)?],
        )
    }

    async fn engage(
        &self,
        distinct_id: &str,
        operation: &str,
        properties: Map<String, Value>,
    ) -> Result<Delivery, EncodeError> {
        let payload = self.engage_payload(distinct_id, operation, properties);
        let request = encode(&self.config.base_url, Endpoint::Engage, &payload)?;
        debug!(operation = operation, mode = ?self.transport.mode(), "engaging person record");
        Ok(self.transport.deliver(&request).await)
    }

    fn append(&self, endpoint: Endpoint, args: Vec<String>) -> Result<(), EncodeError> {
        self.scope.append(endpoint, args);
        Ok(())
    }

    fn track_payload(&self, event: &str, properties: Map<String, Value>) -> Value {
        let mut merged = Map::new();
        merged.insert("time".to_string(), json!(chrono::Utc::now().timestamp()));
        merged.insert("ip".to_string(), json!(self.scope.client_ip()));
        if let Some(token) = &self.config.token {
            merged.insert("token".to_string(), json!(token));
        }
        // Caller properties win over the injected defaults.
        merged.extend(properties);

        Event::new(event, merged).into_payload()
    }

    fn engage_payload(
        &self,
        distinct_id: &str,
        operation: &str,
        properties: Map<String, Value>,
    ) -> Value {
        let properties = rewrite_person_properties(properties);
        let mut payload = Map::new();
        payload.insert("$distinct_id".to_string(), json!(distinct_id));
        payload.insert(operation.to_string(), Value::Object(properties));
        if let Some(token) = &self.config.token {
            payload.insert("token".to_string(), json!(token));
        }
        Value::Object(payload)
    }
}
