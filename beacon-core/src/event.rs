use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;

/// Collector endpoint an encoded request is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Endpoint {
    Track,
    Engage,
    PeopleSet,
    PeopleIncrement,
    Identify,
}

impl Endpoint {
    /// Path segment appended to the base URL for this endpoint.
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::Track => "track",
            Endpoint::Engage => "engage",
            Endpoint::PeopleSet => "people.set",
            Endpoint::PeopleIncrement => "people.increment",
            Endpoint::Identify => "identify",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path())
    }
}

/// A single analytics occurrence, immutable once built.
///
/// Created per facade call and discarded after encoding; the facade injects
/// timestamp, client IP, and token into `properties` before construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    name: String,
    properties: Map<String, Value>,
}

impl Event {
    pub fn new(name: impl Into<String>, properties: Map<String, Value>) -> Self {
        Event {
            name: name.into(),
            properties,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn properties(&self) -> &Map<String, Value> {
        &self.properties
    }

    /// Wire payload: `{"event": <name>, "properties": {...}}`.
    pub fn into_payload(self) -> Value {
        json!({
            "event": self.name,
            "properties": Value::Object(self.properties),
        })
    }
}

/// A fully encoded request URL plus the endpoint it targets.
///
/// Opaque after construction; once handed to the dispatcher it is never
/// mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedRequest {
    endpoint: Endpoint,
    url: String,
}

impl EncodedRequest {
    pub(crate) fn new(endpoint: Endpoint, url: String) -> Self {
        EncodedRequest { endpoint, url }
    }

    pub fn endpoint(&self) -> Endpoint {
        self.endpoint
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_paths() {
        assert_eq!(Endpoint::Track.path(), "track");
        assert_eq!(Endpoint::Engage.path(), "engage");
        assert_eq!(Endpoint::PeopleSet.path(), "people.set");
        assert_eq!(Endpoint::PeopleIncrement.path(), "people.increment");
        assert_eq!(Endpoint::Identify.path(), "identify");
    }

    #[test]
    fn test_endpoint_serde_round_trip() {
        for endpoint in [
            Endpoint::Track,
            Endpoint::Engage,
            Endpoint::PeopleSet,
            Endpoint::PeopleIncrement,
            Endpoint::Identify,
        ] {
            let json = serde_json::to_string(&endpoint).unwrap();
            let back: Endpoint = serde_json::from_str(&json).unwrap();
            assert_eq!(endpoint, back);
        }
    }

    #[test]
    fn test_event_payload_shape() {
        let mut props = Map::new();
        props.insert("plan".to_string(), Value::String("pro".to_string()));

        let event = Event::new("signup", props);
        assert_eq!(event.name(), "signup");
        assert_eq!(
            event.properties().get("plan"),
            Some(&Value::String("pro".to_string()))
        );

        let payload = event.into_payload();
        assert_eq!(payload["event"], "signup");
        assert_eq!(payload["properties"]["plan"], "pro");
    }
}
