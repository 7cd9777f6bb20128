use crate::error::EncodeError;
use crate::event::{EncodedRequest, Endpoint};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Serialize;
use serde_json::{Map, Value};

/// Person property names the collector expects in `$`-prefixed wire form.
pub const RESERVED_PERSON_PROPERTIES: &[&str] = &[
    "email",
    "created",
    "first_name",
    "last_name",
    "last_login",
    "username",
    "country_code",
];

/// Encode a payload into a deliverable request URL.
///
/// The payload is serialized to compact JSON, base64-encoded, and attached as
/// the `data` query parameter of `<base_url><endpoint-path>/`. The result
/// never contains a raw newline, which the line-oriented worker channel
/// depends on.
pub fn encode<T: Serialize>(
    base_url: &str,
    endpoint: Endpoint,
    payload: &T,
) -> Result<EncodedRequest, EncodeError> {
    let json = serde_json::to_vec(payload)?;
    // The standard base64 alphabet emits no newlines, but the worker channel
    // protocol is line-oriented, so enforce it rather than assume it.
    let data: String = STANDARD.encode(json).replace('\n', "");
    let url = format!("{}{}/?data={}", base_url, endpoint.path(), data);
    Ok(EncodedRequest::new(endpoint, url))
}

/// Rewrite reserved person property names into their `$`-prefixed wire form.
///
/// Non-reserved keys, including keys already carrying the `$` prefix, pass
/// through unchanged, which makes the rewrite idempotent. Values are never
/// touched. Keys arrive as `String` (the map type guarantees it), so no
/// further normalization is needed before the table lookup.
pub fn rewrite_person_properties(properties: Map<String, Value>) -> Map<String, Value> {
    let mut rewritten = Map::with_capacity(properties.len());
    for (key, value) in properties {
        if RESERVED_PERSON_PROPERTIES.contains(&key.as_str()) {
            rewritten.insert(format!("${}", key), value);
        } else {
            rewritten.insert(key, value);
        }
    }
    rewritten
}
