use thiserror::Error;

/// Failure to turn an event payload into its wire form.
///
/// Encoding happens before the sync/async fork, so this is the only error an
/// event operation can surface to the caller regardless of delivery mode.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("payload cannot be serialized: {0}")]
    Serialize(#[from] serde_json::Error),
}
