pub mod encode;
pub mod error;
pub mod event;
pub mod scope;

pub use encode::{encode, rewrite_person_properties, RESERVED_PERSON_PROPERTIES};
pub use error::EncodeError;
pub use event::{EncodedRequest, Endpoint, Event};
pub use scope::{QueuedEvent, RequestScope, FORWARDED_FOR_KEY, REMOTE_ADDR_KEY};
