//! Document codec
//!
//! The codec turns items into document bodies and back. Its contract:
//!
//! - an absent item encodes to the empty string, never to `null` or an error;
//! - owned nested values are written inline; references to other documents are
//!   plain identity members (identity-only policy) and are never followed;
//! - only the members of the statically requested type are emitted.

mod json;

pub use json::JsonCodec;

use serde::Serialize;
use serde::de::DeserializeOwned;
use crate::core::Result;

pub trait DocumentCodec: Send + Sync {
    fn encode<T: Serialize>(&self, item: Option<&T>) -> Result<String>;

    fn decode<T: DeserializeOwned>(&self, body: &str) -> Result<T>;
}
