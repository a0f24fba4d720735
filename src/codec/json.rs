use serde::Serialize;
use serde::de::DeserializeOwned;
use crate::core::{DbError, Result};
use super::DocumentCodec;

/// `serde_json` backed codec writing compact bodies.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl JsonCodec {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentCodec for JsonCodec {
    fn encode<T: Serialize>(&self, item: Option<&T>) -> Result<String> {
        match item {
            None => Ok(String::new()),
            Some(item) => serde_json::to_string(item).map_err(DbError::from),
        }
    }

    fn decode<T: DeserializeOwned>(&self, body: &str) -> Result<T> {
        if body.trim().is_empty() {
            return Err(DbError::CodecError("document body is empty".to_string()));
        }
        serde_json::from_str(body).map_err(DbError::from)
    }
}
