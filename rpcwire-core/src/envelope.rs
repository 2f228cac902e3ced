//! Shallow envelope parse shared by every message decoder
//!
//! The envelope keeps `id`, `result` and `error` as raw spans so that the
//! payloads are validated by the tokenizer but never materialized here.

use crate::error::{Error, Result};
use serde::{Deserialize, Deserializer};
use serde_json::value::RawValue;
use serde_json::Value;

/// The only protocol version this codec speaks
pub const JSONRPC_VERSION: &str = "2.0";

/// Method names starting with this prefix are reserved for the protocol
pub const RESERVED_PREFIX: &str = "rpc.";

#[derive(Debug, Deserialize)]
pub(crate) struct Envelope {
    #[serde(default)]
    pub jsonrpc: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub id: Option<Box<RawValue>>,
    #[serde(default)]
    pub method: Option<Value>,
    #[serde(default)]
    pub params: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub result: Option<Box<RawValue>>,
    #[serde(default, deserialize_with = "present")]
    pub error: Option<Box<RawValue>>,
}

/// Keeps an explicit `null` as `Some("null")`; only an absent member is `None`.
fn present<'de, D>(deserializer: D) -> std::result::Result<Option<Box<RawValue>>, D::Error>
where
    D: Deserializer<'de>,
{
    Box::<RawValue>::deserialize(deserializer).map(Some)
}

impl Envelope {
    pub fn parse(data: &[u8]) -> Result<Self> {
        match first_token(data) {
            None => return Err(Error::EmptyInput),
            Some(b'{') => {}
            // A derived struct visitor would otherwise fill fields from array positions
            Some(_) => {
                return Err(Error::MalformedJson(format!(
                    "expected a JSON object, found {}",
                    token_kind(data)
                )))
            }
        }
        let envelope: Envelope = serde_json::from_slice(data).map_err(Error::malformed)?;
        envelope.check_version()?;
        Ok(envelope)
    }

    fn check_version(&self) -> Result<()> {
        match &self.jsonrpc {
            Some(Value::String(v)) if v == JSONRPC_VERSION => Ok(()),
            Some(other) => Err(Error::InvalidVersion(other.to_string())),
            None => Err(Error::InvalidVersion("nothing".to_string())),
        }
    }

    /// Requests are recognised by the presence of `method`
    pub fn is_request(&self) -> bool {
        self.method.is_some()
    }
}

/// Name of the JSON type that starts a raw span, for error messages.
pub(crate) fn kind_of_raw(raw: &RawValue) -> &'static str {
    match raw.get().as_bytes().first() {
        Some(b'{') => "object",
        Some(b'[') => "array",
        Some(b'"') => "string",
        Some(b't') | Some(b'f') => "boolean",
        Some(b'n') => "null",
        _ => "number",
    }
}

pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn token_kind(data: &[u8]) -> &'static str {
    match first_token(data) {
        Some(b'[') => "array",
        Some(b'"') => "string",
        Some(b't' | b'f') => "boolean",
        Some(b'n') => "null",
        Some(b'-' | b'0'..=b'9') => "number",
        _ => "invalid token",
    }
}

/// First non-whitespace byte of the input, if any
pub(crate) fn first_token(data: &[u8]) -> Option<u8> {
    data.iter().copied().find(|b| !b.is_ascii_whitespace())
}
