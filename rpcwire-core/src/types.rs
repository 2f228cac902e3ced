//! JSON-RPC 2.0 message types
//!
//! This module holds the request side of the message model and the types
//! shared by both directions:
//!
//! - [`Id`]: the request identifier, normalized on decode
//! - [`Request`]: a call or, without an id, a notification
//! - [`Message`]: either a request or a response, detected per object
//!
//! The response type lives in [`crate::response`] because of its lazy
//! resolution machinery.
//!
//! # Immutability
//!
//! Fields are private. A decoded message can be read from any number of
//! threads but never edited in place; `with_*` methods return an updated
//! copy instead.

use crate::codec::WireMessage;
use crate::envelope::{self, Envelope, JSONRPC_VERSION, RESERVED_PREFIX};
use crate::error::{Error, Result};
use crate::response::Response;
use rand::Rng;
use serde::de::DeserializeOwned;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use serde_json::value::RawValue;
use serde_json::Value;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::io::Write;

/// Upper bound for [`Id::random`]; keeps ids exact in IEEE-754 doubles.
pub const MAX_RANDOM_ID: i64 = (1 << 53) - 1;

/// JSON-RPC 2.0 request ID
///
/// Decoding normalizes a JSON `null` and an empty string to [`Id::Null`].
/// Fractional ids are accepted even though the protocol discourages them;
/// a whole-valued float keeps its trailing `.0` when displayed or encoded,
/// so `1.0` and `1` stay distinct ids.
///
/// # Examples
///
/// ```rust
/// use rpcwire_core::Id;
///
/// let id1: Id = "req-123".into();
/// let id2: Id = 42i64.into();
/// let id3: Id = 3.0f64.into();
///
/// assert_eq!(id1.to_string(), "\"req-123\"");
/// assert_eq!(id2.to_string(), "42");
/// assert_eq!(id3.to_string(), "3.0");
/// ```
#[derive(Debug, Clone)]
pub enum Id {
    /// Null identifier (also what empty strings decode to)
    Null,
    /// Non-empty string identifier
    String(String),
    /// Integer identifier
    Integer(i64),
    /// Fractional or out-of-range numeric identifier
    Float(f64),
}

impl Id {
    /// A uniformly random integer id in `1..=MAX_RANDOM_ID`
    pub fn random() -> Self {
        Id::Integer(rand::thread_rng().gen_range(1..=MAX_RANDOM_ID))
    }

    /// Classify a raw `id` span.
    ///
    /// Fails with [`Error::InvalidId`] unless the span is null, a string or a
    /// number.
    pub fn from_raw(raw: &RawValue) -> Result<Self> {
        match raw.get().as_bytes().first() {
            Some(b'n') => Ok(Id::Null),
            Some(b'"') => {
                let s: String = serde_json::from_str(raw.get()).map_err(Error::malformed)?;
                Ok(Id::from_decoded_string(s))
            }
            Some(b'-' | b'0'..=b'9') => {
                let number: serde_json::Number =
                    serde_json::from_str(raw.get()).map_err(Error::malformed)?;
                Ok(match number.as_i64() {
                    Some(n) => Id::Integer(n),
                    None => Id::Float(number.as_f64().unwrap_or(f64::NAN)),
                })
            }
            _ => Err(Error::InvalidId(envelope::kind_of_raw(raw).to_string())),
        }
    }

    /// Cheap type check used when the id is resolved later
    pub(crate) fn check_raw(raw: &RawValue) -> Result<()> {
        match raw.get().as_bytes().first() {
            Some(b'n' | b'"' | b'-' | b'0'..=b'9') => Ok(()),
            _ => Err(Error::InvalidId(envelope::kind_of_raw(raw).to_string())),
        }
    }

    fn from_decoded_string(s: String) -> Self {
        if s.is_empty() {
            Id::Null
        } else {
            Id::String(s)
        }
    }

    /// True for [`Id::Null`]
    pub fn is_null(&self) -> bool {
        matches!(self, Id::Null)
    }

    /// Rejects ids that would not decode back to themselves: an empty
    /// string (reads as null) and a non-finite float (written as null).
    pub(crate) fn check_encodable(&self) -> Result<()> {
        match self {
            Id::String(s) if s.is_empty() => Err(Error::InvalidId("empty string".to_string())),
            Id::Float(x) if !x.is_finite() => Err(Error::InvalidId(format!("non-finite number {x}"))),
            _ => Ok(()),
        }
    }
}

impl PartialEq for Id {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Id::Null, Id::Null) => true,
            (Id::String(a), Id::String(b)) => a == b,
            (Id::Integer(a), Id::Integer(b)) => a == b,
            // Bitwise so that Eq and Hash agree
            (Id::Float(a), Id::Float(b)) => a.to_bits() == b.to_bits(),
            _ => false,
        }
    }
}

impl Eq for Id {}

impl Hash for Id {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Id::Null => {}
            Id::String(s) => s.hash(state),
            Id::Integer(n) => n.hash(state),
            Id::Float(f) => f.to_bits().hash(state),
        }
    }
}

impl fmt::Display for Id {
    /// JSON-like rendering: strings quoted, floats always with a fraction
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Id::Null => write!(f, "null"),
            Id::String(s) => write!(f, "\"{}\"", s),
            Id::Integer(n) => write!(f, "{}", n),
            Id::Float(x) => write!(f, "{:?}", x),
        }
    }
}

impl Serialize for Id {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Id::Null => serializer.serialize_unit(),
            Id::String(s) => serializer.serialize_str(s),
            Id::Integer(n) => serializer.serialize_i64(*n),
            Id::Float(x) => serializer.serialize_f64(*x),
        }
    }
}

impl From<String> for Id {
    /// An empty string becomes [`Id::Null`], as it does on decode.
    fn from(s: String) -> Self {
        Id::from_decoded_string(s)
    }
}

impl From<&str> for Id {
    fn from(s: &str) -> Self {
        Id::from_decoded_string(s.to_string())
    }
}

impl From<i64> for Id {
    fn from(n: i64) -> Self {
        Id::Integer(n)
    }
}

impl From<i32> for Id {
    fn from(n: i32) -> Self {
        Id::Integer(n.into())
    }
}

impl From<u64> for Id {
    /// Values above `i64::MAX` become [`Id::Float`], as they do on decode.
    fn from(n: u64) -> Self {
        match i64::try_from(n) {
            Ok(n) => Id::Integer(n),
            Err(_) => Id::Float(n as f64),
        }
    }
}

impl From<f64> for Id {
    fn from(x: f64) -> Self {
        Id::Float(x)
    }
}

/// JSON-RPC 2.0 request or notification
///
/// A request without an id is a notification: the peer must not answer it.
/// An explicit `"id": null` is still a request (with [`Id::Null`]).
///
/// # Examples
///
/// ```rust
/// use rpcwire_core::{Request, Id, WireMessage};
/// use serde_json::json;
///
/// let req = Request::new("subtract", Some(json!([42, 23])), Id::Integer(1));
/// assert_eq!(
///     String::from_utf8(req.to_vec().unwrap()).unwrap(),
///     r#"{"jsonrpc":"2.0","id":1,"method":"subtract","params":[42,23]}"#
/// );
///
/// let ping = Request::notification("ping", None);
/// assert!(ping.is_notification());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    id: Option<Id>,
    method: String,
    params: Option<Value>,
}

impl Request {
    /// Create a request that expects a response
    ///
    /// Nothing is checked here; [`WireMessage::validate`] runs before every
    /// encode.
    pub fn new(method: impl Into<String>, params: Option<Value>, id: Id) -> Self {
        Self {
            id: Some(id),
            method: method.into(),
            params,
        }
    }

    /// Create a notification (no id, no response expected)
    pub fn notification(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            id: None,
            method: method.into(),
            params,
        }
    }

    /// Create a request with an [`Id::random`] id
    pub fn with_random_id(method: impl Into<String>, params: Option<Value>) -> Self {
        Self::new(method, params, Id::random())
    }

    /// Copy of this request carrying a different id
    pub fn with_id(&self, id: Id) -> Self {
        Self {
            id: Some(id),
            ..self.clone()
        }
    }

    /// Always "2.0"
    pub fn jsonrpc(&self) -> &'static str {
        JSONRPC_VERSION
    }

    /// The id, or `None` for a notification
    pub fn id(&self) -> Option<&Id> {
        self.id.as_ref()
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn params(&self) -> Option<&Value> {
        self.params.as_ref()
    }

    /// True when the request carries no id
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }

    /// Deserialize `params` into a caller type. Absent params decode as `null`.
    pub fn params_as<T: DeserializeOwned>(&self) -> Result<T> {
        let params = self.params.clone().unwrap_or(Value::Null);
        serde_json::from_value(params).map_err(|e| Error::Serialization(e.to_string()))
    }

    pub(crate) fn from_envelope(envelope: Envelope) -> Result<Self> {
        let method = match envelope.method {
            Some(Value::String(method)) if !method.is_empty() => method,
            _ => return Err(Error::MissingMethod),
        };
        if method.starts_with(RESERVED_PREFIX) {
            return Err(Error::ReservedMethod(method));
        }

        let id = envelope.id.as_deref().map(Id::from_raw).transpose()?;

        let params = envelope.params;
        if let Some(p) = &params {
            check_params(p)?;
        }

        Ok(Self { id, method, params })
    }
}

fn check_params(params: &Value) -> Result<()> {
    match params {
        Value::Array(_) | Value::Object(_) => Ok(()),
        other => Err(Error::InvalidParams(envelope::kind_of(other).to_string())),
    }
}

impl Serialize for Request {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let len = 2 + usize::from(self.id.is_some()) + usize::from(self.params.is_some());
        let mut state = serializer.serialize_struct("Request", len)?;
        state.serialize_field("jsonrpc", JSONRPC_VERSION)?;
        if let Some(id) = &self.id {
            state.serialize_field("id", id)?;
        }
        state.serialize_field("method", &self.method)?;
        if let Some(params) = &self.params {
            state.serialize_field("params", params)?;
        }
        state.end()
    }
}

impl WireMessage for Request {
    fn decode(data: &[u8]) -> Result<Self> {
        Request::from_envelope(Envelope::parse(data)?)
    }

    fn validate(&self) -> Result<()> {
        if let Some(id) = &self.id {
            id.check_encodable()?;
        }
        if self.method.is_empty() {
            return Err(Error::MissingMethod);
        }
        if self.method.starts_with(RESERVED_PREFIX) {
            return Err(Error::ReservedMethod(self.method.clone()));
        }
        if let Some(params) = &self.params {
            check_params(params)?;
        }
        Ok(())
    }

    fn write_to<W: Write + ?Sized>(&self, writer: &mut W) -> Result<()> {
        self.validate()?;
        writer.write_all(br#"{"jsonrpc":"2.0""#)?;
        if let Some(id) = &self.id {
            writer.write_all(br#","id":"#)?;
            serde_json::to_writer(&mut *writer, id)?;
        }
        writer.write_all(br#","method":"#)?;
        serde_json::to_writer(&mut *writer, &self.method)?;
        if let Some(params) = &self.params {
            writer.write_all(br#","params":"#)?;
            serde_json::to_writer(&mut *writer, params)?;
        }
        writer.write_all(b"}")?;
        Ok(())
    }
}

/// Either side of a JSON-RPC exchange
///
/// Used where requests and responses share a channel. An object with a
/// `method` member decodes as a request, anything else as a response.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// A request or notification
    Request(Request),
    /// A response (result or error)
    Response(Response),
}

impl Message {
    pub fn is_request(&self) -> bool {
        matches!(self, Message::Request(_))
    }

    pub fn is_notification(&self) -> bool {
        matches!(self, Message::Request(r) if r.is_notification())
    }

    pub fn is_response(&self) -> bool {
        matches!(self, Message::Response(_))
    }

    pub fn as_request(&self) -> Option<&Request> {
        match self {
            Message::Request(r) => Some(r),
            Message::Response(_) => None,
        }
    }

    pub fn as_response(&self) -> Option<&Response> {
        match self {
            Message::Response(r) => Some(r),
            Message::Request(_) => None,
        }
    }
}

impl From<Request> for Message {
    fn from(request: Request) -> Self {
        Message::Request(request)
    }
}

impl From<Response> for Message {
    fn from(response: Response) -> Self {
        Message::Response(response)
    }
}

impl Serialize for Message {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Message::Request(r) => r.serialize(serializer),
            Message::Response(r) => r.serialize(serializer),
        }
    }
}

impl WireMessage for Message {
    fn decode(data: &[u8]) -> Result<Self> {
        let envelope = Envelope::parse(data)?;
        if envelope.is_request() {
            Request::from_envelope(envelope).map(Message::Request)
        } else {
            Response::from_envelope(envelope).map(Message::Response)
        }
    }

    fn validate(&self) -> Result<()> {
        match self {
            Message::Request(r) => r.validate(),
            Message::Response(r) => r.validate(),
        }
    }

    fn write_to<W: Write + ?Sized>(&self, writer: &mut W) -> Result<()> {
        match self {
            Message::Request(r) => r.write_to(writer),
            Message::Response(r) => r.write_to(writer),
        }
    }
}
