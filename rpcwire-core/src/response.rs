//! JSON-RPC 2.0 response with lazily resolved fields
//!
//! A [`Response`] keeps the `id`, `result` and `error` members of the wire
//! message as raw JSON spans and only turns them into Rust values when a
//! caller asks for them:
//!
//! - `id` is resolved eagerly on decode (cheap, needed for routing), and
//!   lazily when the response was assembled from raw spans
//! - `error` is resolved on first access through the lenient decoder in
//!   [`JsonRpcErrorData::from_raw`]
//! - `result` is never decoded implicitly; it is forwarded verbatim on
//!   encode and decoded only through [`Response::unmarshal_result`] or the
//!   path extractors
//!
//! # Concurrency
//!
//! Each lazy field sits behind its own [`OnceLock`]. Concurrent first
//! readers block until a single resolution pass finishes and then all see
//! the same value; later reads are lock-free. The raw spans never change
//! after construction, so a cached value never needs invalidating.
//!
//! # Releasing buffers
//!
//! [`Response::free`] drops the raw spans and the cached result tree while
//! keeping resolved scalars for logging. Anything that needs a dropped span
//! afterwards fails with [`Error::BufferReleased`].

use crate::codec::WireMessage;
use crate::envelope::{Envelope, JSONRPC_VERSION};
use crate::error::{Error, JsonRpcErrorData, Result};
use crate::types::Id;
use serde::de::DeserializeOwned;
use serde::ser::{Error as _, SerializeStruct};
use serde::{Serialize, Serializer};
use serde_json::value::RawValue;
use serde_json::Value;
use std::io::Write;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Body {
    Result,
    Error,
}

/// JSON-RPC 2.0 response message
///
/// Carries exactly one of `result` or `error`. The invariant is enforced
/// when the response is built or decoded and checked again before every
/// encode.
///
/// # Examples
///
/// ```rust
/// use rpcwire_core::{Response, JsonRpcErrorData, Id, WireMessage};
/// use serde_json::json;
///
/// let ok = Response::success(json!({"value": 42}), Id::Integer(1)).unwrap();
/// assert!(ok.is_success());
///
/// let failed = Response::failure(JsonRpcErrorData::method_not_found("nope"), Id::Integer(2));
/// assert!(failed.is_error());
///
/// let decoded = Response::decode(br#"{"jsonrpc":"2.0","id":3,"result":{"v":[1,2]}}"#).unwrap();
/// assert_eq!(decoded.extract_raw(&["v", "1"]).unwrap(), "2");
/// ```
#[derive(Debug)]
pub struct Response {
    raw_id: Option<Box<RawValue>>,
    id: OnceLock<Id>,
    body: Body,
    result: Option<Box<RawValue>>,
    raw_error: Option<Box<RawValue>>,
    error: OnceLock<JsonRpcErrorData>,
    pub(crate) tree: OnceLock<std::result::Result<Value, String>>,
    released: bool,
}

impl Response {
    fn blank(body: Body) -> Self {
        Self {
            raw_id: None,
            id: OnceLock::new(),
            body,
            result: None,
            raw_error: None,
            error: OnceLock::new(),
            tree: OnceLock::new(),
            released: false,
        }
    }

    /// Create a successful response from any serializable value
    pub fn success<T: Serialize>(result: T, id: Id) -> Result<Self> {
        let raw = serde_json::value::to_raw_value(&result)?;
        Ok(Self::from_raw_result(raw, id))
    }

    /// Create a successful response around an already encoded result
    pub fn from_raw_result(result: Box<RawValue>, id: Id) -> Self {
        let mut response = Self::blank(Body::Result);
        response.id = OnceLock::from(id);
        response.result = Some(result);
        response
    }

    /// Create an error response
    ///
    /// Use `Id::Null` when the request id could not be determined.
    pub fn failure(error: JsonRpcErrorData, id: Id) -> Self {
        let mut response = Self::blank(Body::Error);
        response.id = OnceLock::from(id);
        response.error = OnceLock::from(error);
        response
    }

    /// Assemble a response from raw member spans without resolving them.
    ///
    /// `id` defaults to `null` when absent. Exactly one of `result` and
    /// `error` must be given. The id span is type-checked here but only
    /// materialized on first access; the error span is resolved on first
    /// access.
    pub fn from_raw(
        id: Option<Box<RawValue>>,
        result: Option<Box<RawValue>>,
        error: Option<Box<RawValue>>,
    ) -> Result<Self> {
        if let Some(raw) = id.as_deref() {
            Id::check_raw(raw)?;
        }
        let mut response = match (result, error) {
            (Some(_), Some(_)) => return Err(Error::ConflictingBody),
            (None, None) => return Err(Error::MissingBody),
            (Some(result), None) => {
                let mut r = Self::blank(Body::Result);
                r.result = Some(result);
                r
            }
            (None, Some(error)) => {
                let mut r = Self::blank(Body::Error);
                r.raw_error = Some(error);
                r
            }
        };
        response.raw_id = id;
        Ok(response)
    }

    pub(crate) fn from_envelope(envelope: Envelope) -> Result<Self> {
        // `"error": null` beside a result is common enough to be read as absent
        let error = envelope.error.filter(|raw| raw.get() != "null");
        let id = envelope.id.as_deref().map(Id::from_raw).transpose()?;

        let mut response = Self::from_raw(None, envelope.result, error)?;
        response.id = OnceLock::from(id.unwrap_or(Id::Null));
        Ok(response)
    }

    /// Always "2.0"
    pub fn jsonrpc(&self) -> &'static str {
        JSONRPC_VERSION
    }

    /// The response id, resolving it from the raw span on first call
    pub fn id(&self) -> &Id {
        self.id.get_or_init(|| {
            tracing::trace!("resolving response id");
            match self.raw_id.as_deref() {
                Some(raw) => Id::from_raw(raw).unwrap_or_else(|e| {
                    tracing::warn!(error = %e, "unresolvable response id, using null");
                    Id::Null
                }),
                None => Id::Null,
            }
        })
    }

    /// Copy of this response carrying a different id
    pub fn with_id(&self, id: Id) -> Self {
        let mut copy = self.clone();
        copy.raw_id = None;
        copy.id = OnceLock::from(id);
        copy
    }

    pub fn is_success(&self) -> bool {
        self.body == Body::Result
    }

    pub fn is_error(&self) -> bool {
        self.body == Body::Error
    }

    /// The error object, resolving it on first call.
    ///
    /// Returns `Ok(None)` for a result-bearing response. Fails only when the
    /// raw error span was released by [`Response::free`] before anyone
    /// resolved it.
    pub fn error(&self) -> Result<Option<&JsonRpcErrorData>> {
        if self.body == Body::Result {
            return Ok(None);
        }
        if let Some(resolved) = self.error.get() {
            return Ok(Some(resolved));
        }
        let raw = self.raw_error.as_deref().ok_or(Error::BufferReleased("error"))?;
        let resolved = self.error.get_or_init(|| {
            tracing::trace!(len = raw.get().len(), "resolving response error");
            JsonRpcErrorData::from_raw(raw.get().as_bytes())
        });
        Ok(Some(resolved))
    }

    /// The raw `result` span, or `None` for an error response.
    ///
    /// Fails with [`Error::BufferReleased`] once [`Response::free`] has
    /// dropped the span of a successful response.
    pub fn raw_result(&self) -> Result<Option<&RawValue>> {
        match self.body {
            Body::Error => Ok(None),
            Body::Result => self.result.as_deref().map(Some).ok_or(Error::BufferReleased("result")),
        }
    }

    /// The raw `result` span, failing for error responses and released buffers
    pub(crate) fn result_span(&self) -> Result<&RawValue> {
        match self.body {
            Body::Error => {
                let error = self.error()?.cloned().unwrap_or_default();
                Err(Error::JsonRpc(error))
            }
            Body::Result => self.result.as_deref().ok_or(Error::BufferReleased("result")),
        }
    }

    /// Decode the result into a caller type.
    ///
    /// An error response yields [`Error::JsonRpc`] with its error object.
    pub fn unmarshal_result<T: DeserializeOwned>(&self) -> Result<T> {
        let raw = self.result_span()?;
        serde_json::from_str(raw.get()).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Release the raw buffers and the cached result tree.
    ///
    /// The id is resolved first so it survives. An error that was never
    /// resolved is gone afterwards, and so is the result.
    pub fn free(&mut self) {
        self.id();
        self.raw_id = None;
        self.result = None;
        self.raw_error = None;
        self.tree = OnceLock::new();
        self.released = true;
        tracing::debug!(id = %self.id(), "released response buffers");
    }

    /// True once [`Response::free`] has run
    pub fn is_released(&self) -> bool {
        self.released
    }

    fn released_or(&self, field: &'static str, otherwise: Error) -> Error {
        if self.released {
            Error::BufferReleased(field)
        } else {
            otherwise
        }
    }
}

impl Clone for Response {
    /// Deep copy of the raw spans and resolved values. The result tree is
    /// not copied; the clone rebuilds it on demand.
    fn clone(&self) -> Self {
        Self {
            raw_id: self.raw_id.clone(),
            id: self.id.clone(),
            body: self.body,
            result: self.result.clone(),
            raw_error: self.raw_error.clone(),
            error: self.error.clone(),
            tree: OnceLock::new(),
            released: self.released,
        }
    }
}

impl PartialEq for Response {
    /// Compares ids, errors and result text, resolving lazy fields on both
    /// sides first. A response whose error was released compares unequal.
    fn eq(&self, other: &Self) -> bool {
        if self.body != other.body || self.id() != other.id() {
            return false;
        }
        match (self.error(), other.error()) {
            (Ok(a), Ok(b)) if a == b => {}
            _ => return false,
        }
        self.result.as_deref().map(RawValue::get) == other.result.as_deref().map(RawValue::get)
    }
}

impl Serialize for Response {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.validate().map_err(S::Error::custom)?;

        let mut state = serializer.serialize_struct("Response", 3)?;
        state.serialize_field("jsonrpc", JSONRPC_VERSION)?;
        match (self.id.get(), self.raw_id.as_deref()) {
            (Some(id), _) => state.serialize_field("id", id)?,
            (None, Some(raw)) => state.serialize_field("id", raw)?,
            (None, None) => state.serialize_field("id", &Id::Null)?,
        }
        match self.body {
            Body::Result => {
                let raw = self.result_span().map_err(S::Error::custom)?;
                state.serialize_field("result", raw)?;
            }
            Body::Error => {
                let error = self
                    .error()
                    .map_err(S::Error::custom)?
                    .ok_or_else(|| S::Error::custom(Error::MissingBody))?;
                state.serialize_field("error", error)?;
            }
        }
        state.end()
    }
}

impl WireMessage for Response {
    fn decode(data: &[u8]) -> Result<Self> {
        let response = Response::from_envelope(Envelope::parse(data)?)?;
        tracing::debug!(id = %response.id(), success = response.is_success(), "decoded response");
        Ok(response)
    }

    fn validate(&self) -> Result<()> {
        if let Some(id) = self.id.get() {
            id.check_encodable()?;
        }
        match self.body {
            Body::Result => {
                if self.raw_error.is_some() || self.error.get().is_some() {
                    return Err(Error::ConflictingBody);
                }
                if self.result.is_none() {
                    return Err(self.released_or("result", Error::MissingBody));
                }
            }
            Body::Error => {
                if self.result.is_some() {
                    return Err(Error::ConflictingBody);
                }
                if self.raw_error.is_none() && self.error.get().is_none() {
                    return Err(self.released_or("error", Error::MissingBody));
                }
            }
        }
        Ok(())
    }

    /// Write the envelope piece by piece without buffering the whole
    /// message. Produces the same bytes as [`WireMessage::to_vec`].
    fn write_to<W: Write + ?Sized>(&self, writer: &mut W) -> Result<()> {
        self.validate()?;
        // Resolve before the first byte goes out so a failure leaves the sink untouched
        let error = self.error()?;

        writer.write_all(br#"{"jsonrpc":"2.0","id":"#)?;
        match (self.id.get(), self.raw_id.as_deref()) {
            (Some(id), _) => serde_json::to_writer(&mut *writer, id)?,
            (None, Some(raw)) => writer.write_all(raw.get().as_bytes())?,
            (None, None) => writer.write_all(b"null")?,
        }
        match error {
            Some(error) => {
                writer.write_all(br#","error":"#)?;
                serde_json::to_writer(&mut *writer, error)?;
            }
            None => {
                let raw = self.result_span()?;
                writer.write_all(br#","result":"#)?;
                writer.write_all(raw.get().as_bytes())?;
            }
        }
        writer.write_all(b"}")?;
        Ok(())
    }

    fn to_vec(&self) -> Result<Vec<u8>> {
        self.validate()?;
        // Surface a released error span as such rather than as a serde message
        self.error()?;
        Ok(serde_json::to_vec(self)?)
    }
}
