//! Error types for rpcwire
//!
//! This module defines the two error shapes the codec deals with:
//!
//! - **Error**: codec-level failures returned from decode, encode and
//!   extraction calls (uses thiserror)
//! - **JsonRpcErrorData**: the `error` object carried inside a JSON-RPC 2.0
//!   response, including the lenient decoder used for non-conformant peers
//!
//! # Reserved Codes
//!
//! The protocol reserves `-32768..=-32000`. The constants in this module
//! are the codes this crate produces; `-32000..=-32099` is left to servers.
//!
//! # Examples
//!
//! ```rust
//! use rpcwire_core::{Error, JsonRpcErrorData};
//!
//! // Codec error raised while decoding a batch
//! let error = Error::EmptyBatch;
//! assert_eq!(error.to_error_data().code, -32600);
//!
//! // A lenient decode of a peer's error payload never fails
//! let data = JsonRpcErrorData::from_raw(br#"{"error":"backend down"}"#);
//! assert_eq!(data.message, "backend down");
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Invalid JSON was received.
pub const PARSE_ERROR: i64 = -32700;
/// The JSON sent is not a valid Request object.
pub const INVALID_REQUEST: i64 = -32600;
/// The method does not exist / is not available.
pub const METHOD_NOT_FOUND: i64 = -32601;
/// Invalid method parameter(s).
pub const INVALID_PARAMS: i64 = -32602;
/// Internal JSON-RPC error. Also used for error payloads that could not be
/// decoded into a conformant shape.
pub const SERVER_SIDE_EXCEPTION: i64 = -32603;

/// Result type for rpcwire operations
pub type Result<T> = std::result::Result<T, Error>;

/// Codec-level error type
///
/// Every public entry point returns this type. Envelope violations are
/// reported as soon as they are detected and no partially built message is
/// returned alongside them.
///
/// # Conversion to JSON-RPC Errors
///
/// A server that fails to decode an incoming message can answer with
/// [`Error::to_error_data`], which maps each variant onto the standard
/// JSON-RPC 2.0 error codes.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// The underlying JSON tokenizer rejected the input
    #[error("Malformed JSON: {0}")]
    MalformedJson(String),

    /// `jsonrpc` member missing or not exactly "2.0"
    #[error("Invalid version: expected \"2.0\", got {0}")]
    InvalidVersion(String),

    /// Request without a non-empty string `method`
    #[error("Missing method: request must carry a non-empty string method")]
    MissingMethod,

    /// Request method uses the reserved `rpc.` prefix
    #[error("Reserved method name: {0}")]
    ReservedMethod(String),

    /// Request `params` present but neither an array nor an object
    #[error("Invalid params: expected array or object, got {0}")]
    InvalidParams(String),

    /// `id` is not null, a string or a number
    #[error("Invalid id: expected string, number or null, got {0}")]
    InvalidId(String),

    /// Response carries neither `result` nor `error`
    #[error("Missing body: response must carry exactly one of result or error")]
    MissingBody,

    /// Response carries both `result` and `error`
    #[error("Conflicting body: response carries both result and error")]
    ConflictingBody,

    /// Batch array with no elements
    #[error("Empty batch: a batch must contain at least one element")]
    EmptyBatch,

    /// Batch decode on something other than a JSON array
    #[error("Not an array: batch input must be a JSON array")]
    NotAnArray,

    /// A single batch element failed; the whole batch is rejected
    #[error("Batch element {index}: {source}")]
    ElementError {
        /// Zero-based position of the failing element
        index: usize,
        /// What went wrong with that element
        #[source]
        source: Box<Error>,
    },

    /// Path extraction could not resolve a segment
    #[error("Path not found: {0}")]
    PathNotFound(String),

    /// Path extraction found a value of the wrong JSON type
    #[error("Type mismatch at '{path}': expected {expected}, found {found}")]
    TypeMismatch {
        /// Dotted path that was looked up
        path: String,
        /// JSON type the caller asked for
        expected: &'static str,
        /// JSON type actually present
        found: &'static str,
    },

    /// Public entry point called with no bytes (or whitespace only)
    #[error("Empty input")]
    EmptyInput,

    /// A raw buffer needed by this operation was dropped by `free`
    #[error("Buffer released: raw {0} bytes were freed")]
    BufferReleased(&'static str),

    /// The response carries a protocol error where a result was requested
    #[error("JSON-RPC error: {0}")]
    JsonRpc(#[from] JsonRpcErrorData),

    /// Encoding to JSON or decoding into a caller type failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Reading from a byte source or writing to a sink failed
    #[error("IO error: {0}")]
    Io(String),

    /// Byte source exceeded the configured ceiling
    #[error("Message too large: limit={limit} bytes")]
    MessageTooLarge {
        /// The maximum accepted message size in bytes
        limit: usize,
    },

    /// Batch longer than the configured cap
    #[error("Batch size limit exceeded: limit={limit}, actual={actual}")]
    BatchSizeExceeded {
        /// The maximum allowed batch length
        limit: usize,
        /// The length that was rejected
        actual: usize,
    },
}

impl Error {
    /// Map a tokenizer failure raised while decoding
    pub(crate) fn malformed(err: serde_json::Error) -> Self {
        Error::MalformedJson(err.to_string())
    }

    /// Tag an error with the batch position it came from
    pub(crate) fn at_index(self, index: usize) -> Self {
        Error::ElementError {
            index,
            source: Box::new(self),
        }
    }

    /// Convert this error into a wire error object suitable for an error
    /// response.
    ///
    /// Batch element failures are mapped according to their cause, with the
    /// index kept in the message.
    pub fn to_error_data(&self) -> JsonRpcErrorData {
        match self {
            Error::MalformedJson(_) | Error::EmptyInput => JsonRpcErrorData::parse_error(),
            Error::InvalidParams(_) => JsonRpcErrorData::invalid_params(self.to_string()),
            Error::JsonRpc(data) => data.clone(),
            Error::ElementError { source, .. } => {
                let inner = source.to_error_data();
                JsonRpcErrorData::new(inner.code, self.to_string())
            }
            Error::InvalidVersion(_)
            | Error::MissingMethod
            | Error::ReservedMethod(_)
            | Error::InvalidId(_)
            | Error::MissingBody
            | Error::ConflictingBody
            | Error::EmptyBatch
            | Error::NotAnArray
            | Error::BatchSizeExceeded { .. }
            | Error::MessageTooLarge { .. } => JsonRpcErrorData::invalid_request(self.to_string()),
            Error::PathNotFound(_)
            | Error::TypeMismatch { .. }
            | Error::BufferReleased(_)
            | Error::Serialization(_)
            | Error::Io(_) => JsonRpcErrorData::internal_error(self.to_string()),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        if err.is_io() {
            Error::Io(err.to_string())
        } else {
            Error::Serialization(err.to_string())
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

/// JSON-RPC 2.0 error object as carried in a response's `error` member
///
/// # Equality
///
/// Two error objects are equal when `code` and `message` match. `data` is
/// not compared: its shape is unconstrained and peers disagree on how to
/// encode it.
///
/// # Emptiness
///
/// An error object is empty only when `code == 0` and `message` is empty.
/// A zero code with a message is a usable error.
///
/// # Examples
///
/// ```rust
/// use rpcwire_core::JsonRpcErrorData;
/// use serde_json::json;
///
/// let busy = JsonRpcErrorData::with_data(-32005, "rate limited", json!({"retry_after": 2}));
/// assert_eq!(busy.to_string(), "[-32005] rate limited");
///
/// // `data` does not take part in equality
/// assert_eq!(busy, JsonRpcErrorData::new(-32005, "rate limited"));
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JsonRpcErrorData {
    pub code: i64,

    /// Short human-readable description
    pub message: String,

    /// Peer-defined detail, omitted from the wire when `None`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

/// Strict shape: any `data` value.
#[derive(Deserialize)]
struct StrictShape {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
    #[serde(default)]
    data: Option<serde_json::Value>,
}

/// Producers that stringify `data`.
#[derive(Deserialize)]
struct StringDataShape {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
    #[serde(default)]
    data: String,
}

/// `{"error": "..."}` wrapper some gateways emit instead of an error object.
#[derive(Deserialize)]
struct WrappedShape {
    error: String,
}

impl JsonRpcErrorData {
    /// Create a new error with code and message
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Create a new error with additional data
    pub fn with_data(code: i64, message: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            code,
            message: message.into(),
            data: Some(data),
        }
    }

    /// Create a parse error (-32700)
    pub fn parse_error() -> Self {
        Self::new(PARSE_ERROR, "Parse error")
    }

    /// Create an invalid request error (-32600)
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::new(INVALID_REQUEST, msg)
    }

    /// Create a method not found error (-32601)
    ///
    /// ```rust
    /// use rpcwire_core::JsonRpcErrorData;
    ///
    /// let error = JsonRpcErrorData::method_not_found("calculateFoo");
    /// assert_eq!(error.message, "Method not found: calculateFoo");
    /// ```
    pub fn method_not_found(method: impl Into<String>) -> Self {
        Self::new(METHOD_NOT_FOUND, format!("Method not found: {}", method.into()))
    }

    /// Create an invalid params error (-32602)
    pub fn invalid_params(msg: impl Into<String>) -> Self {
        Self::new(INVALID_PARAMS, msg)
    }

    /// Create an internal error (-32603)
    pub fn internal_error(msg: impl Into<String>) -> Self {
        Self::new(SERVER_SIDE_EXCEPTION, msg)
    }

    /// True when neither a code nor a message is present
    pub fn is_empty(&self) -> bool {
        self.code == 0 && self.message.is_empty()
    }

    /// Decode an `error` payload leniently.
    ///
    /// Peers emit errors in several incompatible shapes, so this never
    /// fails. The first matching shape wins:
    ///
    /// 1. empty input or `null` gives `-32603 "empty error"`
    /// 2. `{code, message, data}` with a non-zero code
    /// 3. `{code, message, data: string}` with any member set
    /// 4. `{"error": "<text>"}` gives `-32603 <text>`
    /// 5. anything else becomes the message verbatim, code `-32603`
    ///
    /// ```rust
    /// use rpcwire_core::JsonRpcErrorData;
    ///
    /// let err = JsonRpcErrorData::from_raw(b"not json at all");
    /// assert_eq!(err.code, -32603);
    /// assert_eq!(err.message, "not json at all");
    /// ```
    pub fn from_raw(raw: &[u8]) -> Self {
        let trimmed = raw.trim_ascii();
        if trimmed.is_empty() || trimmed == b"null" {
            return Self::internal_error("empty error");
        }

        if let Ok(strict) = serde_json::from_slice::<StrictShape>(trimmed) {
            if strict.code != 0 {
                return Self {
                    code: strict.code,
                    message: strict.message,
                    data: strict.data,
                };
            }
        }

        if let Ok(loose) = serde_json::from_slice::<StringDataShape>(trimmed) {
            if loose.code != 0 || !loose.message.is_empty() || !loose.data.is_empty() {
                let data = (!loose.data.is_empty()).then(|| serde_json::Value::String(loose.data));
                return Self {
                    code: loose.code,
                    message: loose.message,
                    data,
                };
            }
        }

        if let Ok(wrapped) = serde_json::from_slice::<WrappedShape>(trimmed) {
            return Self::internal_error(wrapped.error);
        }

        let verbatim = String::from_utf8_lossy(trimmed).into_owned();
        tracing::warn!(len = trimmed.len(), "error payload matched no known shape, keeping it verbatim");
        Self::internal_error(verbatim)
    }
}

impl PartialEq for JsonRpcErrorData {
    fn eq(&self, other: &Self) -> bool {
        self.code == other.code && self.message == other.message
    }
}

impl Eq for JsonRpcErrorData {}

impl std::fmt::Display for JsonRpcErrorData {
    /// Formats as "[code] message", e.g. "[-32601] Method not found: foo"
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for JsonRpcErrorData {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fallback_empty_and_null() {
        for raw in [&b""[..], b"null", b"  null "] {
            let err = JsonRpcErrorData::from_raw(raw);
            assert_eq!(err.code, SERVER_SIDE_EXCEPTION);
            assert_eq!(err.message, "empty error");
        }
    }

    #[test]
    fn test_fallback_strict_object() {
        let err = JsonRpcErrorData::from_raw(br#"{"code":-32000,"message":"m"}"#);
        assert_eq!(err.code, -32000);
        assert_eq!(err.message, "m");
        assert!(err.data.is_none());

        let err = JsonRpcErrorData::from_raw(br#"{"code":7,"message":"m","data":{"k":[1,2]}}"#);
        assert_eq!(err.code, 7);
        assert_eq!(err.data, Some(json!({"k": [1, 2]})));
    }

    #[test]
    fn test_fallback_zero_code_with_message() {
        let err = JsonRpcErrorData::from_raw(br#"{"code":0,"message":"soft failure"}"#);
        assert_eq!(err.code, 0);
        assert_eq!(err.message, "soft failure");
        assert!(!err.is_empty());
    }

    #[test]
    fn test_fallback_string_data() {
        let err = JsonRpcErrorData::from_raw(br#"{"message":"","data":"trace here"}"#);
        assert_eq!(err.code, 0);
        assert_eq!(err.data, Some(json!("trace here")));
    }

    #[test]
    fn test_fallback_error_wrapper() {
        let err = JsonRpcErrorData::from_raw(br#"{"error":"s"}"#);
        assert_eq!(err.code, SERVER_SIDE_EXCEPTION);
        assert_eq!(err.message, "s");
    }

    #[test]
    fn test_fallback_verbatim() {
        let err = JsonRpcErrorData::from_raw(b"not json at all");
        assert_eq!(err.code, SERVER_SIDE_EXCEPTION);
        assert_eq!(err.message, "not json at all");

        // An object matching no shape is kept as text too
        let err = JsonRpcErrorData::from_raw(br#"{"code":0,"message":"x","data":{"n":1}}"#);
        assert_eq!(err.message, r#"{"code":0,"message":"x","data":{"n":1}}"#);
    }

    #[test]
    fn test_equality_ignores_data() {
        let a = JsonRpcErrorData::with_data(-1, "boom", json!({"a": 1}));
        let b = JsonRpcErrorData::with_data(-1, "boom", json!([1, 2, 3]));
        assert_eq!(a, b);
        assert_ne!(a, JsonRpcErrorData::new(-2, "boom"));
    }

    #[test]
    fn test_is_empty() {
        assert!(JsonRpcErrorData::default().is_empty());
        assert!(!JsonRpcErrorData::new(0, "m").is_empty());
        assert!(!JsonRpcErrorData::new(5, "").is_empty());
    }

    #[test]
    fn test_jsonrpc_error_display() {
        let error = JsonRpcErrorData::method_not_found("unknownMethod");
        let display = format!("{}", error);

        assert!(display.contains("-32601"));
        assert!(display.contains("Method not found"));
    }

    #[test]
    fn test_all_jsonrpc_error_codes() {
        let errors = vec![
            (JsonRpcErrorData::parse_error(), -32700),
            (JsonRpcErrorData::invalid_request("test"), -32600),
            (JsonRpcErrorData::method_not_found("test"), -32601),
            (JsonRpcErrorData::invalid_params("test"), -32602),
            (JsonRpcErrorData::internal_error("test"), -32603),
        ];

        for (error, expected_code) in errors {
            assert_eq!(error.code, expected_code);
            assert!(!error.message.is_empty());
        }
    }

    #[test]
    fn test_error_serialization_skips_missing_data() {
        let error = JsonRpcErrorData::new(-32000, "Custom error");
        let serialized = serde_json::to_string(&error).unwrap();
        assert_eq!(serialized, r#"{"code":-32000,"message":"Custom error"}"#);
    }

    #[test]
    fn test_to_error_data_mapping() {
        assert_eq!(Error::MalformedJson("x".into()).to_error_data().code, PARSE_ERROR);
        assert_eq!(Error::EmptyInput.to_error_data().code, PARSE_ERROR);
        assert_eq!(Error::MissingMethod.to_error_data().code, INVALID_REQUEST);
        assert_eq!(Error::InvalidParams("true".into()).to_error_data().code, INVALID_PARAMS);
        assert_eq!(Error::BufferReleased("result").to_error_data().code, SERVER_SIDE_EXCEPTION);

        let nested = Error::MissingBody.at_index(3);
        let data = nested.to_error_data();
        assert_eq!(data.code, INVALID_REQUEST);
        assert!(data.message.contains("element 3"));
    }

    #[test]
    fn test_element_error_source_chain() {
        let err = Error::ConflictingBody.at_index(1);
        let source = std::error::Error::source(&err).map(|s| s.to_string());
        assert_eq!(source, Some(Error::ConflictingBody.to_string()));
    }
}
