//! Core JSON-RPC 2.0 codec for rpcwire
//!
//! This crate converts between wire bytes and an in-memory message model
//! while enforcing the protocol's structural rules. It includes:
//!
//! - **Types**: [`Id`], [`Request`], [`Response`] and [`Message`]
//! - **Codec**: single-message and batch encode/decode plus the
//!   single-vs-batch dispatcher
//! - **Error handling**: codec errors and the lenient error-object decoder
//! - **Extraction**: path queries into a response result without a typed
//!   decode
//! - **Observability**: tracing/OpenTelemetry bootstrap for host programs
//!
//! # Two-phase decode
//!
//! Decoding validates the envelope up front (version, method, id type,
//! exactly one of `result`/`error`) and keeps `result` and `error` as raw
//! JSON spans. The error object is resolved on first access behind a
//! run-once guard; the result is only decoded when a caller asks for it, so
//! forwarding a large result costs a copy, not a parse.
//!
//! # Example
//!
//! ```rust
//! use rpcwire_core::{codec, Id, Request, Response, WireMessage};
//! use serde_json::json;
//!
//! let request = Request::new("add", Some(json!({"a": 5, "b": 3})), Id::Integer(1));
//! let wire = codec::encode(&request).unwrap();
//! assert_eq!(codec::decode_request(wire.as_bytes()).unwrap(), request);
//!
//! let response = Response::decode(br#"{"jsonrpc":"2.0","id":1,"result":{"sum":8}}"#).unwrap();
//! assert_eq!(response.extract_i64(&["sum"]).unwrap(), 8);
//!
//! let mut sink = Vec::new();
//! response.write_to(&mut sink).unwrap();
//! assert_eq!(sink, response.to_vec().unwrap());
//! ```

pub mod codec;
mod envelope;
pub mod error;
mod extract;
pub mod observability;
pub mod response;
pub mod types;

pub use codec::{Packet, WireMessage};
pub use envelope::{JSONRPC_VERSION, RESERVED_PREFIX};
pub use error::{Error, JsonRpcErrorData, Result};
pub use observability::{init_observability, shutdown_observability, LogFormat, ObservabilityConfig};
pub use response::Response;
pub use types::{Id, Message, Request};
