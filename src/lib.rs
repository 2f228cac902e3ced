//! rpcwire - JSON-RPC 2.0 wire codec
//!
//! This is the convenience crate that re-exports the rpcwire sub-crates.
//! Use it if you want a single dependency for decoding, encoding and
//! reading JSON-RPC payloads.
//!
//! # Architecture
//!
//! - **rpcwire-core**: message model, error model, batch codec, dispatcher,
//!   path extraction and streaming encode
//! - **rpcwire-io**: size limits, blocking/async byte sources and codec
//!   metrics
//!
//! # Quick Start - Forwarding
//!
//! ```rust
//! use rpcwire::{Codec, CodecConfig, Message, Packet};
//!
//! let codec = Codec::new(CodecConfig::default());
//! let wire = br#"{"jsonrpc":"2.0","id":"a","result":{"balance":"0x10","blocks":[1,2]}}"#;
//!
//! let packet: Packet<Message> = codec.decode(wire).unwrap();
//! let response = packet.iter().next().and_then(Message::as_response).unwrap();
//! assert_eq!(response.extract_string(&["balance"]).unwrap(), "0x10");
//!
//! let mut out = Vec::new();
//! codec.write(&packet, &mut out).unwrap();
//! assert_eq!(out, wire);
//! ```
//!
//! # Quick Start - Async Source
//!
//! ```rust,no_run
//! use rpcwire::{Codec, CodecConfig, Packet, Request};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let codec = Codec::new(CodecConfig::default().with_max_batch_size(100));
//!     let packet: Packet<Request> = codec.read_async(tokio::io::stdin()).await?;
//!
//!     for request in packet.iter() {
//!         println!("{} notification={}", request.method(), request.is_notification());
//!     }
//!     Ok(())
//! }
//! ```

pub use rpcwire_core as core;
pub use rpcwire_io as io;

// Convenience re-exports of the most commonly used types
pub use rpcwire_core::{
    codec, init_observability, shutdown_observability, Error, Id, JsonRpcErrorData, Message,
    ObservabilityConfig, Packet, Request, Response, Result, WireMessage,
};
pub use rpcwire_io::{read_all, read_all_async, Codec, CodecConfig, CodecMetrics};
