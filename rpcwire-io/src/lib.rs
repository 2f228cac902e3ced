//! Byte sources, limits and metrics for the rpcwire codec
//!
//! `rpcwire-core` works on byte slices. This crate adds what a host needs
//! around it:
//!
//! - [`CodecConfig`]: message and batch ceilings, overridable from the
//!   environment
//! - [`read_all`] / [`read_all_async`]: bounded readers for blocking and
//!   tokio sources
//! - [`Codec`]: reads, decodes and encodes under a config
//! - [`CodecMetrics`]: OpenTelemetry instruments for codec activity

pub mod codec;
pub mod config;
pub mod metrics;
pub mod reader;

pub use codec::Codec;
pub use config::CodecConfig;
pub use metrics::CodecMetrics;
pub use reader::{read_all, read_all_async};
