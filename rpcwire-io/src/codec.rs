//! Configured codec front end
//!
//! [`Codec`] applies a [`CodecConfig`] around the `rpcwire_core` entry
//! points: it enforces the byte and batch ceilings, reads whole payloads
//! from blocking or async sources and records [`CodecMetrics`] when they
//! are attached.
//!
//! ```rust
//! use rpcwire_io::{Codec, CodecConfig};
//! use rpcwire_core::{Message, Packet};
//!
//! let codec = Codec::new(CodecConfig::default().with_max_batch_size(8));
//! let packet: Packet<Message> = codec
//!     .read(&br#"{"jsonrpc":"2.0","id":1,"result":"ok"}"#[..])
//!     .unwrap();
//! assert!(!packet.is_batch());
//! ```

use crate::config::CodecConfig;
use crate::metrics::CodecMetrics;
use crate::reader::{read_all, read_all_async};
use rpcwire_core::{codec, Error, Packet, Result, WireMessage};
use std::io::{self, Read, Write};
use std::sync::Arc;
use tokio::io::AsyncRead;

/// Size-bounded decoder and encoder
#[derive(Clone, Default)]
pub struct Codec {
    config: CodecConfig,
    metrics: Option<Arc<CodecMetrics>>,
}

impl std::fmt::Debug for Codec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Codec")
            .field("config", &self.config)
            .field("metrics", &self.metrics.is_some())
            .finish()
    }
}

impl Codec {
    pub fn new(config: CodecConfig) -> Self {
        Self { config, metrics: None }
    }

    /// Record decode and encode activity on `metrics`
    pub fn with_metrics(mut self, metrics: Arc<CodecMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Decode a single message or a batch from an in-memory payload
    #[tracing::instrument(skip(self, data), fields(bytes = data.len()))]
    pub fn decode<T: WireMessage>(&self, data: &[u8]) -> Result<Packet<T>> {
        let decoded = self
            .check_size(data)
            .and_then(|()| codec::decode_packet_bounded(data, self.config.max_batch_size));

        match &decoded {
            Ok(packet) => {
                tracing::debug!(messages = packet.len(), batch = packet.is_batch(), "payload decoded");
                if let Some(metrics) = &self.metrics {
                    metrics.record_decoded(packet.len() as u64, data.len() as u64);
                    if packet.is_batch() {
                        metrics.record_batch(packet.len() as u64);
                    }
                }
            }
            Err(err) => {
                tracing::debug!(error = %err, "payload rejected");
                self.record_error("decode", err);
            }
        }
        decoded
    }

    /// Read `reader` to EOF and decode the payload
    pub fn read<T: WireMessage, R: Read>(&self, reader: R) -> Result<Packet<T>> {
        let data = read_all(reader, self.config.read_size_hint, self.config.max_message_size)
            .inspect_err(|err| self.record_error("decode", err))?;
        self.decode(&data)
    }

    /// Async variant of [`Codec::read`]
    pub async fn read_async<T: WireMessage, R: AsyncRead + Unpin>(&self, reader: R) -> Result<Packet<T>> {
        let data = read_all_async(reader, self.config.read_size_hint, self.config.max_message_size)
            .await
            .inspect_err(|err| self.record_error("decode", err))?;
        self.decode(&data)
    }

    /// Encode into a fresh buffer
    pub fn encode<T: WireMessage>(&self, packet: &Packet<T>) -> Result<Vec<u8>> {
        match packet.to_vec() {
            Ok(bytes) => {
                if let Some(metrics) = &self.metrics {
                    metrics.record_encoded(bytes.len() as u64);
                }
                Ok(bytes)
            }
            Err(err) => {
                self.record_error("encode", &err);
                Err(err)
            }
        }
    }

    /// Stream into `writer`, producing the same bytes as [`Codec::encode`]
    pub fn write<T: WireMessage, W: Write>(&self, packet: &Packet<T>, writer: W) -> Result<()> {
        let mut counting = CountingWriter { inner: writer, count: 0 };
        match packet.write_to(&mut counting) {
            Ok(()) => {
                if let Some(metrics) = &self.metrics {
                    metrics.record_encoded(counting.count);
                }
                Ok(())
            }
            Err(err) => {
                self.record_error("encode", &err);
                Err(err)
            }
        }
    }

    fn check_size(&self, data: &[u8]) -> Result<()> {
        if data.len() > self.config.max_message_size {
            tracing::warn!(
                bytes = data.len(),
                limit = self.config.max_message_size,
                "payload exceeds size ceiling"
            );
            return Err(Error::MessageTooLarge {
                limit: self.config.max_message_size,
            });
        }
        Ok(())
    }

    fn record_error(&self, direction: &'static str, err: &Error) {
        if let Some(metrics) = &self.metrics {
            metrics.record_error(direction, err);
        }
    }
}

struct CountingWriter<W> {
    inner: W,
    count: u64,
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.count += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
