//! Codec metrics definitions
//!
//! OpenTelemetry instruments recorded by [`Codec`](crate::Codec) when
//! metrics are attached. They are exported through whatever meter provider
//! the host installed, e.g. via `rpcwire_core::init_observability`.
//!
//! # Metrics Collected
//!
//! - **decoded_total**: messages decoded successfully (counter)
//! - **errors_total**: decode and encode failures by kind (counter)
//! - **batch_size**: batch length distribution (histogram)
//! - **bytes_read**: payload sizes handed to the decoder (histogram)
//! - **bytes_encoded**: payload sizes produced by the encoder (histogram)
//!
//! # Examples
//!
//! ```rust,no_run
//! use rpcwire_io::CodecMetrics;
//!
//! let metrics = CodecMetrics::new();
//! metrics.record_decoded(1, 512);
//! metrics.record_batch(10);
//! ```

use opentelemetry::{
    global,
    metrics::{Counter, Histogram, Meter},
    KeyValue,
};
use rpcwire_core::Error;

/// Codec metrics, all prefixed with `rpcwire.codec.*`
pub struct CodecMetrics {
    /// Messages decoded successfully
    pub decoded_total: Counter<u64>,
    /// Failures, labelled by error kind and direction
    pub errors_total: Counter<u64>,
    /// Number of elements per decoded batch
    pub batch_size: Histogram<u64>,
    /// Bytes handed to the decoder
    pub bytes_read: Histogram<u64>,
    /// Bytes produced by the encoder
    pub bytes_encoded: Histogram<u64>,
}

impl CodecMetrics {
    /// Instruments on the global `rpcwire.codec` meter
    pub fn new() -> Self {
        Self::new_with_meter(&global::meter("rpcwire.codec"))
    }

    pub fn new_with_meter(meter: &Meter) -> Self {
        Self {
            decoded_total: meter
                .u64_counter("rpcwire.codec.decoded.total")
                .with_description("Total number of messages decoded")
                .build(),
            errors_total: meter
                .u64_counter("rpcwire.codec.errors.total")
                .with_description("Total number of codec failures")
                .build(),
            batch_size: meter
                .u64_histogram("rpcwire.codec.batch.size")
                .with_description("Number of messages in decoded batches")
                .build(),
            bytes_read: meter
                .u64_histogram("rpcwire.codec.bytes.read")
                .with_description("Size of decoded payloads in bytes")
                .with_unit("By")
                .build(),
            bytes_encoded: meter
                .u64_histogram("rpcwire.codec.bytes.encoded")
                .with_description("Size of encoded payloads in bytes")
                .with_unit("By")
                .build(),
        }
    }

    /// Record a successful decode of `messages` messages from `bytes` bytes
    pub fn record_decoded(&self, messages: u64, bytes: u64) {
        self.decoded_total.add(messages, &[]);
        self.bytes_read.record(bytes, &[]);
    }

    pub fn record_batch(&self, size: u64) {
        self.batch_size.record(size, &[]);
    }

    pub fn record_encoded(&self, bytes: u64) {
        self.bytes_encoded.record(bytes, &[]);
    }

    /// Record a failure; `direction` is "decode" or "encode"
    pub fn record_error(&self, direction: &'static str, error: &Error) {
        let attributes = &[
            KeyValue::new("direction", direction),
            KeyValue::new("error_kind", error_kind(error)),
        ];
        self.errors_total.add(1, attributes);
    }
}

impl Default for CodecMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Stable low-cardinality label for an error
pub fn error_kind(error: &Error) -> &'static str {
    match error {
        Error::MalformedJson(_) => "malformed_json",
        Error::InvalidVersion(_) => "invalid_version",
        Error::MissingMethod => "missing_method",
        Error::ReservedMethod(_) => "reserved_method",
        Error::InvalidParams(_) => "invalid_params",
        Error::InvalidId(_) => "invalid_id",
        Error::MissingBody => "missing_body",
        Error::ConflictingBody => "conflicting_body",
        Error::EmptyBatch => "empty_batch",
        Error::NotAnArray => "not_an_array",
        Error::ElementError { source, .. } => error_kind(source),
        Error::PathNotFound(_) => "path_not_found",
        Error::TypeMismatch { .. } => "type_mismatch",
        Error::EmptyInput => "empty_input",
        Error::BufferReleased(_) => "buffer_released",
        Error::JsonRpc(_) => "json_rpc",
        Error::Serialization(_) => "serialization",
        Error::Io(_) => "io",
        Error::MessageTooLarge { .. } => "message_too_large",
        Error::BatchSizeExceeded { .. } => "batch_size_exceeded",
    }
}
