//! Logging and telemetry bootstrap for applications embedding rpcwire
//!
//! The codec itself only emits `tracing` events: `debug` for decode and
//! encode outcomes, `trace` for lazy resolution passes and `warn` when an
//! error payload has to be kept verbatim. This module routes those events
//! to a log formatter and, optionally, to an OTLP collector.
//!
//! # Usage Pattern
//!
//! ```rust,no_run
//! use rpcwire_core::observability::{LogFormat, ObservabilityConfig};
//!
//! fn main() {
//!     let config = ObservabilityConfig::new("rpc-gateway")
//!         .with_log_format(LogFormat::Compact)
//!         .with_log_level("rpcwire_core=debug,info");
//!
//!     rpcwire_core::init_observability(config).expect("Failed to init observability");
//!
//!     // ... decode and forward messages ...
//!
//!     rpcwire_core::shutdown_observability();
//! }
//! ```
//!
//! # Environment Variables
//!
//! - `OTEL_EXPORTER_OTLP_ENDPOINT`: Collector endpoint
//! - `RPCWIRE_LOG_FORMAT`: `json`, `compact` or `pretty`
//! - `RUST_LOG`: Log filter, takes precedence over the configured level

use opentelemetry::{global, KeyValue};
use opentelemetry_sdk::Resource;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub const LOG_FORMAT_ENV: &str = "RPCWIRE_LOG_FORMAT";

/// How log lines are rendered on stdout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One JSON object per event
    #[default]
    Json,
    /// Single-line human readable output
    Compact,
    /// Multi-line human readable output
    Pretty,
}

impl LogFormat {
    fn from_env() -> Self {
        match std::env::var(LOG_FORMAT_ENV).as_deref() {
            Ok("compact") => LogFormat::Compact,
            Ok("pretty") => LogFormat::Pretty,
            _ => LogFormat::Json,
        }
    }
}

/// Observability configuration
///
/// Local logs are on by default; OTLP export of spans and metrics is off
/// until enabled.
///
/// ```rust
/// use rpcwire_core::ObservabilityConfig;
///
/// let config = ObservabilityConfig::new("rpc-gateway")
///     .with_traces(true)
///     .with_trace_sample_ratio(0.1);
/// assert!(config.enable_traces);
/// assert_eq!(config.trace_sample_ratio, 0.1);
/// ```
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    /// Reported as `service.name`
    pub service_name: String,
    /// Reported as `service.version`
    pub service_version: String,
    /// gRPC endpoint of the OTLP collector
    pub otlp_endpoint: String,
    pub enable_traces: bool,
    /// Export metrics over OTLP (codec counters live in `rpcwire-io`)
    pub enable_metrics: bool,
    pub enable_logs: bool,
    pub log_format: LogFormat,
    /// Filter directive used when `RUST_LOG` is unset
    pub log_level: String,
    /// Fraction of root spans kept, clamped to `0.0..=1.0`
    pub trace_sample_ratio: f64,
    pub metric_export_interval: Duration,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        let endpoint = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT");
        Self {
            service_name: "rpcwire".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            otlp_endpoint: endpoint.unwrap_or_else(|_| "http://localhost:4317".to_string()),
            enable_traces: false,
            enable_metrics: false,
            enable_logs: true,
            log_format: LogFormat::from_env(),
            log_level: "info".to_string(),
            trace_sample_ratio: 1.0,
            metric_export_interval: Duration::from_secs(30),
        }
    }
}

impl ObservabilityConfig {
    pub fn new(service_name: impl Into<String>) -> Self {
        let mut config = Self::default();
        config.service_name = service_name.into();
        config
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.otlp_endpoint = endpoint.into();
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.service_version = version.into();
        self
    }

    pub fn with_traces(mut self, on: bool) -> Self {
        self.enable_traces = on;
        self
    }

    pub fn with_metrics(mut self, on: bool) -> Self {
        self.enable_metrics = on;
        self
    }

    pub fn with_logs(mut self, on: bool) -> Self {
        self.enable_logs = on;
        self
    }

    pub fn with_log_format(mut self, format: LogFormat) -> Self {
        self.log_format = format;
        self
    }

    pub fn with_log_level(mut self, directive: impl Into<String>) -> Self {
        self.log_level = directive.into();
        self
    }

    pub fn with_trace_sample_ratio(mut self, ratio: f64) -> Self {
        self.trace_sample_ratio = ratio.clamp(0.0, 1.0);
        self
    }

    pub fn with_metric_export_interval(mut self, interval: Duration) -> Self {
        self.metric_export_interval = interval;
        self
    }

    fn resource(&self) -> Resource {
        use opentelemetry_semantic_conventions::resource::{SERVICE_NAME, SERVICE_VERSION};

        Resource::builder_empty()
            .with_attributes([
                KeyValue::new(SERVICE_NAME, self.service_name.clone()),
                KeyValue::new(SERVICE_VERSION, self.service_version.clone()),
            ])
            .build()
    }
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

fn log_layer(format: LogFormat) -> BoxedLayer {
    let base = tracing_subscriber::fmt::layer().with_target(true).with_line_number(true);
    match format {
        LogFormat::Json => base.with_thread_ids(true).json().boxed(),
        LogFormat::Compact => base.compact().boxed(),
        LogFormat::Pretty => base.pretty().boxed(),
    }
}

/// Install the global subscriber and, if enabled, the OTLP providers.
///
/// Fails if a global subscriber is already installed.
pub fn init_observability(config: ObservabilityConfig) -> Result<(), BoxError> {
    let tracer = config.enable_traces.then(|| span_pipeline(&config)).transpose()?;
    if config.enable_metrics {
        metric_pipeline(&config)?;
    }

    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.log_level))?;
    let logs = config.enable_logs.then(|| log_layer(config.log_format));
    let spans = tracer.map(|tracer| tracing_opentelemetry::layer().with_tracer(tracer));

    tracing_subscriber::registry().with(logs).with(filter).with(spans).try_init()?;

    tracing::info!(
        service = %config.service_name,
        endpoint = %config.otlp_endpoint,
        format = ?config.log_format,
        traces = config.enable_traces,
        metrics = config.enable_metrics,
        "rpcwire observability initialized"
    );
    Ok(())
}

fn span_pipeline(config: &ObservabilityConfig) -> Result<opentelemetry_sdk::trace::Tracer, BoxError> {
    use opentelemetry::trace::TracerProvider as _;
    use opentelemetry_otlp::WithExportConfig;
    use opentelemetry_sdk::trace::{Sampler, SdkTracerProvider};

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(config.otlp_endpoint.clone())
        .build()?;

    let sampler = Sampler::ParentBased(Box::new(Sampler::TraceIdRatioBased(config.trace_sample_ratio)));
    let provider = SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_resource(config.resource())
        .with_sampler(sampler)
        .build();

    let tracer = provider.tracer(config.service_name.clone());
    global::set_tracer_provider(provider);
    Ok(tracer)
}

fn metric_pipeline(config: &ObservabilityConfig) -> Result<(), BoxError> {
    use opentelemetry_otlp::WithExportConfig;
    use opentelemetry_sdk::metrics::{PeriodicReader, SdkMeterProvider};

    let exporter = opentelemetry_otlp::MetricExporter::builder()
        .with_tonic()
        .with_endpoint(config.otlp_endpoint.clone())
        .build()?;

    let reader = PeriodicReader::builder(exporter)
        .with_interval(config.metric_export_interval)
        .build();
    global::set_meter_provider(
        SdkMeterProvider::builder()
            .with_reader(reader)
            .with_resource(config.resource())
            .build(),
    );
    Ok(())
}

/// Log the shutdown. SDK providers flush when dropped.
pub fn shutdown_observability() {
    tracing::info!("rpcwire observability shut down");
}
