use opentelemetry::global;
use opentelemetry::metrics::{Counter, Gauge, Histogram, Meter};
use opentelemetry::KeyValue;
use opentelemetry_sdk::metrics::SdkMeterProvider;
use prometheus::Registry;
use std::sync::Arc;

pub mod labels {
    pub const ERROR_TYPE: &str = "error_type";
    pub const ROUTE: &str = "route";
    pub const METHOD: &str = "method";
    pub const STATUS_CODE: &str = "status_code";
    pub const BACKEND_ADDRESS: &str = "backend_address";
    pub const VERSION: &str = "version";
    pub const RUST_VERSION: &str = "rust_version";
}

pub mod values {
    pub const ERROR_NO_ROUTE: &str = "no_matching_route";
    pub const ERROR_THROTTLE: &str = "upload_throttle";
    pub const ERROR_BACKEND: &str = "backend_error";
}

#[derive(Clone)]
pub struct Metrics {
    pub requests_total: Counter<u64>,
    pub requests_duration_seconds: Histogram<f64>,

    // Upload throughput
    pub upload_bytes_received_total: Counter<u64>,

    // Throttle activity
    pub throttle_pauses_total: Counter<u64>,
    pub throttle_delay_seconds: Histogram<f64>,
    pub throttle_failures_total: Counter<u64>,

    pub backend_errors_total: Counter<u64>,
    pub errors_total: Counter<u64>,

    // Build info
    pub build_info: Gauge<u64>,
}

impl Metrics {
    pub fn new(meter: Meter) -> Self {
        Self {
            requests_total: meter
                .u64_counter("upload_requests_total")
                .with_description("Total number of proxied requests")
                .build(),
            requests_duration_seconds: meter
                .f64_histogram("upload_request_duration_seconds")
                .with_description("Request duration including throttled body transfer")
                .with_unit("s")
                .build(),
            upload_bytes_received_total: meter
                .u64_counter("upload_bytes_received_total")
                .with_description("Request body bytes accepted from clients")
                .with_unit("By")
                .build(),
            throttle_pauses_total: meter
                .u64_counter("upload_throttle_pauses_total")
                .with_description("Times a request body was paused to honor its upload rate")
                .build(),
            throttle_delay_seconds: meter
                .f64_histogram("upload_throttle_delay_seconds")
                .with_description("Length of each upload pause")
                .with_unit("s")
                .build(),
            throttle_failures_total: meter
                .u64_counter("upload_throttle_failures_total")
                .with_description("Requests aborted because a pause could not be set up or lifted")
                .build(),
            backend_errors_total: meter
                .u64_counter("upload_backend_errors_total")
                .with_description("Backend request failures")
                .build(),
            errors_total: meter
                .u64_counter("upload_errors_total")
                .with_description("Requests answered with a synthetic error response")
                .build(),
            build_info: meter
                .u64_gauge("upload_build_info")
                .with_description("Build information")
                .build(),
        }
    }

    /// Set build info metric with version labels
    pub fn set_build_info(&self) {
        let version = env!("CARGO_PKG_VERSION");
        let rust_version = env!("CARGO_PKG_RUST_VERSION");

        self.build_info.record(
            1,
            &[
                KeyValue::new(labels::VERSION, version),
                KeyValue::new(labels::RUST_VERSION, rust_version),
            ],
        );
    }

    pub fn record_request(&self, method: &str, status_code: u16, route: &str, duration: f64) {
        let attrs = [
            KeyValue::new(labels::METHOD, method.to_string()),
            KeyValue::new(labels::STATUS_CODE, status_code.to_string()),
            KeyValue::new(labels::ROUTE, route.to_string()),
        ];
        self.requests_total.add(1, &attrs);
        self.requests_duration_seconds.record(duration, &attrs);
    }

    pub fn record_upload_bytes(&self, bytes: u64, route: &str) {
        self.upload_bytes_received_total
            .add(bytes, &[KeyValue::new(labels::ROUTE, route.to_string())]);
    }

    pub fn record_throttle_pause(&self, route: &str, delay_secs: f64) {
        let attrs = [KeyValue::new(labels::ROUTE, route.to_string())];
        self.throttle_pauses_total.add(1, &attrs);
        self.throttle_delay_seconds.record(delay_secs, &attrs);
    }

    pub fn record_throttle_failure(&self, route: &str) {
        self.throttle_failures_total
            .add(1, &[KeyValue::new(labels::ROUTE, route.to_string())]);
    }

    pub fn record_backend_error(&self, backend: &str) {
        self.backend_errors_total
            .add(1, &[KeyValue::new(labels::BACKEND_ADDRESS, backend.to_string())]);
    }

    pub fn record_error(&self, error_type: &str) {
        self.errors_total
            .add(1, &[KeyValue::new(labels::ERROR_TYPE, error_type.to_string())]);
    }
}

pub fn init_metrics() -> Result<(Arc<Metrics>, Registry), Box<dyn std::error::Error + Send + Sync>>
{
    let registry = Registry::default();

    let exporter = opentelemetry_prometheus::exporter()
        .with_registry(registry.clone())
        .build()?;

    let meter_provider = SdkMeterProvider::builder().with_reader(exporter).build();

    global::set_meter_provider(meter_provider);

    let meter = global::meter("upload-limit");
    let metrics = Arc::new(Metrics::new(meter));

    metrics.set_build_info();

    Ok((metrics, registry))
}
