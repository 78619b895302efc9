use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::OnceLock;
use std::time::Duration;

pub struct Metrics {
    registry: Registry,
    pub http_requests_total: IntCounterVec,
    pub http_request_duration_seconds: HistogramVec,
    pub analyses_total: IntCounterVec,
    pub analysis_duration_seconds: HistogramVec,
}

static METRICS: OnceLock<Metrics> = OnceLock::new();

impl Metrics {
    fn build() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let http_requests_total = IntCounterVec::new(
            Opts::new("http_requests_total", "Total number of HTTP requests"),
            &["method", "path", "status"],
        )?;
        let http_request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "http_request_duration_seconds",
                "HTTP request duration in seconds",
            ),
            &["method", "path", "status"],
        )?;
        let analyses_total = IntCounterVec::new(
            Opts::new(
                "radiograph_analyses_total",
                "Radiograph analyses by outcome",
            ),
            &["outcome"],
        )?;
        let analysis_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "radiograph_analysis_duration_seconds",
                "Duration of the outbound analysis call in seconds",
            )
            .buckets(vec![1.0, 2.5, 5.0, 10.0, 20.0, 40.0, 60.0, 120.0]),
            &["outcome"],
        )?;

        registry.register(Box::new(http_requests_total.clone()))?;
        registry.register(Box::new(http_request_duration_seconds.clone()))?;
        registry.register(Box::new(analyses_total.clone()))?;
        registry.register(Box::new(analysis_duration_seconds.clone()))?;

        Ok(Self {
            registry,
            http_requests_total,
            http_request_duration_seconds,
            analyses_total,
            analysis_duration_seconds,
        })
    }
}

/// Register all collectors. Safe to call more than once.
pub fn init_metrics() -> Result<(), prometheus::Error> {
    if METRICS.get().is_none() {
        let metrics = Metrics::build()?;
        let _ = METRICS.set(metrics);
    }
    Ok(())
}

/// Registered collectors, if `init_metrics` has run.
pub fn metrics() -> Option<&'static Metrics> {
    METRICS.get()
}

pub fn record_analysis(outcome: &str, elapsed: Duration) {
    if let Some(m) = metrics() {
        m.analyses_total.with_label_values(&[outcome]).inc();
        m.analysis_duration_seconds
            .with_label_values(&[outcome])
            .observe(elapsed.as_secs_f64());
    }
}

pub fn record_request(method: &str, path: &str, status: &str, elapsed: Duration) {
    if let Some(m) = metrics() {
        let labels = [method, path, status];
        m.http_requests_total.with_label_values(&labels).inc();
        m.http_request_duration_seconds
            .with_label_values(&labels)
            .observe(elapsed.as_secs_f64());
    }
}

/// Text exposition of the registry.
pub fn gather() -> Result<String, prometheus::Error> {
    let Some(m) = metrics() else {
        return Ok(String::new());
    };

    let mut buffer = Vec::new();
    TextEncoder::new().encode(&m.registry.gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}
