//! Logging and metrics for NutriVision
//!
//! - Structured logging with `tracing`, filtered by `RUST_LOG` or the
//!   `[telemetry]` config section
//! - In-process counters and histograms for extraction uploads
//! - Timers that record into the histograms

use nutrivision_core::config::TelemetrySection;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use uuid::Uuid;

/// Submissions attempted
pub const EXTRACTION_SUBMITTED: &str = "extraction.submitted";
/// Submissions that produced a result
pub const EXTRACTION_SUCCEEDED: &str = "extraction.succeeded";
/// Submissions that failed
pub const EXTRACTION_FAILED: &str = "extraction.failed";
/// Upload round-trip time, milliseconds
pub const EXTRACTION_DURATION: &str = "extraction.duration_ms";

/// Global metrics registry
static METRICS: Lazy<MetricsRegistry> = Lazy::new(MetricsRegistry::new);

/// Global session ID for correlating logs
static SESSION_ID: Lazy<String> = Lazy::new(|| Uuid::new_v4().to_string());

/// Initialize the telemetry system
pub fn init() -> anyhow::Result<()> {
    init_with_config(TelemetryConfig::default())
}

/// Initialize with custom configuration
pub fn init_with_config(config: TelemetryConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .map_err(|e| anyhow::anyhow!("Invalid log level {:?}: {}", config.log_level, e))?;

    let registry = tracing_subscriber::registry().with(filter);
    let result = match config.format {
        LogFormat::Compact => registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(config.show_target)
                    .compact(),
            )
            .try_init(),
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(config.show_target)
                    .json(),
            )
            .try_init(),
    };
    result.map_err(|e| anyhow::anyhow!("Failed to set tracing subscriber: {}", e))?;

    tracing::debug!(
        session_id = %session_id(),
        version = env!("CARGO_PKG_VERSION"),
        "Telemetry initialized"
    );

    Ok(())
}

/// Get the current session ID
pub fn session_id() -> &'static str {
    &SESSION_ID
}

/// Log line format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable single line
    #[default]
    Compact,
    /// One JSON object per line
    Json,
}

/// Telemetry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Filter used when `RUST_LOG` is unset
    pub log_level: String,
    /// Line format
    pub format: LogFormat,
    /// Include the event target
    pub show_target: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            format: LogFormat::default(),
            show_target: false,
        }
    }
}

impl TelemetryConfig {
    /// From the `[telemetry]` section of `nutrivision.toml`.
    pub fn from_section(section: &TelemetrySection) -> Self {
        Self {
            log_level: section.log_level.clone(),
            ..Self::default()
        }
    }

    /// Override the filter, e.g. from `--verbose`.
    #[must_use]
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Set the line format.
    #[must_use]
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }
}

/// Metrics registry for collecting and exporting metrics
pub struct MetricsRegistry {
    counters: RwLock<BTreeMap<String, AtomicU64>>,
    histograms: RwLock<BTreeMap<String, Vec<f64>>>,
    start_time: Instant,
}

impl MetricsRegistry {
    fn new() -> Self {
        Self {
            counters: RwLock::new(BTreeMap::new()),
            histograms: RwLock::new(BTreeMap::new()),
            start_time: Instant::now(),
        }
    }

    /// Increment a counter
    pub fn increment(&self, name: &str) {
        self.increment_by(name, 1);
    }

    /// Increment a counter by a specific amount
    pub fn increment_by(&self, name: &str, value: u64) {
        let counters = self.counters.read().unwrap_or_else(PoisonError::into_inner);
        if let Some(counter) = counters.get(name) {
            counter.fetch_add(value, Ordering::Relaxed);
        } else {
            drop(counters);
            let mut counters = self.counters.write().unwrap_or_else(PoisonError::into_inner);
            counters
                .entry(name.to_string())
                .or_insert_with(|| AtomicU64::new(0))
                .fetch_add(value, Ordering::Relaxed);
        }
    }

    /// Current value of a counter; zero if never incremented
    pub fn counter(&self, name: &str) -> u64 {
        self.counters
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .map_or(0, |c| c.load(Ordering::Relaxed))
    }

    /// Record a histogram value
    pub fn histogram(&self, name: &str, value: f64) {
        let mut histograms = self.histograms.write().unwrap_or_else(PoisonError::into_inner);
        histograms.entry(name.to_string()).or_default().push(value);
    }

    /// Summary of a histogram
    pub fn histogram_stats(&self, name: &str) -> Option<HistogramStats> {
        self.histograms
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .map(|values| HistogramStats::from_values(values))
    }

    /// Count one finished extraction.
    pub fn record_extraction(&self, succeeded: bool) {
        self.increment(EXTRACTION_SUBMITTED);
        self.increment(if succeeded {
            EXTRACTION_SUCCEEDED
        } else {
            EXTRACTION_FAILED
        });
    }

    /// Get uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Export metrics as JSON
    pub fn export_json(&self) -> serde_json::Value {
        let counters = self.counters.read().unwrap_or_else(PoisonError::into_inner);
        let histograms = self.histograms.read().unwrap_or_else(PoisonError::into_inner);

        let counter_values: BTreeMap<&str, u64> = counters
            .iter()
            .map(|(k, v)| (k.as_str(), v.load(Ordering::Relaxed)))
            .collect();

        let histogram_stats: BTreeMap<&str, HistogramStats> = histograms
            .iter()
            .map(|(k, v)| (k.as_str(), HistogramStats::from_values(v)))
            .collect();

        serde_json::json!({
            "session_id": session_id(),
            "uptime_secs": self.uptime_secs(),
            "counters": counter_values,
            "histograms": histogram_stats,
        })
    }
}

/// Histogram statistics
#[derive(Debug, Clone, Serialize)]
pub struct HistogramStats {
    /// Number of samples
    pub count: usize,
    /// Smallest sample
    pub min: f64,
    /// Largest sample
    pub max: f64,
    /// Arithmetic mean
    pub mean: f64,
    /// Median
    pub p50: f64,
    /// 95th percentile
    pub p95: f64,
}

impl HistogramStats {
    #[allow(clippy::cast_precision_loss)]
    fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self {
                count: 0,
                min: 0.0,
                max: 0.0,
                mean: 0.0,
                p50: 0.0,
                p95: 0.0,
            };
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        let count = sorted.len();
        let sum: f64 = sorted.iter().sum();

        Self {
            count,
            min: sorted[0],
            max: sorted[count - 1],
            mean: sum / count as f64,
            p50: percentile(&sorted, 50.0),
            p95: percentile(&sorted, 95.0),
        }
    }
}

#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let idx = ((p / 100.0) * (sorted.len() - 1) as f64).round() as usize;
    sorted[idx.min(sorted.len() - 1)]
}

/// Get the global metrics registry
pub fn metrics() -> &'static MetricsRegistry {
    &METRICS
}

/// Timer for measuring operation duration
///
/// Records into the histogram named at start, either on [`stop`](Self::stop)
/// or when dropped.
pub struct Timer {
    name: String,
    start: Instant,
    recorded: bool,
}

impl Timer {
    /// Start a new timer
    pub fn start(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            start: Instant::now(),
            recorded: false,
        }
    }

    /// Stop the timer and record the duration
    pub fn stop(mut self) -> Duration {
        self.record()
    }

    fn record(&mut self) -> Duration {
        let duration = self.start.elapsed();
        if !self.recorded {
            self.recorded = true;
            metrics().histogram(&self.name, duration.as_secs_f64() * 1000.0);
            tracing::debug!(
                metric = %self.name,
                duration_ms = duration.as_millis(),
                "Timer completed"
            );
        }
        duration
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        self.record();
    }
}
