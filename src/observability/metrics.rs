//! # Metrics Collection
//!
//! Prometheus counters for the rate gate, authentication outcomes and the
//! user cache. Recording is a no-op until [`init_metrics`] has run.

use std::net::SocketAddr;

use ::tracing::{info, warn};
use metrics::{counter, describe_counter, Unit};
use metrics_exporter_prometheus::PrometheusBuilder;
use once_cell::sync::OnceCell;

use crate::config::ObservabilityConfig;
use crate::errors::{Error, Result};

/// Handle over the gate, auth and cache counters.
#[derive(Debug, Clone, Default)]
pub struct MetricsRecorder;

impl MetricsRecorder {
    pub fn new() -> Self {
        Self
    }

    pub fn record_rate_limit_decision(&self, allowed: bool) {
        let decision = if allowed { "admitted" } else { "rejected" };
        counter!("rate_limit_decisions_total", "decision" => decision).increment(1);
    }

    /// Count one session-gate outcome (`success`, `missing_bearer`, ...).
    pub fn record_authentication(&self, status: &str) {
        let labels = [("outcome", status.to_string())];
        counter!("session_gate_outcomes_total", &labels).increment(1);
    }

    pub fn record_cache_lookup(&self, outcome: &str) {
        let labels = [("outcome", outcome.to_string())];
        counter!("user_cache_lookups_total", &labels).increment(1);
    }

    /// Zero every known series so scrapes see them before the first event.
    pub fn register_metrics(&self) {
        describe_counter!(
            "rate_limit_decisions_total",
            Unit::Count,
            "Rate gate decisions grouped by outcome"
        );
        describe_counter!(
            "session_gate_outcomes_total",
            Unit::Count,
            "Session gate results grouped by outcome"
        );
        describe_counter!(
            "user_cache_lookups_total",
            Unit::Count,
            "User cache lookups grouped by hit, miss or error"
        );

        for decision in ["admitted", "rejected"] {
            counter!("rate_limit_decisions_total", "decision" => decision).absolute(0);
        }

        const OUTCOMES: &[&str] = &[
            "success",
            "missing_bearer",
            "malformed",
            "invalid_token",
            "unknown_subject",
            "forbidden",
            "error",
        ];
        for outcome in OUTCOMES {
            counter!("session_gate_outcomes_total", "outcome" => *outcome).absolute(0);
        }

        for outcome in ["hit", "miss", "error"] {
            counter!("user_cache_lookups_total", "outcome" => outcome).absolute(0);
        }
    }
}

static METRICS: OnceCell<MetricsRecorder> = OnceCell::new();

/// Install the Prometheus exporter when metrics are enabled.
pub fn init_metrics(config: &ObservabilityConfig) -> Result<()> {
    if !config.enable_metrics {
        return Ok(());
    }

    let metrics_addr = match config.metrics_bind_address() {
        Some(addr) => addr,
        None => {
            warn!("Metrics disabled: no bind address configured");
            return Ok(());
        }
    };

    let socket_addr: SocketAddr = metrics_addr.parse().map_err(|e| {
        Error::config(format!("Invalid metrics bind address '{}': {}", metrics_addr, e))
    })?;

    PrometheusBuilder::new()
        .with_http_listener(socket_addr)
        .add_global_label("service", &config.service_name)
        .install()
        .map_err(|e| Error::config(format!("Failed to initialize metrics exporter: {}", e)))?;

    let recorder = METRICS.get_or_init(MetricsRecorder::new);
    recorder.register_metrics();

    info!(
        metrics_addr = %metrics_addr,
        service_name = %config.service_name,
        "Metrics collection initialized"
    );

    Ok(())
}

/// Recorder installed by [`init_metrics`], if any.
pub fn get_metrics() -> Option<&'static MetricsRecorder> {
    METRICS.get()
}

pub fn record_rate_limit_decision(allowed: bool) {
    if let Some(metrics) = get_metrics() {
        metrics.record_rate_limit_decision(allowed);
    }
}

pub fn record_authentication(status: &str) {
    if let Some(metrics) = get_metrics() {
        metrics.record_authentication(status);
    }
}

pub fn record_cache_lookup(outcome: &str) {
    if let Some(metrics) = get_metrics() {
        metrics.record_cache_lookup(outcome);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_without_exporter_is_a_no_op() {
        record_rate_limit_decision(false);
        record_authentication("success");
        record_cache_lookup("miss");
    }

    #[test]
    fn disabled_metrics_skip_exporter() {
        let config = ObservabilityConfig { enable_metrics: false, ..Default::default() };
        assert!(init_metrics(&config).is_ok());
        assert!(get_metrics().is_none());
    }
}
