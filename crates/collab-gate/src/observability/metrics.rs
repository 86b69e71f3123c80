//! Metrics definitions for the gate.
//!
//! All metrics follow Prometheus naming conventions:
//! - `gate_` prefix
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded:
//! - `transport`: 2 values (websocket, socketio)
//! - `outcome`: `admitted` plus one value per `GateError` kind
//! - `status`: 3 values (success, error, timeout)
//!
//! Room names and user ids are never used as labels.

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Install the Prometheus recorder and return the handle used to render it.
///
/// Must be called before any metrics are recorded.
///
/// # Errors
///
/// Returns error if the recorder fails to install (e.g., already installed).
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        // Permission lookups are bounded by PERM_CHECK_TIMEOUT_MS (default 5s)
        .set_buckets_for_metric(
            Matcher::Prefix("gate_permission_lookup".to_string()),
            &[
                0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.000, 2.500, 5.000,
            ],
        )
        .map_err(|e| format!("Failed to set permission lookup buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {e}"))
}

/// Record the outcome of a connection attempt.
///
/// Metric: `gate_admissions_total`
/// Labels: `transport`, `outcome`
///
/// Outcomes: "admitted", "missing_credential", "invalid_credential",
/// "missing_identity", "permission_service_unavailable"
pub fn record_admission(transport: &str, outcome: &str) {
    counter!("gate_admissions_total",
        "transport" => transport.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// Record a permission service lookup.
///
/// Metric: `gate_permission_lookup_duration_seconds`, `gate_permission_lookups_total`
/// Labels: `status`
///
/// Status values: "success", "error", "timeout"
pub fn record_permission_lookup(status: &str, duration: Duration) {
    histogram!("gate_permission_lookup_duration_seconds",
        "status" => status.to_string()
    )
    .record(duration.as_secs_f64());

    counter!("gate_permission_lookups_total",
        "status" => status.to_string()
    )
    .increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    // These execute the recording functions against the global no-op recorder.

    #[test]
    fn test_record_admission() {
        record_admission("websocket", "admitted");
        record_admission("websocket", "missing_credential");
        record_admission("socketio", "invalid_credential");
        record_admission("socketio", "missing_identity");
        record_admission("websocket", "permission_service_unavailable");
    }

    #[test]
    fn test_record_permission_lookup() {
        record_permission_lookup("success", Duration::from_millis(12));
        record_permission_lookup("error", Duration::from_millis(3));
        record_permission_lookup("timeout", Duration::from_secs(5));
    }
}
