// Copyright PingCAP Inc. 2025.
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; version 2 of the License.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

/// Prometheus metrics definitions for twinkv
use lazy_static::lazy_static;
use prometheus::{
    register_counter_vec, register_gauge_vec, register_histogram_vec, CounterVec, GaugeVec,
    HistogramVec, TextEncoder,
};
use std::time::Instant;

use crate::store::StoreError;

lazy_static! {
    // ============================================================================
    // HTTP Metrics
    // ============================================================================

    /// HTTP request count
    pub static ref HTTP_REQUESTS_TOTAL: CounterVec = register_counter_vec!(
        "http_requests_total",
        "Total number of HTTP requests",
        &["method", "endpoint", "status"]
    ).unwrap();

    // ============================================================================
    // Store Metrics
    // ============================================================================

    /// Store operation duration in seconds, measured inside the engine
    pub static ref STORE_OP_DURATION: HistogramVec = register_histogram_vec!(
        "store_operation_duration_seconds",
        "Store operation duration in seconds",
        &["engine", "operation"],
        vec![0.00001, 0.00005, 0.0001, 0.0005, 0.001, 0.005, 0.010, 0.050, 0.100, 0.500]
    ).unwrap();

    /// Store operation count by outcome
    pub static ref STORE_OPS_TOTAL: CounterVec = register_counter_vec!(
        "store_operations_total",
        "Total number of store operations",
        &["engine", "operation", "outcome"]
    ).unwrap();

    /// Lock wait duration in seconds (rwmutex engine)
    pub static ref STORE_LOCK_WAIT: HistogramVec = register_histogram_vec!(
        "store_lock_wait_duration_seconds",
        "Store lock wait duration in seconds",
        &["lock_type"],
        vec![0.00001, 0.0001, 0.0005, 0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.500]
    ).unwrap();

    /// Number of entries held by the store
    pub static ref STORE_ENTRIES: GaugeVec = register_gauge_vec!(
        "store_entries",
        "Number of entries in the store",
        &["engine"]
    ).unwrap();
}

/// Label for an operation result
pub fn outcome_label<T>(res: &Result<T, StoreError>) -> &'static str {
    match res {
        Ok(_) => "ok",
        Err(StoreError::NotFound(_)) => "not_found",
        Err(StoreError::MaxCapacity { .. }) => "max_capacity",
        Err(StoreError::Cancelled) => "cancelled",
        Err(StoreError::Closed) => "closed",
    }
}

/// Record one store operation: its duration and its outcome
pub fn record_store_op<T>(
    engine: &str,
    operation: &str,
    res: &Result<T, StoreError>,
    start: Instant,
) {
    STORE_OP_DURATION
        .with_label_values(&[engine, operation])
        .observe(start.elapsed().as_secs_f64());
    STORE_OPS_TOTAL
        .with_label_values(&[engine, operation, outcome_label(res)])
        .inc();
}

/// Record lock wait duration
pub fn record_lock_wait(lock_type: &str, duration: f64) {
    STORE_LOCK_WAIT
        .with_label_values(&[lock_type])
        .observe(duration);
}

pub fn set_entries(engine: &str, entries: usize) {
    STORE_ENTRIES
        .with_label_values(&[engine])
        .set(entries as f64);
}

/// Increment HTTP request counter
pub fn increment_http_request(method: &str, endpoint: &str, status: &str) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, endpoint, status])
        .inc();
}

/// Gather all metrics for Prometheus exposition
pub fn gather_metrics() -> Vec<u8> {
    use prometheus::Encoder;
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("failed to encode metrics: {e}");
    }
    buffer
}
