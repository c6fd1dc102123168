//! Prometheus metrics for routing, dispatch and the settings store
//!
//! Collectors are registered in the default registry on first use;
//! [`render`] produces the text exposition format.

use lazy_static::lazy_static;
use prometheus::{
    register_counter_vec, register_histogram, register_int_counter, CounterVec, Encoder, Histogram,
    IntCounter, TextEncoder,
};

// ======================
// ROUTING METRICS
// ======================

lazy_static! {
    /// Route resolutions by how they were satisfied
    /// Labels: kind (cache/exact/prefix/pattern/miss)
    pub static ref ROUTE_RESOLUTIONS_TOTAL: CounterVec = register_counter_vec!(
        "relaygram_route_resolutions_total",
        "Callback identifier resolutions by match kind",
        &["kind"]
    )
    .unwrap();

    /// Resolutions exceeding the slow route threshold
    pub static ref SLOW_ROUTES_TOTAL: IntCounter = register_int_counter!(
        "relaygram_slow_routes_total",
        "Resolutions slower than the slow route threshold"
    )
    .unwrap();

    /// Dispatch outcomes
    /// Labels: outcome (handled/unhandled/empty/failed)
    pub static ref DISPATCH_TOTAL: CounterVec = register_counter_vec!(
        "relaygram_dispatch_total",
        "Dispatched callbacks by outcome",
        &["outcome"]
    )
    .unwrap();

    /// Time from dispatch start to handler completion
    pub static ref DISPATCH_DURATION_SECONDS: Histogram = register_histogram!(
        "relaygram_dispatch_duration_seconds",
        "Time spent resolving and running callback handlers",
        vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]
    )
    .unwrap();
}

// ======================
// SETTINGS METRICS
// ======================

lazy_static! {
    /// Settings cache lookups
    /// Labels: cache (system/task), result (hit/miss)
    pub static ref SETTINGS_CACHE_TOTAL: CounterVec = register_counter_vec!(
        "relaygram_settings_cache_total",
        "Settings cache lookups by cache and result",
        &["cache", "result"]
    )
    .unwrap();

    /// Storage failures swallowed at the settings store boundary
    /// Labels: operation
    pub static ref SETTINGS_STORAGE_ERRORS_TOTAL: CounterVec = register_counter_vec!(
        "relaygram_settings_storage_errors_total",
        "Storage errors degraded to defaults or false results",
        &["operation"]
    )
    .unwrap();
}

/// Records a route resolution of the given kind.
pub fn record_resolution(kind: &str) {
    ROUTE_RESOLUTIONS_TOTAL.with_label_values(&[kind]).inc();
}

/// Records a dispatch outcome and its duration.
pub fn record_dispatch(outcome: &str, seconds: f64) {
    DISPATCH_TOTAL.with_label_values(&[outcome]).inc();
    DISPATCH_DURATION_SECONDS.observe(seconds);
}

/// Records a settings cache lookup.
pub fn record_settings_cache(cache: &str, hit: bool) {
    let result = if hit { "hit" } else { "miss" };
    SETTINGS_CACHE_TOTAL.with_label_values(&[cache, result]).inc();
}

pub fn record_storage_error(operation: &str) {
    SETTINGS_STORAGE_ERRORS_TOTAL.with_label_values(&[operation]).inc();
}

/// Renders every registered collector in the Prometheus text format.
pub fn render() -> String {
    let encoder = TextEncoder::new();
    let families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&families, &mut buffer) {
        log::warn!("Failed to encode metrics: {}", e);
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_resolution_increments() {
        let before = ROUTE_RESOLUTIONS_TOTAL.with_label_values(&["exact"]).get();
        record_resolution("exact");
        let after = ROUTE_RESOLUTIONS_TOTAL.with_label_values(&["exact"]).get();
        assert!(after >= before + 1.0);
    }

    #[test]
    fn test_render_contains_dispatch_family() {
        record_dispatch("handled", 0.002);
        let text = render();
        assert!(text.contains("relaygram_dispatch_total"));
    }
}
