//! Prometheus metrics for the scenario mock server.
//!
//! Tracks dispatched requests, scenario selections and artificial delays.
use lazy_static::lazy_static;
use prometheus::{
    register_counter_vec, register_histogram, CounterVec, Encoder, Histogram, TextEncoder,
};

lazy_static! {
    /// Requests answered by the mock engine
    pub static ref REQUESTS_TOTAL: CounterVec = register_counter_vec!(
        "scenario_mock_requests_total",
        "Total number of requests answered by the mock server",
        &["kind", "status"]  // kind: http|graphql|unmatched
    )
    .unwrap();

    /// Scenario selection attempts
    pub static ref SCENARIO_SELECTIONS_TOTAL: CounterVec = register_counter_vec!(
        "scenario_mock_scenario_selections_total",
        "Total number of scenario selection requests",
        &["result"]  // result: selected|unknown
    )
    .unwrap();

    /// Declared response delays
    pub static ref RESPONSE_DELAY_MS: Histogram = register_histogram!(
        "scenario_mock_response_delay_ms",
        "Histogram of declared response delays in milliseconds",
        vec![
            10.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0, 10000.0,
        ]
    )
    .unwrap();
}

/// Collect all registered metrics in Prometheus text format
pub fn gather() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if encoder.encode(&metric_families, &mut buffer).is_err() {
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// Record a request answered by the engine
pub fn record_request(kind: &str, status: u16) {
    REQUESTS_TOTAL
        .with_label_values(&[kind, &status.to_string()])
        .inc();
}

/// Record a scenario selection
pub fn record_selection(selected: bool) {
    let result = if selected { "selected" } else { "unknown" };
    SCENARIO_SELECTIONS_TOTAL.with_label_values(&[result]).inc();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_collection() {
        record_request("http", 200);
        record_request("unmatched", 404);
        record_selection(true);
        record_selection(false);
        RESPONSE_DELAY_MS.observe(500.0);

        let output = gather();
        assert!(output.contains("scenario_mock_requests_total"));
        assert!(output.contains("scenario_mock_scenario_selections_total"));
        assert!(output.contains("scenario_mock_response_delay_ms"));
    }

    #[test]
    fn test_request_counter_increments() {
        let before = REQUESTS_TOTAL.with_label_values(&["graphql", "418"]).get();
        record_request("graphql", 418);
        record_request("graphql", 418);
        let after = REQUESTS_TOTAL.with_label_values(&["graphql", "418"]).get();
        assert!(after - before >= 2.0);
    }

    #[test]
    fn test_selection_results_are_labelled() {
        record_selection(false);
        let output = gather();
        assert!(output.contains("result=\"unknown\""));
    }
}
