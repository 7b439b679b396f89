use bytes::Bytes;
use response_rewrite_proxy::metrics::{Metrics, Timer};
use response_rewrite_proxy::rewriters::{BodyRewrite, SkipReason};
use std::time::Duration;

#[test]
fn test_empty_snapshot() {
    let snapshot = Metrics::new().snapshot();
    assert_eq!(snapshot.total_requests, 0);
    assert_eq!(snapshot.average_processing_time_ms, 0.0);
    assert_eq!(snapshot.success_rate, 0.0);
}

#[test]
fn test_record_requests() {
    let metrics = Metrics::new();
    metrics.record_request(true, 10, 100, Duration::from_millis(4));
    metrics.record_request(true, 0, 50, Duration::from_millis(2));
    metrics.record_request(false, 5, 0, Duration::from_millis(0));
    metrics.record_upstream_error();

    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.total_requests, 3);
    assert_eq!(snapshot.successful_requests, 2);
    assert_eq!(snapshot.failed_requests, 1);
    assert_eq!(snapshot.bytes_received, 15);
    assert_eq!(snapshot.bytes_sent, 150);
    assert_eq!(snapshot.upstream_errors, 1);
    assert!((snapshot.average_processing_time_ms - 2.0).abs() < 1e-9);
    assert!((snapshot.success_rate - 200.0 / 3.0).abs() < 1e-9);
}

#[test]
fn test_record_rewrite_outcomes() {
    let metrics = Metrics::new();
    metrics.record_rewrite(&BodyRewrite::Rewritten {
        body: Bytes::new(),
        replacements: 3,
    });
    metrics.record_rewrite(&BodyRewrite::Unchanged {
        body: Bytes::new(),
        reason: SkipReason::NoOccurrences,
    });
    metrics.record_rewrite(&BodyRewrite::Unchanged {
        body: Bytes::new(),
        reason: SkipReason::DecodeFailed,
    });

    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.bodies_rewritten, 1);
    assert_eq!(snapshot.bodies_unchanged, 2);
    assert_eq!(snapshot.replacements, 3);
    assert_eq!(snapshot.transform_failures, 1);
}

#[test]
fn test_streaming_counters_shared_between_clones() {
    let metrics = Metrics::new();
    let clone = metrics.clone();
    clone.record_filter_attached();
    clone.record_bytes_sent(42);

    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.filters_attached, 1);
    assert_eq!(snapshot.bytes_sent, 42);
}

#[test]
fn test_snapshot_serializes() {
    let metrics = Metrics::new();
    metrics.record_filter_attached();
    let json = serde_json::to_value(metrics.snapshot()).unwrap();
    assert_eq!(json["filters_attached"], 1);
    assert!(json.get("success_rate").is_some());
}

#[test]
fn test_timer() {
    let timer = Timer::start();
    std::thread::sleep(Duration::from_millis(5));
    assert!(timer.elapsed() >= Duration::from_millis(5));
}

#[test]
fn test_record_streamed_rewrite() {
    let metrics = Metrics::new();
    metrics.record_streamed_rewrite(4);
    metrics.record_streamed_rewrite(0);

    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.bodies_rewritten, 1);
    assert_eq!(snapshot.bodies_unchanged, 1);
    assert_eq!(snapshot.replacements, 4);
    assert_eq!(snapshot.transform_failures, 0);
}
