use http_body_util::BodyExt;
use hyper::{Method, Request, StatusCode};
use response_rewrite_proxy::metrics::Metrics;
use response_rewrite_proxy::servers::healthcheck::handle_healthcheck;

fn get(path: &str) -> Request<()> {
    Request::builder().uri(path).body(()).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let resp = handle_healthcheck(get("/health"), "/health", &Metrics::new());
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["content-type"], "application/json");

    let body = resp.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["service"], "response-rewrite-proxy");
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let metrics = Metrics::new();
    metrics.record_filter_attached();

    for path in ["/metrics", "/stats"] {
        let resp = handle_healthcheck(get(path), "/health", &metrics);
        assert_eq!(resp.status(), StatusCode::OK);

        let body = resp.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["filters_attached"], 1);
    }
}

#[test]
fn test_unknown_path_and_method() {
    let metrics = Metrics::new();
    assert_eq!(
        handle_healthcheck(get("/other"), "/health", &metrics).status(),
        StatusCode::NOT_FOUND
    );

    let post = Request::builder()
        .method(Method::POST)
        .uri("/health")
        .body(())
        .unwrap();
    assert_eq!(
        handle_healthcheck(post, "/health", &metrics).status(),
        StatusCode::METHOD_NOT_ALLOWED
    );
}
