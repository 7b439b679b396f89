use response_rewrite_proxy::app::App;
use response_rewrite_proxy::config::AppConfig;
use response_rewrite_proxy::rewrite::AddressRewriter;

fn disabled_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.servers.forward.enabled = false;
    config.servers.streaming.enabled = false;
    config.servers.healthcheck.enabled = false;
    config
}

#[tokio::test]
async fn test_app_with_all_servers_disabled() {
    let mut app = App::new(disabled_config());
    app.start().unwrap();
    assert_eq!(app.running_servers(), 0);

    app.wait_for_shutdown().await;
    assert_eq!(app.metrics().snapshot().total_requests, 0);
}

#[tokio::test]
async fn test_app_starts_and_stops_servers() {
    let mut config = disabled_config();
    config.servers.forward.enabled = true;
    config.servers.forward.bind_address = "127.0.0.1".to_string();
    config.servers.forward.port = 0;
    config.servers.healthcheck.enabled = true;
    config.servers.healthcheck.bind_address = "127.0.0.1".to_string();
    config.servers.healthcheck.port = 0;

    let mut app = App::new(config);
    app.start().unwrap();
    tokio::task::yield_now().await;
    assert_eq!(app.running_servers(), 2);

    app.wait_for_shutdown().await;
    assert_eq!(app.running_servers(), 0);
}

#[test]
fn test_app_rewriter_follows_config() {
    let mut config = disabled_config();
    config.rewrite.internal_address = "svc.internal:8080".to_string();
    config.rewrite.public_address = "api.example.com".to_string();

    let app = App::new(config);
    assert_eq!(app.config().rewrite.public_address, "api.example.com");
    assert_eq!(
        app.rewriter.rewrite("http://svc.internal:8080/v1").text,
        "http://api.example.com/v1"
    );
}
