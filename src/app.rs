use crate::config::AppConfig;
use crate::metrics::Metrics;
use crate::rewrite::RewriterType;
use crate::server::{ServerResources, ServerStarter};
use crate::servers::{ForwardServer, HealthcheckServer, StreamingServer};
use anyhow::Result;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

pub struct App {
    resources: ServerResources,
    pub rewriter: RewriterType,
    handles: Vec<JoinHandle<()>>,
}

impl App {
    pub fn new(config: AppConfig) -> Self {
        let resources = ServerResources::from_config(Arc::new(config));
        let rewriter = Arc::clone(&resources.rewriter);
        Self {
            resources,
            rewriter,
            handles: Vec::new(),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.resources.config
    }

    pub fn metrics(&self) -> Arc<Metrics> {
        Arc::clone(&self.resources.metrics)
    }

    /// Number of servers currently running
    pub fn running_servers(&self) -> usize {
        self.handles.iter().filter(|h| !h.is_finished()).count()
    }

    pub fn start(&mut self) -> Result<()> {
        info!("Starting response rewrite proxy...");

        self.start_forward_server();
        self.start_streaming_server();
        self.start_healthcheck_server();

        info!("All enabled servers started");
        Ok(())
    }

    fn start_forward_server(&mut self) {
        let config = &self.resources.config.servers.forward;
        let handle = ServerStarter::start_server(
            "Forward",
            config.enabled,
            format!("{}:{}", config.bind_address, config.port),
            self.resources.clone(),
            |resources| async move { ForwardServer::new(resources).start().await },
        );
        self.handles.extend(handle);
    }

    fn start_streaming_server(&mut self) {
        let config = &self.resources.config.servers.streaming;
        let handle = ServerStarter::start_server(
            "Streaming",
            config.enabled,
            format!("{}:{}", config.bind_address, config.port),
            self.resources.clone(),
            |resources| async move { StreamingServer::new(resources).start().await },
        );
        self.handles.extend(handle);
    }

    fn start_healthcheck_server(&mut self) {
        let config = &self.resources.config.servers.healthcheck;
        let handle = ServerStarter::start_server(
            "Healthcheck",
            config.enabled,
            format!("{}:{}", config.bind_address, config.port),
            self.resources.clone(),
            |resources| async move {
                HealthcheckServer::new(resources.config, resources.metrics)
                    .start()
                    .await
            },
        );
        self.handles.extend(handle);
    }

    /// Stop every server and wait for its task to end
    pub async fn wait_for_shutdown(&mut self) {
        for handle in self.handles.drain(..) {
            handle.abort();
            let _ = handle.await;
        }
        info!("All servers stopped");
    }
}
