/// Common server startup utilities
use crate::config::AppConfig;
use crate::content_type::{ContentTypeGateType, PrefixGate};
use crate::metrics::Metrics;
use crate::rewrite::{RewriterType, create_rewriter};
use crate::upstream::{HttpClient, create_http_client};
use anyhow::Result;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Common server startup helper
pub struct ServerStarter;

impl ServerStarter {
    /// Start a server with a closure that receives cloned resources
    pub fn start_server<F, Fut>(
        name: &str,
        enabled: bool,
        bind_addr: String,
        resources: ServerResources,
        server_future: F,
    ) -> Option<JoinHandle<()>>
    where
        F: FnOnce(ServerResources) -> Fut + Send + 'static,
        Fut: std::future::Future<Output = Result<()>> + Send + 'static,
    {
        if !enabled {
            info!("{} server is disabled", name);
            return None;
        }

        let name_for_log = name.to_string(); // For final log message
        let name = name.to_string(); // Convert to owned String for 'static lifetime
        let handle = tokio::spawn(async move {
            if let Err(e) = server_future(resources).await {
                error!("{} server error: {:#}", name, e);
            }
        });

        info!("{} server started on {}", name_for_log, bind_addr);
        Some(handle)
    }
}

/// Common resources shared across servers
#[derive(Clone)]
pub struct ServerResources {
    pub config: Arc<AppConfig>,
    pub rewriter: RewriterType,
    pub gate: ContentTypeGateType,
    pub client: HttpClient,
    pub metrics: Arc<Metrics>,
}

impl ServerResources {
    pub fn new(
        config: Arc<AppConfig>,
        rewriter: RewriterType,
        gate: ContentTypeGateType,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            config,
            rewriter,
            gate,
            client: create_http_client(),
            metrics,
        }
    }

    /// Build every shared resource from configuration
    pub fn from_config(config: Arc<AppConfig>) -> Self {
        let rewriter = create_rewriter(&config.rewrite);
        let gate: ContentTypeGateType =
            Arc::new(PrefixGate::new(config.rewrite.content_types.iter().cloned()));
        Self::new(config, rewriter, gate, Arc::new(Metrics::new()))
    }
}
