use crate::content_type::DEFAULT_REWRITABLE_PREFIXES;
use crate::error::ConfigError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Environment variable holding the backend address
pub const TARGET_URI_ENV: &str = "TARGET_URI";
/// Environment variable holding the public address
pub const FUNCTION_BASE_URI_ENV: &str = "FUNCTION_BASE_URI";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub rewrite: RewriteConfig,
    pub servers: ServersConfig,
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewriteConfig {
    /// Address of the origin as it appears in response bodies (e.g. "backend.internal:8080")
    #[serde(default)]
    pub internal_address: String,
    /// Address clients should see instead (e.g. "www.example.com")
    #[serde(default)]
    pub public_address: String,
    /// Request header that carries the public address in streaming mode
    #[serde(default = "default_trigger_header")]
    pub trigger_header: String,
    /// Media type prefixes eligible for rewriting
    #[serde(default = "default_content_types")]
    pub content_types: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServersConfig {
    pub forward: ForwardServerConfig,
    pub streaming: ServerPortConfig,
    #[serde(default)]
    pub healthcheck: HealthcheckConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerPortConfig {
    pub enabled: bool,
    pub bind_address: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForwardServerConfig {
    pub enabled: bool,
    pub bind_address: String,
    pub port: u16,
    /// Path prefix of the forwarding route; the remainder is passed upstream
    #[serde(default = "default_route_prefix")]
    pub route_prefix: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthcheckConfig {
    pub enabled: bool,
    pub bind_address: String,
    pub port: u16,
    #[serde(default = "default_healthcheck_path")]
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Backend host and optional port requests are forwarded to
    #[serde(default)]
    pub target: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log file path; console only when unset
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub json: bool,
    /// Daily rotation of the log file
    #[serde(default)]
    pub rotation: bool,
}

fn default_trigger_header() -> String {
    "CUSTOMER_HOST_NAME".to_string()
}

fn default_content_types() -> Vec<String> {
    DEFAULT_REWRITABLE_PREFIXES
        .iter()
        .map(|p| p.to_string())
        .collect()
}

fn default_route_prefix() -> String {
    "/sanitize".to_string()
}

fn default_healthcheck_path() -> String {
    "/health".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
            json: false,
            rotation: false,
        }
    }
}

impl Default for HealthcheckConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind_address: "0.0.0.0".to_string(),
            port: 8081,
            path: default_healthcheck_path(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            rewrite: RewriteConfig {
                internal_address: "localhost:5000".to_string(),
                public_address: "www.example.com".to_string(),
                trigger_header: default_trigger_header(),
                content_types: default_content_types(),
            },
            servers: ServersConfig {
                forward: ForwardServerConfig {
                    enabled: true,
                    bind_address: "0.0.0.0".to_string(),
                    port: 8080,
                    route_prefix: default_route_prefix(),
                },
                streaming: ServerPortConfig {
                    enabled: false,
                    bind_address: "0.0.0.0".to_string(),
                    port: 8082,
                },
                healthcheck: HealthcheckConfig::default(),
            },
            upstream: UpstreamConfig {
                target: "localhost:5000".to_string(),
                timeout_secs: default_timeout_secs(),
            },
            logging: LoggingConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        let config: AppConfig =
            toml::from_str(&content).with_context(|| "Failed to parse config file")?;
        Ok(config)
    }

    /// Load configuration from file or use default
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        Self::from_file(path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config file, using defaults: {}", e);
            Self::default()
        })
    }

    /// Apply `TARGET_URI` and `FUNCTION_BASE_URI` from the process environment
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary lookup. Empty values are ignored.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(target) = lookup(TARGET_URI_ENV) {
            self.upstream.target = target.clone();
            self.rewrite.internal_address = target;
        }
        if let Some(public) = lookup(FUNCTION_BASE_URI_ENV) {
            self.rewrite.public_address = public;
        }
    }

    /// Upstream request timeout
    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream.timeout_secs)
    }

    /// Semantic checks; any failure is fatal at startup
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        let forward = &self.servers.forward;
        let streaming = &self.servers.streaming;
        let healthcheck = &self.servers.healthcheck;

        if forward.enabled {
            if self.rewrite.internal_address.trim().is_empty() {
                return Err(ConfigError::MisconfiguredAddress {
                    field: "rewrite.internal_address",
                });
            }
            if self.rewrite.public_address.trim().is_empty() {
                return Err(ConfigError::MisconfiguredAddress {
                    field: "rewrite.public_address",
                });
            }
        }

        if streaming.enabled && self.rewrite.internal_address.trim().is_empty() {
            return Err(ConfigError::MisconfiguredAddress {
                field: "rewrite.internal_address",
            });
        }

        if (forward.enabled || streaming.enabled) && self.upstream.target.trim().is_empty() {
            return Err(ConfigError::MisconfiguredAddress {
                field: "upstream.target",
            });
        }

        if hyper::header::HeaderName::from_bytes(self.rewrite.trigger_header.as_bytes()).is_err() {
            return Err(ConfigError::InvalidTriggerHeader {
                header: self.rewrite.trigger_header.clone(),
            });
        }

        let binds = [
            ("forward", forward.enabled, &forward.bind_address, forward.port),
            (
                "streaming",
                streaming.enabled,
                &streaming.bind_address,
                streaming.port,
            ),
            (
                "healthcheck",
                healthcheck.enabled,
                &healthcheck.bind_address,
                healthcheck.port,
            ),
        ];
        let enabled: Vec<_> = binds.iter().filter(|b| b.1).collect();
        for (i, first) in enabled.iter().enumerate() {
            for second in &enabled[i + 1..] {
                // port 0 asks the OS for a free port and never conflicts
                if first.3 != 0 && first.2 == second.2 && first.3 == second.3 {
                    return Err(ConfigError::PortConflict {
                        first: first.0,
                        second: second.0,
                        bind: format!("{}:{}", first.2, first.3),
                    });
                }
            }
        }

        Ok(())
    }
}
