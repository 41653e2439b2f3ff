//! PDP configuration

use std::time::Duration;

use secrecy::Secret;

/// PDP client configuration
#[derive(Debug, Clone)]
pub struct PdpConfig {
    /// Decision endpoint base URL
    pub pdp_url: String,

    /// Management API base URL, used for fact sync
    pub api_url: String,

    /// API key sent as bearer token
    pub api_key: Secret<String>,

    pub project: String,
    pub environment: String,

    /// Deadline for a single `check`
    pub check_timeout: Duration,

    /// Deadline for a single `sync`
    pub sync_timeout: Duration,

    /// TCP connect timeout
    pub connect_timeout: Duration,
}

impl Default for PdpConfig {
    fn default() -> Self {
        Self {
            pdp_url: "http://localhost:7766".to_string(),
            api_url: "https://api.permit.io".to_string(),
            api_key: Secret::new(String::new()),
            project: "default".to_string(),
            environment: "default".to_string(),
            check_timeout: Duration::from_secs(10),
            sync_timeout: Duration::from_secs(15),
            connect_timeout: Duration::from_secs(2),
        }
    }
}

/// Builder for PdpConfig
pub struct PdpConfigBuilder {
    config: PdpConfig,
}

impl PdpConfigBuilder {
    /// Create a new builder with the decision endpoint
    pub fn new(pdp_url: impl Into<String>) -> Self {
        Self {
            config: PdpConfig {
                pdp_url: pdp_url.into(),
                ..Default::default()
            },
        }
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.config.api_url = api_url.into();
        self
    }

    pub fn with_api_key(mut self, api_key: Secret<String>) -> Self {
        self.config.api_key = api_key;
        self
    }

    /// Set project and environment used in fact sync paths
    pub fn with_scope(mut self, project: impl Into<String>, environment: impl Into<String>) -> Self {
        self.config.project = project.into();
        self.config.environment = environment.into();
        self
    }

    pub fn with_check_timeout(mut self, timeout: Duration) -> Self {
        self.config.check_timeout = timeout;
        self
    }

    pub fn with_sync_timeout(mut self, timeout: Duration) -> Self {
        self.config.sync_timeout = timeout;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    pub fn build(self) -> PdpConfig {
        self.config
    }
}
