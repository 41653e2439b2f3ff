//! HTTP policy client

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use shelf_auth_core::{Action, Decision, PolicyClient, PolicyError, Principal, Resource};
use tracing::{debug, info};
use url::Url;

use crate::config::PdpConfig;
use crate::error::{ensure_success, map_http_error};
use crate::wire::{CheckRequest, CheckResponse, UserBody};

/// Policy client backed by a remote PDP
pub struct HttpPolicyClient {
    http: reqwest::Client,
    config: PdpConfig,
}

impl HttpPolicyClient {
    /// Create a new client. No request is sent until the first call.
    pub fn new(config: PdpConfig) -> Result<Self, PolicyError> {
        Url::parse(&config.pdp_url)
            .map_err(|e| PolicyError::Protocol(format!("invalid pdp_url: {}", e)))?;
        Url::parse(&config.api_url)
            .map_err(|e| PolicyError::Protocol(format!("invalid api_url: {}", e)))?;

        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| PolicyError::Transport(e.to_string()))?;

        info!(pdp_url = %config.pdp_url, "Policy client configured");
        Ok(Self { http, config })
    }

    fn check_url(&self) -> String {
        format!("{}/allowed", self.config.pdp_url.trim_end_matches('/'))
    }

    fn health_url(&self) -> String {
        format!("{}/healthy", self.config.pdp_url.trim_end_matches('/'))
    }

    /// Identity is percent-encoded as a single path segment
    fn sync_url(&self, key: &str) -> Result<Url, PolicyError> {
        let mut url = Url::parse(&self.config.api_url)
            .map_err(|e| PolicyError::Protocol(format!("invalid api_url: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| PolicyError::Protocol("api_url cannot be a base".to_string()))?
            .pop_if_empty()
            .extend([
                "v2",
                "facts",
                self.config.project.as_str(),
                self.config.environment.as_str(),
                "users",
                key,
            ]);
        Ok(url)
    }
}

/// Run a request future under a hard deadline
async fn with_deadline<T, F>(deadline: Duration, fut: F) -> Result<T, PolicyError>
where
    F: Future<Output = Result<T, PolicyError>>,
{
    tokio::time::timeout(deadline, fut)
        .await
        .map_err(|_| PolicyError::Timeout(deadline))?
}

#[async_trait]
impl PolicyClient for HttpPolicyClient {
    async fn sync(&self, principal: &Principal) -> Result<(), PolicyError> {
        let deadline = self.config.sync_timeout;
        let url = self.sync_url(principal.identity().as_str())?;
        debug!(identity = %principal.identity(), "Syncing principal to PDP");

        with_deadline(deadline, async {
            let response = self
                .http
                .put(url)
                .bearer_auth(self.config.api_key.expose_secret())
                .timeout(deadline)
                .json(&UserBody::from_principal(principal))
                .send()
                .await
                .map_err(|e| map_http_error(e, deadline))?;
            ensure_success(response.status())
        })
        .await
    }

    async fn check(
        &self,
        principal: &Principal,
        action: Action,
        resource: &Resource,
    ) -> Result<Decision, PolicyError> {
        let deadline = self.config.check_timeout;

        let allowed = with_deadline(deadline, async {
            let response = self
                .http
                .post(self.check_url())
                .bearer_auth(self.config.api_key.expose_secret())
                .timeout(deadline)
                .json(&CheckRequest::new(principal, action, resource))
                .send()
                .await
                .map_err(|e| map_http_error(e, deadline))?;
            ensure_success(response.status())?;

            let body: CheckResponse = response
                .json()
                .await
                .map_err(|e| map_http_error(e, deadline))?;
            Ok(body.allow)
        })
        .await?;

        debug!(
            identity = %principal.identity(),
            action = %action,
            allowed,
            "PDP answered"
        );
        Ok(Decision::from_allowed(allowed))
    }

    async fn health_check(&self) -> Result<(), PolicyError> {
        let deadline = self.config.check_timeout;
        with_deadline(deadline, async {
            let response = self
                .http
                .get(self.health_url())
                .timeout(deadline)
                .send()
                .await
                .map_err(|e| map_http_error(e, deadline))?;
            ensure_success(response.status())
        })
        .await
    }
}
