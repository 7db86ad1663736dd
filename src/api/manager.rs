use log::debug;

use super::client::{Backend, ClientOptions, PrometheusClient};
use super::constants::headers;
use crate::auth::{AuthOptions, IdentityProvider, KeystoneClient, resolve_session};
use crate::error::{MaiaError, Result};

/// Everything needed to reach the backend for one invocation
#[derive(Debug, Clone, Default)]
pub struct ConnectionSettings {
    /// Direct backend URL; bypasses authentication entirely
    pub prometheus_url: Option<String>,
    /// Backend URL used instead of the one from the service catalog
    pub maia_url: Option<String>,
    /// Ask for answers from the global (cross-region) backend
    pub global: bool,
    pub auth: AuthOptions,
    pub client: ClientOptions,
}

/// Where requests go and which headers they carry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendTarget {
    pub url: String,
    pub headers: Vec<(String, String)>,
}

/// Lazily resolves and then memoizes the backend of one invocation.
///
/// The first call to [`SessionManager::backend`] authenticates (unless a
/// direct backend URL is set); later calls reuse the same backend.
pub struct SessionManager {
    settings: ConnectionSettings,
    identity_provider: Option<Box<dyn IdentityProvider>>,
    backend: Option<Box<dyn Backend>>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

impl SessionManager {
    pub fn new(settings: ConnectionSettings) -> Self {
        Self {
            settings,
            identity_provider: None,
            backend: None,
        }
    }

    /// Use this identity provider instead of a Keystone client built from the
    /// auth URL.
    pub fn with_identity_provider(mut self, provider: Box<dyn IdentityProvider>) -> Self {
        self.identity_provider = Some(provider);
        self
    }

    /// Use this backend instead of resolving one.
    pub fn with_backend(mut self, backend: Box<dyn Backend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn global(&self) -> bool {
        self.settings.global
    }

    fn global_header(&self, list: &mut Vec<(String, String)>) {
        if self.settings.global {
            list.push((headers::GLOBAL_REGION.to_string(), "true".to_string()));
        }
    }

    /// Work out the backend URL and headers, authenticating when needed.
    pub async fn resolve_target(&self) -> Result<BackendTarget> {
        if let Some(url) = non_empty(&self.settings.prometheus_url) {
            debug!("Talking to backend {} directly", url);
            let mut list = Vec::new();
            self.global_header(&mut list);
            return Ok(BackendTarget {
                url: url.to_string(),
                headers: list,
            });
        }

        let Some(auth_url) = non_empty(&self.settings.auth.identity_endpoint) else {
            return Err(MaiaError::config(
                "either --os-auth-url or --prometheus-url need to be specified",
            ));
        };

        let keystone;
        let provider: &dyn IdentityProvider = match &self.identity_provider {
            Some(provider) => provider.as_ref(),
            None => {
                keystone = KeystoneClient::new(auth_url, self.settings.client.insecure)?;
                &keystone
            }
        };

        let session = resolve_session(
            self.settings.auth.clone(),
            non_empty(&self.settings.maia_url),
            provider,
        )
        .await?;

        let mut list = vec![(headers::AUTH_TOKEN.to_string(), session.token)];
        self.global_header(&mut list);
        Ok(BackendTarget {
            url: session.endpoint,
            headers: list,
        })
    }

    /// The backend of this invocation, created on first use.
    pub async fn backend(&mut self) -> Result<&dyn Backend> {
        if self.backend.is_none() {
            let target = self.resolve_target().await?;
            let client = PrometheusClient::new(&target.url, target.headers, &self.settings.client)?;
            self.backend = Some(Box::new(client));
        }
        match &self.backend {
            Some(backend) => Ok(backend.as_ref()),
            None => Err(MaiaError::config("no backend available")),
        }
    }
}
