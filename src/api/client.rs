use async_trait::async_trait;
use log::{debug, error};
use reqwest::{Method, StatusCode, Url};
use std::time::Duration;

use super::constants::FEDERATE_PATH;
use super::query::QueryRequest;
use crate::error::{MaiaError, Result};

/// A fully read backend response.
///
/// The body is read before status classification, so a failed read is kept
/// next to the status instead of failing the whole call.
#[derive(Debug, Clone)]
pub struct BackendResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: std::result::Result<Vec<u8>, String>,
}

impl BackendResponse {
    pub fn ok(content_type: &str, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: StatusCode::OK,
            content_type: Some(content_type.to_string()),
            body: Ok(body.into()),
        }
    }

    pub fn body_bytes(&self) -> &[u8] {
        self.body.as_deref().unwrap_or_default()
    }
}

/// Executes one backend request per call.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn execute(&self, request: &QueryRequest) -> Result<BackendResponse>;
}

/// Transport settings shared by every backend call
#[derive(Debug, Clone, Default)]
pub struct ClientOptions {
    pub proxy: Option<String>,
    /// Alternative host for `/federate` requests
    pub federate_url: Option<String>,
    pub insecure: bool,
}

/// Prometheus-compatible HTTP backend
pub struct PrometheusClient {
    url: Url,
    federate_url: Url,
    custom_headers: Vec<(String, String)>,
    http_client: reqwest::Client,
}

fn parse_url(value: &str) -> Result<Url> {
    Url::parse(value).map_err(|e| MaiaError::config(format!("invalid URL: {} ({})", value, e)))
}

fn is_valid_url(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https") && url.host_str().is_some_and(|h| !h.is_empty())
}

impl PrometheusClient {
    pub fn new(
        url: &str,
        custom_headers: Vec<(String, String)>,
        options: &ClientOptions,
    ) -> Result<Self> {
        let url = parse_url(url)?;
        let federate_url = match options.federate_url.as_deref().filter(|u| !u.is_empty()) {
            Some(federate) => parse_url(federate)?,
            None => url.clone(),
        };

        let mut builder = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .danger_accept_invalid_certs(options.insecure)
            .user_agent(concat!("maia-cli/", env!("CARGO_PKG_VERSION")));
        if let Some(proxy) = options.proxy.as_deref().filter(|p| !p.is_empty()) {
            debug!("Using proxy {}", proxy);
            let proxy = reqwest::Proxy::all(proxy)
                .map_err(|e| MaiaError::config(format!("could not set proxy: {} ({})", proxy, e)))?;
            builder = builder.proxy(proxy);
        }

        Ok(Self {
            url,
            federate_url,
            custom_headers,
            http_client: builder.build()?,
        })
    }

    /// Target URL of a request: base path plus request path, empty parameters
    /// left out. Federation goes to the federation host when one is set.
    pub fn build_url(&self, request: &QueryRequest) -> Url {
        let path = request.path();
        let mut url = if path == FEDERATE_PATH {
            self.federate_url.clone()
        } else {
            self.url.clone()
        };

        let joined = format!("{}{}", url.path().trim_end_matches('/'), path);
        url.set_path(&joined);

        let params = request.params();
        if params.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(params);
        }
        url
    }

    /// Point an incoming URL at the backend host, keeping its path. The query
    /// string is dropped.
    pub fn map_url(&self, incoming: &Url) -> Result<Url> {
        let mut url = incoming.clone();
        let rewrite = |part: &str| {
            MaiaError::Transport(format!("cannot map {} onto {}: {}", incoming, self.url, part))
        };

        url.set_scheme(self.url.scheme()).map_err(|_| rewrite("scheme"))?;
        url.set_host(self.url.host_str()).map_err(|e| rewrite(&e.to_string()))?;
        url.set_port(self.url.port()).map_err(|_| rewrite("port"))?;
        url.set_username(self.url.username()).map_err(|_| rewrite("user name"))?;
        url.set_password(self.url.password()).map_err(|_| rewrite("password"))?;
        url.set_query(None);
        Ok(url)
    }

    /// Forward a request received elsewhere to the backend.
    pub async fn delegate(
        &self,
        method: Method,
        incoming: &Url,
        body: Option<Vec<u8>>,
        accept: Option<&str>,
    ) -> Result<BackendResponse> {
        let url = self.map_url(incoming)?;
        self.send(method, url, body, accept).await
    }

    async fn send(
        &self,
        method: Method,
        url: Url,
        body: Option<Vec<u8>>,
        accept: Option<&str>,
    ) -> Result<BackendResponse> {
        if !is_valid_url(&url) {
            return Err(MaiaError::Transport(format!("invalid URL: {}", url)));
        }

        let mut request = self.http_client.request(method, url.clone());
        for (name, value) in &self.custom_headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if let Some(accept) = accept.filter(|a| !a.is_empty()) {
            request = request.header("Accept", accept);
        }
        if let Some(body) = body {
            request = request.body(body);
        }

        debug!("Forwarding request to API: {}", url);

        let response = request.send().await.map_err(|e| {
            error!("Request failed: {}", e);
            MaiaError::from(e)
        })?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let body = response
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| e.to_string());

        Ok(BackendResponse {
            status,
            content_type,
            body,
        })
    }
}

#[async_trait]
impl Backend for PrometheusClient {
    async fn execute(&self, request: &QueryRequest) -> Result<BackendResponse> {
        let url = self.build_url(request);
        self.send(Method::GET, url, None, Some(request.accept())).await
    }
}
