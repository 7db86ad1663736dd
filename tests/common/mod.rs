//! In-memory stand-ins for the backend and the identity provider

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use clap::Parser;
use maia_cli::api::{Backend, BackendResponse, QueryRequest, SessionManager};
use maia_cli::auth::{CredentialSet, IdentityProvider, PolicyContext};
use maia_cli::cli::{Cli, CommandContext, dispatch};
use maia_cli::config::Config;
use maia_cli::error::{MaiaError, Result};
use maia_cli::render::OutputZone;
use reqwest::StatusCode;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub fn fixture(name: &str) -> Vec<u8> {
    let path = format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name);
    std::fs::read(&path).unwrap_or_else(|e| panic!("cannot read fixture {}: {}", path, e))
}

pub fn json_fixture(name: &str) -> BackendResponse {
    BackendResponse::ok("application/json", fixture(name))
}

pub fn text_fixture(name: &str) -> BackendResponse {
    BackendResponse::ok("text/plain; version=0.0.4", fixture(name))
}

pub fn status_response(status: u16, body: &str) -> BackendResponse {
    BackendResponse {
        status: StatusCode::from_u16(status).unwrap(),
        content_type: Some("text/plain".to_string()),
        body: Ok(body.as_bytes().to_vec()),
    }
}

/// Replays one canned response and records every request.
pub struct FakeBackend {
    pub response: BackendResponse,
    pub requests: Arc<Mutex<Vec<QueryRequest>>>,
}

impl FakeBackend {
    pub fn new(response: BackendResponse) -> (Self, Arc<Mutex<Vec<QueryRequest>>>) {
        let requests = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                response,
                requests: requests.clone(),
            },
            requests,
        )
    }
}

#[async_trait]
impl Backend for FakeBackend {
    async fn execute(&self, request: &QueryRequest) -> Result<BackendResponse> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(self.response.clone())
    }
}

/// Accepts any credentials and hands out a fixed token and endpoint.
pub struct FakeIdentityProvider {
    pub token: String,
    pub endpoint: String,
    pub fail: bool,
    pub seen: Arc<Mutex<Vec<CredentialSet>>>,
}

impl FakeIdentityProvider {
    pub fn new(token: &str, endpoint: &str) -> (Self, Arc<Mutex<Vec<CredentialSet>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                token: token.to_string(),
                endpoint: endpoint.to_string(),
                fail: false,
                seen: seen.clone(),
            },
            seen,
        )
    }

    pub fn rejecting() -> Self {
        let (mut provider, _) = Self::new("", "");
        provider.fail = true;
        provider
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentityProvider {
    async fn authenticate(&self, credentials: &CredentialSet) -> Result<(PolicyContext, String)> {
        self.seen.lock().unwrap().push(credentials.clone());
        if self.fail {
            return Err(MaiaError::Authentication(
                "authentication failed with status 401 Unauthorized".to_string(),
            ));
        }
        let context = PolicyContext {
            auth: HashMap::from([
                ("token".to_string(), self.token.clone()),
                ("project_id".to_string(), "12345".to_string()),
            ]),
            roles: vec!["monitoring_viewer".to_string()],
        };
        Ok((context, self.endpoint.clone()))
    }
}

pub fn now() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2017-07-13T23:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

/// Parse a command line and run it against a fake backend. Timestamps render
/// in UTC unless `--timezone` is given.
pub async fn run_with(
    args: &[&str],
    response: BackendResponse,
) -> (anyhow::Result<String>, Vec<QueryRequest>) {
    let mut argv = vec!["maia"];
    argv.extend_from_slice(args);
    let cli = Cli::try_parse_from(argv).expect("valid command line");

    let config = Config::default();
    let (backend, requests) = FakeBackend::new(response);
    let mut ctx = CommandContext::from_cli(&cli, &config).expect("valid context");
    ctx.sessions = SessionManager::new(cli.connection_settings(&config)).with_backend(Box::new(backend));
    ctx.now = now();
    if !args.contains(&"--timezone") {
        ctx.output.zone = OutputZone::Named(chrono_tz::UTC);
    }

    let result = dispatch(cli.command, &mut ctx).await;
    let recorded = requests.lock().unwrap().clone();
    (result, recorded)
}

/// The library error behind a command failure
pub fn maia_error(err: &anyhow::Error) -> &MaiaError {
    err.downcast_ref::<MaiaError>()
        .unwrap_or_else(|| panic!("not a MaiaError: {}", err))
}
