//! Keystone v3 identity provider

use async_trait::async_trait;
use log::{debug, info};
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;

use super::context::PolicyContext;
use super::credentials::{ApplicationCredentialRef, CredentialSet, DomainRef, Scope, UserIdentity};
use crate::api::constants::{METRICS_SERVICE_TYPE, headers};
use crate::error::{MaiaError, Result};

/// Authenticates credentials and tells where the metrics service lives.
///
/// A trait so the credential resolver can be exercised without an identity
/// service.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Returns the policy context (including the `token` attribute) and the
    /// metrics endpoint found in the service catalog.
    async fn authenticate(&self, credentials: &CredentialSet) -> Result<(PolicyContext, String)>;
}

pub struct KeystoneClient {
    auth_url: String,
    http_client: reqwest::Client,
}

impl KeystoneClient {
    pub fn new(auth_url: &str, insecure: bool) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .danger_accept_invalid_certs(insecure)
            .user_agent(concat!("maia-cli/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            auth_url: auth_url.trim_end_matches('/').to_string(),
            http_client,
        })
    }

    fn tokens_url(&self) -> String {
        format!("{}/auth/tokens", self.auth_url)
    }
}

#[async_trait]
impl IdentityProvider for KeystoneClient {
    async fn authenticate(&self, credentials: &CredentialSet) -> Result<(PolicyContext, String)> {
        info!("Authenticating against {}", self.auth_url);

        let response = self
            .http_client
            .post(self.tokens_url())
            .header("Accept", headers::CONTENT_TYPE_JSON)
            .json(&auth_request_body(credentials))
            .send()
            .await?;

        let status = response.status();
        debug!("Token request status: {}", status);

        let subject_token = response
            .headers()
            .get(headers::SUBJECT_TOKEN)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let text = response.text().await?;

        if !status.is_success() {
            return Err(MaiaError::Authentication(format!(
                "authentication failed with status {}: {}",
                status,
                text.trim()
            )));
        }

        let subject_token = subject_token.ok_or_else(|| {
            MaiaError::Authentication("no X-Subject-Token in identity service response".to_string())
        })?;
        let body: TokenResponse = serde_json::from_str(&text)?;

        let endpoint = body.token.metrics_endpoint().ok_or_else(|| {
            MaiaError::Authentication(format!(
                "no public '{}' endpoint in service catalog; use --maia-url",
                METRICS_SERVICE_TYPE
            ))
        })?;

        Ok((body.token.policy_context(subject_token), endpoint))
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: TokenBody,
}

#[derive(Debug, Deserialize, Default)]
struct TokenBody {
    #[serde(default)]
    user: Option<NamedRef>,
    #[serde(default)]
    project: Option<ProjectRef>,
    #[serde(default)]
    domain: Option<NamedRef>,
    #[serde(default)]
    roles: Vec<NamedRef>,
    #[serde(default)]
    catalog: Vec<CatalogEntry>,
}

#[derive(Debug, Deserialize, Default)]
struct NamedRef {
    #[serde(default)]
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    domain: Option<Box<NamedRef>>,
}

#[derive(Debug, Deserialize)]
struct ProjectRef {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    domain: Option<NamedRef>,
}

#[derive(Debug, Deserialize)]
struct CatalogEntry {
    #[serde(rename = "type")]
    service_type: String,
    #[serde(default)]
    endpoints: Vec<Endpoint>,
}

#[derive(Debug, Deserialize)]
struct Endpoint {
    interface: String,
    url: String,
}

impl TokenBody {
    fn metrics_endpoint(&self) -> Option<String> {
        self.catalog
            .iter()
            .filter(|entry| entry.service_type == METRICS_SERVICE_TYPE)
            .flat_map(|entry| entry.endpoints.iter())
            .find(|endpoint| endpoint.interface == "public")
            .map(|endpoint| endpoint.url.clone())
    }

    fn policy_context(&self, token: String) -> PolicyContext {
        let mut context = PolicyContext::default();
        context.auth.insert("token".to_string(), token);

        if let Some(user) = &self.user {
            context.auth.insert("user_id".to_string(), user.id.clone());
            context.auth.insert("user_name".to_string(), user.name.clone());
            if let Some(domain) = &user.domain {
                context.auth.insert("user_domain_id".to_string(), domain.id.clone());
                context.auth.insert("user_domain_name".to_string(), domain.name.clone());
            }
        }
        if let Some(project) = &self.project {
            context.auth.insert("project_id".to_string(), project.id.clone());
            context.auth.insert("project_name".to_string(), project.name.clone());
            if let Some(domain) = &project.domain {
                context.auth.insert("project_domain_id".to_string(), domain.id.clone());
                context.auth.insert("project_domain_name".to_string(), domain.name.clone());
            }
        }
        if let Some(domain) = &self.domain {
            context.auth.insert("domain_id".to_string(), domain.id.clone());
            context.auth.insert("domain_name".to_string(), domain.name.clone());
        }
        context.roles = self.roles.iter().map(|role| role.name.clone()).collect();

        context
    }
}

fn domain_json(domain: &DomainRef) -> Value {
    match domain {
        DomainRef::Id(id) => json!({ "id": id }),
        DomainRef::Name(name) => json!({ "name": name }),
    }
}

fn user_json(user: &UserIdentity) -> Value {
    match user {
        UserIdentity::Id(id) => json!({ "id": id }),
        UserIdentity::Name { name, domain } => {
            let mut value = json!({ "name": name });
            if let Some(domain) = domain {
                value["domain"] = domain_json(domain);
            }
            value
        }
    }
}

fn scope_json(scope: &Scope) -> Value {
    let domain = match (&scope.domain_id, &scope.domain_name) {
        (Some(id), _) => Some(DomainRef::Id(id.clone())),
        (None, Some(name)) => Some(DomainRef::Name(name.clone())),
        (None, None) => None,
    };

    if let Some(id) = &scope.project_id {
        return json!({ "project": { "id": id } });
    }
    if let Some(name) = &scope.project_name {
        let mut project = json!({ "name": name });
        if let Some(domain) = &domain {
            project["domain"] = domain_json(domain);
        }
        return json!({ "project": project });
    }
    match domain {
        Some(domain) => json!({ "domain": domain_json(&domain) }),
        None => Value::Null,
    }
}

/// Build the `POST /v3/auth/tokens` request body for a credential set.
pub fn auth_request_body(credentials: &CredentialSet) -> Value {
    let mut auth = match credentials {
        CredentialSet::Password { user, password, .. } => {
            let mut user = user_json(user);
            user["password"] = json!(password);
            json!({
                "identity": {
                    "methods": ["password"],
                    "password": { "user": user }
                }
            })
        }
        CredentialSet::Token { token, .. } => json!({
            "identity": {
                "methods": ["token"],
                "token": { "id": token }
            }
        }),
        CredentialSet::ApplicationCredential { credential, secret } => {
            let mut application_credential = match credential {
                ApplicationCredentialRef::Id(id) => json!({ "id": id }),
                ApplicationCredentialRef::Name { name, user } => {
                    json!({ "name": name, "user": user_json(user) })
                }
            };
            application_credential["secret"] = json!(secret);
            json!({
                "identity": {
                    "methods": ["application_credential"],
                    "application_credential": application_credential
                }
            })
        }
    };

    if let Some(scope) = credentials.scope() {
        let scope = scope_json(scope);
        if !scope.is_null() {
            auth["scope"] = scope;
        }
    }

    json!({ "auth": auth })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_body_with_project_scope() {
        let credentials = CredentialSet::Password {
            user: UserIdentity::Name {
                name: "alice".into(),
                domain: Some(DomainRef::Name("Default".into())),
            },
            password: "secret".into(),
            scope: Some(Scope {
                project_name: Some("monitoring".into()),
                domain_name: Some("Default".into()),
                ..Default::default()
            }),
        };

        let body = auth_request_body(&credentials);
        assert_eq!(body["auth"]["identity"]["methods"][0], "password");
        assert_eq!(body["auth"]["identity"]["password"]["user"]["name"], "alice");
        assert_eq!(body["auth"]["identity"]["password"]["user"]["domain"]["name"], "Default");
        assert_eq!(body["auth"]["identity"]["password"]["user"]["password"], "secret");
        assert_eq!(body["auth"]["scope"]["project"]["name"], "monitoring");
        assert_eq!(body["auth"]["scope"]["project"]["domain"]["name"], "Default");
    }

    #[test]
    fn application_credential_body_has_no_scope() {
        let credentials = CredentialSet::ApplicationCredential {
            credential: ApplicationCredentialRef::Id("appcred".into()),
            secret: "s3cr3t".into(),
        };

        let body = auth_request_body(&credentials);
        assert_eq!(body["auth"]["identity"]["application_credential"]["id"], "appcred");
        assert_eq!(body["auth"]["identity"]["application_credential"]["secret"], "s3cr3t");
        assert!(body["auth"].get("scope").is_none());
    }

    #[test]
    fn domain_scope_for_token() {
        let credentials = CredentialSet::Token {
            token: "ABC".into(),
            scope: Some(Scope {
                domain_id: Some("d1".into()),
                ..Default::default()
            }),
        };

        let body = auth_request_body(&credentials);
        assert_eq!(body["auth"]["identity"]["token"]["id"], "ABC");
        assert_eq!(body["auth"]["scope"]["domain"]["id"], "d1");
    }

    #[test]
    fn catalog_lookup_and_context() {
        let body: TokenResponse = serde_json::from_value(json!({
            "token": {
                "user": { "id": "u1", "name": "alice", "domain": { "id": "d1", "name": "Default" } },
                "project": { "id": "p1", "name": "monitoring", "domain": { "id": "d1", "name": "Default" } },
                "roles": [ { "id": "r1", "name": "monitoring_viewer" } ],
                "catalog": [
                    { "type": "identity", "endpoints": [ { "interface": "public", "url": "http://keystone" } ] },
                    { "type": "metrics", "endpoints": [
                        { "interface": "internal", "url": "http://maia.internal" },
                        { "interface": "public", "url": "http://maia.public" }
                    ] }
                ]
            }
        }))
        .unwrap();

        assert_eq!(body.token.metrics_endpoint().as_deref(), Some("http://maia.public"));

        let context = body.token.policy_context("tok".into());
        assert_eq!(context.token(), Some("tok"));
        assert_eq!(context.tenant_id(), Some("p1"));
        assert_eq!(context.roles, vec!["monitoring_viewer".to_string()]);
    }
}
