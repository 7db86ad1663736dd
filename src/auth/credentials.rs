//! Credential resolution
//!
//! Turns the raw authentication flags of one invocation into exactly one
//! normalized credential set. Flags belonging to schemes other than the
//! selected one are cleared, so the identity provider never sees a mixed
//! request.

use log::{debug, info};
use std::str::FromStr;

use super::Session;
use super::keystone::IdentityProvider;
use crate::error::{MaiaError, Result};

/// Authentication schemes understood by the identity provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthType {
    Password,
    Token,
    ApplicationCredential,
}

impl FromStr for AuthType {
    type Err = MaiaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "password" | "v3password" => Ok(AuthType::Password),
            "token" | "v3token" => Ok(AuthType::Token),
            "v3applicationcredential" | "applicationcredential" => Ok(AuthType::ApplicationCredential),
            other => Err(MaiaError::config(format!(
                "unsupported --os-auth-type: {} (use 'password', 'token' or 'v3applicationcredential')",
                other
            ))),
        }
    }
}

impl std::fmt::Display for AuthType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AuthType::Password => "password",
            AuthType::Token => "token",
            AuthType::ApplicationCredential => "v3applicationcredential",
        };
        f.write_str(name)
    }
}

/// Project or domain a token should be scoped to
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scope {
    pub project_id: Option<String>,
    pub project_name: Option<String>,
    /// Domain of the project, or the domain itself for a domain-scoped token
    pub domain_id: Option<String>,
    pub domain_name: Option<String>,
}

impl Scope {
    pub fn is_empty(&self) -> bool {
        self.project_id.is_none()
            && self.project_name.is_none()
            && self.domain_id.is_none()
            && self.domain_name.is_none()
    }

    fn into_option(self) -> Option<Scope> {
        if self.is_empty() { None } else { Some(self) }
    }
}

/// Raw authentication inputs as collected from flags and environment.
///
/// Empty strings count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthOptions {
    pub identity_endpoint: Option<String>,
    pub auth_type: Option<String>,
    pub username: Option<String>,
    pub user_id: Option<String>,
    pub password: Option<String>,
    /// User's domain (not the scope)
    pub domain_id: Option<String>,
    pub domain_name: Option<String>,
    pub token: Option<String>,
    pub application_credential_id: Option<String>,
    pub application_credential_name: Option<String>,
    pub application_credential_secret: Option<String>,
    pub scope: Scope,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainRef {
    Id(String),
    Name(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserIdentity {
    /// A user id already implies the domain
    Id(String),
    Name { name: String, domain: Option<DomainRef> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplicationCredentialRef {
    Id(String),
    Name { name: String, user: UserIdentity },
}

/// A normalized authentication request: exactly one scheme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSet {
    Password {
        user: UserIdentity,
        password: String,
        scope: Option<Scope>,
    },
    /// Scope is kept so an existing token can be rescoped
    Token { token: String, scope: Option<Scope> },
    /// Application credentials are never scoped at authentication time
    ApplicationCredential {
        credential: ApplicationCredentialRef,
        secret: String,
    },
}

impl CredentialSet {
    pub fn auth_type(&self) -> AuthType {
        match self {
            CredentialSet::Password { .. } => AuthType::Password,
            CredentialSet::Token { .. } => AuthType::Token,
            CredentialSet::ApplicationCredential { .. } => AuthType::ApplicationCredential,
        }
    }

    pub fn scope(&self) -> Option<&Scope> {
        match self {
            CredentialSet::Password { scope, .. } | CredentialSet::Token { scope, .. } => scope.as_ref(),
            CredentialSet::ApplicationCredential { .. } => None,
        }
    }
}

fn non_empty(value: &mut Option<String>) {
    if value.as_deref().is_some_and(str::is_empty) {
        *value = None;
    }
}

impl AuthOptions {
    fn drop_empty_fields(&mut self) {
        for field in [
            &mut self.identity_endpoint,
            &mut self.auth_type,
            &mut self.username,
            &mut self.user_id,
            &mut self.password,
            &mut self.domain_id,
            &mut self.domain_name,
            &mut self.token,
            &mut self.application_credential_id,
            &mut self.application_credential_name,
            &mut self.application_credential_secret,
            &mut self.scope.project_id,
            &mut self.scope.project_name,
            &mut self.scope.domain_id,
            &mut self.scope.domain_name,
        ] {
            non_empty(field);
        }
    }

    fn clear_application_credential(&mut self) {
        self.application_credential_id = None;
        self.application_credential_name = None;
        self.application_credential_secret = None;
    }

    fn clear_user(&mut self) {
        self.user_id = None;
        self.username = None;
        self.domain_id = None;
        self.domain_name = None;
    }

    /// Validate the selected scheme and clear every field that belongs to
    /// another one. Returns the scheme that is now active.
    pub fn normalize(&mut self) -> Result<AuthType> {
        self.drop_empty_fields();

        let auth_type = match self.auth_type.as_deref() {
            Some(name) => name.parse()?,
            None => {
                info!("Authentication type defaults to {}", AuthType::Password);
                AuthType::Password
            }
        };

        match auth_type {
            AuthType::Password => {
                if self.password.is_none() {
                    return Err(MaiaError::config("you must specify --os-password"));
                }
                if self.username.is_none() && self.user_id.is_none() {
                    return Err(MaiaError::config("you must specify --os-username or --os-user-id"));
                }
                self.token = None;
                self.clear_application_credential();
            }
            AuthType::Token => {
                if self.token.is_none() {
                    return Err(MaiaError::config("you must specify --os-token"));
                }
                self.password = None;
                self.clear_user();
                self.clear_application_credential();
            }
            AuthType::ApplicationCredential => {
                if self.application_credential_secret.is_none() {
                    return Err(MaiaError::config(
                        "you must specify --os-application-credential-secret",
                    ));
                }
                if self.application_credential_name.is_some()
                    && self.username.is_none()
                    && self.user_id.is_none()
                {
                    return Err(MaiaError::config(
                        "you must specify --os-username or --os-user-id when using --os-application-credential-name",
                    ));
                }
                if self.application_credential_id.is_some() {
                    self.clear_user();
                }
                self.password = None;
                self.token = None;
                self.scope = Scope::default();
            }
        }

        self.check_ambiguity()?;
        self.auth_type = Some(auth_type.to_string());
        Ok(auth_type)
    }

    fn check_ambiguity(&self) -> Result<()> {
        if self.user_id.is_some() && self.username.is_some() {
            return Err(MaiaError::config(
                "use either --os-user-id or --os-username but not both",
            ));
        }
        if self.domain_id.is_some() && self.domain_name.is_some() {
            return Err(MaiaError::config(
                "use either --os-user-domain-id or --os-user-domain-name but not both",
            ));
        }
        if self.user_id.is_some() && (self.domain_id.is_some() || self.domain_name.is_some()) {
            return Err(MaiaError::config(
                "do not specify --os-user-domain-id or --os-user-domain-name when using --os-user-id since the user ID implies the domain",
            ));
        }
        Ok(())
    }

    fn user_identity(&self) -> Option<UserIdentity> {
        if let Some(id) = &self.user_id {
            return Some(UserIdentity::Id(id.clone()));
        }
        let name = self.username.clone()?;
        let domain = match (&self.domain_id, &self.domain_name) {
            (Some(id), _) => Some(DomainRef::Id(id.clone())),
            (None, Some(name)) => Some(DomainRef::Name(name.clone())),
            (None, None) => None,
        };
        Some(UserIdentity::Name { name, domain })
    }

    /// Normalize and convert into the single-scheme credential set.
    pub fn into_credentials(mut self) -> Result<CredentialSet> {
        let auth_type = self.normalize()?;
        let missing_user = || MaiaError::config("you must specify --os-username or --os-user-id");

        let credentials = match auth_type {
            AuthType::Password => CredentialSet::Password {
                user: self.user_identity().ok_or_else(missing_user)?,
                password: self.password.clone().unwrap_or_default(),
                scope: self.scope.clone().into_option(),
            },
            AuthType::Token => CredentialSet::Token {
                token: self.token.clone().unwrap_or_default(),
                scope: self.scope.clone().into_option(),
            },
            AuthType::ApplicationCredential => {
                let credential = match (&self.application_credential_id, &self.application_credential_name) {
                    (Some(id), _) => ApplicationCredentialRef::Id(id.clone()),
                    (None, Some(name)) => ApplicationCredentialRef::Name {
                        name: name.clone(),
                        user: self.user_identity().ok_or_else(missing_user)?,
                    },
                    (None, None) => {
                        return Err(MaiaError::config(
                            "you must specify --os-application-credential-id or --os-application-credential-name",
                        ));
                    }
                };
                CredentialSet::ApplicationCredential {
                    credential,
                    secret: self.application_credential_secret.clone().unwrap_or_default(),
                }
            }
        };

        Ok(credentials)
    }
}

/// Produce an authenticated session.
///
/// When both a token and the backend URL are already known nothing is
/// validated and no request is made. Otherwise the options are normalized and
/// handed to the identity provider; its endpoint is only used when no backend
/// URL was configured explicitly.
pub async fn resolve_session(
    options: AuthOptions,
    maia_url: Option<&str>,
    provider: &dyn IdentityProvider,
) -> Result<Session> {
    let maia_url = maia_url.filter(|url| !url.is_empty());

    if let (Some(token), Some(url)) = (options.token.as_deref().filter(|t| !t.is_empty()), maia_url) {
        debug!("Token and Maia URL given, skipping authentication");
        return Ok(Session {
            token: token.to_string(),
            endpoint: url.to_string(),
            context: Default::default(),
        });
    }

    let credentials = options.into_credentials()?;
    debug!("Authenticating with {} credentials", credentials.auth_type());

    let (context, catalog_url) = provider.authenticate(&credentials).await?;
    let token = context
        .token()
        .ok_or_else(|| MaiaError::Authentication("identity provider returned no token".to_string()))?
        .to_string();

    if let Some(tenant) = context.tenant_id() {
        debug!("Authenticated for tenant {} with roles {:?}", tenant, context.roles);
    }

    let endpoint = match maia_url {
        Some(url) => url.to_string(),
        None => catalog_url,
    };

    Ok(Session {
        token,
        endpoint,
        context,
    })
}
