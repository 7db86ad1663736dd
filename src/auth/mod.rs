pub mod context;
pub mod credentials;
pub mod keystone;

pub use context::PolicyContext;
pub use credentials::{
    ApplicationCredentialRef, AuthOptions, AuthType, CredentialSet, DomainRef, Scope, UserIdentity,
    resolve_session,
};
pub use keystone::{IdentityProvider, KeystoneClient};

/// Result of a successful authentication. Lives for one invocation and is
/// never persisted or refreshed.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub endpoint: String,
    pub context: PolicyContext,
}
