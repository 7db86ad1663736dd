use std::collections::HashMap;

/// Authorization attributes returned alongside a token.
///
/// The client only uses them for diagnostics; policy enforcement happens on
/// the server side.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicyContext {
    /// Attributes of the authenticated token (`token`, `user_id`, `project_id`, `domain_id`, ...)
    pub auth: HashMap<String, String>,
    /// Role names granted on the scope
    pub roles: Vec<String>,
}

impl PolicyContext {
    pub fn token(&self) -> Option<&str> {
        self.auth.get("token").map(|s| s.as_str())
    }

    /// The project id if the token is project scoped, otherwise the domain id.
    pub fn tenant_id(&self) -> Option<&str> {
        self.auth
            .get("project_id")
            .or_else(|| self.auth.get("domain_id"))
            .map(|s| s.as_str())
    }
}
