//! Identity oracle: external principal resolution.
//!
//! Authentication itself is someone else's job.  This module only asks the
//! configured oracle "who does this bearer token belong to" and gets back a
//! principal or nothing.  The answer is consumed before every mutation and
//! private read; it is never cached.

use std::collections::HashMap;

use serde::Deserialize;

/// The authenticated identity making a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: String,
    pub avatar_url: Option<String>,
}

/// Resolves a request's bearer token to a principal.
///
/// Implementations are synchronous; async callers go through
/// `tokio::task::spawn_blocking`.
pub trait IdentityOracle: Send + Sync {
    /// Returns the principal for `token`, `None` for an unknown or expired
    /// token, or an error when the oracle itself cannot be reached.
    fn current_principal(&self, token: &str) -> Result<Option<Principal>, String>;
}

/// Wire shape of the identity provider's verify response.
#[derive(Debug, Deserialize)]
struct VerifyResponse {
    id: String,
    #[serde(default)]
    avatar_url: Option<String>,
}

/// Production oracle: verifies tokens against the identity provider's
/// verify endpoint over HTTP.
pub struct RemoteOracle {
    verify_url: String,
}

impl RemoteOracle {
    pub fn new(verify_url: impl Into<String>) -> Self {
        Self {
            verify_url: verify_url.into(),
        }
    }
}

impl IdentityOracle for RemoteOracle {
    fn current_principal(&self, token: &str) -> Result<Option<Principal>, String> {
        let response = ureq::get(&self.verify_url)
            .set("Authorization", &format!("Bearer {token}"))
            .call();

        match response {
            Ok(resp) => {
                let verified: VerifyResponse = resp
                    .into_json()
                    .map_err(|e| format!("identity verify response unreadable: {e}"))?;
                Ok(Some(Principal {
                    id: verified.id,
                    avatar_url: verified.avatar_url,
                }))
            }
            // 401/403/404 all mean "not a valid session", not an oracle
            // outage.
            Err(ureq::Error::Status(401 | 403 | 404, _)) => Ok(None),
            Err(e) => Err(format!("identity verify failed: {e}")),
        }
    }
}

/// Fixed token-to-principal table.  Backs tests and local runs.
pub struct StaticOracle {
    tokens: HashMap<String, Principal>,
}

impl StaticOracle {
    pub fn new(entries: Vec<(String, Principal)>) -> Self {
        Self {
            tokens: entries.into_iter().collect(),
        }
    }
}

impl IdentityOracle for StaticOracle {
    fn current_principal(&self, token: &str) -> Result<Option<Principal>, String> {
        Ok(self.tokens.get(token).cloned())
    }
}

/// Development oracle: treats the bearer token itself as the principal id.
/// Anyone can claim any identity; only for credential-less local runs.
pub struct InsecureDevOracle;

impl IdentityOracle for InsecureDevOracle {
    fn current_principal(&self, token: &str) -> Result<Option<Principal>, String> {
        if token.is_empty() {
            return Ok(None);
        }
        Ok(Some(Principal {
            id: token.to_string(),
            avatar_url: None,
        }))
    }
}
