//! Identity provider boundary.

use std::collections::HashMap;

use campus_core::IdentityId;

/// Opaque identity provider: turns a bearer token into a verified identity.
///
/// The permission core performs no authentication itself; whatever sits
/// behind this trait (JWT validation, session lookup) owns credential
/// verification end to end.
pub trait IdentityProvider: Send + Sync {
    fn verify(&self, token: &str) -> Option<IdentityId>;
}

/// Token→identity table for dev and tests.
#[derive(Debug, Default)]
pub struct StaticTokenProvider {
    tokens: HashMap<String, IdentityId>,
}

impl StaticTokenProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, token: impl Into<String>, identity_id: IdentityId) -> Self {
        self.tokens.insert(token.into(), identity_id);
        self
    }
}

impl IdentityProvider for StaticTokenProvider {
    fn verify(&self, token: &str) -> Option<IdentityId> {
        self.tokens.get(token).copied()
    }
}
