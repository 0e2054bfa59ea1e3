use campus_core::IdentityId;

/// Identity context for a request.
///
/// Inserted by the auth middleware once the bearer token has been verified;
/// must be present for all protected routes. The core trusts this id
/// completely — authentication happened upstream.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct IdentityContext {
    identity_id: IdentityId,
}

impl IdentityContext {
    pub fn new(identity_id: IdentityId) -> Self {
        Self { identity_id }
    }

    pub fn identity_id(&self) -> IdentityId {
        self.identity_id
    }
}
