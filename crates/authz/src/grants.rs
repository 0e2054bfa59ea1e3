//! Grant/revoke service: the validated write path for role assignments.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;

use campus_core::{AssignmentId, IdentityId};

use crate::assignment::RoleAssignment;
use crate::catalog::{PermissionCatalog, Role};
use crate::context::RoleContext;
use crate::store::{AssignmentStore, StoreError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GrantError {
    /// The role name is not declared in this deployment's catalog.
    /// Rejected before any store write.
    #[error("unknown role '{0}'")]
    UnknownRole(String),

    /// The requested expiry is already in the past.
    #[error("expires_at is in the past")]
    ExpiresInPast,

    /// Revocation target does not exist.
    #[error("assignment not found")]
    NotFound,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Creates and revokes role assignments, validating against the catalog
/// before touching the store.
#[derive(Clone)]
pub struct GrantService {
    catalog: Arc<PermissionCatalog>,
    store: Arc<dyn AssignmentStore>,
}

impl GrantService {
    pub fn new(catalog: Arc<PermissionCatalog>, store: Arc<dyn AssignmentStore>) -> Self {
        Self { catalog, store }
    }

    /// Grant `role` to `identity_id`, optionally scoped by `context` and
    /// time-bound by `expires_at`.
    ///
    /// Validation is synchronous and happens before the store write: an
    /// unknown role name or an already-elapsed expiry never reaches storage.
    pub async fn grant(
        &self,
        identity_id: IdentityId,
        role: Role,
        context: RoleContext,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<RoleAssignment, GrantError> {
        if !self.catalog.contains_role(&role) {
            return Err(GrantError::UnknownRole(role.to_string()));
        }
        if let Some(at) = expires_at {
            if at <= Utc::now() {
                return Err(GrantError::ExpiresInPast);
            }
        }

        let assignment = RoleAssignment::new(identity_id, role, context, expires_at);
        self.store.insert(assignment.clone()).await?;

        tracing::info!(
            identity_id = %assignment.identity_id,
            role = %assignment.role,
            assignment_id = %assignment.id,
            contextual = !assignment.context.is_empty(),
            "granted role assignment"
        );

        Ok(assignment)
    }

    pub async fn revoke(&self, assignment_id: AssignmentId) -> Result<(), GrantError> {
        if !self.store.remove(assignment_id).await? {
            return Err(GrantError::NotFound);
        }

        tracing::info!(assignment_id = %assignment_id, "revoked role assignment");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    use crate::catalog::Permission;
    use crate::resolver::PermissionResolver;
    use crate::store::InMemoryAssignmentStore;

    fn catalog() -> Arc<PermissionCatalog> {
        Arc::new(
            PermissionCatalog::builder()
                .permission("students.view", "View students")
                .permission("students.delete", "Remove students")
                .permission("attendance.mark", "Mark attendance")
                .role("TUTOR", ["students.view", "attendance.mark"])
                .build()
                .unwrap(),
        )
    }

    fn service() -> (GrantService, PermissionResolver) {
        let catalog = catalog();
        let store: Arc<dyn AssignmentStore> = Arc::new(InMemoryAssignmentStore::new());
        (
            GrantService::new(catalog.clone(), store.clone()),
            PermissionResolver::new(catalog, store),
        )
    }

    #[tokio::test]
    async fn unknown_role_is_rejected_before_any_write() {
        let (grants, resolver) = service();
        let identity = IdentityId::new();

        let err = grants
            .grant(identity, Role::new("HEADMASTER"), RoleContext::new(), None)
            .await
            .unwrap_err();

        assert_eq!(err, GrantError::UnknownRole("HEADMASTER".to_string()));
        // Nothing reached the store.
        assert!(resolver
            .resolve(identity)
            .await
            .unwrap()
            .assignments()
            .is_empty());
    }

    #[tokio::test]
    async fn past_expiry_is_rejected() {
        let (grants, _resolver) = service();

        let err = grants
            .grant(
                IdentityId::new(),
                Role::new("TUTOR"),
                RoleContext::new(),
                Some(Utc::now() - Duration::minutes(1)),
            )
            .await
            .unwrap_err();

        assert_eq!(err, GrantError::ExpiresInPast);
    }

    #[tokio::test]
    async fn revoking_missing_assignment_is_not_found() {
        let (grants, _resolver) = service();

        let err = grants.revoke(AssignmentId::new()).await.unwrap_err();
        assert_eq!(err, GrantError::NotFound);
    }

    #[tokio::test]
    async fn revoked_role_disappears_on_next_resolution() {
        let (grants, resolver) = service();
        let identity = IdentityId::new();

        let assignment = grants
            .grant(identity, Role::new("TUTOR"), RoleContext::new(), None)
            .await
            .unwrap();
        assert!(resolver
            .resolve(identity)
            .await
            .unwrap()
            .has_permission(&Permission::new("students.view")));

        grants.revoke(assignment.id).await.unwrap();

        let snapshot = resolver.resolve(identity).await.unwrap();
        assert!(snapshot.permissions().is_empty());
        assert!(snapshot.assignments().is_empty());
    }

    // The full scenario: grant a contextual TUTOR, then check the exact
    // decisions the snapshot must produce.
    #[tokio::test]
    async fn grant_then_resolve_end_to_end() {
        let (grants, resolver) = service();
        let u1 = IdentityId::new();

        grants
            .grant(
                u1,
                Role::new("TUTOR"),
                RoleContext::new().with("groupId", "G1"),
                None,
            )
            .await
            .unwrap();

        let snapshot = resolver.resolve(u1).await.unwrap();

        assert!(snapshot.has_permission(&Permission::new("students.view")));
        assert!(snapshot.has_permission(&Permission::new("attendance.mark")));
        assert!(!snapshot.has_permission(&Permission::new("students.delete")));

        let context = snapshot.role_context(&Role::new("TUTOR")).unwrap();
        assert_eq!(context.get("groupId"), Some(&serde_json::Value::from("G1")));

        // Same role twice under different contexts: two separate records.
        grants
            .grant(
                u1,
                Role::new("TUTOR"),
                RoleContext::new().with("groupId", "G2"),
                None,
            )
            .await
            .unwrap();
        let snapshot = resolver.resolve(u1).await.unwrap();
        assert_eq!(snapshot.assignments().len(), 2);
    }
}
