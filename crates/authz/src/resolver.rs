//! Permission resolver: computes effective permission sets from assignments.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;

use campus_core::IdentityId;

use crate::assignment::RoleAssignment;
use crate::catalog::{Permission, PermissionCatalog};
use crate::context::RoleContext;
use crate::snapshot::PermissionSnapshot;
use crate::store::{AssignmentStore, StoreError};

/// Resolution failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// The store could not be read. Callers decide whether to retry or fail
    /// the enclosing request; permission gates treat this as deny.
    #[error("permission resolution failed: {0}")]
    ResolutionFailed(#[from] StoreError),

    /// Only returned by [`PermissionResolver::resolve_existing`]: the caller
    /// required the identity to exist and the store has no record of it.
    #[error("identity not found")]
    IdentityNotFound,
}

/// Computes effective permission sets for identities.
///
/// A resolution is a single logical read sequence: load assignments, map each
/// through the catalog, union the results. The resolver holds no mutable state
/// and is safely callable concurrently; abandoning a resolution mid-load has
/// no side effects since this path performs no writes.
#[derive(Clone)]
pub struct PermissionResolver {
    catalog: Arc<PermissionCatalog>,
    store: Arc<dyn AssignmentStore>,
}

impl PermissionResolver {
    pub fn new(catalog: Arc<PermissionCatalog>, store: Arc<dyn AssignmentStore>) -> Self {
        Self { catalog, store }
    }

    pub fn catalog(&self) -> &PermissionCatalog {
        &self.catalog
    }

    /// Resolve the effective permission set for an identity.
    ///
    /// Returns a point-in-time [`PermissionSnapshot`]: the flattened permission
    /// set for fast checks plus the surviving assignments so callers can render
    /// role names and contexts. An identity with zero assignments resolves to
    /// an empty snapshot, not an error.
    pub async fn resolve(&self, identity_id: IdentityId) -> Result<PermissionSnapshot, ResolveError> {
        let assignments = self.load_active(identity_id).await?;
        let permissions = effective_permissions(&self.catalog, &assignments);

        tracing::debug!(
            identity_id = %identity_id,
            assignments = assignments.len(),
            permissions = permissions.len(),
            "resolved permission snapshot"
        );

        Ok(PermissionSnapshot::new(permissions, assignments))
    }

    /// Like [`PermissionResolver::resolve`], but fails with
    /// [`ResolveError::IdentityNotFound`] when the store has never seen the
    /// identity. For callers that need the identity to exist.
    pub async fn resolve_existing(
        &self,
        identity_id: IdentityId,
    ) -> Result<PermissionSnapshot, ResolveError> {
        if !self.store.identity_known(identity_id).await? {
            return Err(ResolveError::IdentityNotFound);
        }
        self.resolve(identity_id).await
    }

    /// Contextual single-permission check.
    ///
    /// True iff at least one non-expired assignment grants `permission` and its
    /// stored context is satisfied by `context`. An omitted `context` matches
    /// every assignment (the permissive default documented on
    /// [`RoleContext::satisfied_by`]).
    pub async fn resolve_contextual(
        &self,
        identity_id: IdentityId,
        permission: &Permission,
        context: Option<&RoleContext>,
    ) -> Result<bool, ResolveError> {
        let assignments = self.load_active(identity_id).await?;
        let granted = assignments
            .iter()
            .any(|a| self.grants_in_context(a, permission, context));

        tracing::debug!(
            identity_id = %identity_id,
            permission = %permission,
            granted,
            "contextual permission check"
        );

        Ok(granted)
    }

    /// Batched check: one boolean per requested permission, each computed
    /// independently under the contextual rule, from a single store load.
    pub async fn check_many(
        &self,
        identity_id: IdentityId,
        permissions: &[Permission],
        context: Option<&RoleContext>,
    ) -> Result<BTreeMap<Permission, bool>, ResolveError> {
        let assignments = self.load_active(identity_id).await?;

        Ok(permissions
            .iter()
            .map(|permission| {
                let granted = assignments
                    .iter()
                    .any(|a| self.grants_in_context(a, permission, context));
                (permission.clone(), granted)
            })
            .collect())
    }

    async fn load_active(
        &self,
        identity_id: IdentityId,
    ) -> Result<Vec<RoleAssignment>, ResolveError> {
        let now = Utc::now();
        let mut assignments = self.store.list_assignments(identity_id).await?;
        assignments.retain(|a| !a.is_expired(now));
        Ok(assignments)
    }

    fn grants_in_context(
        &self,
        assignment: &RoleAssignment,
        permission: &Permission,
        context: Option<&RoleContext>,
    ) -> bool {
        let Some(role_permissions) = self.catalog.role_permissions(&assignment.role) else {
            // Stored role absent from this deployment's catalog grants nothing.
            tracing::warn!(role = %assignment.role, "assignment references undeclared role");
            return false;
        };

        role_permissions.contains(permission) && assignment.context.satisfied_by(context)
    }
}

/// Union of role permission sets over the given assignments.
///
/// Pure accumulation step of a resolution: duplicates across roles collapse
/// (set union), and assignments whose role the catalog does not declare
/// contribute nothing.
pub fn effective_permissions(
    catalog: &PermissionCatalog,
    assignments: &[RoleAssignment],
) -> HashSet<Permission> {
    let mut effective = HashSet::new();
    for assignment in assignments {
        if let Some(role_permissions) = catalog.role_permissions(&assignment.role) {
            effective.extend(role_permissions.iter().cloned());
        } else {
            tracing::warn!(role = %assignment.role, "assignment references undeclared role");
        }
    }
    effective
}
