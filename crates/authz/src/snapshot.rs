//! Point-in-time permission snapshot and the checks built on it.

use std::collections::HashSet;

use crate::assignment::RoleAssignment;
use crate::catalog::{Permission, Role};
use crate::context::RoleContext;

/// A resolved, point-in-time view of an identity's permissions.
///
/// All check methods are pure reads over this snapshot; none touch the store.
/// Grants and revokes made after resolution are invisible until the caller
/// re-resolves — a caching layer must invalidate on any operation that could
/// have changed the identity's assignments.
#[derive(Debug, Clone, PartialEq)]
pub struct PermissionSnapshot {
    permissions: HashSet<Permission>,
    assignments: Vec<RoleAssignment>,
}

impl PermissionSnapshot {
    pub(crate) fn new(permissions: HashSet<Permission>, assignments: Vec<RoleAssignment>) -> Self {
        Self {
            permissions,
            assignments,
        }
    }

    /// The flattened effective permission set.
    pub fn permissions(&self) -> &HashSet<Permission> {
        &self.permissions
    }

    /// The non-expired assignments behind this snapshot, in store order.
    pub fn assignments(&self) -> &[RoleAssignment] {
        &self.assignments
    }

    /// Exact membership in the effective set.
    ///
    /// A permission string absent from the catalog can never be in any role's
    /// set, so checking it is always false — never an error.
    pub fn has_permission(&self, permission: &Permission) -> bool {
        self.permissions.contains(permission)
    }

    /// True iff at least one of the given permissions is held.
    /// False on an empty list.
    pub fn has_any_permission(&self, permissions: &[Permission]) -> bool {
        permissions.iter().any(|p| self.has_permission(p))
    }

    /// True iff every given permission is held.
    /// Vacuously true on an empty list.
    pub fn has_all_permissions(&self, permissions: &[Permission]) -> bool {
        permissions.iter().all(|p| self.has_permission(p))
    }

    /// Whether any assignment references this role name, ignoring context.
    pub fn has_role(&self, role: &Role) -> bool {
        self.assignments.iter().any(|a| &a.role == role)
    }

    /// Context of the first assignment for this role, or `None` if the role
    /// is not held. Callers use this to recover "which group is this tutor
    /// scoped to".
    pub fn role_context(&self, role: &Role) -> Option<&RoleContext> {
        self.assignments
            .iter()
            .find(|a| &a.role == role)
            .map(|a| &a.context)
    }

    /// Role/context pairs in assignment order, for display.
    pub fn roles(&self) -> impl Iterator<Item = (&Role, &RoleContext)> {
        self.assignments.iter().map(|a| (&a.role, &a.context))
    }
}
