//! Permission/role catalog: the fixed permission universe for a deployment.

use std::borrow::Cow;
use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Permission identifier.
///
/// Permissions are modeled as opaque strings (e.g. "students.view") drawn from
/// a fixed, process-wide catalog. Equality is exact string match; permissions
/// are never created or destroyed at runtime.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Role identifier.
///
/// Roles are opaque names at this layer; the catalog maps each role to the
/// permission set it grants.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A catalog entry: one permission plus its human description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionEntry {
    pub id: Permission,
    pub description: String,
}

/// Catalog construction error.
///
/// Catalog construction happens once at process start; any of these is a fatal
/// startup error, never a runtime condition.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("duplicate permission '{0}' in catalog")]
    DuplicatePermission(String),

    #[error("duplicate role '{0}' in catalog")]
    DuplicateRole(String),

    #[error("role '{role}' grants unknown permission '{permission}'")]
    UnknownPermission { role: String, permission: String },
}

/// Immutable permission/role catalog.
///
/// Construct once via [`CatalogBuilder`] (or [`PermissionCatalog::school_default`])
/// and share by `Arc`. There is deliberately no mutation API: changing the
/// permission set of a role requires a new release, not a runtime edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionCatalog {
    permissions: Vec<PermissionEntry>,
    universe: HashSet<Permission>,
    roles: BTreeMap<Role, HashSet<Permission>>,
}

impl PermissionCatalog {
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::default()
    }

    /// All catalog permissions, in declaration order.
    pub fn permissions(&self) -> &[PermissionEntry] {
        &self.permissions
    }

    /// Role name → granted permission set, for every declared role.
    pub fn roles(&self) -> &BTreeMap<Role, HashSet<Permission>> {
        &self.roles
    }

    /// Permission set granted by a role, or `None` for an undeclared role.
    pub fn role_permissions(&self, role: &Role) -> Option<&HashSet<Permission>> {
        self.roles.get(role)
    }

    pub fn contains_role(&self, role: &Role) -> bool {
        self.roles.contains_key(role)
    }

    pub fn contains_permission(&self, permission: &Permission) -> bool {
        self.universe.contains(permission)
    }

    /// The fixed catalog for the school management deployment.
    ///
    /// Declared in code: the permission universe for a given version ships with
    /// the release. A database-backed catalog would also satisfy the resolver,
    /// which only sees the lookup surface above.
    pub fn school_default() -> Self {
        Self::builder()
            .permission("students.view", "View students and their profiles")
            .permission("students.create", "Enroll new students")
            .permission("students.update", "Edit student records")
            .permission("students.delete", "Remove students")
            .permission("groups.view", "View groups and rosters")
            .permission("groups.manage", "Create, edit and archive groups")
            .permission("tasks.view", "View tasks and submissions")
            .permission("tasks.create", "Create and assign tasks")
            .permission("tasks.grade", "Grade task submissions")
            .permission("assessments.view", "View assessment results")
            .permission("assessments.record", "Record assessment results")
            .permission("attendance.view", "View attendance records")
            .permission("attendance.mark", "Mark attendance")
            .permission("reports.view", "View aggregate reports")
            .permission("roles.view", "View role assignments")
            .permission("roles.assign", "Grant and revoke role assignments")
            .role_with_all_permissions("ADMIN")
            .role(
                "TEACHER",
                [
                    "students.view",
                    "groups.view",
                    "tasks.view",
                    "tasks.create",
                    "tasks.grade",
                    "assessments.view",
                    "assessments.record",
                    "attendance.view",
                    "attendance.mark",
                    "reports.view",
                ],
            )
            .role(
                "TUTOR",
                [
                    "students.view",
                    "tasks.view",
                    "attendance.view",
                    "attendance.mark",
                ],
            )
            .role("STUDENT", ["tasks.view", "assessments.view"])
            .build()
            .expect("school default catalog is statically valid")
    }
}

/// Builder for [`PermissionCatalog`].
///
/// Validation happens in [`CatalogBuilder::build`]: every permission a role
/// grants must exist in the declared universe.
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    permissions: Vec<PermissionEntry>,
    roles: Vec<(Role, Vec<Permission>)>,
    grant_all: Vec<Role>,
}

impl CatalogBuilder {
    pub fn permission(
        mut self,
        id: impl Into<Cow<'static, str>>,
        description: impl Into<String>,
    ) -> Self {
        self.permissions.push(PermissionEntry {
            id: Permission::new(id),
            description: description.into(),
        });
        self
    }

    pub fn role<I, P>(mut self, name: impl Into<Cow<'static, str>>, permissions: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Cow<'static, str>>,
    {
        self.roles.push((
            Role::new(name),
            permissions.into_iter().map(Permission::new).collect(),
        ));
        self
    }

    /// Declare a role granting the entire permission universe.
    ///
    /// Kept explicit rather than a `"*"` wildcard so the effective permission
    /// set stays a plain subset of the catalog.
    pub fn role_with_all_permissions(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.grant_all.push(Role::new(name));
        self
    }

    pub fn build(self) -> Result<PermissionCatalog, CatalogError> {
        let mut universe = HashSet::new();
        for entry in &self.permissions {
            if !universe.insert(entry.id.clone()) {
                return Err(CatalogError::DuplicatePermission(entry.id.to_string()));
            }
        }

        let mut roles: BTreeMap<Role, HashSet<Permission>> = BTreeMap::new();

        for (role, perms) in self.roles {
            let mut set = HashSet::with_capacity(perms.len());
            for perm in perms {
                if !universe.contains(&perm) {
                    return Err(CatalogError::UnknownPermission {
                        role: role.to_string(),
                        permission: perm.to_string(),
                    });
                }
                set.insert(perm);
            }
            if roles.insert(role.clone(), set).is_some() {
                return Err(CatalogError::DuplicateRole(role.to_string()));
            }
        }

        for role in self.grant_all {
            if roles.insert(role.clone(), universe.clone()).is_some() {
                return Err(CatalogError::DuplicateRole(role.to_string()));
            }
        }

        Ok(PermissionCatalog {
            permissions: self.permissions,
            universe,
            roles,
        })
    }
}
