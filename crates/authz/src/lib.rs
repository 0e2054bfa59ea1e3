//! `campus-authz` — permission evaluation core.
//!
//! A closed two-tier capability model: a fixed catalog of permission strings
//! grouped into roles, and a role-assignment layer that may carry a context
//! payload restricting where a role applies (e.g. tutor of one group).
//!
//! This crate is intentionally decoupled from HTTP and storage. The store is
//! an abstract collaborator behind [`AssignmentStore`]; identity verification
//! happens elsewhere and the core trusts the supplied [`IdentityId`] completely.
//!
//! [`IdentityId`]: campus_core::IdentityId

pub mod assignment;
pub mod catalog;
pub mod context;
pub mod grants;
pub mod resolver;
pub mod snapshot;
pub mod store;

pub use assignment::RoleAssignment;
pub use catalog::{CatalogBuilder, CatalogError, Permission, PermissionCatalog, Role};
pub use context::RoleContext;
pub use grants::{GrantError, GrantService};
pub use resolver::{PermissionResolver, ResolveError};
pub use snapshot::PermissionSnapshot;
pub use store::{AssignmentStore, InMemoryAssignmentStore, StoreError};
