//! Role assignment store abstraction plus the in-memory implementation.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use thiserror::Error;

use campus_core::{AssignmentId, IdentityId};

use crate::assignment::RoleAssignment;

/// Storage fault reading or writing assignments.
///
/// Surfaced to resolver callers as `ResolveError::ResolutionFailed`; never
/// swallowed, and never turned into an implicit allow.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("assignment store unavailable: {0}")]
    Unavailable(String),
}

/// Durable record of which identity holds which role.
///
/// The core only touches assignments through this narrow interface; the
/// backing implementation (database, in-memory) is a collaborator. A returned
/// record is always read whole from a single consistent load of its fields —
/// expired rows may still appear and are filtered by the resolver.
#[async_trait]
pub trait AssignmentStore: Send + Sync {
    async fn list_assignments(
        &self,
        identity_id: IdentityId,
    ) -> Result<Vec<RoleAssignment>, StoreError>;

    async fn insert(&self, assignment: RoleAssignment) -> Result<(), StoreError>;

    /// Remove an assignment; returns whether a record existed.
    async fn remove(&self, assignment_id: AssignmentId) -> Result<bool, StoreError>;

    /// Whether the store has any record of this identity (even with zero
    /// remaining assignments). Backs the caller-optional "identity must exist"
    /// resolution mode.
    async fn identity_known(&self, identity_id: IdentityId) -> Result<bool, StoreError>;
}

/// In-memory assignment store for tests/dev.
///
/// Not optimized for performance; every mutation holds the write lock for the
/// whole record so reads observe each assignment atomically.
#[derive(Debug, Default)]
pub struct InMemoryAssignmentStore {
    inner: RwLock<HashMap<IdentityId, Vec<RoleAssignment>>>,
}

impl InMemoryAssignmentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AssignmentStore for InMemoryAssignmentStore {
    async fn list_assignments(
        &self,
        identity_id: IdentityId,
    ) -> Result<Vec<RoleAssignment>, StoreError> {
        let map = self
            .inner
            .read()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;

        Ok(map.get(&identity_id).cloned().unwrap_or_default())
    }

    async fn insert(&self, assignment: RoleAssignment) -> Result<(), StoreError> {
        let mut map = self
            .inner
            .write()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;

        map.entry(assignment.identity_id)
            .or_default()
            .push(assignment);
        Ok(())
    }

    async fn remove(&self, assignment_id: AssignmentId) -> Result<bool, StoreError> {
        let mut map = self
            .inner
            .write()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;

        for assignments in map.values_mut() {
            let before = assignments.len();
            assignments.retain(|a| a.id != assignment_id);
            if assignments.len() != before {
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn identity_known(&self, identity_id: IdentityId) -> Result<bool, StoreError> {
        let map = self
            .inner
            .read()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;

        Ok(map.contains_key(&identity_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Role;
    use crate::context::RoleContext;

    fn tutor_assignment(identity: IdentityId) -> RoleAssignment {
        RoleAssignment::new(
            identity,
            Role::new("TUTOR"),
            RoleContext::new().with("groupId", "G1"),
            None,
        )
    }

    #[tokio::test]
    async fn insert_then_list_round_trips_the_record() {
        let store = InMemoryAssignmentStore::new();
        let identity = IdentityId::new();
        let assignment = tutor_assignment(identity);

        store.insert(assignment.clone()).await.unwrap();

        let listed = store.list_assignments(identity).await.unwrap();
        assert_eq!(listed, vec![assignment]);
    }

    #[tokio::test]
    async fn unknown_identity_lists_empty_and_is_not_known() {
        let store = InMemoryAssignmentStore::new();
        let identity = IdentityId::new();

        assert!(store.list_assignments(identity).await.unwrap().is_empty());
        assert!(!store.identity_known(identity).await.unwrap());
    }

    #[tokio::test]
    async fn remove_reports_whether_a_record_existed() {
        let store = InMemoryAssignmentStore::new();
        let identity = IdentityId::new();
        let assignment = tutor_assignment(identity);
        let id = assignment.id;

        store.insert(assignment).await.unwrap();

        assert!(store.remove(id).await.unwrap());
        assert!(!store.remove(id).await.unwrap());
        assert!(store.list_assignments(identity).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn identity_stays_known_after_last_assignment_is_removed() {
        let store = InMemoryAssignmentStore::new();
        let identity = IdentityId::new();
        let assignment = tutor_assignment(identity);
        let id = assignment.id;

        store.insert(assignment).await.unwrap();
        store.remove(id).await.unwrap();

        assert!(store.identity_known(identity).await.unwrap());
    }
}
