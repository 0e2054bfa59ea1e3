//! Role assignment: the durable grant of one role to one identity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use campus_core::{AssignmentId, IdentityId};

use crate::catalog::Role;
use crate::context::RoleContext;

/// A durable grant of one role to one identity.
///
/// An identity may hold multiple assignments, including the same role under
/// different contexts (tutor of group A and group B are two records).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleAssignment {
    pub id: AssignmentId,
    pub identity_id: IdentityId,
    pub role: Role,

    /// Restriction on where the role applies; empty means a global grant.
    #[serde(default)]
    pub context: RoleContext,

    pub assigned_at: DateTime<Utc>,

    /// Optional expiry; an assignment past this instant contributes nothing.
    pub expires_at: Option<DateTime<Utc>>,
}

impl RoleAssignment {
    pub fn new(
        identity_id: IdentityId,
        role: Role,
        context: RoleContext,
        expires_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id: AssignmentId::new(),
            identity_id,
            role,
            context,
            assigned_at: Utc::now(),
            expires_at,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}
