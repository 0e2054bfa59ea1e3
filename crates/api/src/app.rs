use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;

use campus_authz::{
    GrantError, GrantService, InMemoryAssignmentStore, Permission, PermissionCatalog,
    PermissionResolver, ResolveError, Role, RoleAssignment, RoleContext,
};
use campus_core::{AssignmentId, IdentityId};

use crate::context::IdentityContext;
use crate::identity::IdentityProvider;
use crate::middleware::{AuthState, auth_middleware};

const ROLES_ASSIGN: &str = "roles.assign";

#[derive(Clone)]
struct Services {
    resolver: PermissionResolver,
    grants: GrantService,
}

/// Build the application router.
///
/// Uses the school default catalog over an in-memory assignment store. When
/// `bootstrap_admin` is given, that identity is seeded with the ADMIN role so
/// a fresh deployment has someone able to grant further assignments.
pub async fn build_app(
    provider: Arc<dyn IdentityProvider>,
    bootstrap_admin: Option<IdentityId>,
) -> anyhow::Result<Router> {
    let catalog = Arc::new(PermissionCatalog::school_default());
    let store = Arc::new(InMemoryAssignmentStore::new());

    let resolver = PermissionResolver::new(catalog.clone(), store.clone());
    let grants = GrantService::new(catalog, store);

    if let Some(admin) = bootstrap_admin {
        grants
            .grant(admin, Role::new("ADMIN"), RoleContext::new(), None)
            .await?;
        tracing::info!(identity_id = %admin, "seeded bootstrap admin");
    }

    let services = Services { resolver, grants };
    let auth_state = AuthState { provider };

    Ok(Router::new()
        .route("/identities/:id/permissions", get(effective_permissions))
        .route("/permissions/check", post(check_permissions))
        .route("/assignments", post(create_assignment))
        .route("/assignments/:id", delete(delete_assignment))
        .layer(ServiceBuilder::new().layer(axum::middleware::from_fn_with_state(
            auth_state,
            auth_middleware,
        )))
        .with_state(services))
}

// ─────────────────────────────────────────────────────────────────────────────
// DTOs
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct RoleEntry {
    name: Role,
    context: RoleContext,
}

#[derive(Debug, Serialize)]
struct EffectivePermissionsResponse {
    permissions: Vec<Permission>,
    roles: Vec<RoleEntry>,
}

#[derive(Debug, Deserialize)]
struct CheckRequest {
    permissions: Vec<Permission>,
    #[serde(default)]
    context: Option<RoleContext>,
}

#[derive(Debug, Serialize)]
struct CheckResponse {
    results: BTreeMap<Permission, bool>,
}

#[derive(Debug, Deserialize)]
struct CreateAssignmentRequest {
    identity_id: IdentityId,
    role: Role,
    #[serde(default)]
    context: Option<RoleContext>,
    #[serde(default)]
    expires_at: Option<DateTime<Utc>>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Error mapping
// ─────────────────────────────────────────────────────────────────────────────

/// API-level error: maps core failures onto HTTP statuses.
///
/// Store faults become 503 — the gate fails closed rather than defaulting any
/// decision to allow.
#[derive(Debug)]
enum ApiError {
    Forbidden,
    NotFound,
    Unprocessable(String),
    Unavailable(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Forbidden => (StatusCode::FORBIDDEN, "forbidden".to_string()),
            ApiError::NotFound => (StatusCode::NOT_FOUND, "not found".to_string()),
            ApiError::Unprocessable(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            ApiError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

impl From<ResolveError> for ApiError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::ResolutionFailed(e) => ApiError::Unavailable(e.to_string()),
            ResolveError::IdentityNotFound => ApiError::NotFound,
        }
    }
}

impl From<GrantError> for ApiError {
    fn from(err: GrantError) -> Self {
        match err {
            GrantError::UnknownRole(_) | GrantError::ExpiresInPast => {
                ApiError::Unprocessable(err.to_string())
            }
            GrantError::NotFound => ApiError::NotFound,
            GrantError::Store(e) => ApiError::Unavailable(e.to_string()),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

async fn effective_permissions(
    State(services): State<Services>,
    Extension(_identity): Extension<IdentityContext>,
    Path(identity_id): Path<IdentityId>,
) -> Result<Json<EffectivePermissionsResponse>, ApiError> {
    let snapshot = services.resolver.resolve(identity_id).await?;

    let mut permissions: Vec<Permission> = snapshot.permissions().iter().cloned().collect();
    permissions.sort();

    let roles = snapshot
        .roles()
        .map(|(role, context)| RoleEntry {
            name: role.clone(),
            context: context.clone(),
        })
        .collect();

    Ok(Json(EffectivePermissionsResponse { permissions, roles }))
}

async fn check_permissions(
    State(services): State<Services>,
    Extension(identity): Extension<IdentityContext>,
    Json(request): Json<CheckRequest>,
) -> Result<Json<CheckResponse>, ApiError> {
    let results = services
        .resolver
        .check_many(
            identity.identity_id(),
            &request.permissions,
            request.context.as_ref(),
        )
        .await?;

    Ok(Json(CheckResponse { results }))
}

async fn create_assignment(
    State(services): State<Services>,
    Extension(identity): Extension<IdentityContext>,
    Json(request): Json<CreateAssignmentRequest>,
) -> Result<(StatusCode, Json<RoleAssignment>), ApiError> {
    require_assigner(&services, identity).await?;

    let assignment = services
        .grants
        .grant(
            request.identity_id,
            request.role,
            request.context.unwrap_or_default(),
            request.expires_at,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(assignment)))
}

async fn delete_assignment(
    State(services): State<Services>,
    Extension(identity): Extension<IdentityContext>,
    Path(assignment_id): Path<AssignmentId>,
) -> Result<StatusCode, ApiError> {
    require_assigner(&services, identity).await?;

    services.grants.revoke(assignment_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Assignment management requires the caller to hold `roles.assign`.
async fn require_assigner(
    services: &Services,
    identity: IdentityContext,
) -> Result<(), ApiError> {
    let allowed = services
        .resolver
        .resolve_contextual(identity.identity_id(), &Permission::new(ROLES_ASSIGN), None)
        .await?;

    if allowed { Ok(()) } else { Err(ApiError::Forbidden) }
}
