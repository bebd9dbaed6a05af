//! `/api/users`: account administration.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use garde::Validate;
use roomkeep_core::access::Role;
use roomkeep_core::models::user::{CreateUser, UpdateUser, User, UserStatus};
use roomkeep_core::repository::{PaginatedResult, UserRepository};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use super::PageQuery;
use super::error::ApiResult;
use super::extract::{Authorized, guard};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/users", get(list_users).post(create_user))
        .route(
            "/api/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[garde(length(min = 3, max = 64))]
    pub username: String,
    #[garde(email)]
    pub email: String,
    #[garde(length(min = 1))]
    pub password: String,
    #[garde(skip)]
    pub role: Role,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[garde(email)]
    pub email: Option<String>,
    #[garde(skip)]
    pub role: Option<Role>,
    #[garde(skip)]
    pub status: Option<UserStatus>,
}

async fn list_users(
    _auth: Authorized<guard::ManageUsers>,
    State(state): State<AppState>,
    Query(page): Query<PageQuery>,
) -> ApiResult<Json<PaginatedResult<User>>> {
    Ok(Json(state.users.list(page.into()).await?))
}

async fn create_user(
    _auth: Authorized<guard::ManageUsers>,
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<User>)> {
    req.validate(&())?;
    let user = state
        .auth
        .create_user(CreateUser {
            username: req.username,
            email: req.email,
            password: req.password,
            role: req.role,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn get_user(
    _auth: Authorized<guard::ManageUsers>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<User>> {
    Ok(Json(state.users.get_by_id(id).await?))
}

/// Role and status changes end the user's sessions so the next refresh
/// picks up the new state.
async fn update_user(
    auth: Authorized<guard::ManageUsers>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateUserRequest>,
) -> ApiResult<Json<User>> {
    req.validate(&())?;
    let revoke = req.role.is_some() || req.status.is_some();

    let user = state
        .users
        .update(
            id,
            UpdateUser {
                email: req.email,
                role: req.role,
                status: req.status,
            },
        )
        .await?;

    if revoke {
        state.auth.revoke_all_sessions(id).await?;
    }
    info!(user_id = %id, by = %auth.user.user_id, role = user.role.as_str(), "user updated");
    Ok(Json(user))
}

async fn delete_user(
    auth: Authorized<guard::ManageUsers>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.users.delete(id).await?;
    state.auth.revoke_all_sessions(id).await?;
    info!(user_id = %id, by = %auth.user.user_id, "user deactivated");
    Ok(StatusCode::NO_CONTENT)
}
