//! `/api/auth/*` and `/api/me`: registration, tokens and password change.

use axum::extract::State;
use axum::http::header::USER_AGENT;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use garde::Validate;
use roomkeep_auth::service::{LoginInput, LoginOutput, RefreshInput, RegisterInput};
use roomkeep_core::models::user::User;
use roomkeep_core::repository::UserRepository;
use serde::{Deserialize, Serialize};

use super::error::ApiResult;
use super::extract::CurrentUser;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/refresh", post(refresh))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/password", post(change_password))
        .route("/api/me", get(me))
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[garde(length(min = 3, max = 64))]
    pub username: String,
    #[garde(email)]
    pub email: String,
    #[garde(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[garde(length(min = 1))]
    pub username_or_email: String,
    #[garde(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RefreshRequest {
    #[garde(length(min = 1))]
    pub refresh_token: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    #[garde(length(min = 1))]
    pub current_password: String,
    #[garde(length(min = 1))]
    pub new_password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    pub expires_in: u64,
    pub user: User,
}

impl From<LoginOutput> for TokenResponse {
    fn from(out: LoginOutput) -> Self {
        Self {
            access_token: out.access_token,
            refresh_token: out.refresh_token,
            token_type: "Bearer",
            expires_in: out.expires_in,
            user: out.user,
        }
    }
}

/// Client address and agent, as far as the proxy tells us.
fn client_info(headers: &HeaderMap) -> (Option<String>, Option<String>) {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    let ip = header("x-forwarded-for")
        .and_then(|v| v.split(',').next().map(|s| s.trim().to_string()))
        .filter(|s| !s.is_empty());
    (ip, header(USER_AGENT.as_str()))
}

async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<User>)> {
    req.validate(&())?;

    let user = state
        .auth
        .register(RegisterInput {
            username: req.username,
            email: req.email,
            password: req.password,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<TokenResponse>> {
    req.validate(&())?;
    let (ip_address, user_agent) = client_info(&headers);

    let out = state
        .auth
        .login(LoginInput {
            username_or_email: req.username_or_email,
            password: req.password,
            ip_address,
            user_agent,
        })
        .await?;
    Ok(Json(out.into()))
}

async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<RefreshRequest>,
) -> ApiResult<Json<TokenResponse>> {
    req.validate(&())?;
    let (ip_address, user_agent) = client_info(&headers);

    let out = state
        .auth
        .refresh(RefreshInput {
            raw_refresh_token: req.refresh_token,
            ip_address,
            user_agent,
        })
        .await?;
    Ok(Json(out.into()))
}

async fn logout(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> ApiResult<StatusCode> {
    req.validate(&())?;
    state.auth.logout(&req.refresh_token).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn change_password(
    user: CurrentUser,
    State(state): State<AppState>,
    Json(req): Json<ChangePasswordRequest>,
) -> ApiResult<StatusCode> {
    req.validate(&())?;
    state
        .auth
        .change_password(user.user_id, &req.current_password, &req.new_password)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn me(user: CurrentUser, State(state): State<AppState>) -> ApiResult<Json<User>> {
    Ok(Json(state.users.get_by_id(user.user_id).await?))
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn client_info_takes_first_forwarded_address() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("10.0.0.7, 10.0.0.1"));
        headers.insert(USER_AGENT, HeaderValue::from_static("curl/8"));

        let (ip, agent) = client_info(&headers);
        assert_eq!(ip.as_deref(), Some("10.0.0.7"));
        assert_eq!(agent.as_deref(), Some("curl/8"));
    }

    #[test]
    fn register_request_requires_an_email() {
        let req = RegisterRequest {
            username: "alice".into(),
            email: "not-an-email".into(),
            password: "correct-horse".into(),
        };
        assert!(req.validate(&()).is_err());
    }
}
