//! Authentication service: registration, login, token rotation and
//! password changes.

use chrono::{Duration, Utc};
use roomkeep_core::access::Role;
use roomkeep_core::error::{RoomkeepError, RoomkeepResult};
use roomkeep_core::models::session::CreateSession;
use roomkeep_core::models::user::{CreateUser, User, UserStatus};
use roomkeep_core::repository::{SessionRepository, UserRepository};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::password;
use crate::token;

/// Input for self-registration.
#[derive(Debug)]
pub struct RegisterInput {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Input for the login flow.
#[derive(Debug)]
pub struct LoginInput {
    pub username_or_email: String,
    pub password: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// Token pair handed back by login and refresh.
#[derive(Debug)]
pub struct LoginOutput {
    /// Signed JWT access token.
    pub access_token: String,
    /// Raw opaque refresh token. Only its hash is stored.
    pub refresh_token: String,
    pub session_id: Uuid,
    /// Access token lifetime in seconds.
    pub expires_in: u64,
    pub user: User,
}

/// Input for the refresh token rotation flow.
#[derive(Debug)]
pub struct RefreshInput {
    pub raw_refresh_token: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// Authentication service, generic over repository implementations so
/// that it has no dependency on the database crate.
pub struct AuthService<U: UserRepository, S: SessionRepository> {
    user_repo: U,
    session_repo: S,
    config: AuthConfig,
}

impl<U: UserRepository, S: SessionRepository> AuthService<U, S> {
    pub fn new(user_repo: U, session_repo: S, config: AuthConfig) -> Self {
        Self {
            user_repo,
            session_repo,
            config,
        }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Self-service sign-up. Always creates an active `user` account.
    pub async fn register(&self, input: RegisterInput) -> RoomkeepResult<User> {
        self.create_user(CreateUser {
            username: input.username,
            email: input.email,
            password: input.password,
            role: Role::User,
        })
        .await
    }

    /// Create an account with any role (admin user management and
    /// bootstrap).
    pub async fn create_user(&self, input: CreateUser) -> RoomkeepResult<User> {
        password::check_policy(&input.password, self.config.min_password_length)?;
        let user = self.user_repo.create(input).await?;
        info!(user_id = %user.id, role = user.role.as_str(), "user created");
        Ok(user)
    }

    /// Authenticate with username or email plus password and issue a
    /// token pair.
    pub async fn login(&self, input: LoginInput) -> RoomkeepResult<LoginOutput> {
        match self.session_repo.cleanup_expired().await {
            Ok(0) => {}
            Ok(purged) => debug!(purged, "expired sessions removed"),
            Err(e) => warn!(error = %e, "expired session cleanup failed"),
        }

        let user = match self
            .user_repo
            .get_by_username(&input.username_or_email)
            .await
        {
            Ok(u) => u,
            Err(RoomkeepError::NotFound { .. }) => self
                .user_repo
                .get_by_email(&input.username_or_email)
                .await
                .map_err(|_| AuthError::InvalidCredentials)?,
            Err(e) => return Err(e),
        };

        let valid = password::verify_password(
            &input.password,
            &user.password_hash,
            self.config.pepper.as_deref(),
        )?;
        if !valid {
            return Err(AuthError::InvalidCredentials.into());
        }

        if user.status != UserStatus::Active {
            return Err(AuthError::AccountInactive.into());
        }

        let output = self
            .issue_pair(user, input.ip_address, input.user_agent)
            .await?;
        info!(user_id = %output.user.id, session_id = %output.session_id, "login");
        Ok(output)
    }

    /// Consume a refresh token and issue a new pair. Each refresh token
    /// works once; the old session is removed before the new one exists.
    pub async fn refresh(&self, input: RefreshInput) -> RoomkeepResult<LoginOutput> {
        let token_hash = token::hash_refresh_token(&input.raw_refresh_token);
        let session = self
            .session_repo
            .get_by_token_hash(&token_hash)
            .await
            .map_err(|e| match e {
                RoomkeepError::NotFound { .. } => {
                    AuthError::TokenInvalid("refresh token not found or already used".into())
                        .into()
                }
                other => other,
            })?;

        // whoever removes the row owns the rotation; a concurrent loser
        // sees the same answer as a replay
        if !self.session_repo.invalidate(session.id).await? {
            return Err(AuthError::TokenInvalid("refresh token already used".into()).into());
        }

        if session.expires_at <= Utc::now() {
            return Err(AuthError::TokenExpired.into());
        }

        let user = self.user_repo.get_by_id(session.user_id).await?;
        if user.status != UserStatus::Active {
            return Err(AuthError::AccountInactive.into());
        }

        self.issue_pair(user, input.ip_address, input.user_agent)
            .await
    }

    /// Invalidate the session behind a raw refresh token. Unknown tokens
    /// are ignored so logout is idempotent.
    pub async fn logout(&self, raw_refresh_token: &str) -> RoomkeepResult<()> {
        let token_hash = token::hash_refresh_token(raw_refresh_token);
        match self.session_repo.get_by_token_hash(&token_hash).await {
            Ok(session) => {
                self.session_repo.invalidate(session.id).await?;
                info!(user_id = %session.user_id, session_id = %session.id, "logout");
                Ok(())
            }
            Err(RoomkeepError::NotFound { .. }) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Verify the current password, store the new one and revoke every
    /// session of the user.
    pub async fn change_password(
        &self,
        user_id: Uuid,
        current_password: &str,
        new_password: &str,
    ) -> RoomkeepResult<()> {
        let user = self.user_repo.get_by_id(user_id).await?;

        let valid = password::verify_password(
            current_password,
            &user.password_hash,
            self.config.pepper.as_deref(),
        )?;
        if !valid {
            return Err(AuthError::InvalidCredentials.into());
        }
        password::check_policy(new_password, self.config.min_password_length)?;

        self.user_repo.set_password(user_id, new_password).await?;
        self.revoke_all_sessions(user_id).await?;
        info!(%user_id, "password changed");
        Ok(())
    }

    pub async fn revoke_all_sessions(&self, user_id: Uuid) -> RoomkeepResult<()> {
        self.session_repo.invalidate_user_sessions(user_id).await
    }

    async fn issue_pair(
        &self,
        user: User,
        ip_address: Option<String>,
        user_agent: Option<String>,
    ) -> RoomkeepResult<LoginOutput> {
        let raw_refresh = token::generate_refresh_token();
        let expires_at =
            Utc::now() + Duration::seconds(self.config.refresh_token_lifetime_secs as i64);

        let session = self
            .session_repo
            .create(CreateSession {
                user_id: user.id,
                token_hash: token::hash_refresh_token(&raw_refresh),
                ip_address,
                user_agent,
                expires_at,
            })
            .await?;

        let access_token = token::issue_access_token(user.id, user.role, &self.config)?;

        Ok(LoginOutput {
            access_token,
            refresh_token: raw_refresh,
            session_id: session.id,
            expires_in: self.config.access_token_lifetime_secs,
            user,
        })
    }
}
