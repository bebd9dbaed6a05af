//! Roomkeep Server — REST API over the booking, auth and inventory
//! services.

pub mod api;
pub mod config;
pub mod state;

use roomkeep_core::access::Role;
use roomkeep_core::error::{RoomkeepError, RoomkeepResult};
use roomkeep_core::models::user::CreateUser;
use roomkeep_core::repository::UserRepository;
use tracing::info;

pub use api::router;
pub use config::ServerConfig;
pub use state::AppState;

/// Create the configured administrator unless the username is taken.
pub async fn bootstrap_admin(
    state: &AppState,
    admin: &config::BootstrapAdmin,
) -> RoomkeepResult<()> {
    match state.users.get_by_username(&admin.username).await {
        Ok(_) => {
            info!(username = %admin.username, "bootstrap admin already present");
            Ok(())
        }
        Err(RoomkeepError::NotFound { .. }) => {
            state
                .auth
                .create_user(CreateUser {
                    username: admin.username.clone(),
                    email: admin.email.clone(),
                    password: admin.password.clone(),
                    role: Role::Admin,
                })
                .await?;
            Ok(())
        }
        Err(e) => Err(e),
    }
}
