//! Roomkeep Auth — password authentication, JWT issuance/validation
//! and refresh-token sessions.

pub mod config;
pub mod error;
pub mod password;
pub mod service;
pub mod token;

pub use config::AuthConfig;
pub use error::AuthError;
pub use service::{AuthService, LoginInput, LoginOutput, RefreshInput, RegisterInput};
pub use token::{AccessTokenClaims, ValidatedClaims};
