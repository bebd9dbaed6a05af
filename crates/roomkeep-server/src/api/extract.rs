//! Request extractors: the bearer-token caller and capability guards.
//!
//! A handler that takes `Authorized<guard::ManageRooms>` only runs when
//! the caller's role grants `Capability::ManageRooms`; the check happens
//! once, before the handler body.

use std::marker::PhantomData;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use roomkeep_auth::token;
use roomkeep_booking::Actor;
use roomkeep_core::access::{Capability, Role};
use roomkeep_core::error::RoomkeepError;
use uuid::Uuid;

use super::error::ApiError;
use crate::state::AppState;

/// The caller identified by a valid access token.
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser {
    pub user_id: Uuid,
    pub role: Role,
}

impl CurrentUser {
    pub fn actor(self) -> Actor {
        Actor {
            user_id: self.user_id,
            role: self.role,
        }
    }
}

fn bearer(parts: &Parts) -> Result<&str, ApiError> {
    let value = parts
        .headers
        .get(AUTHORIZATION)
        .ok_or_else(|| ApiError::unauthenticated("missing bearer token"))?
        .to_str()
        .map_err(|_| ApiError::unauthenticated("malformed authorization header"))?;

    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::unauthenticated("expected a bearer token"))
}

#[axum::async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let raw = bearer(parts)?;
        let claims = token::validate_access_token(raw, state.auth.config())
            .map_err(RoomkeepError::from)?;
        Ok(Self {
            user_id: claims.user_id().map_err(RoomkeepError::from)?,
            role: claims.role(),
        })
    }
}

/// Compile-time name of a capability.
pub trait Guard: Send + Sync + 'static {
    const CAPABILITY: Capability;
}

/// A [`CurrentUser`] whose role grants `G::CAPABILITY`.
pub struct Authorized<G> {
    pub user: CurrentUser,
    _guard: PhantomData<G>,
}

#[axum::async_trait]
impl<G: Guard> FromRequestParts<AppState> for Authorized<G> {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let user = CurrentUser::from_request_parts(parts, state).await?;
        user.role.require(G::CAPABILITY)?;
        Ok(Self {
            user,
            _guard: PhantomData,
        })
    }
}

macro_rules! guards {
    ($($name:ident),* $(,)?) => {
        $(
            pub struct $name;

            impl Guard for $name {
                const CAPABILITY: Capability = Capability::$name;
            }
        )*
    };
}

pub mod guard {
    use roomkeep_core::access::Capability;

    use super::Guard;

    guards! {
        ManageUsers,
        ManageRooms,
        UpdateHousekeeping,
        ManageReservations,
        DeleteReservations,
        ViewPayments,
        ManagePayments,
        ManageSchedules,
        ViewOwnSchedule,
        ViewDashboard,
        BookRooms,
    }
}

#[cfg(test)]
mod tests {
    use axum::http::Request;

    use super::*;

    fn parts_with(header: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = header {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn bearer_token_is_extracted() {
        assert_eq!(bearer(&parts_with(Some("Bearer abc.def"))).unwrap(), "abc.def");
    }

    #[test]
    fn missing_or_foreign_scheme_is_rejected() {
        assert!(bearer(&parts_with(None)).is_err());
        assert!(bearer(&parts_with(Some("Basic dXNlcjpwYXNz"))).is_err());
        assert!(bearer(&parts_with(Some("Bearer "))).is_err());
    }

    #[test]
    fn guards_name_their_capability() {
        assert_eq!(guard::ManageRooms::CAPABILITY, Capability::ManageRooms);
        assert_eq!(guard::BookRooms::CAPABILITY, Capability::BookRooms);
    }
}
