//! Checkout and reservation endpoints.
//!
//! `/api/checkout` is anonymous; `/api/me/*` acts on the caller's own
//! reservations; `/api/reservations` is the staff back office.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::NaiveDate;
use garde::Validate;
use roomkeep_booking::{CardDetails, Checkout, NewReservation};
use roomkeep_core::availability::StayRange;
use roomkeep_core::models::reservation::{
    Booking, Reservation, ReservationFilter, ReservationStatus, UpdateReservation,
};
use roomkeep_core::repository::{PaginatedResult, Pagination};
use serde::Deserialize;
use uuid::Uuid;

use super::PageQuery;
use super::error::ApiResult;
use super::extract::{Authorized, CurrentUser, guard};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/checkout", post(guest_checkout))
        .route("/api/me/checkout", post(my_checkout))
        .route("/api/me/reservations", get(my_reservations))
        .route("/api/me/reservations/:id/cancel", post(cancel_mine))
        .route(
            "/api/reservations",
            get(list_reservations).post(create_reservation),
        )
        .route(
            "/api/reservations/:id",
            get(get_reservation)
                .put(update_reservation)
                .delete(delete_reservation),
        )
        .route("/api/reservations/:id/cancel", post(cancel_reservation))
}

#[derive(Deserialize, Validate)]
pub struct CardRequest {
    #[garde(length(min = 12, max = 32))]
    pub number: String,
    #[garde(length(min = 1, max = 128))]
    pub cardholder_name: String,
    #[garde(length(min = 1, max = 128))]
    pub bank_name: String,
    #[garde(length(min = 5, max = 5))]
    pub expiry: String,
}

impl From<CardRequest> for CardDetails {
    fn from(req: CardRequest) -> Self {
        Self {
            number: req.number,
            cardholder_name: req.cardholder_name,
            bank_name: req.bank_name,
            expiry: req.expiry,
        }
    }
}

#[derive(Deserialize, Validate)]
pub struct CheckoutRequest {
    #[garde(skip)]
    pub room_id: Uuid,
    #[garde(length(min = 1, max = 128))]
    pub customer_name: String,
    #[garde(range(min = 1))]
    pub guests: u32,
    #[garde(skip)]
    pub check_in: NaiveDate,
    #[garde(skip)]
    pub check_out: NaiveDate,
    #[garde(dive)]
    pub card: CardRequest,
    /// Own reservation to move instead of creating a new one.
    #[garde(skip)]
    pub reservation_id: Option<Uuid>,
}

impl CheckoutRequest {
    fn into_checkout(self) -> ApiResult<Checkout> {
        self.validate(&())?;
        Ok(Checkout {
            room_id: self.room_id,
            customer_name: self.customer_name,
            guests: self.guests,
            range: StayRange::new(self.check_in, self.check_out)?,
            card: self.card.into(),
            reservation_id: self.reservation_id,
        })
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateReservationRequest {
    #[garde(skip)]
    pub room_id: Uuid,
    #[garde(skip)]
    pub user_id: Option<Uuid>,
    #[garde(length(min = 1, max = 128))]
    pub customer_name: String,
    #[garde(range(min = 1))]
    pub guests: u32,
    #[garde(skip)]
    pub check_in: NaiveDate,
    #[garde(skip)]
    pub check_out: NaiveDate,
    #[garde(skip)]
    pub status: Option<ReservationStatus>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateReservationRequest {
    #[garde(skip)]
    pub room_id: Option<Uuid>,
    #[garde(length(min = 1, max = 128))]
    pub customer_name: Option<String>,
    #[garde(range(min = 1))]
    pub guests: Option<u32>,
    #[garde(skip)]
    pub check_in: Option<NaiveDate>,
    #[garde(skip)]
    pub check_out: Option<NaiveDate>,
    #[garde(skip)]
    pub status: Option<ReservationStatus>,
}

impl From<UpdateReservationRequest> for UpdateReservation {
    fn from(req: UpdateReservationRequest) -> Self {
        Self {
            room_id: req.room_id,
            customer_name: req.customer_name,
            guests: req.guests,
            check_in: req.check_in,
            check_out: req.check_out,
            status: req.status,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ReservationListQuery {
    pub status: Option<ReservationStatus>,
    pub room_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub offset: Option<u64>,
    pub limit: Option<u64>,
}

async fn guest_checkout(
    State(state): State<AppState>,
    Json(req): Json<CheckoutRequest>,
) -> ApiResult<(StatusCode, Json<Booking>)> {
    let checkout = req.into_checkout()?;
    let booking = state.booking.guest_checkout(checkout).await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

async fn my_checkout(
    auth: Authorized<guard::BookRooms>,
    State(state): State<AppState>,
    Json(req): Json<CheckoutRequest>,
) -> ApiResult<(StatusCode, Json<Booking>)> {
    let checkout = req.into_checkout()?;
    let status = if checkout.reservation_id.is_some() {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    let booking = state.booking.checkout(auth.user.user_id, checkout).await?;
    Ok((status, Json(booking)))
}

async fn my_reservations(
    user: CurrentUser,
    State(state): State<AppState>,
    Query(page): Query<PageQuery>,
) -> ApiResult<Json<PaginatedResult<Reservation>>> {
    Ok(Json(state.booking.list_own(user.user_id, page.into()).await?))
}

async fn cancel_mine(
    user: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Reservation>> {
    Ok(Json(state.booking.cancel(user.actor(), id).await?))
}

async fn list_reservations(
    _auth: Authorized<guard::ManageReservations>,
    State(state): State<AppState>,
    Query(q): Query<ReservationListQuery>,
) -> ApiResult<Json<PaginatedResult<Reservation>>> {
    let filter = ReservationFilter {
        status: q.status,
        room_id: q.room_id,
        user_id: q.user_id,
    };
    let page: Pagination = PageQuery {
        offset: q.offset,
        limit: q.limit,
    }
    .into();
    Ok(Json(state.booking.list(filter, page).await?))
}

async fn create_reservation(
    _auth: Authorized<guard::ManageReservations>,
    State(state): State<AppState>,
    Json(req): Json<CreateReservationRequest>,
) -> ApiResult<(StatusCode, Json<Reservation>)> {
    req.validate(&())?;
    let reservation = state
        .booking
        .create_reservation(NewReservation {
            room_id: req.room_id,
            user_id: req.user_id,
            customer_name: req.customer_name,
            guests: req.guests,
            range: StayRange::new(req.check_in, req.check_out)?,
            status: req.status,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(reservation)))
}

async fn get_reservation(
    _auth: Authorized<guard::ManageReservations>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Reservation>> {
    Ok(Json(state.booking.get(id).await?))
}

async fn update_reservation(
    _auth: Authorized<guard::ManageReservations>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateReservationRequest>,
) -> ApiResult<Json<Reservation>> {
    req.validate(&())?;
    Ok(Json(state.booking.update_reservation(id, req.into()).await?))
}

async fn delete_reservation(
    _auth: Authorized<guard::DeleteReservations>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.booking.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn cancel_reservation(
    auth: Authorized<guard::ManageReservations>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Reservation>> {
    Ok(Json(state.booking.cancel(auth.user.actor(), id).await?))
}
