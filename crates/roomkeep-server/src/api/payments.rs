//! `/api/payments`: read access for front desk, overwrite for admins.

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use garde::Validate;
use roomkeep_core::models::payment::{Payment, UpdatePayment};
use roomkeep_core::repository::{PaginatedResult, PaymentRepository};
use serde::Deserialize;
use uuid::Uuid;

use super::PageQuery;
use super::error::ApiResult;
use super::extract::{Authorized, guard};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/payments", get(list_payments))
        .route("/api/payments/:id", get(get_payment).put(update_payment))
        .route("/api/reservations/:id/payment", get(get_reservation_payment))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePaymentRequest {
    #[garde(skip)]
    pub amount_cents: Option<u64>,
    #[garde(length(min = 1, max = 128))]
    pub cardholder_name: Option<String>,
    #[garde(length(min = 1, max = 128))]
    pub bank_name: Option<String>,
}

async fn list_payments(
    _auth: Authorized<guard::ViewPayments>,
    State(state): State<AppState>,
    Query(page): Query<PageQuery>,
) -> ApiResult<Json<PaginatedResult<Payment>>> {
    Ok(Json(state.payments.list(page.into()).await?))
}

async fn get_payment(
    _auth: Authorized<guard::ViewPayments>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Payment>> {
    Ok(Json(state.payments.get_by_id(id).await?))
}

async fn get_reservation_payment(
    _auth: Authorized<guard::ViewPayments>,
    State(state): State<AppState>,
    Path(reservation_id): Path<Uuid>,
) -> ApiResult<Json<Payment>> {
    Ok(Json(state.payments.get_by_reservation(reservation_id).await?))
}

async fn update_payment(
    _auth: Authorized<guard::ManagePayments>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdatePaymentRequest>,
) -> ApiResult<Json<Payment>> {
    req.validate(&())?;
    let update = UpdatePayment {
        amount_cents: req.amount_cents,
        cardholder_name: req.cardholder_name,
        bank_name: req.bank_name,
    };
    Ok(Json(state.payments.update(id, update).await?))
}
