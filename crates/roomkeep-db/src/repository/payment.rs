//! SurrealDB implementation of [`PaymentRepository`].
//!
//! Payments are only ever written together with their reservation (see
//! the reservation repository); this repository reads them and applies
//! admin overwrites.

use chrono::{DateTime, Utc};
use roomkeep_core::error::RoomkeepResult;
use roomkeep_core::models::payment::{Payment, UpdatePayment};
use roomkeep_core::repository::{PaginatedResult, Pagination, PaymentRepository};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::{CountRow, parse_uuid};
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct PaymentRow {
    record_id: String,
    reservation_id: String,
    amount_cents: u64,
    cardholder_name: String,
    bank_name: String,
    card_last4: String,
    card_expiry: String,
    sealed_card_number: Option<String>,
    paid_at: DateTime<Utc>,
}

impl PaymentRow {
    fn try_into_payment(self) -> Result<Payment, DbError> {
        Ok(Payment {
            id: parse_uuid(&self.record_id, "payment")?,
            reservation_id: parse_uuid(&self.reservation_id, "reservation")?,
            amount_cents: self.amount_cents,
            cardholder_name: self.cardholder_name,
            bank_name: self.bank_name,
            card_last4: self.card_last4,
            card_expiry: self.card_expiry,
            sealed_card_number: self.sealed_card_number,
            paid_at: self.paid_at,
        })
    }
}

/// Load the payment attached to `reservation_id`.
pub(crate) async fn fetch_by_reservation<C: Connection>(
    db: &Surreal<C>,
    reservation_id: Uuid,
) -> Result<Payment, DbError> {
    let mut result = db
        .query(
            "SELECT meta::id(id) AS record_id, * FROM payment \
             WHERE reservation_id = $reservation_id",
        )
        .bind(("reservation_id", reservation_id.to_string()))
        .await?;

    let rows: Vec<PaymentRow> = result.take(0)?;
    let row = rows
        .into_iter()
        .next()
        .ok_or_else(|| DbError::not_found("payment", format!("reservation={reservation_id}")))?;

    row.try_into_payment()
}

/// SurrealDB implementation of the Payment repository.
#[derive(Clone)]
pub struct SurrealPaymentRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealPaymentRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> PaymentRepository for SurrealPaymentRepository<C> {
    async fn get_by_id(&self, id: Uuid) -> RoomkeepResult<Payment> {
        let mut result = self
            .db
            .query("SELECT meta::id(id) AS record_id, * FROM type::record('payment', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PaymentRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("payment", id))?;

        Ok(row.try_into_payment()?)
    }

    async fn get_by_reservation(&self, reservation_id: Uuid) -> RoomkeepResult<Payment> {
        Ok(fetch_by_reservation(&self.db, reservation_id).await?)
    }

    async fn update(&self, id: Uuid, input: UpdatePayment) -> RoomkeepResult<Payment> {
        self.get_by_id(id).await?;

        let mut sets = Vec::new();
        if input.amount_cents.is_some() {
            sets.push("amount_cents = $amount_cents");
        }
        if input.cardholder_name.is_some() {
            sets.push("cardholder_name = $cardholder_name");
        }
        if input.bank_name.is_some() {
            sets.push("bank_name = $bank_name");
        }
        if sets.is_empty() {
            return self.get_by_id(id).await;
        }

        let query = format!(
            "UPDATE type::record('payment', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id.to_string()));
        if let Some(amount_cents) = input.amount_cents {
            builder = builder.bind(("amount_cents", amount_cents));
        }
        if let Some(cardholder_name) = input.cardholder_name {
            builder = builder.bind(("cardholder_name", cardholder_name));
        }
        if let Some(bank_name) = input.bank_name {
            builder = builder.bind(("bank_name", bank_name));
        }

        builder
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        self.get_by_id(id).await
    }

    async fn list(&self, pagination: Pagination) -> RoomkeepResult<PaginatedResult<Payment>> {
        let mut count_result = self
            .db
            .query("SELECT count() AS total FROM payment GROUP ALL")
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM payment \
                 ORDER BY paid_at DESC \
                 LIMIT $limit START $offset",
            )
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PaymentRow> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(PaymentRow::try_into_payment)
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
