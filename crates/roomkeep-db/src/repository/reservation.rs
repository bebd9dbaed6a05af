//! SurrealDB implementation of [`ReservationRepository`].
//!
//! Every write that can place a stay on a room runs as a single
//! `BEGIN TRANSACTION … COMMIT TRANSACTION` block: the room lookup, the
//! conflict filter and the writes commit together, and a `THROW` inside
//! the block rolls everything back. Thrown markers are mapped back to
//! typed errors; when a failure carries no marker the read-only
//! availability check decides what to report.

use chrono::{DateTime, Utc};
use roomkeep_core::availability::AvailabilityQuery;
use roomkeep_core::error::{RoomkeepError, RoomkeepResult};
use roomkeep_core::models::payment::NewPayment;
use roomkeep_core::models::reservation::{
    Booking, CreateReservation, Reservation, ReservationFilter, ReservationStatus,
};
use roomkeep_core::repository::{PaginatedResult, Pagination, ReservationRepository};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::{debug, info};
use uuid::Uuid;

use super::payment::fetch_by_reservation;
use super::{CountRow, date_to_datetime, datetime_to_date, parse_uuid};
use crate::error::DbError;

const ROOM_NOT_FOUND: &str = "roomkeep:room-not-found";
const ROOM_UNAVAILABLE: &str = "roomkeep:room-unavailable";
const RESERVATION_NOT_FOUND: &str = "roomkeep:reservation-not-found";

// -----------------------------------------------------------------------
// Transaction statements
// -----------------------------------------------------------------------

const ROOM_GUARD: &str = "\
LET $room = (SELECT id FROM type::record('room', $room_id));
IF array::len($room) = 0 { THROW 'roomkeep:room-not-found'; };";

const CONFLICT_GUARD: &str = concat!(
    "LET $clash = (SELECT id FROM reservation WHERE ",
    conflict_filter!("$room_id"),
    ");\nIF array::len($clash) > 0 { THROW 'roomkeep:room-unavailable'; };",
);

const EXISTING_GUARD: &str = "\
LET $previous = (SELECT room_id, status FROM type::record('reservation', $id));
IF array::len($previous) = 0 { THROW 'roomkeep:reservation-not-found'; };
LET $moved = $previous[0].room_id != $room_id;
LET $was_active = $previous[0].status != 'Cancelled';";

const INSERT_RESERVATION: &str = "\
CREATE type::record('reservation', $id) SET \
room_id = $room_id, user_id = $user_id, customer_name = $customer_name, \
guests = $guests, check_in = $check_in, check_out = $check_out, \
status = $status;";

const UPDATE_RESERVATION: &str = "\
UPDATE type::record('reservation', $id) SET \
room_id = $room_id, customer_name = $customer_name, guests = $guests, \
check_in = $check_in, check_out = $check_out, status = $status, \
updated_at = time::now();";

const DELETE_PAYMENT: &str = "DELETE payment WHERE reservation_id = $id;";

const INSERT_PAYMENT: &str = "\
CREATE type::record('payment', $payment_id) SET \
reservation_id = $id, amount_cents = $amount_cents, \
cardholder_name = $cardholder_name, bank_name = $bank_name, \
card_last4 = $card_last4, card_expiry = $card_expiry, \
sealed_card_number = $sealed_card_number;";

const OCCUPY_ROOM: &str = "\
UPDATE type::record('room', $room_id) SET \
is_reserved = true, housekeeping = 'Dirty', updated_at = time::now();";

const RELEASE_ROOM: &str = "\
UPDATE type::record('room', $room_id) SET \
is_reserved = false, housekeeping = 'Dirty', updated_at = time::now();";

const RELEASE_PREVIOUS_ROOM: &str = "\
IF $moved { \
UPDATE type::record('room', $previous[0].room_id) SET \
is_reserved = false, housekeeping = 'Dirty', updated_at = time::now(); };";

// Flags only move when the stay starts, ends or changes rooms; edits that
// keep an active stay in place (or touch a cancelled one) leave the room alone.
const SYNC_ROOM_FLAGS: &str = "\
IF $was_active AND ($moved OR $status = 'Cancelled') { \
UPDATE type::record('room', $previous[0].room_id) SET \
is_reserved = false, housekeeping = 'Dirty', updated_at = time::now(); };
IF $status != 'Cancelled' AND ($moved OR $was_active = false) { \
UPDATE type::record('room', $room_id) SET \
is_reserved = true, housekeeping = 'Dirty', updated_at = time::now(); };";

fn transaction(statements: &[&str]) -> String {
    let mut sql = String::from("BEGIN TRANSACTION;\n");
    for statement in statements {
        sql.push_str(statement);
        sql.push('\n');
    }
    sql.push_str("COMMIT TRANSACTION;");
    sql
}

// -----------------------------------------------------------------------
// Rows
// -----------------------------------------------------------------------

#[derive(Debug, SurrealValue)]
struct ReservationRow {
    record_id: String,
    room_id: String,
    user_id: Option<String>,
    customer_name: String,
    guests: u32,
    check_in: DateTime<Utc>,
    check_out: DateTime<Utc>,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct IdRow {
    record_id: String,
}

fn parse_status(s: &str) -> Result<ReservationStatus, DbError> {
    match s {
        "Pending" => Ok(ReservationStatus::Pending),
        "Confirmed" => Ok(ReservationStatus::Confirmed),
        "Cancelled" => Ok(ReservationStatus::Cancelled),
        other => Err(DbError::Corrupt(format!("unknown reservation status: {other}"))),
    }
}

fn status_to_string(s: ReservationStatus) -> &'static str {
    match s {
        ReservationStatus::Pending => "Pending",
        ReservationStatus::Confirmed => "Confirmed",
        ReservationStatus::Cancelled => "Cancelled",
    }
}

impl ReservationRow {
    fn try_into_reservation(self) -> Result<Reservation, DbError> {
        Ok(Reservation {
            id: parse_uuid(&self.record_id, "reservation")?,
            room_id: parse_uuid(&self.room_id, "room")?,
            user_id: self
                .user_id
                .as_deref()
                .map(|u| parse_uuid(u, "user"))
                .transpose()?,
            customer_name: self.customer_name,
            guests: self.guests,
            check_in: datetime_to_date(self.check_in),
            check_out: datetime_to_date(self.check_out),
            status: parse_status(&self.status)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// One transactional reservation write.
struct StayWrite<'a> {
    id: Uuid,
    input: &'a CreateReservation,
    /// Exclude `id` itself from the conflict check.
    exclude_self: bool,
    payment: Option<&'a NewPayment>,
    statements: &'a [&'a str],
}

/// SurrealDB implementation of the Reservation repository.
#[derive(Clone)]
pub struct SurrealReservationRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealReservationRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn room_exists(&self, room_id: Uuid) -> Result<bool, DbError> {
        let mut result = self
            .db
            .query("SELECT meta::id(id) AS record_id FROM type::record('room', $room_id)")
            .bind(("room_id", room_id.to_string()))
            .await?;
        let rows: Vec<IdRow> = result.take(0)?;
        Ok(!rows.is_empty())
    }

    async fn execute(&self, write: StayWrite<'_>) -> RoomkeepResult<()> {
        let input = write.input;
        let exclude_id = if write.exclude_self {
            write.id.to_string()
        } else {
            String::new()
        };

        let mut builder = self
            .db
            .query(transaction(write.statements))
            .bind(("id", write.id.to_string()))
            .bind(("room_id", input.room_id.to_string()))
            .bind(("user_id", input.user_id.map(|u| u.to_string())))
            .bind(("customer_name", input.customer_name.clone()))
            .bind(("guests", input.guests))
            .bind(("check_in", date_to_datetime(input.range.check_in())))
            .bind(("check_out", date_to_datetime(input.range.check_out())))
            .bind(("status", status_to_string(input.status)))
            .bind(("exclude_id", exclude_id));

        if let Some(payment) = write.payment {
            builder = builder
                .bind(("payment_id", Uuid::new_v4().to_string()))
                .bind(("amount_cents", payment.amount_cents))
                .bind(("cardholder_name", payment.cardholder_name.clone()))
                .bind(("bank_name", payment.bank_name.clone()))
                .bind(("card_last4", payment.card_last4.clone()))
                .bind(("card_expiry", payment.card_expiry.clone()))
                .bind(("sealed_card_number", payment.sealed_card_number.clone()));
        }

        let failure = match builder.await {
            Ok(response) => match response.check() {
                Ok(_) => return Ok(()),
                Err(e) => e.to_string(),
            },
            Err(e) => e.to_string(),
        };

        let mut query = AvailabilityQuery::new(input.room_id, input.range);
        if write.exclude_self {
            query = query.excluding(write.id);
        }
        Err(self.classify_failure(failure, write.id, query).await)
    }

    /// Turn a failed transaction into the error the caller should see.
    async fn classify_failure(
        &self,
        message: String,
        reservation_id: Uuid,
        query: AvailabilityQuery,
    ) -> RoomkeepError {
        debug!(%reservation_id, error = %message, "Reservation transaction rolled back");

        if message.contains(ROOM_UNAVAILABLE) {
            return DbError::RoomUnavailable {
                room_id: query.room_id,
            }
            .into();
        }
        if message.contains(ROOM_NOT_FOUND) {
            return DbError::not_found("room", query.room_id).into();
        }
        if message.contains(RESERVATION_NOT_FOUND) {
            return DbError::not_found("reservation", reservation_id).into();
        }

        // No marker: fall back to the read-only check.
        match self.has_conflict(query).await {
            Ok(true) => DbError::RoomUnavailable {
                room_id: query.room_id,
            }
            .into(),
            Err(e @ RoomkeepError::NotFound { .. }) => e,
            _ => DbError::from_write("reservation", message).into(),
        }
    }

    async fn load_booking(&self, id: Uuid) -> RoomkeepResult<Booking> {
        let reservation = self.get_by_id(id).await?;
        let payment = fetch_by_reservation(&self.db, id).await?;
        Ok(Booking {
            reservation,
            payment,
        })
    }
}

impl<C: Connection> ReservationRepository for SurrealReservationRepository<C> {
    async fn has_conflict(&self, query: AvailabilityQuery) -> RoomkeepResult<bool> {
        const CONFLICT_COUNT: &str = concat!(
            "SELECT count() AS total FROM reservation WHERE ",
            conflict_filter!("$room_id"),
            " GROUP ALL",
        );

        if !self.room_exists(query.room_id).await? {
            return Err(DbError::not_found("room", query.room_id).into());
        }

        let mut result = self
            .db
            .query(CONFLICT_COUNT)
            .bind(("room_id", query.room_id.to_string()))
            .bind(("check_in", date_to_datetime(query.range.check_in())))
            .bind(("check_out", date_to_datetime(query.range.check_out())))
            .bind((
                "exclude_id",
                query
                    .exclude_reservation_id
                    .map(|id| id.to_string())
                    .unwrap_or_default(),
            ))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0) > 0)
    }

    async fn create(&self, input: CreateReservation) -> RoomkeepResult<Reservation> {
        let id = Uuid::new_v4();
        let statements: &[&str] = if input.status == ReservationStatus::Cancelled {
            &[ROOM_GUARD, INSERT_RESERVATION]
        } else {
            &[ROOM_GUARD, CONFLICT_GUARD, INSERT_RESERVATION, OCCUPY_ROOM]
        };

        self.execute(StayWrite {
            id,
            input: &input,
            exclude_self: false,
            payment: None,
            statements,
        })
        .await?;

        info!(reservation_id = %id, room_id = %input.room_id, "Reservation created");
        self.get_by_id(id).await
    }

    async fn book(&self, input: CreateReservation, payment: NewPayment) -> RoomkeepResult<Booking> {
        let id = Uuid::new_v4();

        self.execute(StayWrite {
            id,
            input: &input,
            exclude_self: false,
            payment: Some(&payment),
            statements: &[
                ROOM_GUARD,
                CONFLICT_GUARD,
                INSERT_RESERVATION,
                INSERT_PAYMENT,
                OCCUPY_ROOM,
            ],
        })
        .await?;

        info!(
            reservation_id = %id,
            room_id = %input.room_id,
            nights = input.range.nights(),
            "Room booked"
        );
        self.load_booking(id).await
    }

    async fn rebook(
        &self,
        id: Uuid,
        input: CreateReservation,
        payment: NewPayment,
    ) -> RoomkeepResult<Booking> {
        self.execute(StayWrite {
            id,
            input: &input,
            exclude_self: true,
            payment: Some(&payment),
            statements: &[
                EXISTING_GUARD,
                ROOM_GUARD,
                CONFLICT_GUARD,
                UPDATE_RESERVATION,
                DELETE_PAYMENT,
                INSERT_PAYMENT,
                RELEASE_PREVIOUS_ROOM,
                OCCUPY_ROOM,
            ],
        })
        .await?;

        info!(reservation_id = %id, room_id = %input.room_id, "Reservation rebooked");
        self.load_booking(id).await
    }

    async fn update(&self, id: Uuid, input: CreateReservation) -> RoomkeepResult<Reservation> {
        let statements: &[&str] = if input.status == ReservationStatus::Cancelled {
            &[EXISTING_GUARD, ROOM_GUARD, UPDATE_RESERVATION, SYNC_ROOM_FLAGS]
        } else {
            &[
                EXISTING_GUARD,
                ROOM_GUARD,
                CONFLICT_GUARD,
                UPDATE_RESERVATION,
                SYNC_ROOM_FLAGS,
            ]
        };

        self.execute(StayWrite {
            id,
            input: &input,
            exclude_self: true,
            payment: None,
            statements,
        })
        .await?;

        info!(reservation_id = %id, status = ?input.status, "Reservation updated");
        self.get_by_id(id).await
    }

    async fn cancel(&self, id: Uuid) -> RoomkeepResult<Reservation> {
        let current = self.get_by_id(id).await?;
        if current.status == ReservationStatus::Cancelled {
            return Ok(current);
        }

        let input = CreateReservation {
            room_id: current.room_id,
            user_id: current.user_id,
            customer_name: current.customer_name.clone(),
            guests: current.guests,
            range: current.stay(),
            status: ReservationStatus::Cancelled,
        };
        self.update(id, input).await
    }

    async fn delete(&self, id: Uuid) -> RoomkeepResult<()> {
        let current = self.get_by_id(id).await?;
        const DELETE_RESERVATION: &str = "DELETE type::record('reservation', $id);";
        let statements: &[&str] = if current.status == ReservationStatus::Cancelled {
            &[DELETE_RESERVATION, DELETE_PAYMENT]
        } else {
            &[DELETE_RESERVATION, DELETE_PAYMENT, RELEASE_ROOM]
        };

        self.db
            .query(transaction(statements))
            .bind(("id", id.to_string()))
            .bind(("room_id", current.room_id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        info!(reservation_id = %id, room_id = %current.room_id, "Reservation deleted");
        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> RoomkeepResult<Reservation> {
        let mut result = self
            .db
            .query("SELECT meta::id(id) AS record_id, * FROM type::record('reservation', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ReservationRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("reservation", id))?;

        Ok(row.try_into_reservation()?)
    }

    async fn list(
        &self,
        filter: ReservationFilter,
        pagination: Pagination,
    ) -> RoomkeepResult<PaginatedResult<Reservation>> {
        let mut conditions = Vec::new();
        if filter.status.is_some() {
            conditions.push("status = $status");
        }
        if filter.room_id.is_some() {
            conditions.push("room_id = $room_id");
        }
        if filter.user_id.is_some() {
            conditions.push("user_id = $user_id");
        }
        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let count_sql = format!("SELECT count() AS total FROM reservation {where_clause} GROUP ALL");
        let list_sql = format!(
            "SELECT meta::id(id) AS record_id, * FROM reservation {where_clause} \
             ORDER BY check_in DESC LIMIT $limit START $offset"
        );

        let mut builder = self
            .db
            .query(format!("{count_sql};\n{list_sql}"))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset));
        if let Some(status) = filter.status {
            builder = builder.bind(("status", status_to_string(status)));
        }
        if let Some(room_id) = filter.room_id {
            builder = builder.bind(("room_id", room_id.to_string()));
        }
        if let Some(user_id) = filter.user_id {
            builder = builder.bind(("user_id", user_id.to_string()));
        }

        let mut result = builder.await.map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let rows: Vec<ReservationRow> = result.take(1).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(ReservationRow::try_into_reservation)
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guards_throw_the_markers_they_are_matched_by() {
        assert!(ROOM_GUARD.contains(ROOM_NOT_FOUND));
        assert!(CONFLICT_GUARD.contains(ROOM_UNAVAILABLE));
        assert!(EXISTING_GUARD.contains(RESERVATION_NOT_FOUND));
    }

    #[test]
    fn transaction_wraps_statements() {
        let sql = transaction(&[ROOM_GUARD, CONFLICT_GUARD]);
        assert!(sql.starts_with("BEGIN TRANSACTION;"));
        assert!(sql.ends_with("COMMIT TRANSACTION;"));
        assert!(sql.contains("status != 'Cancelled'"));
    }
}
