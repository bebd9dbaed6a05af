//! SurrealDB repository implementations.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

/// The reservation conflict filter, parameterised by the expression that
/// yields the room id.
///
/// Expects `$check_in`, `$check_out` and `$exclude_id` (empty string when
/// nothing is excluded) to be bound. Matches active reservations whose
/// half-open `[check_in, check_out)` range intersects the candidate.
/// Every availability decision in this crate is built from this one
/// fragment.
macro_rules! conflict_filter {
    ($room:literal) => {
        concat!(
            "room_id = ",
            $room,
            " AND status != 'Cancelled'",
            " AND meta::id(id) != $exclude_id",
            " AND check_in < $check_out AND $check_in < check_out",
        )
    };
}

mod dashboard;
mod payment;
mod reservation;
mod room;
mod schedule;
mod session;
mod user;

pub use dashboard::SurrealDashboardRepository;
pub use payment::SurrealPaymentRepository;
pub use reservation::SurrealReservationRepository;
pub use room::SurrealRoomRepository;
pub use schedule::SurrealScheduleRepository;
pub use session::SurrealSessionRepository;
pub use user::SurrealUserRepository;

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
pub(crate) struct CountRow {
    pub total: u64,
}

pub(crate) fn parse_uuid(value: &str, what: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(value).map_err(|e| DbError::Corrupt(format!("invalid {what} UUID: {e}")))
}

/// Dates are stored as datetimes at midnight UTC.
pub(crate) fn date_to_datetime(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

pub(crate) fn datetime_to_date(value: DateTime<Utc>) -> NaiveDate {
    value.date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_filter_uses_half_open_comparison() {
        let sql = conflict_filter!("$room_id");
        assert!(sql.starts_with("room_id = $room_id"));
        assert!(sql.contains("check_in < $check_out AND $check_in < check_out"));
        assert!(!sql.contains("<="));
    }

    #[test]
    fn dates_survive_storage_conversion() {
        let date: NaiveDate = "2025-04-20".parse().unwrap();
        assert_eq!(datetime_to_date(date_to_datetime(date)), date);
    }
}
