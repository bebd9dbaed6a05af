//! Reservation domain model.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::availability::StayRange;
use crate::error::RoomkeepResult;
use crate::models::payment::Payment;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    Pending,
    Confirmed,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    pub id: Uuid,
    pub room_id: Uuid,
    /// Owning account; `None` for guest checkouts and staff-entered bookings.
    pub user_id: Option<Uuid>,
    pub customer_name: String,
    pub guests: u32,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub status: ReservationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Reservation {
    pub fn stay(&self) -> StayRange {
        StayRange::from_stored(self.check_in, self.check_out)
    }

    pub fn is_active(&self) -> bool {
        self.status != ReservationStatus::Cancelled
    }
}

/// A fully resolved reservation write.
///
/// Used for new reservations and, together with an existing id, for
/// moving one in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateReservation {
    pub room_id: Uuid,
    pub user_id: Option<Uuid>,
    pub customer_name: String,
    pub guests: u32,
    pub range: StayRange,
    pub status: ReservationStatus,
}

/// Partial staff edit of a reservation.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateReservation {
    pub room_id: Option<Uuid>,
    pub customer_name: Option<String>,
    pub guests: Option<u32>,
    pub check_in: Option<NaiveDate>,
    pub check_out: Option<NaiveDate>,
    pub status: Option<ReservationStatus>,
}

impl UpdateReservation {
    /// Merge this edit onto `current`, validating the resulting range.
    pub fn resolve(self, current: &Reservation) -> RoomkeepResult<CreateReservation> {
        let range = StayRange::new(
            self.check_in.unwrap_or(current.check_in),
            self.check_out.unwrap_or(current.check_out),
        )?;
        Ok(CreateReservation {
            room_id: self.room_id.unwrap_or(current.room_id),
            user_id: current.user_id,
            customer_name: self
                .customer_name
                .unwrap_or_else(|| current.customer_name.clone()),
            guests: self.guests.unwrap_or(current.guests),
            range,
            status: self.status.unwrap_or(current.status),
        })
    }
}

/// Filters for staff reservation listings.
#[derive(Debug, Clone, Default)]
pub struct ReservationFilter {
    pub status: Option<ReservationStatus>,
    pub room_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
}

/// Result of a checkout: the reservation and the payment written with it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub reservation: Reservation,
    pub payment: Payment,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn current() -> Reservation {
        Reservation {
            id: Uuid::new_v4(),
            room_id: Uuid::new_v4(),
            user_id: None,
            customer_name: "Ada".into(),
            guests: 2,
            check_in: "2025-05-01".parse().unwrap(),
            check_out: "2025-05-03".parse().unwrap(),
            status: ReservationStatus::Confirmed,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn empty_update_keeps_everything() {
        let cur = current();
        let resolved = UpdateReservation::default().resolve(&cur).unwrap();
        assert_eq!(resolved.room_id, cur.room_id);
        assert_eq!(resolved.range, cur.stay());
        assert_eq!(resolved.status, ReservationStatus::Confirmed);
    }

    #[test]
    fn moving_only_check_out_before_check_in_is_rejected() {
        let update = UpdateReservation {
            check_out: Some("2025-04-30".parse().unwrap()),
            ..Default::default()
        };
        assert!(update.resolve(&current()).is_err());
    }

    #[test]
    fn partial_date_change_merges_with_current() {
        let update = UpdateReservation {
            check_out: Some("2025-05-05".parse().unwrap()),
            customer_name: Some("Grace".into()),
            ..Default::default()
        };
        let resolved = update.resolve(&current()).unwrap();
        assert_eq!(resolved.range.nights(), 4);
        assert_eq!(resolved.customer_name, "Grace");
    }
}
