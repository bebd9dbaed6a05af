//! Stay ranges and the reservation conflict rule.
//!
//! A stay occupies the half-open night interval `[check_in, check_out)`.
//! Two stays on the same room conflict iff they share at least one
//! night, so a guest may check in on the day the previous guest checks
//! out. The database layer expresses the same rule as a single
//! SurrealQL filter; both must stay in lockstep.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{RoomkeepError, RoomkeepResult};
use crate::models::reservation::{Reservation, ReservationStatus};

/// Longest stay a single reservation may cover.
pub const MAX_STAY_NIGHTS: i64 = 365;

/// A non-empty `[check_in, check_out)` range of nights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawStayRange")]
pub struct StayRange {
    check_in: NaiveDate,
    check_out: NaiveDate,
}

#[derive(Deserialize)]
struct RawStayRange {
    check_in: NaiveDate,
    check_out: NaiveDate,
}

impl TryFrom<RawStayRange> for StayRange {
    type Error = RoomkeepError;

    fn try_from(raw: RawStayRange) -> Result<Self, Self::Error> {
        StayRange::new(raw.check_in, raw.check_out)
    }
}

impl StayRange {
    /// Build a range, rejecting empty, inverted and over-long stays.
    pub fn new(check_in: NaiveDate, check_out: NaiveDate) -> RoomkeepResult<Self> {
        if check_in >= check_out {
            return Err(RoomkeepError::validation(format!(
                "check_out ({check_out}) must be after check_in ({check_in})"
            )));
        }
        if (check_out - check_in).num_days() > MAX_STAY_NIGHTS {
            return Err(RoomkeepError::validation(format!(
                "a stay may not exceed {MAX_STAY_NIGHTS} nights"
            )));
        }
        Ok(Self {
            check_in,
            check_out,
        })
    }

    /// Wrap dates read back from storage, which were validated on write.
    pub(crate) fn from_stored(check_in: NaiveDate, check_out: NaiveDate) -> Self {
        Self {
            check_in,
            check_out,
        }
    }

    pub fn check_in(&self) -> NaiveDate {
        self.check_in
    }

    pub fn check_out(&self) -> NaiveDate {
        self.check_out
    }

    /// Number of nights billed for this stay.
    pub fn nights(&self) -> u32 {
        (self.check_out - self.check_in).num_days().max(0) as u32
    }

    /// True when both stays share at least one night.
    ///
    /// Covers every arrangement: `other` containing `self`, `self`
    /// containing `other`, and partial overlap at either end.
    pub fn overlaps(&self, other: &StayRange) -> bool {
        self.check_in < other.check_out && other.check_in < self.check_out
    }
}

/// A candidate stay to test against a room's existing reservations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AvailabilityQuery {
    pub room_id: Uuid,
    pub range: StayRange,
    /// Reservation to ignore, used when moving an existing booking.
    pub exclude_reservation_id: Option<Uuid>,
}

impl AvailabilityQuery {
    pub fn new(room_id: Uuid, range: StayRange) -> Self {
        Self {
            room_id,
            range,
            exclude_reservation_id: None,
        }
    }

    pub fn excluding(mut self, reservation_id: Uuid) -> Self {
        self.exclude_reservation_id = Some(reservation_id);
        self
    }

    /// Whether `reservation` blocks this candidate.
    pub fn is_blocked_by(&self, reservation: &Reservation) -> bool {
        reservation.room_id == self.room_id
            && reservation.status != ReservationStatus::Cancelled
            && Some(reservation.id) != self.exclude_reservation_id
            && reservation.stay().overlaps(&self.range)
    }

    /// In-memory form of the availability check over a slice of
    /// reservations.
    pub fn conflicts_with(&self, reservations: &[Reservation]) -> bool {
        reservations.iter().any(|r| self.is_blocked_by(r))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn range(a: &str, b: &str) -> StayRange {
        StayRange::new(date(a), date(b)).unwrap()
    }

    fn reservation(
        id: Uuid,
        room_id: Uuid,
        a: &str,
        b: &str,
        status: ReservationStatus,
    ) -> Reservation {
        Reservation {
            id,
            room_id,
            user_id: None,
            customer_name: "Test Guest".into(),
            guests: 2,
            check_in: date(a),
            check_out: date(b),
            status,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn empty_and_inverted_ranges_are_rejected() {
        assert!(StayRange::new(date("2025-04-20"), date("2025-04-20")).is_err());
        assert!(StayRange::new(date("2025-04-22"), date("2025-04-20")).is_err());
    }

    #[test]
    fn stays_longer_than_a_year_are_rejected() {
        assert_eq!(range("2025-01-01", "2026-01-01").nights(), 365);
        assert!(StayRange::new(date("2025-01-01"), date("2026-01-02")).is_err());
        assert!(StayRange::new(date("2025-01-01"), date("9999-12-31")).is_err());

        let long = r#"{"check_in":"2025-01-01","check_out":"9999-12-31"}"#;
        assert!(serde_json::from_str::<StayRange>(long).is_err());
    }

    #[test]
    fn nights_counts_check_out_exclusive() {
        assert_eq!(range("2025-04-20", "2025-04-22").nights(), 2);
        assert_eq!(range("2025-02-28", "2025-03-01").nights(), 1);
    }

    #[test]
    fn overlap_sub_cases() {
        let existing = range("2025-04-20", "2025-04-24");
        // check-in inside existing
        assert!(range("2025-04-23", "2025-04-26").overlaps(&existing));
        // check-out inside existing
        assert!(range("2025-04-18", "2025-04-21").overlaps(&existing));
        // existing contains candidate
        assert!(range("2025-04-21", "2025-04-22").overlaps(&existing));
        // candidate contains existing
        assert!(range("2025-04-19", "2025-04-25").overlaps(&existing));
        // identical
        assert!(existing.overlaps(&existing));
    }

    #[test]
    fn same_day_turnover_is_allowed() {
        let existing = range("2025-04-20", "2025-04-22");
        assert!(!range("2025-04-22", "2025-04-24").overlaps(&existing));
        assert!(!range("2025-04-18", "2025-04-20").overlaps(&existing));
    }

    #[test]
    fn booked_room_scenarios() {
        let room = Uuid::new_v4();
        let booked = vec![reservation(
            Uuid::new_v4(),
            room,
            "2025-04-20",
            "2025-04-22",
            ReservationStatus::Confirmed,
        )];

        let q = |a, b| AvailabilityQuery::new(room, range(a, b));
        assert!(q("2025-04-21", "2025-04-23").conflicts_with(&booked));
        assert!(!q("2025-04-22", "2025-04-24").conflicts_with(&booked));
        assert!(!q("2025-04-23", "2025-04-25").conflicts_with(&booked));
    }

    #[test]
    fn cancelled_reservations_do_not_block() {
        let room = Uuid::new_v4();
        let booked = vec![reservation(
            Uuid::new_v4(),
            room,
            "2025-04-20",
            "2025-04-22",
            ReservationStatus::Cancelled,
        )];
        let q = AvailabilityQuery::new(room, range("2025-04-21", "2025-04-23"));
        assert!(!q.conflicts_with(&booked));
    }

    #[test]
    fn excluded_reservation_never_conflicts_with_itself() {
        let room = Uuid::new_v4();
        let id = Uuid::new_v4();
        let booked = vec![reservation(
            id,
            room,
            "2025-05-01",
            "2025-05-03",
            ReservationStatus::Pending,
        )];
        let q = AvailabilityQuery::new(room, range("2025-05-01", "2025-05-03"));
        assert!(q.conflicts_with(&booked));
        assert!(!q.excluding(id).conflicts_with(&booked));
    }

    #[test]
    fn deserializing_an_inverted_range_fails() {
        let json = r#"{"check_in":"2025-04-22","check_out":"2025-04-20"}"#;
        assert!(serde_json::from_str::<StayRange>(json).is_err());
        let ok = r#"{"check_in":"2025-04-20","check_out":"2025-04-22"}"#;
        assert_eq!(serde_json::from_str::<StayRange>(ok).unwrap().nights(), 2);
    }

    #[test]
    fn other_rooms_do_not_block() {
        let booked = vec![reservation(
            Uuid::new_v4(),
            Uuid::new_v4(),
            "2025-04-20",
            "2025-04-22",
            ReservationStatus::Confirmed,
        )];
        let q = AvailabilityQuery::new(Uuid::new_v4(), range("2025-04-20", "2025-04-22"));
        assert!(!q.conflicts_with(&booked));
    }
}
