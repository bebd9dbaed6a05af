//! Booking error types.

use roomkeep_core::error::RoomkeepError;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum BookingError {
    #[error("invalid card: {0}")]
    InvalidCard(String),

    #[error("room sleeps {capacity}, requested {guests} guests")]
    CapacityExceeded { capacity: u32, guests: u32 },

    #[error("at least one guest is required")]
    NoGuests,

    #[error("reservation {0} is cancelled")]
    Cancelled(Uuid),

    #[error("reservation {0} belongs to another account")]
    NotOwner(Uuid),

    #[error("card sealing failed: {0}")]
    Crypto(String),
}

impl From<BookingError> for RoomkeepError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::InvalidCard(_)
            | BookingError::CapacityExceeded { .. }
            | BookingError::NoGuests
            | BookingError::Cancelled(_) => RoomkeepError::Validation {
                message: err.to_string(),
            },
            BookingError::NotOwner(_) => RoomkeepError::AuthorizationDenied {
                reason: err.to_string(),
            },
            BookingError::Crypto(msg) => RoomkeepError::Crypto(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_maps_to_validation() {
        let err: RoomkeepError = BookingError::CapacityExceeded {
            capacity: 2,
            guests: 3,
        }
        .into();
        match err {
            RoomkeepError::Validation { message } => {
                assert_eq!(message, "room sleeps 2, requested 3 guests");
            }
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn foreign_reservation_maps_to_authorization() {
        let err: RoomkeepError = BookingError::NotOwner(Uuid::nil()).into();
        assert!(matches!(err, RoomkeepError::AuthorizationDenied { .. }));
    }
}
