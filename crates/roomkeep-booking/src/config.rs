use roomkeep_core::models::reservation::ReservationStatus;

/// Configuration for the booking service.
#[derive(Debug, Clone)]
pub struct BookingConfig {
    /// AES-256-GCM key for sealing full card numbers. Without it only
    /// the last four digits are kept.
    pub card_encryption_key: Option<[u8; 32]>,
    /// Status given to reservations created by a paid checkout.
    pub checkout_status: ReservationStatus,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            card_encryption_key: None,
            checkout_status: ReservationStatus::Confirmed,
        }
    }
}
