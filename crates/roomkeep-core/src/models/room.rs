//! Room domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::availability::StayRange;
use crate::error::{RoomkeepError, RoomkeepResult};

/// Highest nightly rate a room may carry.
pub const MAX_PRICE_CENTS: u64 = 100_000_000;

/// Housekeeping state, independent of whether the room is reserved.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HousekeepingStatus {
    Clean,
    Dirty,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub id: Uuid,
    pub number: String,
    pub room_type: String,
    /// Maximum number of guests.
    pub capacity: u32,
    /// Nightly rate in cents.
    pub price_cents: u64,
    pub description: String,
    pub metadata: serde_json::Value,
    pub is_reserved: bool,
    pub housekeeping: HousekeepingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Room {
    /// Total price of `range` at this room's nightly rate. Fails instead of
    /// wrapping when the total does not fit a stored amount.
    pub fn quote(&self, range: &StayRange) -> RoomkeepResult<u64> {
        self.price_cents
            .checked_mul(u64::from(range.nights()))
            .filter(|total| i64::try_from(*total).is_ok())
            .ok_or_else(|| RoomkeepError::validation("stay total is too large to charge"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRoom {
    pub number: String,
    pub room_type: String,
    pub capacity: u32,
    pub price_cents: u64,
    pub description: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateRoom {
    pub number: Option<String>,
    pub room_type: Option<String>,
    pub capacity: Option<u32>,
    pub price_cents: Option<u64>,
    pub description: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

/// Parameters of an availability search.
#[derive(Debug, Clone, Copy)]
pub struct RoomSearch {
    pub range: StayRange,
    pub guests: u32,
}
