//! Staff shift schedule.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ShiftStatus {
    Planned,
    Completed,
    Canceled,
}

/// One shift of one staff member. Overlapping shifts are allowed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub id: Uuid,
    pub staff_id: Uuid,
    pub work_date: NaiveDate,
    pub shift_start: NaiveTime,
    /// May be earlier than `shift_start` for overnight shifts.
    pub shift_end: NaiveTime,
    pub status: ShiftStatus,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateScheduleEntry {
    pub staff_id: Uuid,
    pub work_date: NaiveDate,
    pub shift_start: NaiveTime,
    pub shift_end: NaiveTime,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateScheduleEntry {
    pub staff_id: Option<Uuid>,
    pub work_date: Option<NaiveDate>,
    pub shift_start: Option<NaiveTime>,
    pub shift_end: Option<NaiveTime>,
    pub status: Option<ShiftStatus>,
    /// `Some(None)` clears the note.
    pub note: Option<Option<String>>,
}

/// Listing filter; date bounds are inclusive.
#[derive(Debug, Clone, Default)]
pub struct ScheduleFilter {
    pub staff_id: Option<Uuid>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}
