//! Aggregate counts for the staff dashboard.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub rooms_total: u64,
    pub rooms_reserved: u64,
    pub rooms_dirty: u64,
    pub reservations_pending: u64,
    pub reservations_confirmed: u64,
    pub reservations_cancelled: u64,
    pub active_users: u64,
    /// Planned shifts on `date`.
    pub planned_shifts: u64,
    pub date: Option<NaiveDate>,
}
