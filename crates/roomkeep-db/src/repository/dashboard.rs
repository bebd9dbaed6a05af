//! SurrealDB implementation of [`DashboardRepository`].

use chrono::NaiveDate;
use roomkeep_core::error::RoomkeepResult;
use roomkeep_core::models::dashboard::DashboardStats;
use roomkeep_core::repository::DashboardRepository;
use surrealdb::{Connection, Surreal};

use super::{CountRow, date_to_datetime};
use crate::error::DbError;

const STATS_QUERY: &str = "\
SELECT count() AS total FROM room GROUP ALL;
SELECT count() AS total FROM room WHERE is_reserved = true GROUP ALL;
SELECT count() AS total FROM room WHERE housekeeping = 'Dirty' GROUP ALL;
SELECT count() AS total FROM reservation WHERE status = 'Pending' GROUP ALL;
SELECT count() AS total FROM reservation WHERE status = 'Confirmed' GROUP ALL;
SELECT count() AS total FROM reservation WHERE status = 'Cancelled' GROUP ALL;
SELECT count() AS total FROM user WHERE status = 'Active' GROUP ALL;
SELECT count() AS total FROM schedule \
    WHERE work_date = $date AND status = 'Planned' GROUP ALL;";

/// Read-only aggregate counts over every table.
#[derive(Clone)]
pub struct SurrealDashboardRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealDashboardRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> DashboardRepository for SurrealDashboardRepository<C> {
    async fn stats(&self, date: NaiveDate) -> RoomkeepResult<DashboardStats> {
        let mut result = self
            .db
            .query(STATS_QUERY)
            .bind(("date", date_to_datetime(date)))
            .await
            .map_err(DbError::from)?;

        let mut counts = [0u64; 8];
        for (index, slot) in counts.iter_mut().enumerate() {
            let rows: Vec<CountRow> = result.take(index).map_err(DbError::from)?;
            *slot = rows.first().map(|r| r.total).unwrap_or(0);
        }

        let [
            rooms_total,
            rooms_reserved,
            rooms_dirty,
            reservations_pending,
            reservations_confirmed,
            reservations_cancelled,
            active_users,
            planned_shifts,
        ] = counts;

        Ok(DashboardStats {
            rooms_total,
            rooms_reserved,
            rooms_dirty,
            reservations_pending,
            reservations_confirmed,
            reservations_cancelled,
            active_users,
            planned_shifts,
            date: Some(date),
        })
    }
}
