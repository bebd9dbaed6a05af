//! SurrealDB implementation of [`ScheduleRepository`].
//!
//! Shift times are stored as zero-padded `HH:MM` strings so that string
//! ordering matches time ordering.

use chrono::{DateTime, NaiveTime, Utc};
use roomkeep_core::error::RoomkeepResult;
use roomkeep_core::models::schedule::{
    CreateScheduleEntry, ScheduleEntry, ScheduleFilter, ShiftStatus, UpdateScheduleEntry,
};
use roomkeep_core::repository::{PaginatedResult, Pagination, ScheduleRepository};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::{CountRow, date_to_datetime, datetime_to_date, parse_uuid};
use crate::error::DbError;

const SHIFT_FORMAT: &str = "%H:%M";

#[derive(Debug, SurrealValue)]
struct ScheduleRow {
    record_id: String,
    staff_id: String,
    work_date: DateTime<Utc>,
    shift_start: String,
    shift_end: String,
    status: String,
    note: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn parse_status(s: &str) -> Result<ShiftStatus, DbError> {
    match s {
        "Planned" => Ok(ShiftStatus::Planned),
        "Completed" => Ok(ShiftStatus::Completed),
        "Canceled" => Ok(ShiftStatus::Canceled),
        other => Err(DbError::Corrupt(format!("unknown shift status: {other}"))),
    }
}

fn status_to_string(s: ShiftStatus) -> &'static str {
    match s {
        ShiftStatus::Planned => "Planned",
        ShiftStatus::Completed => "Completed",
        ShiftStatus::Canceled => "Canceled",
    }
}

fn format_shift(t: NaiveTime) -> String {
    t.format(SHIFT_FORMAT).to_string()
}

fn parse_shift(s: &str) -> Result<NaiveTime, DbError> {
    NaiveTime::parse_from_str(s, SHIFT_FORMAT)
        .map_err(|e| DbError::Corrupt(format!("invalid shift time {s:?}: {e}")))
}

impl ScheduleRow {
    fn try_into_entry(self) -> Result<ScheduleEntry, DbError> {
        Ok(ScheduleEntry {
            id: parse_uuid(&self.record_id, "schedule")?,
            staff_id: parse_uuid(&self.staff_id, "staff")?,
            work_date: datetime_to_date(self.work_date),
            shift_start: parse_shift(&self.shift_start)?,
            shift_end: parse_shift(&self.shift_end)?,
            status: parse_status(&self.status)?,
            note: self.note,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the Schedule repository.
#[derive(Clone)]
pub struct SurrealScheduleRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealScheduleRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> ScheduleRepository for SurrealScheduleRepository<C> {
    async fn create(&self, input: CreateScheduleEntry) -> RoomkeepResult<ScheduleEntry> {
        let id = Uuid::new_v4();

        self.db
            .query(
                "CREATE type::record('schedule', $id) SET \
                 staff_id = $staff_id, work_date = $work_date, \
                 shift_start = $shift_start, shift_end = $shift_end, \
                 status = 'Planned', note = $note",
            )
            .bind(("id", id.to_string()))
            .bind(("staff_id", input.staff_id.to_string()))
            .bind(("work_date", date_to_datetime(input.work_date)))
            .bind(("shift_start", format_shift(input.shift_start)))
            .bind(("shift_end", format_shift(input.shift_end)))
            .bind(("note", input.note))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::from_write("schedule", e.to_string()))?;

        self.get_by_id(id).await
    }

    async fn get_by_id(&self, id: Uuid) -> RoomkeepResult<ScheduleEntry> {
        let mut result = self
            .db
            .query("SELECT meta::id(id) AS record_id, * FROM type::record('schedule', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ScheduleRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("schedule", id))?;

        Ok(row.try_into_entry()?)
    }

    async fn update(&self, id: Uuid, input: UpdateScheduleEntry) -> RoomkeepResult<ScheduleEntry> {
        self.get_by_id(id).await?;

        let mut sets = Vec::new();
        if input.staff_id.is_some() {
            sets.push("staff_id = $staff_id");
        }
        if input.work_date.is_some() {
            sets.push("work_date = $work_date");
        }
        if input.shift_start.is_some() {
            sets.push("shift_start = $shift_start");
        }
        if input.shift_end.is_some() {
            sets.push("shift_end = $shift_end");
        }
        if input.status.is_some() {
            sets.push("status = $status");
        }
        if input.note.is_some() {
            sets.push("note = $note");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('schedule', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id.to_string()));
        if let Some(staff_id) = input.staff_id {
            builder = builder.bind(("staff_id", staff_id.to_string()));
        }
        if let Some(work_date) = input.work_date {
            builder = builder.bind(("work_date", date_to_datetime(work_date)));
        }
        if let Some(shift_start) = input.shift_start {
            builder = builder.bind(("shift_start", format_shift(shift_start)));
        }
        if let Some(shift_end) = input.shift_end {
            builder = builder.bind(("shift_end", format_shift(shift_end)));
        }
        if let Some(status) = input.status {
            builder = builder.bind(("status", status_to_string(status)));
        }
        if let Some(note) = input.note {
            // Some(None) clears the note
            builder = builder.bind(("note", note));
        }

        builder
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        self.get_by_id(id).await
    }

    async fn delete(&self, id: Uuid) -> RoomkeepResult<()> {
        self.get_by_id(id).await?;

        self.db
            .query("DELETE type::record('schedule', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn list(
        &self,
        filter: ScheduleFilter,
        pagination: Pagination,
    ) -> RoomkeepResult<PaginatedResult<ScheduleEntry>> {
        let mut conditions = Vec::new();
        if filter.staff_id.is_some() {
            conditions.push("staff_id = $staff_id");
        }
        if filter.from.is_some() {
            conditions.push("work_date >= $from");
        }
        if filter.to.is_some() {
            conditions.push("work_date <= $to");
        }
        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let query = format!(
            "SELECT count() AS total FROM schedule {where_clause} GROUP ALL;\n\
             SELECT meta::id(id) AS record_id, * FROM schedule {where_clause} \
             ORDER BY work_date ASC, shift_start ASC LIMIT $limit START $offset"
        );

        let mut builder = self
            .db
            .query(query)
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset));
        if let Some(staff_id) = filter.staff_id {
            builder = builder.bind(("staff_id", staff_id.to_string()));
        }
        if let Some(from) = filter.from {
            builder = builder.bind(("from", date_to_datetime(from)));
        }
        if let Some(to) = filter.to {
            builder = builder.bind(("to", date_to_datetime(to)));
        }

        let mut result = builder.await.map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let rows: Vec<ScheduleRow> = result.take(1).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(ScheduleRow::try_into_entry)
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
    fn shift_times_round_trip_as_padded_strings() {
        let t = NaiveTime::from_hms_opt(7, 5, 0).unwrap();
        assert_eq!(format_shift(t), "07:05");
        assert_eq!(parse_shift("07:05").unwrap(), t);
        assert!(parse_shift("7am").is_err());
    }
}
