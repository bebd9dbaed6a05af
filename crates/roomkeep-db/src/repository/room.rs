//! SurrealDB implementation of [`RoomRepository`].

use chrono::{DateTime, Utc};
use roomkeep_core::error::{RoomkeepError, RoomkeepResult};
use roomkeep_core::models::room::{CreateRoom, HousekeepingStatus, Room, RoomSearch, UpdateRoom};
use roomkeep_core::repository::{PaginatedResult, Pagination, RoomRepository};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::{CountRow, date_to_datetime, parse_uuid};
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct RoomRow {
    record_id: String,
    number: String,
    room_type: String,
    capacity: u32,
    price_cents: u64,
    description: String,
    metadata: serde_json::Value,
    is_reserved: bool,
    housekeeping: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn parse_housekeeping(s: &str) -> Result<HousekeepingStatus, DbError> {
    match s {
        "Clean" => Ok(HousekeepingStatus::Clean),
        "Dirty" => Ok(HousekeepingStatus::Dirty),
        other => Err(DbError::Corrupt(format!("unknown housekeeping status: {other}"))),
    }
}

fn housekeeping_to_string(s: HousekeepingStatus) -> &'static str {
    match s {
        HousekeepingStatus::Clean => "Clean",
        HousekeepingStatus::Dirty => "Dirty",
    }
}

impl RoomRow {
    fn try_into_room(self) -> Result<Room, DbError> {
        Ok(Room {
            id: parse_uuid(&self.record_id, "room")?,
            number: self.number,
            room_type: self.room_type,
            capacity: self.capacity,
            price_cents: self.price_cents,
            description: self.description,
            metadata: self.metadata,
            is_reserved: self.is_reserved,
            housekeeping: parse_housekeeping(&self.housekeeping)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the Room repository.
#[derive(Clone)]
pub struct SurrealRoomRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealRoomRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> RoomRepository for SurrealRoomRepository<C> {
    async fn create(&self, input: CreateRoom) -> RoomkeepResult<Room> {
        let id = Uuid::new_v4();
        let metadata = input
            .metadata
            .unwrap_or(serde_json::Value::Object(Default::default()));

        self.db
            .query(
                "CREATE type::record('room', $id) SET \
                 number = $number, room_type = $room_type, \
                 capacity = $capacity, price_cents = $price_cents, \
                 description = $description, metadata = $metadata, \
                 is_reserved = false, housekeeping = 'Clean'",
            )
            .bind(("id", id.to_string()))
            .bind(("number", input.number))
            .bind(("room_type", input.room_type))
            .bind(("capacity", input.capacity))
            .bind(("price_cents", input.price_cents))
            .bind(("description", input.description.unwrap_or_default()))
            .bind(("metadata", metadata))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::from_write("room", e.to_string()))?;

        self.get_by_id(id).await
    }

    async fn get_by_id(&self, id: Uuid) -> RoomkeepResult<Room> {
        let mut result = self
            .db
            .query("SELECT meta::id(id) AS record_id, * FROM type::record('room', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RoomRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("room", id))?;

        Ok(row.try_into_room()?)
    }

    async fn update(&self, id: Uuid, input: UpdateRoom) -> RoomkeepResult<Room> {
        self.get_by_id(id).await?;

        let mut sets = Vec::new();
        if input.number.is_some() {
            sets.push("number = $number");
        }
        if input.room_type.is_some() {
            sets.push("room_type = $room_type");
        }
        if input.capacity.is_some() {
            sets.push("capacity = $capacity");
        }
        if input.price_cents.is_some() {
            sets.push("price_cents = $price_cents");
        }
        if input.description.is_some() {
            sets.push("description = $description");
        }
        if input.metadata.is_some() {
            sets.push("metadata = $metadata");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('room', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id.to_string()));
        if let Some(number) = input.number {
            builder = builder.bind(("number", number));
        }
        if let Some(room_type) = input.room_type {
            builder = builder.bind(("room_type", room_type));
        }
        if let Some(capacity) = input.capacity {
            builder = builder.bind(("capacity", capacity));
        }
        if let Some(price_cents) = input.price_cents {
            builder = builder.bind(("price_cents", price_cents));
        }
        if let Some(description) = input.description {
            builder = builder.bind(("description", description));
        }
        if let Some(metadata) = input.metadata {
            builder = builder.bind(("metadata", metadata));
        }

        builder
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::from_write("room", e.to_string()))?;

        self.get_by_id(id).await
    }

    async fn delete(&self, id: Uuid) -> RoomkeepResult<()> {
        const DELETE_IF_IDLE: &str = "\
BEGIN TRANSACTION;
LET $active = (SELECT id FROM reservation WHERE room_id = $id AND status != 'Cancelled');
IF array::len($active) > 0 { THROW 'roomkeep:room-in-use'; };
DELETE type::record('room', $id);
COMMIT TRANSACTION;";

        self.get_by_id(id).await?;

        let failure = match self.db.query(DELETE_IF_IDLE).bind(("id", id.to_string())).await {
            Ok(response) => match response.check() {
                Ok(_) => return Ok(()),
                Err(e) => e.to_string(),
            },
            Err(e) => e.to_string(),
        };

        if failure.contains("roomkeep:room-in-use") {
            return Err(RoomkeepError::validation(
                "room has active reservations and cannot be deleted",
            ));
        }
        Err(DbError::Query(failure).into())
    }

    async fn list(&self, pagination: Pagination) -> RoomkeepResult<PaginatedResult<Room>> {
        let mut count_result = self
            .db
            .query("SELECT count() AS total FROM room GROUP ALL")
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM room \
                 ORDER BY number ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RoomRow> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(RoomRow::try_into_room)
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn search_available(&self, search: RoomSearch) -> RoomkeepResult<Vec<Room>> {
        const QUERY: &str = concat!(
            "SELECT meta::id(id) AS record_id, * FROM room ",
            "WHERE capacity >= $guests ",
            "AND array::len((SELECT id FROM reservation WHERE ",
            conflict_filter!("meta::id($parent.id)"),
            ")) = 0 ",
            "ORDER BY price_cents ASC",
        );

        let mut result = self
            .db
            .query(QUERY)
            .bind(("guests", search.guests))
            .bind(("check_in", date_to_datetime(search.range.check_in())))
            .bind(("check_out", date_to_datetime(search.range.check_out())))
            .bind(("exclude_id", String::new()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RoomRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows
            .into_iter()
            .map(RoomRow::try_into_room)
            .collect::<Result<Vec<_>, DbError>>()?)
    }

    async fn set_housekeeping(&self, id: Uuid, status: HousekeepingStatus) -> RoomkeepResult<Room> {
        self.get_by_id(id).await?;

        self.db
            .query(
                "UPDATE type::record('room', $id) SET \
                 housekeeping = $housekeeping, updated_at = time::now()",
            )
            .bind(("id", id.to_string()))
            .bind(("housekeeping", housekeeping_to_string(status)))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        self.get_by_id(id).await
    }
}
