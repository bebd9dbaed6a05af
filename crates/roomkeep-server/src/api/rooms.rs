//! `/api/rooms`: inventory, availability search and housekeeping.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};
use chrono::NaiveDate;
use garde::Validate;
use roomkeep_core::availability::StayRange;
use roomkeep_core::models::room::{
    CreateRoom, HousekeepingStatus, MAX_PRICE_CENTS, Room, UpdateRoom,
};
use roomkeep_core::repository::{PaginatedResult, RoomRepository};
use serde::Deserialize;
use uuid::Uuid;

use super::error::ApiResult;
use super::extract::{Authorized, guard};
use super::PageQuery;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/rooms", get(list_rooms).post(create_room))
        .route("/api/rooms/search", get(search_rooms))
        .route(
            "/api/rooms/:id",
            get(get_room).put(update_room).delete(delete_room),
        )
        .route("/api/rooms/:id/housekeeping", put(set_housekeeping))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateRoomRequest {
    #[garde(length(min = 1, max = 16))]
    pub number: String,
    #[garde(length(min = 1, max = 64))]
    pub room_type: String,
    #[garde(range(min = 1))]
    pub capacity: u32,
    #[garde(range(max = MAX_PRICE_CENTS))]
    pub price_cents: u64,
    #[garde(skip)]
    pub description: Option<String>,
    #[garde(skip)]
    pub metadata: Option<serde_json::Value>,
}

impl From<CreateRoomRequest> for CreateRoom {
    fn from(req: CreateRoomRequest) -> Self {
        Self {
            number: req.number,
            room_type: req.room_type,
            capacity: req.capacity,
            price_cents: req.price_cents,
            description: req.description,
            metadata: req.metadata,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateRoomRequest {
    #[garde(length(min = 1, max = 16))]
    pub number: Option<String>,
    #[garde(length(min = 1, max = 64))]
    pub room_type: Option<String>,
    #[garde(range(min = 1))]
    pub capacity: Option<u32>,
    #[garde(range(max = MAX_PRICE_CENTS))]
    pub price_cents: Option<u64>,
    #[garde(skip)]
    pub description: Option<String>,
    #[garde(skip)]
    pub metadata: Option<serde_json::Value>,
}

impl From<UpdateRoomRequest> for UpdateRoom {
    fn from(req: UpdateRoomRequest) -> Self {
        Self {
            number: req.number,
            room_type: req.room_type,
            capacity: req.capacity,
            price_cents: req.price_cents,
            description: req.description,
            metadata: req.metadata,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    #[serde(default = "one_guest")]
    pub guests: u32,
}

fn one_guest() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
pub struct HousekeepingRequest {
    pub status: HousekeepingStatus,
}

async fn list_rooms(
    State(state): State<AppState>,
    Query(page): Query<PageQuery>,
) -> ApiResult<Json<PaginatedResult<Room>>> {
    Ok(Json(state.rooms.list(page.into()).await?))
}

async fn search_rooms(
    State(state): State<AppState>,
    Query(q): Query<SearchQuery>,
) -> ApiResult<Json<Vec<Room>>> {
    let range = StayRange::new(q.check_in, q.check_out)?;
    Ok(Json(state.booking.search(range, q.guests).await?))
}

async fn get_room(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<Room>> {
    Ok(Json(state.rooms.get_by_id(id).await?))
}

async fn create_room(
    _auth: Authorized<guard::ManageRooms>,
    State(state): State<AppState>,
    Json(req): Json<CreateRoomRequest>,
) -> ApiResult<(StatusCode, Json<Room>)> {
    req.validate(&())?;
    let room = state.rooms.create(req.into()).await?;
    Ok((StatusCode::CREATED, Json(room)))
}

async fn update_room(
    _auth: Authorized<guard::ManageRooms>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateRoomRequest>,
) -> ApiResult<Json<Room>> {
    req.validate(&())?;
    Ok(Json(state.rooms.update(id, req.into()).await?))
}

async fn delete_room(
    _auth: Authorized<guard::ManageRooms>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.rooms.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn set_housekeeping(
    _auth: Authorized<guard::UpdateHousekeeping>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<HousekeepingRequest>,
) -> ApiResult<Json<Room>> {
    Ok(Json(state.rooms.set_housekeeping(id, req.status).await?))
}
