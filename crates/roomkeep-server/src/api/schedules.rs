//! Staff shift schedules: admin planning plus each staff member's own
//! view.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{NaiveDate, NaiveTime};
use garde::Validate;
use roomkeep_core::error::{RoomkeepError, RoomkeepResult};
use roomkeep_core::models::schedule::{
    CreateScheduleEntry, ScheduleEntry, ScheduleFilter, ShiftStatus, UpdateScheduleEntry,
};
use roomkeep_core::models::user::{User, UserStatus};
use roomkeep_core::repository::{PaginatedResult, ScheduleRepository, UserRepository};
use serde::Deserialize;
use uuid::Uuid;

use super::PageQuery;
use super::error::{ApiError, ApiResult};
use super::extract::{Authorized, guard};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/schedules", get(list_schedules).post(create_schedule))
        .route(
            "/api/schedules/:id",
            get(get_schedule)
                .put(update_schedule)
                .delete(delete_schedule),
        )
        .route("/api/me/schedules", get(my_schedules))
        .route("/api/me/schedules/:id/complete", post(complete_mine))
}

fn parse_shift(field: &str, value: &str) -> Result<NaiveTime, RoomkeepError> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .map_err(|_| RoomkeepError::validation(format!("{field} must be HH:MM, got {value:?}")))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateScheduleRequest {
    #[garde(skip)]
    pub staff_id: Uuid,
    #[garde(skip)]
    pub work_date: NaiveDate,
    /// `HH:MM`
    #[garde(skip)]
    pub shift_start: String,
    #[garde(skip)]
    pub shift_end: String,
    #[garde(length(max = 500))]
    pub note: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateScheduleRequest {
    #[garde(skip)]
    pub staff_id: Option<Uuid>,
    #[garde(skip)]
    pub work_date: Option<NaiveDate>,
    #[garde(skip)]
    pub shift_start: Option<String>,
    #[garde(skip)]
    pub shift_end: Option<String>,
    #[garde(skip)]
    pub status: Option<ShiftStatus>,
    /// An explicit `null` clears the note.
    #[garde(skip)]
    #[serde(default, deserialize_with = "double_option")]
    pub note: Option<Option<String>>,
}

/// Distinguish an absent field from an explicit `null`.
fn double_option<'de, D>(de: D) -> Result<Option<Option<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<String>::deserialize(de).map(Some)
}

#[derive(Debug, Default, Deserialize)]
pub struct ScheduleListQuery {
    pub staff_id: Option<Uuid>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub offset: Option<u64>,
    pub limit: Option<u64>,
}

impl ScheduleListQuery {
    fn split(self) -> (ScheduleFilter, PageQuery) {
        (
            ScheduleFilter {
                staff_id: self.staff_id,
                from: self.from,
                to: self.to,
            },
            PageQuery {
                offset: self.offset,
                limit: self.limit,
            },
        )
    }
}

/// Shifts can only be assigned to active staff accounts.
async fn ensure_staff(state: &AppState, staff_id: Uuid) -> ApiResult<()> {
    let user = state.users.get_by_id(staff_id).await?;
    Ok(check_assignable(&user)?)
}

fn check_assignable(user: &User) -> RoomkeepResult<()> {
    if !user.role.is_staff() {
        let message = format!("{} is not a staff member", user.username);
        return Err(RoomkeepError::validation(message));
    }
    if user.status != UserStatus::Active {
        let message = format!("{} is deactivated", user.username);
        return Err(RoomkeepError::validation(message));
    }
    Ok(())
}

async fn list_schedules(
    _auth: Authorized<guard::ManageSchedules>,
    State(state): State<AppState>,
    Query(q): Query<ScheduleListQuery>,
) -> ApiResult<Json<PaginatedResult<ScheduleEntry>>> {
    let (filter, page) = q.split();
    Ok(Json(state.schedules.list(filter, page.into()).await?))
}

async fn create_schedule(
    _auth: Authorized<guard::ManageSchedules>,
    State(state): State<AppState>,
    Json(req): Json<CreateScheduleRequest>,
) -> ApiResult<(StatusCode, Json<ScheduleEntry>)> {
    req.validate(&())?;
    ensure_staff(&state, req.staff_id).await?;

    let entry = state
        .schedules
        .create(CreateScheduleEntry {
            staff_id: req.staff_id,
            work_date: req.work_date,
            shift_start: parse_shift("shift_start", &req.shift_start)?,
            shift_end: parse_shift("shift_end", &req.shift_end)?,
            note: req.note,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

async fn get_schedule(
    _auth: Authorized<guard::ManageSchedules>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ScheduleEntry>> {
    Ok(Json(state.schedules.get_by_id(id).await?))
}

async fn update_schedule(
    _auth: Authorized<guard::ManageSchedules>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateScheduleRequest>,
) -> ApiResult<Json<ScheduleEntry>> {
    req.validate(&())?;
    if let Some(staff_id) = req.staff_id {
        ensure_staff(&state, staff_id).await?;
    }

    let update = UpdateScheduleEntry {
        staff_id: req.staff_id,
        work_date: req.work_date,
        shift_start: req
            .shift_start
            .as_deref()
            .map(|v| parse_shift("shift_start", v))
            .transpose()?,
        shift_end: req
            .shift_end
            .as_deref()
            .map(|v| parse_shift("shift_end", v))
            .transpose()?,
        status: req.status,
        note: req.note,
    };
    Ok(Json(state.schedules.update(id, update).await?))
}

async fn delete_schedule(
    _auth: Authorized<guard::ManageSchedules>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.schedules.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn my_schedules(
    auth: Authorized<guard::ViewOwnSchedule>,
    State(state): State<AppState>,
    Query(q): Query<ScheduleListQuery>,
) -> ApiResult<Json<PaginatedResult<ScheduleEntry>>> {
    let (mut filter, page) = q.split();
    filter.staff_id = Some(auth.user.user_id);
    Ok(Json(state.schedules.list(filter, page.into()).await?))
}

async fn complete_mine(
    auth: Authorized<guard::ViewOwnSchedule>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ScheduleEntry>> {
    let entry = state.schedules.get_by_id(id).await?;
    if entry.staff_id != auth.user.user_id {
        return Err(ApiError::forbidden("shift belongs to another staff member"));
    }
    if entry.status == ShiftStatus::Canceled {
        return Err(RoomkeepError::validation("shift was canceled").into());
    }

    let update = UpdateScheduleEntry {
        status: Some(ShiftStatus::Completed),
        ..Default::default()
    };
    Ok(Json(state.schedules.update(id, update).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use roomkeep_core::access::Role;

    #[test]
    fn shift_times_use_hours_and_minutes() {
        assert_eq!(
            parse_shift("shift_start", "07:30").unwrap(),
            NaiveTime::from_hms_opt(7, 30, 0).unwrap()
        );
        assert!(parse_shift("shift_start", "7:30pm").is_err());
    }

    fn account(role: Role, status: UserStatus) -> User {
        User {
            id: Uuid::new_v4(),
            username: "carla".into(),
            email: "carla@hotel.test".into(),
            password_hash: String::new(),
            role,
            status,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn only_active_staff_take_shifts() {
        assert!(check_assignable(&account(Role::Cleaner, UserStatus::Active)).is_ok());
        assert!(check_assignable(&account(Role::User, UserStatus::Active)).is_err());
        assert!(check_assignable(&account(Role::Cleaner, UserStatus::Inactive)).is_err());
    }

    #[test]
    fn note_null_and_absent_are_distinct() {
        let absent: UpdateScheduleRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.note, None);

        let cleared: UpdateScheduleRequest = serde_json::from_str(r#"{"note":null}"#).unwrap();
        assert_eq!(cleared.note, Some(None));
    }
}
