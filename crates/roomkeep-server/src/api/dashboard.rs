//! `/api/dashboard`: aggregate counts, trimmed to what each role needs.

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{NaiveDate, Utc};
use roomkeep_core::access::Role;
use roomkeep_core::models::dashboard::DashboardStats;
use roomkeep_core::repository::DashboardRepository;
use serde::{Deserialize, Serialize};

use super::error::ApiResult;
use super::extract::{Authorized, guard};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/dashboard", get(dashboard))
}

#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    /// Day for the shift count; defaults to today (UTC).
    pub date: Option<NaiveDate>,
}

#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct DashboardView {
    pub date: NaiveDate,
    pub rooms_total: u64,
    pub rooms_reserved: u64,
    pub rooms_dirty: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reservations_pending: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reservations_confirmed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reservations_cancelled: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_users: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub planned_shifts: Option<u64>,
}

impl DashboardView {
    /// Room counts for every staff role; reservations for the front desk;
    /// accounts and shifts for admins. Cleaners also see the shift count.
    fn for_role(role: Role, date: NaiveDate, stats: DashboardStats) -> Self {
        let front_desk = matches!(role, Role::Admin | Role::Receptionist);
        let admin = role == Role::Admin;
        let shifts = matches!(role, Role::Admin | Role::Cleaner);

        Self {
            date,
            rooms_total: stats.rooms_total,
            rooms_reserved: stats.rooms_reserved,
            rooms_dirty: stats.rooms_dirty,
            reservations_pending: front_desk.then_some(stats.reservations_pending),
            reservations_confirmed: front_desk.then_some(stats.reservations_confirmed),
            reservations_cancelled: front_desk.then_some(stats.reservations_cancelled),
            active_users: admin.then_some(stats.active_users),
            planned_shifts: shifts.then_some(stats.planned_shifts),
        }
    }
}

async fn dashboard(
    auth: Authorized<guard::ViewDashboard>,
    State(state): State<AppState>,
    Query(q): Query<DashboardQuery>,
) -> ApiResult<Json<DashboardView>> {
    let date = q.date.unwrap_or_else(|| Utc::now().date_naive());
    let stats = state.dashboard.stats(date).await?;
    Ok(Json(DashboardView::for_role(auth.user.role, date, stats)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats() -> DashboardStats {
        DashboardStats {
            rooms_total: 10,
            rooms_reserved: 4,
            rooms_dirty: 3,
            reservations_pending: 1,
            reservations_confirmed: 4,
            reservations_cancelled: 2,
            active_users: 7,
            planned_shifts: 5,
            date: None,
        }
    }

    fn day() -> NaiveDate {
        "2025-04-20".parse().unwrap()
    }

    #[test]
    fn admin_sees_everything() {
        let view = DashboardView::for_role(Role::Admin, day(), stats());
        assert_eq!(view.active_users, Some(7));
        assert_eq!(view.planned_shifts, Some(5));
        assert_eq!(view.reservations_confirmed, Some(4));
    }

    #[test]
    fn receptionist_sees_rooms_and_reservations() {
        let view = DashboardView::for_role(Role::Receptionist, day(), stats());
        assert_eq!(view.rooms_reserved, 4);
        assert_eq!(view.reservations_pending, Some(1));
        assert_eq!(view.active_users, None);
        assert_eq!(view.planned_shifts, None);
    }

    #[test]
    fn cleaner_sees_rooms_and_shifts() {
        let view = DashboardView::for_role(Role::Cleaner, day(), stats());
        assert_eq!(view.rooms_dirty, 3);
        assert_eq!(view.planned_shifts, Some(5));
        assert_eq!(view.reservations_pending, None);

        let json = serde_json::to_value(&view).unwrap();
        assert!(json.get("reservations_pending").is_none());
    }
}
