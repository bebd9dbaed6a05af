//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Reservation writes that can
//! create or move a stay run the availability check and the write as
//! one atomic unit inside the implementation.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::availability::AvailabilityQuery;
use crate::error::RoomkeepResult;
use crate::models::{
    dashboard::DashboardStats,
    payment::{NewPayment, Payment, UpdatePayment},
    reservation::{Booking, CreateReservation, Reservation, ReservationFilter},
    room::{CreateRoom, HousekeepingStatus, Room, RoomSearch, UpdateRoom},
    schedule::{CreateScheduleEntry, ScheduleEntry, ScheduleFilter, UpdateScheduleEntry},
    session::{CreateSession, Session},
    user::{CreateUser, UpdateUser, User},
};

/// Pagination parameters for list queries.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 50,
        }
    }
}

/// A paginated result set.
#[derive(Debug, Clone, serde::Serialize)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

// ---------------------------------------------------------------------------
// Inventory
// ---------------------------------------------------------------------------

pub trait RoomRepository: Send + Sync {
    fn create(&self, input: CreateRoom) -> impl Future<Output = RoomkeepResult<Room>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = RoomkeepResult<Room>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateRoom,
    ) -> impl Future<Output = RoomkeepResult<Room>> + Send;
    fn delete(&self, id: Uuid) -> impl Future<Output = RoomkeepResult<()>> + Send;
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = RoomkeepResult<PaginatedResult<Room>>> + Send;
    /// Rooms that fit the party and have no conflicting reservation,
    /// cheapest first.
    fn search_available(
        &self,
        search: RoomSearch,
    ) -> impl Future<Output = RoomkeepResult<Vec<Room>>> + Send;
    fn set_housekeeping(
        &self,
        id: Uuid,
        status: HousekeepingStatus,
    ) -> impl Future<Output = RoomkeepResult<Room>> + Send;
}

// ---------------------------------------------------------------------------
// Reservations & payments
// ---------------------------------------------------------------------------

pub trait ReservationRepository: Send + Sync {
    /// Whether the candidate stay intersects an active reservation.
    ///
    /// Fails with `NotFound` when the room does not exist.
    fn has_conflict(
        &self,
        query: AvailabilityQuery,
    ) -> impl Future<Output = RoomkeepResult<bool>> + Send;

    /// Reservation without payment (staff entry).
    fn create(
        &self,
        input: CreateReservation,
    ) -> impl Future<Output = RoomkeepResult<Reservation>> + Send;

    /// Checkout: reservation, payment and room flags in one transaction.
    fn book(
        &self,
        input: CreateReservation,
        payment: NewPayment,
    ) -> impl Future<Output = RoomkeepResult<Booking>> + Send;

    /// Move an existing reservation in place and overwrite its payment.
    fn rebook(
        &self,
        id: Uuid,
        input: CreateReservation,
        payment: NewPayment,
    ) -> impl Future<Output = RoomkeepResult<Booking>> + Send;

    /// Replace a reservation's fields, re-checking availability against
    /// every other reservation. A cancelled result releases the room.
    fn update(
        &self,
        id: Uuid,
        input: CreateReservation,
    ) -> impl Future<Output = RoomkeepResult<Reservation>> + Send;

    /// Soft-cancel and release the room.
    fn cancel(&self, id: Uuid) -> impl Future<Output = RoomkeepResult<Reservation>> + Send;

    /// Hard-delete the reservation and its payment, releasing the room.
    fn delete(&self, id: Uuid) -> impl Future<Output = RoomkeepResult<()>> + Send;

    fn get_by_id(&self, id: Uuid) -> impl Future<Output = RoomkeepResult<Reservation>> + Send;
    fn list(
        &self,
        filter: ReservationFilter,
        pagination: Pagination,
    ) -> impl Future<Output = RoomkeepResult<PaginatedResult<Reservation>>> + Send;
}

pub trait PaymentRepository: Send + Sync {
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = RoomkeepResult<Payment>> + Send;
    fn get_by_reservation(
        &self,
        reservation_id: Uuid,
    ) -> impl Future<Output = RoomkeepResult<Payment>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdatePayment,
    ) -> impl Future<Output = RoomkeepResult<Payment>> + Send;
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = RoomkeepResult<PaginatedResult<Payment>>> + Send;
}

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

pub trait UserRepository: Send + Sync {
    fn create(&self, input: CreateUser) -> impl Future<Output = RoomkeepResult<User>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = RoomkeepResult<User>> + Send;
    fn get_by_username(
        &self,
        username: &str,
    ) -> impl Future<Output = RoomkeepResult<User>> + Send;
    fn get_by_email(&self, email: &str) -> impl Future<Output = RoomkeepResult<User>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateUser,
    ) -> impl Future<Output = RoomkeepResult<User>> + Send;
    /// Hash and store a new password.
    fn set_password(
        &self,
        id: Uuid,
        password: &str,
    ) -> impl Future<Output = RoomkeepResult<()>> + Send;
    /// Soft-delete: sets status to Inactive.
    fn delete(&self, id: Uuid) -> impl Future<Output = RoomkeepResult<()>> + Send;
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = RoomkeepResult<PaginatedResult<User>>> + Send;
}

pub trait SessionRepository: Send + Sync {
    fn create(&self, input: CreateSession)
    -> impl Future<Output = RoomkeepResult<Session>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = RoomkeepResult<Session>> + Send;
    fn get_by_token_hash(
        &self,
        token_hash: &str,
    ) -> impl Future<Output = RoomkeepResult<Session>> + Send;
    /// Remove a single session. `Ok(true)` only for the caller whose delete
    /// actually removed the row, so concurrent callers cannot both win.
    fn invalidate(&self, id: Uuid) -> impl Future<Output = RoomkeepResult<bool>> + Send;
    /// Invalidate all sessions for a user (e.g., on password change).
    fn invalidate_user_sessions(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = RoomkeepResult<()>> + Send;
    /// Remove all expired sessions.
    fn cleanup_expired(&self) -> impl Future<Output = RoomkeepResult<u64>> + Send;
}

// ---------------------------------------------------------------------------
// Staff
// ---------------------------------------------------------------------------

pub trait ScheduleRepository: Send + Sync {
    fn create(
        &self,
        input: CreateScheduleEntry,
    ) -> impl Future<Output = RoomkeepResult<ScheduleEntry>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = RoomkeepResult<ScheduleEntry>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateScheduleEntry,
    ) -> impl Future<Output = RoomkeepResult<ScheduleEntry>> + Send;
    fn delete(&self, id: Uuid) -> impl Future<Output = RoomkeepResult<()>> + Send;
    /// Ordered by work date, then shift start.
    fn list(
        &self,
        filter: ScheduleFilter,
        pagination: Pagination,
    ) -> impl Future<Output = RoomkeepResult<PaginatedResult<ScheduleEntry>>> + Send;
}

pub trait DashboardRepository: Send + Sync {
    /// Snapshot of counts, with planned shifts counted on `date`.
    fn stats(&self, date: NaiveDate) -> impl Future<Output = RoomkeepResult<DashboardStats>> + Send;
}
