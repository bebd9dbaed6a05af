//! Shared application state handed to every handler.

use std::sync::Arc;

use roomkeep_auth::{AuthConfig, AuthService};
use roomkeep_booking::{BookingConfig, BookingService};
use roomkeep_db::repository::{
    SurrealDashboardRepository, SurrealPaymentRepository, SurrealReservationRepository,
    SurrealRoomRepository, SurrealScheduleRepository, SurrealSessionRepository,
    SurrealUserRepository,
};
use surrealdb::Surreal;
use surrealdb::engine::any::Any;

pub type Auth = AuthService<SurrealUserRepository<Any>, SurrealSessionRepository<Any>>;
pub type Booking = BookingService<SurrealRoomRepository<Any>, SurrealReservationRepository<Any>>;

#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<Auth>,
    pub booking: Arc<Booking>,
    pub rooms: SurrealRoomRepository<Any>,
    pub payments: SurrealPaymentRepository<Any>,
    pub users: SurrealUserRepository<Any>,
    pub schedules: SurrealScheduleRepository<Any>,
    pub dashboard: SurrealDashboardRepository<Any>,
}

impl AppState {
    pub fn new(db: Surreal<Any>, auth_config: AuthConfig, booking_config: BookingConfig) -> Self {
        let users = match &auth_config.pepper {
            Some(pepper) => SurrealUserRepository::with_pepper(db.clone(), pepper.clone()),
            None => SurrealUserRepository::new(db.clone()),
        };

        let auth = AuthService::new(
            users.clone(),
            SurrealSessionRepository::new(db.clone()),
            auth_config,
        );
        let booking = BookingService::new(
            SurrealRoomRepository::new(db.clone()),
            SurrealReservationRepository::new(db.clone()),
            booking_config,
        );

        Self {
            auth: Arc::new(auth),
            booking: Arc::new(booking),
            rooms: SurrealRoomRepository::new(db.clone()),
            payments: SurrealPaymentRepository::new(db.clone()),
            users,
            schedules: SurrealScheduleRepository::new(db.clone()),
            dashboard: SurrealDashboardRepository::new(db),
        }
    }
}
