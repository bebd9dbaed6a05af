//! Booking service: checkout flows and the reservation lifecycle.
//!
//! Every write that takes a room goes through a single repository call,
//! which re-checks availability inside the same database transaction.
//! The checks here (range, capacity, card, ownership) are the ones that
//! do not depend on other reservations.

use roomkeep_core::access::{Capability, Role};
use roomkeep_core::availability::{AvailabilityQuery, StayRange};
use roomkeep_core::error::RoomkeepResult;
use roomkeep_core::models::payment::NewPayment;
use roomkeep_core::models::reservation::{
    Booking, CreateReservation, Reservation, ReservationFilter, ReservationStatus,
    UpdateReservation,
};
use roomkeep_core::models::room::{Room, RoomSearch};
use roomkeep_core::repository::{
    PaginatedResult, Pagination, ReservationRepository, RoomRepository,
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::card::{self, CardDetails};
use crate::config::BookingConfig;
use crate::error::BookingError;

/// The authenticated caller of an owner-sensitive operation.
#[derive(Debug, Clone, Copy)]
pub struct Actor {
    pub user_id: Uuid,
    pub role: Role,
}

/// A paid checkout request.
#[derive(Debug, Clone)]
pub struct Checkout {
    pub room_id: Uuid,
    pub customer_name: String,
    pub guests: u32,
    pub range: StayRange,
    pub card: CardDetails,
    /// Existing reservation of the caller to move instead of creating a
    /// new one. Ignored for guest checkout.
    pub reservation_id: Option<Uuid>,
}

/// Staff-entered reservation, no payment attached.
#[derive(Debug, Clone)]
pub struct NewReservation {
    pub room_id: Uuid,
    pub user_id: Option<Uuid>,
    pub customer_name: String,
    pub guests: u32,
    pub range: StayRange,
    pub status: Option<ReservationStatus>,
}

pub struct BookingService<R: RoomRepository, V: ReservationRepository> {
    rooms: R,
    reservations: V,
    config: BookingConfig,
}

impl<R: RoomRepository, V: ReservationRepository> BookingService<R, V> {
    pub fn new(rooms: R, reservations: V, config: BookingConfig) -> Self {
        Self {
            rooms,
            reservations,
            config,
        }
    }

    /// Whether the candidate stay conflicts with an active reservation.
    pub async fn is_conflicting(&self, query: AvailabilityQuery) -> RoomkeepResult<bool> {
        self.reservations.has_conflict(query).await
    }

    /// Rooms that can host `guests` for the whole range, cheapest first.
    pub async fn search(&self, range: StayRange, guests: u32) -> RoomkeepResult<Vec<Room>> {
        if guests == 0 {
            return Err(BookingError::NoGuests.into());
        }
        self.rooms.search_available(RoomSearch { range, guests }).await
    }

    /// Anonymous checkout. The reservation has no owner.
    pub async fn guest_checkout(&self, checkout: Checkout) -> RoomkeepResult<Booking> {
        let (input, payment) = self.prepare(None, &checkout).await?;
        self.reservations.book(input, payment).await
    }

    /// Checkout on behalf of a signed-in user. Naming one of the user's
    /// active reservations moves it in place and overwrites its payment.
    pub async fn checkout(&self, user_id: Uuid, checkout: Checkout) -> RoomkeepResult<Booking> {
        let (input, payment) = self.prepare(Some(user_id), &checkout).await?;

        match checkout.reservation_id {
            Some(id) => {
                let existing = self.reservations.get_by_id(id).await?;
                if existing.user_id != Some(user_id) {
                    warn!(reservation_id = %id, %user_id, "checkout on foreign reservation");
                    return Err(BookingError::NotOwner(id).into());
                }
                if !existing.is_active() {
                    return Err(BookingError::Cancelled(id).into());
                }
                self.reservations.rebook(id, input, payment).await
            }
            None => self.reservations.book(input, payment).await,
        }
    }

    pub async fn create_reservation(&self, input: NewReservation) -> RoomkeepResult<Reservation> {
        let room = self.rooms.get_by_id(input.room_id).await?;
        check_capacity(&room, input.guests)?;

        self.reservations
            .create(CreateReservation {
                room_id: input.room_id,
                user_id: input.user_id,
                customer_name: input.customer_name,
                guests: input.guests,
                range: input.range,
                status: input.status.unwrap_or(ReservationStatus::Confirmed),
            })
            .await
    }

    /// Partial staff edit. The merged range is checked against every
    /// other reservation; a cancelled result releases the room.
    pub async fn update_reservation(
        &self,
        id: Uuid,
        update: UpdateReservation,
    ) -> RoomkeepResult<Reservation> {
        let current = self.reservations.get_by_id(id).await?;
        let resolved = update.resolve(&current)?;

        if resolved.status != ReservationStatus::Cancelled {
            let room = self.rooms.get_by_id(resolved.room_id).await?;
            check_capacity(&room, resolved.guests)?;
        }

        self.reservations.update(id, resolved).await
    }

    /// Soft cancel. Owners may cancel their own reservations; staff
    /// with `ManageReservations` may cancel any.
    pub async fn cancel(&self, actor: Actor, id: Uuid) -> RoomkeepResult<Reservation> {
        let current = self.reservations.get_by_id(id).await?;
        if current.user_id != Some(actor.user_id) {
            actor.role.require(Capability::ManageReservations)?;
        }

        let cancelled = self.reservations.cancel(id).await?;
        info!(reservation_id = %id, actor = %actor.user_id, "reservation cancelled");
        Ok(cancelled)
    }

    pub async fn delete(&self, id: Uuid) -> RoomkeepResult<()> {
        self.reservations.delete(id).await
    }

    pub async fn get(&self, id: Uuid) -> RoomkeepResult<Reservation> {
        self.reservations.get_by_id(id).await
    }

    pub async fn list(
        &self,
        filter: ReservationFilter,
        pagination: Pagination,
    ) -> RoomkeepResult<PaginatedResult<Reservation>> {
        self.reservations.list(filter, pagination).await
    }

    pub async fn list_own(
        &self,
        user_id: Uuid,
        pagination: Pagination,
    ) -> RoomkeepResult<PaginatedResult<Reservation>> {
        let filter = ReservationFilter {
            user_id: Some(user_id),
            ..Default::default()
        };
        self.reservations.list(filter, pagination).await
    }

    /// Validate a checkout and build the reservation and payment rows.
    async fn prepare(
        &self,
        user_id: Option<Uuid>,
        checkout: &Checkout,
    ) -> RoomkeepResult<(CreateReservation, NewPayment)> {
        let number = checkout.card.validate()?;
        let room = self.rooms.get_by_id(checkout.room_id).await?;
        check_capacity(&room, checkout.guests)?;

        let sealed_card_number = match &self.config.card_encryption_key {
            Some(key) => Some(card::seal(key, &number)?),
            None => None,
        };

        let payment = NewPayment {
            amount_cents: room.quote(&checkout.range)?,
            cardholder_name: checkout.card.cardholder_name.clone(),
            bank_name: checkout.card.bank_name.clone(),
            card_last4: checkout.card.last4(),
            card_expiry: checkout.card.expiry.clone(),
            sealed_card_number,
        };

        let input = CreateReservation {
            room_id: room.id,
            user_id,
            customer_name: checkout.customer_name.clone(),
            guests: checkout.guests,
            range: checkout.range,
            status: self.config.checkout_status,
        };

        Ok((input, payment))
    }
}

fn check_capacity(room: &Room, guests: u32) -> Result<(), BookingError> {
    if guests == 0 {
        return Err(BookingError::NoGuests);
    }
    if guests > room.capacity {
        return Err(BookingError::CapacityExceeded {
            capacity: room.capacity,
            guests,
        });
    }
    Ok(())
}
