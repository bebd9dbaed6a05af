//! Integration tests for checkout and the reservation lifecycle.

use chrono::NaiveDate;
use roomkeep_booking::card::{self, CardDetails};
use roomkeep_booking::config::BookingConfig;
use roomkeep_booking::service::{Actor, BookingService, Checkout, NewReservation};
use roomkeep_core::access::Role;
use roomkeep_core::availability::{AvailabilityQuery, StayRange};
use roomkeep_core::error::RoomkeepError;
use roomkeep_core::models::reservation::{ReservationStatus, UpdateReservation};
use roomkeep_core::models::room::{CreateRoom, HousekeepingStatus};
use roomkeep_core::repository::{Pagination, PaymentRepository, RoomRepository};
use roomkeep_db::repository::{
    SurrealPaymentRepository, SurrealReservationRepository, SurrealRoomRepository,
};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

const KEY: [u8; 32] = [42u8; 32];

struct Fixture {
    service: BookingService<SurrealRoomRepository<Db>, SurrealReservationRepository<Db>>,
    rooms: SurrealRoomRepository<Db>,
    payments: SurrealPaymentRepository<Db>,
}

async fn setup() -> Fixture {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    roomkeep_db::run_migrations(&db).await.unwrap();

    let config = BookingConfig {
        card_encryption_key: Some(KEY),
        ..BookingConfig::default()
    };

    Fixture {
        service: BookingService::new(
            SurrealRoomRepository::new(db.clone()),
            SurrealReservationRepository::new(db.clone()),
            config,
        ),
        rooms: SurrealRoomRepository::new(db.clone()),
        payments: SurrealPaymentRepository::new(db),
    }
}

fn range(a: &str, b: &str) -> StayRange {
    StayRange::new(
        a.parse::<NaiveDate>().unwrap(),
        b.parse::<NaiveDate>().unwrap(),
    )
    .unwrap()
}

async fn add_room(fx: &Fixture, number: &str, capacity: u32, price_cents: u64) -> Uuid {
    fx.rooms
        .create(CreateRoom {
            number: number.into(),
            room_type: "double".into(),
            capacity,
            price_cents,
            description: None,
            metadata: None,
        })
        .await
        .unwrap()
        .id
}

fn visa() -> CardDetails {
    CardDetails {
        number: "4242 4242 4242 4242".into(),
        cardholder_name: "ADA LOVELACE".into(),
        bank_name: "Analytical Bank".into(),
        expiry: "12/29".into(),
    }
}

fn checkout(room_id: Uuid, a: &str, b: &str) -> Checkout {
    Checkout {
        room_id,
        customer_name: "Ada Lovelace".into(),
        guests: 2,
        range: range(a, b),
        card: visa(),
        reservation_id: None,
    }
}

fn receptionist() -> Actor {
    Actor {
        user_id: Uuid::new_v4(),
        role: Role::Receptionist,
    }
}

// ---------------------------------------------------------------------------
// Checkout
// ---------------------------------------------------------------------------

#[tokio::test]
async fn guest_checkout_charges_nights_times_rate() {
    let fx = setup().await;
    let room = add_room(&fx, "101", 2, 12_500).await;

    let booking = fx
        .service
        .guest_checkout(checkout(room, "2025-04-20", "2025-04-23"))
        .await
        .unwrap();

    assert_eq!(booking.reservation.user_id, None);
    assert_eq!(booking.reservation.status, ReservationStatus::Confirmed);
    assert_eq!(booking.payment.amount_cents, 37_500);
    assert_eq!(booking.payment.card_last4, "4242");

    let room = fx.rooms.get_by_id(room).await.unwrap();
    assert!(room.is_reserved);
    assert_eq!(room.housekeeping, HousekeepingStatus::Dirty);
}

#[tokio::test]
async fn card_number_is_stored_sealed() {
    let fx = setup().await;
    let room = add_room(&fx, "101", 2, 10_000).await;

    let booking = fx
        .service
        .guest_checkout(checkout(room, "2025-04-20", "2025-04-21"))
        .await
        .unwrap();

    let stored = fx.payments.get_by_id(booking.payment.id).await.unwrap();
    let sealed = stored.sealed_card_number.expect("sealed number stored");
    assert_eq!(card::open(&KEY, &sealed).unwrap(), "4242424242424242");
}

#[tokio::test]
async fn overlapping_checkout_is_rejected() {
    let fx = setup().await;
    let room = add_room(&fx, "101", 2, 10_000).await;
    fx.service
        .guest_checkout(checkout(room, "2025-04-20", "2025-04-22"))
        .await
        .unwrap();

    let err = fx
        .service
        .guest_checkout(checkout(room, "2025-04-21", "2025-04-23"))
        .await
        .unwrap_err();
    assert!(matches!(err, RoomkeepError::RoomUnavailable { .. }));
    assert_eq!(err.to_string(), "room already reserved for these dates");
}

#[tokio::test]
async fn same_day_turnover_is_allowed() {
    let fx = setup().await;
    let room = add_room(&fx, "101", 2, 10_000).await;
    fx.service
        .guest_checkout(checkout(room, "2025-04-20", "2025-04-22"))
        .await
        .unwrap();

    assert!(
        fx.service
            .guest_checkout(checkout(room, "2025-04-22", "2025-04-24"))
            .await
            .is_ok()
    );
}

#[tokio::test]
async fn checkout_over_capacity_is_rejected() {
    let fx = setup().await;
    let room = add_room(&fx, "101", 2, 10_000).await;

    let err = fx
        .service
        .guest_checkout(Checkout {
            guests: 3,
            ..checkout(room, "2025-04-20", "2025-04-22")
        })
        .await
        .unwrap_err();
    assert!(matches!(err, RoomkeepError::Validation { .. }));
}

#[tokio::test]
async fn checkout_with_invalid_card_writes_nothing() {
    let fx = setup().await;
    let room = add_room(&fx, "101", 2, 10_000).await;

    let err = fx
        .service
        .guest_checkout(Checkout {
            card: CardDetails {
                number: "4242424242424241".into(),
                ..visa()
            },
            ..checkout(room, "2025-04-20", "2025-04-22")
        })
        .await
        .unwrap_err();
    assert!(matches!(err, RoomkeepError::Validation { .. }));

    assert!(!fx.rooms.get_by_id(room).await.unwrap().is_reserved);
    assert_eq!(
        fx.payments.list(Pagination::default()).await.unwrap().total,
        0
    );
}

#[tokio::test]
async fn checkout_total_beyond_storable_amount_is_rejected() {
    let fx = setup().await;
    let room = add_room(&fx, "101", 2, i64::MAX as u64 / 2).await;

    let err = fx
        .service
        .guest_checkout(checkout(room, "2025-04-20", "2025-04-23"))
        .await
        .unwrap_err();
    assert!(matches!(err, RoomkeepError::Validation { .. }), "{err:?}");

    assert!(!fx.rooms.get_by_id(room).await.unwrap().is_reserved);
    assert_eq!(
        fx.payments.list(Pagination::default()).await.unwrap().total,
        0
    );
}

#[tokio::test]
async fn checkout_unknown_room_is_not_found() {
    let fx = setup().await;

    let err = fx
        .service
        .guest_checkout(checkout(Uuid::new_v4(), "2025-04-20", "2025-04-22"))
        .await
        .unwrap_err();
    assert!(matches!(err, RoomkeepError::NotFound { .. }));
}

#[tokio::test]
async fn authenticated_checkout_is_owned_by_caller() {
    let fx = setup().await;
    let room = add_room(&fx, "101", 2, 10_000).await;
    let user_id = Uuid::new_v4();

    let booking = fx
        .service
        .checkout(user_id, checkout(room, "2025-05-01", "2025-05-03"))
        .await
        .unwrap();
    assert_eq!(booking.reservation.user_id, Some(user_id));

    let own = fx
        .service
        .list_own(user_id, Pagination::default())
        .await
        .unwrap();
    assert_eq!(own.total, 1);
    assert_eq!(own.items[0].id, booking.reservation.id);
}

#[tokio::test]
async fn authenticated_checkout_moves_existing_reservation() {
    let fx = setup().await;
    let room = add_room(&fx, "101", 2, 10_000).await;
    let user_id = Uuid::new_v4();

    let first = fx
        .service
        .checkout(user_id, checkout(room, "2025-05-01", "2025-05-03"))
        .await
        .unwrap();

    // Extending over its own nights must not self-conflict.
    let moved = fx
        .service
        .checkout(
            user_id,
            Checkout {
                reservation_id: Some(first.reservation.id),
                ..checkout(room, "2025-05-01", "2025-05-05")
            },
        )
        .await
        .unwrap();

    assert_eq!(moved.reservation.id, first.reservation.id);
    assert_eq!(moved.payment.amount_cents, 40_000);
    assert_eq!(
        fx.service
            .list_own(user_id, Pagination::default())
            .await
            .unwrap()
            .total,
        1
    );
}

#[tokio::test]
async fn moving_someone_elses_reservation_is_denied() {
    let fx = setup().await;
    let room = add_room(&fx, "101", 2, 10_000).await;

    let theirs = fx
        .service
        .checkout(Uuid::new_v4(), checkout(room, "2025-05-01", "2025-05-03"))
        .await
        .unwrap();

    let err = fx
        .service
        .checkout(
            Uuid::new_v4(),
            Checkout {
                reservation_id: Some(theirs.reservation.id),
                ..checkout(room, "2025-06-01", "2025-06-03")
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, RoomkeepError::AuthorizationDenied { .. }));
}

// ---------------------------------------------------------------------------
// Staff lifecycle
// ---------------------------------------------------------------------------

#[tokio::test]
async fn staff_create_then_update_to_same_dates() {
    let fx = setup().await;
    let room = add_room(&fx, "101", 2, 10_000).await;

    let reservation = fx
        .service
        .create_reservation(NewReservation {
            room_id: room,
            user_id: None,
            customer_name: "Walk-in".into(),
            guests: 1,
            range: range("2025-05-01", "2025-05-03"),
            status: None,
        })
        .await
        .unwrap();
    assert_eq!(reservation.status, ReservationStatus::Confirmed);

    let updated = fx
        .service
        .update_reservation(
            reservation.id,
            UpdateReservation {
                customer_name: Some("Walk-in Guest".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.customer_name, "Walk-in Guest");
    assert_eq!(updated.stay(), reservation.stay());
}

#[tokio::test]
async fn update_into_occupied_nights_conflicts() {
    let fx = setup().await;
    let room = add_room(&fx, "101", 2, 10_000).await;
    fx.service
        .guest_checkout(checkout(room, "2025-05-10", "2025-05-12"))
        .await
        .unwrap();
    let other = fx
        .service
        .guest_checkout(checkout(room, "2025-05-01", "2025-05-03"))
        .await
        .unwrap();

    let err = fx
        .service
        .update_reservation(
            other.reservation.id,
            UpdateReservation {
                check_out: Some("2025-05-11".parse().unwrap()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, RoomkeepError::RoomUnavailable { .. }));
}

#[tokio::test]
async fn owner_cancel_frees_the_dates() {
    let fx = setup().await;
    let room = add_room(&fx, "101", 2, 10_000).await;
    let owner = Actor {
        user_id: Uuid::new_v4(),
        role: Role::User,
    };

    let booking = fx
        .service
        .checkout(owner.user_id, checkout(room, "2025-04-20", "2025-04-22"))
        .await
        .unwrap();

    let cancelled = fx
        .service
        .cancel(owner, booking.reservation.id)
        .await
        .unwrap();
    assert_eq!(cancelled.status, ReservationStatus::Cancelled);
    assert!(!fx.rooms.get_by_id(room).await.unwrap().is_reserved);

    let query = AvailabilityQuery::new(room, range("2025-04-21", "2025-04-23"));
    assert!(!fx.service.is_conflicting(query).await.unwrap());
}

#[tokio::test]
async fn stranger_cannot_cancel_but_staff_can() {
    let fx = setup().await;
    let room = add_room(&fx, "101", 2, 10_000).await;
    let booking = fx
        .service
        .checkout(Uuid::new_v4(), checkout(room, "2025-04-20", "2025-04-22"))
        .await
        .unwrap();

    let stranger = Actor {
        user_id: Uuid::new_v4(),
        role: Role::User,
    };
    let err = fx
        .service
        .cancel(stranger, booking.reservation.id)
        .await
        .unwrap_err();
    assert!(matches!(err, RoomkeepError::AuthorizationDenied { .. }));

    assert!(
        fx.service
            .cancel(receptionist(), booking.reservation.id)
            .await
            .is_ok()
    );
}

#[tokio::test]
async fn delete_removes_reservation_and_payment() {
    let fx = setup().await;
    let room = add_room(&fx, "101", 2, 10_000).await;
    let booking = fx
        .service
        .guest_checkout(checkout(room, "2025-04-20", "2025-04-22"))
        .await
        .unwrap();

    fx.service.delete(booking.reservation.id).await.unwrap();

    assert!(matches!(
        fx.service.get(booking.reservation.id).await.unwrap_err(),
        RoomkeepError::NotFound { .. }
    ));
    assert!(fx.payments.get_by_id(booking.payment.id).await.is_err());
    assert!(!fx.rooms.get_by_id(room).await.unwrap().is_reserved);
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

#[tokio::test]
async fn search_skips_booked_and_small_rooms() {
    let fx = setup().await;
    let single = add_room(&fx, "100", 1, 8_000).await;
    let booked = add_room(&fx, "101", 2, 10_000).await;
    let free = add_room(&fx, "102", 3, 15_000).await;
    fx.service
        .guest_checkout(checkout(booked, "2025-04-20", "2025-04-22"))
        .await
        .unwrap();

    let found = fx
        .service
        .search(range("2025-04-21", "2025-04-23"), 2)
        .await
        .unwrap();
    let ids: Vec<Uuid> = found.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![free]);
    assert!(!ids.contains(&single));
}

#[tokio::test]
async fn search_requires_a_guest() {
    let fx = setup().await;
    let err = fx
        .service
        .search(range("2025-04-21", "2025-04-23"), 0)
        .await
        .unwrap_err();
    assert!(matches!(err, RoomkeepError::Validation { .. }));
}
