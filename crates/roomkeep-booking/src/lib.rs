//! Roomkeep Booking — checkout flows, reservation lifecycle and
//! payment card sealing on top of the repository traits.

pub mod card;
pub mod config;
pub mod error;
pub mod service;

pub use card::CardDetails;
pub use config::BookingConfig;
pub use error::BookingError;
pub use service::{Actor, BookingService, Checkout, NewReservation};
